use super::ActionContext;
use crate::error::RevertReason;
use crate::ledger::{LedgerEvent, LedgerView, SubscriptionKey, SubscriptionProtocol};
use alloy::primitives::{B256, U256};

/// Drops the proxy's automation subscription. Already-inactive positions are left untouched.
pub fn unsubscribe(
    ctx: &mut ActionContext<'_, '_>,
    protocol: SubscriptionProtocol,
    cdp_id: U256,
) -> Result<B256, RevertReason> {
    let key = match protocol {
        SubscriptionProtocol::Mcd => SubscriptionKey::mcd(cdp_id),
        SubscriptionProtocol::Compound => SubscriptionKey::compound(ctx.proxy),
        SubscriptionProtocol::Aave => SubscriptionKey::aave(ctx.proxy),
    };
    let Some(mut position) = ctx.layer.subscription(key) else {
        return Err(RevertReason::InvalidParameter(format!(
            "no {} subscription for {}",
            protocol.as_str(),
            key.key
        )));
    };
    if position.proxy != ctx.proxy {
        return Err(RevertReason::Unauthorized {
            caller: ctx.proxy,
            owner: position.proxy,
        });
    }
    if !position.subscribed {
        tracing::debug!(
            "[ACTION] AutomationV2Unsub {} already inactive for {}",
            protocol.as_str(),
            ctx.proxy
        );
        return Ok(B256::ZERO);
    }

    position.subscribed = false;
    ctx.layer.set_subscription(key, position);
    ctx.layer.emit(LedgerEvent::Unsubscribed {
        protocol,
        key: key.key,
        proxy: ctx.proxy,
    });
    tracing::debug!(
        "[ACTION] AutomationV2Unsub {} for {}",
        protocol.as_str(),
        ctx.proxy
    );
    Ok(B256::ZERO)
}
