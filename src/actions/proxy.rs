use super::ActionContext;
use crate::error::RevertReason;
use crate::ledger::{LedgerEvent, LedgerView};
use crate::utils::word::word_from_address;
use alloy::primitives::{Address, B256};

/// Hands the running proxy to `new_owner`. Authorization already happened at proxy entry.
pub fn change_proxy_owner(
    ctx: &mut ActionContext<'_, '_>,
    new_owner: Address,
) -> Result<B256, RevertReason> {
    if new_owner == Address::ZERO {
        return Err(RevertReason::InvalidParameter(
            "new proxy owner is the zero address".to_string(),
        ));
    }
    let previous = ctx
        .layer
        .proxy_owner(ctx.proxy)
        .ok_or(RevertReason::UnknownTarget(ctx.proxy))?;

    ctx.layer.set_proxy_owner(ctx.proxy, new_owner);
    ctx.layer.emit(LedgerEvent::OwnerChanged {
        proxy: ctx.proxy,
        previous,
        new: new_owner,
    });
    tracing::debug!(
        "[ACTION] ChangeProxyOwner {}: {} -> {}",
        ctx.proxy,
        previous,
        new_owner
    );
    Ok(word_from_address(new_owner))
}
