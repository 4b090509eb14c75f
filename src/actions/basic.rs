//! Token custody actions: wrap, unwrap, send, pull.
//!
//! `U256::MAX` as an amount means "everything the source holds".

use super::ActionContext;
use crate::error::RevertReason;
use crate::ledger::{LedgerEvent, LedgerView};
use crate::utils::word::word_from_u256;
use alloy::primitives::{Address, B256, U256};

fn resolve_max(amount: U256, full_balance: impl FnOnce() -> U256) -> U256 {
    if amount == U256::MAX {
        full_balance()
    } else {
        amount
    }
}

fn require_recipient(to: Address, what: &str) -> Result<(), RevertReason> {
    if to == Address::ZERO {
        return Err(RevertReason::InvalidParameter(format!(
            "{what} recipient is the zero address"
        )));
    }
    Ok(())
}

/// Native held by the proxy becomes WETH held by the proxy.
pub fn wrap_eth(ctx: &mut ActionContext<'_, '_>, amount: U256) -> Result<B256, RevertReason> {
    let native = ctx.chain.native;
    let weth = ctx.chain.weth;
    let amount = resolve_max(amount, || ctx.layer.balance_of(native, ctx.proxy));

    ctx.layer.debit(native, ctx.proxy, amount)?;
    ctx.layer.credit(weth, ctx.proxy, amount)?;
    ctx.layer.emit(LedgerEvent::Deposit {
        token: weth,
        holder: ctx.proxy,
        amount,
    });
    tracing::debug!("[ACTION] WrapEth {} wei in {}", amount, ctx.proxy);
    Ok(word_from_u256(amount))
}

/// WETH held by the proxy becomes native sent to `to`.
pub fn unwrap_eth(
    ctx: &mut ActionContext<'_, '_>,
    amount: U256,
    to: Address,
) -> Result<B256, RevertReason> {
    require_recipient(to, "unwrap")?;
    let native = ctx.chain.native;
    let weth = ctx.chain.weth;
    let amount = resolve_max(amount, || ctx.layer.balance_of(weth, ctx.proxy));

    ctx.layer.debit(weth, ctx.proxy, amount)?;
    ctx.layer.credit(native, ctx.proxy, amount)?;
    ctx.layer.emit(LedgerEvent::Withdrawal {
        token: weth,
        holder: ctx.proxy,
        amount,
    });
    if to != ctx.proxy {
        ctx.layer.transfer(native, ctx.proxy, to, amount)?;
    }
    tracing::debug!("[ACTION] UnwrapEth {} wei to {}", amount, to);
    Ok(word_from_u256(amount))
}

pub fn send_token(
    ctx: &mut ActionContext<'_, '_>,
    token: Address,
    to: Address,
    amount: U256,
) -> Result<B256, RevertReason> {
    require_recipient(to, "send")?;
    let amount = resolve_max(amount, || ctx.layer.balance_of(token, ctx.proxy));
    if to != ctx.proxy {
        ctx.layer.transfer(token, ctx.proxy, to, amount)?;
    }
    tracing::debug!("[ACTION] SendToken {} of {} to {}", amount, token, to);
    Ok(word_from_u256(amount))
}

/// Pulls from `from` into the proxy; `from` must have approved the proxy.
pub fn pull_token(
    ctx: &mut ActionContext<'_, '_>,
    token: Address,
    from: Address,
    amount: U256,
) -> Result<B256, RevertReason> {
    if ctx.chain.is_native(token) {
        return Err(RevertReason::InvalidParameter(
            "native asset cannot be pulled".to_string(),
        ));
    }
    let amount = resolve_max(amount, || ctx.layer.balance_of(token, from));
    if from != Address::ZERO && from != ctx.proxy {
        ctx.layer.spend_allowance(token, from, ctx.proxy, amount)?;
        ctx.layer.transfer(token, from, ctx.proxy, amount)?;
    }
    tracing::debug!("[ACTION] PullToken {} of {} from {}", amount, token, from);
    Ok(word_from_u256(amount))
}
