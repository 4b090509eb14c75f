//! Typed recipe actions.
//!
//! Every action kind has a fixed parameter shape. Mappable parameters are `Param<T>`: either a
//! literal, or `$n`, a reference to the return word of the n-th (1-based) action that already
//! ran in the same recipe. Referenced slots are encoded as zero in the call data and carried in
//! the param mapping instead.

pub mod abi;
pub mod automation;
pub mod basic;
pub mod math;
pub mod proxy;

use crate::config::chains::ChainConfig;
use crate::error::{ForkError, ParseParamError, RevertReason};
use crate::ledger::{CacheLayer, SubscriptionProtocol};
use crate::registry::Registry;
use crate::utils::constants::SUB_DATA_INDEX_START;
use crate::utils::word::{address_from_word, parse_u256, u256_from_word};
use alloy::primitives::{keccak256, Address, Bytes, FixedBytes, B256, U256};
use alloy::sol_types::{SolCall, SolValue};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    WrapEth,
    UnwrapEth,
    SendToken,
    PullToken,
    SumInputs,
    SubInputs,
    ChangeProxyOwner,
    AutomationV2Unsub,
}

impl ActionKind {
    pub const ALL: [ActionKind; 8] = [
        ActionKind::WrapEth,
        ActionKind::UnwrapEth,
        ActionKind::SendToken,
        ActionKind::PullToken,
        ActionKind::SumInputs,
        ActionKind::SubInputs,
        ActionKind::ChangeProxyOwner,
        ActionKind::AutomationV2Unsub,
    ];

    /// Registry name of the deployed action contract.
    pub fn name(self) -> &'static str {
        match self {
            Self::WrapEth => "WrapEth",
            Self::UnwrapEth => "UnwrapEth",
            Self::SendToken => "SendToken",
            Self::PullToken => "PullToken",
            Self::SumInputs => "SumInputs",
            Self::SubInputs => "SubInputs",
            Self::ChangeProxyOwner => "ChangeProxyOwner",
            Self::AutomationV2Unsub => "AutomationV2Unsub",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// `bytes4(keccak256(name))`, the id recipes reference actions by.
    pub fn id(self) -> FixedBytes<4> {
        let hash = keccak256(self.name().as_bytes());
        FixedBytes::<4>::from_slice(&hash[..4])
    }

    /// Number of parameters a param mapping covers.
    pub fn mappable_params(self) -> usize {
        match self {
            Self::WrapEth => 1,
            Self::UnwrapEth => 2,
            Self::SendToken | Self::PullToken => 3,
            Self::SumInputs | Self::SubInputs => 2,
            Self::ChangeProxyOwner => 1,
            Self::AutomationV2Unsub => 1,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values that can be pulled out of a 32-byte return word.
pub trait WordValue: Copy + fmt::Debug + PartialEq {
    const PLACEHOLDER: Self;
    fn from_word(word: B256) -> Self;
    fn parse_literal(raw: &str) -> Option<Self>;
}

impl WordValue for U256 {
    const PLACEHOLDER: Self = U256::ZERO;

    fn from_word(word: B256) -> Self {
        u256_from_word(word)
    }

    fn parse_literal(raw: &str) -> Option<Self> {
        parse_u256(raw)
    }
}

impl WordValue for Address {
    const PLACEHOLDER: Self = Address::ZERO;

    fn from_word(word: B256) -> Self {
        address_from_word(word)
    }

    fn parse_literal(raw: &str) -> Option<Self> {
        Address::from_str(raw.trim()).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param<T> {
    Value(T),
    /// `$n`: return word of action `n`, 1-based.
    Return(u8),
}

impl<T> From<T> for Param<T> {
    fn from(value: T) -> Self {
        Param::Value(value)
    }
}

fn check_reference(raw: &str, reference: u8) -> Result<u8, ParseParamError> {
    if reference == 0 || reference >= SUB_DATA_INDEX_START {
        return Err(ParseParamError {
            raw: raw.to_string(),
            reason: format!("reference must be in 1..{SUB_DATA_INDEX_START}"),
        });
    }
    Ok(reference)
}

impl<T: WordValue> Param<T> {
    /// `$index`, checked the same way the `$n` parser checks it.
    pub fn output(index: u8) -> Result<Self, ParseParamError> {
        check_reference(&format!("${index}"), index).map(Param::Return)
    }

    pub fn reference(&self) -> Option<u8> {
        match self {
            Param::Value(_) => None,
            Param::Return(index) => Some(*index),
        }
    }

    fn from_mapping(literal: T, mapping: u8) -> Self {
        if mapping == 0 {
            Param::Value(literal)
        } else {
            Param::Return(mapping)
        }
    }

    fn encoded(&self) -> T {
        match self {
            Param::Value(value) => *value,
            Param::Return(_) => T::PLACEHOLDER,
        }
    }

    /// Resolve against the return words of the actions before `action_index`.
    pub fn resolve(&self, action_index: usize, returns: &[B256]) -> Result<T, RevertReason> {
        match self {
            Param::Value(value) => Ok(*value),
            Param::Return(reference) => {
                let invalid = RevertReason::InvalidReference {
                    action_index,
                    reference: *reference,
                };
                if *reference == 0 || *reference >= SUB_DATA_INDEX_START {
                    return Err(invalid);
                }
                let position = usize::from(*reference) - 1;
                if position >= action_index {
                    return Err(invalid);
                }
                returns.get(position).map(|word| T::from_word(*word)).ok_or(invalid)
            }
        }
    }
}

impl<T: WordValue> FromStr for Param<T> {
    type Err = ParseParamError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if let Some(index) = trimmed.strip_prefix('$') {
            let reference = index.parse::<u8>().map_err(|e| ParseParamError {
                raw: raw.to_string(),
                reason: e.to_string(),
            })?;
            return check_reference(raw, reference).map(Param::Return);
        }
        T::parse_literal(trimmed)
            .map(Param::Value)
            .ok_or_else(|| ParseParamError {
                raw: raw.to_string(),
                reason: "not a literal of the expected type".to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    WrapEth {
        amount: Param<U256>,
    },
    UnwrapEth {
        amount: Param<U256>,
        to: Param<Address>,
    },
    SendToken {
        token: Param<Address>,
        to: Param<Address>,
        amount: Param<U256>,
    },
    PullToken {
        token: Param<Address>,
        from: Param<Address>,
        amount: Param<U256>,
    },
    SumInputs {
        a: Param<U256>,
        b: Param<U256>,
    },
    SubInputs {
        a: Param<U256>,
        b: Param<U256>,
    },
    ChangeProxyOwner {
        new_owner: Param<Address>,
    },
    AutomationV2Unsub {
        protocol: SubscriptionProtocol,
        cdp_id: Param<U256>,
    },
}

/// What an action sees while it runs inside a proxy.
pub struct ActionContext<'c, 'l> {
    pub proxy: Address,
    pub chain: &'c ChainConfig,
    pub layer: &'c mut CacheLayer<'l>,
}

fn malformed(kind: ActionKind, err: impl fmt::Display) -> RevertReason {
    RevertReason::MalformedCallData(format!("{kind}: {err}"))
}

impl Action {
    pub fn wrap_eth(amount: impl Into<Param<U256>>) -> Self {
        Self::WrapEth {
            amount: amount.into(),
        }
    }

    pub fn unwrap_eth(amount: impl Into<Param<U256>>, to: impl Into<Param<Address>>) -> Self {
        Self::UnwrapEth {
            amount: amount.into(),
            to: to.into(),
        }
    }

    pub fn send_token(
        token: impl Into<Param<Address>>,
        to: impl Into<Param<Address>>,
        amount: impl Into<Param<U256>>,
    ) -> Self {
        Self::SendToken {
            token: token.into(),
            to: to.into(),
            amount: amount.into(),
        }
    }

    pub fn pull_token(
        token: impl Into<Param<Address>>,
        from: impl Into<Param<Address>>,
        amount: impl Into<Param<U256>>,
    ) -> Self {
        Self::PullToken {
            token: token.into(),
            from: from.into(),
            amount: amount.into(),
        }
    }

    pub fn sum_inputs(a: impl Into<Param<U256>>, b: impl Into<Param<U256>>) -> Self {
        Self::SumInputs {
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn sub_inputs(a: impl Into<Param<U256>>, b: impl Into<Param<U256>>) -> Self {
        Self::SubInputs {
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn change_proxy_owner(new_owner: impl Into<Param<Address>>) -> Self {
        Self::ChangeProxyOwner {
            new_owner: new_owner.into(),
        }
    }

    pub fn automation_v2_unsub(
        protocol: SubscriptionProtocol,
        cdp_id: impl Into<Param<U256>>,
    ) -> Self {
        Self::AutomationV2Unsub {
            protocol,
            cdp_id: cdp_id.into(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::WrapEth { .. } => ActionKind::WrapEth,
            Self::UnwrapEth { .. } => ActionKind::UnwrapEth,
            Self::SendToken { .. } => ActionKind::SendToken,
            Self::PullToken { .. } => ActionKind::PullToken,
            Self::SumInputs { .. } => ActionKind::SumInputs,
            Self::SubInputs { .. } => ActionKind::SubInputs,
            Self::ChangeProxyOwner { .. } => ActionKind::ChangeProxyOwner,
            Self::AutomationV2Unsub { .. } => ActionKind::AutomationV2Unsub,
        }
    }

    /// ABI-encoded parameter struct; referenced slots hold zero.
    pub fn call_data(&self) -> Bytes {
        let encoded = match self {
            Self::WrapEth { amount } => abi::WrapEthParams {
                amount: amount.encoded(),
            }
            .abi_encode(),
            Self::UnwrapEth { amount, to } => abi::UnwrapEthParams {
                amount: amount.encoded(),
                to: to.encoded(),
            }
            .abi_encode(),
            Self::SendToken { token, to, amount } => abi::SendTokenParams {
                tokenAddr: token.encoded(),
                to: to.encoded(),
                amount: amount.encoded(),
            }
            .abi_encode(),
            Self::PullToken {
                token,
                from,
                amount,
            } => abi::PullTokenParams {
                tokenAddr: token.encoded(),
                from: from.encoded(),
                amount: amount.encoded(),
            }
            .abi_encode(),
            Self::SumInputs { a, b } => abi::SumInputsParams {
                a: a.encoded(),
                b: b.encoded(),
            }
            .abi_encode(),
            Self::SubInputs { a, b } => abi::SubInputsParams {
                a: a.encoded(),
                b: b.encoded(),
            }
            .abi_encode(),
            Self::ChangeProxyOwner { new_owner } => abi::ChangeProxyOwnerParams {
                newOwner: new_owner.encoded(),
            }
            .abi_encode(),
            Self::AutomationV2Unsub { protocol, cdp_id } => abi::AutomationV2UnsubParams {
                cdpId: cdp_id.encoded(),
                protocol: protocol.as_u8(),
            }
            .abi_encode(),
        };
        Bytes::from(encoded)
    }

    /// Reference carried by each mappable parameter, in mapping order.
    fn slot_references(&self) -> Vec<Option<u8>> {
        match self {
            Self::WrapEth { amount } => vec![amount.reference()],
            Self::UnwrapEth { amount, to } => vec![amount.reference(), to.reference()],
            Self::SendToken { token, to, amount } => {
                vec![token.reference(), to.reference(), amount.reference()]
            }
            Self::PullToken {
                token,
                from,
                amount,
            } => vec![token.reference(), from.reference(), amount.reference()],
            Self::SumInputs { a, b } | Self::SubInputs { a, b } => {
                vec![a.reference(), b.reference()]
            }
            Self::ChangeProxyOwner { new_owner } => vec![new_owner.reference()],
            Self::AutomationV2Unsub { cdp_id, .. } => vec![cdp_id.reference()],
        }
    }

    /// One entry per mappable parameter: 0 for a literal, `n` for `$n`.
    pub fn param_mapping(&self) -> Vec<u8> {
        self.slot_references()
            .into_iter()
            .map(|reference| reference.unwrap_or(0))
            .collect()
    }

    /// Every `$n` the action carries, including out-of-range ones a mapping cannot express.
    pub fn references(&self) -> Vec<u8> {
        self.slot_references().into_iter().flatten().collect()
    }

    /// Inverse of `call_data` + `param_mapping`. An empty mapping means every slot is literal.
    pub fn decode(
        kind: ActionKind,
        call_data: &[u8],
        mapping: &[u8],
    ) -> Result<Self, RevertReason> {
        if !mapping.is_empty() && mapping.len() != kind.mappable_params() {
            return Err(malformed(
                kind,
                format!(
                    "param mapping has {} entries, expected {}",
                    mapping.len(),
                    kind.mappable_params()
                ),
            ));
        }
        let slot = |i: usize| mapping.get(i).copied().unwrap_or(0);

        let action = match kind {
            ActionKind::WrapEth => {
                let p = abi::WrapEthParams::abi_decode(call_data, true)
                    .map_err(|e| malformed(kind, e))?;
                Self::WrapEth {
                    amount: Param::from_mapping(p.amount, slot(0)),
                }
            }
            ActionKind::UnwrapEth => {
                let p = abi::UnwrapEthParams::abi_decode(call_data, true)
                    .map_err(|e| malformed(kind, e))?;
                Self::UnwrapEth {
                    amount: Param::from_mapping(p.amount, slot(0)),
                    to: Param::from_mapping(p.to, slot(1)),
                }
            }
            ActionKind::SendToken => {
                let p = abi::SendTokenParams::abi_decode(call_data, true)
                    .map_err(|e| malformed(kind, e))?;
                Self::SendToken {
                    token: Param::from_mapping(p.tokenAddr, slot(0)),
                    to: Param::from_mapping(p.to, slot(1)),
                    amount: Param::from_mapping(p.amount, slot(2)),
                }
            }
            ActionKind::PullToken => {
                let p = abi::PullTokenParams::abi_decode(call_data, true)
                    .map_err(|e| malformed(kind, e))?;
                Self::PullToken {
                    token: Param::from_mapping(p.tokenAddr, slot(0)),
                    from: Param::from_mapping(p.from, slot(1)),
                    amount: Param::from_mapping(p.amount, slot(2)),
                }
            }
            ActionKind::SumInputs => {
                let p = abi::SumInputsParams::abi_decode(call_data, true)
                    .map_err(|e| malformed(kind, e))?;
                Self::SumInputs {
                    a: Param::from_mapping(p.a, slot(0)),
                    b: Param::from_mapping(p.b, slot(1)),
                }
            }
            ActionKind::SubInputs => {
                let p = abi::SubInputsParams::abi_decode(call_data, true)
                    .map_err(|e| malformed(kind, e))?;
                Self::SubInputs {
                    a: Param::from_mapping(p.a, slot(0)),
                    b: Param::from_mapping(p.b, slot(1)),
                }
            }
            ActionKind::ChangeProxyOwner => {
                let p = abi::ChangeProxyOwnerParams::abi_decode(call_data, true)
                    .map_err(|e| malformed(kind, e))?;
                Self::ChangeProxyOwner {
                    new_owner: Param::from_mapping(p.newOwner, slot(0)),
                }
            }
            ActionKind::AutomationV2Unsub => {
                let p = abi::AutomationV2UnsubParams::abi_decode(call_data, true)
                    .map_err(|e| malformed(kind, e))?;
                let protocol = SubscriptionProtocol::from_u8(p.protocol).ok_or_else(|| {
                    RevertReason::InvalidParameter(format!(
                        "unknown automation protocol {}",
                        p.protocol
                    ))
                })?;
                Self::AutomationV2Unsub {
                    protocol,
                    cdp_id: Param::from_mapping(p.cdpId, slot(0)),
                }
            }
        };
        Ok(action)
    }

    /// Calldata for calling the action contract directly through a proxy. The direct form has
    /// no param mapping, so referenced slots go out as zero.
    pub fn encode_for_direct_call(&self) -> Bytes {
        let call = abi::IActionBase::executeActionDirectCall {
            _callData: self.call_data(),
        };
        Bytes::from(call.abi_encode())
    }

    /// `(target, data)` pair for `proxy.execute(target, data)`.
    pub fn encode_for_proxy_call(&self, registry: &Registry) -> Result<(Address, Bytes), ForkError> {
        let target = registry.get_addr(self.kind().name())?;
        Ok((target, self.encode_for_direct_call()))
    }

    /// Run the action at position `index`, with `returns` holding the words of earlier actions.
    pub(crate) fn execute(
        &self,
        index: usize,
        returns: &[B256],
        ctx: &mut ActionContext<'_, '_>,
    ) -> Result<B256, RevertReason> {
        match self {
            Self::WrapEth { amount } => basic::wrap_eth(ctx, amount.resolve(index, returns)?),
            Self::UnwrapEth { amount, to } => basic::unwrap_eth(
                ctx,
                amount.resolve(index, returns)?,
                to.resolve(index, returns)?,
            ),
            Self::SendToken { token, to, amount } => basic::send_token(
                ctx,
                token.resolve(index, returns)?,
                to.resolve(index, returns)?,
                amount.resolve(index, returns)?,
            ),
            Self::PullToken {
                token,
                from,
                amount,
            } => basic::pull_token(
                ctx,
                token.resolve(index, returns)?,
                from.resolve(index, returns)?,
                amount.resolve(index, returns)?,
            ),
            Self::SumInputs { a, b } => {
                math::sum_inputs(a.resolve(index, returns)?, b.resolve(index, returns)?)
            }
            Self::SubInputs { a, b } => {
                math::sub_inputs(a.resolve(index, returns)?, b.resolve(index, returns)?)
            }
            Self::ChangeProxyOwner { new_owner } => {
                proxy::change_proxy_owner(ctx, new_owner.resolve(index, returns)?)
            }
            Self::AutomationV2Unsub { protocol, cdp_id } => {
                automation::unsubscribe(ctx, *protocol, cdp_id.resolve(index, returns)?)
            }
        }
    }
}
