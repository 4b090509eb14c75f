use alloy::primitives::{Address, U256};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("execution reverted (step {step:?}): {reason}")]
    Reverted {
        /// Zero-based index of the failing action, `None` when the batch failed before dispatch.
        step: Option<usize>,
        reason: RevertReason,
    },
    #[error("fork error: {0}")]
    Fork(#[from] ForkError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl HarnessError {
    pub fn reverted(step: Option<usize>, reason: RevertReason) -> Self {
        Self::Reverted { step, reason }
    }

    pub fn revert_reason(&self) -> Option<&RevertReason> {
        match self {
            Self::Reverted { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, Self::Reverted { .. })
    }
}

/// Reasons a transaction reverts. Any of these rolls back the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevertReason {
    #[error("arithmetic overflow: {a} + {b}")]
    ArithmeticOverflow { a: U256, b: U256 },
    #[error("arithmetic underflow: {a} - {b}")]
    ArithmeticUnderflow { a: U256, b: U256 },
    #[error("insufficient balance of {token} for {holder}: need {needed}, have {available}")]
    InsufficientBalance {
        token: Address,
        holder: Address,
        needed: U256,
        available: U256,
    },
    #[error("insufficient allowance of {token} from {owner} to {spender}: need {needed}, have {available}")]
    InsufficientAllowance {
        token: Address,
        owner: Address,
        spender: Address,
        needed: U256,
        available: U256,
    },
    #[error("invalid return reference ${reference} at action {action_index}")]
    InvalidReference { action_index: usize, reference: u8 },
    #[error("caller {caller} is not authorized (owner {owner})")]
    Unauthorized { caller: Address, owner: Address },
    #[error("no contract at {0}")]
    UnknownTarget(Address),
    #[error("no action registered for id 0x{0}")]
    UnknownAction(String),
    #[error("malformed call data: {0}")]
    MalformedCallData(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForkError {
    #[error("block {requested} is not available (earliest pinned block {earliest:?})")]
    BlockUnavailable {
        requested: u64,
        earliest: Option<u64>,
    },
    #[error("no key or impersonation for {0}")]
    CannotSign(Address),
    #[error("contract `{0}` is not in the registry")]
    UnknownContract(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse parameter `{raw}`: {reason}")]
pub struct ParseParamError {
    pub raw: String,
    pub reason: String,
}
