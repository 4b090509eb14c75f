use super::SubscriptionProtocol;
use alloy::primitives::{Address, B256, U256};

/// Effects recorded while a transaction runs. Only committed transactions surface them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    Transfer {
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    },
    Approval {
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    },
    Deposit {
        token: Address,
        holder: Address,
        amount: U256,
    },
    Withdrawal {
        token: Address,
        holder: Address,
        amount: U256,
    },
    ProxyCreated {
        user: Address,
        proxy: Address,
    },
    OwnerChanged {
        proxy: Address,
        previous: Address,
        new: Address,
    },
    Unsubscribed {
        protocol: SubscriptionProtocol,
        key: B256,
        proxy: Address,
    },
    ActionExecuted {
        index: usize,
        action: &'static str,
        return_value: B256,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "Transfer",
            Self::Approval { .. } => "Approval",
            Self::Deposit { .. } => "Deposit",
            Self::Withdrawal { .. } => "Withdrawal",
            Self::ProxyCreated { .. } => "ProxyCreated",
            Self::OwnerChanged { .. } => "OwnerChanged",
            Self::Unsubscribed { .. } => "Unsubscribed",
            Self::ActionExecuted { .. } => "ActionExecuted",
        }
    }
}
