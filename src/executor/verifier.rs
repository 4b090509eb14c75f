//! Before/after balance snapshots for asserting what a transaction moved.

use crate::fork_db::ForkDB;
use alloy::primitives::{Address, U256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBalanceDelta {
    pub token: Address,
    pub holder: Address,
    pub initial: U256,
    pub final_balance: U256,
}

impl TokenBalanceDelta {
    pub fn gained(&self) -> U256 {
        self.final_balance.saturating_sub(self.initial)
    }

    pub fn lost(&self) -> U256 {
        self.initial.saturating_sub(self.final_balance)
    }

    pub fn is_unchanged(&self) -> bool {
        self.initial == self.final_balance
    }
}

/// Balances of a fixed set of `(token, holder)` pairs, captured at construction.
#[derive(Debug, Clone)]
pub struct BalanceWatch {
    snapshots: Vec<(Address, Address, U256)>,
}

impl BalanceWatch {
    pub fn snapshot(fork: &ForkDB, pairs: &[(Address, Address)]) -> Self {
        let snapshots = pairs
            .iter()
            .map(|(token, holder)| (*token, *holder, fork.balance_of(*token, *holder)))
            .collect();
        Self { snapshots }
    }

    pub fn deltas(&self, fork: &ForkDB) -> Vec<TokenBalanceDelta> {
        self.snapshots
            .iter()
            .map(|(token, holder, initial)| TokenBalanceDelta {
                token: *token,
                holder: *holder,
                initial: *initial,
                final_balance: fork.balance_of(*token, *holder),
            })
            .collect()
    }

    pub fn delta(&self, fork: &ForkDB, token: Address, holder: Address) -> Option<TokenBalanceDelta> {
        self.deltas(fork)
            .into_iter()
            .find(|delta| delta.token == token && delta.holder == holder)
    }

    /// Every watched pair that moved.
    pub fn changed(&self, fork: &ForkDB) -> Vec<TokenBalanceDelta> {
        self.deltas(fork)
            .into_iter()
            .filter(|delta| !delta.is_unchanged())
            .collect()
    }
}
