//! Test-only control over the fork. Nothing on the execution path calls these.

use crate::error::ForkError;
use crate::fork_db::ForkDB;
use crate::ledger::{SubscriptionKey, SubscriptionPosition};
use alloy::primitives::{Address, U256};

pub trait Cheatcodes {
    /// Replace the world state with the archive's state at `block` and move the head there.
    /// Local changes and impersonations are dropped.
    fn reset_to_block(&mut self, block: u64) -> Result<(), ForkError>;

    /// `reset_to_block` at the configured fork block.
    fn reset(&mut self) -> Result<(), ForkError>;

    fn impersonate(&mut self, holder: Address);

    fn stop_impersonating(&mut self, holder: Address);

    /// Overwrite a balance without a transaction.
    fn set_balance(&mut self, token: Address, holder: Address, amount: U256);

    fn set_subscription(&mut self, key: SubscriptionKey, position: SubscriptionPosition);

    /// Fresh deployment of a registry contract.
    fn redeploy(&mut self, name: &str) -> Result<Address, ForkError>;
}

impl Cheatcodes for ForkDB {
    fn reset_to_block(&mut self, block: u64) -> Result<(), ForkError> {
        self.load_block(block)?;
        tracing::info!("[FORK] reset to block {}", block);
        Ok(())
    }

    fn reset(&mut self) -> Result<(), ForkError> {
        let block = self.fork_block;
        self.reset_to_block(block)
    }

    fn impersonate(&mut self, holder: Address) {
        if self.impersonated.insert(holder) {
            tracing::debug!("[FORK] impersonating {}", holder);
        }
    }

    fn stop_impersonating(&mut self, holder: Address) {
        if self.impersonated.remove(&holder) {
            tracing::debug!("[FORK] stopped impersonating {}", holder);
        }
    }

    fn set_balance(&mut self, token: Address, holder: Address, amount: U256) {
        self.state.ledger.set_balance(token, holder, amount);
        tracing::debug!("[FORK] balance of {} in {} set to {}", holder, token, amount);
    }

    fn set_subscription(&mut self, key: SubscriptionKey, position: SubscriptionPosition) {
        self.state.ledger.set_subscription(key, position);
    }

    fn redeploy(&mut self, name: &str) -> Result<Address, ForkError> {
        self.state.registry.redeploy(name)
    }
}
