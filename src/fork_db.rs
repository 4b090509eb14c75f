//! In-process forked chain: committed world state, block head and the archive it resets from.

use crate::config::chains::ChainConfig;
use crate::error::{ForkError, HarnessError, Result, RevertReason};
use crate::ledger::{
    CacheLayer, LedgerEvent, LedgerState, LedgerView, SubscriptionKey, SubscriptionPosition,
};
use crate::registry::Registry;
use crate::utils::constants::PROXY_FACTORY;
use alloy::primitives::{Address, U256};
use std::collections::{BTreeMap, HashSet};

/// Everything a fork reset restores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldState {
    pub ledger: LedgerState,
    pub registry: Registry,
}

/// Pinned historical states. The state at block `n` is the latest pin at or before `n`.
#[derive(Debug, Clone, Default)]
pub struct ChainArchive {
    states: BTreeMap<u64, WorldState>,
}

impl ChainArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, block: u64, state: WorldState) -> Self {
        self.pin(block, state);
        self
    }

    pub fn pin(&mut self, block: u64, state: WorldState) {
        self.states.insert(block, state);
    }

    pub fn earliest(&self) -> Option<u64> {
        self.states.keys().next().copied()
    }

    pub fn state_at(&self, block: u64) -> std::result::Result<WorldState, ForkError> {
        self.states
            .range(..=block)
            .next_back()
            .map(|(_, state)| state.clone())
            .ok_or(ForkError::BlockUnavailable {
                requested: block,
                earliest: self.earliest(),
            })
    }
}

pub struct ForkDB {
    pub(crate) chain: ChainConfig,
    pub(crate) fork_block: u64,
    pub(crate) head: u64,
    pub(crate) archive: ChainArchive,
    pub(crate) state: WorldState,
    pub(crate) impersonated: HashSet<Address>,
    local_signers: Vec<Address>,
}

impl ForkDB {
    /// Fork `archive` at `fork_block`. `local_signers` can always sign.
    pub fn new(
        chain: ChainConfig,
        fork_block: u64,
        archive: ChainArchive,
        local_signers: Vec<Address>,
    ) -> Result<Self> {
        let state = archive.state_at(fork_block)?;
        tracing::info!(
            "[FORK] {} forked at block {} with {} local signers",
            chain.name,
            fork_block,
            local_signers.len()
        );
        Ok(Self {
            chain,
            fork_block,
            head: fork_block,
            archive,
            state,
            impersonated: HashSet::new(),
            local_signers,
        })
    }

    pub fn block_number(&self) -> u64 {
        self.head
    }

    pub fn fork_block(&self) -> u64 {
        self.fork_block
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    pub fn registry(&self) -> &Registry {
        &self.state.registry
    }

    pub fn ledger(&self) -> &LedgerState {
        &self.state.ledger
    }

    pub fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.state.ledger.balance_of(token, holder)
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state.ledger.allowance(token, owner, spender)
    }

    pub fn subscription(&self, key: SubscriptionKey) -> Option<SubscriptionPosition> {
        self.state.ledger.subscription(key)
    }

    pub fn proxy_owner(&self, proxy: Address) -> Option<Address> {
        self.state.ledger.proxy_owner(proxy)
    }

    pub fn proxy_of(&self, user: Address) -> Option<Address> {
        self.state.ledger.proxy_of(user)
    }

    pub fn can_sign(&self, holder: Address) -> bool {
        self.local_signers.contains(&holder) || self.impersonated.contains(&holder)
    }

    /// Swap in the archived state at `block` and drop every local change.
    pub(crate) fn load_block(&mut self, block: u64) -> std::result::Result<(), ForkError> {
        self.state = self.archive.state_at(block)?;
        self.head = block;
        self.impersonated.clear();
        Ok(())
    }

    /// Run `f` as a transaction signed by `caller`.
    pub(crate) fn transact<T, F>(
        &mut self,
        caller: Address,
        label: &str,
        f: F,
    ) -> Result<(T, Vec<LedgerEvent>)>
    where
        F: FnOnce(&mut CacheLayer<'_>, &Registry, &ChainConfig) -> Result<T>,
    {
        if !self.can_sign(caller) {
            tracing::warn!("[FORK] {} rejected: {} cannot sign", label, caller);
            return Err(ForkError::CannotSign(caller).into());
        }
        self.apply(label, f)
    }

    /// Atomic path shared by every state-changing call: commit the layer on success, drop it
    /// otherwise. A commit mines one block.
    fn apply<T, F>(&mut self, label: &str, f: F) -> Result<(T, Vec<LedgerEvent>)>
    where
        F: FnOnce(&mut CacheLayer<'_>, &Registry, &ChainConfig) -> Result<T>,
    {
        let mut layer = CacheLayer::new(&self.state.ledger);
        match f(&mut layer, &self.state.registry, &self.chain) {
            Ok(value) => {
                let (diff, events) = layer.into_parts();
                if diff.is_empty() {
                    tracing::debug!("[FORK] {} wrote no state", label);
                }
                self.state.ledger.commit(diff);
                self.head += 1;
                tracing::info!(
                    "[FORK] {} committed in block {} ({} events)",
                    label,
                    self.head,
                    events.len()
                );
                Ok((value, events))
            }
            Err(err) => {
                tracing::warn!("[FORK] {} reverted at block {}: {}", label, self.head, err);
                Err(err)
            }
        }
    }

    /// Proxy of `user`, building one through the proxy factory on first use. Building is
    /// permissionless, so `user` does not have to sign.
    pub fn get_proxy(&mut self, user: Address) -> Result<Address> {
        if let Some(proxy) = self.proxy_of(user) {
            return Ok(proxy);
        }
        let (proxy, _) = self.apply("build proxy", |layer, _, _| {
            let proxy = PROXY_FACTORY.create(layer.proxy_nonce());
            if layer.proxy_owner(proxy).is_some() {
                return Err(HarnessError::reverted(
                    None,
                    RevertReason::InvalidParameter(format!(
                        "proxy slot {proxy} already taken"
                    )),
                ));
            }
            layer.register_proxy(user, proxy);
            Ok(proxy)
        })?;
        tracing::info!("[WALLET] built proxy {} for {}", proxy, user);
        Ok(proxy)
    }
}
