//! Token balances, allowances, proxy ownership and automation subscriptions.
//!
//! `LedgerState` is the committed state. Transactions never write to it directly: they run
//! against a `CacheLayer` that overlays pending writes on the committed state, and the layer's
//! `StateDiff` is applied only when the whole transaction succeeds.

pub mod events;

use crate::error::RevertReason;
use crate::utils::word::word_from_address;
use alloy::primitives::{Address, B256, U256};
use std::collections::HashMap;

pub use events::LedgerEvent;

type BalanceKey = (Address, Address);
type AllowanceKey = (Address, Address, Address);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubscriptionProtocol {
    Mcd,
    Compound,
    Aave,
}

impl SubscriptionProtocol {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Mcd),
            1 => Some(Self::Compound),
            2 => Some(Self::Aave),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Mcd => 0,
            Self::Compound => 1,
            Self::Aave => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mcd => "mcd",
            Self::Compound => "compound",
            Self::Aave => "aave",
        }
    }
}

/// Mcd positions are keyed by cdp id; Compound and Aave by the subscribed proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    pub protocol: SubscriptionProtocol,
    pub key: B256,
}

impl SubscriptionKey {
    pub fn mcd(cdp_id: U256) -> Self {
        Self {
            protocol: SubscriptionProtocol::Mcd,
            key: B256::from(cdp_id.to_be_bytes::<32>()),
        }
    }

    pub fn compound(proxy: Address) -> Self {
        Self {
            protocol: SubscriptionProtocol::Compound,
            key: word_from_address(proxy),
        }
    }

    pub fn aave(proxy: Address) -> Self {
        Self {
            protocol: SubscriptionProtocol::Aave,
            key: word_from_address(proxy),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionPosition {
    pub subscribed: bool,
    pub proxy: Address,
}

/// Read access shared by committed state and pending layers.
pub trait LedgerView {
    fn balance_of(&self, token: Address, holder: Address) -> U256;
    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256;
    fn proxy_owner(&self, proxy: Address) -> Option<Address>;
    fn proxy_of(&self, user: Address) -> Option<Address>;
    fn subscription(&self, key: SubscriptionKey) -> Option<SubscriptionPosition>;
    fn proxy_nonce(&self) -> u64;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    balances: HashMap<BalanceKey, U256>,
    allowances: HashMap<AllowanceKey, U256>,
    proxy_owners: HashMap<Address, Address>,
    proxy_registry: HashMap<Address, Address>,
    subscriptions: HashMap<SubscriptionKey, SubscriptionPosition>,
    proxy_nonce: u64,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct override outside any transaction. Zero removes the entry.
    pub fn set_balance(&mut self, token: Address, holder: Address, amount: U256) {
        if amount.is_zero() {
            self.balances.remove(&(token, holder));
        } else {
            self.balances.insert((token, holder), amount);
        }
    }

    pub fn set_subscription(&mut self, key: SubscriptionKey, position: SubscriptionPosition) {
        self.subscriptions.insert(key, position);
    }

    pub fn commit(&mut self, diff: StateDiff) {
        for ((token, holder), amount) in diff.balances {
            self.set_balance(token, holder, amount);
        }
        for (key, amount) in diff.allowances {
            if amount.is_zero() {
                self.allowances.remove(&key);
            } else {
                self.allowances.insert(key, amount);
            }
        }
        self.proxy_owners.extend(diff.proxy_owners);
        self.proxy_registry.extend(diff.proxy_registry);
        self.subscriptions.extend(diff.subscriptions);
        if let Some(nonce) = diff.proxy_nonce {
            self.proxy_nonce = nonce;
        }
    }
}

impl LedgerView for LedgerState {
    fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.balances
            .get(&(token, holder))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    fn proxy_owner(&self, proxy: Address) -> Option<Address> {
        self.proxy_owners.get(&proxy).copied()
    }

    fn proxy_of(&self, user: Address) -> Option<Address> {
        self.proxy_registry.get(&user).copied()
    }

    fn subscription(&self, key: SubscriptionKey) -> Option<SubscriptionPosition> {
        self.subscriptions.get(&key).copied()
    }

    fn proxy_nonce(&self) -> u64 {
        self.proxy_nonce
    }
}

/// Pending writes of one transaction.
#[derive(Debug, Clone, Default)]
pub struct StateDiff {
    balances: HashMap<BalanceKey, U256>,
    allowances: HashMap<AllowanceKey, U256>,
    proxy_owners: HashMap<Address, Address>,
    proxy_registry: HashMap<Address, Address>,
    subscriptions: HashMap<SubscriptionKey, SubscriptionPosition>,
    proxy_nonce: Option<u64>,
}

impl StateDiff {
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
            && self.allowances.is_empty()
            && self.proxy_owners.is_empty()
            && self.proxy_registry.is_empty()
            && self.subscriptions.is_empty()
            && self.proxy_nonce.is_none()
    }
}

/// Write overlay over committed state. Dropping it discards every pending write.
pub struct CacheLayer<'a> {
    base: &'a LedgerState,
    diff: StateDiff,
    events: Vec<LedgerEvent>,
}

impl<'a> CacheLayer<'a> {
    pub fn new(base: &'a LedgerState) -> Self {
        Self {
            base,
            diff: StateDiff::default(),
            events: Vec::new(),
        }
    }

    pub fn into_parts(self) -> (StateDiff, Vec<LedgerEvent>) {
        (self.diff, self.events)
    }

    pub fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    fn write_balance(&mut self, token: Address, holder: Address, amount: U256) {
        self.diff.balances.insert((token, holder), amount);
    }

    pub fn credit(
        &mut self,
        token: Address,
        holder: Address,
        amount: U256,
    ) -> Result<(), RevertReason> {
        let current = self.balance_of(token, holder);
        let next = current
            .checked_add(amount)
            .ok_or(RevertReason::ArithmeticOverflow {
                a: current,
                b: amount,
            })?;
        self.write_balance(token, holder, next);
        Ok(())
    }

    pub fn debit(
        &mut self,
        token: Address,
        holder: Address,
        amount: U256,
    ) -> Result<(), RevertReason> {
        let available = self.balance_of(token, holder);
        let next = available
            .checked_sub(amount)
            .ok_or(RevertReason::InsufficientBalance {
                token,
                holder,
                needed: amount,
                available,
            })?;
        self.write_balance(token, holder, next);
        Ok(())
    }

    pub fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), RevertReason> {
        self.debit(token, from, amount)?;
        self.credit(token, to, amount)?;
        self.emit(LedgerEvent::Transfer {
            token,
            from,
            to,
            amount,
        });
        Ok(())
    }

    pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.diff.allowances.insert((token, owner, spender), amount);
        self.emit(LedgerEvent::Approval {
            token,
            owner,
            spender,
            amount,
        });
    }

    /// Infinite (`U256::MAX`) approvals are never decremented.
    pub fn spend_allowance(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), RevertReason> {
        if owner == spender {
            return Ok(());
        }
        let available = self.allowance(token, owner, spender);
        if available == U256::MAX {
            return Ok(());
        }
        let next = available
            .checked_sub(amount)
            .ok_or(RevertReason::InsufficientAllowance {
                token,
                owner,
                spender,
                needed: amount,
                available,
            })?;
        self.diff.allowances.insert((token, owner, spender), next);
        Ok(())
    }

    pub fn set_proxy_owner(&mut self, proxy: Address, owner: Address) {
        self.diff.proxy_owners.insert(proxy, owner);
    }

    pub fn register_proxy(&mut self, user: Address, proxy: Address) {
        self.diff.proxy_registry.insert(user, proxy);
        self.diff.proxy_owners.insert(proxy, user);
        self.diff.proxy_nonce = Some(self.proxy_nonce() + 1);
        self.emit(LedgerEvent::ProxyCreated { user, proxy });
    }

    pub fn set_subscription(&mut self, key: SubscriptionKey, position: SubscriptionPosition) {
        self.diff.subscriptions.insert(key, position);
    }
}

impl LedgerView for CacheLayer<'_> {
    fn balance_of(&self, token: Address, holder: Address) -> U256 {
        match self.diff.balances.get(&(token, holder)) {
            Some(amount) => *amount,
            None => self.base.balance_of(token, holder),
        }
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        match self.diff.allowances.get(&(token, owner, spender)) {
            Some(amount) => *amount,
            None => self.base.allowance(token, owner, spender),
        }
    }

    fn proxy_owner(&self, proxy: Address) -> Option<Address> {
        self.diff
            .proxy_owners
            .get(&proxy)
            .copied()
            .or_else(|| self.base.proxy_owner(proxy))
    }

    fn proxy_of(&self, user: Address) -> Option<Address> {
        self.diff
            .proxy_registry
            .get(&user)
            .copied()
            .or_else(|| self.base.proxy_of(user))
    }

    fn subscription(&self, key: SubscriptionKey) -> Option<SubscriptionPosition> {
        self.diff
            .subscriptions
            .get(&key)
            .copied()
            .or_else(|| self.base.subscription(key))
    }

    fn proxy_nonce(&self) -> u64 {
        self.diff.proxy_nonce.unwrap_or(self.base.proxy_nonce)
    }
}
