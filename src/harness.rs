//! Per-scenario world construction and the plain-account wallet helpers scenarios set up with.

use crate::cheatcodes::Cheatcodes;
use crate::error::{ConfigError, HarnessError, Result, RevertReason};
use crate::executor::{ExecutionReceipt, ProxyExecutor};
use crate::fork_db::{ChainArchive, ForkDB, WorldState};
use crate::ledger::{
    CacheLayer, LedgerEvent, LedgerState, LedgerView, SubscriptionKey, SubscriptionPosition,
};
use crate::registry::Registry;
use crate::utils::config::HarnessConfig;
use crate::utils::constants::{DEV_SIGNERS, PROXY_FACTORY};
use alloy::primitives::{address, Address, U256};

/// Maker vault with a live automation subscription at the default fork block.
pub const MCD_CDP_ID: u64 = 20_648;
pub const MCD_CDP_OWNER: Address = address!("8eceBBF3fA6d894476Cd9DD34D6A53DdD185233e");
pub const COMPOUND_OWNER: Address = address!("e10eB997d51C2AFCd3e0F80e0a984949b2ed3349");
pub const AAVE_OWNER: Address = address!("160FF555a7836d8bC027eDA92Fb524BecE5C9B88");

fn revert(reason: RevertReason) -> HarnessError {
    HarnessError::reverted(None, reason)
}

/// World at the pinned block: funded signers, the default registry and the subscribed
/// automation positions with their proxies.
fn seed_world(config: &HarnessConfig, signers: &[Address]) -> WorldState {
    let mut ledger = LedgerState::new();
    for signer in signers {
        ledger.set_balance(config.chain.native, *signer, config.signer_balance_wei);
    }

    let owners = [MCD_CDP_OWNER, COMPOUND_OWNER, AAVE_OWNER];
    let mut layer = CacheLayer::new(&ledger);
    let mut proxies = Vec::with_capacity(owners.len());
    for owner in owners {
        let proxy = PROXY_FACTORY.create(layer.proxy_nonce());
        layer.register_proxy(owner, proxy);
        proxies.push(proxy);
    }
    let positions = [
        SubscriptionKey::mcd(U256::from(MCD_CDP_ID)),
        SubscriptionKey::compound(proxies[1]),
        SubscriptionKey::aave(proxies[2]),
    ];
    for (key, proxy) in positions.into_iter().zip(proxies) {
        layer.set_subscription(
            key,
            SubscriptionPosition {
                subscribed: true,
                proxy,
            },
        );
    }
    let (diff, _) = layer.into_parts();
    ledger.commit(diff);

    WorldState {
        ledger,
        registry: Registry::with_defaults(),
    }
}

pub struct Fixture {
    fork: ForkDB,
    signers: Vec<Address>,
}

impl Fixture {
    pub fn new(config: &HarnessConfig) -> Result<Self> {
        if config.signer_count == 0 || config.signer_count > DEV_SIGNERS.len() {
            return Err(ConfigError::InvalidConfig(format!(
                "signer count {} outside 1..={}",
                config.signer_count,
                DEV_SIGNERS.len()
            ))
            .into());
        }
        let signers: Vec<Address> = DEV_SIGNERS
            .iter()
            .take(config.signer_count)
            .copied()
            .collect();
        let pinned_at = config.fork_block.min(config.chain.default_fork_block);
        let archive = ChainArchive::new().with_state(pinned_at, seed_world(config, &signers));
        let fork = ForkDB::new(config.chain.clone(), config.fork_block, archive, signers.clone())?;
        Ok(Self { fork, signers })
    }

    pub fn fork(&self) -> &ForkDB {
        &self.fork
    }

    pub fn fork_mut(&mut self) -> &mut ForkDB {
        &mut self.fork
    }

    pub fn executor(&mut self) -> ProxyExecutor<'_> {
        ProxyExecutor::new(&mut self.fork)
    }

    /// First local signer; every helper defaults to it in scenarios.
    pub fn sender(&self) -> Address {
        self.signers[0]
    }

    pub fn signer(&self, index: usize) -> Option<Address> {
        self.signers.get(index).copied()
    }

    pub fn weth(&self) -> Address {
        self.fork.chain().weth
    }

    pub fn native(&self) -> Address {
        self.fork.chain().native
    }

    pub fn get_addr(&self, name: &str) -> Result<Address> {
        Ok(self.fork.registry().get_addr(name)?)
    }

    pub fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.fork.balance_of(token, holder)
    }

    pub fn proxy(&mut self, user: Address) -> Result<Address> {
        self.fork.get_proxy(user)
    }

    /// Wraps `amount` of `from`'s native balance.
    pub fn deposit_to_weth(&mut self, from: Address, amount: U256) -> Result<()> {
        self.fork.transact(from, "deposit WETH", |layer, _, chain| {
            layer.debit(chain.native, from, amount).map_err(revert)?;
            layer.credit(chain.weth, from, amount).map_err(revert)?;
            layer.emit(LedgerEvent::Deposit {
                token: chain.weth,
                holder: from,
                amount,
            });
            Ok(())
        })?;
        tracing::debug!("[WALLET] {} wrapped {}", from, amount);
        Ok(())
    }

    pub fn withdraw_weth(&mut self, from: Address, amount: U256) -> Result<()> {
        self.fork.transact(from, "withdraw WETH", |layer, _, chain| {
            layer.debit(chain.weth, from, amount).map_err(revert)?;
            layer.credit(chain.native, from, amount).map_err(revert)?;
            layer.emit(LedgerEvent::Withdrawal {
                token: chain.weth,
                holder: from,
                amount,
            });
            Ok(())
        })?;
        tracing::debug!("[WALLET] {} unwrapped {}", from, amount);
        Ok(())
    }

    /// ERC20 `transfer` from a plain account.
    pub fn send(&mut self, from: Address, token: Address, to: Address, amount: U256) -> Result<()> {
        self.fork.transact(from, "send", |layer, _, chain| {
            if chain.is_native(token) {
                return Err(revert(RevertReason::InvalidParameter(
                    "use send_ether for the native asset".to_string(),
                )));
            }
            layer.transfer(token, from, to, amount).map_err(revert)
        })?;
        tracing::debug!("[WALLET] {} sent {} of {} to {}", from, amount, token, to);
        Ok(())
    }

    pub fn send_ether(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
        self.fork.transact(from, "send ether", |layer, _, chain| {
            layer.transfer(chain.native, from, to, amount).map_err(revert)
        })?;
        tracing::debug!("[WALLET] {} sent {} wei to {}", from, amount, to);
        Ok(())
    }

    /// Infinite approval, as scenarios use before a pull.
    pub fn approve(&mut self, owner: Address, token: Address, spender: Address) -> Result<()> {
        self.approve_amount(owner, token, spender, U256::MAX)
    }

    pub fn approve_amount(
        &mut self,
        owner: Address,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<()> {
        self.fork.transact(owner, "approve", |layer, _, _| {
            layer.approve(token, owner, spender, amount);
            Ok(())
        })?;
        Ok(())
    }

    /// `proxy.execute(registry[name], call_data)` sent by `caller`.
    pub fn execute_action(
        &mut self,
        name: &str,
        call_data: &[u8],
        proxy: Address,
        caller: Address,
    ) -> Result<ExecutionReceipt> {
        let target = self.get_addr(name)?;
        self.executor()
            .execute(caller, proxy, target, call_data, U256::ZERO)
    }

    pub fn subscription(&self, key: SubscriptionKey) -> Option<SubscriptionPosition> {
        self.fork.subscription(key)
    }

    pub fn set_balance(&mut self, token: Address, holder: Address, amount: U256) {
        self.fork.set_balance(token, holder, amount);
    }

    pub fn impersonate(&mut self, holder: Address) {
        self.fork.impersonate(holder);
    }

    pub fn stop_impersonating(&mut self, holder: Address) {
        self.fork.stop_impersonating(holder);
    }
}
