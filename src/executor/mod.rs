//! Proxy execution: authorization, dispatch to the recipe executor or an action contract, and
//! atomic commit through the fork.

pub mod verifier;

use crate::actions::abi::{IActionBase, IDSProxy};
use crate::actions::{Action, ActionContext};
use crate::config::chains::ChainConfig;
use crate::error::{HarnessError, Result, RevertReason};
use crate::fork_db::ForkDB;
use crate::ledger::{CacheLayer, LedgerEvent, LedgerView};
use crate::recipe::Recipe;
use crate::registry::{ContractKind, Registry};
use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolCall;

/// Outcome of a committed proxy call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReceipt {
    /// Block the transaction was mined in.
    pub block_number: u64,
    /// One word per executed action, in order.
    pub return_values: Vec<B256>,
    pub events: Vec<LedgerEvent>,
}

impl ExecutionReceipt {
    pub fn return_value(&self, index: usize) -> Option<B256> {
        self.return_values.get(index).copied()
    }

    pub fn events_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a LedgerEvent> + 'a {
        self.events.iter().filter(move |event| event.name() == name)
    }
}

fn reverted(step: Option<usize>) -> impl Fn(RevertReason) -> HarnessError {
    move |reason| HarnessError::reverted(step, reason)
}

pub struct ProxyExecutor<'a> {
    fork: &'a mut ForkDB,
}

impl<'a> ProxyExecutor<'a> {
    pub fn new(fork: &'a mut ForkDB) -> Self {
        Self { fork }
    }

    pub fn fork(&self) -> &ForkDB {
        self.fork
    }

    pub fn owner(&self, proxy: Address) -> Option<Address> {
        self.fork.proxy_owner(proxy)
    }

    /// `proxy.execute(target, call_data)` sent by `caller` with `value` attached. Either every
    /// effect commits and one block is mined, or nothing changes.
    pub fn execute(
        &mut self,
        caller: Address,
        proxy: Address,
        target: Address,
        call_data: &[u8],
        value: U256,
    ) -> Result<ExecutionReceipt> {
        let label = format!("proxy {proxy} -> {target}");
        let (return_values, events) =
            self.fork
                .transact(caller, &label, |layer, registry, chain| {
                    let owner = layer
                        .proxy_owner(proxy)
                        .ok_or(RevertReason::UnknownTarget(proxy))
                        .map_err(reverted(None))?;
                    if owner != caller {
                        return Err(HarnessError::reverted(
                            None,
                            RevertReason::Unauthorized { caller, owner },
                        ));
                    }
                    if !value.is_zero() {
                        layer
                            .transfer(chain.native, caller, proxy, value)
                            .map_err(reverted(None))?;
                    }
                    dispatch(layer, registry, chain, proxy, target, call_data)
                })?;

        tracing::info!(
            "[EXEC] {} ran {} actions in block {}",
            proxy,
            return_values.len(),
            self.fork.block_number()
        );
        Ok(ExecutionReceipt {
            block_number: self.fork.block_number(),
            return_values,
            events,
        })
    }

    /// Raw `IDSProxy.execute(address,bytes)` calldata, as a wallet would submit it.
    pub fn submit(
        &mut self,
        caller: Address,
        proxy: Address,
        proxy_call_data: &[u8],
        value: U256,
    ) -> Result<ExecutionReceipt> {
        let call = IDSProxy::executeCall::abi_decode(proxy_call_data, true).map_err(|e| {
            HarnessError::reverted(None, RevertReason::MalformedCallData(format!("proxy: {e}")))
        })?;
        self.execute(caller, proxy, call._target, &call._data, value)
    }

    pub fn execute_recipe(
        &mut self,
        caller: Address,
        proxy: Address,
        recipe: &Recipe,
    ) -> Result<ExecutionReceipt> {
        // A zero `$n` has no param-mapping encoding and would decode as a literal.
        if let Err(reason) = recipe.check_references() {
            let step = match reason {
                RevertReason::InvalidReference { action_index, .. } => Some(action_index),
                _ => None,
            };
            return Err(HarnessError::reverted(step, reason));
        }
        let (target, data) = recipe.encode_for_proxy_call(self.fork.registry())?;
        tracing::debug!(
            "[RECIPE] submitting `{}` with {} actions",
            recipe.name,
            recipe.len()
        );
        self.execute(caller, proxy, target, &data, U256::ZERO)
    }

    pub fn execute_action(
        &mut self,
        caller: Address,
        proxy: Address,
        action: &Action,
    ) -> Result<ExecutionReceipt> {
        // A lone action has no earlier return words to reference.
        if let Some(reference) = action.references().first() {
            return Err(HarnessError::reverted(
                Some(0),
                RevertReason::InvalidReference {
                    action_index: 0,
                    reference: *reference,
                },
            ));
        }
        let (target, data) = action.encode_for_proxy_call(self.fork.registry())?;
        self.execute(caller, proxy, target, &data, U256::ZERO)
    }

    /// Hand `proxy` to `new_owner`. Only the current owner may do this.
    pub fn change_owner(
        &mut self,
        caller: Address,
        proxy: Address,
        new_owner: Address,
    ) -> Result<ExecutionReceipt> {
        if new_owner == Address::ZERO {
            return Err(HarnessError::reverted(
                None,
                RevertReason::InvalidParameter("new proxy owner is the zero address".to_string()),
            ));
        }
        let receipt = self.execute_action(caller, proxy, &Action::change_proxy_owner(new_owner))?;
        tracing::info!("[EXEC] {} now owned by {}", proxy, new_owner);
        Ok(receipt)
    }
}

fn dispatch(
    layer: &mut CacheLayer<'_>,
    registry: &Registry,
    chain: &ChainConfig,
    proxy: Address,
    target: Address,
    call_data: &[u8],
) -> Result<Vec<B256>> {
    match registry.kind_at(target) {
        Some(ContractKind::RecipeExecutor) => {
            let recipe = Recipe::decode(call_data, registry).map_err(reverted(None))?;
            tracing::debug!(
                "[RECIPE] `{}` with {} actions in {}",
                recipe.name,
                recipe.len(),
                proxy
            );
            run_actions(&recipe.actions, layer, chain, proxy)
        }
        Some(ContractKind::Action(kind)) => {
            let call = IActionBase::executeActionDirectCall::abi_decode(call_data, true)
                .map_err(|e| {
                    HarnessError::reverted(
                        None,
                        RevertReason::MalformedCallData(format!("{kind}: {e}")),
                    )
                })?;
            let action = Action::decode(kind, &call._callData, &[]).map_err(reverted(None))?;
            run_actions(std::slice::from_ref(&action), layer, chain, proxy)
        }
        None => Err(HarnessError::reverted(
            None,
            RevertReason::UnknownTarget(target),
        )),
    }
}

/// Actions run strictly in order; each sees the return words of the ones before it.
fn run_actions(
    actions: &[Action],
    layer: &mut CacheLayer<'_>,
    chain: &ChainConfig,
    proxy: Address,
) -> Result<Vec<B256>> {
    let mut returns = Vec::with_capacity(actions.len());
    for (index, action) in actions.iter().enumerate() {
        let word = {
            let mut ctx = ActionContext {
                proxy,
                chain,
                layer: &mut *layer,
            };
            action
                .execute(index, &returns, &mut ctx)
                .map_err(reverted(Some(index)))?
        };
        layer.emit(LedgerEvent::ActionExecuted {
            index,
            action: action.kind().name(),
            return_value: word,
        });
        returns.push(word);
    }
    Ok(returns)
}
