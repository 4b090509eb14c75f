//! Ordered, named batches of actions and their on-chain encoding.

use crate::actions::abi::{IRecipeExecutor, RecipeData};
use crate::actions::{Action, ActionKind};
use crate::error::{ForkError, RevertReason};
use crate::registry::Registry;
use crate::utils::constants::SUB_DATA_INDEX_START;
use alloy::primitives::{Address, Bytes};
use alloy::sol_types::SolCall;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub name: String,
    pub actions: Vec<Action>,
}

impl Recipe {
    pub fn new(name: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            name: name.into(),
            actions,
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Every `$n` must name an action that runs earlier in this recipe.
    pub fn check_references(&self) -> Result<(), RevertReason> {
        for (index, action) in self.actions.iter().enumerate() {
            for reference in action.references() {
                let in_range = reference != 0
                    && reference < SUB_DATA_INDEX_START
                    && usize::from(reference) <= index;
                if !in_range {
                    return Err(RevertReason::InvalidReference {
                        action_index: index,
                        reference,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn to_recipe_data(&self) -> RecipeData {
        RecipeData {
            name: self.name.clone(),
            callData: self.actions.iter().map(Action::call_data).collect(),
            subData: Vec::new(),
            actionIds: self.actions.iter().map(|a| a.kind().id()).collect(),
            paramMapping: self.actions.iter().map(Action::param_mapping).collect(),
        }
    }

    /// `executeRecipe(recipe)` calldata for the recipe executor.
    pub fn encode(&self) -> Bytes {
        let call = IRecipeExecutor::executeRecipeCall {
            _currRecipe: self.to_recipe_data(),
        };
        Bytes::from(call.abi_encode())
    }

    /// `(target, data)` pair for `proxy.execute(target, data)`.
    pub fn encode_for_proxy_call(&self, registry: &Registry) -> Result<(Address, Bytes), ForkError> {
        Ok((registry.recipe_executor()?, self.encode()))
    }

    /// Rebuild a recipe from executor calldata, resolving action ids through `registry`.
    pub fn decode(call_data: &[u8], registry: &Registry) -> Result<Self, RevertReason> {
        let call = IRecipeExecutor::executeRecipeCall::abi_decode(call_data, true)
            .map_err(|e| RevertReason::MalformedCallData(format!("recipe: {e}")))?;
        Self::from_recipe_data(call._currRecipe, registry)
    }

    pub fn from_recipe_data(data: RecipeData, registry: &Registry) -> Result<Self, RevertReason> {
        let count = data.actionIds.len();
        if data.callData.len() != count || data.paramMapping.len() != count {
            return Err(RevertReason::MalformedCallData(format!(
                "recipe `{}` has {} ids, {} call data entries, {} mappings",
                data.name,
                count,
                data.callData.len(),
                data.paramMapping.len()
            )));
        }

        let mut actions = Vec::with_capacity(count);
        for ((id, call_data), mapping) in data
            .actionIds
            .iter()
            .zip(data.callData.iter())
            .zip(data.paramMapping.iter())
        {
            let kind: ActionKind = registry
                .kind_for_id(*id)
                .ok_or_else(|| RevertReason::UnknownAction(alloy::hex::encode(id)))?;
            actions.push(Action::decode(kind, call_data, mapping)?);
        }
        Ok(Self {
            name: data.name,
            actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Param;
    use crate::utils::constants::ether;
    use alloy::primitives::U256;

    const WETH: Address = Address::new([0xEE; 20]);
    const SENDER: Address = Address::new([0x01; 20]);

    fn sum_then_pull() -> Recipe {
        Recipe::new(
            "TestSumInputs",
            vec![
                Action::sum_inputs(ether(2), ether(7)),
                Action::pull_token(WETH, SENDER, Param::<U256>::output(1).expect("in range")),
            ],
        )
    }

    #[test]
    fn test_encoding_is_deterministic_and_ordered() {
        let recipe = sum_then_pull();
        assert_eq!(recipe.encode(), recipe.encode());

        let data = recipe.to_recipe_data();
        assert_eq!(data.actionIds[0], ActionKind::SumInputs.id());
        assert_eq!(data.actionIds[1], ActionKind::PullToken.id());
        assert_eq!(data.paramMapping, vec![vec![0, 0], vec![0, 0, 1]]);

        let swapped = Recipe::new(
            "TestSumInputs",
            vec![recipe.actions[1].clone(), recipe.actions[0].clone()],
        );
        assert_ne!(swapped.encode(), recipe.encode());
    }

    #[test]
    fn test_decode_restores_recipe() {
        let registry = Registry::with_defaults();
        let recipe = sum_then_pull();
        let decoded = Recipe::decode(&recipe.encode(), &registry).expect("decode");
        assert_eq!(decoded, recipe);
    }

    #[test]
    fn test_check_references_flags_forward_reference() {
        assert!(sum_then_pull().check_references().is_ok());

        let forward = Recipe::new(
            "Forward",
            vec![
                Action::pull_token(WETH, SENDER, Param::<U256>::output(2).expect("in range")),
                Action::sum_inputs(ether(1), ether(1)),
            ],
        );
        assert_eq!(
            forward.check_references(),
            Err(RevertReason::InvalidReference {
                action_index: 0,
                reference: 2
            })
        );
    }

    #[test]
    fn test_check_references_flags_zero_reference() {
        let zero = Recipe::new(
            "Zero",
            vec![
                Action::sum_inputs(ether(2), ether(7)),
                Action::pull_token(WETH, SENDER, Param::<U256>::Return(0)),
            ],
        );
        assert_eq!(
            zero.check_references(),
            Err(RevertReason::InvalidReference {
                action_index: 1,
                reference: 0
            })
        );
    }

    #[test]
    fn test_decode_rejects_mismatched_lengths() {
        let registry = Registry::with_defaults();
        let mut data = sum_then_pull().to_recipe_data();
        data.paramMapping.pop();
        assert!(matches!(
            Recipe::from_recipe_data(data, &registry),
            Err(RevertReason::MalformedCallData(_))
        ));
    }
}
