//! Name → address registry of the sandbox's deployed contracts.

use crate::actions::ActionKind;
use crate::error::ForkError;
use crate::utils::constants::REGISTRY_DEPLOYER;
use alloy::primitives::{Address, FixedBytes};
use std::collections::{BTreeMap, HashMap};

pub const RECIPE_EXECUTOR: &str = "RecipeExecutor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    RecipeExecutor,
    Action(ActionKind),
}

impl ContractKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::RecipeExecutor => RECIPE_EXECUTOR,
            Self::Action(kind) => kind.name(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if name == RECIPE_EXECUTOR {
            return Some(Self::RecipeExecutor);
        }
        ActionKind::from_name(name).map(Self::Action)
    }

    pub fn all() -> impl Iterator<Item = ContractKind> {
        std::iter::once(Self::RecipeExecutor).chain(ActionKind::ALL.into_iter().map(Self::Action))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    addresses: BTreeMap<&'static str, Address>,
    kinds: HashMap<Address, ContractKind>,
    deployer_nonce: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            addresses: BTreeMap::new(),
            kinds: HashMap::new(),
            deployer_nonce: 0,
        }
    }

    /// Recipe executor plus every action contract.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for kind in ContractKind::all() {
            registry.deploy(kind);
        }
        registry
    }

    fn deploy(&mut self, kind: ContractKind) -> Address {
        let address = REGISTRY_DEPLOYER.create(self.deployer_nonce);
        self.deployer_nonce += 1;
        if let Some(previous) = self.addresses.insert(kind.name(), address) {
            self.kinds.remove(&previous);
        }
        self.kinds.insert(address, kind);
        address
    }

    /// Fresh deployment of `name`; the old address stops resolving.
    pub fn redeploy(&mut self, name: &str) -> Result<Address, ForkError> {
        let kind =
            ContractKind::from_name(name).ok_or_else(|| ForkError::UnknownContract(name.to_string()))?;
        let address = self.deploy(kind);
        tracing::info!("[REGISTRY] {} deployed at {}", kind.name(), address);
        Ok(address)
    }

    pub fn get_addr(&self, name: &str) -> Result<Address, ForkError> {
        self.addresses
            .get(name)
            .copied()
            .ok_or_else(|| ForkError::UnknownContract(name.to_string()))
    }

    pub fn recipe_executor(&self) -> Result<Address, ForkError> {
        self.get_addr(RECIPE_EXECUTOR)
    }

    pub fn kind_at(&self, address: Address) -> Option<ContractKind> {
        self.kinds.get(&address).copied()
    }

    /// Only currently registered actions resolve.
    pub fn kind_for_id(&self, id: FixedBytes<4>) -> Option<ActionKind> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.id() == id && self.addresses.contains_key(kind.name()))
    }
}
