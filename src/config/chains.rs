use crate::utils::constants::ETH_ADDR;
use alloy::primitives::{address, Address};

/// Block the automation scenarios were recorded against on mainnet.
pub const MAINNET_DEFAULT_FORK_BLOCK: u64 = 14_368_070;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub weth: Address,
    /// Pseudo-token for the native asset.
    pub native: Address,
    pub default_fork_block: u64,
}

impl ChainConfig {
    pub fn get(chain_id: u64) -> Option<Self> {
        match chain_id {
            1 => Some(Self::mainnet()),
            10 => Some(Self::optimism()),
            42161 => Some(Self::arbitrum()),
            _ => None,
        }
    }

    pub fn supported_chain_ids() -> &'static [u64] {
        &[1, 10, 42161]
    }

    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            name: "Ethereum Mainnet".to_string(),
            weth: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            native: ETH_ADDR,
            default_fork_block: MAINNET_DEFAULT_FORK_BLOCK,
        }
    }

    pub fn optimism() -> Self {
        Self {
            chain_id: 10,
            name: "Optimism".to_string(),
            weth: address!("4200000000000000000000000000000000000006"),
            native: ETH_ADDR,
            default_fork_block: 110_000_000,
        }
    }

    pub fn arbitrum() -> Self {
        Self {
            chain_id: 42161,
            name: "Arbitrum One".to_string(),
            weth: address!("82aF49447D8a07e3bd95BD0d56f35241523fBab1"),
            native: ETH_ADDR,
            default_fork_block: 150_000_000,
        }
    }

    pub fn is_native(&self, token: Address) -> bool {
        token == self.native
    }
}
