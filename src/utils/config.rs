use crate::config::chains::ChainConfig;
use crate::error::{ConfigError, Result};
use crate::utils::constants::{ether, DEV_SIGNERS};
use alloy::primitives::U256;
use std::env;

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub chain: ChainConfig,
    pub fork_block: u64,
    pub signer_count: usize,
    pub signer_balance_wei: U256,
}

impl HarnessConfig {
    /// Mainnet defaults, no environment lookups.
    pub fn mainnet() -> Self {
        let chain = ChainConfig::mainnet();
        Self {
            fork_block: chain.default_fork_block,
            chain,
            signer_count: 4,
            signer_balance_wei: ether(10_000),
        }
    }

    pub fn load() -> Result<Self> {
        let chain_id = match env::var("CHAIN_ID") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidConfig(format!("CHAIN_ID must be a valid u64, got `{raw}`"))
            })?,
            Err(_) => 1,
        };
        let chain = ChainConfig::get(chain_id).ok_or_else(|| {
            ConfigError::InvalidConfig(format!(
                "CHAIN_ID {chain_id} is not supported (supported: {:?})",
                ChainConfig::supported_chain_ids()
            ))
        })?;

        let fork_block = match env::var("FORK_BLOCK_NUMBER") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidConfig(format!(
                    "FORK_BLOCK_NUMBER must be a valid u64, got `{raw}`"
                ))
            })?,
            Err(_) => chain.default_fork_block,
        };

        let signer_count = match env::var("SIGNER_COUNT") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=DEV_SIGNERS.len()).contains(n))
                .ok_or_else(|| {
                    ConfigError::InvalidConfig(format!(
                        "SIGNER_COUNT must be between 1 and {}, got `{raw}`",
                        DEV_SIGNERS.len()
                    ))
                })?,
            Err(_) => 4,
        };

        let signer_balance_wei = match env::var("SIGNER_BALANCE_ETH") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(ether)
                .map_err(|_| {
                    ConfigError::InvalidConfig(format!(
                        "SIGNER_BALANCE_ETH must be a whole number of ether, got `{raw}`"
                    ))
                })?,
            Err(_) => ether(10_000),
        };

        Ok(Self {
            chain,
            fork_block,
            signer_count,
            signer_balance_wei,
        })
    }
}
