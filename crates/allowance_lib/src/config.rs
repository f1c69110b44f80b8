use serde::{Deserialize, Serialize};
use std::collections::btree_map::BTreeMap as Map;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::*;
use crate::utils::MAX_DECIMALS;
use crate::{err_custom_create, err_from};
use allowance_rpc::EndpointResolverParams;
use tokio::fs;
use web3::types::Address;

pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10000;
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 10000;
pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChainId {
    #[serde(rename = "BSC", alias = "bsc")]
    Bsc,
    #[serde(rename = "ETH", alias = "eth")]
    Eth,
}

impl Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainId::Bsc => write!(f, "BSC"),
            ChainId::Eth => write!(f, "ETH"),
        }
    }
}

impl FromStr for ChainId {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bsc" => Ok(ChainId::Bsc),
            "eth" => Ok(ChainId::Eth),
            _ => Err(err_custom_create!("Unsupported chain {}", s)),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
pub struct Resolver {
    pub probe_timeout_ms: Option<u64>,
    pub query_timeout_ms: Option<u64>,
    pub resolve_deadline_ms: Option<u64>,
    pub batch_size: Option<usize>,
    pub wave_interval_secs: Option<f64>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub chain: Map<String, Chain>,
    #[serde(default)]
    pub resolver: Resolver,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Chain {
    pub chain_id: ChainId,
    pub collector_address: Address,
    pub rpc_endpoints: Vec<String>,
    pub token: Token,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Token {
    pub symbol: String,
    pub address: Address,
    pub decimals: u32,
}

/// Immutable per-chain parameters consulted by the resolvers
#[derive(Debug, Clone, PartialEq)]
pub struct ChainConfig {
    pub chain_id: ChainId,
    pub token_symbol: String,
    pub token_address: Address,
    pub decimals: u32,
    pub collector_address: Address,
    /// Priority order, first listed is tried first
    pub rpc_endpoints: Vec<String>,
}

impl ChainConfig {
    fn validate(&self) -> Result<(), ResolverError> {
        if self.rpc_endpoints.is_empty() {
            return Err(err_custom_create!(
                "Chain {} has no rpc endpoints",
                self.chain_id
            ));
        }
        for endpoint in &self.rpc_endpoints {
            let url = url::Url::parse(endpoint).map_err(|e| {
                err_custom_create!("Invalid endpoint {} for {}: {}", endpoint, self.chain_id, e)
            })?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(err_custom_create!(
                    "Endpoint {} for {} has to be http or https",
                    endpoint,
                    self.chain_id
                ));
            }
        }
        if self.decimals > MAX_DECIMALS {
            return Err(err_custom_create!(
                "Token decimals {} for {} cannot be greater than {}",
                self.decimals,
                self.chain_id,
                MAX_DECIMALS
            ));
        }
        Ok(())
    }
}

/// Read-only table of chain parameters, built once and shared
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Map<ChainId, ChainConfig>,
}

impl ChainRegistry {
    pub fn new(chains: Vec<ChainConfig>) -> Result<Self, ResolverError> {
        let mut map = Map::new();
        for chain in chains {
            chain.validate()?;
            let chain_id = chain.chain_id;
            if map.insert(chain_id, chain).is_some() {
                return Err(err_custom_create!("Chain {} configured twice", chain_id));
            }
        }
        Ok(Self { chains: map })
    }

    pub fn get(&self, chain_id: ChainId) -> Option<&ChainConfig> {
        self.chains.get(&chain_id)
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainConfig> {
        self.chains.values()
    }
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub probe_timeout: Duration,
    pub query_timeout: Duration,
    pub resolve_deadline: Option<Duration>,
    pub batch_size: usize,
    /// Minimum spacing between batch waves in seconds
    pub wave_interval: Option<f64>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        ResolverSettings {
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            query_timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
            resolve_deadline: None,
            batch_size: DEFAULT_BATCH_SIZE,
            wave_interval: None,
        }
    }
}

impl ResolverSettings {
    pub fn endpoint_params(&self) -> EndpointResolverParams {
        EndpointResolverParams {
            probe_timeout: self.probe_timeout,
            resolve_deadline: self.resolve_deadline,
        }
    }
}

impl Config {
    pub fn load_from_str(str: &str) -> Result<Self, ResolverError> {
        match toml::from_str(str) {
            Ok(config) => Ok(config),
            Err(e) => Err(err_custom_create!("Failed to parse toml {}: {}", str, e)),
        }
    }

    pub async fn load<P: AsRef<Path> + std::fmt::Display>(path: P) -> Result<Self, ResolverError> {
        let content = fs::read_to_string(&path).await.map_err(err_from!())?;
        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => Err(err_custom_create!("Failed to parse toml {}: {}", path, e)),
        }
    }

    pub fn chain_registry(&self) -> Result<ChainRegistry, ResolverError> {
        ChainRegistry::new(
            self.chain
                .values()
                .map(|chain| ChainConfig {
                    chain_id: chain.chain_id,
                    token_symbol: chain.token.symbol.clone(),
                    token_address: chain.token.address,
                    decimals: chain.token.decimals,
                    collector_address: chain.collector_address,
                    rpc_endpoints: chain.rpc_endpoints.clone(),
                })
                .collect(),
        )
    }

    pub fn resolver_settings(&self) -> Result<ResolverSettings, ResolverError> {
        let batch_size = self.resolver.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(err_custom_create!("batch-size has to be at least 1"));
        }
        for (key, value) in [
            ("probe-timeout-ms", self.resolver.probe_timeout_ms),
            ("query-timeout-ms", self.resolver.query_timeout_ms),
            ("resolve-deadline-ms", self.resolver.resolve_deadline_ms),
        ] {
            if value == Some(0) {
                return Err(err_custom_create!("{} has to be greater than 0", key));
            }
        }
        if let Some(interval) = self.resolver.wave_interval_secs {
            if interval.is_nan() || interval < 0.0 {
                return Err(err_custom_create!(
                    "wave-interval-secs has to be non negative, got {}",
                    interval
                ));
            }
        }
        Ok(ResolverSettings {
            probe_timeout: Duration::from_millis(
                self.resolver
                    .probe_timeout_ms
                    .unwrap_or(DEFAULT_PROBE_TIMEOUT_MS),
            ),
            query_timeout: Duration::from_millis(
                self.resolver
                    .query_timeout_ms
                    .unwrap_or(DEFAULT_QUERY_TIMEOUT_MS),
            ),
            resolve_deadline: self.resolver.resolve_deadline_ms.map(Duration::from_millis),
            batch_size,
            wave_interval: self.resolver.wave_interval_secs,
        })
    }

    /// Replaces the endpoint list of every entry configured for `chain`
    pub fn change_rpc_endpoints(
        &mut self,
        chain: ChainId,
        rpc_endpoints: Vec<String>,
    ) -> Result<(), ResolverError> {
        let mut found = false;
        for entry in self.chain.values_mut().filter(|c| c.chain_id == chain) {
            entry.rpc_endpoints = rpc_endpoints.clone();
            found = true;
        }
        if !found {
            return Err(err_custom_create!("Chain {} not found", chain));
        }
        Ok(())
    }
}
