use crate::config::{ChainConfig, ChainId, ChainRegistry, ResolverSettings};
use crate::contracts::{allowance_query, balance_of_query};
use crate::err_custom_create;
use crate::error::ResolverError;
use crate::result::{AllowanceResult, ResolvedAmounts};
use allowance_rpc::{execute_query, resolve_endpoint, Web3Connector};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use web3::types::{Address, U256};

pub fn parse_address(address: &str) -> Result<Address, ResolverError> {
    let trimmed = address.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| err_custom_create!("Invalid address {}: missing 0x prefix", address))?;
    if hex_part.len() != 40 {
        return Err(err_custom_create!(
            "Invalid address {}: expected 40 hex digits, got {}",
            address,
            hex_part.len()
        ));
    }
    Address::from_str(hex_part).map_err(|e| err_custom_create!("Invalid address {}: {}", address, e))
}

/// Resolves balance and allowance of a single holder against the
/// collector address of a chain
pub struct AllowanceResolver<C: Web3Connector> {
    registry: Arc<ChainRegistry>,
    settings: ResolverSettings,
    connector: C,
}

impl<C: Web3Connector> AllowanceResolver<C> {
    pub fn new(registry: Arc<ChainRegistry>, settings: ResolverSettings, connector: C) -> Self {
        Self {
            registry,
            settings,
            connector,
        }
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn chain_config(&self, chain: ChainId) -> Result<&ChainConfig, ResolverError> {
        self.registry
            .get(chain)
            .ok_or_else(|| err_custom_create!("Chain {} is not configured", chain))
    }

    /// Unreachable chains are reported as a failed result, malformed input
    /// and failing reads as `Err`.
    pub async fn resolve_allowance(
        &self,
        chain: ChainId,
        address: &str,
    ) -> Result<AllowanceResult, ResolverError> {
        let chain_config = self.chain_config(chain)?;
        let owner = parse_address(address)?;

        let balance_query = balance_of_query(chain_config.token_address, owner)?;
        let allowance_query = allowance_query(
            chain_config.token_address,
            owner,
            chain_config.collector_address,
        )?;

        let start = Instant::now();
        let connection = match resolve_endpoint(
            &self.connector,
            &chain_config.rpc_endpoints,
            &self.settings.endpoint_params(),
        )
        .await
        {
            Ok(connection) => connection,
            Err(err) => {
                log::warn!("Cannot resolve {} on {}: {}", address, chain, err);
                metrics::counter!("allowance_resolve_error", 1, "chain" => chain.to_string());
                return Ok(AllowanceResult::failed(
                    address,
                    chain,
                    format!("All {chain} RPC endpoints failed"),
                ));
            }
        };

        let (balance, allowance) = tokio::try_join!(
            execute_query(
                &connection,
                &balance_query,
                U256::zero(),
                self.settings.query_timeout
            ),
            execute_query(
                &connection,
                &allowance_query,
                U256::zero(),
                self.settings.query_timeout
            ),
        )?;

        log::debug!(
            "Resolved {} on {} via {} in {} ms: balance {} allowance {}",
            address,
            chain,
            connection.endpoint,
            start.elapsed().as_millis(),
            balance,
            allowance
        );
        metrics::counter!("allowance_resolved", 1, "chain" => chain.to_string());

        Ok(AllowanceResult::resolved(
            address,
            chain,
            ResolvedAmounts::new(
                balance,
                allowance,
                chain_config.decimals,
                connection.block_number,
                connection.endpoint.clone(),
            ),
        ))
    }
}
