use crate::actions::{config_with_endpoints, parse_chain, print_json};
use crate::options::CheckRpcOptions;
use allowance_lib::config::{ChainConfig, Config};
use allowance_lib::contracts::decimals_query;
use allowance_lib::err_custom_create;
use allowance_lib::error::ResolverError;
use allowance_rpc::{
    call_uint, probe_endpoint, resolve_endpoint, EndpointConnection, HttpConnector, ProbeFailure,
    Web3Connector,
};
use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;
use web3::types::U256;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointReport {
    pub index: usize,
    pub endpoint: String,
    pub reachable: bool,
    pub block_number: Option<u64>,
    pub check_time_ms: Option<u64>,
    pub failure: Option<String>,
    pub token_decimals: Option<String>,
    /// Decimals read failed on an otherwise reachable endpoint
    pub decimals_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReport {
    pub chain: String,
    pub endpoints: Vec<EndpointReport>,
    /// Endpoint the resolver would use right now
    pub selected: Option<String>,
}

async fn check_endpoint<C: Web3Connector>(
    connector: &C,
    chain_cfg: &ChainConfig,
    index: usize,
    endpoint: &str,
    probe_timeout: Duration,
    check_decimals: bool,
) -> EndpointReport {
    let mut report = EndpointReport {
        index,
        endpoint: endpoint.to_string(),
        reachable: false,
        block_number: None,
        check_time_ms: None,
        failure: None,
        token_decimals: None,
        decimals_error: None,
    };
    let web3 = match connector.connect(endpoint) {
        Ok(web3) => web3,
        Err(err) => {
            report.failure = Some(ProbeFailure::ConnectError(err.to_string()).to_string());
            return report;
        }
    };
    let status = match probe_endpoint(&web3, endpoint, probe_timeout).await {
        Ok(status) => status,
        Err(failure) => {
            report.failure = Some(failure.to_string());
            return report;
        }
    };
    log::info!(
        "Endpoint no {} {} at block {} ({} ms)",
        index,
        endpoint,
        status.block_number,
        status.check_time_ms
    );
    report.reachable = true;
    report.block_number = Some(status.block_number);
    report.check_time_ms = Some(status.check_time_ms);

    if check_decimals {
        let connection = EndpointConnection {
            web3,
            endpoint: endpoint.to_string(),
            index,
            block_number: status.block_number,
        };
        let decimals = match decimals_query(chain_cfg.token_address) {
            Ok(query) => call_uint(&connection, &query, probe_timeout).await,
            Err(err) => Err(err),
        };
        match decimals {
            Ok(decimals) => {
                if decimals != U256::from(chain_cfg.decimals) {
                    log::warn!(
                        "Endpoint {} reports {} decimals for {}, config says {}",
                        endpoint,
                        decimals,
                        chain_cfg.token_symbol,
                        chain_cfg.decimals
                    );
                }
                report.token_decimals = Some(decimals.to_string());
            }
            Err(err) => {
                log::warn!("Cannot read decimals from {}: {}", endpoint, err);
                report.decimals_error = Some(err.user_message());
            }
        }
    }
    report
}

pub async fn check_rpc(
    check_rpc_options: CheckRpcOptions,
    config: &Config,
) -> Result<(), ResolverError> {
    let chain = parse_chain(&check_rpc_options.chain)?;
    let config = config_with_endpoints(config, chain, check_rpc_options.rpc_endpoints.as_deref())?;
    let registry = config.chain_registry()?;
    let settings = config.resolver_settings()?;
    let chain_cfg = registry
        .get(chain)
        .ok_or(err_custom_create!("Chain {} not found in config file", chain))?;

    let connector = HttpConnector;
    let endpoints = join_all(chain_cfg.rpc_endpoints.iter().enumerate().map(|(idx, endpoint)| {
        check_endpoint(
            &connector,
            chain_cfg,
            idx,
            endpoint,
            settings.probe_timeout,
            !check_rpc_options.skip_decimals,
        )
    }))
    .await;

    let selected = match resolve_endpoint(
        &connector,
        &chain_cfg.rpc_endpoints,
        &settings.endpoint_params(),
    )
    .await
    {
        Ok(connection) => Some(connection.endpoint),
        Err(err) => {
            log::warn!("No endpoint of {} can be used: {}", chain, err);
            None
        }
    };

    print_json(&RpcReport {
        chain: chain.to_string(),
        endpoints,
        selected,
    })
}
