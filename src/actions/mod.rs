use allowance_lib::config::{ChainId, Config};
use allowance_lib::error::ResolverError;
use std::str::FromStr;

pub mod batch_allowance;
pub mod check_allowance;
pub mod check_rpc;

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), ResolverError> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).map_err(|err| allowance_lib::err_custom_create!(
            "Something went wrong when serializing to json {err}"
        ))?
    );
    Ok(())
}

pub fn parse_chain(chain: &str) -> Result<ChainId, ResolverError> {
    ChainId::from_str(chain)
}

/// Copy of `config` with the endpoints of `chain` taken from the command line
pub fn config_with_endpoints(
    config: &Config,
    chain: ChainId,
    rpc_endpoints: Option<&str>,
) -> Result<Config, ResolverError> {
    let mut config = config.clone();
    if let Some(rpc_endpoints) = rpc_endpoints {
        let endpoints = rpc_endpoints
            .split(',')
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        log::info!("Using {} endpoints from command line for {}", endpoints.len(), chain);
        config.change_rpc_endpoints(chain, endpoints)?;
    }
    Ok(config)
}
