use crate::actions::{config_with_endpoints, parse_chain, print_json};
use crate::options::CheckAllowanceOptions;
use allowance_lib::config::Config;
use allowance_lib::error::ResolverError;
use allowance_lib::resolver::AllowanceResolver;
use allowance_rpc::HttpConnector;
use std::sync::Arc;

pub async fn check_allowance(
    check_allowance_options: CheckAllowanceOptions,
    config: &Config,
) -> Result<(), ResolverError> {
    let chain = parse_chain(&check_allowance_options.chain)?;
    let config = config_with_endpoints(
        config,
        chain,
        check_allowance_options.rpc_endpoints.as_deref(),
    )?;
    let resolver = AllowanceResolver::new(
        Arc::new(config.chain_registry()?),
        config.resolver_settings()?,
        HttpConnector,
    );

    let result = resolver
        .resolve_allowance(chain, &check_allowance_options.address)
        .await?;
    if let Some(error) = result.error() {
        log::warn!("Lookup of {} failed: {}", result.address, error);
    }
    print_json(&result)
}
