use crate::actions::{parse_chain, print_json};
use crate::options::BatchAllowanceOptions;
use allowance_lib::batch::{resolve_batch, BatchRequest};
use allowance_lib::config::{ChainId, Config};
use allowance_lib::err_custom_create;
use allowance_lib::error::ResolverError;
use allowance_lib::resolver::AllowanceResolver;
use allowance_rpc::HttpConnector;
use std::sync::Arc;

/// Parses `address` or `chain:address` entries separated by comma
pub fn parse_batch_list(
    list: &str,
    default_chain: ChainId,
) -> Result<Vec<BatchRequest>, ResolverError> {
    list.split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((chain, address)) => Ok(BatchRequest::new(address, parse_chain(chain)?)),
            None => Ok(BatchRequest::new(entry, default_chain)),
        })
        .collect()
}

pub async fn batch_allowance(
    batch_allowance_options: BatchAllowanceOptions,
    config: &Config,
) -> Result<(), ResolverError> {
    let default_chain = parse_chain(&batch_allowance_options.chain)?;
    let requests = parse_batch_list(&batch_allowance_options.addresses, default_chain)?;
    if requests.is_empty() {
        return Err(err_custom_create!("No addresses given"));
    }

    let mut settings = config.resolver_settings()?;
    if let Some(batch_size) = batch_allowance_options.batch_size {
        if batch_size == 0 {
            return Err(err_custom_create!("batch-size has to be at least 1"));
        }
        settings.batch_size = batch_size;
    }
    if let Some(interval) = batch_allowance_options.interval {
        settings.wave_interval = Some(interval);
    }

    let resolver = AllowanceResolver::new(
        Arc::new(config.chain_registry()?),
        settings,
        HttpConnector,
    );
    let batch_result = resolve_batch(&resolver, &requests).await;
    log::info!(
        "Resolved {} addresses in {} waves",
        batch_result.results.len(),
        batch_result.waves()
    );

    if batch_allowance_options.summary {
        print_json(&serde_json::json!({
            "results": batch_result.results,
            "summary": batch_result.summary(),
        }))
    } else {
        print_json(&batch_result.results)
    }
}
