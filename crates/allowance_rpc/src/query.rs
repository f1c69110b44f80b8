use crate::EndpointConnection;
use allowance_common::error::{NoDataError, ResolverError};
use allowance_common::{err_create, err_custom_create, err_from_msg};
use std::time::Duration;
use web3::types::{Address, Bytes, CallRequest, U256};
use web3::Transport;

/// ABI size of a single `uint256` return value
pub const UINT_RESPONSE_LEN: usize = 32;

/// Read-only contract call returning a single `uint256`
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    pub method: &'static str,
    pub to: Address,
    pub data: Vec<u8>,
}

/// Issues the call and decodes the result. Truncated responses are
/// reported as [`NoDataError`], everything else as regular errors.
pub async fn call_uint<T: Transport>(
    connection: &EndpointConnection<T>,
    query: &QueryDescriptor,
    timeout: Duration,
) -> Result<U256, ResolverError> {
    let call_request = CallRequest {
        to: Some(query.to),
        data: Some(Bytes(query.data.clone())),
        ..Default::default()
    };
    let res = tokio::time::timeout(timeout, connection.web3.eth().call(call_request, None))
        .await
        .map_err(|_| err_create!(timeout))?
        .map_err(err_from_msg!(
            "{} failed on endpoint {}",
            query.method,
            connection.endpoint
        ))?;

    if res.0.len() < UINT_RESPONSE_LEN {
        return Err(err_create!(NoDataError::new(
            query.method,
            UINT_RESPONSE_LEN,
            res.0.len()
        )));
    }
    if res.0.len() > UINT_RESPONSE_LEN {
        return Err(err_custom_create!(
            "Invalid {} response: {} bytes. Probably not a valid ERC20 contract {:#x}",
            query.method,
            res.0.len(),
            query.to
        ));
    }
    Ok(U256::from_big_endian(&res.0))
}

/// Reads a value, substituting `default_value` when the node had no data
/// for the call. Any other failure is returned unchanged.
pub async fn execute_query<T: Transport>(
    connection: &EndpointConnection<T>,
    query: &QueryDescriptor,
    default_value: U256,
    timeout: Duration,
) -> Result<U256, ResolverError> {
    match call_uint(connection, query, timeout).await {
        Ok(value) => Ok(value),
        Err(err) if err.is_no_data() => {
            log::debug!(
                "No data for {} on {} ({}), using default {}",
                query.method,
                connection.endpoint,
                err,
                default_value
            );
            metrics::counter!("contract_read_no_data", 1, "method" => query.method);
            Ok(default_value)
        }
        Err(err) => Err(err),
    }
}
