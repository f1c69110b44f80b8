use crate::config::ChainId;
use crate::resolver::AllowanceResolver;
use crate::result::AllowanceResult;
use allowance_rpc::Web3Connector;
use futures::future::join_all;
use futures_util::{pin_mut, stream, StreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;
use stream_rate_limiter::{RateLimitOptions, StreamRateLimitExt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub address: String,
    pub chain: ChainId,
}

impl BatchRequest {
    pub fn new(address: &str, chain: ChainId) -> Self {
        Self {
            address: address.trim().to_string(),
            chain,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainSummary {
    pub resolved: usize,
    pub failed: usize,
    pub total_available: Decimal,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// One entry per unique input address
    pub results: BTreeMap<String, AllowanceResult>,
    /// Number of requests issued in each sequential wave
    pub wave_sizes: Vec<usize>,
}

impl BatchResult {
    pub fn waves(&self) -> usize {
        self.wave_sizes.len()
    }

    pub fn get(&self, address: &str) -> Option<&AllowanceResult> {
        self.results.get(address.trim())
    }

    pub fn summary(&self) -> BTreeMap<ChainId, ChainSummary> {
        let mut summary = BTreeMap::<ChainId, ChainSummary>::new();
        for result in self.results.values() {
            let entry = summary.entry(result.chain).or_default();
            match result.amounts() {
                Some(amounts) => {
                    entry.resolved += 1;
                    entry.total_available = entry
                        .total_available
                        .checked_add(amounts.available.to_decimal_saturate())
                        .unwrap_or(Decimal::MAX);
                }
                None => entry.failed += 1,
            }
        }
        summary
    }
}

/// Drops repeated addresses, the first occurrence decides the chain
pub fn dedupe_requests(requests: &[BatchRequest]) -> Vec<BatchRequest> {
    let mut seen = HashSet::<String>::new();
    let mut unique = Vec::with_capacity(requests.len());
    for request in requests {
        let address = request.address.trim().to_string();
        if seen.insert(address.clone()) {
            unique.push(BatchRequest {
                address,
                chain: request.chain,
            });
        } else {
            log::warn!(
                "Address {} requested more than once, ignoring {} request",
                address,
                request.chain
            );
        }
    }
    unique
}

async fn resolve_or_fail<C: Web3Connector>(
    resolver: &AllowanceResolver<C>,
    request: &BatchRequest,
) -> AllowanceResult {
    match resolver
        .resolve_allowance(request.chain, &request.address)
        .await
    {
        Ok(result) => result,
        Err(err) => {
            log::error!(
                "Lookup of {} on {} failed: {}",
                request.address,
                request.chain,
                err
            );
            AllowanceResult::failed(&request.address, request.chain, err.user_message())
        }
    }
}

/// Resolves every request in sequential waves of `batch_size` concurrent lookups.
/// Wave `i + 1` is started only after every lookup of wave `i` finished.
pub async fn resolve_batch<C: Web3Connector>(
    resolver: &AllowanceResolver<C>,
    requests: &[BatchRequest],
) -> BatchResult {
    let settings = resolver.settings();
    let batch_size = std::cmp::max(settings.batch_size, 1);
    let unique = dedupe_requests(requests);

    let rate_limit_options = if let Some(interval) = settings.wave_interval {
        RateLimitOptions::empty().with_min_interval_sec(interval)
    } else {
        RateLimitOptions::empty()
    };

    let wave_count = (unique.len() + batch_size - 1) / batch_size;
    log::info!(
        "Resolving {} addresses in {} waves of up to {}",
        unique.len(),
        wave_count,
        batch_size
    );

    let mut batch_result = BatchResult::default();
    let waves = stream::iter(unique.chunks(batch_size).enumerate()).rate_limit(rate_limit_options);
    pin_mut!(waves);
    while let Some((wave_no, wave)) = waves.next().await {
        let started = Instant::now();
        let results = join_all(wave.iter().map(|request| resolve_or_fail(resolver, request))).await;
        log::debug!(
            "Wave {}/{} finished in {} ms",
            wave_no + 1,
            wave_count,
            started.elapsed().as_millis()
        );
        batch_result.wave_sizes.push(wave.len());
        for result in results {
            batch_result.results.insert(result.address.clone(), result);
        }
    }
    batch_result
}
