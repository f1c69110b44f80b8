use crate::Web3Connector;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Duration;
use tokio::select;
use tokio::time::Instant;
use web3::{Transport, Web3};

#[derive(Debug, Clone)]
pub struct EndpointResolverParams {
    pub probe_timeout: Duration,
    /// Upper bound for walking the whole list.
    /// When not set it is `probe_timeout * number of endpoints`.
    pub resolve_deadline: Option<Duration>,
}

impl Default for EndpointResolverParams {
    fn default() -> Self {
        EndpointResolverParams {
            probe_timeout: Duration::from_secs(10),
            resolve_deadline: None,
        }
    }
}

impl EndpointResolverParams {
    pub fn deadline_for(&self, endpoint_count: usize) -> Duration {
        self.resolve_deadline
            .unwrap_or_else(|| self.probe_timeout * endpoint_count as u32)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProbeStatus {
    pub block_number: u64,
    pub check_time_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ProbeFailure {
    ConnectError(String),
    RpcError(String),
    Unreachable,
    DeadlineReached,
}

impl Display for ProbeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeFailure::ConnectError(err) => write!(f, "cannot connect: {err}"),
            ProbeFailure::RpcError(err) => write!(f, "probe failed: {err}"),
            ProbeFailure::Unreachable => write!(f, "probe timed out"),
            ProbeFailure::DeadlineReached => write!(f, "resolve deadline reached"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProbeAttempt {
    pub index: usize,
    pub endpoint: String,
    pub failure: ProbeFailure,
}

/// Connection to the first endpoint that answered the liveness probe
#[derive(Debug, Clone)]
pub struct EndpointConnection<T: Transport> {
    pub web3: Web3<T>,
    pub endpoint: String,
    pub index: usize,
    pub block_number: u64,
}

#[derive(Debug, Clone)]
pub struct AllEndpointsFailed {
    pub attempts: Vec<ProbeAttempt>,
}

impl Display for AllEndpointsFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "all endpoints failed ({} tried)", self.attempts.len())
    }
}

impl std::error::Error for AllEndpointsFailed {}

/// Single liveness probe ("current block height") raced against `timeout`
pub async fn probe_endpoint<T: Transport>(
    web3: &Web3<T>,
    name: &str,
    timeout: Duration,
) -> Result<ProbeStatus, ProbeFailure> {
    let tsk = async move {
        let start_check = Instant::now();
        match web3.eth().block_number().await {
            Ok(block_number) => Ok(ProbeStatus {
                block_number: block_number.as_u64(),
                check_time_ms: start_check.elapsed().as_millis() as u64,
            }),
            Err(err) => {
                log::debug!("Probe endpoint - {name} error: {}", err);
                Err(ProbeFailure::RpcError(err.to_string()))
            }
        }
    };

    select! {
        res = tsk => res,
        _ = tokio::time::sleep(timeout) => {
            log::warn!("Probe endpoint - {name} error: Unreachable");
            Err(ProbeFailure::Unreachable)
        },
    }
}

#[derive(Debug)]
pub enum EndpointState<T: Transport> {
    Untried { idx: usize },
    Probing { idx: usize, web3: Web3<T> },
    Healthy(EndpointConnection<T>),
    Failed { idx: usize, reason: ProbeFailure },
    Exhausted,
}

impl<T: Transport> EndpointState<T> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EndpointState::Healthy(_) | EndpointState::Exhausted)
    }
}

/// Walks an ordered endpoint list one endpoint at a time.
///
/// `Untried -> Probing -> Healthy | Failed`, and `Failed -> Untried` for the
/// next index, until an endpoint is healthy or the list is `Exhausted`.
/// Every endpoint is contacted at most once per walk.
pub struct EndpointWalk<'a, C: Web3Connector> {
    connector: &'a C,
    endpoints: &'a [String],
    probe_timeout: Duration,
    deadline: Instant,
    attempts: Vec<ProbeAttempt>,
}

impl<'a, C: Web3Connector> EndpointWalk<'a, C> {
    pub fn new(connector: &'a C, endpoints: &'a [String], params: &EndpointResolverParams) -> Self {
        EndpointWalk {
            connector,
            endpoints,
            probe_timeout: params.probe_timeout,
            deadline: Instant::now() + params.deadline_for(endpoints.len()),
            attempts: Vec::new(),
        }
    }

    pub fn start(&self) -> EndpointState<C::Transport> {
        EndpointState::Untried { idx: 0 }
    }

    pub fn attempts(&self) -> &[ProbeAttempt] {
        &self.attempts
    }

    pub fn into_attempts(self) -> Vec<ProbeAttempt> {
        self.attempts
    }

    pub async fn step(&mut self, state: EndpointState<C::Transport>) -> EndpointState<C::Transport> {
        match state {
            EndpointState::Untried { idx } => {
                let Some(endpoint) = self.endpoints.get(idx) else {
                    return EndpointState::Exhausted;
                };
                if Instant::now() >= self.deadline {
                    return EndpointState::Failed {
                        idx,
                        reason: ProbeFailure::DeadlineReached,
                    };
                }
                match self.connector.connect(endpoint) {
                    Ok(web3) => EndpointState::Probing { idx, web3 },
                    Err(err) => EndpointState::Failed {
                        idx,
                        reason: ProbeFailure::ConnectError(err.to_string()),
                    },
                }
            }
            EndpointState::Probing { idx, web3 } => {
                let endpoint = self.endpoints.get(idx).cloned().unwrap_or_default();
                let remaining = self.deadline.saturating_duration_since(Instant::now());
                let timeout = std::cmp::min(self.probe_timeout, remaining);
                match probe_endpoint(&web3, &endpoint, timeout).await {
                    Ok(status) => {
                        log::debug!(
                            "Endpoint {} healthy at block {} ({} ms)",
                            endpoint,
                            status.block_number,
                            status.check_time_ms
                        );
                        metrics::counter!("endpoint_probe_success", 1, "endpoint" => endpoint.clone());
                        EndpointState::Healthy(EndpointConnection {
                            web3,
                            endpoint,
                            index: idx,
                            block_number: status.block_number,
                        })
                    }
                    Err(reason) => EndpointState::Failed { idx, reason },
                }
            }
            EndpointState::Failed { idx, reason } => {
                let endpoint = self.endpoints.get(idx).cloned().unwrap_or_default();
                log::warn!("Skipping endpoint no {} {}: {}", idx, endpoint, reason);
                metrics::counter!("endpoint_probe_error", 1, "endpoint" => endpoint.clone());
                let deadline_reached = reason == ProbeFailure::DeadlineReached;
                self.attempts.push(ProbeAttempt {
                    index: idx,
                    endpoint,
                    failure: reason,
                });
                if deadline_reached {
                    return EndpointState::Exhausted;
                }
                EndpointState::Untried { idx: idx + 1 }
            }
            terminal => terminal,
        }
    }
}

/// Returns a connection to the first endpoint (in list order) that answers the probe
pub async fn resolve_endpoint<C: Web3Connector>(
    connector: &C,
    endpoints: &[String],
    params: &EndpointResolverParams,
) -> Result<EndpointConnection<C::Transport>, AllEndpointsFailed> {
    let mut walk = EndpointWalk::new(connector, endpoints, params);
    let mut state = walk.start();
    loop {
        state = match walk.step(state).await {
            EndpointState::Healthy(connection) => return Ok(connection),
            EndpointState::Exhausted => {
                return Err(AllEndpointsFailed {
                    attempts: walk.into_attempts(),
                })
            }
            next => next,
        };
    }
}
