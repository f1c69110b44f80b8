use crate::mock_transport::MockTransport;
use allowance_rpc::Web3Connector;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use web3::error::TransportError;
use web3::types::{Address, U256};
use web3::Web3;

pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
pub const ALLOWANCE_SELECTOR: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];
pub const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];

/// Answer to the `eth_blockNumber` liveness probe
#[derive(Debug, Clone)]
pub enum ProbeBehavior {
    Block(u64),
    Error(String),
    Hang,
}

/// Answer to a contract read
#[derive(Debug, Clone)]
pub enum CallBehavior {
    Amount(U256),
    /// `0x`, the node has nothing for the call
    NoData,
    RpcError(String),
    Hang,
}

#[derive(Debug, Clone)]
pub struct MockEndpoint {
    pub probe: ProbeBehavior,
    pub latency: Duration,
    pub balances: HashMap<Address, CallBehavior>,
    pub allowances: HashMap<Address, CallBehavior>,
    /// Used for holders without an explicit entry
    pub default_call: CallBehavior,
    pub decimals: CallBehavior,
}

impl MockEndpoint {
    pub fn healthy(block_number: u64) -> Self {
        Self {
            probe: ProbeBehavior::Block(block_number),
            latency: Duration::ZERO,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            default_call: CallBehavior::Amount(U256::zero()),
            decimals: CallBehavior::Amount(U256::from(18)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            probe: ProbeBehavior::Error(message.to_string()),
            ..Self::healthy(0)
        }
    }

    pub fn hanging() -> Self {
        Self {
            probe: ProbeBehavior::Hang,
            ..Self::healthy(0)
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_balance(mut self, owner: Address, behavior: CallBehavior) -> Self {
        self.balances.insert(owner, behavior);
        self
    }

    pub fn with_allowance(mut self, owner: Address, behavior: CallBehavior) -> Self {
        self.allowances.insert(owner, behavior);
        self
    }

    pub fn with_default_call(mut self, behavior: CallBehavior) -> Self {
        self.default_call = behavior;
        self
    }

    pub fn with_decimals(mut self, behavior: CallBehavior) -> Self {
        self.decimals = behavior;
        self
    }
}

#[derive(Default)]
struct NetworkState {
    endpoints: HashMap<String, MockEndpoint>,
    connect_log: Vec<String>,
    requests: Vec<(String, String)>,
    in_flight: HashMap<Address, usize>,
    peak_in_flight: usize,
    peak_reads_per_holder: usize,
}

/// Set of scripted endpoints keyed by url. Doubles as the connector
/// handed to the resolvers, so every connection and request is recorded.
#[derive(Clone, Default)]
pub struct MockNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(self, url: &str, endpoint: MockEndpoint) -> Self {
        self.set_endpoint(url, endpoint);
        self
    }

    pub fn set_endpoint(&self, url: &str, endpoint: MockEndpoint) {
        self.state.lock().endpoints.insert(url.to_string(), endpoint);
    }

    /// Urls in the order the resolvers connected to them
    pub fn connect_log(&self) -> Vec<String> {
        self.state.lock().connect_log.clone()
    }

    pub fn connect_count(&self, url: &str) -> usize {
        self.state
            .lock()
            .connect_log
            .iter()
            .filter(|u| *u == url)
            .count()
    }

    pub fn requests_to(&self, url: &str) -> Vec<String> {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|(u, _)| u == url)
            .map(|(_, method)| method.clone())
            .collect()
    }

    /// Highest number of distinct holders with a contract read in progress at once
    pub fn peak_in_flight(&self) -> usize {
        self.state.lock().peak_in_flight
    }

    /// Highest number of reads in progress at once for a single holder
    pub fn peak_reads_per_holder(&self) -> usize {
        self.state.lock().peak_reads_per_holder
    }

    pub(crate) async fn handle(
        &self,
        url: &str,
        method: &str,
        params: Vec<Value>,
    ) -> web3::error::Result<Value> {
        let (latency, reply, holder) = {
            let mut state = self.state.lock();
            state.requests.push((url.to_string(), method.to_string()));
            let endpoint = state.endpoints.get(url).cloned().ok_or_else(|| {
                web3::Error::Transport(TransportError::Message(format!("unknown url {url}")))
            })?;
            match method {
                "eth_blockNumber" => {
                    let reply = match endpoint.probe {
                        ProbeBehavior::Block(block) => Reply::Value(json!(format!("{block:#x}"))),
                        ProbeBehavior::Error(msg) => Reply::Error(msg),
                        ProbeBehavior::Hang => Reply::Hang,
                    };
                    (endpoint.latency, reply, None)
                }
                "eth_call" => {
                    let data = call_data(&params)?;
                    if data.len() < 4 {
                        return Err(rpc_error("execution reverted"));
                    }
                    let selector = &data[0..4];
                    if selector == DECIMALS_SELECTOR {
                        (endpoint.latency, Reply::from(endpoint.decimals), None)
                    } else {
                        if data.len() < 36 {
                            return Err(rpc_error("execution reverted"));
                        }
                        let owner = Address::from_slice(&data[16..36]);
                        let behaviors = if selector == BALANCE_OF_SELECTOR {
                            &endpoint.balances
                        } else if selector == ALLOWANCE_SELECTOR {
                            &endpoint.allowances
                        } else {
                            return Err(rpc_error("execution reverted"));
                        };
                        let behavior = behaviors
                            .get(&owner)
                            .cloned()
                            .unwrap_or_else(|| endpoint.default_call.clone());
                        (endpoint.latency, Reply::from(behavior), Some(owner))
                    }
                }
                other => return Err(rpc_error(&format!("method {other} not found"))),
            }
        };

        let _guard = holder.map(|owner| InFlightGuard::new(self.state.clone(), owner));
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match reply {
            Reply::Value(value) => Ok(value),
            Reply::Error(msg) => Err(rpc_error(&msg)),
            Reply::Hang => futures::future::pending().await,
        }
    }
}

impl Web3Connector for MockNetwork {
    type Transport = MockTransport;

    fn connect(&self, endpoint: &str) -> Result<Web3<MockTransport>, web3::Error> {
        let mut state = self.state.lock();
        state.connect_log.push(endpoint.to_string());
        if !state.endpoints.contains_key(endpoint) {
            return Err(web3::Error::Transport(TransportError::Message(format!(
                "cannot connect to {endpoint}"
            ))));
        }
        Ok(Web3::new(MockTransport::new(endpoint, self.clone())))
    }
}

enum Reply {
    Value(Value),
    Error(String),
    Hang,
}

impl From<CallBehavior> for Reply {
    fn from(behavior: CallBehavior) -> Self {
        match behavior {
            CallBehavior::Amount(amount) => {
                let mut buf = [0u8; 32];
                amount.to_big_endian(&mut buf);
                Reply::Value(json!(format!("0x{}", hex::encode(buf))))
            }
            CallBehavior::NoData => Reply::Value(json!("0x")),
            CallBehavior::RpcError(msg) => Reply::Error(msg),
            CallBehavior::Hang => Reply::Hang,
        }
    }
}

struct InFlightGuard {
    state: Arc<Mutex<NetworkState>>,
    owner: Address,
}

impl InFlightGuard {
    fn new(state: Arc<Mutex<NetworkState>>, owner: Address) -> Self {
        {
            let mut locked = state.lock();
            let reads = {
                let count = locked.in_flight.entry(owner).or_insert(0);
                *count += 1;
                *count
            };
            let holders = locked.in_flight.len();
            locked.peak_in_flight = std::cmp::max(locked.peak_in_flight, holders);
            locked.peak_reads_per_holder = std::cmp::max(locked.peak_reads_per_holder, reads);
        }
        Self { state, owner }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if let Some(count) = state.in_flight.get_mut(&self.owner) {
            *count -= 1;
            if *count == 0 {
                state.in_flight.remove(&self.owner);
            }
        }
    }
}

pub fn rpc_error(message: &str) -> web3::Error {
    web3::Error::Rpc(jsonrpc_core::Error {
        code: jsonrpc_core::ErrorCode::ServerError(-32000),
        message: message.to_string(),
        data: None,
    })
}

fn call_data(params: &[Value]) -> web3::error::Result<Vec<u8>> {
    let request = params
        .first()
        .ok_or_else(|| rpc_error("missing call request"))?;
    let data = request
        .get("data")
        .or_else(|| request.get("input"))
        .and_then(Value::as_str)
        .ok_or_else(|| rpc_error("missing call data"))?;
    hex::decode(data.trim_start_matches("0x")).map_err(|e| rpc_error(&format!("invalid data {e}")))
}
