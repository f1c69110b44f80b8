use crate::mock_network::MockNetwork;
use futures::future::BoxFuture;
use futures::FutureExt;
use jsonrpc_core::{Call, MethodCall, Params};
use serde_json::Value;
use std::fmt::{self, Debug, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use web3::{helpers, RequestId, Transport};

/// Transport answering from the scripted behavior of a single endpoint url
#[derive(Clone)]
pub struct MockTransport {
    url: String,
    network: MockNetwork,
    current_id: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new(url: &str, network: MockNetwork) -> Self {
        Self {
            url: url.to_string(),
            network,
            current_id: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Debug for MockTransport {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("url", &self.url)
            .finish()
    }
}

impl Transport for MockTransport {
    type Out = BoxFuture<'static, web3::error::Result<Value>>;

    fn prepare(&self, method: &str, params: Vec<Value>) -> (RequestId, Call) {
        let id = self.current_id.fetch_add(1, Ordering::SeqCst);
        (id, helpers::build_request(id, method, params))
    }

    fn send(&self, _id: RequestId, call: Call) -> Self::Out {
        let network = self.network.clone();
        let url = self.url.clone();
        async move {
            let (method, params) = extract_call(call)?;
            network.handle(&url, &method, params).await
        }
        .boxed()
    }
}

fn extract_call(call: Call) -> web3::error::Result<(String, Vec<Value>)> {
    match call {
        Call::MethodCall(MethodCall {
            method,
            params: Params::Array(params),
            ..
        }) => Ok((method, params)),
        other => Err(web3::Error::InvalidResponse(format!(
            "unexpected call {:?}",
            other
        ))),
    }
}
