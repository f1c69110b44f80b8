use web3::transports::Http;
use web3::{Transport, Web3};

/// Opens web3 clients for endpoint urls.
///
/// Resolution code is generic over this seam so the same walk can run
/// against real http nodes or scripted transports.
pub trait Web3Connector: Send + Sync {
    type Transport: Transport;

    fn connect(&self, endpoint: &str) -> Result<Web3<Self::Transport>, web3::Error>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpConnector;

impl Web3Connector for HttpConnector {
    type Transport = Http;

    fn connect(&self, endpoint: &str) -> Result<Web3<Http>, web3::Error> {
        let http = Http::new(endpoint)?;
        Ok(Web3::new(http))
    }
}
