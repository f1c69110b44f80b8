use allowance_lib::config::{ChainConfig, ChainId, ChainRegistry, ResolverSettings};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use web3::types::{Address, U256};

pub const BSC_TOKEN: &str = "0x55d398326f99059fF775485246999027B3197955";
pub const ETH_TOKEN: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
pub const COLLECTOR: &str = "0x00000000000000000000000000000000c011ec70";

pub fn bsc_endpoints(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("http://bsc-{i}.test")).collect()
}

pub fn eth_endpoints(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("http://eth-{i}.test")).collect()
}

pub fn test_chain(chain_id: ChainId, rpc_endpoints: Vec<String>) -> ChainConfig {
    let (token, decimals) = match chain_id {
        ChainId::Bsc => (BSC_TOKEN, 18),
        ChainId::Eth => (ETH_TOKEN, 6),
    };
    ChainConfig {
        chain_id,
        token_symbol: "USDT".to_string(),
        token_address: Address::from_str(token).unwrap(),
        decimals,
        collector_address: Address::from_str(COLLECTOR).unwrap(),
        rpc_endpoints,
    }
}

/// BSC (18 decimals) and ETH (6 decimals) with `endpoints` mock urls each
pub fn create_test_registry(endpoints: usize) -> Arc<ChainRegistry> {
    Arc::new(
        ChainRegistry::new(vec![
            test_chain(ChainId::Bsc, bsc_endpoints(endpoints)),
            test_chain(ChainId::Eth, eth_endpoints(endpoints)),
        ])
        .unwrap(),
    )
}

/// Short timeouts so that hanging endpoints do not slow tests down
pub fn create_test_settings() -> ResolverSettings {
    ResolverSettings {
        probe_timeout: Duration::from_millis(200),
        query_timeout: Duration::from_millis(500),
        ..Default::default()
    }
}

pub fn holder(no: u64) -> Address {
    Address::from_low_u64_be(0x1000 + no)
}

pub fn holder_str(no: u64) -> String {
    format!("{:#x}", holder(no))
}

/// `units` whole tokens expressed in base units
pub fn token_amount(units: u64, decimals: u32) -> U256 {
    U256::from(units) * U256::exp10(decimals as usize)
}
