mod config_setup;
mod mock_network;
mod mock_transport;

pub use config_setup::*;
pub use mock_network::{
    rpc_error, CallBehavior, MockEndpoint, MockNetwork, ProbeBehavior, ALLOWANCE_SELECTOR,
    BALANCE_OF_SELECTOR, DECIMALS_SELECTOR,
};
pub use mock_transport::MockTransport;

pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
