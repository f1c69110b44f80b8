pub mod batch;
pub mod config;
pub mod contracts;
pub mod resolver;
pub mod result;

pub use allowance_common::error;
pub use allowance_common::utils;
pub use allowance_common::{err_create, err_custom_create, err_from, err_from_msg};
