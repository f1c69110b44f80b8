use super::{CustomError, NoDataError};
use std::fmt::Display;
use std::time::Duration;

/// Enum containing all possible errors used in the library
#[derive(Debug)]
pub enum ErrorBag {
    IoError(std::io::Error),
    CustomError(CustomError),
    NoDataError(NoDataError),
    EthAbiError(web3::ethabi::Error),
    Web3Error(web3::Error),
    TimeLimitReached(Duration),
}

impl Display for ErrorBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorBag::IoError(io_error) => write!(f, "{io_error}"),
            ErrorBag::CustomError(custom_error) => write!(f, "{custom_error}"),
            ErrorBag::NoDataError(no_data_error) => write!(f, "{no_data_error}"),
            ErrorBag::EthAbiError(eth_abi_error) => write!(f, "{eth_abi_error:?}"),
            ErrorBag::Web3Error(web3_error) => write!(f, "{web3_error:?}"),
            ErrorBag::TimeLimitReached(duration) => write!(f, "Time limit reached: {duration:?}"),
        }
    }
}

impl std::error::Error for ErrorBag {}

impl From<std::io::Error> for ErrorBag {
    fn from(err: std::io::Error) -> Self {
        ErrorBag::IoError(err)
    }
}

impl From<CustomError> for ErrorBag {
    fn from(err: CustomError) -> Self {
        ErrorBag::CustomError(err)
    }
}

impl From<NoDataError> for ErrorBag {
    fn from(err: NoDataError) -> Self {
        ErrorBag::NoDataError(err)
    }
}

impl From<web3::ethabi::Error> for ErrorBag {
    fn from(err: web3::ethabi::Error) -> Self {
        ErrorBag::EthAbiError(err)
    }
}

impl From<web3::Error> for ErrorBag {
    fn from(err: web3::Error) -> Self {
        ErrorBag::Web3Error(err)
    }
}

impl From<Duration> for ErrorBag {
    fn from(err: Duration) -> Self {
        ErrorBag::TimeLimitReached(err)
    }
}
