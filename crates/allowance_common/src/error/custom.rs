use std::error::Error;
use std::fmt::Display;

/// A custom error type for convenient error creation
#[derive(Debug)]
pub struct CustomError {
    message: String,
}

impl CustomError {
    pub fn from_owned_string(message: String) -> CustomError {
        CustomError { message }
    }
}
impl Error for CustomError {}

impl Display for CustomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CustomError: {}", self.message)
    }
}

/// Contract read came back shorter than the ABI requires (usually `0x`)
#[derive(Debug, Clone, PartialEq)]
pub struct NoDataError {
    pub method: String,
    pub expected_len: usize,
    pub got_len: usize,
}

impl NoDataError {
    pub fn new(method: &str, expected_len: usize, got_len: usize) -> NoDataError {
        NoDataError {
            method: method.to_string(),
            expected_len,
            got_len,
        }
    }
}
impl Error for NoDataError {}

impl Display for NoDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "NoDataError: {} returned {} bytes, expected {}",
            self.method, self.got_len, self.expected_len
        )
    }
}
