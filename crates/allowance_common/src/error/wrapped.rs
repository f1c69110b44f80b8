use super::ErrorBag;
use std::error::Error;

/// Node messages seen when a node serves a contract read with truncated data.
/// Matched case-insensitively against the rpc error message.
const NO_DATA_SIGNATURES: &[&str] = &[
    "buffer overrun",
    "data out-of-bounds",
    "slice beyond data bounds",
    "returned no data",
];

pub fn is_no_data_signature(message: &str) -> bool {
    let message = message.to_lowercase();
    NO_DATA_SIGNATURES
        .iter()
        .any(|signature| message.contains(signature))
}

/// Error type build over ErrorBag, containing source code location and optional message
/// Note that only creating via macro is possible to catch line and file
#[derive(Debug)]
pub struct ResolverError {
    pub inner: ErrorBag,
    pub msg: Option<String>,
    pub file: &'static str,
    pub line: u32,
    pub column: u32,
}

impl ResolverError {
    /// True when the failure means "the node had no data for a valid read"
    /// and the caller may substitute a default value.
    pub fn is_no_data(&self) -> bool {
        match &self.inner {
            ErrorBag::NoDataError(_) => true,
            ErrorBag::Web3Error(web3::Error::Rpc(rpc_err)) => {
                is_no_data_signature(&rpc_err.message)
            }
            ErrorBag::Web3Error(web3::Error::Decoder(msg)) => is_no_data_signature(msg),
            _ => false,
        }
    }

    /// Message without the source location, suitable for end users
    pub fn user_message(&self) -> String {
        match &self.msg {
            Some(msg) => format!("{}: {}", msg, self.inner),
            None => self.inner.to_string(),
        }
    }
}

impl Error for ResolverError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.inner)
    }
}

impl std::fmt::Display for ResolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let file_loc = self.file.replace('\\', "/");

        if let Some(msg) = &self.msg {
            write!(
                f,
                "{}, {}, {}:{}:{}",
                msg, self.inner, file_loc, self.line, self.column
            )
        } else {
            write!(
                f,
                "{}, {}:{}:{}",
                self.inner, file_loc, self.line, self.column
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NoDataError;
    use crate::{err_create, err_custom_create};

    fn rpc_error(message: &str) -> web3::Error {
        web3::Error::Rpc(jsonrpc_core::Error {
            code: jsonrpc_core::ErrorCode::ServerError(-32000),
            message: message.to_string(),
            data: None,
        })
    }

    #[test]
    fn test_no_data_signatures() {
        assert!(is_no_data_signature("data out-of-bounds (length=0, offset=32)"));
        assert!(is_no_data_signature("Buffer overrun"));
        assert!(is_no_data_signature(
            "call returned slice beyond data bounds"
        ));
        assert!(!is_no_data_signature("execution reverted"));
        assert!(!is_no_data_signature("invalid address"));
    }

    #[test]
    fn test_is_no_data() {
        let err = err_create!(NoDataError::new("balanceOf", 32, 0));
        assert!(err.is_no_data());

        let err = err_custom_create!("connection reset by peer");
        assert!(!err.is_no_data());

        let err = err_create!(std::time::Duration::from_secs(1));
        assert!(!err.is_no_data());

        let err = err_create!(rpc_error("data out-of-bounds (length=0)"));
        assert!(err.is_no_data());

        let err = err_create!(rpc_error("header not found"));
        assert!(!err.is_no_data());
    }

    #[test]
    fn test_user_message_has_no_location() {
        let err = err_custom_create!("Invalid address {}", "0xzz");
        assert_eq!(err.user_message(), "CustomError: Invalid address 0xzz");
        assert!(err.to_string().contains("wrapped.rs"));
    }
}
