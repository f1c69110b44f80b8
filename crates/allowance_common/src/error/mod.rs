mod bag;
mod custom;
mod wrapped;

pub use bag::ErrorBag;
pub use custom::{CustomError, NoDataError};
pub use wrapped::{is_no_data_signature, ResolverError};

/// Export macros for creating errors
mod macros;
