//! Data model exchanged with the tokenomics backend.

pub mod packages;
pub mod payment;
pub mod request;
pub mod result;

pub use packages::*;
pub use payment::*;
pub use request::*;
pub use result::*;

/// Error raised when a catalog string does not name a known value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct CatalogError {
    pub kind: &'static str,
    pub value: String,
}

impl CatalogError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self { kind, value: value.into() }
    }
}
