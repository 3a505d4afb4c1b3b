//! Generation requestor and payment endpoints of the tokenomics backend.

pub mod api;
pub mod error;

pub use api::BackendClient;
pub use error::ClientError;
