//! Form collection: template pre-fill, utility selection and required-field
//! enforcement before a request leaves the client.

pub mod collector;
pub mod templates;

pub use collector::{FormError, FormFile, FormState};
pub use templates::Template;
