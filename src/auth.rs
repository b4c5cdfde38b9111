//! Credential models and structured resource identifiers.

pub mod arn;
pub mod credentials;
pub mod secret;

pub use arn::*;
pub use credentials::*;
pub use secret::*;
