//! Credential providers and the single-method capability they implement.
//!
//! [`ProvideCredentials`] is the seam the cache is polymorphic over. `assume_role` adapts an
//! [`crate::identity::IdentityService`] into a provider, `custom` adapts any async function, and
//! `static_credentials` serves fixed credentials for base configurations.

pub mod assume_role;
pub mod custom;
pub mod static_credentials;

pub use assume_role::*;
pub use custom::*;
pub use static_credentials::*;

// self
use crate::{_prelude::*, auth::Credentials, context::Context, error::RetrieveError};

/// Boxed future returned by [`ProvideCredentials::provide_credentials`].
pub type CredentialsFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Credentials, RetrieveError>> + 'a + Send>>;

/// Shared provider handle.
pub type SharedCredentialsProvider = Arc<dyn ProvideCredentials>;

/// Capability that produces a fresh credential set.
///
/// Implementations perform the (possibly slow) retrieval on every call; caching and refresh
/// de-duplication belong to [`crate::cache::CredentialsCache`].
pub trait ProvideCredentials
where
	Self: Send + Sync,
{
	/// Retrieves credentials, honouring `ctx` for cancellation and deadlines.
	fn provide_credentials(&self, ctx: Context) -> CredentialsFuture<'_>;
}
