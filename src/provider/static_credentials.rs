//! Provider that always returns the same credentials.

// self
use crate::{
	_prelude::*,
	auth::Credentials,
	context::Context,
	provider::{CredentialsFuture, ProvideCredentials},
};

/// Source label stamped on credentials served by [`StaticCredentialsProvider`].
pub const STATIC_PROVIDER_SOURCE: &str = "StaticCredentialsProvider";

/// Serves fixed credentials, typically long-lived base keys.
#[derive(Clone, Debug)]
pub struct StaticCredentialsProvider(Credentials);
impl StaticCredentialsProvider {
	/// Wraps `credentials`, labelling them when no source was set.
	pub fn new(mut credentials: Credentials) -> Self {
		if credentials.source.is_empty() {
			credentials.source = STATIC_PROVIDER_SOURCE.into();
		}

		Self(credentials)
	}
}
impl ProvideCredentials for StaticCredentialsProvider {
	fn provide_credentials(&self, _ctx: Context) -> CredentialsFuture<'_> {
		let credentials = self.0.clone();

		Box::pin(async move { Ok(credentials) })
	}
}
