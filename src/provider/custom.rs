//! Provider that delegates to a caller-supplied async function (vaults, federation endpoints,
//! fixtures).

// self
use crate::{
	_prelude::*,
	auth::Credentials,
	context::Context,
	error::RetrieveError,
	provider::{CredentialsFuture, ProvideCredentials},
};

/// Source label stamped on credentials that arrive without one.
pub const CUSTOM_FUNCTION_PROVIDER_SOURCE: &str = "CustomFunctionProvider";

type RetrieveFuture = Pin<Box<dyn Future<Output = Result<Credentials, BoxError>> + Send>>;
type RetrieveFn = Arc<dyn Fn(Context) -> RetrieveFuture + Send + Sync>;

/// Adapts any `Fn(Context) -> Future<Output = Result<Credentials, E>>` into a
/// [`ProvideCredentials`] implementation without further validation.
#[derive(Clone)]
pub struct CustomFunctionProvider {
	retrieve: RetrieveFn,
}
impl CustomFunctionProvider {
	/// Wraps `retrieve`.
	///
	/// Errors are reported as [`RetrieveError::Source`], except a
	/// [`crate::context::ContextError`] returned by the function, which keeps its cancellation
	/// meaning.
	pub fn new<F, Fut, E>(retrieve: F) -> Self
	where
		F: 'static + Send + Sync + Fn(Context) -> Fut,
		Fut: 'static + Send + Future<Output = Result<Credentials, E>>,
		E: 'static + Into<BoxError>,
	{
		let retrieve: RetrieveFn = Arc::new(move |ctx: Context| -> RetrieveFuture {
			let fut = retrieve(ctx);

			Box::pin(async move { fut.await.map_err(Into::into) })
		});

		Self { retrieve }
	}
}
impl Debug for CustomFunctionProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("CustomFunctionProvider(..)")
	}
}
impl ProvideCredentials for CustomFunctionProvider {
	fn provide_credentials(&self, ctx: Context) -> CredentialsFuture<'_> {
		let fut = (self.retrieve)(ctx);

		Box::pin(async move {
			let mut credentials = fut.await.map_err(RetrieveError::from_source)?;

			if credentials.source.is_empty() {
				credentials.source = CUSTOM_FUNCTION_PROVIDER_SOURCE.into();
			}

			Ok(credentials)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::context::ContextError;

	#[tokio::test]
	async fn credentials_pass_through_with_default_source() {
		let provider = CustomFunctionProvider::new(|_ctx| async {
			Credentials::builder("AKIDCUSTOM", "secret").expires_in(Duration::hours(1)).build()
		});
		let credentials = provider
			.provide_credentials(Context::background())
			.await
			.expect("Custom function should succeed.");

		assert_eq!(credentials.access_key_id, "AKIDCUSTOM");
		assert_eq!(credentials.source, CUSTOM_FUNCTION_PROVIDER_SOURCE);
	}

	#[tokio::test]
	async fn explicit_sources_are_preserved() {
		let provider = CustomFunctionProvider::new(|_ctx| async {
			Credentials::builder("AKIDCUSTOM", "secret").source("vault").build()
		});
		let credentials = provider
			.provide_credentials(Context::background())
			.await
			.expect("Custom function should succeed.");

		assert_eq!(credentials.source, "vault");
	}

	#[tokio::test]
	async fn failures_are_wrapped_by_kind() {
		let failing = CustomFunctionProvider::new(|_ctx| async {
			Err::<Credentials, _>(BoxError::from("vault sealed"))
		});
		let err = failing
			.provide_credentials(Context::background())
			.await
			.expect_err("Failing function must surface an error.");

		assert!(matches!(err, RetrieveError::Source { .. }));

		let cancelled = CustomFunctionProvider::new(|ctx: Context| async move {
			Err::<Credentials, _>(ctx.err().unwrap_or(ContextError::Cancelled))
		});
		let ctx = Context::background();

		ctx.cancel();

		let err =
			cancelled.provide_credentials(ctx).await.expect_err("Cancelled function must fail.");

		assert!(matches!(err, RetrieveError::Context(ContextError::Cancelled)));
	}
}
