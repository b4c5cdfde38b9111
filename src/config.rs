//! Service configurations and the constructors that attach auto-refreshing credential sources.
//!
//! [`assume_role_config`] and [`custom_function_config`] never mutate the base configuration:
//! they return a copy whose credential source is a fresh [`CredentialsCache`].

// self
use crate::{
	_prelude::*,
	auth::{Arn, Credentials},
	cache::{CacheOptions, CredentialsCache},
	clock::{SharedClock, SystemClock},
	context::Context,
	error::ConfigError,
	identity::{CallerIdentity, IdentityService, ServiceError, SharedIdentityService},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{
		AssumeRoleOption, AssumeRoleOptions, AssumeRoleProvider, CustomFunctionProvider,
		ProvideCredentials,
	},
};

/// Settings handle shared by service clients; `Clone` yields an independent copy.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
	/// Region requests are signed for.
	pub region: Option<String>,
	/// Endpoint override.
	pub endpoint_url: Option<Url>,
	/// Maximum attempts a client makes per request.
	pub retry_max_attempts: Option<u32>,
	/// Application identifier appended to user agents.
	pub app_id: Option<String>,
	/// Opaque settings carried through untouched.
	pub settings: BTreeMap<String, String>,
	/// Time source for expiry decisions.
	pub clock: SharedClock,
	credentials: Option<CredentialsCache>,
}
impl ServiceConfig {
	/// Creates an empty configuration using the system clock.
	pub fn new() -> Self {
		Self {
			region: None,
			endpoint_url: None,
			retry_max_attempts: None,
			app_id: None,
			settings: BTreeMap::new(),
			clock: Arc::new(SystemClock),
			credentials: None,
		}
	}

	/// Sets the region.
	pub fn with_region(mut self, region: impl Into<String>) -> Self {
		self.region = Some(region.into());

		self
	}

	/// Sets the endpoint override.
	pub fn with_endpoint_url(mut self, url: Url) -> Self {
		self.endpoint_url = Some(url);

		self
	}

	/// Sets the retry budget.
	pub fn with_retry_max_attempts(mut self, attempts: u32) -> Self {
		self.retry_max_attempts = Some(attempts);

		self
	}

	/// Sets the application identifier.
	pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
		self.app_id = Some(app_id.into());

		self
	}

	/// Adds an opaque setting, replacing any previous value for `key`.
	pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.settings.insert(key.into(), value.into());

		self
	}

	/// Replaces the time source.
	pub fn with_clock(mut self, clock: SharedClock) -> Self {
		self.clock = clock;

		self
	}

	/// Uses `provider` as the credential source, cached with this configuration's clock.
	pub fn with_credentials_provider(self, provider: impl 'static + ProvideCredentials) -> Self {
		let options = CacheOptions::default().with_clock(self.clock.clone());

		self.with_credentials_cache(CredentialsCache::with_options(Arc::new(provider), options))
	}

	/// Uses an existing cache as the credential source.
	pub fn with_credentials_cache(mut self, cache: CredentialsCache) -> Self {
		self.credentials = Some(cache);

		self
	}

	/// Returns the credential source, if one is attached.
	pub fn credentials(&self) -> Option<&CredentialsCache> {
		self.credentials.as_ref()
	}

	/// Resolves current credentials through the attached cache.
	pub async fn resolve_credentials(&self, ctx: &Context) -> Result<Credentials> {
		let cache = self.credentials.as_ref().ok_or(ConfigError::MissingCredentialSource)?;

		cache.get(ctx).await
	}
}
impl Default for ServiceConfig {
	fn default() -> Self {
		Self::new()
	}
}

/// Confirms that `client` can authenticate by asking who the caller is.
pub async fn verify_caller_identity(
	ctx: &Context,
	client: &dyn IdentityService,
) -> Result<CallerIdentity> {
	match ctx.run(client.get_caller_identity(ctx.clone())).await? {
		Ok(identity) => Ok(identity),
		Err(ServiceError::Context(err)) => Err(err.into()),
		Err(source) => Err(Error::CallerIdentity { source }),
	}
}

/// Returns a copy of `base` whose credentials come from assuming `role_arn` with `client`.
///
/// The ARN is parsed and the options validated before any network call; the caller identity is
/// then verified once. Role credentials themselves are fetched lazily on the first
/// [`CredentialsCache::get`] and refreshed 5 minutes before they expire.
pub async fn assume_role_config<I>(
	ctx: &Context,
	base: &ServiceConfig,
	client: SharedIdentityService,
	role_arn: &str,
	options: I,
) -> Result<ServiceConfig>
where
	I: IntoIterator<Item = AssumeRoleOption>,
{
	const KIND: FlowKind = FlowKind::AssumeRole;

	let span = FlowSpan::new(KIND, "assume_role_config");

	obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

	let arn = Arn::parse(role_arn)
		.map_err(|source| Error::InvalidRoleArn { arn: role_arn.to_owned(), source });
	let options = arn.map(|arn| AssumeRoleOptions::new(arn).apply(options));
	let result = span
		.instrument(async move {
			let options = options?;

			options.validate()?;
			verify_caller_identity(ctx, client.as_ref()).await?;

			let provider = AssumeRoleProvider::new(client, options)?;

			Ok(base.clone().with_credentials_provider(provider))
		})
		.await;

	match &result {
		Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
		Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
	}

	result
}

/// Returns a copy of `base` whose credentials come from `retrieve`, cached with a 5 minute
/// expiry window.
///
/// Nothing is called until the first [`CredentialsCache::get`]; the only failure is a `ctx` that
/// is already cancelled or past its deadline.
pub async fn custom_function_config<F, Fut, E>(
	ctx: &Context,
	base: &ServiceConfig,
	retrieve: F,
) -> Result<ServiceConfig>
where
	F: 'static + Send + Sync + Fn(Context) -> Fut,
	Fut: 'static + Send + Future<Output = Result<Credentials, E>>,
	E: 'static + Into<BoxError>,
{
	const KIND: FlowKind = FlowKind::CustomFunction;

	let _span = FlowSpan::new(KIND, "custom_function_config").entered();

	obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

	if let Some(err) = ctx.err() {
		obs::record_flow_outcome(KIND, FlowOutcome::Failure);

		return Err(err.into());
	}

	let config = base.clone().with_credentials_provider(CustomFunctionProvider::new(retrieve));

	obs::record_flow_outcome(KIND, FlowOutcome::Success);

	Ok(config)
}
