//! Role assumption: request options, composable modifiers, and the provider that exchanges
//! them for temporary credentials.
//!
//! Options are applied in the order given, so a later modifier for the same field replaces an
//! earlier one. Validation runs once, when the provider is constructed, and never touches the
//! network.

// self
use crate::{
	_prelude::*,
	auth::{Arn, Credentials},
	context::Context,
	error::{ConfigError, RetrieveError},
	identity::{
		AssumeRoleRequest, MfaDevice, MfaTokenProvider, PolicyDescriptor, SharedIdentityService,
		Tag,
	},
	provider::{CredentialsFuture, ProvideCredentials},
};

/// Source label stamped on credentials produced by [`AssumeRoleProvider`].
pub const ASSUME_ROLE_PROVIDER_SOURCE: &str = "AssumeRoleProvider";

const SESSION_NAME_PREFIX: &str = "role-credentials-";
const SESSION_NAME_MAX_LEN: usize = 64;
const SESSION_NAME_MIN_LEN: usize = 2;

/// Mutable role assumption request assembled from [`AssumeRoleOption`] values.
#[derive(Clone, Debug)]
pub struct AssumeRoleOptions {
	/// Role to assume.
	pub role_arn: Arn,
	/// Session name; defaults to `role-credentials-<unix-nanos>`.
	pub role_session_name: String,
	/// Session lifetime; defaults to [`AssumeRoleOptions::DEFAULT_DURATION`].
	pub duration: Duration,
	/// Shared secret for cross-party delegation.
	pub external_id: Option<String>,
	/// Inline session policy document.
	pub policy: Option<String>,
	/// Managed session policies.
	pub policy_arns: Vec<PolicyDescriptor>,
	/// Source identity propagated to the session.
	pub source_identity: Option<String>,
	/// Session tags, sorted by key.
	pub tags: Vec<Tag>,
	/// Keys of tags that propagate to nested delegations.
	pub transitive_tag_keys: Vec<String>,
	/// MFA device serial plus code provider.
	pub mfa: Option<MfaDevice>,
}
impl AssumeRoleOptions {
	/// Session lifetime used when no duration modifier is applied.
	pub const DEFAULT_DURATION: Duration = Duration::minutes(15);
	/// Shortest session the identity service issues.
	pub const MIN_DURATION: Duration = Duration::minutes(15);
	/// Longest session the identity service issues.
	pub const MAX_DURATION: Duration = Duration::hours(12);

	/// Creates options for `role_arn` with default session name and duration.
	pub fn new(role_arn: Arn) -> Self {
		Self {
			role_arn,
			role_session_name: default_session_name(),
			duration: Self::DEFAULT_DURATION,
			external_id: None,
			policy: None,
			policy_arns: Vec::new(),
			source_identity: None,
			tags: Vec::new(),
			transitive_tag_keys: Vec::new(),
			mfa: None,
		}
	}

	/// Applies `options` in order.
	pub fn apply<I>(mut self, options: I) -> Self
	where
		I: IntoIterator<Item = AssumeRoleOption>,
	{
		for option in options {
			option.apply_to(&mut self);
		}

		self
	}

	/// Checks the options against the identity service's documented limits.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.duration < Self::MIN_DURATION || self.duration > Self::MAX_DURATION {
			return Err(ConfigError::DurationOutOfRange { seconds: self.duration.whole_seconds() });
		}
		if !is_valid_session_name(&self.role_session_name) {
			return Err(ConfigError::InvalidSessionName { name: self.role_session_name.clone() });
		}
		if self.mfa.as_ref().is_some_and(|mfa| mfa.serial_number.is_empty()) {
			return Err(ConfigError::EmptyMfaSerial);
		}

		Ok(())
	}

	/// Builds the request handed to the identity service.
	pub fn to_request(&self) -> AssumeRoleRequest {
		AssumeRoleRequest {
			role_arn: self.role_arn.to_string(),
			role_session_name: self.role_session_name.clone(),
			duration_seconds: self.duration.whole_seconds(),
			external_id: self.external_id.clone(),
			policy: self.policy.clone(),
			policy_arns: self.policy_arns.clone(),
			source_identity: self.source_identity.clone(),
			tags: self.tags.clone(),
			transitive_tag_keys: self.transitive_tag_keys.clone(),
			mfa: self.mfa.clone(),
		}
	}
}

/// One composable modification of [`AssumeRoleOptions`].
#[derive(Clone, Debug)]
pub enum AssumeRoleOption {
	/// Sets the session name.
	RoleSessionName(String),
	/// Sets the session lifetime.
	Duration(Duration),
	/// Sets the external ID.
	ExternalId(String),
	/// Sets the inline session policy.
	Policy(String),
	/// Replaces the managed session policies.
	PolicyArns(Vec<PolicyDescriptor>),
	/// Sets the source identity.
	SourceIdentity(String),
	/// Replaces the session tags.
	Tags(Vec<Tag>),
	/// Replaces the transitive tag keys.
	TransitiveTagKeys(Vec<String>),
	/// Sets the MFA device and its code provider.
	Mfa(MfaDevice),
}
impl AssumeRoleOption {
	/// Writes this option into `options`, replacing any previous value for the same field.
	pub fn apply_to(self, options: &mut AssumeRoleOptions) {
		match self {
			Self::RoleSessionName(name) => options.role_session_name = name,
			Self::Duration(duration) => options.duration = duration,
			Self::ExternalId(id) => options.external_id = Some(id),
			Self::Policy(policy) => options.policy = Some(policy),
			Self::PolicyArns(arns) => options.policy_arns = arns,
			Self::SourceIdentity(id) => options.source_identity = Some(id),
			Self::Tags(tags) => options.tags = tags,
			Self::TransitiveTagKeys(keys) => options.transitive_tag_keys = keys,
			Self::Mfa(device) => options.mfa = Some(device),
		}
	}
}

/// Sets the role session name.
pub fn with_role_session_name(name: impl Into<String>) -> AssumeRoleOption {
	AssumeRoleOption::RoleSessionName(name.into())
}

/// Sets the session duration.
pub fn with_duration(duration: Duration) -> AssumeRoleOption {
	AssumeRoleOption::Duration(duration)
}

/// Sets the external ID.
pub fn with_external_id(external_id: impl Into<String>) -> AssumeRoleOption {
	AssumeRoleOption::ExternalId(external_id.into())
}

/// Sets an inline session policy.
pub fn with_policy(policy: impl Into<String>) -> AssumeRoleOption {
	AssumeRoleOption::Policy(policy.into())
}

/// Sets managed policy ARNs.
pub fn with_policy_arns<I, S>(arns: I) -> AssumeRoleOption
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	AssumeRoleOption::PolicyArns(
		arns.into_iter().map(|arn| PolicyDescriptor { arn: arn.into() }).collect(),
	)
}

/// Sets the source identity.
pub fn with_source_identity(id: impl Into<String>) -> AssumeRoleOption {
	AssumeRoleOption::SourceIdentity(id.into())
}

/// Attaches session tags.
///
/// Input order is irrelevant: tags are keyed (the last value for a repeated key wins) and
/// emitted sorted by key.
pub fn with_tags<I, K, V>(tags: I) -> AssumeRoleOption
where
	I: IntoIterator<Item = (K, V)>,
	K: Into<String>,
	V: Into<String>,
{
	let keyed = tags
		.into_iter()
		.map(|(key, value)| (key.into(), value.into()))
		.collect::<BTreeMap<String, String>>();

	AssumeRoleOption::Tags(keyed.into_iter().map(|(key, value)| Tag { key, value }).collect())
}

/// Specifies transitive tag keys.
pub fn with_transitive_tag_keys<I, S>(keys: I) -> AssumeRoleOption
where
	I: IntoIterator<Item = S>,
	S: Into<String>,
{
	AssumeRoleOption::TransitiveTagKeys(keys.into_iter().map(Into::into).collect())
}

/// Sets the MFA serial number and the provider that returns its current code.
pub fn with_mfa<F, E>(serial_number: impl Into<String>, token_provider: F) -> AssumeRoleOption
where
	F: 'static + Send + Sync + Fn() -> Result<String, E>,
	E: 'static + Into<BoxError>,
{
	let token_provider: MfaTokenProvider =
		Arc::new(move || -> Result<String, BoxError> { token_provider().map_err(Into::into) });

	AssumeRoleOption::Mfa(MfaDevice { serial_number: serial_number.into(), token_provider })
}

/// Exchanges the configured role for temporary credentials on every call.
#[derive(Clone)]
pub struct AssumeRoleProvider {
	client: SharedIdentityService,
	options: AssumeRoleOptions,
}
impl AssumeRoleProvider {
	/// Validates `options` and binds them to `client`. Performs no I/O.
	pub fn new(
		client: SharedIdentityService,
		options: AssumeRoleOptions,
	) -> Result<Self, ConfigError> {
		options.validate()?;

		Ok(Self { client, options })
	}

	/// Returns the options the provider sends.
	pub fn options(&self) -> &AssumeRoleOptions {
		&self.options
	}
}
impl Debug for AssumeRoleProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AssumeRoleProvider").field("options", &self.options).finish()
	}
}
impl ProvideCredentials for AssumeRoleProvider {
	fn provide_credentials(&self, ctx: Context) -> CredentialsFuture<'_> {
		let request = self.options.to_request();

		Box::pin(async move {
			let output = self.client.assume_role(ctx, request).await?;
			let issued = output.credentials.ok_or(RetrieveError::MissingCredentials)?;

			Ok(Credentials::builder(issued.access_key_id, issued.secret_access_key.expose())
				.session_token(issued.session_token.expose())
				.expires_at(issued.expiration)
				.source(ASSUME_ROLE_PROVIDER_SOURCE)
				.build()?)
		})
	}
}

fn default_session_name() -> String {
	format!("{SESSION_NAME_PREFIX}{}", OffsetDateTime::now_utc().unix_timestamp_nanos())
}

fn is_valid_session_name(name: &str) -> bool {
	(SESSION_NAME_MIN_LEN..=SESSION_NAME_MAX_LEN).contains(&name.len())
		&& name.chars().all(|c| c.is_ascii_alphanumeric() || "_+=,.@-".contains(c))
}
