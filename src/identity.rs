//! Identity service boundary: role assumption, caller identity, and MFA token capabilities.
//!
//! The crate never speaks the identity service's wire protocol. Callers inject an
//! [`IdentityService`] implementation (an SDK adapter, an in-process fake) and the providers
//! exchange crate-owned request/response types with it.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	context::{Context, ContextError},
};

/// Boxed future returned by [`IdentityService`] methods.
pub type ServiceFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, ServiceError>> + 'a + Send>>;

/// Shared identity service handle.
pub type SharedIdentityService = Arc<dyn IdentityService>;

/// Capability that returns the current MFA code on demand.
pub type MfaTokenProvider = Arc<dyn Fn() -> Result<String, BoxError> + Send + Sync>;

/// Client contract for the identity service.
///
/// Implementations own their transport, signing, and retry logic. They are expected to
/// honour the supplied [`Context`] and surface cancellation as
/// [`ServiceError::Context`].
pub trait IdentityService
where
	Self: Send + Sync,
{
	/// Returns details about the identity whose credentials the client uses.
	fn get_caller_identity(&self, ctx: Context) -> ServiceFuture<'_, CallerIdentity>;

	/// Requests temporary credentials for the role described by `request`.
	fn assume_role(
		&self,
		ctx: Context,
		request: AssumeRoleRequest,
	) -> ServiceFuture<'_, AssumeRoleOutput>;
}

/// Failures reported by an [`IdentityService`].
#[derive(Debug, ThisError)]
pub enum ServiceError {
	/// The service answered with an error response.
	#[error("Identity service rejected the request ({code}): {message}.")]
	Rejected {
		/// Service error code, e.g. `AccessDenied`.
		code: String,
		/// Service-supplied message.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The request never produced a response.
	#[error("Transport error occurred while calling the identity service.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// The MFA token provider failed.
	#[error(transparent)]
	MfaToken(#[from] MfaTokenError),
	/// The call was cancelled or ran past its deadline.
	#[error(transparent)]
	Context(#[from] ContextError),
}
impl ServiceError {
	/// Builds a [`ServiceError::Rejected`] without an HTTP status.
	pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Rejected { code: code.into(), message: message.into(), status: None }
	}

	/// Wraps a transport-specific failure.
	pub fn transport(src: impl Into<BoxError>) -> Self {
		Self::Transport { source: src.into() }
	}
}

/// Failure returned when the MFA token provider cannot produce a code.
#[derive(Debug, ThisError)]
#[error("MFA token provider for device `{serial_number}` failed.")]
pub struct MfaTokenError {
	/// Device serial the code was requested for.
	pub serial_number: String,
	/// Error reported by the token provider.
	#[source]
	pub source: BoxError,
}

/// Identity details returned by [`IdentityService::get_caller_identity`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
	/// Account that owns the calling identity.
	pub account: Option<String>,
	/// ARN of the calling identity.
	pub arn: Option<String>,
	/// Unique identifier of the calling identity.
	pub user_id: Option<String>,
}

/// Managed policy reference attached to a role session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyDescriptor {
	/// Policy ARN.
	pub arn: String,
}

/// Session tag attached to a role session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
	/// Tag key.
	pub key: String,
	/// Tag value.
	pub value: String,
}
impl Tag {
	/// Creates a tag from a key/value pair.
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self { key: key.into(), value: value.into() }
	}
}

/// MFA device serial plus the capability that produces its current code.
#[derive(Clone)]
pub struct MfaDevice {
	/// Device serial number or ARN.
	pub serial_number: String,
	/// Code provider, invoked by the identity service when the call requires it.
	pub token_provider: MfaTokenProvider,
}
impl MfaDevice {
	/// Asks the token provider for the current code.
	pub fn token_code(&self) -> Result<String, MfaTokenError> {
		(self.token_provider)().map_err(|source| MfaTokenError {
			serial_number: self.serial_number.clone(),
			source,
		})
	}
}
impl Debug for MfaDevice {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MfaDevice")
			.field("serial_number", &self.serial_number)
			.field("token_provider", &"<fn>")
			.finish()
	}
}

/// Request handed to [`IdentityService::assume_role`].
#[derive(Clone, Debug)]
pub struct AssumeRoleRequest {
	/// Role to assume.
	pub role_arn: String,
	/// Session name recorded by the service.
	pub role_session_name: String,
	/// Requested session lifetime in seconds.
	pub duration_seconds: i64,
	/// Shared secret for cross-party delegation.
	pub external_id: Option<String>,
	/// Inline session policy document.
	pub policy: Option<String>,
	/// Managed session policies.
	pub policy_arns: Vec<PolicyDescriptor>,
	/// Source identity propagated to the session.
	pub source_identity: Option<String>,
	/// Session tags.
	pub tags: Vec<Tag>,
	/// Keys of tags that propagate to nested delegations.
	pub transitive_tag_keys: Vec<String>,
	/// MFA device; the service calls [`MfaDevice::token_code`] when it needs a code.
	pub mfa: Option<MfaDevice>,
}

/// Temporary credentials as returned by the identity service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCredentials {
	/// Access key identifier.
	pub access_key_id: String,
	/// Secret access key.
	pub secret_access_key: Secret,
	/// Session token.
	pub session_token: Secret,
	/// Expiry instant.
	pub expiration: OffsetDateTime,
}

/// Assumed role user details.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumedRoleUser {
	/// ARN of the assumed role session.
	pub arn: String,
	/// Unique identifier of the assumed role session.
	pub assumed_role_id: String,
}

/// Response of [`IdentityService::assume_role`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumeRoleOutput {
	/// Issued credentials; the service should always populate them on success.
	pub credentials: Option<ServiceCredentials>,
	/// Session identity details.
	pub assumed_role_user: Option<AssumedRoleUser>,
	/// Percentage of the packed policy size limit consumed by the session policies.
	pub packed_policy_size: Option<i32>,
	/// Source identity echoed by the service.
	pub source_identity: Option<String>,
}
