//! Crate-level error types shared across providers, the cache, and configuration assembly.

// self
use crate::{
	_prelude::*,
	auth::{ArnError, CredentialsBuilderError},
	context::ContextError,
	identity::ServiceError,
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Type-erased error used for caller-supplied sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Role ARN could not be parsed; no network call was made.
	#[error("Cannot parse the IAM role ARN `{arn}`.")]
	InvalidRoleArn {
		/// Raw ARN string supplied by the caller.
		arn: String,
		/// Underlying parsing failure.
		#[source]
		source: ArnError,
	},
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The base configuration could not prove a usable caller identity.
	#[error("Cannot determine the caller identity of the base configuration.")]
	CallerIdentity {
		/// Identity service failure.
		#[source]
		source: ServiceError,
	},
	/// The credential provider failed; shared by every caller waiting on the same attempt.
	#[error("Credential retrieval failed.")]
	Retrieval {
		/// Provider failure shared across waiters.
		#[source]
		source: Arc<RetrieveError>,
	},
	/// The caller gave up waiting.
	#[error(transparent)]
	Context(#[from] ContextError),
}
impl Error {
	/// Returns the phase that produced the error.
	pub fn phase(&self) -> Phase {
		match self {
			Self::InvalidRoleArn { .. } => Phase::Parse,
			Self::Config(_) => Phase::Config,
			Self::CallerIdentity { .. } => Phase::IdentityCheck,
			Self::Retrieval { source } if source.is_cancellation() => Phase::Cancellation,
			Self::Retrieval { .. } => Phase::Retrieval,
			Self::Context(_) => Phase::Cancellation,
		}
	}

	/// Returns `true` when the error stems from cancellation or an elapsed deadline rather than
	/// from a rejected request.
	pub fn is_cancellation(&self) -> bool {
		matches!(self.phase(), Phase::Cancellation)
	}
}

/// Phase labels attached to every [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
	/// Role ARN parsing.
	Parse,
	/// Option validation and configuration assembly.
	Config,
	/// Caller identity verification against the base configuration.
	IdentityCheck,
	/// Credential retrieval through a provider.
	Retrieval,
	/// Cancellation or deadline expiry.
	Cancellation,
}
impl Phase {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Phase::Parse => "parse",
			Phase::Config => "config",
			Phase::IdentityCheck => "identity_check",
			Phase::Retrieval => "retrieval",
			Phase::Cancellation => "cancellation",
		}
	}
}
impl Display for Phase {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures raised before any network call.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// Requested session duration is outside the range the identity service accepts.
	#[error("Session duration of {seconds} seconds is outside the supported range of 900..=43200 seconds.")]
	DurationOutOfRange {
		/// Requested duration in whole seconds.
		seconds: i64,
	},
	/// Session name does not satisfy the identity service's character rules.
	#[error("Role session name `{name}` must be 2-64 characters of [A-Za-z0-9_+=,.@-].")]
	InvalidSessionName {
		/// Offending session name.
		name: String,
	},
	/// MFA was configured with an empty device serial.
	#[error("MFA device serial number cannot be empty.")]
	EmptyMfaSerial,
	/// The configuration has no credential source attached.
	#[error("Configuration has no credential source.")]
	MissingCredentialSource,
}

/// Failures produced by a credential provider during retrieval.
#[derive(Debug, ThisError)]
pub enum RetrieveError {
	/// The identity service rejected or failed the role assumption call.
	#[error("Role assumption failed.")]
	AssumeRole(#[source] ServiceError),
	/// The role assumption response carried no credentials.
	#[error("Role assumption response did not include credentials.")]
	MissingCredentials,
	/// The provider returned credentials that failed validation.
	#[error("Provider returned invalid credentials.")]
	Credentials(#[from] CredentialsBuilderError),
	/// A caller-supplied credential source failed.
	#[error("Custom credential source failed.")]
	Source {
		/// Error reported by the source.
		#[source]
		source: BoxError,
	},
	/// The retrieval was cancelled or ran past its deadline.
	#[error(transparent)]
	Context(#[from] ContextError),
	/// The provider panicked or its task was torn down before producing a result.
	#[error("Credential provider stopped before producing a result.")]
	Aborted {
		/// Task failure reported by the runtime.
		#[source]
		source: tokio::task::JoinError,
	},
}
impl RetrieveError {
	/// Wraps a caller-supplied source failure, recovering context errors it carries.
	pub fn from_source(src: impl Into<BoxError>) -> Self {
		let src = src.into();

		match src.downcast::<ContextError>() {
			Ok(ctx) => Self::Context(*ctx),
			Err(source) => Self::Source { source },
		}
	}

	/// Returns `true` when the retrieval ended because of cancellation or a deadline.
	pub fn is_cancellation(&self) -> bool {
		matches!(self, Self::Context(_) | Self::AssumeRole(ServiceError::Context(_)))
	}
}
impl From<ServiceError> for RetrieveError {
	fn from(e: ServiceError) -> Self {
		match e {
			ServiceError::Context(ctx) => Self::Context(ctx),
			e => Self::AssumeRole(e),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn phases_follow_variants() {
		let parse = Error::InvalidRoleArn {
			arn: "nope".into(),
			source: "nope".parse::<crate::auth::Arn>().expect_err("Fixture ARN must be invalid."),
		};

		assert_eq!(parse.phase(), Phase::Parse);
		assert_eq!(Error::from(ConfigError::EmptyMfaSerial).phase(), Phase::Config);
		assert_eq!(
			Error::CallerIdentity { source: ServiceError::rejected("AccessDenied", "denied") }
				.phase(),
			Phase::IdentityCheck
		);
		assert_eq!(
			Error::Retrieval { source: Arc::new(RetrieveError::MissingCredentials) }.phase(),
			Phase::Retrieval
		);
		assert!(Error::from(ContextError::Cancelled).is_cancellation());
		assert!(
			Error::Retrieval { source: Arc::new(RetrieveError::Context(ContextError::Cancelled)) }
				.is_cancellation()
		);
	}

	#[test]
	fn source_recovers_context_errors() {
		let boxed: BoxError = Box::new(ContextError::DeadlineExceeded);

		assert!(matches!(
			RetrieveError::from_source(boxed),
			RetrieveError::Context(ContextError::DeadlineExceeded)
		));
		assert!(matches!(RetrieveError::from_source("vault sealed"), RetrieveError::Source { .. }));
	}

	#[test]
	fn service_context_errors_become_retrieval_context_errors() {
		let err = RetrieveError::from(ServiceError::Context(ContextError::Cancelled));

		assert!(matches!(err, RetrieveError::Context(ContextError::Cancelled)));
		assert!(err.is_cancellation());
	}
}
