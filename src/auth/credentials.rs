//! Immutable credential sets, lifecycle helpers, and builders.

// self
use crate::{_prelude::*, auth::secret::Secret};

/// Errors produced by [`CredentialsBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CredentialsBuilderError {
	/// Issued when the access key identifier is empty.
	#[error("Access key identifier is required.")]
	MissingAccessKeyId,
	/// Issued when the secret access key is empty.
	#[error("Secret access key is required.")]
	MissingSecretAccessKey,
	/// Issued when a relative expiry lands outside the representable range of instants.
	#[error("Credential expiry is out of range.")]
	ExpiryOutOfRange,
}

/// Errors produced when decoding a credential document.
#[derive(Debug, ThisError)]
pub enum CredentialsParseError {
	/// The document is not valid JSON or does not match the expected shape.
	#[error("Credential document is malformed.")]
	Malformed {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The document declares a version this crate does not understand.
	#[error("Credential document version {version} is not supported.")]
	UnsupportedVersion {
		/// Declared document version.
		version: u8,
	},
	/// The decoded values failed validation.
	#[error("Credential document contains invalid credentials.")]
	Invalid(#[from] CredentialsBuilderError),
}

/// Access key, secret key, optional session token, and optional expiry.
///
/// A value is never mutated after construction; refreshing replaces it wholesale.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// Access key identifier.
	pub access_key_id: String,
	/// Secret access key; callers must avoid logging it.
	pub secret_access_key: Secret,
	/// Session token issued with temporary credentials.
	pub session_token: Option<Secret>,
	/// Label of the provider that produced the credentials.
	pub source: String,
	/// Expiry instant; `None` means the credentials never expire.
	pub expires_at: Option<OffsetDateTime>,
}
impl Credentials {
	/// Returns a builder seeded with the mandatory key pair.
	pub fn builder(
		access_key_id: impl Into<String>,
		secret_access_key: impl Into<String>,
	) -> CredentialsBuilder {
		CredentialsBuilder::new(access_key_id.into(), secret_access_key.into())
	}

	/// Decodes the `{"Version": 1, "AccessKeyId": ..., "SecretAccessKey": ..., "SessionToken":
	/// ..., "Expiration": ...}` document commonly returned by credential helpers and vaults.
	pub fn from_json(
		payload: &str,
		source: impl Into<String>,
	) -> Result<Self, CredentialsParseError> {
		let mut de = serde_json::Deserializer::from_str(payload);
		let document: CredentialDocument = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| CredentialsParseError::Malformed { source })?;

		if document.version != 1 {
			return Err(CredentialsParseError::UnsupportedVersion { version: document.version });
		}

		let mut builder = Self::builder(document.access_key_id, document.secret_access_key)
			.source(source);

		if let Some(token) = document.session_token {
			builder = builder.session_token(token);
		}
		if let Some(instant) = document.expiration {
			builder = builder.expires_at(instant);
		}

		Ok(builder.build()?)
	}

	/// Returns `true` if the credentials carry an expiry instant.
	pub fn can_expire(&self) -> bool {
		self.expires_at.is_some()
	}

	/// Returns `true` if the credentials have expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}

	/// Convenience helper that checks expiry using the current UTC instant.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("access_key_id", &self.access_key_id)
			.field("secret_access_key", &"<redacted>")
			.field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
			.field("source", &self.source)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Credentials`].
#[derive(Clone, Debug)]
pub struct CredentialsBuilder {
	access_key_id: String,
	secret_access_key: Secret,
	session_token: Option<Secret>,
	source: String,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl CredentialsBuilder {
	fn new(access_key_id: String, secret_access_key: String) -> Self {
		Self {
			access_key_id,
			secret_access_key: Secret::new(secret_access_key),
			session_token: None,
			source: String::new(),
			issued_at: None,
			expires_at: None,
			expires_in: None,
		}
	}

	/// Provides the session token.
	pub fn session_token(mut self, token: impl Into<String>) -> Self {
		self.session_token = Some(Secret::new(token));

		self
	}

	/// Labels the provider that produced the credentials.
	pub fn source(mut self, source: impl Into<String>) -> Self {
		self.source = source.into();

		self
	}

	/// Sets the instant relative expiries are measured from (defaults to now).
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Consumes the builder and produces [`Credentials`].
	pub fn build(self) -> Result<Credentials, CredentialsBuilderError> {
		if self.access_key_id.is_empty() {
			return Err(CredentialsBuilderError::MissingAccessKeyId);
		}
		if self.secret_access_key.is_empty() {
			return Err(CredentialsBuilderError::MissingSecretAccessKey);
		}

		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => Some(instant),
			(None, Some(delta)) => Some(
				self.issued_at
					.unwrap_or_else(OffsetDateTime::now_utc)
					.checked_add(delta)
					.ok_or(CredentialsBuilderError::ExpiryOutOfRange)?,
			),
			(None, None) => None,
		};

		Ok(Credentials {
			access_key_id: self.access_key_id,
			secret_access_key: self.secret_access_key,
			session_token: self.session_token,
			source: self.source,
			expires_at,
		})
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialDocument {
	version: u8,
	access_key_id: String,
	secret_access_key: String,
	#[serde(default)]
	session_token: Option<String>,
	#[serde(default, with = "time::serde::rfc3339::option")]
	expiration: Option<OffsetDateTime>,
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::{PrimitiveDateTime, macros};
	// self
	use super::*;

	#[test]
	fn expiry_checks_cover_boundaries() {
		let credentials = Credentials::builder("AKIDEXAMPLE", "secret")
			.session_token("token")
			.expires_at(macros::datetime!(2025-01-01 01:00 UTC))
			.build()
			.expect("Credentials fixture should build.");

		assert!(credentials.can_expire());
		assert!(!credentials.is_expired_at(macros::datetime!(2025-01-01 00:59:59 UTC)));
		assert!(credentials.is_expired_at(macros::datetime!(2025-01-01 01:00 UTC)));
	}

	#[test]
	fn builder_handles_relative_expiry() {
		let credentials = Credentials::builder("AKIDEXAMPLE", "secret")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::minutes(15))
			.build()
			.expect("Credentials builder should support relative expiry.");

		assert_eq!(credentials.expires_at, Some(macros::datetime!(2025-01-01 00:15 UTC)));
	}

	#[test]
	fn relative_expiry_past_the_maximum_instant_is_rejected() {
		assert_eq!(
			Credentials::builder("AKIDEXAMPLE", "secret")
				.issued_at(PrimitiveDateTime::MAX.assume_utc())
				.expires_in(Duration::hours(1))
				.build(),
			Err(CredentialsBuilderError::ExpiryOutOfRange)
		);
	}

	#[test]
	fn static_credentials_never_expire() {
		let credentials = Credentials::builder("AKIDEXAMPLE", "secret")
			.build()
			.expect("Credentials without expiry should build.");

		assert!(!credentials.can_expire());
		assert!(!credentials.is_expired_at(macros::datetime!(9999-01-01 00:00 UTC)));
	}

	#[test]
	fn builder_rejects_empty_keys() {
		assert_eq!(
			Credentials::builder("", "secret").build(),
			Err(CredentialsBuilderError::MissingAccessKeyId)
		);
		assert_eq!(
			Credentials::builder("AKIDEXAMPLE", "").build(),
			Err(CredentialsBuilderError::MissingSecretAccessKey)
		);
	}

	#[test]
	fn debug_redacts_secrets() {
		let credentials = Credentials::builder("AKIDEXAMPLE", "very-secret")
			.session_token("very-secret-token")
			.build()
			.expect("Credentials fixture should build.");
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("AKIDEXAMPLE"));
		assert!(!rendered.contains("very-secret"));
	}

	#[test]
	fn json_document_decodes() {
		let credentials = Credentials::from_json(
			r#"{"Version":1,"AccessKeyId":"AKIDEXAMPLE","SecretAccessKey":"secret","SessionToken":"token","Expiration":"2025-01-01T01:00:00Z"}"#,
			"vault",
		)
		.expect("Credential document should decode.");

		assert_eq!(credentials.access_key_id, "AKIDEXAMPLE");
		assert_eq!(credentials.session_token.as_ref().map(Secret::expose), Some("token"));
		assert_eq!(credentials.source, "vault");
		assert_eq!(credentials.expires_at, Some(macros::datetime!(2025-01-01 01:00 UTC)));
	}

	#[test]
	fn json_document_errors_carry_context() {
		let err = Credentials::from_json(r#"{"Version":1,"AccessKeyId":7}"#, "vault")
			.expect_err("Numeric access key must be rejected.");

		match err {
			CredentialsParseError::Malformed { source } =>
				assert_eq!(source.path().to_string(), "AccessKeyId"),
			other => panic!("Unexpected error: {other:?}."),
		}

		let err = Credentials::from_json(
			r#"{"Version":2,"AccessKeyId":"AKIDEXAMPLE","SecretAccessKey":"secret"}"#,
			"vault",
		)
		.expect_err("Unknown versions must be rejected.");

		assert!(matches!(err, CredentialsParseError::UnsupportedVersion { version: 2 }));
	}
}
