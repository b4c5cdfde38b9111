//! Shared stubs for integration tests.

#![allow(dead_code)]

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime, macros};
use tokio::sync::Notify;
// self
use role_credentials::{
	auth::{Credentials, Secret},
	clock::{Clock, ManualClock},
	context::Context,
	identity::{
		AssumeRoleOutput, AssumeRoleRequest, CallerIdentity, IdentityService, ServiceCredentials,
		ServiceError, ServiceFuture,
	},
};

pub const ROLE_ARN: &str = "arn:aws:iam::123456789012:role/Example";

/// Instant every manual clock in the suite starts at.
pub fn epoch() -> OffsetDateTime {
	macros::datetime!(2025-01-01 00:00 UTC)
}

/// Identity service double that issues credentials valid for the requested duration, measured
/// on a manual clock.
#[derive(Debug)]
pub struct StubIdentityService {
	pub clock: ManualClock,
	pub identity_calls: AtomicUsize,
	pub assume_calls: AtomicUsize,
	pub fail_identity: AtomicBool,
	pub fail_assume: AtomicBool,
	/// Signalled when an `assume_role` call starts.
	pub started: Notify,
	delay: Mutex<StdDuration>,
	requests: Mutex<Vec<AssumeRoleRequest>>,
}
impl StubIdentityService {
	pub fn new(clock: ManualClock) -> Arc<Self> {
		Arc::new(Self {
			clock,
			identity_calls: AtomicUsize::new(0),
			assume_calls: AtomicUsize::new(0),
			fail_identity: AtomicBool::new(false),
			fail_assume: AtomicBool::new(false),
			started: Notify::new(),
			delay: Mutex::new(StdDuration::ZERO),
			requests: Mutex::new(Vec::new()),
		})
	}

	/// Makes every `assume_role` call take `delay` of tokio time.
	pub fn set_delay(&self, delay: StdDuration) {
		*self.delay.lock() = delay;
	}

	pub fn identity_calls(&self) -> usize {
		self.identity_calls.load(Ordering::SeqCst)
	}

	pub fn assume_calls(&self) -> usize {
		self.assume_calls.load(Ordering::SeqCst)
	}

	pub fn last_request(&self) -> Option<AssumeRoleRequest> {
		self.requests.lock().last().cloned()
	}
}
impl IdentityService for StubIdentityService {
	fn get_caller_identity(&self, _ctx: Context) -> ServiceFuture<'_, CallerIdentity> {
		Box::pin(async move {
			self.identity_calls.fetch_add(1, Ordering::SeqCst);

			if self.fail_identity.load(Ordering::SeqCst) {
				return Err(ServiceError::rejected("InvalidClientTokenId", "Token is invalid."));
			}

			Ok(CallerIdentity {
				account: Some("123456789012".into()),
				arn: Some("arn:aws:iam::123456789012:user/base".into()),
				user_id: Some("AIDABASE".into()),
			})
		})
	}

	fn assume_role(
		&self,
		ctx: Context,
		request: AssumeRoleRequest,
	) -> ServiceFuture<'_, AssumeRoleOutput> {
		Box::pin(async move {
			let call = self.assume_calls.fetch_add(1, Ordering::SeqCst) + 1;

			self.started.notify_one();

			let delay = *self.delay.lock();

			if !delay.is_zero() {
				ctx.run(tokio::time::sleep(delay)).await?;
			}
			if self.fail_assume.load(Ordering::SeqCst) {
				return Err(ServiceError::rejected("AccessDenied", "Not authorized to assume role."));
			}
			if let Some(mfa) = request.mfa.as_ref() {
				mfa.token_code()?;
			}

			let expiration = self.clock.now() + Duration::seconds(request.duration_seconds);

			self.requests.lock().push(request);

			Ok(AssumeRoleOutput {
				credentials: Some(ServiceCredentials {
					access_key_id: format!("ASIA{call}"),
					secret_access_key: Secret::new(format!("secret-{call}")),
					session_token: Secret::new(format!("token-{call}")),
					expiration,
				}),
				..Default::default()
			})
		})
	}
}

/// Builds credentials that expire `lifetime` after the clock's current instant.
pub fn credentials_expiring_in(
	clock: &ManualClock,
	access_key_id: &str,
	lifetime: Duration,
) -> Credentials {
	Credentials::builder(access_key_id, "secret")
		.expires_at(clock.now() + lifetime)
		.build()
		.expect("Credentials fixture should build.")
}
