//! Demonstrates assuming a role through an in-process identity service and reading the cached,
//! auto-refreshing credentials from the derived configuration.

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use color_eyre::Result;
use time::{Duration, OffsetDateTime};
// self
use role_credentials::{
	auth::{Credentials, Secret},
	config::{self, ServiceConfig},
	context::Context,
	identity::{
		AssumeRoleOutput, AssumeRoleRequest, CallerIdentity, IdentityService, ServiceCredentials,
		ServiceFuture,
	},
	provider::{self, StaticCredentialsProvider},
};

/// Identity service that issues credentials locally instead of calling a remote endpoint.
#[derive(Debug, Default)]
struct LocalIdentityService {
	issued: AtomicUsize,
}
impl IdentityService for LocalIdentityService {
	fn get_caller_identity(&self, _ctx: Context) -> ServiceFuture<'_, CallerIdentity> {
		Box::pin(async {
			Ok(CallerIdentity {
				account: Some("123456789012".into()),
				arn: Some("arn:aws:iam::123456789012:user/demo".into()),
				user_id: None,
			})
		})
	}

	fn assume_role(
		&self,
		_ctx: Context,
		request: AssumeRoleRequest,
	) -> ServiceFuture<'_, AssumeRoleOutput> {
		Box::pin(async move {
			let issued = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

			println!("Assuming {} as {}.", request.role_arn, request.role_session_name);

			Ok(AssumeRoleOutput {
				credentials: Some(ServiceCredentials {
					access_key_id: format!("ASIADEMO{issued}"),
					secret_access_key: Secret::new("demo-secret"),
					session_token: Secret::new("demo-token"),
					expiration: OffsetDateTime::now_utc()
						+ Duration::seconds(request.duration_seconds),
				}),
				..Default::default()
			})
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let base = ServiceConfig::new().with_region("us-east-1").with_credentials_provider(
		StaticCredentialsProvider::new(Credentials::builder("AKIDBASE", "base-secret").build()?),
	);
	let client = Arc::new(LocalIdentityService::default());
	let ctx = Context::background();
	let config = config::assume_role_config(
		&ctx,
		&base,
		client.clone(),
		"arn:aws:iam::123456789012:role/demo",
		[
			provider::with_role_session_name("demo-session"),
			provider::with_duration(Duration::hours(1)),
			provider::with_tags([("team", "platform")]),
		],
	)
	.await?;

	for _ in 0..3 {
		let credentials = config.resolve_credentials(&ctx).await?;

		println!(
			"Resolved {} expiring at {:?}.",
			credentials.access_key_id, credentials.expires_at
		);
	}

	println!("Role assumptions: {}.", client.issued.load(Ordering::SeqCst));

	Ok(())
}
