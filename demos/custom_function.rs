//! Demonstrates caching credentials produced by a custom async source, here a stand-in for a
//! vault that returns the common JSON credential document.

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use color_eyre::Result;
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};
// self
use role_credentials::{
	auth::Credentials,
	config::{self, ServiceConfig},
	context::Context,
	error::BoxError,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let reads = Arc::new(AtomicUsize::new(0));
	let counter = reads.clone();
	let base = ServiceConfig::new().with_region("us-west-2").with_app_id("custom-function-demo");
	let ctx = Context::background();
	let config = config::custom_function_config(&ctx, &base, move |_ctx| {
		let read = counter.fetch_add(1, Ordering::SeqCst) + 1;

		async move {
			let expiration = (OffsetDateTime::now_utc() + Duration::hours(1)).format(&Rfc3339)?;
			let document = format!(
				r#"{{"Version":1,"AccessKeyId":"AKIDVAULT{read}","SecretAccessKey":"demo-secret","Expiration":"{expiration}"}}"#
			);

			Ok::<_, BoxError>(Credentials::from_json(&document, "demo-vault")?)
		}
	})
	.await?;

	for _ in 0..3 {
		let credentials = config.resolve_credentials(&ctx).await?;

		println!("Resolved {} from {}.", credentials.access_key_id, credentials.source);
	}

	println!("Vault reads: {}.", reads.load(Ordering::SeqCst));

	Ok(())
}
