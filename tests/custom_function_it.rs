mod common;

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use time::Duration;
// self
use common::{credentials_expiring_in, epoch};
use role_credentials::{
	auth::{Credentials, CredentialsParseError},
	clock::ManualClock,
	config::{self, ServiceConfig},
	context::{Context, ContextError},
	error::{Error, Phase, RetrieveError},
	provider::CUSTOM_FUNCTION_PROVIDER_SOURCE,
};

const VAULT_DOCUMENT: &str = r#"{
	"Version": 1,
	"AccessKeyId": "AKIDVAULT",
	"SecretAccessKey": "vault-secret",
	"SessionToken": "vault-token",
	"Expiration": "2025-01-01T01:00:00Z"
}"#;

#[tokio::test]
async fn vault_documents_flow_through_the_cache() {
	let clock = ManualClock::new(epoch());
	let base = ServiceConfig::new().with_clock(Arc::new(clock.clone()));
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();
	let config = config::custom_function_config(&Context::background(), &base, move |_ctx| {
		counter.fetch_add(1, Ordering::SeqCst);

		async { Credentials::from_json(VAULT_DOCUMENT, "vault") }
	})
	.await
	.expect("Custom function config should assemble.");
	let ctx = Context::background();

	assert_eq!(calls.load(Ordering::SeqCst), 0);

	let credentials = config.resolve_credentials(&ctx).await.expect("Vault document should parse.");

	assert_eq!(credentials.access_key_id, "AKIDVAULT");
	assert_eq!(credentials.source, "vault");
	assert_eq!(credentials.expires_at, Some(epoch() + Duration::hours(1)));

	clock.advance(Duration::minutes(54));
	config.resolve_credentials(&ctx).await.expect("Read before the window should hit.");

	assert_eq!(calls.load(Ordering::SeqCst), 1);

	clock.advance(Duration::minutes(1));
	config.resolve_credentials(&ctx).await.expect("Read at the window should refresh.");

	assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn source_failures_keep_their_cause() {
	let config =
		config::custom_function_config(&Context::background(), &ServiceConfig::new(), |_ctx| async {
			Credentials::from_json(r#"{"Version": 2}"#, "vault")
		})
		.await
		.expect("Custom function config should assemble.");
	let err = config
		.resolve_credentials(&Context::background())
		.await
		.expect_err("Incomplete document must fail.");

	assert_eq!(err.phase(), Phase::Retrieval);

	let Error::Retrieval { source } = err else {
		panic!("expected a retrieval error");
	};
	let RetrieveError::Source { source } = source.as_ref() else {
		panic!("expected a source error");
	};

	assert!(source.downcast_ref::<CredentialsParseError>().is_some());
}

#[tokio::test]
async fn context_errors_from_the_function_count_as_cancellation() {
	let config =
		config::custom_function_config(&Context::background(), &ServiceConfig::new(), |_ctx| async {
			Err::<Credentials, _>(ContextError::DeadlineExceeded)
		})
		.await
		.expect("Custom function config should assemble.");
	let err = config
		.resolve_credentials(&Context::background())
		.await
		.expect_err("Function deadline must fail.");

	assert_eq!(err.phase(), Phase::Cancellation);
	assert!(err.is_cancellation());
}

#[tokio::test]
async fn unlabelled_credentials_get_the_provider_source() {
	let clock = ManualClock::new(epoch());
	let fixture = credentials_expiring_in(&clock, "AKIDFIXTURE", Duration::hours(1));
	let config = config::custom_function_config(
		&Context::background(),
		&ServiceConfig::new().with_clock(Arc::new(clock)),
		move |_ctx| {
			let credentials = fixture.clone();

			async move { Ok::<_, std::convert::Infallible>(credentials) }
		},
	)
	.await
	.expect("Custom function config should assemble.");
	let credentials = config
		.resolve_credentials(&Context::background())
		.await
		.expect("Fixture credentials should resolve.");

	assert_eq!(credentials.source, CUSTOM_FUNCTION_PROVIDER_SOURCE);
	assert_eq!(config.credentials().map(|cache| cache.metrics().refreshes()), Some(1));
}
