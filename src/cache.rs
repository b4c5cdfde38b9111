//! Credential cache with lazy refresh-on-read, an expiry safety window, and singleflight
//! de-duplication.
//!
//! [`CredentialsCache::get`] serves cached credentials until `expires_at - expiry_window`.
//! Past that instant the first caller starts a refresh on a detached tokio task that owns the
//! singleflight guard; every caller (the initiator included) then waits for the guard and reads
//! the outcome recorded for that attempt. Failures are shared as one `Arc`, nothing is retried
//! inside the cache, and a waiter that is cancelled or runs out of time leaves without
//! disturbing the attempt: the refresh itself runs under a background context.

mod metrics;

pub use metrics::CacheMetrics;

// crates.io
use async_lock::MutexGuardArc;
// self
use crate::{
	_prelude::*,
	auth::Credentials,
	clock::{SharedClock, SystemClock},
	context::Context,
	error::RetrieveError,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{ProvideCredentials, SharedCredentialsProvider},
};

/// Tuning knobs for [`CredentialsCache`].
#[derive(Clone, Debug)]
pub struct CacheOptions {
	/// Margin subtracted from the expiry instant; refresh starts once it is reached.
	pub expiry_window: Duration,
	/// Fraction (`0.0..=1.0`) of the window randomly shaved off per credential set, spreading
	/// refreshes of many caches that received credentials at the same time.
	pub expiry_window_jitter_frac: f64,
	/// Clock used for freshness checks.
	pub clock: SharedClock,
}
impl CacheOptions {
	/// Window applied when none is configured.
	pub const DEFAULT_EXPIRY_WINDOW: Duration = Duration::minutes(5);

	/// Overrides the expiry window; negative values are treated as zero.
	pub fn with_expiry_window(mut self, window: Duration) -> Self {
		self.expiry_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Overrides the jitter fraction, clamped to `0.0..=1.0`.
	pub fn with_expiry_window_jitter_frac(mut self, frac: f64) -> Self {
		self.expiry_window_jitter_frac = if frac.is_nan() { 0. } else { frac.clamp(0., 1.) };

		self
	}

	/// Overrides the clock.
	pub fn with_clock(mut self, clock: SharedClock) -> Self {
		self.clock = clock;

		self
	}

	fn effective_window(&self) -> Duration {
		if self.expiry_window_jitter_frac == 0. {
			return self.expiry_window;
		}

		let jitter = self.expiry_window.as_seconds_f64()
			* self.expiry_window_jitter_frac
			* rand::random::<f64>();

		self.expiry_window - Duration::seconds_f64(jitter)
	}
}
impl Default for CacheOptions {
	fn default() -> Self {
		Self {
			expiry_window: Self::DEFAULT_EXPIRY_WINDOW,
			expiry_window_jitter_frac: 0.,
			clock: Arc::new(SystemClock),
		}
	}
}

/// Concurrency-safe, auto-refreshing handle over a [`ProvideCredentials`] implementation.
///
/// Clones share the cached value, the singleflight guard, and the metrics.
#[derive(Clone)]
pub struct CredentialsCache {
	inner: Arc<CacheInner>,
}
impl CredentialsCache {
	/// Wraps `provider` with [`CacheOptions::default`].
	pub fn new(provider: impl 'static + ProvideCredentials) -> Self {
		Self::with_options(Arc::new(provider), CacheOptions::default())
	}

	/// Wraps a shared provider with explicit options.
	pub fn with_options(provider: SharedCredentialsProvider, options: CacheOptions) -> Self {
		Self {
			inner: Arc::new(CacheInner {
				provider,
				options,
				state: Default::default(),
				singleflight: Default::default(),
				metrics: Default::default(),
			}),
		}
	}

	/// Returns current credentials, refreshing them first when stale or absent.
	///
	/// Concurrent callers share a single provider call and observe its outcome, either the
	/// same credentials or the same [`Error::Retrieval`]. If `ctx` is cancelled or its deadline
	/// passes while waiting, this caller gets [`Error::Context`] and the shared refresh keeps
	/// running for everyone else, filling the cache when it completes.
	///
	/// # Panics
	///
	/// Refreshes run on [`tokio::spawn`], so a refresh must be started from within a tokio
	/// runtime.
	pub async fn get(&self, ctx: &Context) -> Result<Credentials> {
		if let Some(err) = ctx.err() {
			return Err(err.into());
		}

		let mut observed = {
			let state = self.inner.state.lock();

			if let Some(credentials) = state.fresh_at(self.inner.now()) {
				self.inner.metrics.record_hit();

				return Ok(credentials);
			}

			state.generation
		};

		loop {
			let guard = ctx.run(self.inner.singleflight.lock_arc()).await?;

			{
				let state = self.inner.state.lock();

				if state.generation != observed {
					// An attempt finished while this caller waited; its outcome is ours.
					if let Some(err) = state.last_failure.as_ref() {
						return Err(Error::Retrieval { source: err.clone() });
					}
					if let Some(cached) = state.current.as_ref() {
						return Ok(cached.credentials.clone());
					}
				} else if let Some(credentials) = state.fresh_at(self.inner.now()) {
					self.inner.metrics.record_hit();

					return Ok(credentials);
				}

				observed = state.generation;
			}

			self.inner.spawn_refresh(guard);
		}
	}

	/// Drops the cached credentials so the next [`get`](Self::get) refreshes.
	pub fn invalidate(&self) {
		self.inner.state.lock().current = None;
	}

	/// Returns the options the cache was built with.
	pub fn options(&self) -> &CacheOptions {
		&self.inner.options
	}

	/// Returns the cache counters.
	pub fn metrics(&self) -> &CacheMetrics {
		&self.inner.metrics
	}
}
impl Debug for CredentialsCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.inner.state.lock();

		f.debug_struct("CredentialsCache")
			.field("options", &self.inner.options)
			.field("cached", &state.current.is_some())
			.field("generation", &state.generation)
			.finish()
	}
}

struct CacheInner {
	provider: SharedCredentialsProvider,
	options: CacheOptions,
	state: Mutex<CacheState>,
	singleflight: Arc<AsyncMutex<()>>,
	metrics: CacheMetrics,
}
impl CacheInner {
	fn now(&self) -> OffsetDateTime {
		self.options.clock.now()
	}

	/// Runs one provider call on a detached task; the guard is released only after the outcome
	/// has been recorded.
	///
	/// The provider runs on its own task so a panic surfaces as a [`RetrieveError::Aborted`]
	/// outcome instead of releasing the guard with the generation unchanged.
	fn spawn_refresh(self: &Arc<Self>, guard: MutexGuardArc<()>) {
		const KIND: FlowKind = FlowKind::CacheRefresh;

		let inner = self.clone();
		let provider = self.provider.clone();
		let span = FlowSpan::new(KIND, "spawn_refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		inner.metrics.record_refresh();

		tokio::spawn(span.instrument(async move {
			let call = tokio::spawn(async move {
				provider.provide_credentials(Context::background()).await
			});
			let outcome = match call.await {
				Ok(outcome) => outcome,
				Err(source) => Err(RetrieveError::Aborted { source }),
			};

			inner.complete(outcome);

			drop(guard);
		}));
	}

	fn complete(&self, outcome: Result<Credentials, RetrieveError>) {
		let mut state = self.state.lock();

		state.generation = state.generation.wrapping_add(1);

		match outcome {
			Ok(credentials) => {
				// An expiry too close to the minimum instant to subtract from is already stale.
				let refresh_at = credentials.expires_at.map(|expires_at| {
					expires_at.checked_sub(self.options.effective_window()).unwrap_or(expires_at)
				});

				state.current = Some(CachedCredentials { credentials, refresh_at });
				state.last_failure = None;

				self.metrics.record_success();
				obs::record_flow_outcome(FlowKind::CacheRefresh, FlowOutcome::Success);
			},
			Err(err) => {
				state.last_failure = Some(Arc::new(err));

				self.metrics.record_failure();
				obs::record_flow_outcome(FlowKind::CacheRefresh, FlowOutcome::Failure);
			},
		}
	}
}

#[derive(Default)]
struct CacheState {
	current: Option<CachedCredentials>,
	/// Number of completed provider calls.
	generation: u64,
	/// Failure of the most recent call, cleared by the next success.
	last_failure: Option<Arc<RetrieveError>>,
}
impl CacheState {
	fn fresh_at(&self, now: OffsetDateTime) -> Option<Credentials> {
		self.current
			.as_ref()
			.filter(|cached| cached.refresh_at.is_none_or(|refresh_at| now < refresh_at))
			.map(|cached| cached.credentials.clone())
	}
}

struct CachedCredentials {
	credentials: Credentials,
	refresh_at: Option<OffsetDateTime>,
}
