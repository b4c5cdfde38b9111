//! Wall-clock sources used for expiry decisions.

// self
use crate::_prelude::*;

/// Shared clock handle stored in configurations and caches.
pub type SharedClock = Arc<dyn Clock>;

/// Source of "now" for expiry and refresh-window checks.
pub trait Clock
where
	Self: Debug + Send + Sync,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Clock backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven clock for simulations and tests.
///
/// Clones share the same instant, so advancing one handle advances every cache that holds it.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self(Arc::new(Mutex::new(start)))
	}

	/// Moves the clock forward (or backward for negative durations).
	pub fn advance(&self, delta: Duration) {
		*self.0.lock() += delta;
	}

	/// Jumps to an absolute instant.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn manual_clock_clones_share_time() {
		let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
		let shared: SharedClock = Arc::new(clock.clone());

		clock.advance(Duration::minutes(16));

		assert_eq!(shared.now(), macros::datetime!(2025-01-01 00:16 UTC));

		clock.set(macros::datetime!(2025-06-01 12:00 UTC));

		assert_eq!(shared.now(), macros::datetime!(2025-06-01 12:00 UTC));
	}
}
