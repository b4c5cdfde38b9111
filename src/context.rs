//! Cancellation and deadline propagation for credential retrieval.
//!
//! [`Context`] pairs a [`CancellationToken`] with an optional deadline. Every operation that may
//! suspend (identity verification, cache waits, provider calls) races against
//! [`Context::done`] so callers can distinguish "the service rejected us" from "we gave up
//! waiting".

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
// self
use crate::_prelude::*;

/// Reason a [`Context`] is done.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ThisError)]
pub enum ContextError {
	/// The context was cancelled explicitly.
	#[error("Operation was cancelled.")]
	Cancelled,
	/// The context deadline elapsed.
	#[error("Operation deadline exceeded.")]
	DeadlineExceeded,
}

/// Cancellation token plus optional deadline, cheap to clone and pass by value.
#[derive(Clone, Debug, Default)]
pub struct Context {
	token: CancellationToken,
	deadline: Option<Instant>,
}
impl Context {
	/// Creates a context that is never cancelled and has no deadline.
	pub fn background() -> Self {
		Self::default()
	}

	/// Creates a context driven by an existing cancellation token.
	pub fn with_cancellation(token: CancellationToken) -> Self {
		Self { token, deadline: None }
	}

	/// Returns a copy whose deadline is `timeout` from now, or the current deadline if sooner.
	///
	/// A timeout too large to represent as an instant adds no deadline.
	pub fn with_timeout(&self, timeout: StdDuration) -> Self {
		match Instant::now().checked_add(timeout) {
			Some(deadline) => self.with_deadline(deadline),
			None => self.clone(),
		}
	}

	/// Returns a copy bounded by `deadline`, or the current deadline if sooner.
	pub fn with_deadline(&self, deadline: Instant) -> Self {
		let deadline = match self.deadline {
			Some(current) if current <= deadline => current,
			_ => deadline,
		};

		Self { token: self.token.clone(), deadline: Some(deadline) }
	}

	/// Returns a child context cancelled together with this one but cancellable on its own.
	pub fn child(&self) -> Self {
		Self { token: self.token.child_token(), deadline: self.deadline }
	}

	/// Cancels this context and every child derived from it.
	pub fn cancel(&self) {
		self.token.cancel();
	}

	/// Returns the underlying cancellation token.
	pub fn cancellation_token(&self) -> &CancellationToken {
		&self.token
	}

	/// Returns the deadline, if any.
	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	/// Returns the reason the context is done, or `None` while it is still live.
	pub fn err(&self) -> Option<ContextError> {
		if self.token.is_cancelled() {
			Some(ContextError::Cancelled)
		} else if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
			Some(ContextError::DeadlineExceeded)
		} else {
			None
		}
	}

	/// Resolves once the context is cancelled or its deadline elapses.
	pub async fn done(&self) -> ContextError {
		match self.deadline {
			Some(deadline) => tokio::select! {
				_ = self.token.cancelled() => ContextError::Cancelled,
				_ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
			},
			None => {
				self.token.cancelled().await;

				ContextError::Cancelled
			},
		}
	}

	/// Drives `fut` until it completes or the context is done, whichever happens first.
	pub async fn run<F>(&self, fut: F) -> Result<F::Output, ContextError>
	where
		F: Future,
	{
		if let Some(err) = self.err() {
			return Err(err);
		}

		tokio::select! {
			biased;
			err = self.done() => Err(err),
			output = fut => Ok(output),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn run_returns_output_while_live() {
		let ctx = Context::background();

		assert_eq!(ctx.run(async { 7 }).await, Ok(7));
		assert_eq!(ctx.err(), None);
	}

	#[tokio::test]
	async fn cancelled_context_short_circuits() {
		let ctx = Context::background();

		ctx.cancel();

		assert_eq!(ctx.err(), Some(ContextError::Cancelled));
		assert_eq!(ctx.run(async { 7 }).await, Err(ContextError::Cancelled));
	}

	#[tokio::test(start_paused = true)]
	async fn deadline_interrupts_pending_future() {
		let ctx = Context::background().with_timeout(StdDuration::from_secs(1));
		let result = ctx.run(std::future::pending::<()>()).await;

		assert_eq!(result, Err(ContextError::DeadlineExceeded));
		assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
	}

	#[test]
	fn children_follow_parents_but_not_the_reverse() {
		let parent = Context::background();
		let child = parent.child();
		let sibling = parent.child();

		child.cancel();

		assert_eq!(parent.err(), None);
		assert_eq!(sibling.err(), None);

		parent.cancel();

		assert_eq!(sibling.err(), Some(ContextError::Cancelled));
	}

	#[tokio::test]
	async fn unrepresentable_timeouts_add_no_deadline() {
		let ctx = Context::background().with_timeout(StdDuration::MAX);

		assert_eq!(ctx.deadline(), None);
		assert_eq!(ctx.err(), None);

		let bounded = Context::background().with_timeout(StdDuration::from_secs(5));

		assert_eq!(bounded.with_timeout(StdDuration::MAX).deadline(), bounded.deadline());
	}

	#[tokio::test(start_paused = true)]
	async fn tighter_deadline_wins() {
		let outer = Context::background().with_timeout(StdDuration::from_secs(5));
		let inner = outer.with_timeout(StdDuration::from_secs(60));

		assert_eq!(inner.deadline(), outer.deadline());
	}
}
