//! Optional observability helpers for request dispatch.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `appsync_client.post` with the `operation`
//!   (query/mutation/subscription) and `mode` (sync/async/callback) fields.
//! - Enable `metrics` to increment the `appsync_client_post_total` counter for every
//!   attempt/success/failure/cancellation, labeled by `operation`, `mode`, and `outcome`.
//!
//! Every attempt is paired with exactly one terminal outcome through [`PostRecorder`], so
//! attempts always equal success + failure + cancelled once the dispatches drain.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, graphql::OperationKind};

/// How a request was dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PostMode {
	/// Blocking [`Client::post`](crate::client::Client::post).
	Sync,
	/// Future-returning [`Client::post_async`](crate::client::Client::post_async).
	Async,
	/// Callback-driven [`Client::post_with_callback`](crate::client::Client::post_with_callback).
	Callback,
}
impl PostMode {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			PostMode::Sync => "sync",
			PostMode::Async => "async",
			PostMode::Callback => "callback",
		}
	}
}
impl Display for PostMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PostOutcome {
	/// Entry to a dispatch method.
	Attempt,
	/// Response delivered.
	Success,
	/// Error delivered to the caller.
	Failure,
	/// Dispatch abandoned before it settled; nothing was delivered.
	Cancelled,
}
impl PostOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			PostOutcome::Attempt => "attempt",
			PostOutcome::Success => "success",
			PostOutcome::Failure => "failure",
			PostOutcome::Cancelled => "cancelled",
		}
	}

	/// Maps a dispatch result onto its outcome label.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => PostOutcome::Success,
			Err(_) => PostOutcome::Failure,
		}
	}
}
impl Display for PostOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Tracks one dispatch from its attempt to its terminal outcome.
///
/// Dropping the recorder before [`settle`](PostRecorder::settle) records
/// [`PostOutcome::Cancelled`]. Aborted dispatch tasks end this way.
#[derive(Debug)]
pub struct PostRecorder {
	kind: OperationKind,
	mode: PostMode,
	span: PostSpan,
	settled: bool,
}
impl PostRecorder {
	/// Records the attempt and opens the dispatch span.
	pub fn start(kind: OperationKind, mode: PostMode) -> Self {
		record_post_outcome(kind, mode, PostOutcome::Attempt);

		Self { kind, mode, span: PostSpan::new(kind, mode), settled: false }
	}

	/// Span covering the dispatch.
	pub fn span(&self) -> &PostSpan {
		&self.span
	}

	/// Records the terminal outcome.
	pub fn settle(mut self, outcome: PostOutcome) {
		self.settled = true;
		self.finish(outcome);
	}

	fn finish(&self, outcome: PostOutcome) {
		self.span.record_outcome(outcome);
		record_post_outcome(self.kind, self.mode, outcome);
	}
}
impl Drop for PostRecorder {
	fn drop(&mut self) {
		if !self.settled {
			self.finish(PostOutcome::Cancelled);
		}
	}
}
