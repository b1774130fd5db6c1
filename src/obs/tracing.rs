// self
use crate::{
	_prelude::*,
	graphql::OperationKind,
	obs::{PostMode, PostOutcome},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedPost<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedPost<F> = F;

/// A span builder used by the dispatcher.
#[derive(Clone, Debug)]
pub struct PostSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl PostSpan {
	/// Creates a span tagged with the operation kind and dispatch mode; `outcome` starts empty.
	pub fn new(kind: OperationKind, mode: PostMode) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"appsync_client.post",
				operation = kind.as_str(),
				mode = mode.as_str(),
				outcome = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, mode);

			Self {}
		}
	}

	/// Fills the span's `outcome` field and logs cancellations, which otherwise leave no trace.
	pub fn record_outcome(&self, outcome: PostOutcome) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());

			if outcome == PostOutcome::Cancelled {
				tracing::debug!(parent: &self.span, "GraphQL dispatch cancelled before it settled.");
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> PostSpanGuard {
		#[cfg(feature = "tracing")]
		{
			PostSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			PostSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedPost<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`PostSpan::entered`].
pub struct PostSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for PostSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("PostSpanGuard(..)")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn span_accepts_outcome_after_clone() {
		let span = PostSpan::new(OperationKind::Query, PostMode::Sync);
		let _guard = span.clone().entered();

		span.record_outcome(PostOutcome::Success);
		span.record_outcome(PostOutcome::Cancelled);
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = PostSpan::new(OperationKind::Subscription, PostMode::Async);
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
