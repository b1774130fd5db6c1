// self
use crate::{
	graphql::OperationKind,
	obs::{PostMode, PostOutcome},
};

/// Counter incremented once per attempt and once per terminal outcome.
pub const POST_COUNTER: &str = "appsync_client_post_total";

/// Records a dispatch outcome via the global metrics recorder (when enabled).
pub fn record_post_outcome(kind: OperationKind, mode: PostMode, outcome: PostOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			POST_COUNTER,
			"operation" => kind.as_str(),
			"mode" => mode.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, mode, outcome);
	}
}
