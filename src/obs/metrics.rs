// self
use crate::{auth::ProviderId, obs::CompletionOutcome};

/// Records a completion outcome via the global metrics recorder (when enabled).
pub fn record_completion(provider: &ProviderId, outcome: CompletionOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth_connector_handshake_total",
			"provider" => provider.to_string(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (provider, outcome);
	}
}
