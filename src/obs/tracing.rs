// crates.io
use tracing::{Instrument, instrument::Instrumented};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	obs::{CorrelationId, HandshakeStage},
};

const DEFAULT_FILTER: &str = "oauth_connector=info,tower_http=info";

/// Installs the global subscriber (`RUST_LOG` overrides the default filter).
///
/// Returns false when a subscriber was already installed.
pub fn init_subscriber() -> bool {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

	tracing_subscriber::registry().with(filter).with(tracing_subscriber::fmt::layer()).try_init().is_ok()
}

/// A span builder used by handshake routes.
#[derive(Clone, Debug)]
pub struct HandshakeSpan {
	span: tracing::Span,
}
impl HandshakeSpan {
	/// Creates a new span tagged with the provider, stage, and correlation id.
	pub fn new(provider: &ProviderId, stage: HandshakeStage, correlation: &CorrelationId) -> Self {
		let span = tracing::info_span!(
			"oauth_connector.handshake",
			provider = provider.as_ref(),
			stage = stage.as_str(),
			correlation_id = correlation.as_str(),
		);

		Self { span }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}
