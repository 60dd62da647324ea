//! Observability helpers for handshake requests.
//!
//! # Feature Flags
//!
//! - Spans named `oauth_connector.handshake` are always emitted through `tracing`, carrying the
//!   `provider`, `stage`, and `correlation_id` fields.
//! - Enable `metrics` to increment the `oauth_connector_handshake_total` counter for every
//!   completion, labeled by `provider` + `outcome`.

mod correlation;
mod metrics;
mod tracing;

pub use correlation::*;
pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Request stages observed by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandshakeStage {
	/// Redirect-kind entry route.
	Begin,
	/// Redirect-kind completion route.
	Complete,
	/// Token-kind exchange route.
	Token,
	/// Bridging route replaying a token through the completion route.
	Bridge,
}
impl HandshakeStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			HandshakeStage::Begin => "begin",
			HandshakeStage::Complete => "complete",
			HandshakeStage::Token => "token",
			HandshakeStage::Bridge => "bridge",
		}
	}
}
impl Display for HandshakeStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompletionOutcome {
	/// The strategy failed or the user declined.
	HandshakeFailed,
	/// Identity created or resolved.
	Success,
	/// User must finish registration.
	PendingRegistration,
	/// External account already linked.
	AlreadyRegistered,
	/// Identity service failed or rejected the call.
	Error,
}
impl CompletionOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CompletionOutcome::HandshakeFailed => "handshake_failed",
			CompletionOutcome::Success => "success",
			CompletionOutcome::PendingRegistration => "pending_registration",
			CompletionOutcome::AlreadyRegistered => "already_registered",
			CompletionOutcome::Error => "error",
		}
	}
}
impl Display for CompletionOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
