//! Profiles produced by successful handshakes.

// self
use crate::{
	_prelude::*,
	auth::{ExternalId, ProviderId},
};

/// Identity a handshake strategy vouched for.
///
/// Created per request and handed straight to the identity service; nothing keeps it
/// after the response has been written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedProfile {
	/// Subject identifier issued by the provider.
	pub external_id: ExternalId,
	/// Provider that verified the subject.
	pub provider: ProviderId,
	/// Provider-specific metadata (raw profile JSON, form fields, etc.).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub raw: Option<serde_json::Value>,
}
impl VerifiedProfile {
	/// Creates a profile without metadata.
	pub fn new(external_id: ExternalId, provider: ProviderId) -> Self {
		Self { external_id, provider, raw: None }
	}

	/// Attaches raw provider metadata.
	pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
		self.raw = Some(raw);

		self
	}
}
