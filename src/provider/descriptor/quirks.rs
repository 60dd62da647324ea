// self
use crate::{_prelude::*, provider::RouteMethod};

/// Provider-specific quirks that influence how routes are mounted and handshakes run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Verb of the Token-kind entry route. Redirect-kind entries are always GET.
	pub entry_method: RouteMethod,
	/// Verb of the completion route (POST for form-encoded callbacks).
	pub callback_method: RouteMethod,
	/// Token-kind providers that also mount `{prefix}/{name}/callback`.
	pub callback_route: bool,
	/// Mounts `{prefix}/{name}/token`, which replays a client token through the callback.
	pub bridge_route: bool,
	/// Hands the original request context (method, headers, raw params) to the strategy.
	pub pass_request_context: bool,
	/// Indicates whether PKCE must be supplied even for confidential clients.
	pub pkce_required: bool,
	/// Compares the returned `state` parameter against the handshake cookie.
	pub verify_state: bool,
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self {
			entry_method: RouteMethod::Get,
			callback_method: RouteMethod::Get,
			callback_route: false,
			bridge_route: false,
			pass_request_context: false,
			pkce_required: false,
			verify_state: true,
			scope_delimiter: ' ',
		}
	}
}
