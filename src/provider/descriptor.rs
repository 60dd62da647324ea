//! Provider descriptor data structures shared by the catalog, the route binder, and
//! handshake strategies.
//!
//! Descriptors are plain data: everything that distinguishes one provider from another
//! (verbs, extra routes, profile sources) is a field here so the shared control flow
//! never branches on provider names.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Handshake kinds and route verbs.
pub mod kind;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use kind::*;
pub use quirks::*;

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, ScopeList},
};

/// How the provider authenticates the gateway at its token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Where a strategy reads the subject identifier from once the provider trusts the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source")]
pub enum ProfileSource {
	/// Bearer-authenticated GET against [`ProviderEndpoints::profile`].
	Endpoint {
		/// JSON field holding the subject identifier.
		id_field: String,
	},
	/// Claims of the `id_token` returned by the token endpoint.
	IdToken {
		/// Claim holding the subject identifier.
		claim: String,
	},
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Consent page that Redirect-kind handshakes send the browser to.
	pub authorization: Option<Url>,
	/// Token endpoint used to exchange authorization codes.
	pub token: Option<Url>,
	/// Profile endpoint that resolves an access token into a subject.
	pub profile: Option<Url>,
}

/// Configuration keys that feed the client credentials of a provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialKeys {
	/// Key holding the OAuth client identifier.
	pub client_id: String,
	/// Key holding the OAuth client secret.
	pub client_secret: String,
}

/// Credential values resolved from configuration at activation time.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProviderCredentials {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret (or pre-signed client assertion).
	pub client_secret: String,
}
impl Debug for ProviderCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderCredentials")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.finish()
	}
}

/// Immutable provider descriptor, constructed once at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Unique key, also used as the route segment.
	pub id: ProviderId,
	/// Provider name sent to the identity service; flows of one provider share it.
	pub identity_provider: ProviderId,
	/// Handshake family the provider belongs to.
	pub kind: HandshakeKind,
	/// Configuration keys that must resolve to non-empty values before activation.
	pub required_config_keys: Vec<String>,
	/// Scopes requested during the handshake, in order.
	pub scope: ScopeList,
	/// Configuration keys passed to the strategy as client credentials.
	pub credentials: CredentialKeys,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Where the subject identifier comes from.
	pub profile_source: ProfileSource,
	/// Token endpoint client authentication.
	pub client_auth_method: ClientAuthMethod,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier and handshake kind.
	pub fn builder(id: ProviderId, kind: HandshakeKind) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id, kind)
	}

	/// Returns true when the provider mounts a completion route.
	pub fn mounts_callback(&self) -> bool {
		match self.kind {
			HandshakeKind::Redirect => true,
			HandshakeKind::Token => self.quirks.callback_route,
		}
	}
}
