//! Static table of the providers the gateway knows about.

// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	provider::{
		ClientAuthMethod, HandshakeKind, ProfileSource, ProviderDescriptor,
		ProviderDescriptorError, ProviderQuirks, RouteMethod,
	},
};

const FACEBOOK_AUTHORIZE: &str = "https://www.facebook.com/v19.0/dialog/oauth";
const FACEBOOK_TOKEN: &str = "https://graph.facebook.com/v19.0/oauth/access_token";
const FACEBOOK_PROFILE: &str = "https://graph.facebook.com/v19.0/me?fields=id,name";
const GOOGLE_AUTHORIZE: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_PROFILE: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const APPLE_AUTHORIZE: &str = "https://appleid.apple.com/auth/authorize";
const APPLE_TOKEN: &str = "https://appleid.apple.com/auth/token";

/// Read-only lookup table of provider descriptors keyed by name.
#[derive(Clone, Debug, Default)]
pub struct ProviderCatalog {
	descriptors: BTreeMap<ProviderId, ProviderDescriptor>,
}
impl ProviderCatalog {
	/// Builds a catalog from descriptors; later entries replace earlier ones with the same id.
	pub fn new<I>(descriptors: I) -> Self
	where
		I: IntoIterator<Item = ProviderDescriptor>,
	{
		Self {
			descriptors: descriptors
				.into_iter()
				.map(|descriptor| (descriptor.id.clone(), descriptor))
				.collect(),
		}
	}

	/// Catalog of the providers shipped with the gateway.
	pub fn builtin() -> Result<Self, ProviderDescriptorError> {
		Ok(Self::new([
			facebook()?,
			google()?,
			apple()?,
			facebook_token()?,
			google_token()?,
		]))
	}

	/// Resolves a descriptor by name.
	pub fn lookup(&self, name: &str) -> Option<&ProviderDescriptor> {
		self.descriptors.get(name)
	}

	/// Iterator over known provider names.
	pub fn names(&self) -> impl Iterator<Item = &ProviderId> {
		self.descriptors.keys()
	}

	/// Number of known providers.
	pub fn len(&self) -> usize {
		self.descriptors.len()
	}

	/// Returns true when the catalog is empty.
	pub fn is_empty(&self) -> bool {
		self.descriptors.is_empty()
	}
}

fn endpoint(raw: &str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(raw).map_err(|_| ProviderDescriptorError::InvalidEndpoint { url: raw.into() })
}

fn facebook() -> Result<ProviderDescriptor, ProviderDescriptorError> {
	ProviderDescriptor::builder(ProviderId::new("facebook")?, HandshakeKind::Redirect)
		.credential_keys("FACEBOOK_APP_ID", "FACEBOOK_APP_SECRET")
		.scopes(["email"])
		.authorization_endpoint(endpoint(FACEBOOK_AUTHORIZE)?)
		.token_endpoint(endpoint(FACEBOOK_TOKEN)?)
		.profile_endpoint(endpoint(FACEBOOK_PROFILE)?)
		.client_auth_method(ClientAuthMethod::ClientSecretPost)
		.quirks(ProviderQuirks { scope_delimiter: ',', ..ProviderQuirks::default() })
		.build()
}

fn google() -> Result<ProviderDescriptor, ProviderDescriptorError> {
	ProviderDescriptor::builder(ProviderId::new("google")?, HandshakeKind::Redirect)
		.credential_keys("GOOGLE_CONSUMER_KEY", "GOOGLE_CONSUMER_SECRET")
		.scopes(["openid", "profile", "email"])
		.authorization_endpoint(endpoint(GOOGLE_AUTHORIZE)?)
		.token_endpoint(endpoint(GOOGLE_TOKEN)?)
		.profile_endpoint(endpoint(GOOGLE_PROFILE)?)
		.profile_source(ProfileSource::Endpoint { id_field: "sub".into() })
		.quirks(ProviderQuirks { pkce_required: true, ..ProviderQuirks::default() })
		.build()
}

fn apple() -> Result<ProviderDescriptor, ProviderDescriptorError> {
	// Apple posts the callback cross-site, so the handshake cookie is not sent back.
	let quirks = ProviderQuirks {
		callback_method: RouteMethod::Post,
		bridge_route: true,
		pass_request_context: true,
		verify_state: false,
		..ProviderQuirks::default()
	};

	ProviderDescriptor::builder(ProviderId::new("apple")?, HandshakeKind::Redirect)
		.credential_keys("APPLE_SERVICE_ID", "APPLE_CLIENT_SECRET")
		.scopes(["name", "email"])
		.authorization_endpoint(endpoint(APPLE_AUTHORIZE)?)
		.token_endpoint(endpoint(APPLE_TOKEN)?)
		.profile_source(ProfileSource::IdToken { claim: "sub".into() })
		.client_auth_method(ClientAuthMethod::ClientSecretPost)
		.quirks(quirks)
		.build()
}

fn facebook_token() -> Result<ProviderDescriptor, ProviderDescriptorError> {
	ProviderDescriptor::builder(ProviderId::new("facebook-token")?, HandshakeKind::Token)
		.identity_provider(ProviderId::new("facebook")?)
		.credential_keys("FACEBOOK_APP_ID", "FACEBOOK_APP_SECRET")
		.profile_endpoint(endpoint(FACEBOOK_PROFILE)?)
		.build()
}

fn google_token() -> Result<ProviderDescriptor, ProviderDescriptorError> {
	ProviderDescriptor::builder(ProviderId::new("google-token")?, HandshakeKind::Token)
		.identity_provider(ProviderId::new("google")?)
		.credential_keys("GOOGLE_CONSUMER_KEY", "GOOGLE_CONSUMER_SECRET")
		.profile_endpoint(endpoint(GOOGLE_PROFILE)?)
		.profile_source(ProfileSource::Endpoint { id_field: "sub".into() })
		.quirks(ProviderQuirks { entry_method: RouteMethod::Post, ..ProviderQuirks::default() })
		.build()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn builtin_catalog_builds_and_resolves_by_name() {
		let catalog = ProviderCatalog::builtin().expect("Built-in descriptors should validate.");

		assert_eq!(catalog.len(), 5);
		assert!(catalog.lookup("twitter").is_none());

		let google = catalog.lookup("google-token").expect("google-token should be known.");

		assert_eq!(google.kind, HandshakeKind::Token);
		assert_eq!(google.quirks.entry_method, RouteMethod::Post);
		assert_eq!(google.required_config_keys, vec!["GOOGLE_CONSUMER_KEY", "GOOGLE_CONSUMER_SECRET"]);
	}

	#[test]
	fn provider_quirks_live_in_descriptors() {
		let catalog = ProviderCatalog::builtin().expect("Built-in descriptors should validate.");
		let apple = catalog.lookup("apple").expect("apple should be known.");

		assert_eq!(apple.quirks.callback_method, RouteMethod::Post);
		assert!(apple.quirks.bridge_route);
		assert!(apple.quirks.pass_request_context);
		assert!(matches!(apple.profile_source, ProfileSource::IdToken { .. }));

		let facebook = catalog.lookup("facebook").expect("facebook should be known.");

		assert_eq!(facebook.quirks.callback_method, RouteMethod::Get);
		assert_eq!(facebook.scope.join(facebook.quirks.scope_delimiter), Some("email".into()));
	}

	#[test]
	fn token_flows_share_the_identity_provider_of_their_redirect_flow() {
		let catalog = ProviderCatalog::builtin().expect("Built-in descriptors should validate.");

		for (token, redirect) in [("facebook-token", "facebook"), ("google-token", "google")] {
			let token = catalog.lookup(token).expect("Token flow should be known.");
			let redirect = catalog.lookup(redirect).expect("Redirect flow should be known.");

			assert_ne!(token.id, redirect.id);
			assert_eq!(token.identity_provider, redirect.identity_provider);
			assert_eq!(redirect.identity_provider, redirect.id);
		}
	}

	#[test]
	fn apple_trades_state_checks_for_cross_site_callbacks() {
		let catalog = ProviderCatalog::builtin().expect("Built-in descriptors should validate.");
		let apple = catalog.lookup("apple").expect("apple should be known.");

		assert!(!apple.quirks.verify_state);
		assert!(!apple.quirks.pkce_required);
		assert!(apple.quirks.bridge_route);

		let others = catalog
			.names()
			.filter_map(|name| catalog.lookup(name))
			.filter(|descriptor| matches!(descriptor.kind, HandshakeKind::Redirect))
			.filter(|descriptor| descriptor.id != apple.id);

		for descriptor in others {
			assert!(descriptor.quirks.verify_state, "{} should verify state.", descriptor.id);
		}
	}
}
