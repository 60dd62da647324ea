//! Built-in handshake strategies.
//!
//! - [`OAuth2RedirectStrategy`] drives the authorization-code flow through the provider's
//!   consent page (state, optional PKCE, optional `form_post` callbacks).
//! - [`BearerTokenStrategy`] verifies a client-held access token against the provider's
//!   profile endpoint.
//!
//! [`BuiltinStrategies`] picks one from the descriptor's handshake kind; embedders that
//! speak other protocols plug in their own [`StrategyFactory`].

mod profile;
mod redirect;
mod token;

pub use redirect::*;
pub use token::*;

// self
use crate::{
	_prelude::*,
	http::GatewayHttpClient,
	provider::{
		HandshakeError, HandshakeKind, HandshakeStrategy, ProviderCredentials, ProviderDescriptor,
		StrategyFactory,
	},
};

/// Factory for the strategies shipped with the gateway.
#[derive(Clone, Debug)]
pub struct BuiltinStrategies {
	http: GatewayHttpClient,
}
impl BuiltinStrategies {
	/// Creates a factory whose strategies share `http`.
	pub fn new(http: GatewayHttpClient) -> Self {
		Self { http }
	}
}
impl StrategyFactory for BuiltinStrategies {
	fn build(
		&self,
		descriptor: &ProviderDescriptor,
		credentials: ProviderCredentials,
		callback: &Url,
	) -> Result<Arc<dyn HandshakeStrategy>, HandshakeError> {
		Ok(match descriptor.kind {
			HandshakeKind::Redirect => Arc::new(OAuth2RedirectStrategy::new(
				descriptor,
				credentials,
				callback,
				self.http.clone(),
			)?),
			HandshakeKind::Token => Arc::new(BearerTokenStrategy::new(descriptor, self.http.clone())?),
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::provider::ProviderCatalog;

	#[test]
	fn every_builtin_descriptor_gets_a_strategy() {
		let catalog = ProviderCatalog::builtin().expect("Built-in descriptors should validate.");
		let factory = BuiltinStrategies::new(
			GatewayHttpClient::new(Duration::from_secs(1)).expect("Client should build."),
		);
		let callback =
			Url::parse("https://login.example.com/auth/x/callback").expect("Callback should parse.");

		for name in catalog.names() {
			let descriptor = catalog.lookup(name).expect("Listed names should resolve.");
			let credentials =
				ProviderCredentials { client_id: "id".into(), client_secret: "secret".into() };

			assert!(
				factory.build(descriptor, credentials, &callback).is_ok(),
				"{name} should get a strategy."
			);
		}
	}
}
