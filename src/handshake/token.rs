// self
use crate::{
	_prelude::*,
	auth::VerifiedProfile,
	handshake::profile,
	http::GatewayHttpClient,
	provider::{
		HandshakeError, HandshakeFuture, HandshakeRequest, HandshakeStrategy, ProfileSource,
		ProviderDescriptor,
	},
};

/// Parameter carrying the client-held provider token.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Verifies a client-held access token against the provider's profile endpoint.
#[derive(Clone, Debug)]
pub struct BearerTokenStrategy {
	profile_endpoint: Url,
	id_field: String,
	http: GatewayHttpClient,
}
impl BearerTokenStrategy {
	/// Builds the strategy from an endpoint-sourced descriptor.
	pub fn new(descriptor: &ProviderDescriptor, http: GatewayHttpClient) -> Result<Self, HandshakeError> {
		let ProfileSource::Endpoint { id_field } = &descriptor.profile_source else {
			return Err(HandshakeError::Configuration {
				reason: "token handshakes read the profile endpoint".into(),
			});
		};
		let profile_endpoint = descriptor.endpoints.profile.clone().ok_or_else(|| {
			HandshakeError::Configuration { reason: "profile endpoint is not set".into() }
		})?;

		Ok(Self { profile_endpoint, id_field: id_field.clone(), http })
	}
}
impl HandshakeStrategy for BearerTokenStrategy {
	fn complete<'a>(
		&'a self,
		request: &'a HandshakeRequest,
	) -> HandshakeFuture<'a, VerifiedProfile> {
		Box::pin(async move {
			let token = request.require(ACCESS_TOKEN_PARAM)?;

			profile::fetch_profile(
				&self.http,
				&self.profile_endpoint,
				token,
				&self.id_field,
				&request.provider,
			)
			.await
		})
	}
}
