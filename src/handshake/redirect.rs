// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
	EndpointSet, ExtraTokenFields, HttpClientError, PkceCodeVerifier, RedirectUrl,
	RequestTokenError, StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{ScopeList, VerifiedProfile},
	error::TransportError,
	handshake::profile,
	http::GatewayHttpClient,
	provider::{
		ClientAuthMethod, HandshakeError, HandshakeFuture, HandshakeRequest, HandshakeStart,
		HandshakeState, HandshakeStrategy, ProfileSource, ProviderCredentials, ProviderDescriptor,
		RouteMethod,
	},
};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;
const TOKEN_TARGET: &str = "provider token endpoint";

type IdTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;
type RedirectClient = Client<
	BasicErrorResponse,
	IdTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// Extra token-response fields read by the redirect strategy.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IdTokenFields {
	/// OpenID Connect ID token, when the provider issues one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
}
impl ExtraTokenFields for IdTokenFields {}

/// Authorization-code handshake through the provider's consent page.
pub struct OAuth2RedirectStrategy {
	descriptor: ProviderDescriptor,
	client: RedirectClient,
	http: GatewayHttpClient,
}
impl OAuth2RedirectStrategy {
	/// Builds the strategy; `callback` is the absolute URL of the completion route.
	pub fn new(
		descriptor: &ProviderDescriptor,
		credentials: ProviderCredentials,
		callback: &Url,
		http: GatewayHttpClient,
	) -> Result<Self, HandshakeError> {
		let missing = |endpoint: &str| HandshakeError::Configuration {
			reason: format!("{endpoint} endpoint is not set"),
		};
		let authorization = descriptor.endpoints.authorization.clone().ok_or_else(|| missing("authorization"))?;
		let token = descriptor.endpoints.token.clone().ok_or_else(|| missing("token"))?;

		if matches!(descriptor.profile_source, ProfileSource::Endpoint { .. })
			&& descriptor.endpoints.profile.is_none()
		{
			return Err(missing("profile"));
		}

		let mut client = Client::new(ClientId::new(credentials.client_id))
			.set_client_secret(ClientSecret::new(credentials.client_secret))
			.set_auth_uri(AuthUrl::from_url(authorization))
			.set_token_uri(TokenUrl::from_url(token))
			.set_redirect_uri(RedirectUrl::from_url(callback.clone()));

		if descriptor.client_auth_method == ClientAuthMethod::ClientSecretPost {
			client = client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { descriptor: descriptor.clone(), client, http })
	}

	fn requested_scope(&self, request: &HandshakeRequest) -> Result<ScopeList, HandshakeError> {
		let Some(raw) = request.param("scope") else {
			return Ok(self.descriptor.scope.clone());
		};
		let extra = raw
			.parse::<ScopeList>()
			.and_then(|extra| self.descriptor.scope.extended(extra.iter()))
			.map_err(|e| HandshakeError::Rejected { status: None, reason: e.to_string() })?;

		Ok(extra)
	}

	fn start(&self, request: &HandshakeRequest) -> Result<HandshakeStart, HandshakeError> {
		let quirks = &self.descriptor.quirks;
		let csrf = random_string(STATE_LEN);
		let pkce_verifier = quirks.pkce_required.then(|| random_string(PKCE_VERIFIER_LEN));
		let state_value = csrf.clone();
		let mut authorize = self.client.authorize_url(move || CsrfToken::new(state_value));

		if let Some(scope) = self.requested_scope(request)?.join(quirks.scope_delimiter) {
			authorize = authorize.add_extra_param("scope", scope);
		}
		if let Some(verifier) = &pkce_verifier {
			authorize = authorize
				.add_extra_param("code_challenge", compute_pkce_challenge(verifier))
				.add_extra_param("code_challenge_method", "S256");
		}
		if quirks.callback_method == RouteMethod::Post {
			authorize = authorize.add_extra_param("response_mode", "form_post");
		}

		let (location, _) = authorize.url();

		Ok(HandshakeStart { location, state: Some(HandshakeState { csrf, pkce_verifier }) })
	}

	fn check_callback<'r>(&self, request: &'r HandshakeRequest) -> Result<&'r str, HandshakeError> {
		if let Some(error) = request.param("error") {
			let reason = request.param("error_description").unwrap_or(error);

			return Err(HandshakeError::Denied { reason: reason.to_owned() });
		}

		let code = request.require("code")?;

		if self.descriptor.quirks.verify_state {
			let returned = request.require("state")?;
			let expected = request.state.as_ref().ok_or(HandshakeError::StateMismatch)?;

			if returned != expected.csrf {
				return Err(HandshakeError::StateMismatch);
			}
		}

		Ok(code)
	}

	async fn exchange(&self, request: &HandshakeRequest) -> Result<VerifiedProfile, HandshakeError> {
		let code = self.check_callback(request)?;
		let mut exchange = self.client.exchange_code(AuthorizationCode::new(code.to_owned()));

		if let Some(verifier) = request.state.as_ref().and_then(|state| state.pkce_verifier.as_ref()) {
			exchange = exchange.set_pkce_verifier(PkceCodeVerifier::new(verifier.clone()));
		}

		let response = exchange.request_async(&self.http).await.map_err(map_token_error)?;

		match &self.descriptor.profile_source {
			ProfileSource::Endpoint { id_field } => {
				let endpoint = self.descriptor.endpoints.profile.as_ref().ok_or_else(|| {
					HandshakeError::Configuration { reason: "profile endpoint is not set".into() }
				})?;

				profile::fetch_profile(
					&self.http,
					endpoint,
					response.access_token().secret(),
					id_field,
					&request.provider,
				)
				.await
			},
			ProfileSource::IdToken { claim } => {
				let id_token = response.extra_fields().id_token.as_deref().ok_or_else(|| {
					HandshakeError::Profile { reason: "token response carries no id_token".into() }
				})?;

				profile::profile_from(profile::id_token_claims(id_token)?, claim, &request.provider)
			},
		}
	}
}
impl Debug for OAuth2RedirectStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2RedirectStrategy").field("provider", &self.descriptor.id).finish()
	}
}
impl HandshakeStrategy for OAuth2RedirectStrategy {
	fn begin<'a>(&'a self, request: &'a HandshakeRequest) -> HandshakeFuture<'a, HandshakeStart> {
		Box::pin(async move { self.start(request) })
	}

	fn complete<'a>(
		&'a self,
		request: &'a HandshakeRequest,
	) -> HandshakeFuture<'a, VerifiedProfile> {
		Box::pin(self.exchange(request))
	}
}

fn map_token_error(
	err: RequestTokenError<HttpClientError<ReqwestError>, BasicErrorResponse>,
) -> HandshakeError {
	match err {
		RequestTokenError::ServerResponse(response) =>
			HandshakeError::Rejected { status: None, reason: response.to_string() },
		RequestTokenError::Request(HttpClientError::Reqwest(inner)) =>
			TransportError::from_reqwest(TOKEN_TARGET, *inner).into(),
		RequestTokenError::Request(HttpClientError::Io(inner)) => TransportError::Io(inner).into(),
		RequestTokenError::Request(other) =>
			HandshakeError::Rejected { status: None, reason: other.to_string() },
		RequestTokenError::Parse(source, _body) => HandshakeError::Rejected {
			status: None,
			reason: format!("token response is malformed at `{}`", source.path()),
		},
		RequestTokenError::Other(message) => HandshakeError::Rejected { status: None, reason: message },
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(hasher.finalize())
}
