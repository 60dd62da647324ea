#![allow(dead_code)]

// std
use std::{sync::Arc, time::Duration};
// crates.io
use axum::{
	Router,
	body::Body,
	http::{Request, Response, header::SET_COOKIE},
};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;
// self
use oauth_connector::{
	auth::{ExternalId, VerifiedProfile},
	config::Env,
	identity::{IdentityFuture, IdentityOutcome, IdentityService},
	obs::CorrelationId,
	provider::{
		HandshakeError, HandshakeFuture, HandshakeRequest, HandshakeStart, HandshakeState,
		HandshakeStrategy, ProviderCredentials, ProviderDescriptor, RequestContext,
		StrategyFactory,
	},
};

pub const CONSENT_URL: &str = "https://consent.example.com/authorize";
pub const SYNTHETIC_STATE: &str = "synthetic-state";

/// Environment with the identity service keys and credentials for every built-in provider.
pub fn env(providers: &str) -> Env {
	Env::from_pairs([
		("PROVIDERS", providers),
		("GLS_REGISTRATION_CONNECT", "http://127.0.0.1:9/rpc"),
		("GLS_OAUTH_SECURE_KEY", "secure-key-it"),
		("FACEBOOK_APP_ID", "fb-id"),
		("FACEBOOK_APP_SECRET", "fb-secret"),
		("GOOGLE_CONSUMER_KEY", "google-id"),
		("GOOGLE_CONSUMER_SECRET", "google-secret"),
		("APPLE_SERVICE_ID", "apple-id"),
		("APPLE_CLIENT_SECRET", "apple-secret"),
	])
}

/// Strategy factory whose strategies trust the `external_id` parameter.
#[derive(Debug, Default)]
pub struct SyntheticStrategies;
impl StrategyFactory for SyntheticStrategies {
	fn build(
		&self,
		_: &ProviderDescriptor,
		_: ProviderCredentials,
		callback: &Url,
	) -> Result<Arc<dyn HandshakeStrategy>, HandshakeError> {
		Ok(Arc::new(SyntheticStrategy { callback: callback.clone() }))
	}
}

/// Strategy that reports whatever subject the request names.
#[derive(Debug)]
pub struct SyntheticStrategy {
	pub callback: Url,
}
impl HandshakeStrategy for SyntheticStrategy {
	fn begin<'a>(&'a self, _: &'a HandshakeRequest) -> HandshakeFuture<'a, HandshakeStart> {
		Box::pin(async move {
			let mut location = Url::parse(CONSENT_URL).expect("Consent URL should parse.");

			location
				.query_pairs_mut()
				.append_pair("redirect_uri", self.callback.as_str())
				.append_pair("state", SYNTHETIC_STATE);

			Ok(HandshakeStart {
				location,
				state: Some(HandshakeState { csrf: SYNTHETIC_STATE.into(), pkce_verifier: None }),
			})
		})
	}

	fn complete<'a>(
		&'a self,
		request: &'a HandshakeRequest,
	) -> HandshakeFuture<'a, VerifiedProfile> {
		Box::pin(async move {
			if let Some(reason) = request.param("error") {
				return Err(HandshakeError::Denied { reason: reason.to_owned() });
			}

			let external_id = ExternalId::new(request.require("external_id")?)
				.map_err(|e| HandshakeError::Profile { reason: e.to_string() })?;

			Ok(VerifiedProfile::new(external_id, request.provider.clone()))
		})
	}
}

/// `(provider, context)` pairs handed to capturing strategies.
pub type CapturedContexts = Arc<Mutex<Vec<(String, Option<RequestContext>)>>>;

/// Synthetic strategy factory that also records the request context of every completion.
#[derive(Debug, Default)]
pub struct CapturingStrategies {
	pub contexts: CapturedContexts,
}
impl CapturingStrategies {
	pub fn contexts(&self) -> Vec<(String, Option<RequestContext>)> {
		self.contexts.lock().clone()
	}
}
impl StrategyFactory for CapturingStrategies {
	fn build(
		&self,
		_: &ProviderDescriptor,
		_: ProviderCredentials,
		callback: &Url,
	) -> Result<Arc<dyn HandshakeStrategy>, HandshakeError> {
		Ok(Arc::new(CapturingStrategy {
			inner: SyntheticStrategy { callback: callback.clone() },
			contexts: self.contexts.clone(),
		}))
	}
}

#[derive(Debug)]
struct CapturingStrategy {
	inner: SyntheticStrategy,
	contexts: CapturedContexts,
}
impl HandshakeStrategy for CapturingStrategy {
	fn begin<'a>(&'a self, request: &'a HandshakeRequest) -> HandshakeFuture<'a, HandshakeStart> {
		self.inner.begin(request)
	}

	fn complete<'a>(
		&'a self,
		request: &'a HandshakeRequest,
	) -> HandshakeFuture<'a, VerifiedProfile> {
		self.contexts.lock().push((request.provider.to_string(), request.context.clone()));

		self.inner.complete(request)
	}
}

type Responder = Box<dyn Fn(&VerifiedProfile) -> IdentityOutcome + Send + Sync>;

/// Identity service that records every call and answers through a closure.
pub struct RecordingIdentity {
	calls: Mutex<Vec<(String, String)>>,
	delay: Option<Duration>,
	respond: Responder,
}
impl RecordingIdentity {
	pub fn new(respond: impl Fn(&VerifiedProfile) -> IdentityOutcome + Send + Sync + 'static) -> Self {
		Self { calls: Mutex::new(Vec::new()), delay: None, respond: Box::new(respond) }
	}

	/// Echoes `{provider}.{external_id}` back as the identity token.
	pub fn echo() -> Self {
		Self::new(|profile| IdentityOutcome::Success {
			identity_token: format!("{}.{}", profile.provider, profile.external_id),
			provider: profile.provider.to_string(),
		})
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);

		self
	}

	/// `(external_id, provider)` pairs seen so far.
	pub fn calls(&self) -> Vec<(String, String)> {
		self.calls.lock().clone()
	}
}
impl IdentityService for RecordingIdentity {
	fn create_identity<'a>(
		&'a self,
		profile: &'a VerifiedProfile,
		_: &'a CorrelationId,
	) -> IdentityFuture<'a> {
		Box::pin(async move {
			self.calls.lock().push((profile.external_id.to_string(), profile.provider.to_string()));

			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}

			(self.respond)(profile)
		})
	}
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
	router.clone().oneshot(request).await.expect("Router should be infallible.")
}

pub fn get(uri: &str) -> Request<Body> {
	Request::get(uri).body(Body::empty()).expect("GET fixture should build.")
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
	Request::post(uri)
		.header("content-type", "application/x-www-form-urlencoded")
		.body(Body::from(body.to_owned()))
		.expect("POST fixture should build.")
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
	response
		.headers()
		.get_all(SET_COOKIE)
		.iter()
		.map(|value| value.to_str().expect("Cookie header should be ASCII.").to_owned())
		.collect()
}

/// Value of the first `Set-Cookie` header named `name`.
pub fn cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
	set_cookies(response).into_iter().find_map(|raw| {
		let pair = raw.split(';').next()?;
		let (key, value) = pair.split_once('=')?;

		(key == name).then(|| value.to_owned())
	})
}

pub async fn body_json(response: Response<Body>) -> Value {
	let bytes =
		response.into_body().collect().await.expect("Body should be readable.").to_bytes();

	serde_json::from_slice(&bytes).expect("Body should be JSON.")
}

