//! Normalizes completed handshakes into one identity call and one client response.

// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{Map, Value, json};
// self
use crate::{
	_prelude::*,
	auth::{ProviderId, VerifiedProfile},
	config::GatewayConfig,
	identity::{IdentityOutcome, IdentityService},
	obs::{self, CompletionOutcome, CorrelationId},
	provider::HandshakeError,
};

/// Cookie value recorded when the external account is already linked.
pub const REGISTERED_STATE: &str = "registered";

/// Names of the cookies written by Redirect-kind completions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieNames {
	/// Registration state cookie.
	pub state: String,
	/// Identity token cookie.
	pub identity: String,
	/// Provider name cookie.
	pub provider: String,
}
impl CookieNames {
	/// Derives the cookie names from a prefix.
	pub fn with_prefix(prefix: &str) -> Self {
		Self {
			state: format!("{prefix}_error"),
			identity: format!("{prefix}_identity"),
			provider: format!("{prefix}_provider"),
		}
	}
}

/// Resolved result of one completion, before it is rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
	/// The strategy failed; the identity service was not called.
	HandshakeFailed,
	/// The identity service answered (or failed) for this provider.
	Resolved {
		/// Provider the handshake ran against.
		provider: ProviderId,
		/// Identity outcome.
		outcome: IdentityOutcome,
	},
}
impl Completion {
	/// Metric label of this completion.
	pub fn label(&self) -> CompletionOutcome {
		match self {
			Completion::HandshakeFailed => CompletionOutcome::HandshakeFailed,
			Completion::Resolved { outcome, .. } => match outcome {
				IdentityOutcome::Success { .. } => CompletionOutcome::Success,
				IdentityOutcome::PendingRegistration { .. } => CompletionOutcome::PendingRegistration,
				IdentityOutcome::AlreadyRegistered => CompletionOutcome::AlreadyRegistered,
				IdentityOutcome::Error { .. } => CompletionOutcome::Error,
			},
		}
	}
}

/// Turns handshake results into identity calls and client responses.
#[derive(Clone)]
pub struct HandshakeCompletionHandler {
	identity: Arc<dyn IdentityService>,
	cookies: CookieNames,
	app_root: String,
	failure_redirect: String,
}
impl HandshakeCompletionHandler {
	/// Creates a handler using the configured cookie prefix and redirect targets.
	pub fn new(identity: Arc<dyn IdentityService>, config: &GatewayConfig) -> Self {
		Self {
			identity,
			cookies: CookieNames::with_prefix(&config.cookie_prefix),
			app_root: config.app_root.clone(),
			failure_redirect: config.failure_redirect.clone(),
		}
	}

	/// Cookie names written by Redirect-kind responses.
	pub fn cookie_names(&self) -> &CookieNames {
		&self.cookies
	}

	/// Calls the identity service once for a verified profile; failures skip the call.
	pub async fn resolve(
		&self,
		provider: &ProviderId,
		handshake: Result<VerifiedProfile, HandshakeError>,
		correlation: &CorrelationId,
	) -> Completion {
		let completion = match handshake {
			Ok(profile) => {
				let outcome = match self.identity.create_identity(&profile, correlation).await {
					IdentityOutcome::Success { identity_token, provider } if provider.is_empty() =>
						IdentityOutcome::Success {
							identity_token,
							provider: profile.provider.to_string(),
						},
					outcome => outcome,
				};

				Completion::Resolved { provider: profile.provider, outcome }
			},
			Err(e) => {
				tracing::warn!(
					correlation_id = %correlation,
					provider = %provider,
					error = %e,
					"Handshake failed."
				);

				Completion::HandshakeFailed
			},
		};
		let label = completion.label();

		obs::record_completion(provider, label);

		match &completion {
			Completion::Resolved { outcome: IdentityOutcome::Error { message }, .. } => {
				tracing::error!(
					correlation_id = %correlation,
					provider = %provider,
					message = %message,
					"Identity service rejected the identity."
				);
			},
			_ => {
				tracing::info!(
					correlation_id = %correlation,
					provider = %provider,
					outcome = label.as_str(),
					"Handshake completed."
				);
			},
		}

		completion
	}

	/// Completes a Redirect-kind handshake: cookies plus a redirect.
	pub async fn redirect(
		&self,
		jar: CookieJar,
		provider: &ProviderId,
		handshake: Result<VerifiedProfile, HandshakeError>,
		correlation: &CorrelationId,
	) -> Response {
		let completion = self.resolve(provider, handshake, correlation).await;

		self.render_redirect(jar, completion)
	}

	/// Completes a Token-kind handshake: a JSON body.
	pub async fn token(
		&self,
		provider: &ProviderId,
		handshake: Result<VerifiedProfile, HandshakeError>,
		correlation: &CorrelationId,
	) -> Response {
		let completion = self.resolve(provider, handshake, correlation).await;

		render_token(completion)
	}

	/// Renders a completion as cookies plus a redirect.
	pub fn render_redirect(&self, jar: CookieJar, completion: Completion) -> Response {
		let outcome = match completion {
			Completion::HandshakeFailed =>
				return (jar, Redirect::to(&self.failure_redirect)).into_response(),
			Completion::Resolved { outcome, .. } => outcome,
		};
		let jar = match outcome {
			IdentityOutcome::Success { identity_token, provider } => jar
				.add(self.cookie(&self.cookies.identity, identity_token))
				.add(self.cookie(&self.cookies.provider, provider)),
			IdentityOutcome::PendingRegistration { state, identity, provider } => {
				let mut jar = jar.add(self.cookie(&self.cookies.state, state));

				if let Some(identity) = identity {
					jar = jar.add(self.cookie(&self.cookies.identity, identity));
				}
				if let Some(provider) = provider {
					jar = jar.add(self.cookie(&self.cookies.provider, provider));
				}

				jar
			},
			IdentityOutcome::AlreadyRegistered =>
				jar.add(self.cookie(&self.cookies.state, REGISTERED_STATE.to_owned())),
			IdentityOutcome::Error { .. } =>
				return (jar, Redirect::to(&self.failure_redirect)).into_response(),
		};

		(jar, Redirect::to(&self.app_root)).into_response()
	}

	fn cookie(&self, name: &str, value: String) -> Cookie<'static> {
		Cookie::build((name.to_owned(), value)).path("/").build()
	}
}
impl Debug for HandshakeCompletionHandler {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HandshakeCompletionHandler")
			.field("cookies", &self.cookies)
			.field("app_root", &self.app_root)
			.field("failure_redirect", &self.failure_redirect)
			.finish()
	}
}

/// Renders a completion as the Token-kind JSON body.
pub fn render_token(completion: Completion) -> Response {
	let outcome = match completion {
		Completion::HandshakeFailed =>
			return (StatusCode::UNAUTHORIZED, Json(json!({ "status": "false" }))).into_response(),
		Completion::Resolved { outcome, .. } => outcome,
	};
	let mut body = Map::new();

	match outcome {
		IdentityOutcome::Success { identity_token, provider } => {
			body.insert("identity".into(), Value::String(identity_token));
			body.insert("provider".into(), Value::String(provider));
		},
		IdentityOutcome::PendingRegistration { state, identity, provider } => {
			body.insert("oauthState".into(), Value::String(state));

			if let Some(identity) = identity {
				body.insert("identity".into(), Value::String(identity));
			}
			if let Some(provider) = provider {
				body.insert("provider".into(), Value::String(provider));
			}
		},
		IdentityOutcome::AlreadyRegistered => {
			body.insert("oauthState".into(), Value::String(REGISTERED_STATE.into()));
		},
		IdentityOutcome::Error { message } =>
			return (
				StatusCode::UNAUTHORIZED,
				Json(json!({ "status": "false", "error": message })),
			)
				.into_response(),
	}

	Json(Value::Object(body)).into_response()
}

#[cfg(test)]
mod tests {
	// crates.io
	use axum::http::header::{LOCATION, SET_COOKIE};
	use http_body_util::BodyExt;
	// self
	use super::*;
	use crate::{auth::ExternalId, identity::IdentityFuture};

	struct Fixed(IdentityOutcome);
	impl IdentityService for Fixed {
		fn create_identity<'a>(
			&'a self,
			_: &'a VerifiedProfile,
			_: &'a CorrelationId,
		) -> IdentityFuture<'a> {
			let outcome = self.0.clone();

			Box::pin(async move { outcome })
		}
	}

	fn handler(outcome: IdentityOutcome) -> HandshakeCompletionHandler {
		HandshakeCompletionHandler {
			identity: Arc::new(Fixed(outcome)),
			cookies: CookieNames::with_prefix("commun_oauth"),
			app_root: "/".into(),
			failure_redirect: "/oauth/failure".into(),
		}
	}

	fn profile() -> (ProviderId, VerifiedProfile) {
		let provider = ProviderId::new("facebook").expect("Fixture provider should be valid.");
		let external = ExternalId::new("10001").expect("Fixture subject should be valid.");

		(provider.clone(), VerifiedProfile::new(external, provider))
	}

	fn set_cookies(response: &Response) -> Vec<String> {
		response
			.headers()
			.get_all(SET_COOKIE)
			.iter()
			.map(|v| v.to_str().expect("Cookie header should be ASCII.").to_owned())
			.collect()
	}

	async fn json_body(response: Response) -> Value {
		let bytes = response
			.into_body()
			.collect()
			.await
			.expect("Body should be readable.")
			.to_bytes();

		serde_json::from_slice(&bytes).expect("Body should be JSON.")
	}

	#[tokio::test]
	async fn already_registered_sets_the_registered_state_cookie() {
		let (provider, profile) = profile();
		let response = handler(IdentityOutcome::AlreadyRegistered)
			.redirect(CookieJar::new(), &provider, Ok(profile), &CorrelationId::missing())
			.await;

		assert_eq!(response.status(), StatusCode::SEE_OTHER);
		assert_eq!(response.headers()[LOCATION], "/");
		assert_eq!(set_cookies(&response), vec!["commun_oauth_error=registered; Path=/"]);
	}

	#[tokio::test]
	async fn success_sets_identity_and_provider_cookies() {
		let (provider, profile) = profile();
		let outcome =
			IdentityOutcome::Success { identity_token: "tok".into(), provider: "facebook".into() };
		let response = handler(outcome)
			.redirect(CookieJar::new(), &provider, Ok(profile), &CorrelationId::missing())
			.await;
		let cookies = set_cookies(&response);

		assert_eq!(cookies.len(), 2);
		assert!(cookies.contains(&"commun_oauth_identity=tok; Path=/".to_owned()));
		assert!(cookies.contains(&"commun_oauth_provider=facebook; Path=/".to_owned()));
	}

	#[tokio::test]
	async fn success_without_a_provider_reports_the_verified_provider() {
		let (provider, profile) = profile();
		let outcome = IdentityOutcome::Success { identity_token: "tok".into(), provider: String::new() };
		let completion = handler(outcome.clone())
			.resolve(&provider, Ok(profile.clone()), &CorrelationId::missing())
			.await;

		assert_eq!(
			completion,
			Completion::Resolved {
				provider: provider.clone(),
				outcome: IdentityOutcome::Success {
					identity_token: "tok".into(),
					provider: "facebook".into(),
				},
			}
		);

		let response =
			handler(outcome.clone()).token(&provider, Ok(profile.clone()), &CorrelationId::missing()).await;

		assert_eq!(json_body(response).await, json!({ "identity": "tok", "provider": "facebook" }));

		let response = handler(outcome)
			.redirect(CookieJar::new(), &provider, Ok(profile), &CorrelationId::missing())
			.await;

		assert!(set_cookies(&response).contains(&"commun_oauth_provider=facebook; Path=/".to_owned()));
	}

	#[tokio::test]
	async fn failures_redirect_to_the_failure_url_without_cookies() {
		let (provider, profile) = profile();
		let denied = handler(IdentityOutcome::AlreadyRegistered)
			.redirect(
				CookieJar::new(),
				&provider,
				Err(HandshakeError::Denied { reason: "access_denied".into() }),
				&CorrelationId::missing(),
			)
			.await;

		assert_eq!(denied.headers()[LOCATION], "/oauth/failure");
		assert!(set_cookies(&denied).is_empty());

		let rejected = handler(IdentityOutcome::Error { message: "nope".into() })
			.redirect(CookieJar::new(), &provider, Ok(profile), &CorrelationId::missing())
			.await;

		assert_eq!(rejected.headers()[LOCATION], "/oauth/failure");
		assert!(set_cookies(&rejected).is_empty());
	}

	#[tokio::test]
	async fn token_responses_follow_the_outcome() {
		let (provider, profile) = profile();
		let pending = IdentityOutcome::PendingRegistration {
			state: "verify".into(),
			identity: None,
			provider: None,
		};
		let response =
			handler(pending).token(&provider, Ok(profile.clone()), &CorrelationId::missing()).await;

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(json_body(response).await, json!({ "oauthState": "verify" }));

		let response = handler(IdentityOutcome::Error { message: "Invalid secure key".into() })
			.token(&provider, Ok(profile), &CorrelationId::missing())
			.await;

		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(
			json_body(response).await,
			json!({ "status": "false", "error": "Invalid secure key" })
		);

		let response = handler(IdentityOutcome::AlreadyRegistered)
			.token(
				&provider,
				Err(HandshakeError::MissingParameter { name: "access_token" }),
				&CorrelationId::missing(),
			)
			.await;

		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(json_body(response).await, json!({ "status": "false" }));
	}
}
