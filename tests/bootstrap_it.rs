mod common;

// std
use std::sync::Arc;
// crates.io
use axum::{
	body::Body,
	http::{Request, StatusCode},
};
use serde_json::json;
use url::Url;
// self
use common::*;
use oauth_connector::{
	auth::ProviderId,
	error::{ConfigError, Error},
	gateway::{Gateway, GatewayBootstrap},
	provider::{
		HandshakeKind, ProviderCatalog, ProviderDescriptor, ProviderQuirks, RequestContext,
		RouteMethod,
	},
	routes::{ActivationResult, SkipReason},
};

fn build(env: &oauth_connector::config::Env) -> Result<Gateway, Error> {
	GatewayBootstrap::new(env)
		.strategy_factory(Arc::new(SyntheticStrategies))
		.identity_service(Arc::new(RecordingIdentity::echo()))
		.build()
}

fn skipped(gateway: &Gateway, name: &str) -> Option<SkipReason> {
	gateway.activations().iter().find_map(|result| match result {
		ActivationResult::Skipped { name: skipped, reason } if skipped == name => Some(*reason),
		_ => None,
	})
}

#[tokio::test]
async fn unknown_providers_are_skipped_without_routes() {
	let gateway = build(&env("twitter,facebook")).expect("facebook should still activate.");

	assert_eq!(skipped(&gateway, "twitter"), Some(SkipReason::UnknownProvider));
	assert_eq!(gateway.activated().map(|id| id.to_string()).collect::<Vec<_>>(), vec!["facebook"]);

	let router = gateway.router();

	assert_eq!(send(&router, get("/auth/twitter")).await.status(), StatusCode::NOT_FOUND);
	assert_eq!(send(&router, get("/auth/twitter/callback")).await.status(), StatusCode::NOT_FOUND);
	assert_eq!(send(&router, get("/auth/facebook")).await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn providers_missing_config_are_skipped_independently() {
	let env = env("google,facebook-token").with("GOOGLE_CONSUMER_SECRET", "");
	let gateway = build(&env).expect("facebook-token should still activate.");

	assert_eq!(skipped(&gateway, "google"), Some(SkipReason::MissingConfig));
	assert!(gateway.activated().any(|id| id.as_ref() == "facebook-token"));

	let router = gateway.router();

	assert_eq!(send(&router, get("/auth/google")).await.status(), StatusCode::NOT_FOUND);
}

#[test]
fn startup_fails_when_nothing_activates() {
	let env = env("twitter,google").with("GOOGLE_CONSUMER_KEY", " ");
	let err = build(&env).expect_err("No provider can activate.");

	assert!(matches!(err, Error::Config(ConfigError::NoProvidersActivated)));
}

#[test]
fn startup_fails_on_an_empty_provider_list() {
	for list in ["", " , ,"] {
		let err = build(&env(list)).expect_err("An empty provider list is fatal.");

		assert!(matches!(err, Error::Config(ConfigError::EmptyProviderList)));
	}
}

#[test]
fn duplicate_names_activate_once() {
	let gateway =
		build(&env("facebook, facebook ,google")).expect("Duplicates should not abort startup.");

	assert_eq!(gateway.activations().len(), 2);
	assert_eq!(gateway.activated().count(), 2);
}

#[test]
fn activation_reports_mounted_paths() {
	let env = env("apple,google-token").with("AUTH_ROUTE_PREFIX", "/sso");
	let gateway = build(&env).expect("Both providers should activate.");

	assert!(gateway.activations().iter().any(|result| matches!(
		result,
		ActivationResult::Activated { route, callback: Some(callback), bridge: Some(bridge), .. }
			if route == "/sso/apple" && callback == "/sso/apple/callback" && bridge == "/sso/apple/token"
	)));
	assert!(gateway.activations().iter().any(|result| matches!(
		result,
		ActivationResult::Activated { route, callback: None, bridge: None, .. }
			if route == "/sso/google-token"
	)));
}

#[tokio::test]
async fn routes_use_the_verbs_descriptors_declare() {
	let gateway = build(&env("apple,google-token,facebook-token")).expect("Providers should activate.");
	let router = gateway.router();

	assert_eq!(
		send(&router, get("/auth/apple/callback?external_id=1")).await.status(),
		StatusCode::METHOD_NOT_ALLOWED
	);
	assert_eq!(
		send(&router, post_form("/auth/apple/callback", "external_id=1")).await.status(),
		StatusCode::SEE_OTHER
	);
	assert_eq!(
		send(&router, get("/auth/google-token?external_id=1")).await.status(),
		StatusCode::METHOD_NOT_ALLOWED
	);
	assert_eq!(
		send(&router, post_form("/auth/google-token", "external_id=1")).await.status(),
		StatusCode::OK
	);
	assert_eq!(
		send(&router, get("/auth/facebook-token?external_id=1")).await.status(),
		StatusCode::OK
	);
}

#[tokio::test]
async fn global_routes_answer_with_fixed_bodies() {
	let env = env("facebook").with("SUCCESS_REDIRECT_URL", "/done");
	let router = build(&env).expect("facebook should activate.").router();
	let success = send(&router, get("/done")).await;

	assert_eq!(success.status(), StatusCode::OK);
	assert_eq!(body_json(success).await, json!({ "status": "ok" }));

	let failure = send(&router, get("/oauth/failure")).await;

	assert_eq!(failure.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(body_json(failure).await, json!({ "status": "false" }));
}

#[test]
fn providers_cannot_shadow_global_routes() {
	let env = env("facebook,google")
		.with("AUTH_ROUTE_PREFIX", "/oauth")
		.with("FAILURE_REDIRECT_URL", "/oauth/google");
	let gateway = build(&env).expect("facebook should still activate.");

	assert_eq!(skipped(&gateway, "google"), Some(SkipReason::RouteConflict));
}

#[tokio::test]
async fn request_context_reaches_only_providers_that_ask_for_it() {
	let strategies = Arc::new(CapturingStrategies::default());
	let router = GatewayBootstrap::new(&env("apple,facebook"))
		.strategy_factory(strategies.clone())
		.identity_service(Arc::new(RecordingIdentity::echo()))
		.build()
		.expect("Both providers should activate.")
		.router();
	let apple = Request::post("/auth/apple/callback")
		.header("content-type", "application/x-www-form-urlencoded")
		.header("user-agent", "connector-it/1.0")
		.header("x-forwarded-for", "203.0.113.7")
		.body(Body::from("external_id=1"))
		.expect("Callback fixture should build.");

	assert_eq!(send(&router, apple).await.status(), StatusCode::SEE_OTHER);
	assert_eq!(
		send(&router, get("/auth/facebook/callback?external_id=2")).await.status(),
		StatusCode::SEE_OTHER
	);
	assert_eq!(
		strategies.contexts(),
		vec![
			(
				"apple".to_owned(),
				Some(RequestContext {
					method: "POST".into(),
					user_agent: Some("connector-it/1.0".into()),
					forwarded_for: Some("203.0.113.7".into()),
				})
			),
			("facebook".to_owned(), None),
		]
	);
}

#[tokio::test]
async fn token_providers_can_mount_a_completion_route() {
	let descriptor = ProviderDescriptor::builder(
		ProviderId::new("mock-token").expect("Fixture provider should be valid."),
		HandshakeKind::Token,
	)
	.credential_keys("FACEBOOK_APP_ID", "FACEBOOK_APP_SECRET")
	.profile_endpoint(Url::parse("https://profile.example.com/me").expect("Fixture URL should parse."))
	.quirks(ProviderQuirks {
		callback_route: true,
		callback_method: RouteMethod::Post,
		..ProviderQuirks::default()
	})
	.build()
	.expect("Token descriptor with a completion route should validate.");
	let gateway = GatewayBootstrap::new(&env("mock-token"))
		.catalog(ProviderCatalog::new([descriptor]))
		.strategy_factory(Arc::new(SyntheticStrategies))
		.identity_service(Arc::new(RecordingIdentity::echo()))
		.build()
		.expect("mock-token should activate.");

	assert!(gateway.activations().iter().any(|result| matches!(
		result,
		ActivationResult::Activated { route, callback: Some(callback), bridge: None, .. }
			if route == "/auth/mock-token" && callback == "/auth/mock-token/callback"
	)));

	let router = gateway.router();
	let completed = send(&router, post_form("/auth/mock-token/callback", "external_id=5")).await;

	assert_eq!(completed.status(), StatusCode::OK);
	assert!(set_cookies(&completed).is_empty(), "Token completions must not set cookies.");
	assert_eq!(
		body_json(completed).await,
		json!({ "identity": "mock-token.5", "provider": "mock-token" })
	);
	assert_eq!(
		send(&router, get("/auth/mock-token/callback?external_id=5")).await.status(),
		StatusCode::METHOD_NOT_ALLOWED
	);
	assert_eq!(
		send(&router, get("/auth/mock-token?external_id=6")).await.status(),
		StatusCode::OK
	);
}
