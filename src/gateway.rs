//! Startup: provider activation, global routes, and serving.

// std
use std::collections::BTreeSet;
// crates.io
use axum::{
	Json, Router,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	completion::HandshakeCompletionHandler,
	config::{EnvironmentGate, Env, GatewayConfig},
	error::{ConfigError, TransportError},
	handshake::BuiltinStrategies,
	http::GatewayHttpClient,
	identity::{IdentityService, JsonRpcIdentityBridge},
	provider::{ProviderCatalog, StrategyFactory},
	routes::{ActivationResult, RouteBinder},
};

/// Drives provider activation and assembles the gateway router.
///
/// Every collaborator defaults to the built-in implementation; tests and embedders may swap
/// the catalog, the strategy factory, the identity service, or the HTTP client.
pub struct GatewayBootstrap<'a> {
	env: &'a Env,
	catalog: Option<ProviderCatalog>,
	factory: Option<Arc<dyn StrategyFactory>>,
	identity: Option<Arc<dyn IdentityService>>,
	http: Option<GatewayHttpClient>,
}
impl<'a> GatewayBootstrap<'a> {
	/// Creates a bootstrap reading configuration from `env`.
	pub fn new(env: &'a Env) -> Self {
		Self { env, catalog: None, factory: None, identity: None, http: None }
	}

	/// Replaces the built-in provider catalog.
	pub fn catalog(mut self, catalog: ProviderCatalog) -> Self {
		self.catalog = Some(catalog);

		self
	}

	/// Replaces the built-in strategy factory.
	pub fn strategy_factory(mut self, factory: Arc<dyn StrategyFactory>) -> Self {
		self.factory = Some(factory);

		self
	}

	/// Replaces the JSON-RPC identity bridge.
	pub fn identity_service(mut self, identity: Arc<dyn IdentityService>) -> Self {
		self.identity = Some(identity);

		self
	}

	/// Replaces the outbound HTTP client.
	pub fn http_client(mut self, http: GatewayHttpClient) -> Self {
		self.http = Some(http);

		self
	}

	/// Activates every configured provider and builds the router.
	///
	/// Fails when the provider list is empty or when no provider could be activated; both
	/// happen before anything binds a socket.
	pub fn build(self) -> Result<Gateway> {
		let config = GatewayConfig::from_env(self.env)?;

		if config.providers.is_empty() {
			tracing::error!("PROVIDERS must not be empty.");

			return Err(ConfigError::EmptyProviderList.into());
		}

		let catalog = match self.catalog {
			Some(catalog) => catalog,
			None => ProviderCatalog::builtin().map_err(ConfigError::from)?,
		};
		let http = match self.http {
			Some(http) => http,
			None => GatewayHttpClient::new(config.identity.timeout)?,
		};
		let factory = self
			.factory
			.unwrap_or_else(|| Arc::new(BuiltinStrategies::new(http.clone())));
		let identity = self.identity.unwrap_or_else(|| {
			Arc::new(JsonRpcIdentityBridge::with_http_client(&config.identity, http.clone()))
		});
		let completion = HandshakeCompletionHandler::new(identity, &config);
		let binder = RouteBinder::new(
			&catalog,
			EnvironmentGate::new(self.env),
			factory.as_ref(),
			completion,
			http,
			&config,
		);
		let mut taken = vec![config.success_redirect.clone(), config.failure_redirect.clone()];
		let mut seen = BTreeSet::new();
		let mut activations = Vec::with_capacity(config.providers.len());
		let mut router = Router::new();

		for name in &config.providers {
			if !seen.insert(name.as_str()) {
				tracing::warn!(provider = %name, "Provider is listed more than once.");

				continue;
			}

			let (next, result) = binder.bind(name, &taken, router);

			router = next;

			if let ActivationResult::Activated { route, callback, bridge, .. } = &result {
				taken.push(route.clone());
				taken.extend(callback.iter().cloned());
				taken.extend(bridge.iter().cloned());
			}

			activations.push(result);
		}

		if !activations.iter().any(ActivationResult::is_activated) {
			tracing::error!("Providers are not initialized.");

			return Err(ConfigError::NoProvidersActivated.into());
		}

		let router = router
			.route(&config.success_redirect, get(success))
			.route(&config.failure_redirect, get(failure))
			.layer(TraceLayer::new_for_http());

		Ok(Gateway { config, activations, router })
	}
}

/// Activated gateway, read-only once built.
#[derive(Debug)]
pub struct Gateway {
	config: GatewayConfig,
	activations: Vec<ActivationResult>,
	router: Router,
}
impl Gateway {
	/// Resolved configuration.
	pub fn config(&self) -> &GatewayConfig {
		&self.config
	}

	/// Activation result of every distinct configured provider, in configuration order.
	pub fn activations(&self) -> &[ActivationResult] {
		&self.activations
	}

	/// Names of the activated providers.
	pub fn activated(&self) -> impl Iterator<Item = &ProviderId> {
		self.activations.iter().filter_map(|result| match result {
			ActivationResult::Activated { provider, .. } => Some(provider),
			ActivationResult::Skipped { .. } => None,
		})
	}

	/// Router serving every mounted route.
	pub fn router(&self) -> Router {
		self.router.clone()
	}

	/// Binds the configured address and serves until Ctrl-C or SIGTERM.
	pub async fn serve(self) -> Result<()> {
		let listener = TcpListener::bind((self.config.host.as_str(), self.config.port))
			.await
			.map_err(|source| ConfigError::Bind { addr: self.config.listen_authority(), source })?;

		self.serve_on(listener).await
	}

	/// Serves on an already bound listener until Ctrl-C or SIGTERM.
	pub async fn serve_on(self, listener: TcpListener) -> Result<()> {
		let addr = listener.local_addr().map_err(TransportError::Io)?;

		tracing::info!(%addr, providers = self.activated().count(), "Gateway is listening.");

		axum::serve(listener, self.router)
			.with_graceful_shutdown(shutdown_signal())
			.await
			.map_err(TransportError::Io)?;

		tracing::info!("Gateway stopped.");

		Ok(())
	}
}

async fn success() -> Json<serde_json::Value> {
	Json(json!({ "status": "ok" }))
}

async fn failure() -> Response {
	(StatusCode::UNAUTHORIZED, Json(json!({ "status": "false" }))).into_response()
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "Failed to install the Ctrl-C handler.");
			std::future::pending::<()>().await;
		}
	};
	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			},
			Err(e) => {
				tracing::error!(error = %e, "Failed to install the SIGTERM handler.");
				std::future::pending::<()>().await;
			},
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}

	tracing::info!("Graceful shutdown initiated.");
}
