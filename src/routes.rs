//! Per-provider route mounting.
//!
//! [`RouteBinder::bind`] resolves one configured provider name, checks its configuration,
//! builds its strategy and mounts its routes. Everything that varies between providers
//! (verbs, the extra bridging route, request-context passthrough) is read from the
//! descriptor; no branch here looks at a provider's name.

mod handlers;
mod input;

pub use input::*;

// crates.io
use axum::{
	Router,
	routing::{MethodRouter, get, post},
};
// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	completion::HandshakeCompletionHandler,
	config::{EnvironmentGate, GatewayConfig},
	http::GatewayHttpClient,
	provider::{
		HandshakeKind, HandshakeStrategy, ProviderCatalog, ProviderDescriptor, RouteMethod,
		StrategyFactory,
	},
};

/// Header marking requests replayed by the bridging route.
pub const BRIDGE_HEADER: &str = "x-connector-bridge";

/// Why a configured provider was not activated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
	/// The name is not in the catalog.
	UnknownProvider,
	/// A required configuration key is unset or empty.
	MissingConfig,
	/// The strategy factory rejected the descriptor.
	StrategyUnavailable,
	/// One of the provider's paths is already taken by another route.
	RouteConflict,
}
impl SkipReason {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			SkipReason::UnknownProvider => "unknown_provider",
			SkipReason::MissingConfig => "missing_config",
			SkipReason::StrategyUnavailable => "strategy_unavailable",
			SkipReason::RouteConflict => "route_conflict",
		}
	}
}
impl Display for SkipReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Paths mounted for one provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderRoutes {
	/// Entry route `{prefix}/{name}`.
	pub route: String,
	/// Completion route `{prefix}/{name}/callback`.
	pub callback: String,
	/// Bridging route `{prefix}/{name}/token`.
	pub bridge: String,
}
impl ProviderRoutes {
	/// Derives the paths of `name` under `prefix`.
	pub fn new(prefix: &str, name: &str) -> Self {
		let route = format!("{prefix}/{name}");

		Self { callback: format!("{route}/callback"), bridge: format!("{route}/token"), route }
	}

	/// Paths that are actually mounted for `descriptor`.
	pub fn mounted(&self, descriptor: &ProviderDescriptor) -> Vec<&str> {
		let mut paths = vec![self.route.as_str()];

		if descriptor.mounts_callback() {
			paths.push(&self.callback);
		}
		if descriptor.quirks.bridge_route {
			paths.push(&self.bridge);
		}

		paths
	}
}

/// Outcome of activating one configured provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivationResult {
	/// Routes were mounted.
	Activated {
		/// Provider name.
		provider: ProviderId,
		/// Entry route.
		route: String,
		/// Completion route, when mounted.
		callback: Option<String>,
		/// Bridging route, when mounted.
		bridge: Option<String>,
	},
	/// Nothing was mounted for this name.
	Skipped {
		/// Name as configured.
		name: String,
		/// Why the provider was skipped.
		reason: SkipReason,
	},
}
impl ActivationResult {
	/// Returns true for [`ActivationResult::Activated`].
	pub fn is_activated(&self) -> bool {
		matches!(self, ActivationResult::Activated { .. })
	}
}

/// Everything a provider's handlers need; shared read-only by all its requests.
pub(crate) struct ProviderBinding {
	descriptor: ProviderDescriptor,
	strategy: Arc<dyn HandshakeStrategy>,
	completion: HandshakeCompletionHandler,
	handshake_cookie_name: String,
	secure_cookie: bool,
	bridge_target: Option<Url>,
	http: GatewayHttpClient,
}

/// Mounts provider routes during startup.
pub struct RouteBinder<'a> {
	catalog: &'a ProviderCatalog,
	gate: EnvironmentGate<'a>,
	factory: &'a dyn StrategyFactory,
	completion: HandshakeCompletionHandler,
	http: GatewayHttpClient,
	config: &'a GatewayConfig,
}
impl<'a> RouteBinder<'a> {
	/// Creates a binder over the catalog, configuration gate, and strategy factory.
	pub fn new(
		catalog: &'a ProviderCatalog,
		gate: EnvironmentGate<'a>,
		factory: &'a dyn StrategyFactory,
		completion: HandshakeCompletionHandler,
		http: GatewayHttpClient,
		config: &'a GatewayConfig,
	) -> Self {
		Self { catalog, gate, factory, completion, http, config }
	}

	/// Paths `name` would be mounted on.
	pub fn routes_for(&self, name: &str) -> ProviderRoutes {
		ProviderRoutes::new(&self.config.route_prefix, name)
	}

	/// Activates `name`, mounting its routes onto `router` on success.
	///
	/// `taken` lists paths that already belong to other routes; a provider that would reuse
	/// one of them is skipped.
	pub fn bind(&self, name: &str, taken: &[String], router: Router) -> (Router, ActivationResult) {
		let skipped =
			|reason| ActivationResult::Skipped { name: name.to_owned(), reason };
		let Some(descriptor) = self.catalog.lookup(name) else {
			tracing::warn!(provider = name, "Unknown provider.");

			return (router, skipped(SkipReason::UnknownProvider));
		};

		tracing::info!(provider = name, kind = %descriptor.kind, "Setting up provider.");

		let credentials =
			self.gate.validate(descriptor).then(|| self.gate.credentials(descriptor)).flatten();
		let Some(credentials) = credentials else {
			tracing::error!(provider = name, "Provider is not initialized.");

			return (router, skipped(SkipReason::MissingConfig));
		};
		let routes = self.routes_for(name);
		let mounted = routes.mounted(descriptor);

		if let Some(path) = mounted.iter().find(|path| taken.iter().any(|t| t == *path)) {
			tracing::error!(provider = name, path, "Provider route is already taken.");

			return (router, skipped(SkipReason::RouteConflict));
		}

		let built = self.config.absolute(&routes.callback).map_err(|e| e.to_string()).and_then(
			|callback| {
				self.factory
					.build(descriptor, credentials, &callback)
					.map(|strategy| (strategy, callback))
					.map_err(|e| e.to_string())
			},
		);
		let (strategy, callback_url) = match built {
			Ok(built) => built,
			Err(reason) => {
				tracing::error!(provider = name, reason = %reason, "Handshake strategy is unavailable.");

				return (router, skipped(SkipReason::StrategyUnavailable));
			},
		};
		let binding = Arc::new(ProviderBinding {
			descriptor: descriptor.clone(),
			strategy,
			completion: self.completion.clone(),
			handshake_cookie_name: format!("oauth_handshake_{name}"),
			secure_cookie: self.config.public_url.scheme() == "https",
			bridge_target: descriptor.quirks.bridge_route.then_some(callback_url),
			http: self.http.clone(),
		});
		let provider_router = self.provider_router(descriptor, &routes).with_state(binding);
		let result = ActivationResult::Activated {
			provider: descriptor.id.clone(),
			route: routes.route.clone(),
			callback: descriptor.mounts_callback().then(|| routes.callback.clone()),
			bridge: descriptor.quirks.bridge_route.then(|| routes.bridge.clone()),
		};

		tracing::info!(provider = name, route = %routes.route, "Provider is initialized.");

		(router.merge(provider_router), result)
	}

	fn provider_router(
		&self,
		descriptor: &ProviderDescriptor,
		routes: &ProviderRoutes,
	) -> Router<Arc<ProviderBinding>> {
		let quirks = &descriptor.quirks;
		let mut router = Router::new();

		match descriptor.kind {
			HandshakeKind::Redirect => {
				router = router
					.route(&routes.route, get(handlers::begin))
					.route(&routes.callback, method(quirks.callback_method, handlers::callback));
			},
			HandshakeKind::Token => {
				router = router.route(&routes.route, method(quirks.entry_method, handlers::token));

				if quirks.callback_route {
					router = router
						.route(&routes.callback, method(quirks.callback_method, handlers::token));
				}
			},
		}

		if quirks.bridge_route {
			router = router.route(&routes.bridge, get(handlers::bridge).post(handlers::bridge));
		}

		router
	}
}

fn method<H, T>(verb: RouteMethod, handler: H) -> MethodRouter<Arc<ProviderBinding>>
where
	H: axum::handler::Handler<T, Arc<ProviderBinding>>,
	T: 'static,
{
	match verb {
		RouteMethod::Get => get(handler),
		RouteMethod::Post => post(handler),
	}
}
