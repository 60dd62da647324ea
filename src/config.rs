//! Environment-style configuration and the per-provider credential gate.

// std
use std::net::IpAddr;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	provider::{ProviderCredentials, ProviderDescriptor},
};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ROUTE_PREFIX: &str = "/auth";
const DEFAULT_SUCCESS_REDIRECT: &str = "/oauth/success";
const DEFAULT_FAILURE_REDIRECT: &str = "/oauth/failure";
const DEFAULT_APP_ROOT: &str = "/";
const DEFAULT_COOKIE_PREFIX: &str = "commun_oauth";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Snapshot of key/value configuration.
///
/// Values are trimmed on lookup and empty values count as absent, so `KEY=` behaves the
/// same as an unset key.
#[derive(Clone, Debug, Default)]
pub struct Env {
	vars: BTreeMap<String, String>,
}
impl Env {
	/// Captures the current process environment.
	pub fn from_process() -> Self {
		Self::from_pairs(std::env::vars())
	}

	/// Builds a snapshot from explicit pairs.
	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self { vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
	}

	/// Sets or replaces a value.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.vars.insert(key.into(), value.into());

		self
	}

	/// Returns the trimmed value of `key`, or `None` when unset or empty.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.vars.get(key).map(|value| value.trim()).filter(|value| !value.is_empty())
	}

	fn require(&self, key: &'static str) -> Result<&str, ConfigError> {
		self.get(key).ok_or(ConfigError::MissingKey { key })
	}

	fn parse_or<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
	where
		T: FromStr,
		T::Err: Display,
	{
		match self.get(key) {
			Some(raw) => raw
				.parse()
				.map_err(|e: T::Err| ConfigError::InvalidValue { key, reason: e.to_string() }),
			None => Ok(default),
		}
	}

	fn url(&self, key: &'static str, raw: &str) -> Result<Url, ConfigError> {
		Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { key, source })
	}
}

/// Identity-service RPC settings.
#[derive(Clone)]
pub struct IdentityServiceConfig {
	/// JSON-RPC endpoint.
	pub endpoint: Url,
	/// Shared secret sent as `secureKey`.
	pub secure_key: String,
	/// Per-call timeout, also applied to provider HTTP calls.
	pub timeout: Duration,
}
impl Debug for IdentityServiceConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdentityServiceConfig")
			.field("endpoint", &self.endpoint.as_str())
			.field("secure_key_set", &!self.secure_key.is_empty())
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Process-wide gateway settings resolved at startup.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
	/// Listener host; a hostname or an IP literal.
	pub host: String,
	/// Listener port.
	pub port: u16,
	/// Absolute base URL used to build provider callback URLs.
	pub public_url: Url,
	/// Requested provider names in configuration order, possibly empty.
	pub providers: Vec<String>,
	/// Normalized route prefix (leading `/`, no trailing `/`; empty when mounted at the root).
	pub route_prefix: String,
	/// Global success path.
	pub success_redirect: String,
	/// Global failure path; Redirect-kind failures are sent here.
	pub failure_redirect: String,
	/// Where browsers land after a completed handshake.
	pub app_root: String,
	/// Prefix of the result cookies.
	pub cookie_prefix: String,
	/// Identity-service RPC settings.
	pub identity: IdentityServiceConfig,
}
impl GatewayConfig {
	/// Resolves the configuration from `env`.
	pub fn from_env(env: &Env) -> Result<Self, ConfigError> {
		let host = env.get("GLS_CONNECTOR_HOST").unwrap_or(DEFAULT_HOST).to_owned();
		let port = env.parse_or("GLS_CONNECTOR_PORT", DEFAULT_PORT)?;
		let public_url = match env.get("GLS_CONNECTOR_PUBLIC_URL") {
			Some(raw) => env.url("GLS_CONNECTOR_PUBLIC_URL", raw)?,
			None => env.url("GLS_CONNECTOR_PUBLIC_URL", &format!("http://{}", authority(&host, port)))?,
		};
		let providers = env.get("PROVIDERS").map(split_provider_list).unwrap_or_default();
		let route_prefix = normalize_prefix(env.get("AUTH_ROUTE_PREFIX").unwrap_or(DEFAULT_ROUTE_PREFIX));
		let success_redirect =
			route_path("SUCCESS_REDIRECT_URL", env.get("SUCCESS_REDIRECT_URL"), DEFAULT_SUCCESS_REDIRECT)?;
		let failure_redirect =
			route_path("FAILURE_REDIRECT_URL", env.get("FAILURE_REDIRECT_URL"), DEFAULT_FAILURE_REDIRECT)?;

		if success_redirect == failure_redirect {
			return Err(ConfigError::InvalidValue {
				key: "FAILURE_REDIRECT_URL",
				reason: "must differ from SUCCESS_REDIRECT_URL".into(),
			});
		}

		let app_root = env.get("APP_ROOT_URL").unwrap_or(DEFAULT_APP_ROOT).to_owned();
		let cookie_prefix = env.get("OAUTH_COOKIE_PREFIX").unwrap_or(DEFAULT_COOKIE_PREFIX).to_owned();
		let endpoint = env.url("GLS_REGISTRATION_CONNECT", env.require("GLS_REGISTRATION_CONNECT")?)?;
		let secure_key = env.require("GLS_OAUTH_SECURE_KEY")?.to_owned();
		let timeout_secs = env.parse_or("GLS_REGISTRATION_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

		if timeout_secs == 0 {
			return Err(ConfigError::InvalidValue {
				key: "GLS_REGISTRATION_TIMEOUT_SECS",
				reason: "must be greater than zero".into(),
			});
		}

		Ok(Self {
			host,
			port,
			public_url,
			providers,
			route_prefix,
			success_redirect,
			failure_redirect,
			app_root,
			cookie_prefix,
			identity: IdentityServiceConfig {
				endpoint,
				secure_key,
				timeout: Duration::from_secs(timeout_secs),
			},
		})
	}

	/// `host:port` of the listener, with IPv6 literals bracketed.
	pub fn listen_authority(&self) -> String {
		authority(&self.host, self.port)
	}

	/// Absolute URL for a gateway path, resolved against [`GatewayConfig::public_url`].
	pub fn absolute(&self, path: &str) -> Result<Url, ConfigError> {
		let base = self.public_url.as_str().trim_end_matches('/');

		Url::parse(&format!("{base}{path}"))
			.map_err(|source| ConfigError::InvalidUrl { key: "GLS_CONNECTOR_PUBLIC_URL", source })
	}
}

/// Checks that a descriptor's configuration keys are present before it is activated.
#[derive(Clone, Copy, Debug)]
pub struct EnvironmentGate<'a> {
	env: &'a Env,
}
impl<'a> EnvironmentGate<'a> {
	/// Creates a gate over `env`.
	pub fn new(env: &'a Env) -> Self {
		Self { env }
	}

	/// Required keys of `descriptor` that are unset or empty.
	pub fn missing_keys<'d>(&self, descriptor: &'d ProviderDescriptor) -> Vec<&'d str> {
		descriptor
			.required_config_keys
			.iter()
			.map(String::as_str)
			.filter(|key| self.env.get(key).is_none())
			.collect()
	}

	/// Returns true when every required key is set; logs one line per missing key otherwise.
	pub fn validate(&self, descriptor: &ProviderDescriptor) -> bool {
		let missing = self.missing_keys(descriptor);

		for key in &missing {
			tracing::error!(provider = %descriptor.id, key, "Required configuration key is not set.");
		}

		missing.is_empty()
	}

	/// Resolves the client credentials of a validated descriptor.
	pub fn credentials(&self, descriptor: &ProviderDescriptor) -> Option<ProviderCredentials> {
		Some(ProviderCredentials {
			client_id: self.env.get(&descriptor.credentials.client_id)?.to_owned(),
			client_secret: self.env.get(&descriptor.credentials.client_secret)?.to_owned(),
		})
	}
}

/// Splits a comma-separated provider list, dropping blank entries.
pub fn split_provider_list(raw: &str) -> Vec<String> {
	raw.split(',').map(str::trim).filter(|name| !name.is_empty()).map(str::to_owned).collect()
}

fn authority(host: &str, port: u16) -> String {
	match host.parse::<IpAddr>() {
		Ok(IpAddr::V6(_)) => format!("[{host}]:{port}"),
		_ => format!("{host}:{port}"),
	}
}

fn normalize_prefix(raw: &str) -> String {
	let trimmed = raw.trim().trim_matches('/');

	if trimmed.is_empty() { String::new() } else { format!("/{trimmed}") }
}

fn route_path(
	key: &'static str,
	raw: Option<&str>,
	default: &str,
) -> Result<String, ConfigError> {
	let path = raw.unwrap_or(default);

	if !path.starts_with('/') {
		return Err(ConfigError::InvalidValue { key, reason: "must be an absolute path".into() });
	}
	if path.contains(['{', '}', '*', ':', '?', '#']) {
		return Err(ConfigError::InvalidValue { key, reason: "must be a plain path".into() });
	}

	Ok(path.to_owned())
}
