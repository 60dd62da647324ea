//! Gateway-level error types shared across configuration, providers, and transports.

// self
use crate::{
	_prelude::*,
	provider::{HandshakeError, ProviderDescriptorError},
};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Startup configuration problem; always fatal.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// A handshake strategy failed or the user declined.
	#[error(transparent)]
	Handshake(#[from] HandshakeError),
	/// Identity service answered with something the gateway cannot interpret.
	#[error("Identity service returned a malformed response at `{}`.", source.path())]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Configuration and validation failures raised while starting the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required configuration key is missing or empty.
	#[error("Configuration key `{key}` must be set.")]
	MissingKey {
		/// Configuration key name.
		key: &'static str,
	},
	/// A configuration value could not be parsed.
	#[error("Configuration key `{key}` is invalid: {reason}.")]
	InvalidValue {
		/// Configuration key name.
		key: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
	/// A configuration value is not a valid absolute URL.
	#[error("Configuration key `{key}` is not a valid URL.")]
	InvalidUrl {
		/// Configuration key name.
		key: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The provider list is absent or contains no names.
	#[error("The PROVIDERS list must not be empty.")]
	EmptyProviderList,
	/// Every configured provider was skipped.
	#[error("No identity provider could be activated.")]
	NoProvidersActivated,
	/// A built-in descriptor failed validation.
	#[error(transparent)]
	InvalidDescriptor(#[from] ProviderDescriptorError),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// The listener could not bind its address.
	#[error("Failed to bind the listener on {addr}.")]
	Bind {
		/// `host:port` that was requested.
		addr: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {target}.")]
	Network {
		/// Which upstream was being called.
		target: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The upstream did not answer in time.
	#[error("Timed out while calling {target}.")]
	Timeout {
		/// Which upstream was being called.
		target: &'static str,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Classifies a reqwest failure for the named upstream.
	pub fn from_reqwest(target: &'static str, err: ReqwestError) -> Self {
		if err.is_timeout() {
			Self::Timeout { target }
		} else {
			Self::Network { target, source: Box::new(err) }
		}
	}
}
