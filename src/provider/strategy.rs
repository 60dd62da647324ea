//! Handshake strategy seam.
//!
//! A strategy owns the provider-specific protocol (authorize redirects, code exchanges,
//! token verification) and reports one explicit result: a [`VerifiedProfile`] or a
//! [`HandshakeError`]. Nothing is attached to the request behind the caller's back.

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, VerifiedProfile},
	error::TransportError,
	obs::CorrelationId,
	provider::{ProviderCredentials, ProviderDescriptor},
};

/// Boxed future returned by strategy hooks.
pub type HandshakeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, HandshakeError>> + 'a + Send>>;

/// Provider-specific handshake protocol.
///
/// Implementors are required to be `Send + Sync`; one instance serves every request for its
/// provider concurrently, so implementations must not keep per-request state.
pub trait HandshakeStrategy: Send + Sync {
	/// Starts a Redirect-kind handshake and returns where to send the browser.
	///
	/// Token-kind strategies keep the default, which reports the operation as unsupported.
	fn begin<'a>(&'a self, request: &'a HandshakeRequest) -> HandshakeFuture<'a, HandshakeStart> {
		let _ = request;

		Box::pin(async { Err(HandshakeError::Unsupported { operation: "begin" }) })
	}

	/// Completes the handshake and reports the verified subject.
	fn complete<'a>(
		&'a self,
		request: &'a HandshakeRequest,
	) -> HandshakeFuture<'a, VerifiedProfile>;
}

/// Builds strategies for activated descriptors.
pub trait StrategyFactory: Send + Sync {
	/// Creates the strategy for `descriptor`, whose completion route answers at `callback`.
	fn build(
		&self,
		descriptor: &ProviderDescriptor,
		credentials: ProviderCredentials,
		callback: &Url,
	) -> Result<Arc<dyn HandshakeStrategy>, HandshakeError>;
}

/// Handshake failures reported by strategies.
#[derive(Debug, ThisError)]
pub enum HandshakeError {
	/// The user declined consent or the provider returned an error redirect.
	#[error("Provider denied the handshake: {reason}.")]
	Denied {
		/// Provider-supplied reason.
		reason: String,
	},
	/// A required request parameter is missing.
	#[error("Request is missing the `{name}` parameter.")]
	MissingParameter {
		/// Parameter name.
		name: &'static str,
	},
	/// The returned `state` does not match the handshake cookie.
	#[error("Handshake state does not match.")]
	StateMismatch,
	/// The provider rejected the code or token.
	#[error("Provider rejected the credentials: {reason}.")]
	Rejected {
		/// HTTP status returned by the provider, when available.
		status: Option<u16>,
		/// Provider- or gateway-supplied reason.
		reason: String,
	},
	/// The provider's profile did not carry a usable subject.
	#[error("Provider profile is unusable: {reason}.")]
	Profile {
		/// What was wrong with the profile.
		reason: String,
	},
	/// Transport failure while talking to the provider.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The strategy does not implement this operation.
	#[error("Handshake strategy does not support `{operation}`.")]
	Unsupported {
		/// Operation name.
		operation: &'static str,
	},
	/// The strategy could not be built from its descriptor.
	#[error("Handshake strategy is misconfigured: {reason}.")]
	Configuration {
		/// Description of the problem.
		reason: String,
	},
}

/// Opaque per-handshake secrets round-tripped through the handshake cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct HandshakeState {
	/// Value echoed back by the provider as the `state` parameter.
	pub csrf: String,
	/// PKCE verifier, when the provider requires PKCE.
	pub pkce_verifier: Option<String>,
}
impl HandshakeState {
	const SEPARATOR: char = '.';

	/// Serializes the state into a cookie-safe value.
	pub fn encode(&self) -> String {
		match &self.pkce_verifier {
			Some(verifier) => format!("{}{}{verifier}", self.csrf, Self::SEPARATOR),
			None => self.csrf.clone(),
		}
	}

	/// Parses a cookie value produced by [`HandshakeState::encode`].
	pub fn decode(raw: &str) -> Option<Self> {
		let mut parts = raw.splitn(2, Self::SEPARATOR);
		let csrf = parts.next().filter(|value| !value.is_empty())?.to_owned();
		let pkce_verifier = parts.next().filter(|value| !value.is_empty()).map(str::to_owned);

		Some(Self { csrf, pkce_verifier })
	}
}
impl Debug for HandshakeState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HandshakeState")
			.field("csrf", &self.csrf)
			.field("pkce_verifier_set", &self.pkce_verifier.is_some())
			.finish()
	}
}

/// Where the browser goes next, plus the secrets the gateway must remember.
#[derive(Clone, Debug)]
pub struct HandshakeStart {
	/// Provider consent page URL.
	pub location: Url,
	/// State to store in the handshake cookie.
	pub state: Option<HandshakeState>,
}

/// Original request details, only passed to strategies whose descriptor asks for them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
	/// HTTP method of the inbound request.
	pub method: String,
	/// Inbound `user-agent` header.
	pub user_agent: Option<String>,
	/// Inbound `x-forwarded-for` header.
	pub forwarded_for: Option<String>,
}

/// Everything a strategy may read about the inbound request.
#[derive(Clone, Debug)]
pub struct HandshakeRequest {
	/// Provider name the verified profile is reported under.
	pub provider: ProviderId,
	/// Query and body parameters (body wins on conflicts).
	pub params: BTreeMap<String, String>,
	/// State recovered from the handshake cookie.
	pub state: Option<HandshakeState>,
	/// Original request context, when the descriptor passes it through.
	pub context: Option<RequestContext>,
	/// Correlation identifier of the inbound request.
	pub correlation: CorrelationId,
}
impl HandshakeRequest {
	/// Creates a request with no parameters.
	pub fn new(provider: ProviderId, correlation: CorrelationId) -> Self {
		Self { provider, params: BTreeMap::new(), state: None, context: None, correlation }
	}

	/// Adds a parameter.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(key.into(), value.into());

		self
	}

	/// Returns a non-empty parameter value.
	pub fn param(&self, key: &str) -> Option<&str> {
		self.params.get(key).map(String::as_str).filter(|value| !value.is_empty())
	}

	/// Returns a required parameter or [`HandshakeError::MissingParameter`].
	pub fn require(&self, key: &'static str) -> Result<&str, HandshakeError> {
		self.param(key).ok_or(HandshakeError::MissingParameter { name: key })
	}
}
