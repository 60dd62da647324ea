// std
use std::iter::IntoIterator;
// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, ProviderId, ScopeList, ScopeValidationError},
	provider::{
		ClientAuthMethod, CredentialKeys, HandshakeKind, ProfileSource, ProviderDescriptor,
		ProviderEndpoints, ProviderQuirks, RouteMethod,
	},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// The provider identifier is not a valid route segment.
	#[error(transparent)]
	InvalidIdentifier(#[from] IdentifierError),
	/// An endpoint literal could not be parsed.
	#[error("Endpoint `{url}` is not a valid URL.")]
	InvalidEndpoint {
		/// Endpoint literal that failed to parse.
		url: String,
	},
	/// Redirect-kind providers need a consent page.
	#[error("Descriptor `{provider}` is missing its authorization endpoint.")]
	MissingAuthorizationEndpoint {
		/// Provider identifier.
		provider: String,
	},
	/// Redirect-kind providers need a token endpoint to exchange codes.
	#[error("Descriptor `{provider}` is missing its token endpoint.")]
	MissingTokenEndpoint {
		/// Provider identifier.
		provider: String,
	},
	/// Endpoint-sourced profiles need a profile endpoint.
	#[error("Descriptor `{provider}` is missing its profile endpoint.")]
	MissingProfileEndpoint {
		/// Provider identifier.
		provider: String,
	},
	/// Client credential keys are mandatory.
	#[error("Descriptor `{provider}` does not declare its credential keys.")]
	MissingCredentialKeys {
		/// Provider identifier.
		provider: String,
	},
	/// The quirk only applies to Redirect-kind providers.
	#[error("Descriptor `{provider}` enables `{quirk}`, which requires the redirect kind.")]
	RequiresRedirectKind {
		/// Provider identifier.
		provider: String,
		/// Quirk or setting that was rejected.
		quirk: &'static str,
	},
	/// Endpoints must use HTTPS outside of loopback hosts.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
	/// Declared scopes failed validation.
	#[error(transparent)]
	InvalidScope(#[from] ScopeValidationError),
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// Handshake family.
	pub kind: HandshakeKind,
	/// Provider name reported to the identity service, when it differs from `id`.
	pub identity_provider: Option<ProviderId>,
	/// Extra keys required on top of the credential keys.
	pub extra_required_keys: Vec<String>,
	/// Requested scopes.
	pub scopes: Vec<String>,
	/// Credential key binding.
	pub credentials: Option<CredentialKeys>,
	/// Endpoint definitions.
	pub endpoints: ProviderEndpoints,
	/// Where the subject identifier comes from.
	pub profile_source: ProfileSource,
	/// Token endpoint client authentication.
	pub client_auth_method: ClientAuthMethod,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: ProviderId, kind: HandshakeKind) -> Self {
		Self {
			id,
			kind,
			identity_provider: None,
			extra_required_keys: Vec::new(),
			scopes: Vec::new(),
			credentials: None,
			endpoints: ProviderEndpoints::default(),
			profile_source: ProfileSource::Endpoint { id_field: "id".into() },
			client_auth_method: ClientAuthMethod::default(),
			quirks: ProviderQuirks::default(),
		}
	}

	/// Binds the client id/secret configuration keys (both become required).
	pub fn credential_keys(
		mut self,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		self.credentials =
			Some(CredentialKeys { client_id: client_id.into(), client_secret: client_secret.into() });

		self
	}

	/// Adds a configuration key that must be present besides the credentials.
	pub fn require_key(mut self, key: impl Into<String>) -> Self {
		self.extra_required_keys.push(key.into());

		self
	}

	/// Appends requested scopes.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes.extend(scopes.into_iter().map(Into::into));

		self
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.endpoints.authorization = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.endpoints.token = Some(url);

		self
	}

	/// Sets the profile endpoint.
	pub fn profile_endpoint(mut self, url: Url) -> Self {
		self.endpoints.profile = Some(url);

		self
	}

	/// Overrides where the subject identifier is read from.
	pub fn profile_source(mut self, source: ProfileSource) -> Self {
		self.profile_source = source;

		self
	}

	/// Overrides the token endpoint client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Reports identities under `provider` instead of the descriptor id.
	pub fn identity_provider(mut self, provider: ProviderId) -> Self {
		self.identity_provider = Some(provider);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let provider = self.id.to_string();
		let credentials =
			self.credentials.ok_or(ProviderDescriptorError::MissingCredentialKeys { provider })?;
		let mut required_config_keys =
			vec![credentials.client_id.clone(), credentials.client_secret.clone()];

		for key in self.extra_required_keys {
			if !required_config_keys.contains(&key) {
				required_config_keys.push(key);
			}
		}

		let identity_provider = self.identity_provider.unwrap_or_else(|| self.id.clone());
		let descriptor = ProviderDescriptor {
			id: self.id,
			identity_provider,
			kind: self.kind,
			required_config_keys,
			scope: ScopeList::new(self.scopes)?,
			credentials,
			endpoints: self.endpoints,
			profile_source: self.profile_source,
			client_auth_method: self.client_auth_method,
			quirks: self.quirks,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		let provider = || self.id.to_string();

		if self.kind == HandshakeKind::Redirect {
			let authorization = self
				.endpoints
				.authorization
				.as_ref()
				.ok_or_else(|| ProviderDescriptorError::MissingAuthorizationEndpoint {
					provider: provider(),
				})?;
			let token = self
				.endpoints
				.token
				.as_ref()
				.ok_or_else(|| ProviderDescriptorError::MissingTokenEndpoint { provider: provider() })?;

			validate_endpoint("authorization", authorization)?;
			validate_endpoint("token", token)?;
		} else {
			let redirect_only = [
				(self.quirks.bridge_route, "bridge_route"),
				(self.quirks.pkce_required, "pkce_required"),
				(matches!(self.profile_source, ProfileSource::IdToken { .. }), "id_token profile"),
			];

			if let Some((_, quirk)) = redirect_only.into_iter().find(|(enabled, _)| *enabled) {
				return Err(ProviderDescriptorError::RequiresRedirectKind {
					provider: provider(),
					quirk,
				});
			}
			if self.quirks.callback_method == RouteMethod::Post && !self.quirks.callback_route {
				return Err(ProviderDescriptorError::RequiresRedirectKind {
					provider: provider(),
					quirk: "callback_method without callback_route",
				});
			}
		}

		if let ProfileSource::Endpoint { .. } = self.profile_source {
			let profile = self.endpoints.profile.as_ref().ok_or_else(|| {
				ProviderDescriptorError::MissingProfileEndpoint { provider: provider() }
			})?;

			validate_endpoint("profile", profile)?;
		}

		validate_scope_delimiter(self.quirks.scope_delimiter)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() == "https" || is_loopback(url) {
		Ok(())
	} else {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain == "localhost",
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

fn validate_scope_delimiter(delimiter: char) -> Result<(), ProviderDescriptorError> {
	if delimiter.is_control() {
		Err(ProviderDescriptorError::InvalidScopeDelimiter { delimiter })
	} else {
		Ok(())
	}
}
