// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{ExternalId, ProviderId, VerifiedProfile},
	error::TransportError,
	http::GatewayHttpClient,
	provider::HandshakeError,
};

const TARGET: &str = "provider profile endpoint";

/// Resolves an access token into a profile through a bearer-authenticated GET.
pub(crate) async fn fetch_profile(
	http: &GatewayHttpClient,
	endpoint: &Url,
	access_token: &str,
	id_field: &str,
	provider: &ProviderId,
) -> Result<VerifiedProfile, HandshakeError> {
	let response = http.get_bearer(TARGET, endpoint.clone(), access_token).await?;
	let status = response.status();

	if !status.is_success() {
		return Err(HandshakeError::Rejected {
			status: Some(status.as_u16()),
			reason: "profile endpoint rejected the access token".into(),
		});
	}

	let body = response.bytes().await.map_err(|e| TransportError::from_reqwest(TARGET, e))?;
	let value = serde_json::from_slice::<Value>(&body)
		.map_err(|e| HandshakeError::Profile { reason: format!("profile is not JSON ({e})") })?;

	profile_from(value, id_field, provider)
}

/// Decodes the claims segment of a JWT without checking its signature.
///
/// Only used for tokens received directly from the provider's token endpoint over TLS.
pub(crate) fn id_token_claims(id_token: &str) -> Result<Value, HandshakeError> {
	let malformed = |reason: &str| HandshakeError::Profile { reason: format!("id_token {reason}") };
	let mut segments = id_token.split('.');
	let claims = match (segments.next(), segments.next(), segments.next(), segments.next()) {
		(Some(_), Some(claims), Some(_), None) => claims,
		_ => return Err(malformed("is not a compact JWT")),
	};
	let bytes =
		URL_SAFE_NO_PAD.decode(claims.trim_end_matches('=')).map_err(|_| malformed("is not base64url"))?;

	serde_json::from_slice(&bytes).map_err(|_| malformed("claims are not JSON"))
}

/// Builds a profile from a JSON object, reading the subject from `field`.
pub(crate) fn profile_from(
	value: Value,
	field: &str,
	provider: &ProviderId,
) -> Result<VerifiedProfile, HandshakeError> {
	let subject = match value.get(field) {
		Some(Value::String(s)) => s.clone(),
		Some(Value::Number(n)) => n.to_string(),
		_ => return Err(HandshakeError::Profile { reason: format!("`{field}` is missing") }),
	};
	let external_id = ExternalId::new(&subject)
		.map_err(|e| HandshakeError::Profile { reason: e.to_string() })?;

	Ok(VerifiedProfile::new(external_id, provider.clone()).with_raw(value))
}
