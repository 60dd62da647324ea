//! Identity-service bridge.
//!
//! The identity service maps an external `(provider, externalId)` pair to an internal
//! identity. The gateway talks to it through a single JSON-RPC `createIdentity` call and
//! folds every failure (transport, timeout, malformed body, explicit error) into
//! [`IdentityOutcome::Error`]. Calls are never retried.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::VerifiedProfile,
	config::IdentityServiceConfig,
	error::{ConfigError, TransportError},
	http::GatewayHttpClient,
	obs::CorrelationId,
};

/// Result code meaning the external account is already linked.
pub const ALREADY_REGISTERED_CODE: i64 = 1101;

const TARGET: &str = "identity service";

/// Boxed future returned by [`IdentityService::create_identity`].
pub type IdentityFuture<'a> = Pin<Box<dyn Future<Output = IdentityOutcome> + 'a + Send>>;

/// Downstream system of record for identities.
pub trait IdentityService: Send + Sync {
	/// Forwards a verified external identity and reports exactly one outcome.
	fn create_identity<'a>(
		&'a self,
		profile: &'a VerifiedProfile,
		correlation: &'a CorrelationId,
	) -> IdentityFuture<'a>;
}

/// Exclusive outcome of one identity call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityOutcome {
	/// Identity created or resolved.
	Success {
		/// Opaque identity token.
		identity_token: String,
		/// Provider name echoed by the service.
		provider: String,
	},
	/// User must finish registration before signing in.
	PendingRegistration {
		/// Opaque continuation token.
		state: String,
		/// Identity token, when the service already issued one.
		identity: Option<String>,
		/// Provider name, when the service echoed one.
		provider: Option<String>,
	},
	/// External account is already linked to another identity.
	AlreadyRegistered,
	/// Service rejected or failed the call.
	Error {
		/// Description suitable for logs and the error JSON body.
		message: String,
	},
}

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
	jsonrpc: &'static str,
	id: u64,
	method: &'static str,
	params: CreateIdentityParams<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateIdentityParams<'a> {
	identity: &'a str,
	provider: &'a str,
	secure_key: &'a str,
}

/// JSON-RPC response envelope as sent by the identity service.
#[derive(Debug, Default, Deserialize)]
pub struct RpcResponse {
	/// Successful payload.
	#[serde(default)]
	pub result: Option<RpcResult>,
	/// Explicit error object.
	#[serde(default)]
	pub error: Option<RpcError>,
}

/// `result` object of a `createIdentity` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcResult {
	/// Status code; [`ALREADY_REGISTERED_CODE`] marks linked accounts.
	#[serde(default)]
	pub code: Option<i64>,
	/// Registration continuation token.
	#[serde(default)]
	pub current_state: Option<String>,
	/// Whether an identity was issued.
	#[serde(default)]
	pub success: Option<bool>,
	/// Issued identity token.
	#[serde(default)]
	pub identity: Option<String>,
	/// Provider name echoed by the service.
	#[serde(default)]
	pub provider: Option<String>,
}

/// `error` object of a JSON-RPC response.
#[derive(Debug, Default, Deserialize)]
pub struct RpcError {
	/// Error code.
	#[serde(default)]
	pub code: Option<i64>,
	/// Human-readable message.
	#[serde(default)]
	pub message: Option<String>,
	/// Additional error data.
	#[serde(default)]
	pub data: Option<Value>,
}

impl RpcResponse {
	/// Classifies the response into exactly one [`IdentityOutcome`].
	pub fn into_outcome(self) -> IdentityOutcome {
		if let Some(error) = self.error {
			let message = error.message.unwrap_or_else(|| match error.code {
				Some(code) => format!("Identity service returned error code {code}."),
				None => "Identity service returned an error.".into(),
			});

			return IdentityOutcome::Error { message };
		}

		let Some(result) = self.result else {
			return IdentityOutcome::Error {
				message: "Identity service response carried neither result nor error.".into(),
			};
		};

		if result.code == Some(ALREADY_REGISTERED_CODE) {
			return IdentityOutcome::AlreadyRegistered;
		}
		if let Some(state) = non_empty(result.current_state) {
			return IdentityOutcome::PendingRegistration {
				state,
				identity: non_empty(result.identity),
				provider: non_empty(result.provider),
			};
		}

		match (result.success, non_empty(result.identity)) {
			(Some(true), Some(identity_token)) => IdentityOutcome::Success {
				identity_token,
				provider: non_empty(result.provider).unwrap_or_default(),
			},
			(Some(true), None) => IdentityOutcome::Error {
				message: "Identity service reported success without an identity.".into(),
			},
			_ => IdentityOutcome::Error {
				message: match result.code {
					Some(code) => format!("Identity service declined with code {code}."),
					None => "Identity service declined the identity.".into(),
				},
			},
		}
	}
}

/// JSON-RPC client for the identity service.
#[derive(Clone)]
pub struct JsonRpcIdentityBridge {
	http: GatewayHttpClient,
	endpoint: Url,
	secure_key: String,
}
impl JsonRpcIdentityBridge {
	/// Creates a bridge with its own HTTP client.
	pub fn new(config: &IdentityServiceConfig) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(config, GatewayHttpClient::new(config.timeout)?))
	}

	/// Creates a bridge sharing an existing HTTP client.
	pub fn with_http_client(config: &IdentityServiceConfig, http: GatewayHttpClient) -> Self {
		Self { http, endpoint: config.endpoint.clone(), secure_key: config.secure_key.clone() }
	}

	async fn call(&self, profile: &VerifiedProfile) -> Result<RpcResponse> {
		let request = RpcRequest {
			jsonrpc: "2.0",
			id: 1,
			method: "createIdentity",
			params: CreateIdentityParams {
				identity: profile.external_id.as_ref(),
				provider: profile.provider.as_ref(),
				secure_key: &self.secure_key,
			},
		};
		let response = self.http.post_json(TARGET, self.endpoint.clone(), &request).await?;
		let status = response.status().as_u16();
		let body = response.bytes().await.map_err(|e| TransportError::from_reqwest(TARGET, e))?;
		let mut deserializer = serde_json::Deserializer::from_slice(&body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::MalformedResponse { source, status: Some(status) })
	}
}
impl Debug for JsonRpcIdentityBridge {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JsonRpcIdentityBridge")
			.field("endpoint", &self.endpoint.as_str())
			.field("secure_key_set", &!self.secure_key.is_empty())
			.finish()
	}
}
impl IdentityService for JsonRpcIdentityBridge {
	fn create_identity<'a>(
		&'a self,
		profile: &'a VerifiedProfile,
		correlation: &'a CorrelationId,
	) -> IdentityFuture<'a> {
		Box::pin(async move {
			match self.call(profile).await {
				Ok(response) => response.into_outcome(),
				Err(e) => {
					tracing::error!(
						correlation_id = %correlation,
						provider = %profile.provider,
						error = %e,
						"Identity service call failed."
					);

					IdentityOutcome::Error { message: e.to_string() }
				},
			}
		})
	}
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn classify(raw: &str) -> IdentityOutcome {
		serde_json::from_str::<RpcResponse>(raw)
			.expect("Fixture response should deserialize.")
			.into_outcome()
	}

	#[test]
	fn already_registered_wins_over_other_result_fields() {
		assert_eq!(
			classify(r#"{"result":{"code":1101,"currentState":"x","success":true,"identity":"i"}}"#),
			IdentityOutcome::AlreadyRegistered
		);
	}

	#[test]
	fn pending_registration_is_exclusive_and_keeps_optional_identity() {
		assert_eq!(
			classify(r#"{"result":{"code":1,"currentState":"verify","success":true,"identity":"i1","provider":"google"}}"#),
			IdentityOutcome::PendingRegistration {
				state: "verify".into(),
				identity: Some("i1".into()),
				provider: Some("google".into()),
			}
		);
		assert_eq!(
			classify(r#"{"result":{"currentState":"verify"}}"#),
			IdentityOutcome::PendingRegistration { state: "verify".into(), identity: None, provider: None }
		);
	}

	#[test]
	fn success_needs_an_identity() {
		assert_eq!(
			classify(r#"{"jsonrpc":"2.0","id":1,"result":{"success":true,"identity":"tok","provider":"facebook"}}"#),
			IdentityOutcome::Success { identity_token: "tok".into(), provider: "facebook".into() }
		);
		assert!(matches!(
			classify(r#"{"result":{"success":true}}"#),
			IdentityOutcome::Error { .. }
		));
	}

	#[test]
	fn top_level_error_is_always_an_error() {
		assert_eq!(
			classify(r#"{"error":{"code":1101,"message":"Invalid secure key"}}"#),
			IdentityOutcome::Error { message: "Invalid secure key".into() }
		);
		assert!(matches!(classify("{}"), IdentityOutcome::Error { .. }));
	}

	#[test]
	fn request_envelope_matches_the_rpc_contract() {
		let request = RpcRequest {
			jsonrpc: "2.0",
			id: 1,
			method: "createIdentity",
			params: CreateIdentityParams { identity: "42", provider: "apple", secure_key: "k" },
		};

		assert_eq!(
			serde_json::to_value(&request).expect("Envelope should serialize."),
			serde_json::json!({
				"jsonrpc": "2.0",
				"id": 1,
				"method": "createIdentity",
				"params": { "identity": "42", "provider": "apple", "secureKey": "k" }
			})
		);
	}
}
