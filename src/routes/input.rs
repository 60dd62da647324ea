// crates.io
use axum::{
	Json,
	body::Bytes,
	extract::{FromRequest, Request},
	http::{Method, StatusCode, header::CONTENT_TYPE},
	response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use url::form_urlencoded;
// self
use crate::_prelude::*;

/// Handshake parameters merged from the query string and the request body.
///
/// Bodies may be form-encoded or JSON objects; body values win over query values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HandshakeInput(pub BTreeMap<String, String>);
impl<S> FromRequest<S> for HandshakeInput
where
	S: Send + Sync,
{
	type Rejection = Response;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let mut params = req.uri().query().map(parse_form).unwrap_or_default();

		if matches!(*req.method(), Method::GET | Method::HEAD) {
			return Ok(Self(params));
		}

		let is_json = req
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.is_some_and(|value| value.starts_with("application/json"));
		let body = Bytes::from_request(req, state).await.map_err(IntoResponse::into_response)?;

		if body.is_empty() {
			return Ok(Self(params));
		}
		if is_json {
			let object = serde_json::from_slice::<Map<String, Value>>(&body).map_err(|_| {
				(StatusCode::BAD_REQUEST, Json(json!({ "status": "false" }))).into_response()
			})?;

			params.extend(object.into_iter().filter_map(|(key, value)| {
				let value = match value {
					Value::Null => return None,
					Value::String(s) => s,
					other => other.to_string(),
				};

				Some((key, value))
			}));
		} else {
			params.extend(parse_form(&body));
		}

		Ok(Self(params))
	}
}

fn parse_form(raw: impl AsRef<[u8]>) -> BTreeMap<String, String> {
	form_urlencoded::parse(raw.as_ref()).into_owned().collect()
}
