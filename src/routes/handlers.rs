// crates.io
use axum::{
	Json,
	body::Body,
	extract::State,
	http::{
		HeaderMap, HeaderValue, Method, StatusCode,
		header::{CONTENT_TYPE, USER_AGENT},
	},
	response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
// self
use crate::{
	_prelude::*,
	completion::Completion,
	obs::{CorrelationId, HandshakeSpan, HandshakeStage},
	provider::{HandshakeRequest, HandshakeState, RequestContext},
	routes::{BRIDGE_HEADER, HandshakeInput, ProviderBinding},
};

const HANDSHAKE_COOKIE_TTL_MINUTES: i64 = 10;

type Binding = State<Arc<ProviderBinding>>;

/// Entry route of Redirect-kind providers.
pub(super) async fn begin(
	State(binding): Binding,
	method: Method,
	headers: HeaderMap,
	jar: CookieJar,
	HandshakeInput(params): HandshakeInput,
) -> Response {
	let correlation = CorrelationId::from_headers(&headers);
	let span = HandshakeSpan::new(&binding.descriptor.id, HandshakeStage::Begin, &correlation);

	span.instrument(async move {
		let request = binding.request(&method, &headers, params, None, correlation);

		match binding.strategy.begin(&request).await {
			Ok(start) => {
				let jar = match &start.state {
					Some(state) => jar.add(binding.handshake_cookie(state)),
					None => jar,
				};

				tracing::info!(correlation_id = %request.correlation, "Redirecting to the provider.");

				(jar, Redirect::to(start.location.as_str())).into_response()
			},
			Err(e) => {
				tracing::warn!(
					correlation_id = %request.correlation,
					error = %e,
					"Handshake could not start."
				);

				binding.completion.render_redirect(jar, Completion::HandshakeFailed)
			},
		}
	})
	.await
}

/// Completion route of Redirect-kind providers.
pub(super) async fn callback(
	State(binding): Binding,
	method: Method,
	headers: HeaderMap,
	jar: CookieJar,
	HandshakeInput(params): HandshakeInput,
) -> Response {
	let correlation = CorrelationId::from_headers(&headers);
	let span = HandshakeSpan::new(&binding.descriptor.id, HandshakeStage::Complete, &correlation);

	span.instrument(async move {
		let bridged = headers.get(BRIDGE_HEADER).is_some_and(|value| value == "1");
		let state = jar.get(&binding.handshake_cookie_name).and_then(|c| HandshakeState::decode(c.value()));
		let jar = jar.remove(Cookie::build(binding.handshake_cookie_name.clone()).path("/"));
		let request = binding.request(&method, &headers, params, state, correlation);
		let provider = &binding.descriptor.id;
		let handshake = binding.strategy.complete(&request).await;

		if bridged {
			binding.completion.token(provider, handshake, &request.correlation).await
		} else {
			binding.completion.redirect(jar, provider, handshake, &request.correlation).await
		}
	})
	.await
}

/// Entry (and optional completion) route of Token-kind providers.
pub(super) async fn token(
	State(binding): Binding,
	method: Method,
	headers: HeaderMap,
	HandshakeInput(params): HandshakeInput,
) -> Response {
	let correlation = CorrelationId::from_headers(&headers);
	let span = HandshakeSpan::new(&binding.descriptor.id, HandshakeStage::Token, &correlation);

	span.instrument(async move {
		let request = binding.request(&method, &headers, params, None, correlation);
		let handshake = binding.strategy.complete(&request).await;

		binding.completion.token(&binding.descriptor.id, handshake, &request.correlation).await
	})
	.await
}

/// Replays a client-held token through the provider's own completion route.
pub(super) async fn bridge(
	State(binding): Binding,
	headers: HeaderMap,
	HandshakeInput(params): HandshakeInput,
) -> Response {
	let correlation = CorrelationId::from_headers(&headers);
	let span = HandshakeSpan::new(&binding.descriptor.id, HandshakeStage::Bridge, &correlation);

	span.instrument(async move {
		let Some(target) = binding.bridge_target.clone() else {
			return StatusCode::NOT_FOUND.into_response();
		};
		let mut forwarded = HeaderMap::new();

		forwarded.insert(BRIDGE_HEADER, HeaderValue::from_static("1"));

		for (name, value) in headers.iter() {
			if matches!(name.as_str(), "cf-ray" | "x-request-id" | "user-agent" | "x-forwarded-for") {
				forwarded.insert(name.clone(), value.clone());
			}
		}

		match binding.http.post_form("bridged callback", target, &params, forwarded).await {
			Ok(upstream) => {
				let status = upstream.status();
				let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
				let mut response = Body::from_stream(upstream.bytes_stream()).into_response();

				*response.status_mut() = status;

				if let Some(content_type) = content_type {
					response.headers_mut().insert(CONTENT_TYPE, content_type);
				}

				response
			},
			Err(e) => {
				tracing::error!(
					correlation_id = %correlation,
					error = %e,
					"Bridged callback failed."
				);

				(StatusCode::BAD_GATEWAY, Json(json!({ "status": "false" }))).into_response()
			},
		}
	})
	.await
}

impl ProviderBinding {
	fn request(
		&self,
		method: &Method,
		headers: &HeaderMap,
		params: BTreeMap<String, String>,
		state: Option<HandshakeState>,
		correlation: CorrelationId,
	) -> HandshakeRequest {
		let context = self.descriptor.quirks.pass_request_context.then(|| RequestContext {
			method: method.as_str().to_owned(),
			user_agent: header_string(headers, USER_AGENT.as_str()),
			forwarded_for: header_string(headers, "x-forwarded-for"),
		});

		HandshakeRequest {
			provider: self.descriptor.identity_provider.clone(),
			params,
			state,
			context,
			correlation,
		}
	}

	fn handshake_cookie(&self, state: &HandshakeState) -> Cookie<'static> {
		Cookie::build((self.handshake_cookie_name.clone(), state.encode()))
			.path("/")
			.http_only(true)
			.secure(self.secure_cookie)
			.same_site(SameSite::Lax)
			.max_age(time::Duration::minutes(HANDSHAKE_COOKIE_TTL_MINUTES))
			.build()
	}
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
	headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_owned)
}
