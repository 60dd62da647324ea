//! Outbound HTTP shared by the identity bridge, provider strategies, and the bridging route.
//!
//! [`GatewayHttpClient`] is the gateway's only dependency on an HTTP stack. It never
//! follows redirects (token and profile endpoints answer directly) and applies one
//! per-call timeout, which is how identity-service calls inherit their deadline.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use reqwest::{Response, header::HeaderMap, redirect::Policy};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Debug)]
pub struct GatewayHttpClient(ReqwestClient);
impl GatewayHttpClient {
	/// Builds a client with the given per-call timeout and redirects disabled.
	pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(Policy::none())
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	///
	/// Configure custom clients to disable redirect following.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// POSTs a JSON body.
	pub async fn post_json<T>(
		&self,
		target: &'static str,
		url: Url,
		body: &T,
	) -> Result<Response, TransportError>
	where
		T: ?Sized + Serialize,
	{
		self.0.post(url).json(body).send().await.map_err(|e| TransportError::from_reqwest(target, e))
	}

	/// POSTs an `application/x-www-form-urlencoded` body with extra headers.
	pub async fn post_form(
		&self,
		target: &'static str,
		url: Url,
		params: &BTreeMap<String, String>,
		headers: HeaderMap,
	) -> Result<Response, TransportError> {
		self.0
			.post(url)
			.headers(headers)
			.form(params)
			.send()
			.await
			.map_err(|e| TransportError::from_reqwest(target, e))
	}

	/// GETs `url` with a bearer token.
	pub async fn get_bearer(
		&self,
		target: &'static str,
		url: Url,
		token: &str,
	) -> Result<Response, TransportError> {
		self.0
			.get(url)
			.bearer_auth(token)
			.send()
			.await
			.map_err(|e| TransportError::from_reqwest(target, e))
	}
}
impl AsRef<ReqwestClient> for GatewayHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for GatewayHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl<'c> AsyncHttpClient<'c> for GatewayHttpClient {
	type Error = HttpClientError<ReqwestError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
