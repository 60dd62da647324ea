// crates.io
use axum::http::HeaderMap;
// self
use crate::_prelude::*;

/// Headers consulted, in order, for an inbound correlation identifier.
pub const CORRELATION_HEADERS: [&str; 2] = ["cf-ray", "x-request-id"];

const MISSING: &str = "-";

/// Per-request identifier used to group the log lines of one request.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);
impl CorrelationId {
	/// Reads the identifier from the first populated correlation header, or `-`.
	pub fn from_headers(headers: &HeaderMap) -> Self {
		CORRELATION_HEADERS
			.iter()
			.filter_map(|name| headers.get(*name))
			.filter_map(|value| value.to_str().ok())
			.map(str::trim)
			.find(|value| !value.is_empty())
			.map(|value| Self(value.to_owned()))
			.unwrap_or_else(Self::missing)
	}

	/// Placeholder used when the request carried no identifier.
	pub fn missing() -> Self {
		Self(MISSING.into())
	}

	/// Borrowed view of the identifier.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for CorrelationId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "CorrelationId({})", self.0)
	}
}
impl Display for CorrelationId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use axum::http::HeaderValue;
	// self
	use super::*;

	#[test]
	fn cf_ray_wins_over_request_id() {
		let mut headers = HeaderMap::new();

		headers.insert("x-request-id", HeaderValue::from_static("req-1"));
		headers.insert("cf-ray", HeaderValue::from_static("8c1f-AMS"));

		assert_eq!(CorrelationId::from_headers(&headers).as_str(), "8c1f-AMS");
	}

	#[test]
	fn missing_headers_fall_back_to_dash() {
		let mut headers = HeaderMap::new();

		assert_eq!(CorrelationId::from_headers(&headers).as_str(), "-");

		headers.insert("cf-ray", HeaderValue::from_static("  "));
		headers.insert("x-request-id", HeaderValue::from_static("req-2"));

		assert_eq!(CorrelationId::from_headers(&headers).as_str(), "req-2");
	}
}
