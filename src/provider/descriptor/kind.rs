// self
use crate::_prelude::*;

/// Handshake families the gateway knows how to mount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeKind {
	/// Browser is redirected through the provider's consent page.
	Redirect,
	/// Client already holds a provider token and exchanges it directly.
	Token,
}
impl HandshakeKind {
	/// Returns a stable label suitable for logs.
	pub fn as_str(self) -> &'static str {
		match self {
			HandshakeKind::Redirect => "redirect",
			HandshakeKind::Token => "token",
		}
	}
}
impl Display for HandshakeKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// HTTP verb a provider route is mounted with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteMethod {
	#[default]
	/// Parameters arrive in the query string.
	Get,
	/// Parameters arrive in a form-encoded (or JSON) body.
	Post,
}
impl RouteMethod {
	/// Returns the HTTP method name.
	pub fn as_str(self) -> &'static str {
		match self {
			RouteMethod::Get => "GET",
			RouteMethod::Post => "POST",
		}
	}
}
impl Display for RouteMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
