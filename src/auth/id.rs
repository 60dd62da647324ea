//! Strongly typed identifiers for providers and the external accounts they vouch for.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $validate:path) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				$validate($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				$validate($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const PROVIDER_ID_MAX_LEN: usize = 64;
const EXTERNAL_ID_MAX_LEN: usize = 255;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (provider, external).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (provider, external).
		kind: &'static str,
	},
	/// The identifier contains a character that cannot appear in a route segment.
	#[error("{kind} identifier contains the reserved character {ch:?}.")]
	ReservedCharacter {
		/// Kind of identifier (provider, external).
		kind: &'static str,
		/// Offending character.
		ch: char,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (provider, external).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { ProviderId, "Unique key of a provider descriptor; also its route segment.", "Provider", validate_provider }
def_id! { ExternalId, "Subject identifier issued by a third-party identity provider.", "External", validate_external }

fn validate_provider(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	validate_common(kind, view, PROVIDER_ID_MAX_LEN)?;

	if let Some(ch) = view.chars().find(|ch| matches!(ch, '/' | '?' | '#' | '{' | '}' | ',' | ':' | '*')) {
		return Err(IdentifierError::ReservedCharacter { kind, ch });
	}

	Ok(())
}

fn validate_external(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	validate_common(kind, view, EXTERNAL_ID_MAX_LEN)
}

fn validate_common(kind: &'static str, view: &str, max: usize) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > max {
		return Err(IdentifierError::TooLong { kind, max });
	}

	Ok(())
}
