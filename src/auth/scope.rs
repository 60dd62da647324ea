//! Ordered permission scopes requested from a provider.

// std
use std::slice::Iter;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError, ser::SerializeSeq};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Ordered, de-duplicated list of scopes.
///
/// Scopes keep the order the descriptor declared them in. Duplicates after the first
/// occurrence are dropped.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeList {
	scopes: Arc<[String]>,
}
impl ScopeList {
	/// Builds a scope list from any iterator, keeping first-seen order.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut ordered: Vec<String> = Vec::new();

		for scope in scopes {
			let owned: String = scope.into();

			if owned.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if owned.chars().any(char::is_whitespace) {
				return Err(ScopeValidationError::ContainsWhitespace { scope: owned });
			}
			if !ordered.contains(&owned) {
				ordered.push(owned);
			}
		}

		Ok(Self { scopes: Arc::from(ordered) })
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Returns true if the list contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.scopes.iter().any(|candidate| candidate == scope)
	}

	/// Iterator over scopes in request order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.scopes.iter().map(|s| s.as_str())
	}

	/// Returns a new list with `extra` appended after the existing scopes.
	pub fn extended<I, S>(&self, extra: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(self.scopes.iter().cloned().chain(extra.into_iter().map(Into::into)))
	}

	/// Joins the scopes with the provider's delimiter, or `None` when empty.
	pub fn join(&self, delimiter: char) -> Option<String> {
		if self.scopes.is_empty() {
			return None;
		}

		let mut buf = String::new();

		for (idx, value) in self.scopes.iter().enumerate() {
			if idx > 0 {
				buf.push(delimiter);
			}

			buf.push_str(value);
		}

		Some(buf)
	}

	/// Returns the underlying slice of scope strings.
	pub fn as_slice(&self) -> &[String] {
		&self.scopes
	}
}
impl Debug for ScopeList {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeList").field(&self.scopes).finish()
	}
}
impl Display for ScopeList {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.join(' ').unwrap_or_default())
	}
}

/// Iterator over scope strings.
pub struct ScopeIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for ScopeIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}
impl<'a> IntoIterator for &'a ScopeList {
	type IntoIter = ScopeIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		ScopeIter { inner: self.scopes.iter() }
	}
}
impl FromStr for ScopeList {
	type Err = ScopeValidationError;

	/// Parses a space- or comma-delimited scope string.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}
		if s.chars().all(|ch| ch.is_whitespace() || ch == ',') {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(s.split(|ch: char| ch.is_whitespace() || ch == ',').filter(|v| !v.is_empty()))
	}
}
impl Serialize for ScopeList {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.scopes.len()))?;

		for scope in self.scopes.iter() {
			seq.serialize_element(scope)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ScopeList {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		ScopeList::new(values).map_err(DeError::custom)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_keep_declaration_order_and_drop_duplicates() {
		let scopes = ScopeList::new(["openid", "profile", "email", "profile"])
			.expect("Scope list should be valid.");

		assert_eq!(scopes.iter().collect::<Vec<_>>(), vec!["openid", "profile", "email"]);
		assert_eq!(scopes.join(' '), Some("openid profile email".into()));
		assert_eq!(scopes.join(','), Some("openid,profile,email".into()));
	}

	#[test]
	fn scopes_reject_whitespace_padding() {
		let err = ScopeList::new([" profile "]).expect_err("Padded scopes must be rejected.");

		assert!(matches!(err, ScopeValidationError::ContainsWhitespace { .. }));
		assert!(ScopeList::new([""]).is_err());
		assert!(ScopeList::from_str("").is_ok(), "Empty string represents an empty list.");
		assert!(ScopeList::from_str(" , ").is_err(), "Separator-only input must be rejected.");
	}

	#[test]
	fn query_scopes_extend_the_declared_list() {
		let declared = ScopeList::new(["email"]).expect("Declared scopes should be valid.");
		let requested =
			ScopeList::from_str("user_friends,email").expect("Query scopes should parse.");
		let merged = declared
			.extended(requested.iter().map(str::to_owned))
			.expect("Merged scopes should be valid.");

		assert_eq!(merged.as_slice(), ["email".to_string(), "user_friends".to_string()]);
		assert!(ScopeList::default().join(' ').is_none());
	}
}
