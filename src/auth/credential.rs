//! API credential wrapper that redacts sensitive material.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Marker rendered in place of any secret value.
pub const REDACTED: &str = "<redacted>";
/// Scheme tag the remote API expects in front of API keys.
pub const AUTHORIZATION_SCHEME: &str = "ApiKey";

/// Redacted credential wrapper keeping the API key out of logs and serialized output.
///
/// `Debug`, `Display`, and `Serialize` only ever emit [`REDACTED`]. Deserialization accepts
/// the raw string so configuration loaders can hand the value over.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct Credential(String);
impl Credential {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Whether the secret is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}

	/// Normalizes the key into an `authorization` header value.
	///
	/// The [`AUTHORIZATION_SCHEME`] tag is prefixed unless it is already present in any
	/// letter case.
	pub fn authorization_value(&self) -> Credential {
		let trimmed = self.0.trim();

		match self.scheme_len() {
			Some(_) => Self(trimmed.to_owned()),
			None => Self(format!("{AUTHORIZATION_SCHEME} {trimmed}")),
		}
	}

	/// Bare key with surrounding whitespace and any [`AUTHORIZATION_SCHEME`] tag removed.
	pub fn key(&self) -> &str {
		let trimmed = self.0.trim();

		match self.scheme_len() {
			Some(len) => trimmed[len..].trim_start(),
			None => trimmed,
		}
	}

	fn scheme_len(&self) -> Option<usize> {
		let trimmed = self.0.trim();
		let len = AUTHORIZATION_SCHEME.len();

		(trimmed.get(..len).is_some_and(|head| head.eq_ignore_ascii_case(AUTHORIZATION_SCHEME))
			&& trimmed[len..].starts_with(' '))
		.then_some(len)
	}

	/// Short SHA-256 prefix that identifies the credential without revealing it.
	pub fn fingerprint(&self) -> String {
		let digest = Sha256::digest(self.0.as_bytes());
		let mut out = String::from("sha256:");

		for byte in &digest[..6] {
			out.push_str(&format!("{byte:02x}"));
		}

		out
	}
}
impl From<String> for Credential {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for Credential {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Credential").field(&REDACTED).finish()
	}
}
impl Display for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}
impl Serialize for Credential {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}
