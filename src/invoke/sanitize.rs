//! One-line, secret-free error text for front ends.

// self
use crate::{_prelude::*, auth::{Credential, REDACTED}};

/// Longest message handed back to a caller, in characters.
pub const MAX_MESSAGE_CHARS: usize = 300;

/// Renders errors as short single lines with registered secrets scrubbed.
#[derive(Clone, Default)]
pub struct Sanitizer {
	secrets: Vec<String>,
}
impl Sanitizer {
	/// Registers a literal secret to scrub; blank values are ignored.
	pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
		let secret = secret.into();

		if !secret.trim().is_empty() && !self.secrets.contains(&secret) {
			self.secrets.push(secret);
		}

		self
	}

	/// Registers a credential in its header, configured, and bare-key forms.
	pub fn with_credential(self, credential: &Credential) -> Self {
		self.with_secret(credential.authorization_value().expose())
			.with_secret(credential.expose().trim())
			.with_secret(credential.key())
	}

	/// Short description of `err` by kind.
	pub fn describe(&self, err: &Error) -> String {
		let text = match err {
			Error::Api(e) => format!("API error {}: {}", e.status, e.payload),
			Error::RateLimited(e) => match e.retry_after {
				Some(wait) => format!(
					"Rate limited by the remote API; retry after {}s.",
					wait.as_secs()
				),
				None => "Rate limited by the remote API; retry later.".into(),
			},
			Error::Network(e) => e.kind.describe().into(),
			Error::Decode(e) => format!("Unexpected response from the remote API (status {}).", e.status),
			Error::Config(e) => format!("Configuration error: {e}"),
			Error::Gate(e) => e.to_string(),
			Error::Limiter(e) => e.to_string(),
			Error::InvalidArguments { reason } => format!("Invalid arguments: {reason}."),
		};

		self.clean(&text)
	}

	/// Scrubs secrets, collapses whitespace to single spaces, and truncates.
	pub fn clean(&self, text: &str) -> String {
		let mut scrubbed = text.to_owned();

		// Longest first so a header value is replaced before the bare key inside it.
		let mut secrets = self.secrets.iter().collect::<Vec<_>>();

		secrets.sort_by_key(|secret| std::cmp::Reverse(secret.len()));

		for secret in secrets {
			scrubbed = scrubbed.replace(secret.as_str(), REDACTED);
		}

		let single_line = scrubbed.split_whitespace().collect::<Vec<_>>().join(" ");

		if single_line.chars().count() <= MAX_MESSAGE_CHARS {
			return single_line;
		}

		let mut truncated =
			single_line.chars().take(MAX_MESSAGE_CHARS.saturating_sub(3)).collect::<String>();

		truncated.push_str("...");

		truncated
	}
}
impl Debug for Sanitizer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Sanitizer").field("secrets", &self.secrets.len()).finish()
	}
}
