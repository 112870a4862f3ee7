//! Strongly typed identifiers used by the gate, the registry, and audit entries.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

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
				validate_view($kind, &value)?;

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

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (project, session, operation).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (project, session, operation).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (project, session, operation).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { ProjectId, "Identifier of a remote project, as used by the allow-list.", "Project" }
def_id! { SessionId, "Identifier correlating every audit entry emitted by one process.", "Session" }
def_id! { OperationName, "Registered name of a gated operation.", "Operation" }

impl SessionId {
	/// Generates a random 128-bit session identifier rendered as hex.
	pub fn generate() -> Self {
		Self(format!("{:032x}", rand::random::<u128>()))
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_whitespace_and_empty() {
		assert!(ProjectId::new(" p1").is_err(), "Leading whitespace must be rejected.");
		assert!(ProjectId::new("p1 ").is_err(), "Trailing whitespace must be rejected.");
		assert!(OperationName::new("").is_err());

		let project = ProjectId::new("3675b69e-8324-4110-bdca-059031aa8da3")
			.expect("Project fixture should be considered valid.");

		assert_eq!(project.as_ref(), "3675b69e-8324-4110-bdca-059031aa8da3");
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let project: ProjectId =
			serde_json::from_str("\"p-42\"").expect("Project payload should deserialize.");

		assert_eq!(project.as_ref(), "p-42");
		assert!(serde_json::from_str::<ProjectId>("\"p 42\"").is_err());
	}

	#[test]
	fn generated_sessions_are_distinct_and_valid() {
		let first = SessionId::generate();
		let second = SessionId::generate();

		assert_ne!(first, second);
		assert_eq!(first.len(), 32);
		assert!(SessionId::new(first.as_ref()).is_ok());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let set = BTreeSet::from_iter([ProjectId::new("p1").expect("Project should be valid.")]);

		assert!(set.contains("p1"));
		assert!(!set.contains("p2"));
	}
}
