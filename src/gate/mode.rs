// self
use crate::{_prelude::*, gate::GateError};

/// Process-wide ceiling on what operations may do, ordered from least to most permissive.
#[derive(
	Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SafetyMode {
	/// Reads only.
	#[default]
	#[serde(alias = "read_only")]
	ReadOnly,
	/// Reads plus non-destructive writes.
	#[serde(alias = "write_idempotent")]
	WriteIdempotent,
	/// Everything, including deletes.
	#[serde(alias = "write_destructive")]
	WriteDestructive,
}
impl SafetyMode {
	/// Every mode in ascending order.
	pub const ALL: [Self; 3] = [Self::ReadOnly, Self::WriteIdempotent, Self::WriteDestructive];

	/// Canonical kebab-case label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::ReadOnly => "read-only",
			Self::WriteIdempotent => "write-idempotent",
			Self::WriteDestructive => "write-destructive",
		}
	}
}
impl Display for SafetyMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for SafetyMode {
	type Err = GateError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s.trim().to_ascii_lowercase().replace('_', "-");

		Self::ALL
			.into_iter()
			.find(|mode| mode.as_str() == normalized)
			.ok_or_else(|| GateError::UnknownSafetyMode { value: s.to_owned() })
	}
}
