// self
use crate::{
	_prelude::*,
	gate::{GateError, SafetyMode},
};

/// What an operation may do, fixed when the operation is defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
	/// Reads remote state only.
	ReadOnly,
	/// Writes that can be repeated safely and never remove data.
	WriteIdempotent,
	/// Writes that remove or irreversibly change data.
	WriteDestructive,
}
impl Capability {
	/// Every capability, least to most dangerous.
	pub const ALL: [Self; 3] = [Self::ReadOnly, Self::WriteIdempotent, Self::WriteDestructive];

	/// Canonical kebab-case label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::ReadOnly => "read-only",
			Self::WriteIdempotent => "write-idempotent",
			Self::WriteDestructive => "write-destructive",
		}
	}

	/// Flag view used on the agent-tool surface.
	pub const fn annotation(self) -> Annotation {
		match self {
			Self::ReadOnly => Annotation { read_only: true, destructive: false, idempotent: true },
			Self::WriteIdempotent =>
				Annotation { read_only: false, destructive: false, idempotent: true },
			Self::WriteDestructive =>
				Annotation { read_only: false, destructive: true, idempotent: false },
		}
	}

	/// Whether the operation only reads.
	pub const fn is_read_only(self) -> bool {
		matches!(self, Self::ReadOnly)
	}

	/// Whether the operation may remove data.
	pub const fn is_destructive(self) -> bool {
		matches!(self, Self::WriteDestructive)
	}

	/// Lowest safety mode that admits this capability.
	pub const fn required_mode(self) -> SafetyMode {
		match self {
			Self::ReadOnly => SafetyMode::ReadOnly,
			Self::WriteIdempotent => SafetyMode::WriteIdempotent,
			Self::WriteDestructive => SafetyMode::WriteDestructive,
		}
	}
}
impl Display for Capability {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl TryFrom<Annotation> for Capability {
	type Error = GateError;

	fn try_from(annotation: Annotation) -> Result<Self, Self::Error> {
		match annotation {
			Annotation { read_only: true, destructive: false, .. } => Ok(Self::ReadOnly),
			Annotation { read_only: false, destructive: false, idempotent: true } =>
				Ok(Self::WriteIdempotent),
			Annotation { read_only: false, destructive: true, idempotent: false } =>
				Ok(Self::WriteDestructive),
			annotation => Err(GateError::UnsupportedAnnotation { annotation }),
		}
	}
}

/// Independent capability flags as exposed to agent tooling.
///
/// Only three combinations are meaningful; convert through [`Capability`] to reject the rest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
	/// Operation does not modify remote state.
	pub read_only: bool,
	/// Operation may remove data.
	pub destructive: bool,
	/// Repeating the operation has no additional effect.
	pub idempotent: bool,
}
impl From<Capability> for Annotation {
	fn from(capability: Capability) -> Self {
		capability.annotation()
	}
}
