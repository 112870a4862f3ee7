//! Capability gate: safety-mode authorization, project allow-listing, and dry-run decisions.
//!
//! The gate is pure. It never touches the network and never runs handlers; callers feed it
//! the effective [`SafetyMode`], the operation's fixed [`Capability`], the allow-list, and the
//! project identifiers extracted from the call's arguments, and act on the [`Decision`].

/// Project allow-list.
pub mod allowlist;
pub mod args;
/// Operation capabilities and their annotation flags.
pub mod capability;
/// Safety modes.
pub mod mode;

pub use allowlist::*;
pub use args::*;
pub use capability::*;
pub use mode::*;

// self
use crate::_prelude::*;

/// Misuse of the gate's inputs.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum GateError {
	/// Safety-mode text did not match any known mode.
	#[error("Unknown safety mode `{value}`.")]
	UnknownSafetyMode {
		/// Raw text that failed to parse.
		value: String,
	},
	/// Annotation flags do not describe one of the supported capabilities.
	#[error("Unsupported capability annotation {annotation:?}.")]
	UnsupportedAnnotation {
		/// Offending flag combination.
		annotation: Annotation,
	},
	/// Two operations were registered under the same name.
	#[error("Operation `{name}` is already registered.")]
	DuplicateOperation {
		/// Conflicting name.
		name: String,
	},
	/// No operation is registered under the requested name.
	#[error("Operation `{name}` is not registered.")]
	UnknownOperation {
		/// Requested name.
		name: String,
	},
}

/// Why the gate refused a call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockReason {
	/// The effective safety mode does not permit the operation's capability.
	SafetyMode {
		/// Effective mode for the call.
		mode: SafetyMode,
		/// Capability of the refused operation.
		capability: Capability,
	},
	/// An extracted project identifier is not on the allow-list.
	ProjectNotAllowed {
		/// First offending identifier.
		project_id: String,
	},
}
impl Display for BlockReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::SafetyMode { mode, capability } => write!(
				f,
				"Operation is {capability} and requires safety mode {} or higher; current mode is {mode}.",
				capability.required_mode(),
			),
			Self::ProjectNotAllowed { project_id } =>
				write!(f, "Project {project_id} is not in the allowed projects list."),
		}
	}
}

/// Outcome of evaluating one call against the gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
	/// Run the handler.
	Proceed,
	/// Answer with a simulated result; the handler must not run.
	DryRun,
	/// Refuse the call.
	Blocked(BlockReason),
}

/// Whether `mode` permits an operation with `capability`.
///
/// - `ReadOnly` admits read-only operations only.
/// - `WriteIdempotent` admits anything read-only or non-destructive.
/// - `WriteDestructive` admits everything.
///
/// Monotonic: a capability allowed under a mode stays allowed under every higher mode.
pub fn is_allowed(mode: SafetyMode, capability: Capability) -> bool {
	let annotation = capability.annotation();

	match mode {
		SafetyMode::ReadOnly => annotation.read_only,
		SafetyMode::WriteIdempotent => annotation.read_only || !annotation.destructive,
		SafetyMode::WriteDestructive => true,
	}
}

/// Evaluates mode, allow-list, then dry-run, in that order.
pub fn decide(
	mode: SafetyMode,
	capability: Capability,
	allowed: &AllowedProjects,
	project_ids: &[String],
	dry_run: bool,
) -> Decision {
	if !is_allowed(mode, capability) {
		return Decision::Blocked(BlockReason::SafetyMode { mode, capability });
	}
	if let Some(project_id) = allowed.first_disallowed(project_ids) {
		return Decision::Blocked(BlockReason::ProjectNotAllowed { project_id: project_id.into() });
	}
	if dry_run && !capability.is_read_only() {
		return Decision::DryRun;
	}

	Decision::Proceed
}
