//! Gate configuration values and safety-mode resolution.
//!
//! Nothing here reads files or the environment. Callers hand over raw text through
//! [`GateSettings`] (or build a [`GateConfig`] directly) and pass the result to each
//! [`crate::invoke::Invoker`], so independent configurations coexist in one process.

// self
use crate::{
	_prelude::*,
	auth::{Credential, SessionId},
	error::ConfigError,
	gate::{AllowedProjects, SafetyMode},
	obs,
};

/// How unrecognized safety-mode text is treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownModePolicy {
	/// Treat the value as [`SafetyMode::WriteDestructive`].
	#[default]
	FailOpen,
	/// Treat the value as [`SafetyMode::ReadOnly`].
	FailClosed,
}
impl UnknownModePolicy {
	/// Mode used when the text does not parse.
	pub const fn fallback(self) -> SafetyMode {
		match self {
			Self::FailOpen => SafetyMode::WriteDestructive,
			Self::FailClosed => SafetyMode::ReadOnly,
		}
	}
}

/// Turns configured text into a mode. Absent or blank text means [`SafetyMode::ReadOnly`].
pub fn resolve_mode(raw: Option<&str>, policy: UnknownModePolicy) -> SafetyMode {
	let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
		return SafetyMode::ReadOnly;
	};

	match raw.parse::<SafetyMode>() {
		Ok(mode) => mode,
		Err(_) => {
			let fallback = policy.fallback();

			obs::trace_unknown_mode(raw, fallback);

			fallback
		},
	}
}

/// Raw, deserializable gate settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GateSettings {
	/// Safety mode text, e.g. `write-idempotent`.
	pub safety_mode: Option<String>,
	/// Comma-separated project identifiers.
	pub allowed_projects: Option<String>,
	/// Whether write operations are simulated.
	pub dry_run: bool,
	/// Treatment of unrecognized safety-mode text.
	pub unknown_mode_policy: UnknownModePolicy,
	/// API key scrubbed from every surfaced error message.
	pub api_key: Option<Credential>,
}

/// Resolved gate configuration consumed by the invocation wrapper.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateConfig {
	/// Default mode for calls without an override.
	pub safety_mode: SafetyMode,
	/// Projects operations may touch.
	pub allowed_projects: AllowedProjects,
	/// Whether write operations are simulated.
	pub dry_run: bool,
	/// Session attached to every audit entry.
	pub session_id: SessionId,
	/// API key the invoker scrubs from error text.
	pub credential: Option<Credential>,
}
impl GateConfig {
	/// Read-only, unrestricted, live configuration with a fresh session id.
	pub fn new() -> Self {
		Self {
			safety_mode: SafetyMode::ReadOnly,
			allowed_projects: AllowedProjects::default(),
			dry_run: false,
			session_id: SessionId::generate(),
			credential: None,
		}
	}

	/// Resolves raw settings.
	pub fn from_settings(settings: &GateSettings) -> Result<Self, ConfigError> {
		let allowed_projects = match settings.allowed_projects.as_deref() {
			Some(raw) => raw.parse::<AllowedProjects>()?,
			None => AllowedProjects::default(),
		};

		let config = Self::new()
			.with_safety_mode(resolve_mode(
				settings.safety_mode.as_deref(),
				settings.unknown_mode_policy,
			))
			.with_allowed_projects(allowed_projects)
			.with_dry_run(settings.dry_run);

		Ok(match &settings.api_key {
			Some(credential) if !credential.is_blank() => config.with_credential(credential.clone()),
			_ => config,
		})
	}

	/// Overrides the safety mode.
	pub fn with_safety_mode(mut self, safety_mode: SafetyMode) -> Self {
		self.safety_mode = safety_mode;

		self
	}

	/// Overrides the allow-list.
	pub fn with_allowed_projects(mut self, allowed_projects: AllowedProjects) -> Self {
		self.allowed_projects = allowed_projects;

		self
	}

	/// Enables or disables dry-run.
	pub fn with_dry_run(mut self, dry_run: bool) -> Self {
		self.dry_run = dry_run;

		self
	}

	/// Sets the API key to scrub from error text.
	pub fn with_credential(mut self, credential: impl Into<Credential>) -> Self {
		self.credential = Some(credential.into());

		self
	}

	/// Pins the session id.
	pub fn with_session_id(mut self, session_id: SessionId) -> Self {
		self.session_id = session_id;

		self
	}
}
impl Default for GateConfig {
	fn default() -> Self {
		Self::new()
	}
}
