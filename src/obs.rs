//! Optional observability helpers for the request pipeline and the invocation wrapper.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `analytics_guard.invoke` (fields `operation` and
//!   `capability`) around handler runs, plus events for request attempts, retries, gate
//!   refusals, dry-run interceptions, unknown safety modes, and audit entries.
//! - Enable `metrics` to increment `analytics_guard_request_total` (labels `method` and
//!   `outcome`) for every transport attempt and `analytics_guard_invocation_total` (labels
//!   `capability` and `outcome`) for every invocation.
//!
//! With both features off, every helper compiles to a no-op.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{_prelude::*, client::RequestEvent};

/// Outcome labels recorded for each transport attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// 2xx response.
	Success,
	/// Non-2xx response.
	HttpError,
	/// No response at all.
	NetworkError,
}
impl RequestOutcome {
	/// Classifies an attempt.
	pub fn of(event: &RequestEvent) -> Self {
		match event.status {
			Some(status) if (200..300).contains(&status) => Self::Success,
			Some(_) => Self::HttpError,
			None => Self::NetworkError,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Success => "success",
			Self::HttpError => "http_error",
			Self::NetworkError => "network_error",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
