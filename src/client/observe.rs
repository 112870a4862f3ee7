//! Per-attempt request observation hook.

// self
use crate::{_prelude::*, http::Method};

/// One completed transport attempt, successful or not.
///
/// Contains the URL and status only; header values and bodies are never captured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestEvent {
	/// HTTP verb.
	pub method: Method,
	/// Absolute URL, including query parameters.
	pub url: String,
	/// Response status; `None` when no response was received.
	pub status: Option<u16>,
	/// Wall-clock duration of the attempt.
	pub duration: Duration,
	/// Failure summary for non-2xx or network failures.
	pub error: Option<String>,
}
impl RequestEvent {
	/// Duration in whole milliseconds.
	pub fn duration_ms(&self) -> u128 {
		self.duration.as_millis()
	}

	/// Whether the attempt produced a 2xx response.
	pub fn is_success(&self) -> bool {
		self.error.is_none() && self.status.is_some_and(|status| (200..300).contains(&status))
	}
}

/// Receives a [`RequestEvent`] after every attempt, including retried ones.
pub trait RequestObserver
where
	Self: Send + Sync,
{
	/// Called once per attempt. Must not block.
	fn observe(&self, event: &RequestEvent);
}
impl<F> RequestObserver for F
where
	F: Fn(&RequestEvent) + Send + Sync,
{
	fn observe(&self, event: &RequestEvent) {
		self(event)
	}
}
