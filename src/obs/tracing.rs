// self
use crate::{
	_prelude::*,
	auth::OperationName,
	client::RequestEvent,
	gate::{BlockReason, Capability, SafetyMode},
	invoke::AuditEntry,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedInvoke<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedInvoke<F> = F;

/// Span wrapping one handler run.
#[derive(Clone, Debug)]
pub struct InvokeSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl InvokeSpan {
	/// Creates a new span tagged with the operation name and capability.
	pub fn new(operation: &OperationName, capability: Capability) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"analytics_guard.invoke",
				operation = operation.as_ref(),
				capability = capability.as_str(),
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (operation, capability);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedInvoke<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits one event per transport attempt; failures are logged at `warn`.
pub fn trace_request(event: &RequestEvent) {
	#[cfg(feature = "tracing")]
	{
		let duration_ms = event.duration_ms() as u64;

		match &event.error {
			Some(error) => tracing::warn!(
				method = event.method.as_str(),
				url = %event.url,
				status = event.status,
				duration_ms,
				error = %error,
				"Remote API request failed."
			),
			None => tracing::debug!(
				method = event.method.as_str(),
				url = %event.url,
				status = event.status,
				duration_ms,
				"Remote API request completed."
			),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = event;
	}
}

/// Emits an event before sleeping ahead of retry number `attempt`.
pub fn trace_retry(attempt: u32, delay: Duration, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			attempt,
			delay_ms = delay.as_millis() as u64,
			error = %error,
			"Retrying remote API request."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (attempt, delay, error);
	}
}

/// Emits an event when the gate refuses a call.
pub fn trace_blocked(operation: &OperationName, reason: &BlockReason) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(operation = operation.as_ref(), reason = %reason, "Operation blocked.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (operation, reason);
	}
}

/// Emits an event when dry-run intercepts a write.
pub fn trace_dry_run(operation: &OperationName) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(operation = operation.as_ref(), "Write intercepted by dry-run.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = operation;
	}
}

/// Emits a warning when safety-mode text is not recognized.
pub fn trace_unknown_mode(raw: &str, fallback: SafetyMode) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			value = raw,
			fallback = fallback.as_str(),
			"Unknown safety mode; applying fallback."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (raw, fallback);
	}
}

/// Emits an audit entry as a structured event.
pub fn trace_audit(entry: &AuditEntry) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(
			target: "analytics_guard::audit",
			session_id = entry.session_id.as_ref(),
			operation = entry.operation.as_ref(),
			project_ids = ?entry.project_ids,
			status = entry.status.as_str(),
			duration_ms = entry.duration_ms,
			"Audit entry."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = entry;
	}
}
