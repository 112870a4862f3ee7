//! Invocation wrapper enforcing the gate around every operation.
//!
//! [`Invoker::invoke`] runs, in order: safety-mode check, allow-list check, dry-run
//! interception, the handler (timed), the audit entry, and error sanitization. Refused and
//! simulated calls never reach the handler. Refusals are audited as `blocked` with a zero
//! duration; simulations produce no audit entry because nothing ran.

pub mod audit;
/// Invocation outcome counters.
pub mod metrics;
/// Named operation registry.
pub mod registry;
pub mod sanitize;

pub use audit::*;
pub use metrics::*;
pub use registry::*;
pub use sanitize::*;

// self
use crate::{
	_prelude::*,
	auth::{Credential, OperationName},
	config::GateConfig,
	gate::{self, Annotation, ArgumentBag, BlockReason, Capability, Decision, SafetyMode},
	obs::{self, InvokeSpan},
};

/// Boxed future returned by [`Handler::call`].
pub type HandlerFuture<'a> =
	Pin<Box<dyn Future<Output = Result<serde_json::Value>> + 'a + Send>>;

/// Underlying implementation of an operation.
pub trait Handler<A>
where
	Self: Send + Sync,
{
	/// Runs the operation with already-approved arguments.
	fn call(&self, args: A) -> HandlerFuture<'_>;
}
impl<A, F, Fut> Handler<A> for F
where
	F: Fn(A) -> Fut + Send + Sync,
	Fut: 'static + Future<Output = Result<serde_json::Value>> + Send,
{
	fn call(&self, args: A) -> HandlerFuture<'_> {
		Box::pin(self(args))
	}
}

/// A named handler with its fixed capability.
pub struct Operation<A> {
	name: OperationName,
	capability: Capability,
	description: Option<String>,
	handler: Arc<dyn Handler<A>>,
}
impl<A> Operation<A> {
	/// Creates an operation.
	pub fn new(
		name: OperationName,
		capability: Capability,
		handler: impl 'static + Handler<A>,
	) -> Self {
		Self { name, capability, description: None, handler: Arc::new(handler) }
	}

	/// Attaches a human-readable description for listings.
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());

		self
	}

	/// Operation name.
	pub fn name(&self) -> &OperationName {
		&self.name
	}

	/// Fixed capability.
	pub fn capability(&self) -> Capability {
		self.capability
	}

	/// Flag view of the capability for agent tooling.
	pub fn annotation(&self) -> Annotation {
		self.capability.annotation()
	}

	/// Optional description.
	pub fn description(&self) -> Option<&str> {
		self.description.as_deref()
	}
}
impl<A> Clone for Operation<A> {
	fn clone(&self) -> Self {
		Self {
			name: self.name.clone(),
			capability: self.capability,
			description: self.description.clone(),
			handler: self.handler.clone(),
		}
	}
}
impl<A> Debug for Operation<A> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Operation")
			.field("name", &self.name)
			.field("capability", &self.capability)
			.finish_non_exhaustive()
	}
}

/// How an invocation ended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
	/// Handler completed.
	#[default]
	Success,
	/// Handler failed.
	Error,
	/// Gate refused the call.
	Blocked,
	/// Write intercepted by dry-run.
	DryRun,
}
impl Outcome {
	/// Stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Success => "success",
			Self::Error => "error",
			Self::Blocked => "blocked",
			Self::DryRun => "dry_run",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Uniform result handed back to every front end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
	/// Human-readable text.
	pub content: String,
	/// Whether the call failed or was refused.
	#[serde(rename = "isError", skip_serializing_if = "is_false")]
	pub is_error: bool,
	/// Detailed outcome; not part of the wire shape.
	#[serde(skip)]
	pub outcome: Outcome,
}
impl InvocationResult {
	/// Successful handler output.
	pub fn success(content: impl Into<String>) -> Self {
		Self { content: content.into(), is_error: false, outcome: Outcome::Success }
	}

	/// Handler failure, already sanitized.
	pub fn error(content: impl Into<String>) -> Self {
		Self { content: content.into(), is_error: true, outcome: Outcome::Error }
	}

	/// Gate refusal.
	pub fn blocked(reason: &BlockReason) -> Self {
		Self { content: format!("Blocked: {reason}"), is_error: true, outcome: Outcome::Blocked }
	}

	/// Dry-run simulation of a write.
	pub fn dry_run(name: &OperationName, capability: Capability) -> Self {
		Self {
			content: format!(
				"[dry-run] Operation `{name}` ({capability}) was not executed. No changes were made."
			),
			is_error: false,
			outcome: Outcome::DryRun,
		}
	}
}

/// Gate-enforcing executor shared by every front end of one process.
#[derive(Clone)]
pub struct Invoker {
	config: GateConfig,
	audit: Arc<dyn AuditSink>,
	sanitizer: Sanitizer,
	metrics: Arc<InvocationMetrics>,
}
impl Invoker {
	/// Creates an invoker over an explicit configuration and audit sink.
	///
	/// The configured credential, if any, is registered with the sanitizer.
	pub fn new(config: GateConfig, audit: Arc<dyn AuditSink>) -> Self {
		let sanitizer = match &config.credential {
			Some(credential) => Sanitizer::default().with_credential(credential),
			None => Sanitizer::default(),
		};

		Self { config, audit, sanitizer, metrics: Arc::new(InvocationMetrics::default()) }
	}

	/// Scrubs `credential` from every error message.
	pub fn with_redacted_credential(mut self, credential: &Credential) -> Self {
		self.sanitizer = self.sanitizer.with_credential(credential);

		self
	}

	/// Scrubs a literal secret from every error message.
	pub fn with_redacted_secret(mut self, secret: impl Into<String>) -> Self {
		self.sanitizer = self.sanitizer.with_secret(secret);

		self
	}

	/// Active configuration.
	pub fn config(&self) -> &GateConfig {
		&self.config
	}

	/// Outcome counters.
	pub fn metrics(&self) -> &Arc<InvocationMetrics> {
		&self.metrics
	}

	/// Runs `operation` under the gate. `mode_override` replaces the configured mode for this
	/// call only.
	pub async fn invoke<A>(
		&self,
		operation: &Operation<A>,
		args: A,
		mode_override: Option<SafetyMode>,
	) -> InvocationResult
	where
		A: ArgumentBag,
	{
		let mode = mode_override.unwrap_or(self.config.safety_mode);
		let capability = operation.capability();
		let project_ids = args.project_ids();

		match gate::decide(
			mode,
			capability,
			&self.config.allowed_projects,
			&project_ids,
			self.config.dry_run,
		) {
			Decision::Blocked(reason) => {
				obs::trace_blocked(operation.name(), &reason);
				self.audit(operation.name(), project_ids, AuditStatus::Blocked, Duration::ZERO);
				self.count(capability, Outcome::Blocked);

				return InvocationResult::blocked(&reason);
			},
			Decision::DryRun => {
				obs::trace_dry_run(operation.name());
				self.count(capability, Outcome::DryRun);

				return InvocationResult::dry_run(operation.name(), capability);
			},
			Decision::Proceed => {},
		}

		let span = InvokeSpan::new(operation.name(), capability);
		let started = Instant::now();
		let result = span.instrument(operation.handler.call(args)).await;
		let elapsed = started.elapsed();

		match result {
			Ok(value) => {
				self.audit(operation.name(), project_ids, AuditStatus::Success, elapsed);
				self.count(capability, Outcome::Success);

				InvocationResult::success(render(value))
			},
			Err(err) => {
				self.audit(operation.name(), project_ids, AuditStatus::Error, elapsed);
				self.count(capability, Outcome::Error);

				InvocationResult::error(self.sanitizer.describe(&err))
			},
		}
	}

	/// Sanitized error result for failures raised before any operation was resolved.
	pub fn reject(&self, err: &Error) -> InvocationResult {
		InvocationResult::error(self.sanitizer.describe(err))
	}

	fn audit(
		&self,
		operation: &OperationName,
		project_ids: Vec<String>,
		status: AuditStatus,
		elapsed: Duration,
	) {
		self.audit.record(AuditEntry {
			timestamp: OffsetDateTime::now_utc(),
			session_id: self.config.session_id.clone(),
			operation: operation.clone(),
			project_ids,
			status,
			duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
		});
	}

	fn count(&self, capability: Capability, outcome: Outcome) {
		self.metrics.record(outcome);
		obs::record_invocation(capability, outcome);
	}
}
impl Debug for Invoker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Invoker")
			.field("config", &self.config)
			.field("sanitizer", &self.sanitizer)
			.field("metrics", &self.metrics)
			.finish_non_exhaustive()
	}
}

fn render(value: serde_json::Value) -> String {
	match value {
		serde_json::Value::String(text) => text,
		serde_json::Value::Null => "Done.".into(),
		other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
	}
}

fn is_false(value: &bool) -> bool {
	!*value
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicU32, Ordering};
	// self
	use super::*;
	use crate::gate::{AllowedProjects, ToolArguments};

	fn counting_op(
		name: &str,
		capability: Capability,
		calls: Arc<AtomicU32>,
	) -> Operation<ToolArguments> {
		Operation::new(
			OperationName::new(name).expect("Name fixture should be valid."),
			capability,
			move |_: ToolArguments| {
				calls.fetch_add(1, Ordering::SeqCst);

				async { Ok::<_, Error>(serde_json::json!({ "ok": true })) }
			},
		)
	}

	fn args(value: serde_json::Value) -> ToolArguments {
		ToolArguments::from_value(value).expect("Argument fixture should be an object.")
	}

	fn invoker(config: GateConfig) -> (Invoker, MemoryAuditSink) {
		let sink = MemoryAuditSink::default();

		(Invoker::new(config, Arc::new(sink.clone())), sink)
	}

	#[tokio::test]
	async fn read_only_mode_blocks_destructive_operations() {
		let calls = Arc::new(AtomicU32::new(0));
		let op = counting_op("delete_space", Capability::WriteDestructive, calls.clone());
		let (invoker, sink) = invoker(GateConfig::new());
		let result = invoker.invoke(&op, args(serde_json::json!({})), None).await;

		assert_eq!(result.outcome, Outcome::Blocked);
		assert!(result.is_error);
		assert_eq!(calls.load(Ordering::SeqCst), 0);

		let entries = sink.entries();

		assert_eq!(entries.len(), 1);
		assert_eq!(entries[0].status, AuditStatus::Blocked);
		assert_eq!(entries[0].duration_ms, 0);
	}

	#[tokio::test]
	async fn disallowed_project_is_named() {
		let calls = Arc::new(AtomicU32::new(0));
		let op = counting_op("delete_space", Capability::WriteDestructive, calls.clone());
		let config = GateConfig::new()
			.with_safety_mode(SafetyMode::WriteDestructive)
			.with_allowed_projects("p1".parse::<AllowedProjects>().expect("Allow-list should parse."));
		let (invoker, _) = invoker(config);
		let result = invoker.invoke(&op, args(serde_json::json!({ "projectUuid": "p2" })), None).await;

		assert_eq!(result.outcome, Outcome::Blocked);
		assert!(result.content.contains("p2"));
		assert_eq!(calls.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn malformed_project_fields_fail_closed() {
		let calls = Arc::new(AtomicU32::new(0));
		let op = counting_op("delete_space", Capability::WriteDestructive, calls.clone());
		let config = GateConfig::new()
			.with_safety_mode(SafetyMode::WriteDestructive)
			.with_allowed_projects("p1".parse::<AllowedProjects>().expect("Allow-list should parse."));
		let (invoker, sink) = invoker(config);

		for value in [
			serde_json::json!({ "projectUuids": "p2" }),
			serde_json::json!({ "projectUuid": 42 }),
			serde_json::json!({ "projectUuid": ["p2"] }),
		] {
			let result = invoker.invoke(&op, args(value), None).await;

			assert_eq!(result.outcome, Outcome::Blocked);
		}

		assert_eq!(calls.load(Ordering::SeqCst), 0);
		assert_eq!(sink.len(), 3);
	}

	#[tokio::test]
	async fn configured_credential_is_always_scrubbed() {
		let op = Operation::new(
			OperationName::new("get_chart").expect("Name fixture should be valid."),
			Capability::ReadOnly,
			|_: ToolArguments| async {
				Err::<serde_json::Value, _>(Error::invalid_arguments("bad key sk-abc123"))
			},
		);
		let (invoker, _) = invoker(GateConfig::new().with_credential("ApiKey sk-abc123"));
		let result = invoker.invoke(&op, args(serde_json::json!({})), None).await;

		assert_eq!(result.content, "Invalid arguments: bad key <redacted>.");
	}

	#[tokio::test]
	async fn dry_run_skips_handler_and_audit() {
		let calls = Arc::new(AtomicU32::new(0));
		let op = counting_op("delete_space", Capability::WriteDestructive, calls.clone());
		let config =
			GateConfig::new().with_safety_mode(SafetyMode::WriteDestructive).with_dry_run(true);
		let (invoker, sink) = invoker(config);
		let result = invoker.invoke(&op, args(serde_json::json!({})), None).await;

		assert_eq!(result.outcome, Outcome::DryRun);
		assert!(!result.is_error);
		assert!(result.content.contains("No changes were made"));
		assert_eq!(calls.load(Ordering::SeqCst), 0);
		assert!(sink.is_empty());
		assert_eq!(invoker.metrics().dry_runs(), 1);
	}

	#[tokio::test]
	async fn dry_run_still_runs_reads() {
		let calls = Arc::new(AtomicU32::new(0));
		let op = counting_op("list_projects", Capability::ReadOnly, calls.clone());
		let (invoker, sink) = invoker(GateConfig::new().with_dry_run(true));
		let result = invoker.invoke(&op, args(serde_json::json!({})), None).await;

		assert_eq!(result.outcome, Outcome::Success);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(sink.entries()[0].status, AuditStatus::Success);
	}

	#[tokio::test]
	async fn override_replaces_configured_mode() {
		let calls = Arc::new(AtomicU32::new(0));
		let op = counting_op("update_chart", Capability::WriteIdempotent, calls.clone());
		let (invoker, _) = invoker(GateConfig::new());
		let result = invoker
			.invoke(&op, args(serde_json::json!({})), Some(SafetyMode::WriteIdempotent))
			.await;

		assert_eq!(result.outcome, Outcome::Success);
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn handler_errors_are_sanitized_and_audited() {
		let op = Operation::new(
			OperationName::new("get_chart").expect("Name fixture should be valid."),
			Capability::ReadOnly,
			|_: ToolArguments| async {
				Err::<serde_json::Value, _>(Error::invalid_arguments("token sk-9\nsecond line"))
			},
		);
		let (invoker, sink) = invoker(GateConfig::new());
		let invoker = invoker.with_redacted_secret("sk-9");
		let result = invoker
			.invoke(&op, args(serde_json::json!({ "projectUuid": "p1" })), None)
			.await;

		assert!(result.is_error);
		assert_eq!(result.content, "Invalid arguments: token <redacted> second line.");

		let entries = sink.entries();

		assert_eq!(entries[0].status, AuditStatus::Error);
		assert_eq!(entries[0].project_ids, vec!["p1"]);
	}

	#[test]
	fn result_wire_shape_omits_false_error_flag() {
		let ok = serde_json::to_value(InvocationResult::success("fine")).expect("Result should serialize.");
		let failed =
			serde_json::to_value(InvocationResult::error("nope")).expect("Result should serialize.");

		assert_eq!(ok, serde_json::json!({ "content": "fine" }));
		assert_eq!(failed, serde_json::json!({ "content": "nope", "isError": true }));
	}
}
