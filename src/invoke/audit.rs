//! Audit entries and the sinks that receive them.

// self
use crate::{
	_prelude::*,
	auth::{OperationName, SessionId},
	obs,
};

/// Final status recorded for an executed or refused call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
	/// Handler completed.
	Success,
	/// Handler failed.
	Error,
	/// Gate refused the call before the handler ran.
	Blocked,
}
impl AuditStatus {
	/// Stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Success => "success",
			Self::Error => "error",
			Self::Blocked => "blocked",
		}
	}
}

/// One audit record per invocation that reached a verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
	/// When the entry was produced (UTC, RFC 3339 on the wire).
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
	/// Process session.
	pub session_id: SessionId,
	/// Operation name.
	pub operation: OperationName,
	/// Project identifiers extracted from the arguments.
	pub project_ids: Vec<String>,
	/// Verdict.
	pub status: AuditStatus,
	/// Handler duration; zero for blocked calls.
	pub duration_ms: u64,
}

/// Receives audit entries as soon as they are produced. Persistence is up to the implementor.
pub trait AuditSink
where
	Self: Send + Sync,
{
	/// Records one entry. Must not block for long; the caller is waiting.
	fn record(&self, entry: AuditEntry);
}

/// Keeps entries in memory; intended for tests and short-lived harnesses.
#[derive(Clone, Debug, Default)]
pub struct MemoryAuditSink(Arc<RwLock<Vec<AuditEntry>>>);
impl MemoryAuditSink {
	/// Snapshot of every recorded entry, oldest first.
	pub fn entries(&self) -> Vec<AuditEntry> {
		self.0.read().clone()
	}

	/// Number of recorded entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Whether nothing has been recorded.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Drops every recorded entry.
	pub fn clear(&self) {
		self.0.write().clear();
	}
}
impl AuditSink for MemoryAuditSink {
	fn record(&self, entry: AuditEntry) {
		self.0.write().push(entry);
	}
}

/// Forwards entries to the tracing layer as structured events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;
impl AuditSink for TracingAuditSink {
	fn record(&self, entry: AuditEntry) {
		obs::trace_audit(&entry);
	}
}

/// Discards entries.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAuditSink;
impl AuditSink for NoopAuditSink {
	fn record(&self, _: AuditEntry) {}
}
