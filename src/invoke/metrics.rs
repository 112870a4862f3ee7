// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::invoke::Outcome;

/// Thread-safe counters for invocation outcomes.
#[derive(Debug, Default)]
pub struct InvocationMetrics {
	success: AtomicU64,
	error: AtomicU64,
	blocked: AtomicU64,
	dry_run: AtomicU64,
}
impl InvocationMetrics {
	/// Returns the number of handler runs that completed.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of handler runs that failed.
	pub fn errors(&self) -> u64 {
		self.error.load(Ordering::Relaxed)
	}

	/// Returns the number of calls refused by the gate.
	pub fn blocked(&self) -> u64 {
		self.blocked.load(Ordering::Relaxed)
	}

	/// Returns the number of calls answered by dry-run simulation.
	pub fn dry_runs(&self) -> u64 {
		self.dry_run.load(Ordering::Relaxed)
	}

	/// Returns the number of calls seen.
	pub fn total(&self) -> u64 {
		self.successes() + self.errors() + self.blocked() + self.dry_runs()
	}

	pub(crate) fn record(&self, outcome: Outcome) {
		let counter = match outcome {
			Outcome::Success => &self.success,
			Outcome::Error => &self.error,
			Outcome::Blocked => &self.blocked,
			Outcome::DryRun => &self.dry_run,
		};

		counter.fetch_add(1, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_track_each_outcome() {
		let metrics = InvocationMetrics::default();

		metrics.record(Outcome::Success);
		metrics.record(Outcome::Blocked);
		metrics.record(Outcome::Blocked);
		metrics.record(Outcome::DryRun);

		assert_eq!(metrics.successes(), 1);
		assert_eq!(metrics.errors(), 0);
		assert_eq!(metrics.blocked(), 2);
		assert_eq!(metrics.dry_runs(), 1);
		assert_eq!(metrics.total(), 4);
	}
}
