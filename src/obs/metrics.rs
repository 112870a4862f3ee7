// self
use crate::{
	client::RequestEvent,
	gate::Capability,
	invoke::Outcome,
	obs::RequestOutcome,
};

/// Records one transport attempt via the global metrics recorder (when enabled).
pub fn record_request(event: &RequestEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"analytics_guard_request_total",
			"method" => event.method.as_str(),
			"outcome" => RequestOutcome::of(event).as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = RequestOutcome::of(event);
	}
}

/// Records one invocation outcome via the global metrics recorder (when enabled).
pub fn record_invocation(capability: Capability, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"analytics_guard_invocation_total",
			"capability" => capability.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (capability, outcome);
	}
}
