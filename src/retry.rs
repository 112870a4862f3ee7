//! Bounded exponential-backoff retry for transient failures.

// crates.io
use tokio::time;
// self
use crate::{_prelude::*, obs};

/// Classifies whether an error is worth another attempt.
pub trait Retryable {
	/// Returns `true` for transient failures.
	fn is_retryable(&self) -> bool;
}
impl Retryable for Error {
	/// 5xx responses and every failure without a response are transient. Rate limits (429),
	/// other 4xx responses, and local decode/validation failures are not.
	fn is_retryable(&self) -> bool {
		match self {
			Self::Api(e) => e.status >= 500,
			Self::Network(_) => true,
			_ => false,
		}
	}
}

/// Retry settings; waits `retry_delay * 2^attempt` between attempts, without jitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Retries after the first attempt; total attempts are `max_retries + 1`.
	pub max_retries: u32,
	/// Base delay before the first retry.
	pub retry_delay: Duration,
}
impl RetryPolicy {
	const DEFAULT_MAX_RETRIES: u32 = 3;
	const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

	/// Creates a policy with explicit bounds.
	pub const fn new(max_retries: u32, retry_delay: Duration) -> Self {
		Self { max_retries, retry_delay }
	}

	/// Policy that performs exactly one attempt.
	pub const fn disabled() -> Self {
		Self::new(0, Duration::ZERO)
	}

	/// Total attempts allowed.
	pub const fn max_attempts(&self) -> u32 {
		self.max_retries.saturating_add(1)
	}

	/// Delay slept after the failed attempt with index `attempt` (zero based).
	pub fn delay_for(&self, attempt: u32) -> Duration {
		self.retry_delay.saturating_mul(2_u32.saturating_pow(attempt))
	}

	/// Runs `op` until it succeeds, fails with a non-retryable error, or the attempts run out.
	///
	/// The last error is returned unmodified so callers can still match on its variant.
	pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
	where
		E: Retryable + Display,
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, E>>,
	{
		let mut attempt = 0;

		loop {
			match op().await {
				Ok(value) => return Ok(value),
				Err(err) if attempt < self.max_retries && err.is_retryable() => {
					let delay = self.delay_for(attempt);

					obs::trace_retry(attempt + 1, delay, &err);
					time::sleep(delay).await;

					attempt += 1;
				},
				Err(err) => return Err(err),
			}
		}
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::new(Self::DEFAULT_MAX_RETRIES, Self::DEFAULT_RETRY_DELAY)
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicU32, Ordering};
	// self
	use super::*;
	use crate::{
		client::ErrorPayload,
		error::{ApiError, DecodeError, NetworkError, RateLimitError},
		http::{Method, RequestDescriptor},
	};

	fn api(status: u16) -> ApiError {
		ApiError {
			status,
			payload: ErrorPayload::from_status(status),
			request: RequestDescriptor::new(Method::Get, "org"),
		}
	}

	fn reset() -> Error {
		NetworkError::from(std::io::Error::from(std::io::ErrorKind::ConnectionReset)).into()
	}

	fn fast(max_retries: u32) -> RetryPolicy {
		RetryPolicy::new(max_retries, Duration::from_millis(1))
	}

	#[test]
	fn classification_matches_status_families() {
		assert!(Error::from(api(500)).is_retryable());
		assert!(Error::from(api(503)).is_retryable());
		assert!(reset().is_retryable());
		assert!(!Error::from(api(400)).is_retryable());
		assert!(!Error::from(api(404)).is_retryable());
		assert!(!Error::from(RateLimitError { api: api(429), retry_after: None }).is_retryable());
		assert!(!Error::invalid_arguments("missing name").is_retryable());

		let source = serde_path_to_error::deserialize::<_, u8>(
			&mut serde_json::Deserializer::from_str("\"x\""),
		)
		.expect_err("String should not decode as u8.");

		assert!(!Error::from(DecodeError { status: 200, source }).is_retryable());
	}

	#[test]
	fn backoff_doubles_per_attempt() {
		let policy = RetryPolicy::new(3, Duration::from_millis(100));

		assert_eq!(policy.delay_for(0), Duration::from_millis(100));
		assert_eq!(policy.delay_for(1), Duration::from_millis(200));
		assert_eq!(policy.delay_for(2), Duration::from_millis(400));
		assert_eq!(policy.max_attempts(), 4);
		assert_eq!(RetryPolicy::default(), RetryPolicy::new(3, Duration::from_secs(1)));
	}

	#[tokio::test]
	async fn network_failures_are_retried_until_success() {
		let calls = AtomicU32::new(0);
		let result = fast(2)
			.run(|| async {
				if calls.fetch_add(1, Ordering::SeqCst) < 2 { Err(reset()) } else { Ok("done") }
			})
			.await;

		assert_eq!(result.expect("Third attempt should succeed."), "done");
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn client_errors_are_not_retried() {
		let calls = AtomicU32::new(0);
		let result: Result<(), Error> = fast(3)
			.run(|| async {
				calls.fetch_add(1, Ordering::SeqCst);

				Err(api(400).into())
			})
			.await;

		assert!(matches!(result, Err(Error::Api(ApiError { status: 400, .. }))));
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn exhaustion_returns_last_error() {
		let calls = AtomicU32::new(0);
		let result: Result<(), Error> = fast(2)
			.run(|| async {
				calls.fetch_add(1, Ordering::SeqCst);

				Err(api(502).into())
			})
			.await;

		assert!(matches!(result, Err(Error::Api(ApiError { status: 502, .. }))));
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}
}
