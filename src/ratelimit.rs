//! Token-bucket scheduler with a concurrency cap, shared by every caller of one API surface.
//!
//! Admission happens under a FIFO lock: a task first takes a concurrency slot, then a
//! reservoir token (waiting for the next refill when the bucket is empty), then waits out
//! the minimum spacing since the previous dispatch. Only then is the lock released and the
//! task run, so tasks start in submission order and the slot stays held until the task
//! finishes.

// crates.io
use tokio::{
	sync::{Mutex as FifoMutex, OwnedSemaphorePermit, Semaphore},
	time,
};
// self
use crate::_prelude::*;

/// Failures raised by the scheduler itself.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum LimiterError {
	/// [`RateLimiter::close`] was called; no new work is admitted.
	#[error("Rate limiter is closed.")]
	Closed,
	/// Configuration cannot describe a working scheduler.
	#[error("Rate limiter configuration is invalid: {reason}.")]
	InvalidConfig {
		/// Which constraint failed.
		reason: &'static str,
	},
}

/// Scheduler settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimiterConfig {
	/// Minimum spacing between two consecutive dispatches.
	pub min_time: Duration,
	/// Maximum number of tasks running at once.
	pub max_concurrent: usize,
	/// Bucket size; `None` disables the token bucket.
	pub reservoir: Option<u32>,
	/// Interval between refills.
	pub refresh_interval: Duration,
	/// Tokens added per refill, capped at the bucket size.
	pub refresh_amount: u32,
}
impl RateLimiterConfig {
	/// Configuration that only caps concurrency, without spacing or bucket.
	pub fn concurrency_only(max_concurrent: usize) -> Self {
		Self {
			min_time: Duration::ZERO,
			max_concurrent,
			reservoir: None,
			refresh_interval: Duration::from_secs(60),
			refresh_amount: 0,
		}
	}

	/// Overrides the minimum dispatch spacing.
	pub fn with_min_time(mut self, min_time: Duration) -> Self {
		self.min_time = min_time;

		self
	}

	/// Overrides the concurrency cap.
	pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
		self.max_concurrent = max_concurrent;

		self
	}

	/// Enables the token bucket with the given size, refill interval, and refill amount.
	pub fn with_reservoir(mut self, size: u32, refresh_interval: Duration, refresh_amount: u32) -> Self {
		self.reservoir = Some(size);
		self.refresh_interval = refresh_interval;
		self.refresh_amount = refresh_amount;

		self
	}

	/// Disables the token bucket.
	pub fn without_reservoir(mut self) -> Self {
		self.reservoir = None;

		self
	}

	fn validate(&self) -> Result<(), LimiterError> {
		if self.max_concurrent == 0 {
			return Err(LimiterError::InvalidConfig { reason: "max_concurrent must be positive" });
		}
		if self.max_concurrent > Semaphore::MAX_PERMITS {
			return Err(LimiterError::InvalidConfig { reason: "max_concurrent is too large" });
		}
		if let Some(size) = self.reservoir {
			if size == 0 && self.refresh_amount == 0 {
				return Err(LimiterError::InvalidConfig {
					reason: "an empty reservoir needs a positive refresh amount",
				});
			}
			if self.refresh_interval.is_zero() {
				return Err(LimiterError::InvalidConfig {
					reason: "refresh_interval must be positive when a reservoir is set",
				});
			}
		}

		Ok(())
	}
}
impl Default for RateLimiterConfig {
	fn default() -> Self {
		Self {
			min_time: Duration::from_millis(200),
			max_concurrent: 5,
			reservoir: Some(100),
			refresh_interval: Duration::from_secs(60),
			refresh_amount: 100,
		}
	}
}

#[derive(Debug)]
struct Admission {
	last_dispatch: Option<Instant>,
	tokens: Option<u32>,
	last_refresh: Instant,
}
impl Admission {
	fn refill(&mut self, config: &RateLimiterConfig, now: Instant) {
		let (Some(tokens), Some(capacity)) = (self.tokens, config.reservoir) else {
			return;
		};
		let elapsed = now.duration_since(self.last_refresh);

		if elapsed < config.refresh_interval {
			return;
		}

		let periods =
			u32::try_from(elapsed.as_nanos() / config.refresh_interval.as_nanos()).unwrap_or(u32::MAX);

		self.tokens = Some(tokens.saturating_add(periods.saturating_mul(config.refresh_amount)).min(capacity));
		// Keep the partial period so refills stay on the configured cadence.
		self.last_refresh += config.refresh_interval.saturating_mul(periods);
	}
}

/// Shared scheduler; construct once per API surface and hand out `Arc` clones.
#[derive(Debug)]
pub struct RateLimiter {
	config: RateLimiterConfig,
	slots: Arc<Semaphore>,
	admission: FifoMutex<Admission>,
}
impl RateLimiter {
	/// Creates a scheduler after validating the configuration.
	pub fn new(config: RateLimiterConfig) -> Result<Self, LimiterError> {
		config.validate()?;

		Ok(Self {
			slots: Arc::new(Semaphore::new(config.max_concurrent)),
			admission: FifoMutex::new(Admission {
				last_dispatch: None,
				tokens: config.reservoir,
				last_refresh: Instant::now(),
			}),
			config,
		})
	}

	/// Creates a scheduler ready to be shared across clients.
	pub fn shared(config: RateLimiterConfig) -> Result<Arc<Self>, LimiterError> {
		Self::new(config).map(Arc::new)
	}

	/// Active configuration.
	pub fn config(&self) -> &RateLimiterConfig {
		&self.config
	}

	/// Tokens currently left in the bucket, or `None` when the bucket is disabled.
	pub async fn available_tokens(&self) -> Option<u32> {
		let mut admission = self.admission.lock().await;

		admission.refill(&self.config, Instant::now());

		admission.tokens
	}

	/// Stops admitting new work; tasks already running are unaffected.
	pub fn close(&self) {
		self.slots.close();
	}

	/// Waits for a slot, then runs `task` while holding it.
	pub async fn schedule<F, Fut>(&self, task: F) -> Result<Fut::Output, LimiterError>
	where
		F: FnOnce() -> Fut,
		Fut: Future,
	{
		let _permit = self.admit().await?;

		Ok(task().await)
	}

	/// Returns a throttled version of `f` whose calls are scheduled through this limiter.
	pub fn wrap<F>(self: &Arc<Self>, f: F) -> Throttled<F> {
		Throttled { limiter: Arc::clone(self), inner: f }
	}

	async fn admit(&self) -> Result<OwnedSemaphorePermit, LimiterError> {
		let mut admission = self.admission.lock().await;
		let permit =
			Arc::clone(&self.slots).acquire_owned().await.map_err(|_| LimiterError::Closed)?;

		loop {
			admission.refill(&self.config, Instant::now());

			match admission.tokens {
				None => break,
				Some(left) if left > 0 => {
					admission.tokens = Some(left - 1);

					break;
				},
				Some(_) => {
					let next_refill = admission.last_refresh + self.config.refresh_interval;

					time::sleep_until(time::Instant::from_std(next_refill)).await;
				},
			}
		}

		if let Some(last) = admission.last_dispatch {
			let earliest = last + self.config.min_time;

			if earliest > Instant::now() {
				time::sleep_until(time::Instant::from_std(earliest)).await;
			}
		}

		admission.last_dispatch = Some(Instant::now());

		Ok(permit)
	}
}

/// Function wrapped by [`RateLimiter::wrap`].
#[derive(Clone, Debug)]
pub struct Throttled<F> {
	limiter: Arc<RateLimiter>,
	inner: F,
}
impl<F> Throttled<F> {
	/// Schedules one call of the wrapped function.
	pub async fn call<A, Fut>(&self, args: A) -> Result<Fut::Output, LimiterError>
	where
		F: Fn(A) -> Fut,
		Fut: Future,
	{
		self.limiter.schedule(|| (self.inner)(args)).await
	}

	/// Limiter backing this wrapper.
	pub fn limiter(&self) -> &Arc<RateLimiter> {
		&self.limiter
	}
}
