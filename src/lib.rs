//! Guarded access to a remote analytics API: a throttled, retrying, envelope-aware request
//! pipeline behind a capability gate with safety modes, project allow-lists, dry-run, and
//! audited invocations.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod http;
pub mod invoke;
pub mod obs;
pub mod pagination;
pub mod ratelimit;
pub mod retry;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// crates.io
	use parking_lot::Mutex;
	// self
	use crate::{
		client::ApiClient,
		error::{NetworkError, NetworkErrorKind},
		http::{PreparedRequest, RawResponse, Transport, TransportFuture},
		ratelimit::{RateLimiter, RateLimiterConfig},
		retry::RetryPolicy,
	};

	/// Scripted reply consumed by [`ScriptedTransport`].
	#[derive(Clone, Debug)]
	pub enum ScriptedReply {
		/// Server produced this response.
		Respond(RawResponse),
		/// Nothing was received.
		Fail(NetworkErrorKind),
	}

	/// In-memory [`Transport`] that replays scripted replies and records every request.
	///
	/// Once the script runs out, every further attempt fails as a network error.
	#[derive(Debug, Default)]
	pub struct ScriptedTransport {
		script: Mutex<VecDeque<ScriptedReply>>,
		sent: Mutex<Vec<PreparedRequest>>,
	}
	impl ScriptedTransport {
		/// Creates a transport replaying `replies` in order.
		pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
			Self { script: Mutex::new(replies.into_iter().collect()), sent: Mutex::default() }
		}

		/// Appends a reply to the script.
		pub fn push(&self, reply: ScriptedReply) {
			self.script.lock().push_back(reply);
		}

		/// Requests received so far.
		pub fn sent(&self) -> Vec<PreparedRequest> {
			self.sent.lock().clone()
		}

		/// Number of attempts received so far.
		pub fn calls(&self) -> usize {
			self.sent.lock().len()
		}
	}
	impl Transport for ScriptedTransport {
		fn send(&self, request: PreparedRequest) -> TransportFuture<'_> {
			self.sent.lock().push(request);

			let reply = self.script.lock().pop_front();

			Box::pin(async move {
				match reply {
					Some(ScriptedReply::Respond(response)) => Ok(response),
					Some(ScriptedReply::Fail(kind)) =>
						Err(NetworkError::new(kind, std::io::Error::other("scripted failure")).into()),
					None => Err(NetworkError::other(std::io::Error::other("script exhausted")).into()),
				}
			})
		}
	}

	/// Builds a client over `transport` with a fast retry policy and an unthrottled limiter.
	pub fn scripted_client(transport: Arc<ScriptedTransport>) -> ApiClient<ScriptedTransport> {
		let limiter = RateLimiter::shared(RateLimiterConfig::concurrency_only(5))
			.expect("Test limiter config should be valid.");

		ApiClient::<ScriptedTransport>::builder(
			Url::parse("https://analytics.example.com").expect("Test base URL should parse."),
		)
		.credential("test-key")
		.retry(RetryPolicy::new(3, Duration::from_millis(1)))
		.limiter(limiter)
		.build_with_transport(transport)
		.expect("Scripted client should build.")
	}

	/// Encodes `results` inside a success envelope.
	pub fn envelope_ok(results: serde_json::Value) -> Vec<u8> {
		serde_json::to_vec(&serde_json::json!({ "status": "ok", "results": results }))
			.expect("Envelope fixture should serialize.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, BTreeSet},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::{Duration, Instant},
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
