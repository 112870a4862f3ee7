//! Error taxonomy shared by the request pipeline and the capability gate.

// self
use crate::{
	_prelude::*,
	auth::IdentifierError,
	client::ErrorPayload,
	gate::GateError,
	http::RequestDescriptor,
	ratelimit::LimiterError,
};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Remote API rejected the request.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Remote API answered with HTTP 429.
	#[error(transparent)]
	RateLimited(#[from] RateLimitError),
	/// No response was received.
	#[error(transparent)]
	Network(#[from] NetworkError),
	/// Response body is not a valid envelope for the requested type.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Capability gate misuse (bad annotation, duplicate operation, unknown mode).
	#[error(transparent)]
	Gate(#[from] GateError),
	/// Shared scheduler refused the task.
	#[error(transparent)]
	Limiter(#[from] LimiterError),

	/// Operation handler rejected its arguments.
	#[error("Invalid arguments: {reason}.")]
	InvalidArguments {
		/// Handler-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Builds an [`Error::InvalidArguments`] value.
	pub fn invalid_arguments(reason: impl Into<String>) -> Self {
		Self::InvalidArguments { reason: reason.into() }
	}

	/// Returns the remote rejection, including rate-limit rejections.
	pub fn api_error(&self) -> Option<&ApiError> {
		match self {
			Self::Api(e) => Some(e),
			Self::RateLimited(e) => Some(&e.api),
			_ => None,
		}
	}

	/// HTTP status captured from the remote API, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Decode(e) => Some(e.status),
			_ => self.api_error().map(|e| e.status),
		}
	}

	/// Retry-After hint carried by a rate-limit rejection.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::RateLimited(e) => e.retry_after,
			_ => None,
		}
	}
}

/// Remote API rejected a request, either through an error envelope or a non-2xx status.
#[derive(Debug, ThisError)]
#[error("Remote API returned status {status} for {request}: {payload}.")]
pub struct ApiError {
	/// HTTP status (or the envelope's `statusCode` for in-band errors).
	pub status: u16,
	/// Error payload decoded from the envelope, or synthesized from the status.
	pub payload: ErrorPayload,
	/// Request that triggered the rejection.
	pub request: RequestDescriptor,
}

/// HTTP 429 rejection; a refinement of [`ApiError`] with the server's retry hint.
#[derive(Debug)]
pub struct RateLimitError {
	/// Underlying rejection details.
	pub api: ApiError,
	/// Parsed `Retry-After` header, when present and parseable.
	pub retry_after: Option<Duration>,
}
impl Display for RateLimitError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Remote API rate limit exceeded for {}", self.api.request)?;

		match self.retry_after {
			Some(wait) => write!(f, "; retry after {}s.", wait.as_secs()),
			None => f.write_str("."),
		}
	}
}
impl StdError for RateLimitError {
	fn source(&self) -> Option<&(dyn StdError + 'static)> {
		Some(&self.api)
	}
}

/// Coarse classification of failures where no response was received.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkErrorKind {
	/// The per-request timeout elapsed.
	Timeout,
	/// The connection could not be established.
	Connect,
	/// The connection was reset or aborted mid-flight.
	Reset,
	/// Any other transport failure.
	Other,
}
impl NetworkErrorKind {
	/// Fixed, secret-free description of the failure kind.
	pub const fn describe(self) -> &'static str {
		match self {
			Self::Timeout => "Request timed out before the remote API responded.",
			Self::Connect => "Could not connect to the remote API.",
			Self::Reset => "Connection to the remote API was reset.",
			Self::Other => "Network error occurred while calling the remote API.",
		}
	}
}

/// Transport failure with no response at all.
#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct NetworkError {
	/// Failure classification.
	pub kind: NetworkErrorKind,
	/// Human-readable summary; never includes header values.
	pub message: String,
	/// Underlying transport error.
	#[source]
	pub source: BoxError,
}
impl NetworkError {
	/// Wraps a transport error under the given kind.
	pub fn new(kind: NetworkErrorKind, src: impl 'static + Send + Sync + StdError) -> Self {
		Self { kind, message: kind.describe().into(), source: Box::new(src) }
	}

	/// Wraps a timeout.
	pub fn timeout(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::new(NetworkErrorKind::Timeout, src)
	}

	/// Wraps a connection failure.
	pub fn connect(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::new(NetworkErrorKind::Connect, src)
	}

	/// Wraps a generic network failure.
	pub fn other(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::new(NetworkErrorKind::Other, src)
	}
}
impl From<std::io::Error> for NetworkError {
	fn from(e: std::io::Error) -> Self {
		use std::io::ErrorKind;

		let kind = match e.kind() {
			ErrorKind::TimedOut => NetworkErrorKind::Timeout,
			ErrorKind::ConnectionRefused | ErrorKind::NotConnected | ErrorKind::AddrNotAvailable =>
				NetworkErrorKind::Connect,
			ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe =>
				NetworkErrorKind::Reset,
			_ => NetworkErrorKind::Other,
		};

		Self::new(kind, e)
	}
}

/// Response body could not be decoded.
#[derive(Debug, ThisError)]
#[error("Remote API returned a malformed response body (status {status}).")]
pub struct DecodeError {
	/// HTTP status of the response.
	pub status: u16,
	/// Structured parsing failure, including the JSON path.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
}

/// Configuration and validation failures raised while building clients or requests.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL must use http or https and be able to carry a path.
	#[error("Base URL is not usable: {url}.")]
	InvalidBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Request path could not be joined onto the base URL.
	#[error("Request path `{path}` is invalid.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request path resolved outside the versioned base URL.
	#[error("Request path `{path}` escapes the API base URL.")]
	PathOutsideBase {
		/// Offending path.
		path: String,
	},
	/// A header value contains characters HTTP does not allow.
	#[error("The {name} header value is invalid.")]
	InvalidHeader {
		/// Header name; the value itself is never reported.
		name: &'static str,
	},
	/// No credential was supplied.
	#[error("An API credential is required.")]
	MissingCredential,
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	EncodeBody {
		/// Serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// Identifier in the configuration failed validation.
	#[error(transparent)]
	Identifier(#[from] IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
