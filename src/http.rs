//! Transport primitives for remote API calls.
//!
//! [`Transport`] is the pipeline's only dependency on an HTTP stack. The client hands it a
//! fully prepared request (URL, normalized credentials, encoded body, timeout) and expects
//! either a [`RawResponse`] for anything the server answered, including error statuses, or
//! an [`Error`] when nothing was received. Status classification, envelope decoding, retry,
//! and rate limiting all live above this seam so custom transports stay small.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::header::{
	ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, PROXY_AUTHORIZATION, RETRY_AFTER,
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, auth::Credential};
#[cfg(feature = "reqwest")] use crate::error::{ConfigError, NetworkError};

/// Boxed future returned by [`Transport::send`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<RawResponse>> + 'a + Send>>;

/// HTTP verbs used by the remote API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Ephemeral description of one logical call, relative to the versioned base URL.
///
/// Carries no header values, so it is safe to attach to errors and logs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RequestDescriptor {
	/// HTTP verb.
	pub method: Method,
	/// Path relative to the versioned base URL.
	pub path: String,
	/// Query parameters in insertion order.
	pub query: Vec<(String, String)>,
	/// Optional JSON body.
	pub body: Option<serde_json::Value>,
}
impl RequestDescriptor {
	/// Creates a descriptor without query or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), query: Vec::new(), body: None }
	}

	/// Appends one query parameter.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Appends several query parameters, preserving their order.
	pub fn with_query_pairs<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.query.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}

	/// Sets the JSON body.
	pub fn with_body(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}
}
impl Display for RequestDescriptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{} {}", self.method, self.path)
	}
}

/// Fully resolved request handed to a [`Transport`] for a single attempt.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute URL including query parameters.
	pub url: Url,
	/// Normalized `authorization` header value.
	pub authorization: Credential,
	/// Optional `proxy-authorization` header value.
	pub proxy_authorization: Option<Credential>,
	/// Encoded JSON body.
	pub body: Option<Vec<u8>>,
	/// Per-request timeout the transport must enforce.
	pub timeout: Duration,
}

/// Response as received from the wire, before status classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Parsed `Retry-After` header.
	pub retry_after: Option<Duration>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Creates a response without a retry hint.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, retry_after: None, body: body.into() }
	}

	/// Attaches a retry hint.
	pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
		self.retry_after = Some(retry_after);

		self
	}

	/// Whether the status is in the 2xx range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Abstraction over HTTP stacks capable of executing one request attempt.
///
/// Implementations must return `Ok` whenever the server produced a response, whatever its
/// status, and reserve `Err` for failures where nothing was received (map those to
/// [`crate::error::NetworkError`]) or for local request construction problems.
/// They must also enforce [`PreparedRequest::timeout`].
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Executes a single attempt.
	fn send(&self, request: PreparedRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn send(&self, request: PreparedRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let PreparedRequest { method, url, authorization, proxy_authorization, body, timeout } =
				request;
			let mut builder = self
				.0
				.request(reqwest_method(method), url)
				.timeout(timeout)
				.header(ACCEPT, "application/json")
				.header(AUTHORIZATION, sensitive_header("authorization", &authorization)?);

			if let Some(proxy) = proxy_authorization.as_ref() {
				builder =
					builder.header(PROXY_AUTHORIZATION, sensitive_header("proxy-authorization", proxy)?);
			}
			if let Some(body) = body {
				builder = builder.header(CONTENT_TYPE, "application/json").body(body);
			}

			let response = builder.send().await.map_err(map_reqwest_error)?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());
			let body = response.bytes().await.map_err(map_reqwest_error)?.to_vec();

			Ok(RawResponse { status, retry_after, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn reqwest_method(method: Method) -> reqwest::Method {
	match method {
		Method::Get => reqwest::Method::GET,
		Method::Post => reqwest::Method::POST,
		Method::Put => reqwest::Method::PUT,
		Method::Patch => reqwest::Method::PATCH,
		Method::Delete => reqwest::Method::DELETE,
	}
}

#[cfg(feature = "reqwest")]
fn sensitive_header(name: &'static str, value: &Credential) -> Result<HeaderValue> {
	let mut header =
		HeaderValue::from_str(value.expose()).map_err(|_| ConfigError::InvalidHeader { name })?;

	header.set_sensitive(true);

	Ok(header)
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return NetworkError::timeout(err).into();
	}
	if err.is_connect() {
		return NetworkError::connect(err).into();
	}

	NetworkError::other(err).into()
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	parse_retry_after_value(headers.get(RETRY_AFTER)?.to_str().ok()?)
}

/// Parses a `Retry-After` value given either as delta seconds or as an HTTP date.
///
/// Dates in the past and anything unparseable yield `None`.
pub fn parse_retry_after_value(raw: &str) -> Option<Duration> {
	let raw = raw.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::from_secs(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Duration::try_from(delta).ok();
		}
	}

	None
}
