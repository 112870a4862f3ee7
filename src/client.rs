//! Remote API client: rate limiting, retry, status classification, and envelope unwrapping.
//!
//! Every call takes one admission from the shared [`RateLimiter`], then runs the retry policy
//! over individual transport attempts. Classification happens per attempt so the retry policy
//! sees typed errors. The envelope is decoded only after the attempts settle, which means
//! in-band error envelopes are never retried.

/// Client builder and API version selection.
pub mod builder;
pub mod envelope;
pub mod observe;

pub use builder::*;
pub use envelope::*;
pub use observe::*;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::{ApiError, ConfigError, RateLimitError},
	http::{Method, PreparedRequest, RawResponse, RequestDescriptor, Transport},
	obs,
	pagination::{self, Page, PageRequest},
	ratelimit::RateLimiter,
	retry::RetryPolicy,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Client type alias used with the default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Authenticated client for the remote analytics API.
pub struct ApiClient<T>
where
	T: ?Sized + Transport,
{
	transport: Arc<T>,
	base_url: Url,
	authorization: Credential,
	proxy_authorization: Option<Credential>,
	timeout: Duration,
	retry: RetryPolicy,
	limiter: Arc<RateLimiter>,
	observer: Option<Arc<dyn RequestObserver>>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + Transport,
{
	/// Starts a builder for the given base URL.
	pub fn builder(base_url: Url) -> ApiClientBuilder {
		ApiClientBuilder::new(base_url)
	}

	/// Versioned base URL every path is resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Shared scheduler throttling this client.
	pub fn limiter(&self) -> &Arc<RateLimiter> {
		&self.limiter
	}

	/// Retry policy applied to each call.
	pub fn retry_policy(&self) -> RetryPolicy {
		self.retry
	}

	/// Underlying transport.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Issues a `GET` and returns the envelope's `results`.
	pub async fn get<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.request(RequestDescriptor::new(Method::Get, path)).await
	}

	/// Issues a `GET` with query parameters.
	pub async fn get_with_query<R>(&self, path: &str, query: &[(&str, &str)]) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.request(RequestDescriptor::new(Method::Get, path).with_query_pairs(query.iter().copied()))
			.await
	}

	/// Issues a `POST` with a JSON body.
	pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.request(RequestDescriptor::new(Method::Post, path).with_body(encode_body(body)?)).await
	}

	/// Issues a `PUT` with a JSON body.
	pub async fn put<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.request(RequestDescriptor::new(Method::Put, path).with_body(encode_body(body)?)).await
	}

	/// Issues a `PATCH` with a JSON body.
	pub async fn patch<B, R>(&self, path: &str, body: &B) -> Result<R>
	where
		B: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		self.request(RequestDescriptor::new(Method::Patch, path).with_body(encode_body(body)?))
			.await
	}

	/// Issues a `DELETE`.
	pub async fn delete<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.request(RequestDescriptor::new(Method::Delete, path)).await
	}

	/// Fetches every page of a paginated listing and concatenates the items.
	///
	/// `filters` are forwarded unchanged on every request, followed by `page` and `pageSize`.
	pub async fn get_all<R>(
		&self,
		path: &str,
		filters: &[(&str, &str)],
		page_size: Option<u32>,
	) -> Result<Vec<R>>
	where
		R: DeserializeOwned,
	{
		pagination::collect_pages(
			|PageRequest { page, page_size }| {
				let request = RequestDescriptor::new(Method::Get, path)
					.with_query_pairs(filters.iter().copied())
					.with_query("page", page.to_string())
					.with_query("pageSize", page_size.to_string());

				async move { self.request::<Page<R>>(request).await }
			},
			page_size,
		)
		.await
	}

	/// Executes a described request through the limiter and retry policy.
	pub async fn request<R>(&self, request: RequestDescriptor) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let prepared = self.prepare(&request)?;
		let response = self
			.limiter
			.schedule(|| self.retry.run(|| self.attempt(prepared.clone(), &request)))
			.await??;

		envelope::decode_envelope(response.status, &response.body, &request)
	}

	fn prepare(&self, request: &RequestDescriptor) -> Result<PreparedRequest> {
		let relative = request.path.trim_start_matches('/');
		let mut url = self.base_url.join(relative).map_err(|source| ConfigError::InvalidPath {
			path: request.path.clone(),
			source,
		})?;

		if !url.as_str().starts_with(self.base_url.as_str()) {
			return Err(ConfigError::PathOutsideBase { path: request.path.clone() }.into());
		}
		if !request.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&request.query);
		}

		let body = request
			.body
			.as_ref()
			.map(serde_json::to_vec)
			.transpose()
			.map_err(|source| ConfigError::EncodeBody { source })?;

		Ok(PreparedRequest {
			method: request.method,
			url,
			authorization: self.authorization.clone(),
			proxy_authorization: self.proxy_authorization.clone(),
			body,
			timeout: self.timeout,
		})
	}

	async fn attempt(
		&self,
		prepared: PreparedRequest,
		request: &RequestDescriptor,
	) -> Result<RawResponse> {
		let method = prepared.method;
		let url = prepared.url.to_string();
		let started = Instant::now();
		let sent = self.transport.send(prepared).await;
		let status = sent.as_ref().ok().map(|response| response.status);
		let outcome = sent.and_then(|response| classify(response, request));
		let event = RequestEvent {
			method,
			url,
			status,
			duration: started.elapsed(),
			error: outcome.as_ref().err().map(ToString::to_string),
		};

		if let Some(observer) = &self.observer {
			observer.observe(&event);
		}

		obs::trace_request(&event);
		obs::record_request(&event);

		outcome
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + Transport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			base_url: self.base_url.clone(),
			authorization: self.authorization.clone(),
			proxy_authorization: self.proxy_authorization.clone(),
			timeout: self.timeout,
			retry: self.retry,
			limiter: self.limiter.clone(),
			observer: self.observer.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.base_url.as_str())
			.field("authorization", &self.authorization)
			.field("timeout", &self.timeout)
			.field("retry", &self.retry)
			.finish_non_exhaustive()
	}
}

fn encode_body<B>(body: &B) -> Result<serde_json::Value>
where
	B: ?Sized + Serialize,
{
	Ok(serde_json::to_value(body).map_err(|source| ConfigError::EncodeBody { source })?)
}

fn classify(response: RawResponse, request: &RequestDescriptor) -> Result<RawResponse> {
	if response.is_success() {
		return Ok(response);
	}

	let api = ApiError {
		status: response.status,
		payload: ErrorPayload::from_body(response.status, &response.body),
		request: request.clone(),
	};

	if response.status == 429 {
		return Err(RateLimitError { api, retry_after: response.retry_after }.into());
	}

	Err(api.into())
}
