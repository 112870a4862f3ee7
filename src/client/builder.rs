// self
use crate::{
	_prelude::*,
	auth::Credential,
	client::{ApiClient, RequestObserver},
	error::ConfigError,
	http::Transport,
	ratelimit::{RateLimiter, RateLimiterConfig},
	retry::RetryPolicy,
};
#[cfg(feature = "reqwest")]
use crate::{client::ReqwestApiClient, http::ReqwestTransport};

/// Remote API version selecting the path segment appended to the base URL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
	/// `api/v1/`
	#[default]
	V1,
	/// `api/v2/`
	V2,
}
impl ApiVersion {
	/// Relative path segment, always with a trailing slash.
	pub const fn as_path(self) -> &'static str {
		match self {
			Self::V1 => "api/v1/",
			Self::V2 => "api/v2/",
		}
	}
}

/// Builder for [`ApiClient`] values.
pub struct ApiClientBuilder {
	/// Root URL of the remote service, without the version segment.
	pub base_url: Url,
	/// API version segment.
	pub version: ApiVersion,
	/// API key sent in the `authorization` header.
	pub credential: Option<Credential>,
	/// Optional `proxy-authorization` header value.
	pub proxy_authorization: Option<Credential>,
	/// Per-request timeout.
	pub timeout: Duration,
	/// Retry policy applied to every call.
	pub retry: RetryPolicy,
	/// Shared scheduler; a default one is created when absent.
	pub limiter: Option<Arc<RateLimiter>>,
	/// Optional per-attempt observer.
	pub observer: Option<Arc<dyn RequestObserver>>,
}
impl ApiClientBuilder {
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

	/// Creates a builder targeting the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			version: ApiVersion::default(),
			credential: None,
			proxy_authorization: None,
			timeout: Self::DEFAULT_TIMEOUT,
			retry: RetryPolicy::default(),
			limiter: None,
			observer: None,
		}
	}

	/// Selects the API version.
	pub fn version(mut self, version: ApiVersion) -> Self {
		self.version = version;

		self
	}

	/// Sets the API key.
	pub fn credential(mut self, credential: impl Into<Credential>) -> Self {
		self.credential = Some(credential.into());

		self
	}

	/// Sets the `proxy-authorization` header value.
	pub fn proxy_authorization(mut self, value: impl Into<Credential>) -> Self {
		self.proxy_authorization = Some(value.into());

		self
	}

	/// Overrides the per-request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the retry policy.
	pub fn retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Shares an existing scheduler with this client.
	pub fn limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
		self.limiter = Some(limiter);

		self
	}

	/// Installs a per-attempt observer.
	pub fn observer(mut self, observer: impl 'static + RequestObserver) -> Self {
		self.observer = Some(Arc::new(observer));

		self
	}

	/// Builds a client backed by a default reqwest transport.
	#[cfg(feature = "reqwest")]
	pub fn build(self) -> Result<ReqwestApiClient> {
		let client = ReqwestClient::builder().build().map_err(ConfigError::from)?;

		self.build_with_reqwest(client)
	}

	/// Builds a client backed by the provided reqwest client.
	#[cfg(feature = "reqwest")]
	pub fn build_with_reqwest(self, client: ReqwestClient) -> Result<ReqwestApiClient> {
		self.build_with_transport(Arc::new(ReqwestTransport::with_client(client)))
	}

	/// Validates the settings and builds a client over any [`Transport`].
	pub fn build_with_transport<T>(self, transport: Arc<T>) -> Result<ApiClient<T>>
	where
		T: ?Sized + Transport,
	{
		let base_url = versioned_base(self.base_url, self.version)?;
		let credential = self
			.credential
			.filter(|credential| !credential.is_blank())
			.ok_or(ConfigError::MissingCredential)?;
		let limiter = match self.limiter {
			Some(limiter) => limiter,
			None => RateLimiter::shared(RateLimiterConfig::default())?,
		};

		Ok(ApiClient {
			transport,
			base_url,
			authorization: credential.authorization_value(),
			proxy_authorization: self.proxy_authorization,
			timeout: self.timeout,
			retry: self.retry,
			limiter,
			observer: self.observer,
		})
	}
}
impl Debug for ApiClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClientBuilder")
			.field("base_url", &self.base_url.as_str())
			.field("version", &self.version)
			.field("credential", &self.credential)
			.field("proxy_authorization", &self.proxy_authorization)
			.field("timeout", &self.timeout)
			.field("retry", &self.retry)
			.field("has_limiter", &self.limiter.is_some())
			.field("has_observer", &self.observer.is_some())
			.finish()
	}
}

fn versioned_base(mut url: Url, version: ApiVersion) -> Result<Url, ConfigError> {
	if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
		return Err(ConfigError::InvalidBaseUrl { url: url.to_string() });
	}

	url.set_query(None);
	url.set_fragment(None);

	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url.join(version.as_path())
		.map_err(|source| ConfigError::InvalidPath { path: version.as_path().into(), source })
}
