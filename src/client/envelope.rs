//! Discriminated success/error wrapper used by every response body.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ApiError, DecodeError},
	http::RequestDescriptor,
};

/// Response envelope: `{"status":"ok","results":T}` or `{"status":"error","error":{..}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope<T> {
	/// Successful response.
	Ok {
		/// Endpoint-specific result.
		results: T,
	},
	/// In-band error response.
	Error {
		/// Error details.
		error: ErrorPayload,
	},
}
impl<T> Envelope<T> {
	/// Converts the envelope into its results or an [`ApiError`] tied to `request`.
	pub fn into_result(self, request: &RequestDescriptor) -> Result<T> {
		match self {
			Self::Ok { results } => Ok(results),
			Self::Error { error } => Err(ApiError {
				status: error.status_code,
				payload: error,
				request: request.clone(),
			}
			.into()),
		}
	}
}

/// Error details carried by an error envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
	/// Error class name reported by the remote API.
	pub name: String,
	/// HTTP-like status code reported by the remote API.
	pub status_code: u16,
	/// Optional human-readable message.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	/// Optional structured details.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<serde_json::Value>,
}
impl ErrorPayload {
	/// Synthesizes a payload for responses whose body carries no error envelope.
	pub fn from_status(status: u16) -> Self {
		let (name, message) = match status {
			400 => ("BadRequestError", "Bad request"),
			401 => ("AuthorizationError", "Unauthorized"),
			403 => ("ForbiddenError", "Forbidden"),
			404 => ("NotFoundError", "Not found"),
			409 => ("AlreadyExistsError", "Conflict"),
			422 => ("ParameterError", "Unprocessable entity"),
			429 => ("TooManyRequestsError", "Too many requests"),
			500..=599 => ("ServerError", "Server error"),
			_ => ("HttpError", "Unexpected HTTP status"),
		};

		Self { name: name.into(), status_code: status, message: Some(message.into()), data: None }
	}

	/// Reads the error payload from a non-2xx body, falling back to [`Self::from_status`].
	pub(crate) fn from_body(status: u16, body: &[u8]) -> Self {
		match serde_json::from_slice::<Envelope<serde_json::Value>>(body) {
			Ok(Envelope::Error { error }) => error,
			_ => Self::from_status(status),
		}
	}
}
impl Display for ErrorPayload {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.message {
			Some(message) => write!(f, "{}: {message}", self.name),
			None => f.write_str(&self.name),
		}
	}
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum EnvelopeStatus {
	Ok,
	Error,
}

// Fields stay raw so the second pass can run under its own path tracker.
#[derive(Deserialize)]
struct RawEnvelope {
	status: EnvelopeStatus,
	#[serde(default)]
	results: serde_json::Value,
	#[serde(default)]
	error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct OkBody<T> {
	results: T,
}

#[derive(Deserialize)]
struct ErrorBody {
	error: ErrorPayload,
}

/// Decodes a 2xx body as an envelope and unwraps its results.
///
/// The tag is read first; `results` or `error` is then decoded on its own so failures report
/// paths such as `results[1]` instead of the envelope root.
pub(crate) fn decode_envelope<T>(status: u16, body: &[u8], request: &RequestDescriptor) -> Result<T>
where
	T: DeserializeOwned,
{
	let decode_error = |source| DecodeError { status, source };
	let deserializer = &mut serde_json::Deserializer::from_slice(body);
	let raw: RawEnvelope = serde_path_to_error::deserialize(deserializer).map_err(decode_error)?;
	let envelope = match raw.status {
		EnvelopeStatus::Ok => {
			let body = single_field("results", raw.results);
			let OkBody { results } =
				serde_path_to_error::deserialize(body).map_err(decode_error)?;

			Envelope::Ok { results }
		},
		EnvelopeStatus::Error => {
			let body = match raw.error {
				Some(error) => single_field("error", error),
				None => serde_json::Value::Object(serde_json::Map::new()),
			};
			let ErrorBody { error } =
				serde_path_to_error::deserialize(body).map_err(decode_error)?;

			Envelope::Error { error }
		},
	};

	envelope.into_result(request)
}

fn single_field(key: &str, value: serde_json::Value) -> serde_json::Value {
	let mut map = serde_json::Map::new();

	map.insert(key.into(), value);

	serde_json::Value::Object(map)
}
