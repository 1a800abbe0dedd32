//! Engine-level error types shared across flows, the relay, and stores.

// self
use crate::_prelude::*;

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical engine error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// Redirect callback is malformed (missing or unparsable parameters).
	#[error("Malformed authorization callback: {reason}.")]
	Protocol {
		/// Description of the protocol violation.
		reason: String,
	},
	/// Returned `state` does not match the pending session; possible CSRF.
	#[error("Authorization callback failed a security check: {reason}.")]
	Security {
		/// Description of the rejected check.
		reason: String,
	},
	/// No pending authorization session exists; the flow must restart.
	#[error("No pending authorization session; start the authorization flow again.")]
	SessionExpired,
	/// Authorization server redirected back with an error code.
	#[error("Authorization server denied the request: {code}.")]
	AuthorizationDenied {
		/// OAuth error code carried by the redirect (e.g. `access_denied`).
		code: String,
	},
	/// Refresh was requested but no refresh token is stored.
	#[error("No refresh token is available.")]
	NoRefreshToken,
	/// A resource fetch was attempted without a stored access token.
	#[error("No access token is available; authenticate first.")]
	TokenMissing,
	/// Token or resource endpoint answered with a non-2xx status.
	#[error("Endpoint returned HTTP {status}.")]
	Http {
		/// HTTP status code of the failing response.
		status: u16,
		/// Raw response body, useful for OAuth error envelopes.
		body: String,
	},
	/// Transport failure before any response was received (DNS, TCP, TLS).
	#[error("Network error occurred before a response was received.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Probe operation referenced a connector id that is not registered.
	#[error("Unknown connector `{id}`.")]
	UnknownConnector {
		/// Identifier that failed to resolve.
		id: String,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response that failed to parse.
		status: u16,
	},
}
impl Error {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Builds a protocol error from a static or formatted reason.
	pub fn protocol(reason: impl Into<String>) -> Self {
		Self::Protocol { reason: reason.into() }
	}

	/// Builds a security error from a static or formatted reason.
	pub fn security(reason: impl Into<String>) -> Self {
		Self::Security { reason: reason.into() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Configuration and validation failures raised by the engine.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Base URL and endpoint path do not combine into a valid URL.
	#[error("Endpoint path `{path}` does not join onto the configured base URL.")]
	InvalidEndpointPath {
		/// Offending endpoint path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A required configuration field was left empty.
	#[error("Configuration field `{field}` is required.")]
	MissingField {
		/// Name of the missing field.
		field: &'static str,
	},
	/// A URL sourced from the environment could not be parsed.
	#[error("Environment variable `{variable}` does not contain a valid URL.")]
	InvalidEnvUrl {
		/// Name of the offending variable.
		variable: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A required environment variable is absent.
	#[error("Environment variable `{variable}` is not set.")]
	MissingEnvVar {
		/// Name of the absent variable.
		variable: &'static str,
	},
	/// Outbound request body could not be encoded.
	#[error("Failed to encode the outbound request body.")]
	RequestEncode {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_with_source() {
		let store_error = StoreError::Backend { message: "snapshot unreadable".into() };
		let engine_error: Error = store_error.clone().into();

		assert!(matches!(engine_error, Error::Storage(_)));
		assert!(engine_error.to_string().contains("snapshot unreadable"));

		let source = StdError::source(&engine_error)
			.expect("Engine error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn http_error_reports_status() {
		let err = Error::Http { status: 401, body: "{\"error\":\"invalid_token\"}".into() };

		assert_eq!(err.to_string(), "Endpoint returned HTTP 401.");
	}
}
