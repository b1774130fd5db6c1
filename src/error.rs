//! Client-level error types shared across header composition, transports, and dispatch.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error returned by pluggable collaborators (credential providers, signers).
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// Every variant is recoverable from the client's point of view; the client stays usable after
/// any of them.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The request could not be serialized into the bytes that are signed and sent.
	#[error("Request could not be serialized.")]
	Serialization(#[from] serde_json::Error),
	/// The request signer rejected the request.
	#[error("Request signing failed.")]
	Signing {
		/// Signer-specific failure.
		#[source]
		source: BoxError,
	},
	/// The credential provider could not supply a token.
	#[error("Credential provider could not supply an auth token.")]
	Credential {
		/// Provider-specific failure.
		#[source]
		source: BoxError,
	},
	/// A computed header value is not valid on the wire.
	#[error("Header `{name}` has a value that cannot be sent.")]
	InvalidHeader {
		/// Header name whose value was rejected.
		name: String,
	},
	/// Transport failure (DNS, TCP, TLS, HTTP status, decoding).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The transport refused the asynchronous submission before any network I/O.
	#[error("Asynchronous submission was rejected.")]
	Submission {
		/// Transport-supplied rejection reason.
		#[source]
		source: TransportError,
	},
	/// The asynchronous request was cancelled before it completed.
	#[error("Request was cancelled.")]
	Cancelled,
}
impl Error {
	/// Wraps a signer failure.
	pub fn signing(source: BoxError) -> Self {
		Self::Signing { source }
	}

	/// Wraps a credential provider failure.
	pub fn credential(source: BoxError) -> Self {
		Self::Credential { source }
	}

	/// Wraps an async submission failure.
	pub fn submission(source: TransportError) -> Self {
		Self::Submission { source }
	}
}

/// Configuration and validation failures raised while building a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Subscriber identifier cannot be carried in a header.
	#[error("Subscriber ID is not a valid header value.")]
	InvalidSubscriberId,
	/// Endpoint used for signing or sending is not an absolute HTTP(S) URL.
	#[error("Endpoint `{url}` must be an absolute http(s) URL with a host.")]
	InvalidEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Signing region is empty.
	#[error("Signing region must not be empty.")]
	EmptyRegion,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, HTTP status, response decoding).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the GraphQL endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Endpoint answered with a non-success HTTP status.
	#[error("GraphQL endpoint returned HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Response body, kept for diagnostics.
		body: String,
	},
	/// Endpoint responded with JSON that is not a GraphQL response.
	#[error("GraphQL endpoint returned a malformed response.")]
	Decode {
		/// Structured parsing failure naming the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the GraphQL endpoint.")]
	Io(#[from] std::io::Error),
	/// Blocking send refused because the caller is running inside an async runtime.
	#[error("Blocking GraphQL POST was called from inside an async runtime; use `post_async`.")]
	BlockingInRuntime,
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
