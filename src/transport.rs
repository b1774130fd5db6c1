//! Transport primitives for GraphQL POSTs.
//!
//! [`GraphqlTransport`] is the client's only dependency on an HTTP stack. It receives the
//! composed headers together with the [`PreparedRequest`] whose bytes were signed, and must send
//! those bytes unchanged. The crate ships [`ReqwestTransport`] behind the default `reqwest`
//! feature; applications with their own HTTP stack implement the trait directly.

pub use http::HeaderMap;

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	blocking::Client as BlockingClient,
	header::{CONTENT_TYPE, HeaderValue},
};
#[cfg(feature = "reqwest")] use tokio::runtime::Handle;
// self
use crate::{
	_prelude::*,
	error::TransportError,
	graphql::{PreparedRequest, Response},
};
#[cfg(feature = "reqwest")] use crate::{auth::signer, error::ConfigError};

/// Boxed future returned by [`GraphqlTransport::post_async`].
pub type TransportFuture = Pin<Box<dyn Future<Output = Result<Response, TransportError>> + Send>>;

/// Sends prepared GraphQL requests.
///
/// Implementations must be `Send + Sync + 'static` so one transport can back many clients and
/// the futures it returns can run on any runtime worker.
pub trait GraphqlTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and blocks the calling thread until the response arrives.
	fn post(
		&self,
		headers: HeaderMap,
		request: &PreparedRequest,
	) -> Result<Response, TransportError>;

	/// Submits `request` for asynchronous delivery.
	///
	/// An `Err` means the submission itself was refused and no network I/O happened. The returned
	/// future owns everything it needs; dropping it abandons the request.
	fn post_async(
		&self,
		headers: HeaderMap,
		request: PreparedRequest,
	) -> Result<TransportFuture, TransportError>;
}

/// Reqwest-backed transport that POSTs JSON to a single GraphQL endpoint.
///
/// The async path uses the wrapped [`ReqwestClient`]. The blocking path builds a
/// [`reqwest::blocking::Client`] on first use. Blocking reqwest clients cannot run inside an async
/// runtime, so [`GraphqlTransport::post`] refuses with [`TransportError::BlockingInRuntime`] when
/// called from one.
#[cfg(feature = "reqwest")]
pub struct ReqwestTransport {
	endpoint: Url,
	client: ReqwestClient,
	blocking: Mutex<Option<BlockingClient>>,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Creates a transport for `endpoint` with a default client.
	pub fn new(endpoint: Url) -> Result<Self, ConfigError> {
		Self::with_client(endpoint, ReqwestClient::builder().build()?)
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(endpoint: Url, client: ReqwestClient) -> Result<Self, ConfigError> {
		signer::endpoint_uri(&endpoint)?;

		Ok(Self { endpoint, client, blocking: Mutex::new(None) })
	}

	/// Installs the blocking client used by [`GraphqlTransport::post`].
	pub fn with_blocking_client(self, client: BlockingClient) -> Self {
		*self.blocking.lock() = Some(client);

		self
	}

	/// GraphQL endpoint every request is sent to.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	fn blocking_client(&self) -> Result<BlockingClient, TransportError> {
		let mut slot = self.blocking.lock();

		if let Some(client) = slot.as_ref() {
			return Ok(client.clone());
		}

		let client = BlockingClient::builder().build()?;

		*slot = Some(client.clone());

		Ok(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ReqwestTransport").field("endpoint", &self.endpoint.as_str()).finish()
	}
}
#[cfg(feature = "reqwest")]
impl GraphqlTransport for ReqwestTransport {
	fn post(
		&self,
		mut headers: HeaderMap,
		request: &PreparedRequest,
	) -> Result<Response, TransportError> {
		if Handle::try_current().is_ok() {
			return Err(TransportError::BlockingInRuntime);
		}

		with_json_content_type(&mut headers);

		let response = self
			.blocking_client()?
			.post(self.endpoint.clone())
			.headers(headers)
			.body(request.body().to_vec())
			.send()?;
		let status = response.status();
		let body = response.bytes()?;

		decode_response(status.as_u16(), status.is_success(), &body)
	}

	fn post_async(
		&self,
		mut headers: HeaderMap,
		request: PreparedRequest,
	) -> Result<TransportFuture, TransportError> {
		with_json_content_type(&mut headers);

		let pending =
			self.client.post(self.endpoint.clone()).headers(headers).body(request.body().to_vec());

		Ok(Box::pin(async move {
			let response = pending.send().await?;
			let status = response.status();
			let body = response.bytes().await?;

			decode_response(status.as_u16(), status.is_success(), &body)
		}))
	}
}

#[cfg(feature = "reqwest")]
fn with_json_content_type(headers: &mut HeaderMap) {
	headers.entry(CONTENT_TYPE).or_insert(HeaderValue::from_static("application/json"));
}

#[cfg(feature = "reqwest")]
fn decode_response(status: u16, success: bool, body: &[u8]) -> Result<Response, TransportError> {
	if !success {
		return Err(TransportError::Status {
			status,
			body: String::from_utf8_lossy(body).into_owned(),
		});
	}

	Response::from_slice(body)
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;

	#[test]
	fn reqwest_transport_rejects_non_http_endpoints() {
		let endpoint = Url::parse("ftp://example.com/graphql").expect("Fixture URL should parse.");

		assert!(matches!(
			ReqwestTransport::new(endpoint),
			Err(ConfigError::InvalidEndpoint { .. })
		));
	}

	#[test]
	fn non_success_status_keeps_the_body() {
		let err = decode_response(401, false, br#"{"errors":[]}"#)
			.expect_err("401 responses should fail.");

		assert!(matches!(
			err,
			TransportError::Status { status: 401, ref body } if body == r#"{"errors":[]}"#
		));
	}

	#[test]
	fn json_content_type_is_added_once() {
		let mut headers = HeaderMap::new();

		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/graphql"));
		with_json_content_type(&mut headers);

		assert_eq!(headers[CONTENT_TYPE], "application/graphql");
	}
}
