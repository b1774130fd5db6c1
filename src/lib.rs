//! AppSync GraphQL client that composes subscriber tagging, request signing, and hot-swappable
//! bearer credentials into every query, mutation, and subscription handshake.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod error;
pub mod graphql;
pub mod obs;
pub mod transport;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fakes for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use crate::{
		auth::{AuthToken, BoxError, CredentialProvider, RequestSigner},
		client::{Client, ClientBuilder},
		error::TransportError,
		graphql::{PostRequest, PreparedRequest, Response},
		transport::{GraphqlTransport, HeaderMap, TransportFuture},
	};

	/// Query document used by fixtures that need a non-subscription operation.
	pub const QUERY: &str = "query ListPosts { posts { id } }";
	/// Mutation document used by fixtures.
	pub const MUTATION: &str =
		"mutation AddPost($title: String!) { addPost(title: $title) { id } }";
	/// Subscription document used by fixtures.
	pub const SUBSCRIPTION: &str = "subscription OnPost { onPost { id } }";

	/// One request observed by [`RecordingTransport`].
	#[derive(Clone, Debug)]
	pub struct RecordedCall {
		/// Headers handed to the transport.
		pub headers: HeaderMap,
		/// Exact body bytes handed to the transport.
		pub body: Vec<u8>,
	}

	/// Transport fake that records every call and answers with a canned outcome.
	#[derive(Debug, Default)]
	pub struct RecordingTransport {
		calls: Mutex<Vec<RecordedCall>>,
		fail_with: Option<String>,
		reject_submission: bool,
	}
	impl RecordingTransport {
		/// Transport that answers every call with an error carrying `message`.
		pub fn failing(message: impl Into<String>) -> Self {
			Self { fail_with: Some(message.into()), ..Default::default() }
		}

		/// Transport whose async path refuses submission outright.
		pub fn rejecting() -> Self {
			Self { reject_submission: true, ..Default::default() }
		}

		/// Snapshot of recorded calls.
		pub fn calls(&self) -> Vec<RecordedCall> {
			self.calls.lock().clone()
		}

		fn record(
			&self,
			headers: HeaderMap,
			request: &PreparedRequest,
		) -> Result<Response, TransportError> {
			self.calls.lock().push(RecordedCall { headers, body: request.body().to_vec() });

			match &self.fail_with {
				Some(message) => Err(TransportError::network(FakeError(message.clone()))),
				None => Ok(Response::with_data(serde_json::json!({ "ok": true }))),
			}
		}
	}
	impl GraphqlTransport for RecordingTransport {
		fn post(
			&self,
			headers: HeaderMap,
			request: &PreparedRequest,
		) -> Result<Response, TransportError> {
			self.record(headers, request)
		}

		fn post_async(
			&self,
			headers: HeaderMap,
			request: PreparedRequest,
		) -> Result<TransportFuture, TransportError> {
			if self.reject_submission {
				return Err(TransportError::network(FakeError("queue full".into())));
			}

			let result = self.record(headers, &request);

			Ok(Box::pin(async move { result }))
		}
	}

	/// Plain error type used by fakes.
	#[derive(Debug, ThisError)]
	#[error("{0}")]
	pub struct FakeError(pub String);

	/// Signer fake that stamps a fixed header set or fails.
	#[derive(Debug, Default)]
	pub struct FakeSigner {
		/// When set, signing fails with this message.
		pub fail_with: Option<String>,
		/// Body bytes observed by the last signing call.
		pub signed_body: Mutex<Option<Vec<u8>>>,
	}
	impl FakeSigner {
		/// Signer that always fails.
		pub fn failing(message: impl Into<String>) -> Self {
			Self { fail_with: Some(message.into()), ..Default::default() }
		}
	}
	impl RequestSigner for FakeSigner {
		fn sign(
			&self,
			request: &mut ::http::Request<&[u8]>,
			_service: &str,
			_region: &str,
			_signed_at: OffsetDateTime,
		) -> Result<(), BoxError> {
			if let Some(message) = &self.fail_with {
				return Err(Box::new(FakeError(message.clone())));
			}

			*self.signed_body.lock() = Some(request.body().to_vec());

			let headers = request.headers_mut();

			headers.insert("x-amz-date", ::http::HeaderValue::from_static("D"));
			headers.insert(::http::header::AUTHORIZATION, ::http::HeaderValue::from_static("sig"));

			Ok(())
		}
	}

	/// Credential provider fake that counts how often it was asked for a token.
	#[derive(Debug)]
	pub struct CountingProvider {
		token: Option<String>,
		calls: AtomicUsize,
	}
	impl CountingProvider {
		/// Provider that always returns `token`.
		pub fn new(token: impl Into<String>) -> Self {
			Self { token: Some(token.into()), calls: AtomicUsize::new(0) }
		}

		/// Provider that always fails, as if its refresh token expired.
		pub fn failing() -> Self {
			Self { token: None, calls: AtomicUsize::new(0) }
		}

		/// Number of token requests served so far.
		pub fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}
	impl CredentialProvider for CountingProvider {
		fn auth_token(&self) -> Result<AuthToken, BoxError> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			match &self.token {
				Some(token) => Ok(AuthToken::new(token.clone())),
				None => Err(Box::new(FakeError("refresh token expired".into()))),
			}
		}
	}

	#[cfg(feature = "metrics")]
	type Labels = Vec<(String, String)>;

	/// Metrics recorder that tallies counter increments by label set.
	#[cfg(feature = "metrics")]
	#[derive(Clone, Debug, Default)]
	pub struct TallyRecorder {
		counts: Arc<Mutex<Vec<(Labels, u64)>>>,
	}
	#[cfg(feature = "metrics")]
	impl TallyRecorder {
		/// Sum of every counter carrying the `key=value` label.
		pub fn count(&self, key: &str, value: &str) -> u64 {
			self.counts
				.lock()
				.iter()
				.filter(|(labels, _)| labels.iter().any(|(k, v)| k == key && v == value))
				.map(|(_, count)| count)
				.sum()
		}
	}
	#[cfg(feature = "metrics")]
	impl metrics::Recorder for TallyRecorder {
		fn describe_counter(
			&self,
			_: metrics::KeyName,
			_: Option<metrics::Unit>,
			_: metrics::SharedString,
		) {
		}

		fn describe_gauge(
			&self,
			_: metrics::KeyName,
			_: Option<metrics::Unit>,
			_: metrics::SharedString,
		) {
		}

		fn describe_histogram(
			&self,
			_: metrics::KeyName,
			_: Option<metrics::Unit>,
			_: metrics::SharedString,
		) {
		}

		fn register_counter(
			&self,
			key: &metrics::Key,
			_: &metrics::Metadata<'_>,
		) -> metrics::Counter {
			let labels =
				key.labels().map(|label| (label.key().to_owned(), label.value().to_owned())).collect();

			metrics::Counter::from_arc(Arc::new(TallyCounter {
				labels,
				counts: Arc::clone(&self.counts),
			}))
		}

		fn register_gauge(&self, _: &metrics::Key, _: &metrics::Metadata<'_>) -> metrics::Gauge {
			metrics::Gauge::noop()
		}

		fn register_histogram(
			&self,
			_: &metrics::Key,
			_: &metrics::Metadata<'_>,
		) -> metrics::Histogram {
			metrics::Histogram::noop()
		}
	}

	#[cfg(feature = "metrics")]
	struct TallyCounter {
		labels: Labels,
		counts: Arc<Mutex<Vec<(Labels, u64)>>>,
	}
	#[cfg(feature = "metrics")]
	impl metrics::CounterFn for TallyCounter {
		fn increment(&self, value: u64) {
			let mut counts = self.counts.lock();

			match counts.iter_mut().find(|(labels, _)| *labels == self.labels) {
				Some((_, count)) => *count += value,
				None => counts.push((self.labels.clone(), value)),
			}
		}

		fn absolute(&self, value: u64) {
			let mut counts = self.counts.lock();

			counts.retain(|(labels, _)| *labels != self.labels);
			counts.push((self.labels.clone(), value));
		}
	}

	/// Builds a request from a document without variables.
	pub fn request(query: &str) -> PostRequest {
		PostRequest::new(query)
	}

	/// Starts a client builder around a shared [`RecordingTransport`].
	pub fn recording_client_builder(
		transport: RecordingTransport,
	) -> (ClientBuilder<RecordingTransport>, Arc<RecordingTransport>) {
		let transport = Arc::new(transport);

		(Client::builder(Arc::clone(&transport)), transport)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::{Mutex, RwLock};
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
