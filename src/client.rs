//! Request dispatcher: blocking and asynchronous POSTs with subscription settling.
//!
//! Every dispatch serializes the request once, asks the [`AuthComposer`] for headers, and hands
//! both to the [`GraphqlTransport`]. Subscription handshakes then wait for
//! [`Client::subscription_delay`] before the result reaches the caller, whatever the outcome:
//! AppSync needs that settling time before the new channel is safe to use.
//!
//! Asynchronous dispatch requires a tokio runtime in scope. The transport future runs on a
//! spawned task, so the settling delay and any callback execute on a runtime worker rather than
//! on the caller's thread.

mod pending;

pub use pending::*;

// std
use std::thread;
// crates.io
use http::HeaderValue;
use tokio::{runtime::Handle, task::JoinHandle};
// self
use crate::{
	_prelude::*,
	auth::{AuthComposer, CredentialProvider, IamAuth, SharedCredentialProvider},
	error::{ConfigError, TransportError},
	graphql::{OperationKind, PostRequest, PreparedRequest, Response},
	obs::{PostMode, PostOutcome, PostRecorder},
	transport::{GraphqlTransport, HeaderMap, TransportFuture},
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestTransport;

/// Settling time applied after every subscription handshake unless overridden.
pub const DEFAULT_SUBSCRIPTION_DELAY: Duration = Duration::from_secs(2);

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestAppSyncClient = Client<ReqwestTransport>;

/// AppSync GraphQL client.
///
/// Clones share the transport and the auth state, so a credential provider swapped through one
/// clone is used by all of them.
pub struct Client<T>
where
	T: ?Sized + GraphqlTransport,
{
	transport: Arc<T>,
	auth: Arc<AuthComposer>,
	subscription_delay: Duration,
}
impl<T> Client<T>
where
	T: ?Sized + GraphqlTransport,
{
	/// Starts a builder around `transport`.
	pub fn builder(transport: impl Into<Arc<T>>) -> ClientBuilder<T> {
		ClientBuilder::new(transport)
	}

	/// Transport shared by this client.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	/// Auth state shared by this client and its clones.
	pub fn auth(&self) -> &AuthComposer {
		&self.auth
	}

	/// Settling time applied after subscription handshakes.
	pub fn subscription_delay(&self) -> Duration {
		self.subscription_delay
	}

	/// Replaces the credential provider used for the `Authorization` header.
	///
	/// Safe to call while any number of requests are building headers.
	pub fn update_credential_provider(&self, provider: impl 'static + CredentialProvider) {
		self.auth.update_credential_provider(Arc::new(provider));
	}

	/// Replaces the credential provider with an already shared handle.
	pub fn update_shared_credential_provider(&self, provider: SharedCredentialProvider) {
		self.auth.update_credential_provider(provider);
	}

	/// Stops attaching a bearer token to subsequent requests.
	pub fn clear_credential_provider(&self) {
		self.auth.clear_credential_provider();
	}

	/// Builds the headers `request` would be sent with right now.
	pub fn build_headers(&self, request: &PostRequest) -> Result<HeaderMap> {
		self.prepare(request).map(|(headers, _)| headers)
	}

	/// Sends `request` and blocks until the response arrives.
	///
	/// Subscriptions additionally block for [`Client::subscription_delay`], including when
	/// header construction or the transport failed. Inside an async runtime prefer
	/// [`Client::post_async`]; the bundled reqwest transport refuses blocking sends there with
	/// [`TransportError::BlockingInRuntime`].
	pub fn post(&self, request: &PostRequest) -> Result<Response> {
		let kind = request.operation_kind();
		let recorder = PostRecorder::start(kind, PostMode::Sync);
		let _span = recorder.span().clone().entered();
		let result = self
			.prepare(request)
			.and_then(|(headers, prepared)| {
				self.transport.post(headers, &prepared).map_err(Error::from)
			});

		if let Some(delay) = self.settle_delay(kind) {
			thread::sleep(delay);
		}

		recorder.settle(PostOutcome::of(&result));

		result
	}

	/// Submits `request` and returns a future for its response.
	///
	/// Header construction happens before this returns; its failure is returned directly and no
	/// request is sent. The returned [`PendingResponse`] resolves after the transport completes
	/// and, for subscriptions, after the settling delay.
	pub fn post_async(&self, request: &PostRequest) -> Result<PendingResponse> {
		self.spawn(request, PostMode::Async, |result| result).map(PendingResponse::new)
	}

	/// Submits `request` and invokes `callback` exactly once with its outcome.
	///
	/// `callback` runs on a runtime worker after the transport completes and, for
	/// subscriptions, after the settling delay. It is never invoked when this returns `Err` or
	/// when the returned handle is cancelled first.
	pub fn post_with_callback<F>(&self, request: &PostRequest, callback: F) -> Result<CancelHandle>
	where
		F: 'static + Send + FnOnce(Result<Response>),
	{
		self.spawn(request, PostMode::Callback, callback)
			.map(|task| CancelHandle::new(task.abort_handle()))
	}

	fn spawn<F, O>(&self, request: &PostRequest, mode: PostMode, finish: F) -> Result<JoinHandle<O>>
	where
		F: 'static + Send + FnOnce(Result<Response>) -> O,
		O: 'static + Send,
	{
		let kind = request.operation_kind();
		let recorder = PostRecorder::start(kind, mode);
		let (runtime, response) = match self.submit(request) {
			Ok(submitted) => submitted,
			Err(e) => {
				recorder.settle(PostOutcome::Failure);

				return Err(e);
			},
		};
		let delay = self.settle_delay(kind);
		let span = recorder.span().clone();
		// An aborted task drops `recorder` unsettled, which records the cancellation.
		let task = runtime.spawn(span.instrument(async move {
			let result = response.await.map_err(Error::from);

			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}

			recorder.settle(PostOutcome::of(&result));

			finish(result)
		}));

		Ok(task)
	}

	fn submit(&self, request: &PostRequest) -> Result<(Handle, TransportFuture)> {
		let (headers, prepared) = self.prepare(request)?;
		let runtime = Handle::try_current()
			.map_err(|e| Error::submission(TransportError::network(e)))?;
		let response = self.transport.post_async(headers, prepared).map_err(Error::submission)?;

		Ok((runtime, response))
	}

	fn prepare(&self, request: &PostRequest) -> Result<(HeaderMap, PreparedRequest)> {
		let prepared = PreparedRequest::new(request)?;
		let headers = self.auth.build_headers(&prepared)?;

		Ok((headers, prepared))
	}

	fn settle_delay(&self, kind: OperationKind) -> Option<Duration> {
		(kind.is_subscription() && !self.subscription_delay.is_zero())
			.then_some(self.subscription_delay)
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestTransport> {
	/// Starts a builder for a reqwest-backed client posting to `endpoint`.
	pub fn reqwest(endpoint: Url) -> Result<ClientBuilder<ReqwestTransport>, ConfigError> {
		Ok(ClientBuilder::new(ReqwestTransport::new(endpoint)?))
	}
}
impl<T> Clone for Client<T>
where
	T: ?Sized + GraphqlTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			auth: Arc::clone(&self.auth),
			subscription_delay: self.subscription_delay,
		}
	}
}
impl<T> Debug for Client<T>
where
	T: ?Sized + GraphqlTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("auth", &self.auth)
			.field("subscription_delay", &self.subscription_delay)
			.finish_non_exhaustive()
	}
}

/// Builder for [`Client`] values.
///
/// Each auth mechanism is opt-in: a client may tag subscriptions with a subscriber ID, sign
/// requests, attach a bearer token, or any combination. When both signing and a credential
/// provider are configured, the provider's token wins the `Authorization` header.
pub struct ClientBuilder<T>
where
	T: ?Sized + GraphqlTransport,
{
	/// Transport every request goes through.
	pub transport: Arc<T>,
	/// Identifier attached to subscription handshakes; empty means none.
	pub subscriber_id: Option<String>,
	/// Signing configuration.
	pub iam_auth: Option<IamAuth>,
	/// Initial credential provider.
	pub credential_provider: Option<SharedCredentialProvider>,
	/// Settling time after subscription handshakes.
	pub subscription_delay: Duration,
}
impl<T> ClientBuilder<T>
where
	T: ?Sized + GraphqlTransport,
{
	/// Creates a builder with no auth mechanisms and the default settling delay.
	pub fn new(transport: impl Into<Arc<T>>) -> Self {
		Self {
			transport: transport.into(),
			subscriber_id: None,
			iam_auth: None,
			credential_provider: None,
			subscription_delay: DEFAULT_SUBSCRIPTION_DELAY,
		}
	}

	/// Sets the subscriber ID.
	pub fn subscriber_id(mut self, id: impl Into<String>) -> Self {
		self.subscriber_id = Some(id.into());

		self
	}

	/// Enables request signing.
	pub fn iam_auth(mut self, iam_auth: IamAuth) -> Self {
		self.iam_auth = Some(iam_auth);

		self
	}

	/// Sets the initial credential provider.
	pub fn credential_provider(mut self, provider: impl 'static + CredentialProvider) -> Self {
		self.credential_provider = Some(Arc::new(provider));

		self
	}

	/// Sets the initial credential provider from a shared handle.
	pub fn shared_credential_provider(mut self, provider: SharedCredentialProvider) -> Self {
		self.credential_provider = Some(provider);

		self
	}

	/// Overrides the settling delay (defaults to [`DEFAULT_SUBSCRIPTION_DELAY`]).
	pub fn subscription_delay(mut self, delay: Duration) -> Self {
		self.subscription_delay = delay;

		self
	}

	/// Validates the configuration and builds the client.
	pub fn build(self) -> Result<Client<T>, ConfigError> {
		let subscriber_id = match self.subscriber_id.filter(|id| !id.is_empty()) {
			Some(id) => Some(
				HeaderValue::from_str(&id).map_err(|_| ConfigError::InvalidSubscriberId)?,
			),
			None => None,
		};
		let auth = AuthComposer::new(subscriber_id, self.iam_auth, self.credential_provider);

		Ok(Client {
			transport: self.transport,
			auth: Arc::new(auth),
			subscription_delay: self.subscription_delay,
		})
	}
}
impl<T> Debug for ClientBuilder<T>
where
	T: ?Sized + GraphqlTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientBuilder")
			.field("subscriber_id", &self.subscriber_id)
			.field("iam_auth", &self.iam_auth)
			.field("credential_provider_set", &self.credential_provider.is_some())
			.field("subscription_delay", &self.subscription_delay)
			.finish_non_exhaustive()
	}
}
