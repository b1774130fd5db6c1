//! Handles for in-flight asynchronous requests.

// std
use std::{
	panic,
	task::{Context, Poll},
};
// crates.io
use tokio::task::{AbortHandle, JoinHandle};
// self
use crate::{_prelude::*, graphql::Response};

/// Future resolving to the outcome of [`Client::post_async`](crate::client::Client::post_async).
///
/// Dropping the future detaches the request; it still runs to completion. Use
/// [`cancel`](PendingResponse::cancel) to abandon it.
#[derive(Debug)]
pub struct PendingResponse {
	task: JoinHandle<Result<Response>>,
}
impl PendingResponse {
	pub(crate) fn new(task: JoinHandle<Result<Response>>) -> Self {
		Self { task }
	}

	/// Requests cancellation; a request that has not completed resolves to [`Error::Cancelled`].
	pub fn cancel(&self) {
		self.task.abort();
	}

	/// Detached handle that can cancel the request from elsewhere.
	pub fn cancel_handle(&self) -> CancelHandle {
		CancelHandle::new(self.task.abort_handle())
	}

	/// Whether the request, including any settling delay, has finished.
	pub fn is_finished(&self) -> bool {
		self.task.is_finished()
	}
}
impl Future for PendingResponse {
	type Output = Result<Response>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.task).poll(cx) {
			Poll::Pending => Poll::Pending,
			Poll::Ready(Ok(result)) => Poll::Ready(result),
			Poll::Ready(Err(e)) if e.is_cancelled() => Poll::Ready(Err(Error::Cancelled)),
			Poll::Ready(Err(e)) => panic::resume_unwind(e.into_panic()),
		}
	}
}

/// Cancels an in-flight asynchronous request.
///
/// Cancelling after the request finished has no effect. Cancelling earlier stops the request at
/// its next suspension point: the transport future is dropped, or the settling delay is cut
/// short, and no result or callback is delivered.
#[derive(Clone, Debug)]
pub struct CancelHandle(AbortHandle);
impl CancelHandle {
	pub(crate) fn new(handle: AbortHandle) -> Self {
		Self(handle)
	}

	/// Requests cancellation.
	pub fn cancel(&self) {
		self.0.abort();
	}

	/// Whether the request has finished, by completion or cancellation.
	pub fn is_finished(&self) -> bool {
		self.0.is_finished()
	}
}
