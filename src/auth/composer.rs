//! Per-request header composition over hot-swappable credentials.
//!
//! [`AuthComposer`] merges three sources, in order:
//!
//! 1. `x-amz-subscriber-id` for subscription handshakes when a subscriber ID is configured.
//! 2. Signer headers when [`IamAuth`] is configured; each signed name replaces earlier values.
//! 3. `Authorization` from the current [`CredentialProvider`], replacing any signer value.
//!
//! Any failure voids the whole header set. The provider slot sits behind a readers-writer lock:
//! header builds clone the `Arc` out under the shared lock and call the provider after the guard
//! is dropped, so only the swap itself is exclusive.

// crates.io
use http::{
	HeaderMap, HeaderValue,
	header::{AUTHORIZATION, HeaderName},
};
// self
use crate::{
	_prelude::*,
	auth::{CredentialProvider, IamAuth},
	graphql::PreparedRequest,
};

/// Header carrying the subscriber identity on subscription handshakes.
pub const SUBSCRIBER_ID_HEADER: &str = "x-amz-subscriber-id";

/// Shared handle to a credential provider.
pub type SharedCredentialProvider = Arc<dyn CredentialProvider>;

/// Owns the client's auth configuration and builds the header set for each request.
pub struct AuthComposer {
	subscriber_id: Option<HeaderValue>,
	iam_auth: Option<IamAuth>,
	credential_provider: RwLock<Option<SharedCredentialProvider>>,
}
impl AuthComposer {
	pub(crate) fn new(
		subscriber_id: Option<HeaderValue>,
		iam_auth: Option<IamAuth>,
		credential_provider: Option<SharedCredentialProvider>,
	) -> Self {
		Self { subscriber_id, iam_auth, credential_provider: RwLock::new(credential_provider) }
	}

	/// Builds the header set for `request`, reflecting the provider current at call time.
	pub fn build_headers(&self, request: &PreparedRequest) -> Result<HeaderMap> {
		let mut headers = HeaderMap::new();

		if request.is_subscription()
			&& let Some(subscriber_id) = &self.subscriber_id
		{
			headers.insert(HeaderName::from_static(SUBSCRIBER_ID_HEADER), subscriber_id.clone());
		}
		if let Some(iam_auth) = &self.iam_auth {
			let signed = iam_auth.sign(request.body(), OffsetDateTime::now_utc())?;

			merge_replacing(&mut headers, signed);
		}
		if let Some(provider) = self.credential_provider() {
			let token = provider.auth_token().map_err(Error::credential)?;
			let value = HeaderValue::from_str(token.expose())
				.map_err(|_| Error::InvalidHeader { name: AUTHORIZATION.to_string() })?;

			headers.insert(AUTHORIZATION, value);
		}

		Ok(headers)
	}

	/// Replaces the credential provider, e.g. after the application refreshed its session.
	///
	/// Builds already holding the previous provider finish with it; later builds see the new one.
	pub fn update_credential_provider(&self, provider: SharedCredentialProvider) {
		*self.credential_provider.write() = Some(provider);

		#[cfg(feature = "tracing")]
		tracing::debug!("credential provider replaced");
	}

	/// Removes the credential provider so requests stop carrying a bearer token.
	pub fn clear_credential_provider(&self) {
		*self.credential_provider.write() = None;

		#[cfg(feature = "tracing")]
		tracing::debug!("credential provider cleared");
	}

	/// Snapshot of the current credential provider.
	pub fn credential_provider(&self) -> Option<SharedCredentialProvider> {
		self.credential_provider.read().clone()
	}

	/// Subscriber ID attached to subscription handshakes, if any.
	pub fn subscriber_id(&self) -> Option<&str> {
		self.subscriber_id.as_ref().and_then(|value| value.to_str().ok())
	}

	/// Signing configuration, if any.
	pub fn iam_auth(&self) -> Option<&IamAuth> {
		self.iam_auth.as_ref()
	}
}
impl Debug for AuthComposer {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthComposer")
			.field("subscriber_id", &self.subscriber_id)
			.field("iam_auth", &self.iam_auth)
			.field("credential_provider_set", &self.credential_provider.read().is_some())
			.finish()
	}
}

// `HeaderMap` yields `None` names for additional values of the previous name.
fn merge_replacing(headers: &mut HeaderMap, incoming: HeaderMap) {
	let mut current = None;

	for (name, value) in incoming {
		match name {
			Some(name) => {
				headers.insert(name.clone(), value);

				current = Some(name);
			},
			None =>
				if let Some(name) = &current {
					headers.append(name.clone(), value);
				},
		}
	}
}
