//! Bearer tokens and the providers that keep them fresh.

// self
use crate::{_prelude::*, error::BoxError};

/// Redacted bearer token wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken(String);
impl AuthToken {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for AuthToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for AuthToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AuthToken").field(&"<redacted>").finish()
	}
}
impl Display for AuthToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Source of the bearer token placed in the `Authorization` header.
///
/// Implementations typically wrap a token cache that refreshes itself (for example a Cognito
/// user-pool session). The client calls [`auth_token`](CredentialProvider::auth_token) once per
/// request, outside any lock, so a slow refresh never blocks other requests or a provider swap.
pub trait CredentialProvider
where
	Self: Send + Sync,
{
	/// Returns the current token, or an error when credentials are stale or unobtainable.
	fn auth_token(&self) -> Result<AuthToken, BoxError>;
}
impl<F> CredentialProvider for F
where
	F: Send + Sync + Fn() -> Result<AuthToken, BoxError>,
{
	fn auth_token(&self) -> Result<AuthToken, BoxError> {
		self()
	}
}

/// Provider that always hands out the same token.
#[derive(Clone, Debug)]
pub struct StaticTokenProvider(AuthToken);
impl StaticTokenProvider {
	/// Wraps a fixed token.
	pub fn new(token: impl Into<String>) -> Self {
		Self(AuthToken::new(token))
	}
}
impl CredentialProvider for StaticTokenProvider {
	fn auth_token(&self) -> Result<AuthToken, BoxError> {
		Ok(self.0.clone())
	}
}
