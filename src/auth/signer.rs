//! Request-signing contracts (SigV4-style) and the signing configuration a client carries.

// crates.io
use http::{HeaderMap, Method, Request, Uri};
// self
use crate::{
	_prelude::*,
	error::{BoxError, ConfigError},
};

/// Service name AppSync expects in signing scopes.
pub const APPSYNC_SERVICE: &str = "appsync";

/// Computes signature headers over a serialized request.
///
/// The client hands the signer a `POST` request whose body is exactly the bytes the transport
/// will send. Implementations add their header material (for SigV4: `Authorization`,
/// `X-Amz-Date`, and optionally `X-Amz-Security-Token`) to the request in place; the client
/// then copies those headers onto the outbound request.
pub trait RequestSigner
where
	Self: Send + Sync,
{
	/// Signs `request` for `service` in `region` at `signed_at`.
	fn sign(
		&self,
		request: &mut Request<&[u8]>,
		service: &str,
		region: &str,
		signed_at: OffsetDateTime,
	) -> Result<(), BoxError>;
}

/// Signing configuration: which endpoint and region to sign for, and with what.
#[derive(Clone)]
pub struct IamAuth {
	endpoint: Url,
	uri: Uri,
	region: String,
	signer: Arc<dyn RequestSigner>,
}
impl IamAuth {
	/// Validates the endpoint + region and pairs them with `signer`.
	pub fn new(
		endpoint: Url,
		region: impl Into<String>,
		signer: Arc<dyn RequestSigner>,
	) -> Result<Self, ConfigError> {
		let region = region.into();

		if region.trim().is_empty() {
			return Err(ConfigError::EmptyRegion);
		}

		let uri = endpoint_uri(&endpoint)?;

		Ok(Self { endpoint, uri, region, signer })
	}

	/// Endpoint the signature is scoped to.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Signing region.
	pub fn region(&self) -> &str {
		&self.region
	}

	/// Signs `body` and returns only the headers the signer produced.
	pub(crate) fn sign(&self, body: &[u8], signed_at: OffsetDateTime) -> Result<HeaderMap> {
		let mut request = Request::new(body);

		*request.method_mut() = Method::POST;
		*request.uri_mut() = self.uri.clone();

		self.signer
			.sign(&mut request, APPSYNC_SERVICE, &self.region, signed_at)
			.map_err(Error::signing)?;

		Ok(request.into_parts().0.headers)
	}
}
impl Debug for IamAuth {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IamAuth")
			.field("endpoint", &self.endpoint.as_str())
			.field("region", &self.region)
			.finish_non_exhaustive()
	}
}

/// Serializable form of [`IamAuth`] minus the signer, for applications that keep endpoints in
/// their own configuration files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamAuthConfig {
	/// GraphQL endpoint the signature is scoped to.
	pub endpoint: Url,
	/// Signing region, such as `eu-west-1`.
	pub region: String,
}
impl IamAuthConfig {
	/// Attaches `signer` and validates the result.
	pub fn with_signer(self, signer: Arc<dyn RequestSigner>) -> Result<IamAuth, ConfigError> {
		IamAuth::new(self.endpoint, self.region, signer)
	}
}

pub(crate) fn endpoint_uri(endpoint: &Url) -> Result<Uri, ConfigError> {
	let invalid = || ConfigError::InvalidEndpoint { url: endpoint.to_string() };

	if !matches!(endpoint.scheme(), "http" | "https") || endpoint.host_str().is_none() {
		return Err(invalid());
	}

	endpoint.as_str().parse::<Uri>().map_err(|_| invalid())
}
