//! GraphQL request and response payloads exchanged with an AppSync endpoint.
//!
//! [`PostRequest`] is what callers build. The client turns it into a [`PreparedRequest`]
//! exactly once per dispatch; the prepared bytes are what the signer hashes and what the
//! transport sends, so a signature can never cover a different body than the one on the wire.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, error::TransportError};

/// Operation type declared by a GraphQL document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Read-only query, including the anonymous `{ ... }` shorthand.
	Query,
	/// Mutation.
	Mutation,
	/// Subscription handshake.
	Subscription,
}
impl OperationKind {
	/// Detects the operation type from the leading keyword of `document`.
	///
	/// Whitespace, commas, and `#` comments before the first token are skipped, matching
	/// GraphQL's ignored-token rules.
	pub fn detect(document: &str) -> Self {
		let keyword = first_token(document);

		if keyword == "subscription" {
			Self::Subscription
		} else if keyword == "mutation" {
			Self::Mutation
		} else {
			Self::Query
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Query => "query",
			OperationKind::Mutation => "mutation",
			OperationKind::Subscription => "subscription",
		}
	}

	/// Whether requests of this kind open a subscription channel.
	pub const fn is_subscription(self) -> bool {
		matches!(self, OperationKind::Subscription)
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outbound GraphQL operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
	/// GraphQL document.
	pub query: String,
	/// Operation to execute when the document holds several.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub operation_name: Option<String>,
	/// Variables object.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub variables: Option<Value>,
}
impl PostRequest {
	/// Creates a request for `query` without variables.
	pub fn new(query: impl Into<String>) -> Self {
		Self { query: query.into(), operation_name: None, variables: None }
	}

	/// Sets the operation name.
	pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
		self.operation_name = Some(name.into());

		self
	}

	/// Sets the variables object.
	pub fn with_variables(mut self, variables: Value) -> Self {
		self.variables = Some(variables);

		self
	}

	/// Serializes `variables` and attaches them.
	pub fn with_typed_variables<V>(self, variables: &V) -> Result<Self>
	where
		V: ?Sized + Serialize,
	{
		Ok(self.with_variables(serde_json::to_value(variables)?))
	}

	/// Operation type declared by the document.
	pub fn operation_kind(&self) -> OperationKind {
		OperationKind::detect(&self.query)
	}

	/// Whether this request is a subscription handshake.
	pub fn is_subscription(&self) -> bool {
		self.operation_kind().is_subscription()
	}
}

/// A [`PostRequest`] paired with the exact bytes that will be signed and sent.
#[derive(Clone, Debug)]
pub struct PreparedRequest {
	request: Arc<PostRequest>,
	kind: OperationKind,
	body: Arc<[u8]>,
}
impl PreparedRequest {
	/// Serializes `request` once.
	pub fn new(request: &PostRequest) -> Result<Self> {
		let body = serde_json::to_vec(request)?;

		Ok(Self {
			kind: request.operation_kind(),
			request: Arc::new(request.clone()),
			body: body.into(),
		})
	}

	/// Original request.
	pub fn request(&self) -> &PostRequest {
		&self.request
	}

	/// Operation type of the request.
	pub fn kind(&self) -> OperationKind {
		self.kind
	}

	/// Whether the request is a subscription handshake.
	pub fn is_subscription(&self) -> bool {
		self.kind.is_subscription()
	}

	/// Serialized JSON body.
	pub fn body(&self) -> &[u8] {
		&self.body
	}
}

/// Location of a GraphQL error inside the request document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
	/// 1-based line.
	pub line: u32,
	/// 1-based column.
	pub column: u32,
}

/// Error entry reported in a GraphQL response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlError {
	/// Human-readable message.
	pub message: String,
	/// AppSync error classification such as `UnauthorizedException`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_type: Option<String>,
	/// Response path the error applies to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<Vec<Value>>,
	/// Document locations the error applies to.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub locations: Vec<ErrorLocation>,
	/// Remaining fields, kept verbatim.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// GraphQL response envelope.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
	/// Result data, absent when execution failed before producing any.
	#[serde(default)]
	pub data: Option<Value>,
	/// Execution errors.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub errors: Vec<GraphqlError>,
	/// Protocol extensions; subscription handshakes carry their channel details here.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub extensions: Option<Value>,
}
impl Response {
	/// Response carrying only `data`.
	pub fn with_data(data: Value) -> Self {
		Self { data: Some(data), ..Default::default() }
	}

	/// Decodes a response body, naming the offending JSON path on failure.
	pub fn from_slice(bytes: &[u8]) -> Result<Self, TransportError> {
		let mut deserializer = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| TransportError::Decode { source })
	}

	/// Whether the endpoint reported any execution errors.
	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}

	/// Decodes `data` into a typed value; a missing `data` decodes from `null`.
	pub fn data_as<T>(&self) -> Result<T, TransportError>
	where
		T: DeserializeOwned,
	{
		let data = self.data.clone().unwrap_or(Value::Null);

		serde_path_to_error::deserialize(data)
			.map_err(|source| TransportError::Decode { source })
	}
}

fn first_token(document: &str) -> &str {
	let mut rest = document;

	loop {
		rest = rest
			.trim_start_matches(|c: char| c.is_whitespace() || c == ',' || c == '\u{feff}');

		match rest.strip_prefix('#') {
			Some(comment) => rest = comment.split_once('\n').map_or("", |(_, tail)| tail),
			None => break,
		}
	}

	let end = rest.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(rest.len());

	&rest[..end]
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn detects_operation_kinds() {
		assert_eq!(
			OperationKind::detect("subscription OnPost { onPost { id } }"),
			OperationKind::Subscription
		);
		assert_eq!(
			OperationKind::detect("  \n\tmutation { addPost { id } }"),
			OperationKind::Mutation
		);
		assert_eq!(OperationKind::detect("query { posts { id } }"), OperationKind::Query);
		assert_eq!(OperationKind::detect("{ posts { id } }"), OperationKind::Query);
		assert_eq!(
			OperationKind::detect("# listens for posts\nsubscription{onPost{id}}"),
			OperationKind::Subscription
		);
		assert_eq!(OperationKind::detect("subscriptions"), OperationKind::Query);
	}

	#[test]
	fn request_serializes_with_camel_case_and_omits_absent_fields() {
		let request = PostRequest::new("query { a }");

		assert_eq!(
			serde_json::to_string(&request).expect("Request should serialize."),
			r#"{"query":"query { a }"}"#
		);

		let request = request
			.with_operation_name("A")
			.with_variables(serde_json::json!({ "id": 1 }));

		assert_eq!(
			serde_json::to_string(&request).expect("Request should serialize."),
			r#"{"query":"query { a }","operationName":"A","variables":{"id":1}}"#
		);
	}

	#[test]
	fn prepared_request_serializes_once_and_keeps_kind() {
		let request = PostRequest::new("subscription { onPost { id } }");
		let prepared = PreparedRequest::new(&request).expect("Request should serialize.");

		assert!(prepared.is_subscription());
		assert_eq!(
			prepared.body(),
			serde_json::to_vec(&request).expect("Request should serialize.").as_slice()
		);
		assert_eq!(prepared.request(), &request);
	}

	#[test]
	fn response_decodes_appsync_errors() {
		let body = br#"{
			"data": null,
			"errors": [{
				"message": "Not Authorized",
				"errorType": "UnauthorizedException",
				"path": ["posts"],
				"locations": [{ "line": 1, "column": 3 }],
				"data": null
			}]
		}"#;
		let response = Response::from_slice(body).expect("AppSync error payload should decode.");

		assert!(response.has_errors());
		assert_eq!(response.errors[0].error_type.as_deref(), Some("UnauthorizedException"));
		assert_eq!(response.errors[0].locations, vec![ErrorLocation { line: 1, column: 3 }]);
		assert!(response.errors[0].extra.contains_key("data"));
	}

	#[test]
	fn malformed_response_names_the_path() {
		let err = Response::from_slice(br#"{"errors": {"message": "x"}}"#)
			.expect_err("A non-list errors field should be rejected.");
		let TransportError::Decode { source } = err else {
			panic!("Expected a decode error.");
		};

		assert_eq!(source.path().to_string(), "errors");
	}

	#[test]
	fn data_as_decodes_typed_payloads() {
		#[derive(Debug, Deserialize, PartialEq)]
		struct Posts {
			posts: Vec<u32>,
		}

		let response = Response::with_data(serde_json::json!({ "posts": [1, 2] }));

		assert_eq!(
			response.data_as::<Posts>().expect("Typed data should decode."),
			Posts { posts: vec![1, 2] }
		);

		let mismatched = Response::with_data(serde_json::json!({ "posts": [1, "two"] }));
		let TransportError::Decode { source } =
			mismatched.data_as::<Posts>().expect_err("String ids should be rejected.")
		else {
			panic!("Expected a decode error.");
		};

		assert_eq!(source.path().to_string(), "posts[1]");
	}
}
