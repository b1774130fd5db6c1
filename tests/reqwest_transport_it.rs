#![cfg(feature = "reqwest")]

// std
use std::{
	sync::Arc,
	time::{Duration, Instant},
};
// crates.io
use http::HeaderValue;
use httpmock::prelude::*;
use serde_json::json;
use time::OffsetDateTime;
// self
use appsync_client::{
	auth::{BoxError, IamAuth, RequestSigner, StaticTokenProvider},
	client::Client,
	error::{Error, TransportError},
	graphql::PostRequest,
	url::Url,
};

const SUBSCRIPTION: &str = "subscription OnPost { onPost { id title } }";
const SETTLE: Duration = Duration::from_millis(120);

struct LengthSigner;
impl RequestSigner for LengthSigner {
	fn sign(
		&self,
		request: &mut http::Request<&[u8]>,
		service: &str,
		region: &str,
		_signed_at: OffsetDateTime,
	) -> Result<(), BoxError> {
		let value = format!("SIGNED {service}/{region}/{}", request.body().len());
		let headers = request.headers_mut();

		headers.insert("x-amz-date", HeaderValue::from_static("20251110T120000Z"));
		headers.insert(http::header::AUTHORIZATION, HeaderValue::from_str(&value)?);

		Ok(())
	}
}

fn endpoint(server: &MockServer) -> Url {
	Url::parse(&server.url("/graphql")).expect("Mock GraphQL endpoint should parse successfully.")
}

#[test]
fn blocking_subscription_sends_token_and_subscriber_then_settles() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(POST)
			.path("/graphql")
			.header("authorization", "tok123")
			.header("x-amz-subscriber-id", "device-7")
			.header("content-type", "application/json")
			.json_body(json!({ "query": SUBSCRIPTION }));
		then.status(200).json_body(json!({
			"data": null,
			"extensions": { "subscription": { "version": "1.0.0" } }
		}));
	});
	let client = Client::reqwest(endpoint(&server))
		.expect("Reqwest transport should build.")
		.subscriber_id("device-7")
		.credential_provider(StaticTokenProvider::new("tok123"))
		.subscription_delay(SETTLE)
		.build()
		.expect("Client should build.");
	let started = Instant::now();
	let response = client
		.post(&PostRequest::new(SUBSCRIPTION))
		.expect("Subscription handshake should succeed.");

	assert!(started.elapsed() >= SETTLE);
	assert!(response.extensions.is_some());
	mock.assert();
}

#[test]
fn blocking_query_surfaces_http_status() {
	let server = MockServer::start();
	let mock = server.mock(|when, then| {
		when.method(POST).path("/graphql");
		then.status(401).body(r#"{"errors":[{"errorType":"UnauthorizedException"}]}"#);
	});
	let client = Client::reqwest(endpoint(&server))
		.expect("Reqwest transport should build.")
		.build()
		.expect("Client should build.");
	let err = client
		.post(&PostRequest::new("query { posts { id } }"))
		.expect_err("401 responses should fail.");

	assert!(matches!(
		err,
		Error::Transport(TransportError::Status { status: 401, ref body })
			if body.contains("UnauthorizedException")
	));
	mock.assert();
}

#[tokio::test]
async fn async_mutation_is_signed_over_the_sent_body() {
	let server = MockServer::start_async().await;
	let request = PostRequest::new("mutation Add($t: String!) { addPost(title: $t) { id } }")
		.with_operation_name("Add")
		.with_variables(json!({ "t": "hello" }));
	let body = serde_json::to_vec(&request).expect("Request should serialize.");
	let expected = format!("SIGNED appsync/eu-west-1/{}", body.len());
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/graphql")
				.header("authorization", expected.as_str())
				.header("x-amz-date", "20251110T120000Z")
				.body(String::from_utf8(body.clone()).expect("JSON bodies are UTF-8."));
			then.status(200).json_body(json!({ "data": { "addPost": { "id": "p-1" } } }));
		})
		.await;
	let iam_auth = IamAuth::new(endpoint(&server), "eu-west-1", Arc::new(LengthSigner))
		.expect("IAM auth should validate.");
	let client = Client::reqwest(endpoint(&server))
		.expect("Reqwest transport should build.")
		.iam_auth(iam_auth)
		.build()
		.expect("Client should build.");
	let response = client
		.post_async(&request)
		.expect("Submission should succeed.")
		.await
		.expect("Mutation should succeed.");

	assert_eq!(response.data, Some(json!({ "addPost": { "id": "p-1" } })));
	mock.assert_async().await;
}

#[tokio::test]
async fn async_provider_swap_applies_to_next_request() {
	let server = MockServer::start_async().await;
	let old = server
		.mock_async(|when, then| {
			when.method(POST).path("/graphql").header("authorization", "old-token");
			then.status(200).json_body(json!({ "data": { "n": 1 } }));
		})
		.await;
	let new = server
		.mock_async(|when, then| {
			when.method(POST).path("/graphql").header("authorization", "new-token");
			then.status(200).json_body(json!({ "data": { "n": 2 } }));
		})
		.await;
	let client = Client::reqwest(endpoint(&server))
		.expect("Reqwest transport should build.")
		.credential_provider(StaticTokenProvider::new("old-token"))
		.build()
		.expect("Client should build.");
	let query = PostRequest::new("{ n }");

	client.post_async(&query).expect("Submission should succeed.").await.expect("First call.");
	client.update_credential_provider(StaticTokenProvider::new("new-token"));
	client.post_async(&query).expect("Submission should succeed.").await.expect("Second call.");

	old.assert_async().await;
	new.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn blocking_post_inside_runtime_fails_and_client_stays_usable() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/graphql");
			then.status(200).json_body(json!({ "data": { "n": 1 } }));
		})
		.await;
	let client = Client::reqwest(endpoint(&server))
		.expect("Reqwest transport should build.")
		.build()
		.expect("Client should build.");
	let query = PostRequest::new("{ n }");
	let err = client.post(&query).expect_err("Blocking posts inside a runtime should be refused.");

	assert!(matches!(err, Error::Transport(TransportError::BlockingInRuntime)));

	let response = client
		.post_async(&query)
		.expect("Submission should succeed.")
		.await
		.expect("Async posts should still succeed.");

	assert_eq!(response.data, Some(json!({ "n": 1 })));
	mock.assert_async().await;
}
