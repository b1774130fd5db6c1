//! Opens an AppSync subscription with a bearer token, then rotates the token.
//!
//! 1. Point `APPSYNC_ENDPOINT` at an AppSync GraphQL URL and `APPSYNC_TOKEN` at a Cognito or
//!    Lambda-authorizer token.
//! 2. The handshake returns once the settling delay has passed.
//! 3. The token provider is swapped while the client stays shared with a background task.

// std
use std::{env, sync::Arc, time::Duration};
// crates.io
use color_eyre::{Result, eyre::eyre};
use url::Url;
// self
use appsync_client::{
	auth::{AuthToken, BoxError, StaticTokenProvider},
	client::Client,
	graphql::PostRequest,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let endpoint = Url::parse(&env::var("APPSYNC_ENDPOINT")?)?;
	let token = env::var("APPSYNC_TOKEN")?;
	let client = Client::reqwest(endpoint)?
		.subscriber_id("demo-device")
		.credential_provider(StaticTokenProvider::new(token))
		.subscription_delay(Duration::from_secs(2))
		.build()?;
	let subscription = PostRequest::new("subscription OnPost { onPost { id title } }");
	let response = client.post_async(&subscription)?.await?;

	println!("Subscription handshake extensions: {:?}.", response.extensions);

	let rotated = Arc::new(|| -> Result<AuthToken, BoxError> {
		env::var("APPSYNC_ROTATED_TOKEN").map(AuthToken::new).map_err(Into::into)
	});

	client.update_shared_credential_provider(rotated);

	let background = client.clone();
	let query = PostRequest::new("query { listPosts { items { id } } }");
	let (tx, rx) = tokio::sync::oneshot::channel();
	let _handle = background.post_with_callback(&query, move |result| {
		let _ = tx.send(result);
	})?;
	let listed = rx.await.map_err(|_| eyre!("Callback was dropped."))??;

	println!("Posts after rotation: {:?}.", listed.data);

	Ok(())
}
