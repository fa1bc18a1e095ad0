mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use crate::error::FailureKind;
use reqwest::Url;
use tracing::debug;

/// Issues a GET for `url` and parses the body as JSON.
///
/// Transport problems, including failing to read the body, map to
/// [`FailureKind::Network`]; a body that is not JSON maps to
/// [`FailureKind::MalformedEnvelope`].
pub async fn fetch_json<C: HttpClient + ?Sized>(
    client: &C,
    url: Url,
) -> Result<serde_json::Value, FailureKind> {
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client
        .execute(req)
        .await
        .map_err(|e| FailureKind::Network(e.to_string()))?;
    let status = resp.status();
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| FailureKind::Network(e.to_string()))?;
    debug!(%status, bytes = bytes.len(), "Response received");

    serde_json::from_slice(&bytes)
        .map_err(|e| FailureKind::MalformedEnvelope(format!("body is not JSON ({e})")))
}
