use async_trait::async_trait;
use reqwest::{Request, Response};

/// Anything that can execute a single outbound HTTP request.
///
/// Lookups only ever talk to the remote service through this trait, so a
/// scripted implementation can stand in for the network in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
