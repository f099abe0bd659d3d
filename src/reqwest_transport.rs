//! [`Transport`] over a [`reqwest::Client`]

use crate::transport::{DigestTransport, Transport};
use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use std::time::Duration;

/// Client builder with the timeouts this crate uses by default: 30s to connect, 30s TCP
/// keepalive, idle connections dropped after 90s, at most 100 of them per host.
/// Proxies are taken from the environment, as reqwest does out of the box.
pub fn default_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(100)
}

/// Sends requests through a reqwest client. Response bodies are streamed from the connection.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        ReqwestTransport { client }
    }

    /// Transport over a client from [`default_client_builder`]
    pub fn with_defaults() -> reqwest::Result<Self> {
        Ok(ReqwestTransport::new(default_client_builder().build()?))
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    type Error = reqwest::Error;
    type ResponseBody = reqwest::Body;

    async fn send(&self, request: Request<Bytes>) -> reqwest::Result<Response<reqwest::Body>> {
        let request = reqwest::Request::try_from(request)?;
        let response = self.client.execute(request).await?;
        Ok(response.into())
    }
}

impl DigestTransport<ReqwestTransport> {
    /// Digest transport over a reqwest client with the default settings
    pub fn with_default_transport(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> reqwest::Result<Self> {
        Ok(DigestTransport::new(
            username,
            password,
            ReqwestTransport::with_defaults()?,
        ))
    }
}
