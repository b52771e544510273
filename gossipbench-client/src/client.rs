use std::time::Duration;

use gossipbench::Address;
use reqwest::header::CONTENT_TYPE;

use crate::error::{ClientError, Result};
use crate::protocol::{Member, PublishRequest};

/// HTTP settings shared by every client built from the same builder
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(1),
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(30),
        }
    }
}

/// Builder for creating a GossipClient
#[derive(Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a new client builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-request timeout (connect + send + response)
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set maximum number of idle connections kept per node
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Set idle connection timeout
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<GossipClient> {
        GossipClient::from_config(self.config)
    }
}

/// Client for the control endpoints of gossip nodes
///
/// Cloning is cheap and shares the underlying connection pool. Use
/// [`GossipClient::fresh`] to get an instance with its own pool, e.g. one per
/// dispatch worker.
#[derive(Clone)]
pub struct GossipClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl GossipClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    /// Create a new client builder for advanced configuration
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    fn from_config(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()?;

        Ok(Self { http, config })
    }

    /// A client with the same settings and its own connection pool
    pub fn fresh(&self) -> Result<Self> {
        Self::from_config(self.config.clone())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `POST /publish` with the payload under `test-meta`
    pub async fn publish(&self, node: &Address, payload: String) -> Result<()> {
        let url = node.url("/publish");
        let response = self
            .http
            .post(&url)
            .json(&PublishRequest::new(payload))
            .send()
            .await
            .map_err(map_send_error)?;

        check_status(&url, &response)?;
        Ok(())
    }

    /// `GET /list` as untyped JSON entries
    pub async fn list(&self, node: &Address) -> Result<Vec<serde_json::Value>> {
        let (url, body) = self.get_text(node, "/list").await?;
        serde_json::from_str(&body).map_err(|source| ClientError::Parse { url, source })
    }

    /// `GET /list` parsed into typed members
    pub async fn members(&self, node: &Address) -> Result<Vec<Member>> {
        let (url, body) = self.get_text(node, "/list").await?;
        serde_json::from_str(&body).map_err(|source| ClientError::Parse { url, source })
    }

    /// First entry of `GET /list`, the node's own membership record
    pub async fn first_entry(&self, node: &Address) -> Result<(serde_json::Value, usize)> {
        let entries = self.list(node).await?;
        let count = entries.len();
        let first = entries
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::EmptyList {
                url: node.url("/list"),
            })?;
        Ok((first, count))
    }

    /// `POST /set` with a raw JSON body, returning the response text
    pub async fn set(&self, node: &Address, body: String) -> Result<String> {
        let url = node.url("/set");
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_send_error)?;

        check_status(&url, &response)?;
        response.text().await.map_err(map_send_error)
    }

    /// `GET /metadata` as text
    pub async fn metadata(&self, node: &Address) -> Result<String> {
        self.get_text(node, "/metadata").await.map(|(_, body)| body)
    }

    async fn get_text(&self, node: &Address, path: &str) -> Result<(String, String)> {
        let url = node.url(path);
        let response = self.http.get(&url).send().await.map_err(map_send_error)?;

        check_status(&url, &response)?;
        let body = response.text().await.map_err(map_send_error)?;
        Ok((url, body))
    }
}

fn map_send_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Http(err)
    }
}

fn check_status(url: &str, response: &reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        tracing::trace!("{} answered {}", url, status);
        Err(ClientError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}
