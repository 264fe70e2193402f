//! Main client implementation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use jdsync_config::SyncConfig;

use crate::api::{AuthApi, EnvsApi};
use crate::error::{Error, Result};
use crate::types::PanelResponse;

/// Default deadline for every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Panel API client.
///
/// The client holds no panel address: every call takes the [`SyncConfig`]
/// it should talk to, so one client serves any number of panels.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use jdsync_client::PanelClient;
///
/// # fn example() -> jdsync_client::Result<()> {
/// let client = PanelClient::builder()
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PanelClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    /// HTTP client.
    pub(crate) http: reqwest::Client,
    /// Request deadline.
    pub(crate) timeout: Duration,
}

impl std::fmt::Debug for PanelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelClient")
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

impl PanelClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the request deadline.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the auth API.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access the envs API.
    pub fn envs(&self) -> EnvsApi {
        EnvsApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a URL for an API path under the configured panel.
    pub(crate) fn url(&self, config: &SyncConfig, path: &str) -> Result<Url> {
        let base = config.panel_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{}/{}", base, path)).map_err(Error::from)
    }

    /// Make a GET request with query parameters.
    pub(crate) async fn get<T, Q>(
        &self,
        url: Url,
        token: Option<&str>,
        query: &Q,
    ) -> Result<PanelResponse<T>>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, url.clone(), token).query(query);
        self.send(url, request).await
    }

    /// Make a POST request with a JSON body.
    pub(crate) async fn post<T, B>(
        &self,
        url: Url,
        token: Option<&str>,
        body: &B,
    ) -> Result<PanelResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, url.clone(), token).json(body);
        self.send(url, request).await
    }

    /// Make a DELETE request with a JSON body.
    pub(crate) async fn delete<T, B>(
        &self,
        url: Url,
        token: Option<&str>,
        body: &B,
    ) -> Result<PanelResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::DELETE, url.clone(), token).json(body);
        self.send(url, request).await
    }

    fn request(&self, method: Method, url: Url, token: Option<&str>) -> reqwest::RequestBuilder {
        let request = self.inner.http.request(method, url);
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request under the client deadline and decode the envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        url: Url,
        request: reqwest::RequestBuilder,
    ) -> Result<PanelResponse<T>> {
        with_deadline(&url, self.inner.timeout, async move {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let bytes = response.bytes().await?;
            serde_json::from_slice(&bytes).map_err(|e| Error::InvalidResponse {
                status,
                detail: e.to_string(),
            })
        })
        .await
    }
}

/// Race `future` against a deadline.
///
/// When the deadline wins, the future is dropped and [`Error::Timeout`] is
/// returned. Work already handed to the network may still complete on the
/// remote side; its result is discarded.
pub async fn with_deadline<T, F>(url: &Url, deadline: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => {
            let mut shown = url.clone();
            shown.set_query(None);
            tracing::warn!(url = %shown, timeout_ms = deadline.as_millis() as u64, "Request timed out");
            Err(Error::Timeout {
                url: shown.to_string(),
            })
        }
    }
}

/// Builder for creating a PanelClient.
#[derive(Debug)]
pub struct ClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Set the request deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<PanelClient> {
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be greater than zero".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("jdsync/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        Ok(PanelClient {
            inner: Arc::new(ClientInner {
                http,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
