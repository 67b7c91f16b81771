//! HTTP fetch for the cache controller.
//!
//! ### Behaviour
//! - Any status is a response; only transport failures are errors
//! - Timeouts map to `FETCH_TIMEOUT`, everything else to `NETWORK_ERROR`
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//! - Navigations send an HTML `Accept` header

pub mod offline;
pub mod url;

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use std::time::{Duration, Instant};

pub use self::offline::OfflineNetwork;
pub use self::url::{UrlError, is_same_origin, resolve};

use swcache_core::{AppConfig, Error, Network, Request, Response};

const NAVIGATION_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "swcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "swcache/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// reqwest-backed [`Network`].
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    fn map_send_error(url: &::url::Url, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::FetchTimeout(format!("{url}: {err}"))
        } else {
            Error::Network(format!("{url}: {err}"))
        }
    }
}

#[async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let mut builder = self.http.request(method, request.url.as_str());
        if request.is_navigation() {
            builder = builder.header(header::ACCEPT, NAVIGATION_ACCEPT);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_send_error(&request.url, e))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_send_error(&request.url, e))?;

        if body.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", body.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} {} -> {} ({}) in {}ms ({} bytes)",
            request.method,
            request.url,
            final_url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(Response {
            url: Some(final_url),
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "swcache/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "widgets/2".into(), timeout_ms: 1500, max_bytes: 1024, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "widgets/2");
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.max_bytes, 1024);
        assert_eq!(config.max_redirects, 5);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_method() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let mut request = Request::get(::url::Url::parse("http://localhost:3000/").unwrap());
        request.method = "BAD METHOD".into();

        let result = client.fetch(&request).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_network_error() {
        let client = FetchClient::new(FetchConfig { timeout: Duration::from_secs(2), ..Default::default() }).unwrap();
        let request = Request::get(::url::Url::parse("http://127.0.0.1:9/").unwrap());

        let err = client.fetch(&request).await.unwrap_err();
        assert!(err.is_network());
    }
}
