//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with user agent and timeouts
//! - Pacing requests through the shared [`RequestPacer`]
//! - Classifying failures into [`FetchError`]
//!
//! There is no retry logic: a failed page is reported to the caller, which
//! decides whether the model's crawl ends there.

use crate::config::Config;
use crate::crawler::scheduler::RequestPacer;
use crate::FetchError;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A successfully retrieved page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,

    /// HTTP status code
    pub status_code: u16,

    /// Page body content
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use carsensor_crawler::config::load_config;
/// use carsensor_crawler::crawler::build_http_client;
/// use std::path::Path;
///
/// let config = load_config(Path::new("crawler.toml")).unwrap();
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(config.crawler.request_timeout())
        .connect_timeout(config.crawler.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves pages for every stage of the crawl
///
/// Cloning is cheap; all clones share one client and one pacer, so the
/// minimum request interval holds across concurrently crawled models.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
    pacer: Arc<RequestPacer>,
}

impl PageFetcher {
    pub fn new(client: Client, minimum_interval: Duration) -> Self {
        Self {
            client,
            pacer: Arc::new(RequestPacer::new(minimum_interval)),
        }
    }

    /// Builds a fetcher with the client and pacing described by `config`
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        Ok(Self::new(
            client,
            config.crawler.minimum_request_interval(),
        ))
    }

    /// Fetches a page with a single GET request
    ///
    /// # Error mapping
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Request or connect timeout | `FetchError::Timeout` |
    /// | Connection refused, DNS, TLS, redirect loop | `FetchError::Network` |
    /// | Non-2xx status | `FetchError::Status` |
    /// | Body could not be read or decoded | `FetchError::Body` |
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.pacer.wait_turn().await;

        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_send_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        Ok(FetchedPage {
            url: final_url,
            status_code: status.as_u16(),
            body,
        })
    }
}

fn classify_send_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            source: error,
        }
    }
}
