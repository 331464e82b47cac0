//! HTTP client for fetching listing pages
//!
//! Builds the paginated listings URL, sends browser-like headers with a
//! randomly picked user agent and classifies every response into a
//! [`FetchOutcome`]. Retrying is the crawl driver's job, not the client's.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::infrastructure::config::{HttpClientConfig, SiteConfig, player_auctions::params};

/// Characters of the body echoed to the debug log
const PREVIEW_CHARS: usize = 500;

/// A successfully fetched page body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Result of one page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success(FetchedPage),
    /// Server answered with a non-success status
    HttpError(u16),
    /// No usable response: connect, timeout or body read failure
    TransportError(String),
}

/// Retrieves one listing page by its 1-based index
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, page_index: u32) -> FetchOutcome;
}

/// reqwest-backed page fetcher
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    listings_url: Url,
    sort_field: String,
    server_id: String,
    user_agents: Vec<HeaderValue>,
    fixed_headers: HeaderMap,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(http: &HttpClientConfig, site: &SiteConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(http.timeout_seconds))
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        let base = Url::parse(&site.base_url).with_context(|| format!("Invalid base URL {}", site.base_url))?;
        let listings_url = base
            .join(&site.listings_path)
            .with_context(|| format!("Invalid listings path {}", site.listings_path))?;

        let user_agents = http
            .user_agents
            .iter()
            .map(|ua| HeaderValue::from_str(ua).with_context(|| format!("Invalid user agent {ua}")))
            .collect::<Result<Vec<_>>>()?;
        if user_agents.is_empty() {
            return Err(anyhow!("User agent pool is empty"));
        }

        let mut fixed_headers = HeaderMap::new();
        for (name, value) in [
            (ACCEPT, &http.accept),
            (ACCEPT_LANGUAGE, &http.accept_language),
            (REFERER, &http.referer),
            (CACHE_CONTROL, &http.cache_control),
        ] {
            let value = HeaderValue::from_str(value).with_context(|| format!("Invalid {name} header {value}"))?;
            fixed_headers.insert(name, value);
        }
        fixed_headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        Ok(Self {
            client,
            listings_url,
            sort_field: site.sort_field.clone(),
            server_id: site.server_id.clone(),
            user_agents,
            fixed_headers,
        })
    }

    /// Listing page URL for a 1-based page index
    pub fn page_url(&self, page_index: u32) -> Url {
        let mut url = self.listings_url.clone();
        url.query_pairs_mut()
            .append_pair(params::SORT_FIELD, &self.sort_field)
            .append_pair(params::PAGE_INDEX, &page_index.to_string())
            .append_pair(params::SERVER_ID, &self.server_id);
        url
    }

    /// Request headers with a freshly picked user agent
    pub fn identity_headers(&self) -> HeaderMap {
        let mut headers = self.fixed_headers.clone();
        let agent = &self.user_agents[fastrand::usize(..self.user_agents.len())];
        headers.insert(USER_AGENT, agent.clone());
        headers
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, page_index: u32) -> FetchOutcome {
        let url = self.page_url(page_index);
        info!("🌐 HTTP GET (page {}): {}", page_index, url);

        let response = match self.client.get(url.clone()).headers(self.identity_headers()).send().await {
            Ok(response) => response,
            Err(e) => return FetchOutcome::TransportError(e.to_string()),
        };

        let status = response.status();
        info!("Response status code: {}", status.as_u16());
        if !status.is_success() {
            return FetchOutcome::HttpError(status.as_u16());
        }

        match response.text().await {
            Ok(body) => {
                debug!("Response preview: {}", preview(&body));
                FetchOutcome::Success(FetchedPage {
                    url: url.to_string(),
                    status: status.as_u16(),
                    body,
                })
            }
            Err(e) => FetchOutcome::TransportError(format!("Failed to read response body: {e}")),
        }
    }
}

/// First characters of a body, cut on a char boundary
fn preview(body: &str) -> &str {
    match body.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client() -> HttpClient {
        HttpClient::with_config(&HttpClientConfig::default(), &SiteConfig::default()).unwrap()
    }

    fn client_for(base_url: String) -> HttpClient {
        let http = HttpClientConfig {
            timeout_seconds: 5,
            ..HttpClientConfig::default()
        };
        let site = SiteConfig {
            base_url,
            ..SiteConfig::default()
        };
        HttpClient::with_config(&http, &site).unwrap()
    }

    fn page_query(page_index: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("SortField".into(), "least-reviews".into()),
            Matcher::UrlEncoded("PageIndex".into(), page_index.into()),
            Matcher::UrlEncoded("ServerId".into(), "5568".into()),
        ])
    }

    #[tokio::test]
    async fn ok_response_is_success_with_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/osrs-account/")
            .match_query(page_query("2"))
            .match_header("referer", "https://www.playerauctions.com/")
            .match_header("user-agent", Matcher::Regex("^Mozilla/5.0".into()))
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><body>listings</body></html>")
            .create_async()
            .await;

        let outcome = client_for(server.url()).fetch(2).await;

        mock.assert_async().await;
        let FetchOutcome::Success(page) = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<html><body>listings</body></html>");
        assert!(page.url.ends_with("/osrs-account/?SortField=least-reviews&PageIndex=2&ServerId=5568"));
    }

    #[tokio::test]
    async fn error_statuses_are_http_errors() {
        let mut server = Server::new_async().await;
        let not_found = server
            .mock("GET", "/osrs-account/")
            .match_query(page_query("1"))
            .with_status(404)
            .create_async()
            .await;
        let unavailable = server
            .mock("GET", "/osrs-account/")
            .match_query(page_query("2"))
            .with_status(503)
            .with_body("try later")
            .create_async()
            .await;

        let client = client_for(server.url());
        assert_eq!(client.fetch(1).await, FetchOutcome::HttpError(404));
        assert_eq!(client.fetch(2).await, FetchOutcome::HttpError(503));
        not_found.assert_async().await;
        unavailable.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let outcome = client_for("http://127.0.0.1:1".to_string()).fetch(1).await;
        assert!(matches!(outcome, FetchOutcome::TransportError(_)), "{outcome:?}");
    }

    #[test]
    fn page_url_carries_sort_page_and_server() {
        assert_eq!(
            client().page_url(3).as_str(),
            "https://www.playerauctions.com/osrs-account/?SortField=least-reviews&PageIndex=3&ServerId=5568"
        );
    }

    #[test]
    fn identity_headers_use_pool_agent() {
        let config = HttpClientConfig::default();
        let client = client();
        for _ in 0..20 {
            let headers = client.identity_headers();
            let agent = headers.get(USER_AGENT).unwrap().to_str().unwrap();
            assert!(config.user_agents.iter().any(|ua| ua == agent));
            assert_eq!(headers.get(ACCEPT_LANGUAGE).unwrap(), "en-US,en;q=0.5");
            assert_eq!(headers.get(REFERER).unwrap(), "https://www.playerauctions.com/");
            assert_eq!(headers.get(CONNECTION).unwrap(), "keep-alive");
        }
    }

    #[test]
    fn empty_agent_pool_is_rejected() {
        let http = HttpClientConfig {
            user_agents: Vec::new(),
            ..HttpClientConfig::default()
        };
        assert!(HttpClient::with_config(&http, &SiteConfig::default()).is_err());
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(600);
        assert_eq!(preview(&body).chars().count(), PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }
}
