//! HTTP client for the Search Console reporting API
//!
//! One client is built per run and shared (behind an `Arc`) by every worker.

use super::{Auth, SearchAnalyticsApi};
use crate::error::SiteFetchError;
use crate::model::{ApiDataRow, SearchAnalyticsRequest};
use crate::sites::AddressType;

use eyre::Result;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Public endpoint of the Search Console API
pub const DEFAULT_BASE_URL: &str = "https://searchconsole.googleapis.com/webmasters/v3/";

/// User-Agent sent when no application name is configured
pub const DEFAULT_USER_AGENT: &str = concat!("search-console-connector/", env!("CARGO_PKG_VERSION"));

/// Search Console client
///
/// # Example
/// ```no_run
/// use search_console_connector::client::{Auth, SearchAnalyticsApi, SearchConsoleClient};
/// use std::time::Duration;
/// use url::Url;
///
/// # async fn example() -> eyre::Result<()> {
/// let url = Url::parse("https://searchconsole.googleapis.com/webmasters/v3/")?;
/// let auth = Auth::OAuthClient {
///     client_id: "my-client".to_string(),
///     access_token: "ya29.token".to_string(),
/// };
/// let client = SearchConsoleClient::try_new(url, &auth, Duration::from_secs(60))?;
///
/// let sites = client.list_sites().await?;
/// println!("{} sites visible", sites.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct SearchConsoleClient {
    client: Client,
    url: Url,
}

impl SearchConsoleClient {
    /// Build a client that sends `auth` as a bearer token on every request.
    ///
    /// # Errors
    /// Returns an error if the token is not a valid header value or the HTTP
    /// client cannot be built
    pub fn try_new(url: Url, auth: &Auth, timeout: Duration) -> Result<Self> {
        Self::try_with_user_agent(url, auth, timeout, DEFAULT_USER_AGENT)
    }

    /// Like [`SearchConsoleClient::try_new`], identifying as `user_agent`
    pub fn try_with_user_agent(
        url: Url,
        auth: &Auth,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = auth.access_token() {
            let mut value: HeaderValue = format!("Bearer {}", token).parse()?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        log::debug!("Search Console client for {} using {}", url, auth);

        Ok(Self { client, url })
    }

    /// Get the base URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Base URL with `segments` appended, each percent-encoded as one path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SiteFetchError> {
        let mut url = self.url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                SiteFetchError::Transport(format!("base URL cannot carry a path: {}", self.url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SiteFetchError> {
        let response = request.send().await.map_err(SiteFetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SiteFetchError::Api {
                status: status.as_u16(),
                message: error_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string()),
            });
        }

        response.json().await.map_err(SiteFetchError::from_reqwest)
    }
}

/// `{"error": {"message": ...}}` as returned by Google APIs
fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SitesListResponse {
    #[serde(default)]
    site_entry: Vec<SiteListEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteListEntry {
    site_url: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    rows: Vec<ApiDataRow>,
}

impl SearchAnalyticsApi for SearchConsoleClient {
    async fn list_sites(&self) -> Result<Vec<String>, SiteFetchError> {
        let url = self.endpoint(&["sites"])?;
        log::debug!("GET {}", url);

        let response: SitesListResponse = self.send(self.client.get(url)).await?;
        Ok(response
            .site_entry
            .into_iter()
            .map(|entry| entry.site_url)
            .collect())
    }

    async fn query(
        &self,
        site: &str,
        site_type: AddressType,
        request: &SearchAnalyticsRequest,
    ) -> Result<Vec<ApiDataRow>, SiteFetchError> {
        let url = self.endpoint(&["sites", site, "searchAnalytics", "query"])?;
        log::trace!(
            "POST {} ({}, startRow {})",
            url,
            site_type,
            request.start_row
        );

        let response: QueryResponse = self.send(self.client.post(url).json(request)).await?;
        Ok(response.rows)
    }
}
