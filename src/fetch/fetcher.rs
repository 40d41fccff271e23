//! Paginated fetching with per-site failure isolation

use super::RetryPolicy;
use crate::client::SearchAnalyticsApi;
use crate::error::SiteFetchError;
use crate::model::{ApiDataRow, FetchQuery};
use crate::sites::AddressType;
use crate::split::WorkSplit;

use std::sync::Arc;
use std::time::Duration;

/// Default bound on a single page request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of one page request
#[derive(Debug, Clone, PartialEq)]
pub enum PageResult {
    /// A non-empty page; there may be more
    Rows(Vec<ApiDataRow>),
    /// An empty or absent page; the site is exhausted
    End,
    /// The request failed after retries; no further pages are requested
    Failed(SiteFetchError),
}

/// Pages through every site of a split, one page at a time per site.
///
/// Failures are absorbed per site: the failing site stops, its earlier pages are kept,
/// and the next site is fetched as usual.
pub struct PaginatedFetcher<A> {
    api: Arc<A>,
    query: Arc<FetchQuery>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl<A> Clone for PaginatedFetcher<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            query: Arc::clone(&self.query),
            retry: self.retry,
            timeout: self.timeout,
        }
    }
}

impl<A: SearchAnalyticsApi> PaginatedFetcher<A> {
    pub fn new(api: Arc<A>, query: Arc<FetchQuery>) -> Self {
        Self {
            api,
            query,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn query(&self) -> &FetchQuery {
        &self.query
    }

    /// Request the page of `site` starting at `start_row`
    pub async fn fetch_page(&self, site: &str, site_type: AddressType, start_row: u64) -> PageResult {
        let request = self.query.page(start_row);
        let api = self.api.as_ref();
        let request = &request;
        let timeout = self.timeout;

        let result = self
            .retry
            .run(site, move || async move {
                tokio::time::timeout(timeout, api.query(site, site_type, request))
                    .await
                    .unwrap_or(Err(SiteFetchError::Timeout(timeout)))
            })
            .await;

        match result {
            Ok(rows) if rows.is_empty() => PageResult::End,
            Ok(rows) => PageResult::Rows(rows),
            Err(e) => PageResult::Failed(e),
        }
    }

    /// Every row of one site, in page order.
    ///
    /// Offsets advance by exactly the configured row limit.
    pub async fn fetch_site(&self, site: &str) -> Vec<ApiDataRow> {
        let site_type = AddressType::of_rendered(site);
        let stride = u64::from(self.query.row_limit);

        let mut rows = Vec::new();
        let mut start_row = 0u64;
        loop {
            match self.fetch_page(site, site_type, start_row).await {
                PageResult::Rows(page) => {
                    log::debug!("{}: {} rows at offset {}", site, page.len(), start_row);
                    rows.extend(page);
                    start_row += stride;
                }
                PageResult::End => break,
                PageResult::Failed(e) => {
                    log::error!("Failed to fetch site: {} - {}", site, e);
                    break;
                }
            }
        }

        log::debug!("{}: fetched {} rows", site, rows.len());
        rows
    }

    /// Rows of every site in the split, concatenated in site order
    pub async fn fetch(&self, split: &WorkSplit) -> Vec<ApiDataRow> {
        let mut rows = Vec::new();
        for site in split.sites() {
            rows.extend(self.fetch_site(site).await);
        }
        rows
    }
}
