//! The reporting API surface the pipeline consumes

use crate::error::SiteFetchError;
use crate::model::{ApiDataRow, SearchAnalyticsRequest};
use crate::sites::AddressType;

use std::future::Future;

/// Read-only access to the reporting API, shared by every worker of a run.
///
/// [`SearchConsoleClient`](super::SearchConsoleClient) talks HTTP; tests plug in
/// in-memory implementations.
pub trait SearchAnalyticsApi: Send + Sync {
    /// Rendered addresses of every site the credential can read
    fn list_sites(&self) -> impl Future<Output = Result<Vec<String>, SiteFetchError>> + Send;

    /// One page of report rows for `site`; an empty page ends pagination
    fn query(
        &self,
        site: &str,
        site_type: AddressType,
        request: &SearchAnalyticsRequest,
    ) -> impl Future<Output = Result<Vec<ApiDataRow>, SiteFetchError>> + Send;
}
