//! Extractor over one work split

use super::PaginatedFetcher;
use crate::client::SearchAnalyticsApi;
use crate::etl::Extractor;
use crate::model::EnrichedRow;
use crate::sites::AddressType;
use crate::split::WorkSplit;
use crate::transform::enrich;

use eyre::Result;

/// Fetches every site of a split and tags each row with its site.
///
/// Never fails: sites that cannot be fetched contribute no rows.
pub struct SplitExtractor<A> {
    fetcher: PaginatedFetcher<A>,
    split: WorkSplit,
}

impl<A: SearchAnalyticsApi> SplitExtractor<A> {
    pub fn new(fetcher: PaginatedFetcher<A>, split: WorkSplit) -> Self {
        Self { fetcher, split }
    }

    pub fn split(&self) -> &WorkSplit {
        &self.split
    }
}

impl<A: SearchAnalyticsApi> Extractor for SplitExtractor<A> {
    type Item = EnrichedRow;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        let mut rows = Vec::new();
        for site in self.split.sites() {
            let fetched = self.fetcher.fetch_site(site).await;
            rows.extend(enrich(fetched, site, AddressType::of_rendered(site)));
        }
        log::debug!(
            "Extracted {} rows from {} sites",
            rows.len(),
            self.split.len()
        );
        Ok(rows)
    }
}
