//! Run orchestration
//!
//! The registry is partitioned once; each split crosses the task boundary as
//! bytes and is decoded by the task that processes it, so a split that cannot
//! be decoded only fails itself.

use crate::client::SearchAnalyticsApi;
use crate::config::RecordErrorPolicy;
use crate::etl::{Loader, Pipeline};
use crate::fetch::{PaginatedFetcher, SplitExtractor};
use crate::record::TypedRecord;
use crate::sites::SiteRegistry;
use crate::split::{WorkSplit, partition};
use crate::transform::RecordMapper;

use eyre::Result;
use owo_colors::OwoColorize;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Outcome of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub splits: usize,
    pub failed_splits: usize,
    /// Records handed to the loader
    pub records: usize,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed_splits == 0
    }
}

/// Runs one pipeline per split concurrently
pub struct Driver<A, L> {
    fetcher: PaginatedFetcher<A>,
    mapper: Arc<RecordMapper>,
    loader: Arc<L>,
    policy: RecordErrorPolicy,
}

impl<A, L> Driver<A, L>
where
    A: SearchAnalyticsApi + 'static,
    L: Loader<Item = TypedRecord> + 'static,
{
    pub fn new(fetcher: PaginatedFetcher<A>, mapper: RecordMapper, loader: Arc<L>) -> Self {
        Self {
            fetcher,
            mapper: Arc::new(mapper),
            loader,
            policy: RecordErrorPolicy::default(),
        }
    }

    pub fn on_record_error(mut self, policy: RecordErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Partition `registry` and process every split
    ///
    /// # Errors
    /// Returns an error only if a split cannot be encoded; failures inside a
    /// split are counted in the summary
    pub async fn run(&self, registry: &SiteRegistry, desired_splits: i32) -> Result<RunSummary> {
        let splits = partition(registry, desired_splits);
        if splits.is_empty() {
            log::warn!(
                "No work: {} sites, {} splits requested",
                registry.len(),
                desired_splits
            );
            return Ok(RunSummary::default());
        }
        log::info!(
            "Partitioned {} sites into {} splits",
            registry.len().cyan(),
            splits.len().cyan()
        );

        let encoded = splits
            .iter()
            .map(WorkSplit::encode)
            .collect::<crate::error::Result<Vec<_>>>()?;

        Ok(self.run_encoded(encoded).await)
    }

    /// Process already encoded splits, one task each
    pub async fn run_encoded(&self, encoded: Vec<Vec<u8>>) -> RunSummary {
        let skip_invalid = self.policy == RecordErrorPolicy::Skip;
        let mut summary = RunSummary {
            splits: encoded.len(),
            ..RunSummary::default()
        };

        let mut set = JoinSet::new();
        for (index, bytes) in encoded.into_iter().enumerate() {
            let fetcher = self.fetcher.clone();
            let mapper = Arc::clone(&self.mapper);
            let loader = Arc::clone(&self.loader);

            set.spawn(async move {
                let split = WorkSplit::decode(&bytes)?;
                log::debug!("Split {}: {} sites", index, split.len());

                let count = Pipeline::new(SplitExtractor::new(fetcher, split), mapper, loader)
                    .skip_invalid(skip_invalid)
                    .run()
                    .await?;
                Ok::<(usize, usize), eyre::Report>((index, count))
            });
        }

        while let Some(res) = set.join_next().await {
            match res {
                Ok(Ok((index, count))) => {
                    log::debug!("Split {} loaded {} records", index, count);
                    summary.records += count;
                }
                Ok(Err(e)) => {
                    log::error!("Split failed: {:#}", e);
                    summary.failed_splits += 1;
                }
                Err(e) => {
                    log::error!("Split task panicked: {}", e);
                    summary.failed_splits += 1;
                }
            }
        }

        log::info!(
            "Run finished: {} records from {} splits ({} failed)",
            summary.records.green(),
            summary.splits,
            summary.failed_splits.red()
        );
        summary
    }
}
