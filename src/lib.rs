//! Search Console Connector
//!
//! Extracts search analytics rows from the Search Console API, spreads the work
//! over parallel splits and converts every row into a schema-typed record.

pub mod cli;
pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod etl;
pub mod fetch;
pub mod model;
pub mod record;
pub mod schema;
pub mod sites;
pub mod split;
pub mod storage;
pub mod transform;

// Re-exports for convenience
pub use client::{Auth, AuthMethod, SearchAnalyticsApi, SearchConsoleClient};
pub use config::SourceConfig;
pub use driver::{Driver, RunSummary};
pub use error::{ConnectorError, SiteFetchError};
pub use etl::{Extractor, Loader, Pipeline, Transformer};
pub use fetch::{PageResult, PaginatedFetcher, RetryPolicy, SplitExtractor};
pub use sites::{AddressType, SiteEntry, SiteRegistry};
pub use split::{WorkSplit, partition};
pub use storage::NdjsonWriter;
pub use transform::{RecordMapper, RowEnricher, convert};
