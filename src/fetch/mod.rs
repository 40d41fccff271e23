//! Paginated retrieval of report rows

mod extractor;
mod fetcher;
mod retry;

pub use extractor::SplitExtractor;
pub use fetcher::{DEFAULT_REQUEST_TIMEOUT, PageResult, PaginatedFetcher};
pub use retry::RetryPolicy;
