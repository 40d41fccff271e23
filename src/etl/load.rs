//! Loader trait for loading data to destinations

use eyre::Result;
use std::sync::Arc;

/// Loader trait for loading data to a destination
///
/// Loaders may be shared by several concurrently running pipelines and must
/// serialize their own writes.
///
/// # Example
/// ```no_run
/// use search_console_connector::etl::Loader;
/// use eyre::Result;
///
/// struct CountingLoader;
///
/// impl Loader for CountingLoader {
///     type Item = String;
///
///     async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
///         Ok(items.len())
///     }
/// }
/// ```
pub trait Loader: Send + Sync {
    /// The type of items to load
    type Item: Send;

    /// Load items to the destination
    ///
    /// Returns the number of items successfully loaded
    ///
    /// # Errors
    /// Returns an error if loading fails (I/O, serialization, etc.)
    fn load(
        &self,
        items: Vec<Self::Item>,
    ) -> impl std::future::Future<Output = Result<usize>> + Send;
}

impl<L: Loader> Loader for Arc<L> {
    type Item = L::Item;

    async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
        (**self).load(items).await
    }
}
