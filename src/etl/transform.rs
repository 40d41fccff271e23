//! Transformer trait for data transformation

use eyre::Result;
use std::sync::Arc;

/// Transformer trait for transforming data items one at a time
///
/// # Example
/// ```no_run
/// use search_console_connector::etl::Transformer;
/// use eyre::Result;
///
/// struct Uppercase;
///
/// impl Transformer for Uppercase {
///     type Input = String;
///     type Output = String;
///
///     fn transform(&self, input: Self::Input) -> Result<Self::Output> {
///         Ok(input.to_uppercase())
///     }
/// }
/// ```
pub trait Transformer: Send + Sync {
    /// Input item type
    type Input: Send;

    /// Output item type after transformation
    type Output: Send;

    /// Transform a single item
    ///
    /// # Errors
    /// Returns an error if the item cannot be converted
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;

    /// Transform multiple items, stopping at the first failure
    fn transform_many(&self, inputs: Vec<Self::Input>) -> Result<Vec<Self::Output>> {
        inputs.into_iter().map(|i| self.transform(i)).collect()
    }
}

// Workers share one transformer per run
impl<T: Transformer + ?Sized> Transformer for Arc<T> {
    type Input = T::Input;
    type Output = T::Output;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        (**self).transform(input)
    }

    fn transform_many(&self, inputs: Vec<Self::Input>) -> Result<Vec<Self::Output>> {
        (**self).transform_many(inputs)
    }
}
