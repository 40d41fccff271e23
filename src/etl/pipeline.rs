//! Pipeline orchestration for ETL operations

use super::{Extractor, Loader, Transformer};
use eyre::Result;

/// ETL Pipeline that orchestrates Extract, Transform, and Load operations
///
/// # Type Parameters
/// - `E`: Extractor type
/// - `T`: Transformer type (must transform from E::Item)
/// - `L`: Loader type (must load T::Output)
///
/// # Example
/// ```no_run
/// use search_console_connector::etl::Pipeline;
/// # use search_console_connector::etl::{Extractor, Transformer, Loader};
/// # use eyre::Result;
/// # struct MyExtractor;
/// # impl Extractor for MyExtractor {
/// #     type Item = i32;
/// #     async fn extract(&self) -> Result<Vec<Self::Item>> { Ok(vec![]) }
/// # }
/// # struct MyTransformer;
/// # impl Transformer for MyTransformer {
/// #     type Input = i32;
/// #     type Output = i32;
/// #     fn transform(&self, input: Self::Input) -> Result<Self::Output> { Ok(input) }
/// # }
/// # struct MyLoader;
/// # impl Loader for MyLoader {
/// #     type Item = i32;
/// #     async fn load(&self, items: Vec<Self::Item>) -> Result<usize> { Ok(items.len()) }
/// # }
///
/// # async fn example() -> Result<()> {
/// let pipeline = Pipeline::new(MyExtractor, MyTransformer, MyLoader).skip_invalid(true);
///
/// let count = pipeline.run().await?;
/// println!("Processed {} items", count);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
    skip_invalid: bool,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    T: Transformer<Input = E::Item>,
    L: Loader<Item = T::Output>,
{
    /// Create a new pipeline that aborts on the first transform failure
    pub fn new(extractor: E, transformer: T, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            loader,
            skip_invalid: false,
        }
    }

    /// Drop items that fail to transform instead of failing the run
    pub fn skip_invalid(mut self, skip: bool) -> Self {
        self.skip_invalid = skip;
        self
    }

    /// Run the complete ETL pipeline
    ///
    /// Steps:
    /// 1. Extract items from source
    /// 2. Transform each item
    /// 3. Load items to destination
    ///
    /// Returns the number of items successfully loaded
    ///
    /// # Errors
    /// Returns an error if extraction or loading fails, or if a transform fails
    /// while invalid items are not being skipped
    pub async fn run(&self) -> Result<usize> {
        log::debug!("Starting ETL pipeline");

        // Extract
        let items = self.extractor.extract().await?;
        log::info!("Extracted {} items", items.len());

        if items.is_empty() {
            log::warn!("No items extracted, pipeline complete");
            return Ok(0);
        }

        // Transform
        let transformed = if self.skip_invalid {
            self.transform_skipping(items)
        } else {
            self.transformer.transform_many(items)?
        };
        log::info!("Transformed {} items", transformed.len());

        // Load
        let count = self.loader.load(transformed).await?;
        log::info!("Loaded {} items", count);

        Ok(count)
    }

    fn transform_skipping(&self, items: Vec<E::Item>) -> Vec<T::Output> {
        let mut skipped = 0usize;
        let transformed: Vec<T::Output> = items
            .into_iter()
            .filter_map(|item| match self.transformer.transform(item) {
                Ok(output) => Some(output),
                Err(e) => {
                    log::warn!("Skipping record: {}", e);
                    skipped += 1;
                    None
                }
            })
            .collect();
        if skipped > 0 {
            log::warn!("Skipped {} invalid records", skipped);
        }
        transformed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct MockExtractor(Vec<i32>);

    impl Extractor for MockExtractor {
        type Item = i32;
        async fn extract(&self) -> Result<Vec<Self::Item>> {
            Ok(self.0.clone())
        }
    }

    struct DoubleTransformer;

    impl Transformer for DoubleTransformer {
        type Input = i32;
        type Output = i32;
        fn transform(&self, input: Self::Input) -> Result<Self::Output> {
            if input < 0 {
                eyre::bail!("negative input {}", input);
            }
            Ok(input * 2)
        }
    }

    struct SumLoader(Arc<Mutex<i32>>);

    impl Loader for SumLoader {
        type Item = i32;
        async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
            let sum: i32 = items.iter().sum();
            *self.0.lock().unwrap() = sum;
            Ok(items.len())
        }
    }

    #[tokio::test]
    async fn test_pipeline() {
        let result = Arc::new(Mutex::new(0));

        let pipeline = Pipeline::new(
            MockExtractor(vec![1, 2, 3]),
            DoubleTransformer,
            SumLoader(result.clone()),
        );

        let count = pipeline.run().await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(*result.lock().unwrap(), 12); // (1+2+3)*2 = 12
    }

    #[tokio::test]
    async fn test_empty_pipeline() {
        let result = Arc::new(Mutex::new(0));

        let pipeline = Pipeline::new(
            MockExtractor(vec![]),
            DoubleTransformer,
            SumLoader(result.clone()),
        );

        let count = pipeline.run().await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_abort_on_invalid() {
        let result = Arc::new(Mutex::new(0));

        let pipeline = Pipeline::new(
            MockExtractor(vec![1, -2, 3]),
            DoubleTransformer,
            SumLoader(result.clone()),
        );

        assert!(pipeline.run().await.is_err());
        assert_eq!(*result.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_skip_invalid() {
        let result = Arc::new(Mutex::new(0));

        let pipeline = Pipeline::new(
            MockExtractor(vec![1, -2, 3]),
            DoubleTransformer,
            SumLoader(result.clone()),
        )
        .skip_invalid(true);

        let count = pipeline.run().await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(*result.lock().unwrap(), 8);
    }
}
