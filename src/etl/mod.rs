//! Core ETL (Extract, Transform, Load) abstractions
//!
//! A split is processed as one pipeline: rows are extracted from the reporting API,
//! transformed into typed records and loaded into a sink.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::Pipeline;
pub use transform::Transformer;
