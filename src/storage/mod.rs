//! Record sinks

mod ndjson;

pub use ndjson::NdjsonWriter;
