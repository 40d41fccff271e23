//! Row transformations
//!
//! Rows are first tagged with their site ([`RowEnricher`]), then mapped field by
//! field onto the output schema ([`RecordMapper`]), every value passing through
//! [`convert`].

mod converter;
mod enricher;
mod record_mapper;

pub use converter::convert;
pub(crate) use converter::parse_iso_date;
pub use enricher::{RowEnricher, enrich};
pub use record_mapper::RecordMapper;
