//! Work partitioning
//!
//! Splits are plain values that can be encoded to bytes and handed to any worker.

mod partition;
mod work_split;

pub use partition::partition;
pub use work_split::WorkSplit;
