//! Work split wire format
//!
//! A split crosses the worker-assignment boundary as bytes:
//! a 4-byte big-endian length followed by that many bytes of JSON
//! (`{"sites": [...]}`). Decoding needs nothing but the bytes.

use crate::error::{ConnectorError, Result};
use serde::{Deserialize, Serialize};

const LENGTH_PREFIX: usize = 4;

/// One independent unit of fetch work: an ordered group of rendered site addresses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSplit {
    sites: Vec<String>,
}

impl WorkSplit {
    pub fn new(sites: Vec<String>) -> Self {
        Self { sites }
    }

    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Encode into the length-prefixed wire format
    pub fn encode(&self) -> Result<Vec<u8>> {
        let body = serde_json::to_vec(self)
            .map_err(|e| ConnectorError::Serialization(format!("encode: {}", e)))?;
        let len = u32::try_from(body.len()).map_err(|_| {
            ConnectorError::Serialization(format!("split of {} bytes is too large", body.len()))
        })?;

        let mut bytes = Vec::with_capacity(LENGTH_PREFIX + body.len());
        bytes.extend_from_slice(&len.to_be_bytes());
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Decode bytes produced by [`WorkSplit::encode`]
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (prefix, body) = bytes.split_at_checked(LENGTH_PREFIX).ok_or_else(|| {
            ConnectorError::Serialization(format!(
                "need at least {} bytes, got {}",
                LENGTH_PREFIX,
                bytes.len()
            ))
        })?;

        let mut len = [0u8; LENGTH_PREFIX];
        len.copy_from_slice(prefix);
        let len = u32::from_be_bytes(len) as usize;
        if body.len() != len {
            return Err(ConnectorError::Serialization(format!(
                "length prefix says {} bytes but {} follow",
                len,
                body.len()
            )));
        }

        serde_json::from_slice(body)
            .map_err(|e| ConnectorError::Serialization(format!("decode: {}", e)))
    }
}
