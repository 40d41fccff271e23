//! NDJSON (Newline Delimited JSON) output

use crate::etl::Loader;
use crate::record::TypedRecord;

use eyre::{Context, Result, eyre};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Writes typed records as NDJSON, one object per line.
///
/// Several pipelines may load into the same writer; each batch is written
/// under a lock so lines from different workers never interleave. Loads do
/// the file I/O on tokio's blocking pool.
pub struct NdjsonWriter {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl NdjsonWriter {
    /// Create (or truncate) the output file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::File::create(&path)
            .with_context(|| format!("Failed to create NDJSON file: {}", path.display()))?;

        Ok(Self {
            path,
            lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append records to the file, blocking the calling thread
    pub fn append(&self, records: &[TypedRecord]) -> Result<usize> {
        write_locked(&self.path, &self.lock, &encode(records)?)?;
        Ok(records.len())
    }
}

fn encode(records: &[TypedRecord]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buffer, record)?;
        buffer.push(b'\n');
    }
    Ok(buffer)
}

fn write_locked(path: &Path, lock: &Mutex<()>, buffer: &[u8]) -> Result<()> {
    let _guard = lock
        .lock()
        .map_err(|_| eyre!("NDJSON writer lock poisoned"))?;
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open NDJSON file: {}", path.display()))?;
    file.write_all(buffer)
        .with_context(|| format!("Failed to write NDJSON file: {}", path.display()))
}

impl Loader for NdjsonWriter {
    type Item = TypedRecord;

    async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
        let buffer = encode(&items)?;
        let path = self.path.clone();
        let lock = Arc::clone(&self.lock);
        tokio::task::spawn_blocking(move || write_locked(&path, &lock, &buffer))
            .await
            .map_err(|e| eyre!("NDJSON write task failed: {}", e))??;
        Ok(items.len())
    }
}
