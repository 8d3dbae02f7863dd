//! Write-once debug copies of analyzed images.
//!
//! One file per request at `<dir>/<trace_id>.png`. Existing files are
//! overwritten. Nothing here ever reads them back.

use std::path::{Path, PathBuf};

use qmark_core::{AnalysisError, TraceId};
use tokio::fs;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DebugSink {
    dir: PathBuf,
}

impl DebugSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the artifact for `trace_id` lands. Rejects ids that would
    /// escape the debug directory.
    pub fn path_for(&self, trace_id: &TraceId) -> Result<PathBuf, AnalysisError> {
        let id = trace_id.as_str();
        if id.is_empty()
            || id.contains("..")
            || id.contains('/')
            || id.contains('\\')
            || id.contains('\0')
        {
            return Err(AnalysisError::Storage(format!(
                "trace id {id:?} is not a valid file name"
            )));
        }
        Ok(self.dir.join(format!("{id}.png")))
    }

    /// Create the directory if needed and write `bytes`, replacing any
    /// previous file for the same trace id.
    pub async fn write(&self, trace_id: &TraceId, bytes: &[u8]) -> Result<PathBuf, AnalysisError> {
        let path = self.path_for(trace_id)?;

        fs::create_dir_all(&self.dir).await.map_err(|e| {
            AnalysisError::Storage(format!("create {}: {e}", self.dir.display()))
        })?;

        fs::write(&path, bytes)
            .await
            .map_err(|e| AnalysisError::Storage(format!("write {}: {e}", path.display())))?;

        debug!(path = %path.display(), size = bytes.len(), "Wrote debug image");
        Ok(path)
    }
}
