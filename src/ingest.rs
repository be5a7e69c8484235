//! File ingestion into the night-bucketed capture trees.
//!
//! One [`FileIngestor`] is constructed per tree (FF binaries, timelapse
//! stacks). Each ingestion resolves the current night directory, creates it
//! if missing, and writes the payload atomically (temp file + rename) so a
//! concurrent reader never observes partial content.

use crate::night::night_dir_name;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// Errors that can occur while storing an uploaded file
#[derive(Debug, Error)]
pub enum IngestError {
    /// The client-supplied filename was empty or contained a path separator
    #[error("bad filename")]
    BadFilename,

    /// Directory creation or file write failed
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

/// A successfully stored upload
#[derive(Debug, Clone)]
pub struct IngestedFile {
    /// Final destination path under the ingestor's root
    pub path: PathBuf,
    /// Number of payload bytes written
    pub bytes_written: usize,
}

/// Check whether a client-supplied filename is safe to join onto a
/// night directory.
///
/// Rejects empty names and anything containing a forward or back slash.
/// Nothing else is normalized or filtered; a bare `..` passes (see
/// DESIGN.md) and fails later at the rename instead.
pub fn filename_is_safe(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\')
}

/// Hook invoked after a file lands in a night directory.
///
/// Implementations must not block the caller and must swallow their own
/// failures; ingestion never depends on the outcome.
pub trait NightNotifier: Send + Sync {
    fn notify(&self, night_dir: &Path);
}

/// Notifier that does nothing. Used for the stacks tree and in tests.
pub struct NoopNotifier;

impl NightNotifier for NoopNotifier {
    fn notify(&self, _night_dir: &Path) {}
}

/// Spawns the configured detection script against a night directory,
/// detached from the request that triggered it.
pub struct DetectTrigger {
    command: String,
}

impl DetectTrigger {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl NightNotifier for DetectTrigger {
    fn notify(&self, night_dir: &Path) {
        let cmd = format!("{} {}", self.command, night_dir.display());
        info!(command = %cmd, "triggering detection run");

        // Fire and forget: the child is detached and never waited on.
        match tokio::process::Command::new("sh").arg("-c").arg(&cmd).spawn() {
            Ok(_) => {}
            Err(e) => warn!(error = %e, command = %cmd, "detection trigger failed"),
        }
    }
}

/// Writes uploaded payloads into night-bucketed directories under a root.
pub struct FileIngestor {
    root: PathBuf,
    notifier: Arc<dyn NightNotifier>,
}

impl FileIngestor {
    pub fn new(root: impl Into<PathBuf>, notifier: Arc<dyn NightNotifier>) -> Self {
        Self {
            root: root.into(),
            notifier,
        }
    }

    /// Root of this ingestor's capture tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `payload` as `filename` in the night directory for `now`.
    ///
    /// The filename is validated before any filesystem mutation. Directory
    /// creation is idempotent and safe under concurrent callers targeting
    /// the same night. The payload is written to a uniquely named temp file
    /// in the night directory and renamed into place, so readers see either
    /// the old content or the full new content.
    pub async fn ingest(
        &self,
        filename: &str,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<IngestedFile, IngestError> {
        if !filename_is_safe(filename) {
            return Err(IngestError::BadFilename);
        }

        let night_dir = self.root.join(night_dir_name(now));
        fs::create_dir_all(&night_dir).await?;

        let dest = night_dir.join(filename);
        let tmp = night_dir.join(format!(".{}.{}.part", filename, Uuid::new_v4()));

        fs::write(&tmp, payload).await?;
        if let Err(e) = fs::rename(&tmp, &dest).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        info!(
            path = %dest.display(),
            bytes = payload.len(),
            "file saved"
        );

        self.notifier.notify(&night_dir);

        Ok(IngestedFile {
            path: dest,
            bytes_written: payload.len(),
        })
    }
}
