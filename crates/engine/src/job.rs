//! Per-job scratch context.
//!
//! A [`JobContext`] owns everything one analysis job puts on disk: it stages
//! uploads and the merged configuration document under unique names, hands
//! out the well-known engine output paths, and removes exactly what it
//! created. Cleanup runs on every exit path and never escalates failures.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use varia_core::analysis::{FileMetadata, JobConfig, StagedFileEntry, DEFAULT_REPORT_ORDER};
use varia_core::countries::FALLBACK_COUNTRY;
use varia_core::CoreError;

/// Metrics engine output, polled for after engine 1 exits.
pub const RESULTS_FILE: &str = "results.json";
/// Formatted report written by the report engine.
pub const REPORT_FILE: &str = "report.xlsx";
/// Auxiliary parsed-data dump written by the report engine.
pub const PARSED_DATA_FILE: &str = "parsed_data.xlsx";
/// Optional PDF rendering, served by a retrieval endpoint when present.
pub const PDF_FILE: &str = "report.pdf";

/// Extension applied when the upload has none usable.
const DEFAULT_EXTENSION: &str = "xlsx";

/// One uploaded blob plus its client-side filename, as extracted from the
/// multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Scratch-state owner for one job.
#[derive(Debug)]
pub struct JobContext {
    id: Uuid,
    scratch_dir: PathBuf,
    /// Every path this context created; cleanup removes exactly these.
    staged: Vec<PathBuf>,
}

impl JobContext {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            scratch_dir: scratch_dir.into(),
            staged: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Paths created so far (uploads, then the configuration document).
    pub fn staged_paths(&self) -> &[PathBuf] {
        &self.staged
    }

    pub fn results_path(&self) -> PathBuf {
        self.scratch_dir.join(RESULTS_FILE)
    }

    pub fn report_path(&self) -> PathBuf {
        self.scratch_dir.join(REPORT_FILE)
    }

    pub fn parsed_data_path(&self) -> PathBuf {
        self.scratch_dir.join(PARSED_DATA_FILE)
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.scratch_dir.join(PDF_FILE)
    }

    /// Stage uploaded blobs under unique names, pairing each with its
    /// positional metadata entry (defaults fill any gap).
    ///
    /// Rejects an empty upload set before touching the filesystem.
    pub async fn stage_files(
        &mut self,
        files: &[UploadedFile],
        metadata: &[FileMetadata],
    ) -> Result<Vec<StagedFileEntry>, CoreError> {
        if files.is_empty() {
            return Err(CoreError::Validation(
                "at least one file is required".to_string(),
            ));
        }

        fs::create_dir_all(&self.scratch_dir).await.map_err(|err| {
            CoreError::Internal(format!(
                "failed to create scratch directory {}: {err}",
                self.scratch_dir.display()
            ))
        })?;

        let mut entries = Vec::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            let extension = extension_of(file.filename.as_deref());
            let path = self
                .scratch_dir
                .join(format!("upload_{}_{index}.{extension}", self.id));

            fs::write(&path, &file.bytes).await.map_err(|err| {
                CoreError::Internal(format!("failed to stage {}: {err}", path.display()))
            })?;
            self.staged.push(path.clone());
            debug!(
                path = %path.display(),
                bytes = file.bytes.len(),
                "staged upload"
            );

            let meta = metadata.get(index);
            entries.push(StagedFileEntry {
                path: path.to_string_lossy().into_owned(),
                country: non_empty(meta.and_then(|m| m.country.clone()))
                    .unwrap_or_else(|| FALLBACK_COUNTRY.to_string()),
                report_order: non_empty(meta.and_then(|m| m.report_order.clone()))
                    .unwrap_or_else(|| DEFAULT_REPORT_ORDER.to_string()),
                start_date: meta.and_then(|m| m.start_date.clone()),
                end_date: meta.and_then(|m| m.end_date.clone()),
            });
        }
        Ok(entries)
    }

    /// Write the merged configuration document for the metrics engine.
    pub async fn write_config(&mut self, config: &JobConfig) -> Result<PathBuf, CoreError> {
        let path = self.scratch_dir.join(format!("config_{}.json", self.id));
        let bytes = serde_json::to_vec_pretty(config)
            .map_err(|err| CoreError::Internal(format!("failed to serialize config: {err}")))?;
        fs::write(&path, bytes).await.map_err(|err| {
            CoreError::Internal(format!("failed to write {}: {err}", path.display()))
        })?;
        self.staged.push(path.clone());
        Ok(path)
    }

    /// Remove every path this context created. Failures are logged and
    /// skipped; engine outputs at well-known paths are left in place for
    /// the retrieval endpoints.
    pub async fn cleanup(&mut self) {
        for path in self.staged.drain(..) {
            match fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "removed staged file"),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to remove staged file")
                }
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Lower-cased extension of the client filename, when it looks safe to put
/// in a path; [`DEFAULT_EXTENSION`] otherwise.
fn extension_of(filename: Option<&str>) -> String {
    filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
