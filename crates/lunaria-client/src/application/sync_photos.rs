//! SyncPhotosUseCase: pull one seed's photos into a local directory.
//!
//! # Steps
//!
//! 1. Fetch the seed's status (only used for the confirmation log line).
//! 2. Fetch the photo listing.
//! 3. Empty listing → done, `{0, 0}`; the local directory is not touched.
//! 4. Create the local directory (recursively) if missing.
//! 5. For each listed name, in listing order: skip it if it already exists
//!    locally and `overwrite` is off, otherwise stream it into place.
//!
//! Any failure aborts the run and names the failing step or file; later
//! files are never attempted.  There is no on-disk ledger: idempotence comes
//! from the existence check alone.
//!
//! # Partial downloads
//!
//! A body is streamed into `.<name>.part` next to its destination and only
//! renamed into place once complete, so an interrupted transfer never
//! leaves a truncated photo under the real name (which a later run would
//! then skip).
//!
//! # Concurrency
//!
//! `concurrency` bounds an ordered pool of transfers.  The default of 1 is
//! strictly sequential.  A name listed more than once is transferred only for
//! its first occurrence; later occurrences count as skipped, so two transfers
//! never race for the same destination.  With a larger pool the first error still aborts the
//! run; in-flight transfers are dropped and may leave a `.part` file behind,
//! which the next run overwrites.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use lunaria_core::{ProtocolError, SeedStatus};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Errors produced by a [`PhotoSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// The HTTP client could not be constructed or the URL is unusable.
    #[error("invalid seed endpoint: {0}")]
    Endpoint(String),
    /// The seed could not be reached (connect failure, timeout).
    #[error("seed unreachable: {0}")]
    Unreachable(String),
    /// The seed answered with something other than `200 OK`.
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
    /// The body did not match the expected schema.
    #[error("invalid response body: {0}")]
    InvalidBody(#[from] ProtocolError),
    /// The connection dropped while the body was being read.
    #[error("transfer interrupted: {0}")]
    Interrupted(String),
    /// Writing the body locally failed.
    #[error("local write failed: {0}")]
    Write(#[from] std::io::Error),
}

/// Remote side of a sync: a seed's photo API.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// `GET /status`.
    async fn fetch_status(&self) -> Result<SeedStatus, SourceError>;

    /// `GET /photos`.
    async fn list_photos(&self) -> Result<Vec<String>, SourceError>;

    /// `GET /photo/{name}`, streaming the body into `sink`.
    ///
    /// Returns the number of bytes written.
    async fn fetch_photo(
        &self,
        name: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, SourceError>;
}

/// Error type for a sync run.  Every variant names the step or file.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid seed URL `{url}`: {reason}")]
    InvalidTarget { url: String, reason: &'static str },
    #[error("failed to get seed status: {0}")]
    Status(#[source] SourceError),
    #[error("failed to get photo list: {0}")]
    Listing(#[source] SourceError),
    #[error("failed to create download directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("refusing to write remote file name `{file}` outside the download directory")]
    UnsafeFileName { file: String },
    #[error("failed to download {file}: {source}")]
    Download {
        file: String,
        #[source]
        source: SourceError,
    },
}

/// What to sync and where to: built per invocation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    /// Seed API base URL without trailing slash, e.g. `http://10.0.0.5:4269`.
    pub remote_base: String,
    pub local_dir: PathBuf,
    pub overwrite: bool,
}

impl SyncTarget {
    /// Normalises `remote_base` (trailing slashes removed) and checks it is
    /// an `http://` or `https://` URL with a host.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidTarget`].
    pub fn new(
        remote_base: &str,
        local_dir: impl Into<PathBuf>,
        overwrite: bool,
    ) -> Result<Self, SyncError> {
        let trimmed = remote_base.trim().trim_end_matches('/');
        let rest = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"))
            .ok_or_else(|| SyncError::InvalidTarget {
                url: remote_base.to_string(),
                reason: "must start with http:// or https://",
            })?;
        if rest.is_empty() {
            return Err(SyncError::InvalidTarget {
                url: remote_base.to_string(),
                reason: "missing host",
            });
        }
        Ok(Self {
            remote_base: trimmed.to_string(),
            local_dir: local_dir.into(),
            overwrite,
        })
    }
}

/// Summary counters of a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub downloaded: usize,
    pub skipped: usize,
}

/// Per-file outcome.
#[derive(Debug)]
enum TransferOutcome {
    Downloaded { bytes: u64 },
    Skipped,
    /// A repeat of a name already handled earlier in the listing.
    Repeated,
}

/// Pulls a seed's listing and bodies into a local directory.
pub struct SyncPhotosUseCase<S> {
    source: S,
    concurrency: usize,
}

impl<S: PhotoSource> SyncPhotosUseCase<S> {
    /// Sequential pipeline over `source`.
    pub fn new(source: S) -> Self {
        Self {
            source,
            concurrency: 1,
        }
    }

    /// Allows up to `concurrency` transfers in flight (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Runs one sync.
    ///
    /// `target.remote_base` is only reported; requests go wherever the
    /// source points.  Build the source from the same target (for HTTP,
    /// `SeedApiClient::for_target`).
    ///
    /// # Errors
    ///
    /// Returns the first [`SyncError`] hit; nothing after it is attempted.
    pub async fn sync(&self, target: &SyncTarget) -> Result<SyncReport, SyncError> {
        info!("connecting to seed at {}", target.remote_base);
        let status = self.source.fetch_status().await.map_err(SyncError::Status)?;
        info!(
            "connected to seed {} ({}), location: {}, owner: {}",
            status.name, status.seed_id, status.location, status.owner
        );

        let photos = self
            .source
            .list_photos()
            .await
            .map_err(SyncError::Listing)?;
        info!("found {} photo(s) on the seed", photos.len());
        if photos.is_empty() {
            info!("no photos available for download");
            return Ok(SyncReport::default());
        }

        ensure_dir(&target.local_dir).await?;

        let total = photos.len();
        let mut report = SyncReport::default();
        let mut seen = HashSet::new();
        let planned: Vec<(&str, bool)> = photos
            .iter()
            .map(|name| (name.as_str(), seen.insert(name.as_str())))
            .collect();
        let mut transfers = stream::iter(planned)
            .map(|(name, first)| async move {
                let outcome = if first {
                    self.transfer(name, target).await
                } else {
                    Ok(TransferOutcome::Repeated)
                };
                (name, outcome)
            })
            .buffered(self.concurrency);

        while let Some((name, outcome)) = transfers.next().await {
            match outcome? {
                TransferOutcome::Downloaded { bytes } => {
                    report.downloaded += 1;
                    info!(
                        "downloaded {name} ({bytes} bytes) ({}/{total})",
                        report.downloaded + report.skipped
                    );
                }
                TransferOutcome::Skipped => {
                    report.skipped += 1;
                    info!("skipped {name} (already exists)");
                }
                TransferOutcome::Repeated => {
                    report.skipped += 1;
                    info!("skipped {name} (listed more than once)");
                }
            }
        }

        info!(
            "sync complete: downloaded {}, skipped {}",
            report.downloaded, report.skipped
        );
        Ok(report)
    }

    async fn transfer(&self, name: &str, target: &SyncTarget) -> Result<TransferOutcome, SyncError> {
        if !is_safe_file_name(name) {
            return Err(SyncError::UnsafeFileName {
                file: name.to_string(),
            });
        }
        let download_error = |source: SourceError| SyncError::Download {
            file: name.to_string(),
            source,
        };

        let dest = target.local_dir.join(name);
        if !target.overwrite
            && fs::try_exists(&dest)
                .await
                .map_err(|e| download_error(e.into()))?
        {
            return Ok(TransferOutcome::Skipped);
        }

        let part = target.local_dir.join(format!(".{name}.part"));
        match self.download_into(name, &part, &dest).await {
            Ok(bytes) => Ok(TransferOutcome::Downloaded { bytes }),
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&part).await {
                    debug!("could not remove {}: {cleanup}", part.display());
                }
                Err(download_error(e))
            }
        }
    }

    async fn download_into(&self, name: &str, part: &Path, dest: &Path) -> Result<u64, SourceError> {
        let mut file = fs::File::create(part).await?;
        let bytes = self.source.fetch_photo(name, &mut file).await?;
        file.flush().await?;
        drop(file);
        fs::rename(part, dest).await?;
        Ok(bytes)
    }
}

async fn ensure_dir(path: &Path) -> Result<(), SyncError> {
    if fs::try_exists(path).await.unwrap_or(false) {
        return Ok(());
    }
    fs::create_dir_all(path)
        .await
        .map_err(|source| SyncError::CreateDir {
            path: path.to_path_buf(),
            source,
        })?;
    info!("created download directory at {}", path.display());
    Ok(())
}

/// `true` if `name` is a single plain path component.
///
/// Rejects empty names, `.`/`..`, separators of either platform, and NUL.
fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
