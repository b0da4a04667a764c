//! Cache manager: Parquet fast path over the slow spreadsheet load
//!
//! The artifact moves through Absent → Valid → (Stale | Corrupt) → Absent.
//! A load serves the artifact while it is valid and otherwise runs the
//! header-locating loader, writes a fresh artifact and returns that table.
//! Loads are serialized behind a mutex; the artifact itself is replaced by
//! rename so readers never see a half-written file.

mod artifact;
mod clock;

pub use artifact::{read_artifact, write_artifact, ArtifactMeta, LoadKey, FORMAT_VERSION};
pub use clock::{Clock, ManualClock, SystemClock};

use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::excel::ExcelImporter;
use crate::types::NormalizedTable;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

/// Why the slow path ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildReason {
    Absent,
    SourceNewer,
    Expired,
    Corrupt,
    /// Artifact was built from another source, sheet or scan policy
    ConfigChanged,
    Forced,
}

/// Where a loaded table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOrigin {
    FromCache,
    Rebuilt(RebuildReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheLoad {
    pub table: NormalizedTable,
    pub header_row: usize,
    pub origin: LoadOrigin,
}

/// Artifact state as observed without side effects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    Absent,
    Valid,
    Stale(RebuildReason),
    Corrupt(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub state: CacheState,
    pub artifact: PathBuf,
    pub source: PathBuf,
    pub source_present: bool,
    pub header_row: Option<usize>,
    pub rows: Option<usize>,
    pub columns: Option<usize>,
    pub built_at: Option<chrono::DateTime<chrono::Local>>,
    pub age_secs: Option<u64>,
}

fn modified(path: &Path) -> io::Result<Option<SystemTime>> {
    match fs::metadata(path) {
        Ok(meta) => meta.modified().map(Some),
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
            ) =>
        {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub struct CacheManager {
    config: AnalyticsConfig,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl CacheManager {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AnalyticsConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    fn artifact_path(&self) -> &Path {
        &self.config.cache
    }

    fn source_path(&self) -> &Path {
        &self.config.source
    }

    /// Staleness of an existing artifact, ignoring whether a rebuild is possible
    fn staleness(&self, artifact_mtime: SystemTime) -> AnalyticsResult<Option<RebuildReason>> {
        if let Some(source_mtime) = modified(self.source_path())? {
            if source_mtime > artifact_mtime {
                return Ok(Some(RebuildReason::SourceNewer));
            }
        }
        if let Some(ttl) = self.config.ttl() {
            let age = self
                .clock
                .now()
                .duration_since(artifact_mtime)
                .unwrap_or(Duration::ZERO);
            if age > ttl {
                return Ok(Some(RebuildReason::Expired));
            }
        }
        Ok(None)
    }

    /// Serve the artifact when valid, otherwise rebuild from the source
    pub fn load(&self) -> AnalyticsResult<CacheLoad> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let reason = match modified(self.artifact_path())? {
            None => RebuildReason::Absent,
            Some(artifact_mtime) => match self.staleness(artifact_mtime)? {
                Some(reason) if self.source_path().exists() => reason,
                stale => {
                    if let Some(reason) = stale {
                        warn!(
                            ?reason,
                            source = %self.source_path().display(),
                            "cache is stale but the source is missing, serving stale artifact"
                        );
                    }
                    let key = LoadKey::from_config(&self.config);
                    match read_artifact(self.artifact_path()) {
                        Ok((_, meta)) if meta.key != key => {
                            debug!(cached = ?meta.key, current = ?key, "cache built for another load");
                            RebuildReason::ConfigChanged
                        }
                        Ok((table, meta)) => {
                            debug!(rows = table.row_count(), "served table from cache");
                            return Ok(CacheLoad {
                                table,
                                header_row: meta.header_row,
                                origin: LoadOrigin::FromCache,
                            });
                        }
                        Err(e) => {
                            warn!(error = %e, "discarding unreadable cache artifact");
                            self.remove_artifact()?;
                            RebuildReason::Corrupt
                        }
                    }
                }
            },
        };

        self.rebuild_locked(reason)
    }

    /// Run the slow path regardless of the artifact state
    pub fn rebuild(&self) -> AnalyticsResult<CacheLoad> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.rebuild_locked(RebuildReason::Forced)
    }

    fn rebuild_locked(&self, reason: RebuildReason) -> AnalyticsResult<CacheLoad> {
        if !self.source_path().exists() {
            return Err(AnalyticsError::SourceMissing(self.source_path().to_path_buf()));
        }
        info!(?reason, "initial setup: optimizing data for speed");

        let load = ExcelImporter::from_config(&self.config).import()?;

        info!(path = %self.artifact_path().display(), "saving fast cache");
        let meta = ArtifactMeta {
            header_row: load.header_row,
            key: LoadKey::from_config(&self.config),
        };
        if let Err(e) = write_artifact(self.artifact_path(), &load.table, &meta) {
            warn!(error = %e, "could not write cache artifact, continuing without it");
        }

        Ok(CacheLoad {
            table: load.table,
            header_row: load.header_row,
            origin: LoadOrigin::Rebuilt(reason),
        })
    }

    fn remove_artifact(&self) -> AnalyticsResult<bool> {
        match fs::remove_file(self.artifact_path()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the artifact; returns whether one existed
    pub fn clear(&self) -> AnalyticsResult<bool> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.remove_artifact()
    }

    /// Report the artifact state without rebuilding or deleting anything
    pub fn inspect(&self) -> AnalyticsResult<CacheStatus> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut status = CacheStatus {
            state: CacheState::Absent,
            artifact: self.artifact_path().to_path_buf(),
            source: self.source_path().to_path_buf(),
            source_present: self.source_path().exists(),
            header_row: None,
            rows: None,
            columns: None,
            built_at: None,
            age_secs: None,
        };

        let Some(artifact_mtime) = modified(self.artifact_path())? else {
            return Ok(status);
        };
        status.built_at = Some(artifact_mtime.into());
        status.age_secs = self
            .clock
            .now()
            .duration_since(artifact_mtime)
            .ok()
            .map(|d| d.as_secs());

        status.state = match read_artifact(self.artifact_path()) {
            Ok((table, meta)) => {
                status.header_row = Some(meta.header_row);
                status.rows = Some(table.row_count());
                status.columns = Some(table.column_count());
                if meta.key != LoadKey::from_config(&self.config) {
                    CacheState::Stale(RebuildReason::ConfigChanged)
                } else {
                    match self.staleness(artifact_mtime)? {
                        Some(reason) => CacheState::Stale(reason),
                        None => CacheState::Valid,
                    }
                }
            }
            Err(e) => CacheState::Corrupt(e.to_string()),
        };
        Ok(status)
    }
}
