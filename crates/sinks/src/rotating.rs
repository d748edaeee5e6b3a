//! Size/age/interval-based file rotation with background compression
//!
//! One mutex guards the open file, its running size, and the rotation
//! clock, so the rotation decision and the write that follows it are a
//! single atomic step. Concurrent writers either write to the old file
//! before rotation or to the new file after it; no write lands in between.
//!
//! Rotation renames the active file to `<stem>.<timestamp>.<ext>` and
//! reopens a fresh file. Compression and backup pruning happen on a
//! background task afterwards, so write latency never includes a gzip
//! pass. If compression fails the plain renamed file is kept.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;

use crate::util::ErrorThrottle;
use crate::{Sink, SinkError};

const TIMESTAMP_PATTERN: &str = "%Y-%m-%dT%H-%M-%S";
const COMPRESSED_EXT: &str = "gz";

/// Rotation policy for [`RotatingFileSink`].
#[derive(Debug, Clone)]
pub struct RotationConfig {
    /// Rotate once the active file reaches this many bytes. 0 disables
    /// the size trigger.
    pub max_size: u64,
    /// Rotate once the active file has existed this long.
    pub max_age: Option<Duration>,
    /// Rotate on a fixed cadence since the last rotation, provided the
    /// active file is non-empty.
    pub rotation_interval: Option<Duration>,
    /// Keep at most this many rotated backups; 0 keeps all.
    pub max_backups: usize,
    /// Gzip rotated files in the background.
    pub compress: bool,
    /// Stamp rotated filenames in local time instead of UTC.
    pub local_time: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size: 100 * 1024 * 1024,
            max_age: None,
            rotation_interval: None,
            max_backups: 0,
            compress: false,
            local_time: false,
        }
    }
}

impl RotationConfig {
    #[must_use]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    #[must_use]
    pub fn with_max_age(mut self, age: Duration) -> Self {
        self.max_age = Some(age);
        self
    }

    #[must_use]
    pub fn with_rotation_interval(mut self, interval: Duration) -> Self {
        self.rotation_interval = Some(interval);
        self
    }

    #[must_use]
    pub fn with_max_backups(mut self, n: usize) -> Self {
        self.max_backups = n;
        self
    }

    #[must_use]
    pub fn with_compress(mut self, on: bool) -> Self {
        self.compress = on;
        self
    }

    #[must_use]
    pub fn with_local_time(mut self, on: bool) -> Self {
        self.local_time = on;
        self
    }
}

struct RotationState {
    file: Option<File>,
    size: u64,
    last_rotation: Instant,
}

/// File sink that rotates by size, age, or interval.
pub struct RotatingFileSink {
    path: PathBuf,
    config: RotationConfig,
    state: Mutex<RotationState>,
    rotations: AtomicU64,
    throttle: Arc<ErrorThrottle>,
}

impl RotatingFileSink {
    /// Open (or create) the active file in append mode. An existing file
    /// counts toward the size trigger immediately.
    pub fn open(path: impl AsRef<Path>, config: RotationConfig) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            config,
            state: Mutex::new(RotationState {
                file: Some(file),
                size,
                last_rotation: Instant::now(),
            }),
            rotations: AtomicU64::new(0),
            throttle: Arc::new(ErrorThrottle::default()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rotations performed since open.
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    fn needs_rotation(&self, state: &RotationState) -> bool {
        if self.config.max_size > 0 && state.size >= self.config.max_size {
            return true;
        }
        let elapsed = state.last_rotation.elapsed();
        if let Some(max_age) = self.config.max_age {
            if elapsed >= max_age {
                return true;
            }
        }
        if let Some(interval) = self.config.rotation_interval {
            if state.size > 0 && elapsed >= interval {
                return true;
            }
        }
        false
    }

    /// Rename the active file to a timestamped backup and reopen. Caller
    /// holds the state lock. If rotation fails midway, the original path
    /// is reopened so one failed rotation does not stop logging for good.
    fn rotate(&self, state: &mut RotationState) -> Result<(), SinkError> {
        let result = self.try_rotate(state);
        if result.is_err() && state.file.is_none() {
            if let Ok(file) = OpenOptions::new().create(true).append(true).open(&self.path) {
                state.size = file.metadata().map(|m| m.len()).unwrap_or(0);
                state.file = Some(file);
            }
        }
        result
    }

    fn try_rotate(&self, state: &mut RotationState) -> Result<(), SinkError> {
        if let Some(mut file) = state.file.take() {
            file.flush()
                .map_err(|e| SinkError::rotation(self.path.display().to_string(), e))?;
        }

        let backup = self.backup_path();
        std::fs::rename(&self.path, &backup)
            .map_err(|e| SinkError::rotation(self.path.display().to_string(), e))?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SinkError::rotation(self.path.display().to_string(), e))?;

        state.file = Some(file);
        state.size = 0;
        state.last_rotation = Instant::now();
        self.rotations.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(backup = %backup.display(), "rotated log file");
        self.spawn_post_rotation(backup);
        Ok(())
    }

    /// Timestamped backup path; a nanosecond suffix disambiguates when two
    /// rotations land in the same second.
    fn backup_path(&self) -> PathBuf {
        let (stamp, nanos) = if self.config.local_time {
            let now = chrono::Local::now();
            (now.format(TIMESTAMP_PATTERN).to_string(), now.timestamp_subsec_nanos())
        } else {
            let now = chrono::Utc::now();
            (now.format(TIMESTAMP_PATTERN).to_string(), now.timestamp_subsec_nanos())
        };

        let candidate = self.stamped_path(&stamp);
        if !candidate.exists() && !gz_path(&candidate).exists() {
            return candidate;
        }
        self.stamped_path(&format!("{stamp}.{nanos}"))
    }

    fn stamped_path(&self, stamp: &str) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "log".to_string());
        let name = match self.path.extension() {
            Some(ext) => format!("{stem}.{stamp}.{}", ext.to_string_lossy()),
            None => format!("{stem}.{stamp}"),
        };
        self.path.with_file_name(name)
    }

    /// Compression and backup pruning run off the write path. Uses the
    /// ambient tokio runtime when there is one, a plain thread otherwise.
    fn spawn_post_rotation(&self, backup: PathBuf) {
        let active = self.path.clone();
        let compress = self.config.compress;
        let max_backups = self.config.max_backups;
        let throttle = Arc::clone(&self.throttle);

        let job = move || post_rotation(&backup, &active, compress, max_backups, &throttle);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(job);
            }
            Err(_) => {
                std::thread::spawn(job);
            }
        }
    }
}

impl Sink for RotatingFileSink {
    fn write(&self, payload: &[u8]) -> Result<usize, SinkError> {
        let mut state = self.state.lock();
        if state.file.is_none() {
            return Err(SinkError::Closed);
        }
        if self.needs_rotation(&state) {
            self.rotate(&mut state)?;
        }
        let file = state.file.as_mut().ok_or(SinkError::Closed)?;
        file.write_all(payload)?;
        state.size += payload.len() as u64;
        Ok(payload.len())
    }

    fn flush(&self) -> Result<(), SinkError> {
        let mut state = self.state.lock();
        let file = state.file.as_mut().ok_or(SinkError::Closed)?;
        file.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        let mut state = self.state.lock();
        if let Some(mut file) = state.file.take() {
            file.flush()?;
        }
        Ok(())
    }
}

/// Compression and pruning for one freshly renamed backup. A failed
/// compression keeps the plain backup; losing data to save disk is the
/// wrong trade.
fn post_rotation(
    backup: &Path,
    active: &Path,
    compress: bool,
    max_backups: usize,
    throttle: &ErrorThrottle,
) {
    if compress {
        if let Err(err) = compress_file(backup) {
            throttle.record("backup compression failed", &err);
        }
    }
    if max_backups > 0 {
        prune_backups(active, max_backups, throttle);
    }
}

/// Gzip `src` into `src.gz`, removing `src` on success. On failure the
/// partial `.gz` is removed and `src` is left untouched.
fn compress_file(src: &Path) -> std::io::Result<PathBuf> {
    let dst = gz_path(src);
    let result = (|| -> std::io::Result<()> {
        let mut input = File::open(src)?;
        let output = File::create(&dst)?;
        let mut encoder = GzEncoder::new(output, Compression::default());
        std::io::copy(&mut input, &mut encoder)?;
        encoder.finish()?.sync_all()?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            std::fs::remove_file(src)?;
            Ok(dst)
        }
        Err(err) => {
            let _ = std::fs::remove_file(&dst);
            Err(err)
        }
    }
}

fn gz_path(src: &Path) -> PathBuf {
    let mut name = src
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "backup".to_string());
    name.push('.');
    name.push_str(COMPRESSED_EXT);
    src.with_file_name(name)
}

/// Delete the oldest backups (by modification time) beyond `max_backups`.
/// Per-file failures are reported and skipped; pruning never fails the
/// rotation that triggered it.
fn prune_backups(active: &Path, max_backups: usize, throttle: &ErrorThrottle) {
    let Some(dir) = active.parent() else {
        return;
    };
    let Some(stem) = active.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
        return;
    };
    let active_name = active.file_name().map(|s| s.to_string_lossy().into_owned());
    let prefix = format!("{stem}.");

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            throttle.record("backup scan failed", &err);
            return;
        }
    };

    let mut backups: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(&prefix) || Some(&name) == active_name.as_ref() {
            continue;
        }
        if let Ok(meta) = entry.metadata() {
            if meta.is_file() {
                let mtime = meta.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                backups.push((entry.path(), mtime));
            }
        }
    }

    if backups.len() <= max_backups {
        return;
    }
    backups.sort_by_key(|(_, mtime)| *mtime);

    let excess = backups.len() - max_backups;
    for (path, _) in backups.into_iter().take(excess) {
        if let Err(err) = std::fs::remove_file(&path) {
            throttle.record("backup removal failed", &err);
        } else {
            tracing::debug!(path = %path.display(), "pruned old backup");
        }
    }
}

#[cfg(test)]
#[path = "rotating_test.rs"]
mod rotating_test;
