use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use matra_domain::{DomainError, OnsetFrames};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("beatmap {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("beatmap {path:?} line {line}: {text:?} is not a frame index")]
    Parse {
        path: PathBuf,
        line: usize,
        text: String,
    },
    #[error("beatmap {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: DomainError,
    },
}

/// Keyed storage of detected onsets, so repeated runs skip detection.
pub trait BeatmapStore: Send + Sync {
    fn read(&self, key: &Path) -> Result<Option<OnsetFrames>, CacheError>;
    fn write(&self, key: &Path, frames: &OnsetFrames) -> Result<(), CacheError>;
    fn invalidate(&self, key: &Path) -> Result<(), CacheError>;
}

/// Sidecar `<path>.beatmap.txt` files, one decimal frame index per line.
pub struct FsBeatmapStore;

impl FsBeatmapStore {
    pub fn sidecar_path(key: &Path) -> PathBuf {
        let mut name = OsString::from(key.as_os_str());
        name.push(".beatmap.txt");
        PathBuf::from(name)
    }
}

impl BeatmapStore for FsBeatmapStore {
    fn read(&self, key: &Path) -> Result<Option<OnsetFrames>, CacheError> {
        let path = Self::sidecar_path(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(CacheError::Io { path, source: err }),
        };
        let mut frames = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let frame = line.trim().parse::<u64>().map_err(|_| CacheError::Parse {
                path: path.clone(),
                line: index + 1,
                text: line.to_string(),
            })?;
            frames.push(frame);
        }
        let frames = OnsetFrames::new(frames).map_err(|source| CacheError::Invalid {
            path: path.clone(),
            source,
        })?;
        debug!(onsets = frames.len(), "loaded beatmap {:?}", path);
        Ok(Some(frames))
    }

    fn write(&self, key: &Path, frames: &OnsetFrames) -> Result<(), CacheError> {
        let path = Self::sidecar_path(key);
        let mut text = String::new();
        for frame in frames.frames() {
            text.push_str(&frame.to_string());
            text.push('\n');
        }
        fs::write(&path, text).map_err(|source| CacheError::Io { path, source })
    }

    fn invalidate(&self, key: &Path) -> Result<(), CacheError> {
        let path = Self::sidecar_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CacheError::Io { path, source: err }),
        }
    }
}

/// In-process store for tests and embedding.
#[derive(Default)]
pub struct MemoryBeatmapStore {
    entries: Mutex<HashMap<PathBuf, OnsetFrames>>,
}

impl MemoryBeatmapStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BeatmapStore for MemoryBeatmapStore {
    fn read(&self, key: &Path) -> Result<Option<OnsetFrames>, CacheError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &Path, frames: &OnsetFrames) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_path_buf(), frames.clone());
        Ok(())
    }

    fn invalidate(&self, key: &Path) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}
