//! Runtime settings for opening a wardrobe.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;

/// Worker threads used for writes when nothing else is configured.
pub const DEFAULT_WORKER_THREADS: usize = 4;

/// 64 MiB is plenty for tens of thousands of records.
pub const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;

const DEFAULT_DB_NAME: &str = "wardrobe_database";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardrobeConfig {
    /// Database name or path. The environment lives in `<db_path>.lmdb`.
    pub db_path: PathBuf,
    /// LMDB map size in bytes.
    pub map_size: usize,
    /// Size of the write pool.
    pub worker_threads: usize,
}

impl Default for WardrobeConfig {
    fn default() -> Self {
        WardrobeConfig {
            db_path: PathBuf::from(DEFAULT_DB_NAME),
            map_size: DEFAULT_MAP_SIZE,
            worker_threads: DEFAULT_WORKER_THREADS,
        }
    }
}

impl WardrobeConfig {
    pub fn with_path(db_path: impl Into<PathBuf>) -> Self {
        WardrobeConfig {
            db_path: db_path.into(),
            ..Default::default()
        }
    }

    /// Parses a JSON config. Missing keys take their default value.
    pub fn from_json_str(json: &str) -> Result<Self, AppResponse> {
        let config: WardrobeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppResponse> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), AppResponse> {
        if self.db_path.as_os_str().is_empty() {
            return Err(AppResponse::ValidationError("db_path must not be empty".to_string()));
        }
        if self.worker_threads == 0 {
            return Err(AppResponse::ValidationError(
                "worker_threads must be at least 1".to_string(),
            ));
        }
        if self.map_size == 0 {
            return Err(AppResponse::ValidationError("map_size must be positive".to_string()));
        }
        Ok(())
    }

    /// Directory holding the LMDB environment files.
    pub fn environment_dir(&self) -> PathBuf {
        let mut dir = self.db_path.clone().into_os_string();
        dir.push(".lmdb");
        PathBuf::from(dir)
    }
}
