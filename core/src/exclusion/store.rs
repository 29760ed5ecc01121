use std::path::{Path, PathBuf};
use std::process;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::RuleError;
use super::provider::Provider;

/// A provider's address list as persisted on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub create_time: DateTime<Utc>,
    pub ip_list: Vec<String>,
}

impl CacheEntry {
    pub fn new(ip_list: Vec<String>) -> Self {
        Self {
            create_time: Utc::now(),
            ip_list,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.create_time
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        self.age(now) < ttl
    }
}

/// One JSON file per provider inside a single directory.
#[derive(Debug, Clone)]
pub struct RuleStore {
    dir: PathBuf,
}

impl RuleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, provider: Provider) -> PathBuf {
        self.dir.join(provider.cache_file())
    }

    /// Reads the cached entry, `None` when no file exists yet.
    pub async fn load(&self, provider: Provider) -> Result<Option<CacheEntry>, RuleError> {
        let path = self.path(provider);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(RuleError::Io { path, source }),
        };

        let entry = serde_json::from_slice(&bytes).map_err(|e| RuleError::Parse {
            provider,
            reason: format!("{}: {e}", path.display()),
        })?;
        Ok(Some(entry))
    }

    /// Replaces the cached entry.
    ///
    /// The entry is written to a process-specific sibling file and renamed over
    /// the target, so concurrent readers see either the old or the new file.
    pub async fn save(&self, provider: Provider, entry: &CacheEntry) -> Result<(), RuleError> {
        fs::create_dir_all(&self.dir).await.map_err(io_err(&self.dir))?;

        let path = self.path(provider);
        let tmp_path = path.with_extension(format!("json.{}.tmp", process::id()));
        let data = serde_json::to_vec_pretty(entry).map_err(|e| RuleError::Parse {
            provider,
            reason: e.to_string(),
        })?;

        {
            let mut file = fs::File::create(&tmp_path).await.map_err(io_err(&tmp_path))?;
            file.write_all(&data).await.map_err(io_err(&tmp_path))?;
            file.sync_all().await.ok();
        }

        if let Err(source) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(RuleError::Io { path, source });
        }
        Ok(())
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> RuleError {
    let path = path.to_path_buf();
    move |source| RuleError::Io { path, source }
}
