use insight_core::{CacheError, CommentRecord, CoreError};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Flat-text comment cache: one record per line, UTF-8.
#[derive(Debug, Clone)]
pub struct CommentCache {
    path: PathBuf,
}

impl CommentCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached records with blank lines dropped and each line trimmed.
    ///
    /// A missing file or one without a single non-blank line is `None`.
    pub fn load(&self) -> Result<Option<Vec<CommentRecord>>, CoreError> {
        if !self.path.exists() {
            debug!("No cache at {}", self.path.display());
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|e| CacheError::Unreadable {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        let records: Vec<CommentRecord> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if records.is_empty() {
            info!("Cache file {} is empty", self.path.display());
            return Ok(None);
        }

        Ok(Some(records))
    }

    /// Overwrite the cache with `records`, newline-joined.
    pub fn store(&self, records: &[CommentRecord]) -> Result<(), CoreError> {
        let unwritable = |e: std::io::Error| CacheError::Unwritable {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(unwritable)?;
            }
        }

        std::fs::write(&self.path, records.join("\n")).map_err(unwritable)?;
        info!("Cached {} comments to {}", records.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_cache_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = CommentCache::new(dir.path().join("danmaku_cache.txt"));
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn test_blank_cache_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("danmaku_cache.txt");
        std::fs::write(&path, "\n   \n\t\n").unwrap();
        assert!(CommentCache::new(path).load().unwrap().is_none());
    }

    #[test]
    fn test_store_then_load_keeps_order() {
        let dir = TempDir::new().unwrap();
        let cache = CommentCache::new(dir.path().join("nested").join("cache.txt"));
        let records = vec!["第一条".to_string(), "第二条".to_string(), "第一条".to_string()];

        cache.store(&records).unwrap();
        assert_eq!(
            std::fs::read_to_string(cache.path()).unwrap(),
            "第一条\n第二条\n第一条"
        );
        assert_eq!(cache.load().unwrap(), Some(records));
    }

    #[test]
    fn test_load_trims_lines_and_skips_blanks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.txt");
        std::fs::write(&path, "  大模型  \r\n\r\nLLM 很强\n").unwrap();

        let loaded = CommentCache::new(path).load().unwrap().unwrap();
        assert_eq!(loaded, vec!["大模型", "LLM 很强"]);
    }

    #[test]
    fn test_unreadable_cache_is_cache_error() {
        let dir = TempDir::new().unwrap();
        // A directory exists but cannot be read as a file.
        let err = CommentCache::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, CoreError::Cache(CacheError::Unreadable { .. })));
    }
}
