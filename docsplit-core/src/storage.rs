use crate::cache::{SegmentCacheKey, SegmentCacheValue};
use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage abstraction for caching segmentation results
pub trait DocumentStorage {
    fn get_segments(&self, cache_key: &SegmentCacheKey) -> Result<Option<SegmentCacheValue>>;
    fn store_segments(&self, cache_key: &SegmentCacheKey, cache_value: &SegmentCacheValue) -> Result<()>;
}

/// File-based storage implementation using local cache directory
pub struct FileStorage {
    cache_dir: PathBuf,
}

impl FileStorage {
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(cache_dir.join("segments"))?;

        Ok(Self { cache_dir })
    }

    fn segments_path(&self, cache_key: &SegmentCacheKey) -> PathBuf {
        self.cache_dir
            .join("segments")
            .join(format!("{}.json", cache_key.to_cache_hash()))
    }
}

impl DocumentStorage for FileStorage {
    fn get_segments(&self, cache_key: &SegmentCacheKey) -> Result<Option<SegmentCacheValue>> {
        let path = self.segments_path(cache_key);
        if !path.exists() {
            return Ok(None);
        }
        let json_str = fs::read_to_string(&path)?;
        match serde_json::from_str::<SegmentCacheValue>(&json_str) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                // Entries written by an older output shape are treated as misses.
                tracing::warn!("⚠️  Ignoring unreadable cache entry {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    fn store_segments(&self, cache_key: &SegmentCacheKey, cache_value: &SegmentCacheValue) -> Result<()> {
        let path = self.segments_path(cache_key);
        let json_str = serde_json::to_string_pretty(cache_value)
            .map_err(|e| anyhow!("Failed to serialize SegmentCacheValue: {}", e))?;
        fs::write(path, json_str)?;
        Ok(())
    }
}

/// Hash of the complete raw source document
pub fn calculate_source_hash(raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.len().to_le_bytes());
    hasher.update(raw);
    format!("{:x}", hasher.finalize())
}

/// Calculate hash for configuration data (for the segment cache key)
pub fn calculate_config_hash<T: serde::Serialize>(config: &T) -> Result<String> {
    let config_json = serde_json::to_string(config)
        .map_err(|e| anyhow!("Failed to serialize config for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// No-op storage implementation that disables all caching
pub struct NoOpStorage;

impl Default for NoOpStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOpStorage {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentStorage for NoOpStorage {
    fn get_segments(&self, _cache_key: &SegmentCacheKey) -> Result<Option<SegmentCacheValue>> {
        Ok(None) // Always cache miss
    }

    fn store_segments(&self, _cache_key: &SegmentCacheKey, _cache_value: &SegmentCacheValue) -> Result<()> {
        Ok(()) // No-op
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SegmentationConfig;
    use crate::types::{GlobalMetadata, PageRecord, SegmentedDocument};
    use tempfile::TempDir;

    #[test]
    fn test_source_hash_consistency() {
        let raw = b"<p>Page 1</p>";
        assert_eq!(calculate_source_hash(raw), calculate_source_hash(raw));
        assert_ne!(calculate_source_hash(raw), calculate_source_hash(b"<p>Page 2</p>"));
    }

    #[test]
    fn test_config_hash_tracks_changes() {
        let base = SegmentationConfig::default();
        let mut changed = SegmentationConfig::default();
        changed.truncate_to_page_count = false;
        assert_ne!(
            calculate_config_hash(&base).unwrap(),
            calculate_config_hash(&changed).unwrap()
        );
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path()).unwrap();

        let key = SegmentCacheKey::new("abc".to_string(), "def".to_string());
        assert!(storage.get_segments(&key).unwrap().is_none());

        let document = SegmentedDocument {
            globals: GlobalMetadata {
                client_name: Some("Acme".to_string()),
                ..GlobalMetadata::default()
            },
            pages: vec![PageRecord::new(1, "Page 1".to_string())],
        };
        storage
            .store_segments(&key, &SegmentCacheValue::new(document.clone(), 12))
            .unwrap();

        let cached = storage.get_segments(&key).unwrap().unwrap();
        assert_eq!(cached.document, document);
        assert_eq!(cached.processing_time_ms, 12);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path()).unwrap();
        let key = SegmentCacheKey::new("abc".to_string(), "def".to_string());
        std::fs::write(storage.segments_path(&key), "{ not json").unwrap();
        assert!(storage.get_segments(&key).unwrap().is_none());
    }

    #[test]
    fn test_noop_storage_never_hits() {
        let storage = NoOpStorage::new();
        let key = SegmentCacheKey::new("a".to_string(), "b".to_string());
        let value = SegmentCacheValue::new(SegmentedDocument::default(), 0);
        storage.store_segments(&key, &value).unwrap();
        assert!(storage.get_segments(&key).unwrap().is_none());
    }
}
