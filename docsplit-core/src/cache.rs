use crate::types::SegmentedDocument;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version constants for cache invalidation
pub mod versions {
    pub const DOCSPLIT_VERSION: &str = env!("CARGO_PKG_VERSION");
    /// Bump when marker, field or body extraction output changes
    pub const SEGMENTER_VERSION: &str = "1.0.0";
    /// Bump when native document rendering output changes
    pub const RENDERER_VERSION: &str = "1.0.0";
}

/// Segment cache key (raw source + config → pages)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SegmentCacheKey {
    pub source_hash: String,
    pub config_hash: String,
    pub docsplit_version: String,
    pub segmenter_version: String,
    pub renderer_version: String,
}

impl SegmentCacheKey {
    pub fn new(source_hash: String, config_hash: String) -> Self {
        Self {
            source_hash,
            config_hash,
            docsplit_version: versions::DOCSPLIT_VERSION.to_string(),
            segmenter_version: versions::SEGMENTER_VERSION.to_string(),
            renderer_version: versions::RENDERER_VERSION.to_string(),
        }
    }

    /// Compute cache key hash for storage
    pub fn to_cache_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(&self.source_hash);
        hasher.update(&self.config_hash);
        hasher.update(&self.docsplit_version);
        hasher.update(&self.segmenter_version);
        hasher.update(&self.renderer_version);
        format!("{:x}", hasher.finalize())
    }
}

/// Cached segmentation result with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentCacheValue {
    pub document: SegmentedDocument,
    pub created_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub cache_version: String,
}

impl SegmentCacheValue {
    pub fn new(document: SegmentedDocument, processing_time_ms: u64) -> Self {
        Self {
            document,
            created_at: Utc::now(),
            processing_time_ms,
            cache_version: versions::DOCSPLIT_VERSION.to_string(),
        }
    }
}
