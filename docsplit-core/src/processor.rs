use crate::cache::{SegmentCacheKey, SegmentCacheValue};
use crate::config::SegmentationConfig;
use crate::preprocessors;
use crate::segmenter::Segmenter;
use crate::sources::DocumentSource;
use crate::storage::{calculate_config_hash, calculate_source_hash, DocumentStorage, FileStorage, NoOpStorage};
use crate::types::*;
use anyhow::Result;
use std::path::Path;
use std::time::{Duration, Instant};

/// Captured intermediate outputs from each pipeline stage
/// Used for testing and diagnostics, to inspect each boundary
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineStages {
    pub source_kind: SourceKind,
    pub markup: String,
    pub document: SegmentedDocument,
}

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        tracing::info!("⏱️  {}: {:.0}ms", step_name, elapsed.as_millis());

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();
        let mut summary = String::from("📊 Performance Summary:");
        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            summary.push_str(&format!(
                "\n   {:.<35} {:.0}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            ));
        }
        summary.push_str(&format!("\n   {:.<35} {:.0}ms", "Total", total.as_millis()));
        tracing::info!("{}", summary);
    }
}

/// Raw source → markup → pages, with result caching.
///
/// Holds no per-document state, so one processor can serve several
/// threads; each call parses its own tree.
pub struct DocumentProcessor {
    storage: Box<dyn DocumentStorage + Send + Sync>,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new_with_storage(Box::new(NoOpStorage::new()))
    }
}

impl DocumentProcessor {
    /// Create DocumentProcessor with an injected cache backend
    pub fn new_with_storage(storage: Box<dyn DocumentStorage + Send + Sync>) -> Self {
        Self { storage }
    }

    /// Convenience constructor for CLI usage with a file cache
    pub fn new_cli_with_cache(cache_dir: &str) -> Result<Self> {
        Ok(Self::new_with_storage(Box::new(FileStorage::new(cache_dir)?)))
    }

    /// Process document with specific config and optional profiling
    pub fn process_document_with_config_and_profiling(
        &self,
        input_path: &str,
        config: &SegmentationConfig,
        enable_profiling: bool,
        skip_cache: bool,
    ) -> Result<SegmentedDocument> {
        let raw = std::fs::read(input_path)?;
        let kind = SourceKind::detect(Some(Path::new(input_path)), &raw);
        let mut profiler = StepProfiler::new(enable_profiling);
        self.process_bytes_with_profiler(input_path, kind, &raw, config, &mut profiler, skip_cache)
    }

    /// Process document with specific config (cached)
    pub fn process_document_with_config(
        &self,
        input_path: &str,
        config: &SegmentationConfig,
    ) -> Result<SegmentedDocument> {
        self.process_document_with_config_and_profiling(input_path, config, false, false)
    }

    /// Simple document processing function using default config
    pub fn process_document(&self, input_path: &str) -> Result<SegmentedDocument> {
        self.process_document_with_config(input_path, &SegmentationConfig::default())
    }

    /// Process document with config loaded from file
    pub fn process_document_with_config_file(
        &self,
        input_path: &str,
        config_path: &str,
    ) -> Result<SegmentedDocument> {
        let config = SegmentationConfig::load_from_file(config_path)?;
        self.process_document_with_config(input_path, &config)
    }

    /// Process raw bytes of a known source kind
    pub fn process_bytes_with_config(
        &self,
        name: &str,
        kind: SourceKind,
        raw: &[u8],
        config: &SegmentationConfig,
    ) -> Result<SegmentedDocument> {
        let mut profiler = StepProfiler::new(false);
        self.process_bytes_with_profiler(name, kind, raw, config, &mut profiler, false)
    }

    /// Fetch a document through `source` and process it.
    /// `Ok(None)` when the source does not have the document.
    pub fn process_document_id(
        &self,
        source: &dyn DocumentSource,
        document_id: &str,
        config: &SegmentationConfig,
    ) -> Result<Option<SegmentedDocument>> {
        let Some(fetched) = source.fetch_document(document_id)? else {
            return Ok(None);
        };
        tracing::info!(
            "📥 Fetched {} from {} source ({} bytes)",
            fetched.id,
            source.name(),
            fetched.bytes.len()
        );
        let document = self.process_bytes_with_config(&fetched.id, fetched.kind, &fetched.bytes, config)?;
        Ok(Some(document))
    }

    fn process_bytes_with_profiler(
        &self,
        name: &str,
        kind: SourceKind,
        raw: &[u8],
        config: &SegmentationConfig,
        profiler: &mut StepProfiler,
        skip_cache: bool,
    ) -> Result<SegmentedDocument> {
        let start_time = Instant::now();

        let cache_key = profiler.time_step("Cache Key Generation", || {
            let config_hash = calculate_config_hash(config)?;
            Ok::<SegmentCacheKey, anyhow::Error>(SegmentCacheKey::new(calculate_source_hash(raw), config_hash))
        })?;

        let cached = if skip_cache {
            tracing::info!("🚫 Skipping cache lookup (--skip-cache enabled)");
            None
        } else {
            profiler.time_step("Cache Lookup", || self.storage.get_segments(&cache_key))?
        };

        if let Some(cached) = cached {
            tracing::info!("🎯 Cache hit: Found pages for source + config combination");
            profiler.print_summary();
            return Ok(cached.document);
        }

        tracing::info!("📄 Processing {} ({:?})", name, kind);

        let segmenter = Segmenter::new(config)?;
        let markup = profiler.time_step("1. Source → Markup", || {
            preprocessors::for_kind(kind, &config.renderer).to_markup(raw)
        })?;
        let document = profiler.time_step("2. Markup → Pages", || segmenter.segment(&markup));

        if skip_cache {
            tracing::info!("🚫 Skipping cache storage (--skip-cache enabled)");
        } else {
            profiler.time_step("Cache Storage", || {
                let processing_time = start_time.elapsed().as_millis() as u64;
                let cache_value = SegmentCacheValue::new(document.clone(), processing_time);
                self.storage.store_segments(&cache_key, &cache_value)
            })?;
        }

        profiler.print_summary();
        tracing::info!(
            "⏱️  {}: {} pages in {:.0}ms",
            name,
            document.pages.len(),
            start_time.elapsed().as_millis()
        );
        Ok(document)
    }

    /// Process document and capture all intermediate stage outputs.
    /// Never reads or writes the cache.
    pub fn process_document_capture_stages(
        &self,
        input_path: &str,
        config: &SegmentationConfig,
    ) -> Result<PipelineStages> {
        let raw = std::fs::read(input_path)?;
        let source_kind = SourceKind::detect(Some(Path::new(input_path)), &raw);

        // Stage 1: Source → Markup
        let markup = preprocessors::for_kind(source_kind, &config.renderer).to_markup(&raw)?;
        tracing::info!("📋 Stage 1: Markup captured ({} bytes)", markup.len());

        // Stage 2: Markup → Pages
        let document = Segmenter::new(config)?.segment(&markup);
        tracing::info!("📋 Stage 2: {} pages captured", document.pages.len());

        Ok(PipelineStages {
            source_kind,
            markup,
            document,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::FileSource;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"<p>Client Name: Acme</p><p class="title">Page 1</p><h1>Hello</h1><p>x</p>"#;

    #[test]
    fn profiler_records_only_when_enabled() {
        let mut off = StepProfiler::new(false);
        assert_eq!(off.time_step("a", || 1), 1);
        assert!(off.timings().is_empty());

        let mut on = StepProfiler::new(true);
        on.time_step("a", || ());
        assert_eq!(on.timings().len(), 1);
        assert_eq!(on.timings()[0].0, "a");
    }

    #[test]
    fn file_cache_round_trip() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("copy.html");
        std::fs::write(&input, SAMPLE).unwrap();
        let input = input.to_str().unwrap();
        let cache_dir = dir.path().join("cache");

        let processor = DocumentProcessor::new_cli_with_cache(cache_dir.to_str().unwrap()).unwrap();
        let first = processor.process_document(input).unwrap();
        let entries = std::fs::read_dir(cache_dir.join("segments")).unwrap().count();
        assert_eq!(entries, 1);

        let second = processor.process_document(input).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.globals.client_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn skip_cache_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("copy.html");
        std::fs::write(&input, SAMPLE).unwrap();
        let cache_dir = dir.path().join("cache");

        let processor = DocumentProcessor::new_cli_with_cache(cache_dir.to_str().unwrap()).unwrap();
        processor
            .process_document_with_config_and_profiling(
                input.to_str().unwrap(),
                &SegmentationConfig::default(),
                true,
                true,
            )
            .unwrap();
        assert_eq!(std::fs::read_dir(cache_dir.join("segments")).unwrap().count(), 0);
    }

    #[test]
    fn capture_stages_exposes_markup() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("copy.htm");
        std::fs::write(&input, SAMPLE).unwrap();

        let stages = DocumentProcessor::default()
            .process_document_capture_stages(input.to_str().unwrap(), &SegmentationConfig::default())
            .unwrap();
        assert_eq!(stages.source_kind, SourceKind::Html);
        assert_eq!(stages.markup, SAMPLE);
        assert_eq!(stages.document.pages[0].page_body, "<h1>Hello</h1><p>x</p>");
    }

    #[test]
    fn by_document_id() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("doc42.html"), SAMPLE).unwrap();
        let source = FileSource::new(dir.path());
        let processor = DocumentProcessor::default();
        let config = SegmentationConfig::default();

        let found = processor.process_document_id(&source, "doc42", &config).unwrap();
        assert_eq!(found.unwrap().pages.len(), 1);
        assert!(processor.process_document_id(&source, "nope", &config).unwrap().is_none());
    }

    #[test]
    fn invalid_marker_pattern_fails_the_call() {
        let mut config = SegmentationConfig::default();
        config.markers.pattern = Some("(".to_string());
        let err = DocumentProcessor::default()
            .process_bytes_with_config("x", SourceKind::Html, SAMPLE.as_bytes(), &config)
            .unwrap_err();
        assert!(err.to_string().contains("markers.pattern"));
    }
}
