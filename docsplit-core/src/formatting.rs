//! Hand-off to per-client formatters and uploaders.
//!
//! Formatters map a `PageRecord` onto a target platform's fields. They are
//! looked up by (client id, content type) through `FormatterRegistry`;
//! concrete formatters and uploaders live outside this crate.

use crate::error::DocsplitError;
use crate::types::PageRecord;
use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, RwLock};

static SAFE_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

/// Describes the fields a formatter produced, for review and upload tooling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    #[serde(default)]
    pub fields: Vec<ManifestField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestField {
    pub label: String,
    /// Location of the value inside the formatted data, e.g. `data.metaTitle`
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub upload: Value,
}

/// A page as handed over for formatting: the segmenter record plus the
/// content type chosen for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(flatten)]
    pub page: PageRecord,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Output of a successful formatter call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattedPage {
    #[serde(rename = "pageNumber")]
    pub page_number: u32,
    pub content_type: String,
    pub ok: bool,
    pub data: Value,
    pub manifest: Manifest,
}

pub trait PageFormatter: Send + Sync {
    fn format_page(&self, page: &PageRecord) -> Result<(Value, Manifest)>;

    /// Rows this page contributes to a CSV export.
    fn format_csv_rows(&self, _page: &FormattedPage) -> Vec<Map<String, Value>> {
        Vec::new()
    }

    /// Uploader for formatted pages of this type, if the platform supports it.
    fn uploader(&self) -> Option<&dyn PageUploader> {
        None
    }
}

pub trait PageUploader: Send + Sync {
    fn upload_page(&self, page: &FormattedPage) -> Result<()>;
}

type FormatterLoader = Box<dyn Fn(&str, &str) -> Option<Arc<dyn PageFormatter>> + Send + Sync>;

/// (client id, content type) -> formatter, cached after first resolution.
///
/// Entries are never replaced once inserted, so concurrent readers always
/// see the same formatter for a key.
#[derive(Default)]
pub struct FormatterRegistry {
    cache: RwLock<HashMap<(String, String), Arc<dyn PageFormatter>>>,
    loader: Option<FormatterLoader>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve cache misses through `loader`, which plays the role of a
    /// module lookup for formatters not registered up front.
    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn(&str, &str) -> Option<Arc<dyn PageFormatter>> + Send + Sync + 'static,
    {
        Self {
            cache: RwLock::default(),
            loader: Some(Box::new(loader)),
        }
    }

    pub fn register(
        &self,
        client_id: &str,
        content_type: &str,
        formatter: Arc<dyn PageFormatter>,
    ) -> Result<(), DocsplitError> {
        validate_id(client_id, "client_id")?;
        validate_id(content_type, "content_type")?;
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache
            .entry((client_id.to_string(), content_type.to_string()))
            .or_insert(formatter);
        Ok(())
    }

    /// Look up a formatter. With `strict`, a missing formatter is an error;
    /// otherwise it is `Ok(None)`. Invalid ids are always an error.
    pub fn resolve(
        &self,
        client_id: &str,
        content_type: &str,
        strict: bool,
    ) -> Result<Option<Arc<dyn PageFormatter>>, DocsplitError> {
        let key = (client_id.to_string(), content_type.to_string());
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(formatter) = cache.get(&key) {
                return Ok(Some(Arc::clone(formatter)));
            }
        }

        validate_id(client_id, "client_id")?;
        validate_id(content_type, "content_type")?;

        let loaded = self.loader.as_ref().and_then(|load| load(client_id, content_type));
        match loaded {
            Some(formatter) => {
                let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
                let cached = cache.entry(key).or_insert(formatter);
                Ok(Some(Arc::clone(cached)))
            }
            None if strict => Err(DocsplitError::FormatterNotFound {
                client_id: client_id.to_string(),
                content_type: content_type.to_string(),
            }),
            None => Ok(None),
        }
    }
}

fn validate_id(value: &str, field: &'static str) -> Result<(), DocsplitError> {
    if SAFE_ID_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(DocsplitError::InvalidIdentifier {
            field,
            value: value.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageError {
    #[serde(rename = "pageNumber")]
    pub page_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakdownResult {
    pub pages: Vec<FormattedPage>,
    pub errors: Vec<PageError>,
}

/// Format every page request for `client_id`. Failures are collected per
/// page and never abort the batch.
pub fn breakdown_pages(
    registry: &FormatterRegistry,
    client_id: &str,
    requests: &[PageRequest],
) -> BreakdownResult {
    let mut result = BreakdownResult::default();

    for request in requests {
        let page_number = request.page.page_number;
        let content_type = request
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty());

        let Some(content_type) = content_type else {
            result.errors.push(PageError {
                page_number,
                content_type: None,
                error: "Missing content_type".to_string(),
            });
            continue;
        };

        let formatted = registry
            .resolve(client_id, content_type, true)
            .map_err(anyhow::Error::from)
            .and_then(|formatter| match formatter {
                Some(formatter) => formatter.format_page(&request.page),
                None => Err(anyhow::anyhow!("formatter not found")),
            });

        match formatted {
            Ok((data, manifest)) => result.pages.push(FormattedPage {
                page_number,
                content_type: content_type.to_string(),
                ok: true,
                data,
                manifest,
            }),
            Err(e) => {
                tracing::error!(
                    "❌ Formatting failed for page {} ({}/{}): {:#}",
                    page_number,
                    client_id,
                    content_type,
                    e
                );
                result.errors.push(PageError {
                    page_number,
                    content_type: Some(content_type.to_string()),
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        "📦 Formatted {} pages for {} ({} errors)",
        result.pages.len(),
        client_id,
        result.errors.len()
    );
    result
}

/// CSV rows for formatted pages, in page order. Pages whose formatter is
/// unknown contribute nothing.
pub fn csv_rows(
    registry: &FormatterRegistry,
    client_id: &str,
    pages: &[FormattedPage],
) -> Vec<Map<String, Value>> {
    pages
        .iter()
        .filter_map(|page| {
            let formatter = registry.resolve(client_id, &page.content_type, false).ok()??;
            Some(formatter.format_csv_rows(page))
        })
        .flatten()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDetail {
    #[serde(rename = "pageNumber")]
    pub page_number: u32,
    pub status: UploadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    pub client_id: String,
    pub uploaded: usize,
    pub failed: usize,
    pub details: Vec<UploadDetail>,
}

/// Upload formatted pages through their formatters' uploaders.
pub fn upload_pages(
    registry: &FormatterRegistry,
    client_id: &str,
    pages: &[FormattedPage],
) -> UploadSummary {
    let mut summary = UploadSummary {
        client_id: client_id.to_string(),
        uploaded: 0,
        failed: 0,
        details: Vec::with_capacity(pages.len()),
    };

    for page in pages {
        let outcome = match registry.resolve(client_id, &page.content_type, false) {
            Ok(Some(formatter)) => match formatter.uploader() {
                Some(uploader) => uploader.upload_page(page).map_err(|e| e.to_string()),
                None => Err(format!("upload not implemented for {}", page.content_type)),
            },
            Ok(None) => Err(format!("No formatter found for {}", page.content_type)),
            Err(e) => Err(e.to_string()),
        };

        let detail = match outcome {
            Ok(()) => {
                summary.uploaded += 1;
                UploadDetail {
                    page_number: page.page_number,
                    status: UploadStatus::Success,
                    error: None,
                }
            }
            Err(error) => {
                tracing::warn!("⚠️  Upload failed for page {}: {}", page.page_number, error);
                summary.failed += 1;
                UploadDetail {
                    page_number: page.page_number,
                    status: UploadStatus::Failed,
                    error: Some(error),
                }
            }
        };
        summary.details.push(detail);
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct HeadingFormatter;

    impl PageFormatter for HeadingFormatter {
        fn format_page(&self, page: &PageRecord) -> Result<(Value, Manifest)> {
            let heading = page
                .page_heading
                .clone()
                .ok_or_else(|| anyhow::anyhow!("page has no heading"))?;
            let manifest = Manifest {
                version: "1.0".to_string(),
                fields: vec![ManifestField {
                    label: "Page Heading".to_string(),
                    path: "data.pageHeading".to_string(),
                    kind: "text".to_string(),
                    upload: json!({"metafield": "title"}),
                }],
            };
            Ok((json!({"pageHeading": heading}), manifest))
        }

        fn format_csv_rows(&self, page: &FormattedPage) -> Vec<Map<String, Value>> {
            let mut row = Map::new();
            row.insert("page".to_string(), json!(page.page_number));
            vec![row]
        }

        fn uploader(&self) -> Option<&dyn PageUploader> {
            Some(self)
        }
    }

    impl PageUploader for HeadingFormatter {
        fn upload_page(&self, page: &FormattedPage) -> Result<()> {
            if page.page_number == 2 {
                anyhow::bail!("rate limited");
            }
            Ok(())
        }
    }

    struct NoUpload;

    impl PageFormatter for NoUpload {
        fn format_page(&self, _page: &PageRecord) -> Result<(Value, Manifest)> {
            Ok((json!({}), Manifest::default()))
        }
    }

    fn request(n: u32, heading: Option<&str>, content_type: Option<&str>) -> PageRequest {
        let mut page = PageRecord::new(n, format!("Page {n}"));
        page.page_heading = heading.map(str::to_string);
        PageRequest {
            page,
            content_type: content_type.map(str::to_string),
        }
    }

    #[test]
    fn ids_are_validated() {
        let registry = FormatterRegistry::new();
        assert!(matches!(
            registry.resolve("acme", "../x", false),
            Err(DocsplitError::InvalidIdentifier { field: "content_type", .. })
        ));
        assert!(matches!(
            registry.register("a-b", "page", Arc::new(NoUpload)),
            Err(DocsplitError::InvalidIdentifier { field: "client_id", .. })
        ));
    }

    #[test]
    fn strict_and_lenient_lookup() {
        let registry = FormatterRegistry::new();
        assert!(registry.resolve("acme", "page", false).unwrap().is_none());
        assert!(matches!(
            registry.resolve("acme", "page", true),
            Err(DocsplitError::FormatterNotFound { .. })
        ));
    }

    #[test]
    fn loader_results_are_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = FormatterRegistry::with_loader(move |client, ct| {
            counter.fetch_add(1, Ordering::SeqCst);
            (client == "acme" && ct == "blog").then(|| Arc::new(NoUpload) as Arc<dyn PageFormatter>)
        });
        assert!(registry.resolve("acme", "blog", true).unwrap().is_some());
        assert!(registry.resolve("acme", "blog", true).unwrap().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn breakdown_collects_errors_per_page() {
        let registry = FormatterRegistry::new();
        registry
            .register("acme", "landing", Arc::new(HeadingFormatter))
            .unwrap();

        let requests = vec![
            request(1, Some("Welcome"), Some("landing")),
            request(2, None, Some(" landing ")),
            request(3, Some("x"), None),
            request(4, Some("y"), Some("unknown")),
        ];
        let result = breakdown_pages(&registry, "acme", &requests);

        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.pages[0].data["pageHeading"], "Welcome");
        let errors: Vec<(u32, &str)> = result
            .errors
            .iter()
            .map(|e| (e.page_number, e.error.as_str()))
            .collect();
        assert_eq!(errors[0], (2, "page has no heading"));
        assert_eq!(errors[1], (3, "Missing content_type"));
        assert_eq!(errors[2].0, 4);
        assert!(errors[2].1.contains("formatter not found"));

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["pages"][0]["pageNumber"], 1);
        assert_eq!(value["pages"][0]["manifest"]["fields"][0]["type"], "text");
    }

    #[test]
    fn upload_summary_counts() {
        let registry = FormatterRegistry::new();
        registry.register("acme", "landing", Arc::new(HeadingFormatter)).unwrap();
        registry.register("acme", "plain", Arc::new(NoUpload)).unwrap();

        let page = |n: u32, ct: &str| FormattedPage {
            page_number: n,
            content_type: ct.to_string(),
            ok: true,
            data: json!({}),
            manifest: Manifest::default(),
        };
        let pages = vec![page(1, "landing"), page(2, "landing"), page(3, "plain"), page(4, "gone")];
        let summary = upload_pages(&registry, "acme", &pages);

        assert_eq!(summary.uploaded, 1);
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.details[1].error.as_deref(), Some("rate limited"));
        assert_eq!(
            summary.details[2].error.as_deref(),
            Some("upload not implemented for plain")
        );
        assert_eq!(summary.details[3].error.as_deref(), Some("No formatter found for gone"));

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["details"][0]["status"], "success");
        assert!(value["details"][0].get("error").is_none());

        assert_eq!(csv_rows(&registry, "acme", &pages[..2]).len(), 2);
    }
}
