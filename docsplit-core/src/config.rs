use anyhow::Result;
use serde::{Deserialize, Serialize};

// Default value functions for serde
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Page marker discovery
    #[serde(default)]
    pub markers: MarkerConfig,
    /// Style classification heuristics (title markers, content headings, text blocks)
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Labels for global and per-page metadata lines
    #[serde(default)]
    pub labels: LabelConfig,
    /// Redirect-wrapper link handling
    #[serde(default)]
    pub links: LinkConfig,
    /// Native document rendering options
    #[serde(default)]
    pub renderer: RendererConfig,
    /// Drop trailing pages beyond the declared "Number of Pages"
    #[serde(default = "default_true")]
    pub truncate_to_page_count: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            markers: MarkerConfig::default(),
            classifier: ClassifierConfig::default(),
            labels: LabelConfig::default(),
            links: LinkConfig::default(),
            renderer: RendererConfig::default(),
            truncate_to_page_count: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// When no title-styled "Page N" element exists, accept any element with
    /// matching text. Can misfire on body copy that reads "Page 2".
    #[serde(default = "default_true")]
    pub allow_unstyled_fallback: bool,
    /// Override for the marker text pattern. Must capture the page number
    /// in group 1. Defaults to `Page <N>`, case-insensitive.
    #[serde(default)]
    pub pattern: Option<String>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            allow_unstyled_fallback: true,
            pattern: None,
        }
    }
}

fn default_title_classes() -> Vec<String> {
    vec!["title".to_string()]
}

fn default_content_heading_tags() -> Vec<String> {
    vec!["h1".to_string()]
}

fn default_text_block_tags() -> Vec<String> {
    ["p", "li", "h1", "h2", "h3", "h4", "h5", "h6", "td", "th", "blockquote", "pre", "div"]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Class tokens that mark an element as title-level
    #[serde(default = "default_title_classes")]
    pub title_classes: Vec<String>,
    /// Substrings of the inline `style` attribute that mark an element as title-level
    #[serde(default)]
    pub title_style_fragments: Vec<String>,
    /// Tags treated as the page's content heading
    #[serde(default = "default_content_heading_tags")]
    pub content_heading_tags: Vec<String>,
    /// Tags whose text is matched against metadata labels.
    /// Containers (div) only count when they hold no nested text blocks.
    #[serde(default = "default_text_block_tags")]
    pub text_block_tags: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            title_classes: default_title_classes(),
            title_style_fragments: Vec::new(),
            content_heading_tags: default_content_heading_tags(),
            text_block_tags: default_text_block_tags(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldLabel {
    /// Label text, matched case-insensitively at the start of a text block
    pub label: String,
    /// Whether the trailing colon may be omitted
    #[serde(default)]
    pub colon_optional: bool,
}

impl FieldLabel {
    pub fn new(label: &str, colon_optional: bool) -> Self {
        Self {
            label: label.to_string(),
            colon_optional,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub client_name: FieldLabel,
    pub client_url: FieldLabel,
    pub number_of_pages: FieldLabel,
    pub page_url: FieldLabel,
    pub meta_title: FieldLabel,
    pub meta_description: FieldLabel,
    pub author: FieldLabel,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            client_name: FieldLabel::new("Client Name", false),
            client_url: FieldLabel::new("Client URL", true),
            number_of_pages: FieldLabel::new("Number of Pages", false),
            page_url: FieldLabel::new("Page URL", true),
            meta_title: FieldLabel::new("Meta title", false),
            meta_description: FieldLabel::new("Meta description", false),
            author: FieldLabel::new("Author", false),
        }
    }
}

fn default_redirect_hosts() -> Vec<String> {
    vec!["www.google.com".to_string(), "google.com".to_string()]
}

fn default_redirect_params() -> Vec<String> {
    vec!["q".to_string(), "url".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Hosts whose links wrap the real destination in a query parameter.
    /// Any host with a `/url` path is treated as a redirect wrapper too.
    #[serde(default = "default_redirect_hosts")]
    pub redirect_hosts: Vec<String>,
    /// Query parameters that may carry the real destination, in priority order
    #[serde(default = "default_redirect_params")]
    pub redirect_params: Vec<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            redirect_hosts: default_redirect_hosts(),
            redirect_params: default_redirect_params(),
        }
    }
}

fn default_heading_level() -> u8 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Render TITLE/SUBTITLE paragraphs with `class="title"` / `class="subtitle"`
    #[serde(default = "default_true")]
    pub emit_title_class: bool,
    /// Heading level used when a HEADING_<n> style has no parseable level
    #[serde(default = "default_heading_level")]
    pub default_heading_level: u8,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            emit_title_class: true,
            default_heading_level: default_heading_level(),
        }
    }
}

impl SegmentationConfig {
    /// Load config from file path (functional approach)
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SegmentationConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::warn!("⚠️  Failed to load config from {}, using defaults: {}", p, e);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}
