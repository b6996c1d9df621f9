//! Provider-native structured document, as returned by the documents API.
//!
//! Only the parts the renderer reads are modeled; everything else in the
//! payload (tables, inline objects, positions, style sheets) is ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const GLYPH_TYPE_UNSPECIFIED: &str = "GLYPH_TYPE_UNSPECIFIED";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentTree {
    pub document_id: Option<String>,
    pub title: Option<String>,
    pub body: Body,
    pub lists: HashMap<String, ListDefinition>,
}

impl DocumentTree {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    /// Whether the list level renders as `<ol>`. Unknown lists, missing
    /// levels and unspecified glyph types are unordered.
    pub fn is_ordered(&self, list_id: &str, nesting_level: usize) -> bool {
        self.lists
            .get(list_id)
            .and_then(|list| list.list_properties.nesting_levels.get(nesting_level))
            .and_then(|level| level.glyph_type.as_deref())
            .is_some_and(|glyph| !glyph.is_empty() && glyph != GLYPH_TYPE_UNSPECIFIED)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Body {
    pub content: Vec<StructuralElement>,
}

/// One block of the body. Only paragraphs are rendered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructuralElement {
    pub paragraph: Option<Paragraph>,
    pub table: Option<serde_json::Value>,
    pub section_break: Option<serde_json::Value>,
    pub table_of_contents: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Paragraph {
    pub elements: Vec<ParagraphElement>,
    pub paragraph_style: ParagraphStyle,
    pub bullet: Option<Bullet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParagraphStyle {
    pub named_style_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Bullet {
    pub list_id: String,
    /// Zero-based; the API omits it for top-level items.
    pub nesting_level: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParagraphElement {
    pub text_run: Option<TextRun>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextRun {
    pub content: String,
    pub text_style: TextStyle,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub link: Option<Link>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Link {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListDefinition {
    pub list_properties: ListProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListProperties {
    pub nesting_levels: Vec<NestingLevel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NestingLevel {
    pub glyph_type: Option<String>,
    pub glyph_symbol: Option<String>,
}
