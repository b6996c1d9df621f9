use crate::types::{SegmentedDocument, SCHEMA_VERSION};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope for archived or exchanged segmentation results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentReport {
    pub format: String,
    pub schema_version: String,
    pub report_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub source: String,
    pub page_count: usize,
    pub document: SegmentedDocument,
}

impl SegmentedDocument {
    pub fn to_report(&self, source: &str) -> SegmentReport {
        SegmentReport {
            format: "report".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            report_id: Uuid::new_v4(),
            created_at: Utc::now(),
            source: source.to_string(),
            page_count: self.pages.len(),
            document: self.clone(),
        }
    }

    /// JSON in one of the output formats: `document` (default), `pages`
    /// or `report`. Unknown formats fall back to `document`.
    pub fn to_json_with_format(&self, format: &str, source: &str) -> Result<String> {
        let json = match format {
            "pages" => serde_json::to_string_pretty(&self.pages)?,
            "report" => serde_json::to_string_pretty(&self.to_report(source))?,
            "document" | _ => serde_json::to_string_pretty(self)?,
        };
        Ok(json)
    }

    pub fn save_to_json(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn save_with_format(&self, path: &str, format: &str, source: &str) -> Result<()> {
        match format {
            "pages" | "report" => {
                let json = self.to_json_with_format(format, source)?;
                std::fs::write(path, json)?;
            }
            "document" | _ => {
                self.save_to_json(path)?;
            }
        }
        Ok(())
    }
}
