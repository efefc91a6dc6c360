use crate::catalog::reference;
use crate::catalog::types::InventoryResponse;
use crate::catalog::{InventorySource, SegmentBatch};
use crate::domain::recommendation::Diagnostic;
use crate::domain::unit::UnitCandidate;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Fixed in-memory inventory.
#[derive(Debug, Clone, Default)]
pub struct SeededInventory {
    segments: Vec<UnitCandidate>,
}

impl SeededInventory {
    pub fn new(segments: Vec<UnitCandidate>) -> Self {
        Self { segments }
    }
}

#[async_trait::async_trait]
impl InventorySource for SeededInventory {
    fn source_name(&self) -> &'static str {
        "seeded"
    }

    async fn fetch_segments(&self) -> Result<SegmentBatch> {
        Ok(self.segments.clone().into())
    }
}

/// Representative segments derived from the town reference table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceInventory;

#[async_trait::async_trait]
impl InventorySource for ReferenceInventory {
    fn source_name(&self) -> &'static str {
        "reference"
    }

    async fn fetch_segments(&self) -> Result<SegmentBatch> {
        Ok(reference::reference_segments().into())
    }
}

/// Inventory read from a JSON file on every fetch, so edits are picked up without a restart.
///
/// Accepts either `{"segments": [...]}` or a bare array of segments.
#[derive(Debug, Clone)]
pub struct JsonFileInventory {
    path: PathBuf,
}

impl JsonFileInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl InventorySource for JsonFileInventory {
    fn source_name(&self) -> &'static str {
        "json_file"
    }

    async fn fetch_segments(&self) -> Result<SegmentBatch> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read inventory file {}", self.path.display()))?;
        parse_segments(&text)
            .with_context(|| format!("invalid inventory file {}", self.path.display()))
    }
}

/// Decodes an inventory payload row by row. A body that is not JSON, or is neither an array nor
/// `{"segments": [...]}`, is an error; an unreadable row is skipped and reported.
pub fn parse_segments(text: &str) -> Result<SegmentBatch> {
    let value = serde_json::from_str::<serde_json::Value>(text)
        .context("inventory is not valid JSON")?;
    let rows = match value {
        serde_json::Value::Array(rows) => rows,
        other => {
            serde_json::from_value::<InventoryResponse>(other)
                .context("failed to parse inventory into InventoryResponse")?
                .segments
        }
    };

    let mut batch = SegmentBatch::default();
    for (index, row) in rows.into_iter().enumerate() {
        let subject = row_subject(index, &row);
        match serde_json::from_value::<UnitCandidate>(row) {
            Ok(segment) => batch.segments.push(segment),
            Err(err) => {
                tracing::warn!(%subject, error = %err, "skipping unreadable inventory row");
                batch.rejected.push(Diagnostic {
                    subject,
                    detail: format!("unreadable inventory segment: {err}"),
                });
            }
        }
    }
    Ok(batch)
}

fn row_subject(index: usize, row: &serde_json::Value) -> String {
    match row.get("town").and_then(serde_json::Value::as_str) {
        Some(town) => format!("inventory row {index} ({town})"),
        None => format!("inventory row {index}"),
    }
}
