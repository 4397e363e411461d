//! Cell records recorded to a JSON file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::fs;
use tracing::warn;

use super::RecordSource;
use crate::model::{CellRadio, CellRecord};

/// Serde representation of a snapshot file. Towers stay untyped until their
/// radio type has been checked.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    #[serde(default)]
    cell_towers: Vec<Value>,
}

/// Reads the file again on every query, so edits show up immediately.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Parses the towers in file order. Towers of a radio type without metrics
/// (cdma, tdscdma, ...) are skipped, a malformed tower of a known type fails
/// the whole snapshot.
pub fn parse(raw: &[u8]) -> Result<Vec<CellRecord>> {
    let snapshot: Snapshot = serde_json::from_slice(raw)?;

    let mut records = Vec::with_capacity(snapshot.cell_towers.len());
    for (i, tower) in snapshot.cell_towers.into_iter().enumerate() {
        let radio = tower.get("radioType").cloned().unwrap_or(Value::Null);
        if serde_json::from_value::<CellRadio>(radio.clone()).is_err() {
            warn!(index = i, radio_type = %radio, "skipping cell of unsupported radio type");
            continue;
        }

        let record = serde_json::from_value(tower)
            .with_context(|| format!("Invalid cell tower at index {i}"))?;
        records.push(record);
    }

    Ok(records)
}

#[async_trait]
impl RecordSource for SnapshotSource {
    async fn cell_records(&self) -> Result<Vec<CellRecord>> {
        let raw = fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read snapshot {}", self.path.display()))?;
        parse(&raw).context("Failed to parse snapshot")
    }
}
