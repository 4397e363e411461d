//! Where cell records come from.

use anyhow::Result;
use async_trait::async_trait;

use crate::model::CellRecord;

pub mod mmcli;
pub mod snapshot;

pub use mmcli::MmcliSource;
pub use snapshot::SnapshotSource;

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// All cells currently observed, in the order the platform reports them.
    /// The list may be empty.
    async fn cell_records(&self) -> Result<Vec<CellRecord>>;
}
