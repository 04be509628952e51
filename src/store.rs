//! # Persistence Seam
//! The destination store is an external collaborator; this crate only needs
//! one idempotent upsert keyed by the record's natural identifier, so retried
//! pagination or a re-run batch never duplicates records.

use crate::records::NormalizedRecord;

#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Create-or-update by natural key. Must be idempotent.
    async fn upsert(&self, record: &NormalizedRecord) -> anyhow::Result<()>;
}
