//! Tile ingestion pipeline: renders tiles from staged originals,
//! persists them in bounded batches, and drives the per-project
//! lifecycle (status transitions, first-upload pod provisioning).

use satseg_core::error::CoreError;
use satseg_pod::PodApiError;
use satseg_storage::StorageError;

pub mod coordinator;
pub mod driver;
pub mod render;
pub mod stores;

pub use coordinator::persist_tiles;
pub use driver::IngestPipeline;
pub use render::{decode_source, RenderedTile, TileRenderer};
pub use stores::{MemoryProjectStore, PgProjectStore, ProjectSnapshot, ProjectStore};

/// Errors surfaced by the ingestion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A domain-level error (validation, not-found, conflict).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Image decode/encode failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Object storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Document store failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The pod control plane failed.
    #[error(transparent)]
    Pod(#[from] PodApiError),
}
