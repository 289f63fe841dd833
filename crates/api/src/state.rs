use std::sync::Arc;

use satseg_pipeline::{IngestPipeline, PgProjectStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: satseg_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Tile ingestion pipeline (object store + pod orchestrator inside).
    pub pipeline: Arc<IngestPipeline<PgProjectStore>>,
}
