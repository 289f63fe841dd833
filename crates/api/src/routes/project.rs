//! Route definitions for projects and tile ingestion.
//!
//! ```text
//! POST   /                       create_project
//! GET    /{id}                   get_project
//! POST   /{id}/split-images      split_images
//! GET    /{id}/tiles             list_tiles
//! GET    /{id}/tiles/{index}     get_tile
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::project;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(project::create_project))
        .route("/{id}", get(project::get_project))
        .route("/{id}/split-images", post(project::split_images))
        .route("/{id}/tiles", get(project::list_tiles))
        .route("/{id}/tiles/{index}", get(project::get_tile))
}
