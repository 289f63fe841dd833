//! Route table assembly.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod project;

/// All `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/projects", project::router())
}
