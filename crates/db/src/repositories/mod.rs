mod annotation_tile_repo;
mod project_repo;

pub use annotation_tile_repo::AnnotationTileRepo;
pub use project_repo::ProjectRepo;
