pub mod annotation_tile;
pub mod project;
