//! Pure domain logic for the satseg ingestion backend.
//!
//! Holds the tile planner, naming conventions, status enums, error
//! taxonomy, and environment configuration. This crate has no internal
//! dependencies and no I/O so every function here is unit-testable.

pub mod annotation;
pub mod config;
pub mod error;
pub mod naming;
pub mod project;
pub mod tiling;
pub mod types;
