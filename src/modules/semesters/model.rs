//! Semester data models and DTOs.
//!
//! Re-exports semester models from the `registrar-models` crate.

pub use registrar_models::semesters::*;
