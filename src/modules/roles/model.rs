//! Role data models and DTOs.
//!
//! Re-exports role models from the `registrar-models` crate.

pub use registrar_models::roles::*;
