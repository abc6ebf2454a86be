//! # Registrar Core
//!
//! Core types shared by every Registrar crate:
//!
//! - [`catalog`]: the permission catalog and the [`Capability`] pair
//! - [`errors`]: the application error type with HTTP response conversion
//! - [`serde`]: custom serde deserialization helpers
//!
//! # Example
//!
//! ```ignore
//! use registrar_core::{AppError, PermissionCatalog};
//!
//! let catalog = PermissionCatalog::builtin();
//! let actions = catalog.actions_of("students")?;
//!
//! let error = AppError::not_found(anyhow::anyhow!("Role not found"));
//! ```

pub mod catalog;
pub mod errors;
pub mod serde;

// Re-export commonly used types at crate root
pub use catalog::{Capability, ModuleDefinition, PermissionCatalog};
pub use errors::{AppError, ErrorResponse};
