//! # Registrar Models
//!
//! Domain models and DTOs for the Registrar API.
//!
//! # Modules
//!
//! - [`ids`]: typed identifiers (`RoleId`, `SemesterId`)
//! - [`roles`]: roles, capability sets and role DTOs
//! - [`semesters`]: semesters, lifecycle status and semester DTOs

pub mod ids;
pub mod roles;
pub mod semesters;

// Re-export commonly used types at crate root for convenience
pub use ids::{RoleId, SemesterId};
pub use roles::{
    CapabilitiesDto, CreateRoleDto, DuplicateRoleDto, PermissionCheckParams,
    PermissionCheckResponse, Role, RoleWithStats, UpdateRoleDto,
};
pub use semesters::{
    CreateSemesterDto, Semester, SemesterFilterParams, SemesterStatus, SemesterType,
    SemesterWithStatus, UpdateSemesterDto,
};
