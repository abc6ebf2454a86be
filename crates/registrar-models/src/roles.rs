//! Role models and DTOs.
//!
//! A role is a named set of capabilities. System roles are seeded by the
//! application and cannot be deleted; the super-admin role additionally
//! bypasses every capability check.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use registrar_core::Capability;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::RoleId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub name_localized: String,
    pub description: Option<String>,
    pub description_localized: Option<String>,
    /// Display color, stored as given
    pub color: Option<String>,
    /// Display icon name, stored as given
    pub icon: Option<String>,
    pub is_system: bool,
    /// Granted every capability regardless of the catalog. Only set by seeding.
    pub is_super_admin: bool,
    #[schema(value_type = Vec<Capability>)]
    pub capabilities: BTreeSet<Capability>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Whether the capability set holds `(module, action)`.
    ///
    /// This is plain set membership; use the authorization engine for the
    /// actual decision, which also honors the super-admin flag and the catalog.
    pub fn has_capability(&self, module: &str, action: &str) -> bool {
        self.capabilities.iter().any(|c| c.matches(module, action))
    }
}

/// A role together with the number of users holding it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleWithStats {
    #[serde(flatten)]
    pub role: Role,
    pub users_count: i64,
}

// DTOs

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRoleDto {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Localized name must be between 1 and 100 characters"
    ))]
    pub name_localized: String,
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description_localized: Option<String>,
    #[validate(length(max = 32))]
    pub color: Option<String>,
    #[validate(length(max = 64))]
    pub icon: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

/// Partial update; omitted fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleDto {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: Option<String>,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Localized name must be between 1 and 100 characters"
    ))]
    pub name_localized: Option<String>,
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    pub description_localized: Option<String>,
    #[validate(length(max = 32))]
    pub color: Option<String>,
    #[validate(length(max = 64))]
    pub icon: Option<String>,
    /// Replaces the whole capability set when present
    pub capabilities: Option<Vec<Capability>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CapabilitiesDto {
    #[validate(length(min = 1, message = "At least one capability is required"))]
    pub capabilities: Vec<Capability>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DuplicateRoleDto {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Localized name must be between 1 and 100 characters"
    ))]
    pub name_localized: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PermissionCheckParams {
    /// Catalog module id
    pub module: String,
    /// Action within the module
    pub action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PermissionCheckResponse {
    pub role_id: RoleId,
    pub module: String,
    pub action: String,
    pub allowed: bool,
}
