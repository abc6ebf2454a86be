//! Persistence seam for roles and semesters.
//!
//! Services talk to storage only through the traits below, so the
//! application runs unchanged on the in-memory backend ([`memory`]) or on
//! PostgreSQL ([`postgres`]).
//!
//! Repositories enforce per-record atomicity: partial updates run their
//! read-modify-write inside the backend, and multi-record changes
//! (`set_current`) happen as one unit. Validation lives in the services and
//! reaches the backend as an edit closure.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use registrar_core::{AppError, Capability};
use registrar_models::{Role, RoleId, Semester, SemesterFilterParams, SemesterId};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryRoleRepository, InMemorySemesterRepository, InMemoryUserCounts};
pub use postgres::{PgRoleRepository, PgSemesterRepository, PgUserCounts};

/// In-place change to a stored role; an error aborts the update.
pub type RoleEdit<'a> = &'a (dyn Fn(&mut Role) -> Result<(), AppError> + Send + Sync);

/// In-place change to a stored semester; an error aborts the update.
pub type SemesterEdit<'a> = &'a (dyn Fn(&mut Semester) -> Result<(), AppError> + Send + Sync);

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Every stored role, in no particular order.
    async fn list(&self) -> Result<Vec<Role>, AppError>;

    async fn find(&self, id: RoleId) -> Result<Option<Role>, AppError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError>;

    async fn insert(&self, role: &Role) -> Result<(), AppError>;

    /// Applies `edit` to the stored role while holding it exclusively and
    /// persists the display fields and capability set.
    ///
    /// `is_system` and `is_super_admin` are never written. An error from
    /// `edit` leaves the role unchanged. Fails with not found when the role
    /// is absent.
    async fn update(&self, id: RoleId, edit: RoleEdit<'_>) -> Result<Role, AppError>;

    /// Adds capabilities to the stored set in one step.
    async fn grant(&self, id: RoleId, capabilities: &[Capability]) -> Result<Role, AppError>;

    /// Removes capabilities from the stored set; absent ones are ignored.
    async fn revoke(&self, id: RoleId, capabilities: &[Capability]) -> Result<Role, AppError>;

    async fn delete(&self, id: RoleId) -> Result<(), AppError>;
}

#[async_trait]
pub trait SemesterRepository: Send + Sync {
    /// Semesters matching `filter`, newest `start_date` first.
    async fn list(&self, filter: &SemesterFilterParams) -> Result<Vec<Semester>, AppError>;

    async fn find(&self, id: SemesterId) -> Result<Option<Semester>, AppError>;

    async fn find_current(&self) -> Result<Option<Semester>, AppError>;

    async fn insert(&self, semester: &Semester) -> Result<(), AppError>;

    /// Applies `edit` to the stored semester while holding it exclusively
    /// and persists the editable fields. Lifecycle flags are left untouched.
    async fn update(&self, id: SemesterId, edit: SemesterEdit<'_>) -> Result<Semester, AppError>;

    async fn delete(&self, id: SemesterId) -> Result<(), AppError>;

    /// Makes `id` the only current semester as one atomic unit.
    ///
    /// When `id` is absent nothing changes and not found is returned.
    async fn set_current(&self, id: SemesterId) -> Result<Semester, AppError>;

    async fn set_closed(&self, id: SemesterId, closed: bool) -> Result<Semester, AppError>;

    /// Replaces the registration window and clears `is_closed`.
    async fn open_registration(
        &self,
        id: SemesterId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Semester, AppError>;

    /// Moves `registration_end` to `end`.
    async fn close_registration(
        &self,
        id: SemesterId,
        end: NaiveDate,
    ) -> Result<Semester, AppError>;
}

/// Read-only view of role membership, owned by the user directory.
#[async_trait]
pub trait UserCountSource: Send + Sync {
    async fn users_count(&self, role: RoleId) -> Result<i64, AppError>;

    /// Member counts of every role that has at least one user.
    async fn all_counts(&self) -> Result<HashMap<RoleId, i64>, AppError>;
}

pub(crate) fn role_not_found(id: RoleId) -> AppError {
    AppError::not_found(anyhow::anyhow!("Role {} not found", id))
}

pub(crate) fn semester_not_found(id: SemesterId) -> AppError {
    AppError::not_found(anyhow::anyhow!("Semester {} not found", id))
}
