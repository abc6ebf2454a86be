use utoipa::OpenApi;

use registrar_core::{Capability, ErrorResponse, ModuleDefinition};
use registrar_models::{
    CapabilitiesDto, CreateRoleDto, CreateSemesterDto, DuplicateRoleDto, PermissionCheckParams,
    PermissionCheckResponse, Role, RoleWithStats, Semester, SemesterFilterParams, SemesterStatus,
    SemesterType, SemesterWithStatus, UpdateRoleDto, UpdateSemesterDto,
};

use crate::modules::permissions::controller::ModuleActionsResponse;
use crate::router::HealthResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::router::health,
        crate::modules::permissions::controller::get_capabilities,
        crate::modules::permissions::controller::get_modules,
        crate::modules::permissions::controller::get_module_actions,
        crate::modules::authorization::controller::check_permission,
        crate::modules::roles::controller::get_roles,
        crate::modules::roles::controller::get_role_by_id,
        crate::modules::roles::controller::create_role,
        crate::modules::roles::controller::update_role,
        crate::modules::roles::controller::delete_role,
        crate::modules::roles::controller::grant_capabilities,
        crate::modules::roles::controller::revoke_capabilities,
        crate::modules::roles::controller::duplicate_role,
        crate::modules::semesters::controller::get_semesters,
        crate::modules::semesters::controller::get_current_semester,
        crate::modules::semesters::controller::get_semester_by_id,
        crate::modules::semesters::controller::create_semester,
        crate::modules::semesters::controller::update_semester,
        crate::modules::semesters::controller::delete_semester,
        crate::modules::semesters::controller::set_current_semester,
        crate::modules::semesters::controller::close_semester,
        crate::modules::semesters::controller::reopen_semester,
        crate::modules::semesters::controller::open_registration,
        crate::modules::semesters::controller::close_registration,
    ),
    components(
        schemas(
            Capability,
            ModuleDefinition,
            ModuleActionsResponse,
            ErrorResponse,
            HealthResponse,
            Role,
            RoleWithStats,
            CreateRoleDto,
            UpdateRoleDto,
            CapabilitiesDto,
            DuplicateRoleDto,
            PermissionCheckParams,
            PermissionCheckResponse,
            Semester,
            SemesterType,
            SemesterStatus,
            SemesterWithStatus,
            CreateSemesterDto,
            UpdateSemesterDto,
            SemesterFilterParams,
        )
    ),
    tags(
        (name = "Permissions", description = "Permission catalog"),
        (name = "Authorization", description = "Capability checks"),
        (name = "Roles", description = "Role management"),
        (name = "Semesters", description = "Semester management and lifecycle transitions"),
        (name = "System", description = "Service health")
    ),
    info(
        title = "Registrar API",
        version = "0.1.0",
        description = "Roles, permission catalog and semester lifecycle for a university registrar.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_transitions() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/semesters/{id}/set-current"));
        assert!(doc.paths.paths.contains_key("/api/roles/{id}/can"));
        assert!(doc.paths.paths.contains_key("/api/permissions/modules/{module}/actions"));
    }
}
