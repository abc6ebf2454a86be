//! The permission catalog: the closed universe of capabilities.
//!
//! A [`Capability`] is a `(module, action)` pair. The catalog maps every
//! module to the ordered list of actions it supports and is fixed for the
//! lifetime of the process. Role capability sets are validated against it and
//! the authorization check denies anything it does not contain.
//!
//! # Example
//!
//! ```
//! use registrar_core::catalog::{Capability, PermissionCatalog};
//!
//! let catalog = PermissionCatalog::builtin();
//! assert!(catalog.contains("students", "view"));
//! assert!(!catalog.contains("students", "fly"));
//!
//! let unknown = Capability::new("students", "fly");
//! assert!(catalog.validate([&unknown]).is_err());
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;

/// Atomic unit of authorization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct Capability {
    /// Module identifier (e.g. `students`)
    pub module: String,
    /// Action identifier within the module (e.g. `view`)
    pub action: String,
}

impl Capability {
    pub fn new(module: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            action: action.into(),
        }
    }

    pub fn matches(&self, module: &str, action: &str) -> bool {
        self.module == module && self.action == action
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.action)
    }
}

/// A catalog module with its display names and supported actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ModuleDefinition {
    /// Module identifier used in capabilities
    pub id: String,
    /// Display name
    pub name: String,
    /// Localized display name
    pub name_localized: String,
    /// Supported actions, in presentation order
    pub actions: Vec<String>,
}

/// Built-in modules: (id, name, localized name, actions).
const BUILTIN_MODULES: &[(&str, &str, &str, &[&str])] = &[
    ("dashboard", "Dashboard", "لوحة التحكم", &["view"]),
    (
        "students",
        "Students",
        "الطلاب",
        &[
            "view",
            "create",
            "edit",
            "delete",
            "export",
            "upload_documents",
            "fix_errors",
        ],
    ),
    (
        "courses",
        "Courses",
        "المقررات",
        &["view", "create", "edit", "delete"],
    ),
    (
        "registration",
        "Registration",
        "التسجيل",
        &[
            "view",
            "manage",
            "approve",
            "add_course",
            "drop_course",
            "change_section",
            "late_registration",
            "open_close_registration",
        ],
    ),
    (
        "finance",
        "Finance",
        "المالية",
        &["view", "create", "edit", "delete", "approve", "reports"],
    ),
    (
        "admissions",
        "Admissions",
        "القبول",
        &[
            "view",
            "create",
            "edit",
            "delete",
            "approve",
            "reject",
            "set_admission_year",
            "set_admission_type",
        ],
    ),
    (
        "study_plans",
        "Study Plans",
        "الخطط الدراسية",
        &[
            "view",
            "assign",
            "edit",
            "transfer_major",
            "restructure",
            "track_progress",
        ],
    ),
    (
        "exams",
        "Exams",
        "الاختبارات",
        &["view", "create", "edit", "delete", "grades"],
    ),
    (
        "attendance",
        "Attendance",
        "الحضور",
        &["view", "record", "edit", "reports"],
    ),
    (
        "schedule",
        "Schedule",
        "الجدول",
        &["view", "create", "edit", "delete"],
    ),
    (
        "reports",
        "Reports",
        "التقارير",
        &["view", "create", "export"],
    ),
    ("settings", "Settings", "الإعدادات", &["view", "edit"]),
    (
        "users",
        "Users",
        "المستخدمين",
        &["view", "create", "edit", "delete"],
    ),
    (
        "roles",
        "Roles",
        "الأدوار",
        &["view", "create", "edit", "delete"],
    ),
];

/// Ordered, read-only registry of modules and their actions.
#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    modules: Vec<ModuleDefinition>,
}

impl PermissionCatalog {
    /// Builds a catalog, rejecting empty identifiers and duplicates.
    pub fn new(modules: Vec<ModuleDefinition>) -> anyhow::Result<Self> {
        let mut seen_modules = HashSet::new();

        for module in &modules {
            if module.id.trim().is_empty() {
                bail!("catalog module id must not be empty");
            }
            if !seen_modules.insert(module.id.as_str()) {
                bail!("duplicate catalog module '{}'", module.id);
            }

            let mut seen_actions = HashSet::new();
            for action in &module.actions {
                if action.trim().is_empty() {
                    bail!("module '{}' has an empty action id", module.id);
                }
                if !seen_actions.insert(action.as_str()) {
                    bail!("duplicate action '{}' in module '{}'", action, module.id);
                }
            }
        }

        Ok(Self { modules })
    }

    /// The catalog shipped with the application.
    pub fn builtin() -> Self {
        let modules = BUILTIN_MODULES
            .iter()
            .map(|(id, name, name_localized, actions)| ModuleDefinition {
                id: id.to_string(),
                name: name.to_string(),
                name_localized: name_localized.to_string(),
                actions: actions.iter().map(|a| a.to_string()).collect(),
            })
            .collect();

        Self { modules }
    }

    /// Loads a catalog from a JSON array of [`ModuleDefinition`]s.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read permission catalog {}", path.display()))?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let modules: Vec<ModuleDefinition> =
            serde_json::from_str(raw).context("invalid permission catalog JSON")?;
        Self::new(modules)
    }

    /// Module ids in catalog order.
    pub fn modules(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn module_definitions(&self) -> &[ModuleDefinition] {
        &self.modules
    }

    pub fn module(&self, module: &str) -> Option<&ModuleDefinition> {
        self.modules.iter().find(|m| m.id == module)
    }

    /// Actions of `module` in catalog order.
    pub fn actions_of(&self, module: &str) -> Result<&[String], AppError> {
        self.module(module)
            .map(|m| m.actions.as_slice())
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Module '{}' not found", module)))
    }

    pub fn contains(&self, module: &str, action: &str) -> bool {
        self.module(module)
            .is_some_and(|m| m.actions.iter().any(|a| a == action))
    }

    pub fn contains_capability(&self, capability: &Capability) -> bool {
        self.contains(&capability.module, &capability.action)
    }

    /// Every capability, module by module in catalog order.
    pub fn capabilities(&self) -> Vec<Capability> {
        self.modules
            .iter()
            .flat_map(|m| {
                m.actions
                    .iter()
                    .map(move |a| Capability::new(m.id.clone(), a.clone()))
            })
            .collect()
    }

    /// Fails on the first capability the catalog does not define.
    pub fn validate<'a, I>(&self, capabilities: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = &'a Capability>,
    {
        match capabilities
            .into_iter()
            .find(|c| !self.contains_capability(c))
        {
            Some(unknown) => Err(AppError::validation(
                "capabilities",
                anyhow::anyhow!("Unknown capability '{}'", unknown),
            )),
            None => Ok(()),
        }
    }
}

impl Default for PermissionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: &str, actions: &[&str]) -> ModuleDefinition {
        ModuleDefinition {
            id: id.to_string(),
            name: id.to_string(),
            name_localized: id.to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn test_builtin_module_order() {
        let catalog = PermissionCatalog::builtin();
        let modules = catalog.modules();
        assert_eq!(modules.len(), 14);
        assert_eq!(modules[0], "dashboard");
        assert_eq!(modules[1], "students");
        assert_eq!(modules[13], "roles");
    }

    #[test]
    fn test_builtin_is_well_formed() {
        let builtin = PermissionCatalog::builtin();
        assert!(PermissionCatalog::new(builtin.module_definitions().to_vec()).is_ok());
    }

    #[test]
    fn test_actions_of() {
        let catalog = PermissionCatalog::builtin();
        let actions = catalog.actions_of("settings").unwrap();
        assert_eq!(actions, ["view".to_string(), "edit".to_string()]);
    }

    #[test]
    fn test_actions_of_unknown_module() {
        let catalog = PermissionCatalog::builtin();
        let err = catalog.actions_of("grading").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_contains() {
        let catalog = PermissionCatalog::builtin();
        assert!(catalog.contains("registration", "late_registration"));
        assert!(!catalog.contains("registration", "delete"));
        assert!(!catalog.contains("unknown", "view"));
    }

    #[test]
    fn test_capabilities_follow_catalog_order() {
        let catalog = PermissionCatalog::new(vec![
            module("b", &["x", "y"]),
            module("a", &["z"]),
        ])
        .unwrap();
        let caps = catalog.capabilities();
        assert_eq!(
            caps,
            vec![
                Capability::new("b", "x"),
                Capability::new("b", "y"),
                Capability::new("a", "z"),
            ]
        );
    }

    #[test]
    fn test_validate_reports_unknown_capability() {
        let catalog = PermissionCatalog::builtin();
        let caps = vec![
            Capability::new("students", "view"),
            Capability::new("students", "teleport"),
        ];
        let err = catalog.validate(&caps).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.field.as_deref(), Some("capabilities"));
        assert!(err.error.to_string().contains("students.teleport"));
    }

    #[test]
    fn test_validate_accepts_known_capabilities() {
        let catalog = PermissionCatalog::builtin();
        let caps = [Capability::new("roles", "delete")];
        assert!(catalog.validate(&caps).is_ok());
    }

    #[test]
    fn test_new_rejects_duplicate_module() {
        let result = PermissionCatalog::new(vec![module("a", &["x"]), module("a", &["y"])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_duplicate_action() {
        let result = PermissionCatalog::new(vec![module("a", &["x", "x"])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_str() {
        let catalog = PermissionCatalog::from_json_str(
            r#"[{"id": "grades", "name": "Grades", "name_localized": "الدرجات", "actions": ["view", "publish"]}]"#,
        )
        .unwrap();
        assert_eq!(catalog.modules(), vec!["grades"]);
        assert!(catalog.contains("grades", "publish"));
    }

    #[test]
    fn test_capability_display() {
        assert_eq!(
            Capability::new("students", "view").to_string(),
            "students.view"
        );
    }
}
