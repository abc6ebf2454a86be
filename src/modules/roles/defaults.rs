//! Roles inserted by `seed_default_roles`.

/// A seeded role: display data plus its initial capability pairs.
pub struct DefaultRole {
    pub name: &'static str,
    pub name_localized: &'static str,
    pub description: &'static str,
    pub description_localized: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub is_system: bool,
    pub is_super_admin: bool,
    pub capabilities: &'static [(&'static str, &'static [&'static str])],
}

const STUDENT_AFFAIRS_CAPABILITIES: &[(&str, &[&str])] = &[
    (
        "students",
        &["view", "create", "edit", "upload_documents", "fix_errors"],
    ),
    (
        "admissions",
        &[
            "view",
            "create",
            "edit",
            "approve",
            "reject",
            "set_admission_year",
            "set_admission_type",
        ],
    ),
    (
        "registration",
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
        "study_plans",
        &[
            "view",
            "assign",
            "edit",
            "transfer_major",
            "restructure",
            "track_progress",
        ],
    ),
    ("dashboard", &["view"]),
    ("reports", &["view", "export"]),
];

pub const DEFAULT_ROLES: &[DefaultRole] = &[
    DefaultRole {
        name: "admin",
        name_localized: "مدير النظام",
        description: "Full system access",
        description_localized: "صلاحيات كاملة للنظام",
        color: "#8B5CF6",
        icon: "Shield",
        is_system: true,
        is_super_admin: true,
        capabilities: &[],
    },
    DefaultRole {
        name: "student",
        name_localized: "طالب",
        description: "Student access",
        description_localized: "صلاحيات الطالب",
        color: "#3B82F6",
        icon: "GraduationCap",
        is_system: true,
        is_super_admin: false,
        capabilities: &[],
    },
    DefaultRole {
        name: "lecturer",
        name_localized: "محاضر",
        description: "Lecturer/Faculty access",
        description_localized: "صلاحيات المحاضر",
        color: "#10B981",
        icon: "BookOpen",
        is_system: true,
        is_super_admin: false,
        capabilities: &[],
    },
    DefaultRole {
        name: "finance",
        name_localized: "المالية",
        description: "Finance department access",
        description_localized: "صلاحيات القسم المالي",
        color: "#F59E0B",
        icon: "DollarSign",
        is_system: true,
        is_super_admin: false,
        capabilities: &[],
    },
    DefaultRole {
        name: "student_affairs",
        name_localized: "شؤون الطلاب",
        description: "Student affairs - Manage student records, admissions, registration, and study plans",
        description_localized: "شؤون الطلاب - إدارة ملفات الطلاب، القبول، التسجيل، والخطط الدراسية",
        color: "#EC4899",
        icon: "Users",
        is_system: true,
        is_super_admin: false,
        capabilities: STUDENT_AFFAIRS_CAPABILITIES,
    },
    DefaultRole {
        name: "accountant",
        name_localized: "محاسب",
        description: "Accountant access",
        description_localized: "صلاحيات المحاسب",
        color: "#14B8A6",
        icon: "Calculator",
        is_system: false,
        is_super_admin: false,
        capabilities: &[],
    },
    DefaultRole {
        name: "registrar",
        name_localized: "مسجل",
        description: "Registrar access",
        description_localized: "صلاحيات المسجل",
        color: "#6366F1",
        icon: "ClipboardList",
        is_system: false,
        is_super_admin: false,
        capabilities: &[],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use registrar_core::PermissionCatalog;

    #[test]
    fn test_only_admin_is_super() {
        let supers: Vec<_> = DEFAULT_ROLES.iter().filter(|r| r.is_super_admin).collect();
        assert_eq!(supers.len(), 1);
        assert_eq!(supers[0].name, "admin");
        assert!(supers[0].is_system);
    }

    #[test]
    fn test_default_capabilities_in_builtin_catalog() {
        let catalog = PermissionCatalog::builtin();
        for role in DEFAULT_ROLES {
            for (module, actions) in role.capabilities {
                for action in *actions {
                    assert!(
                        catalog.contains(module, action),
                        "{} holds unknown {}.{}",
                        role.name,
                        module,
                        action
                    );
                }
            }
        }
    }
}
