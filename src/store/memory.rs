//! In-memory storage backend.
//!
//! Each collection sits behind one `RwLock`; every mutation, including the
//! whole read-clear-set of `set_current`, runs under a single write guard.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use registrar_core::{AppError, Capability};
use registrar_models::{Role, RoleId, Semester, SemesterFilterParams, SemesterId};

use super::{
    RoleEdit, RoleRepository, SemesterEdit, SemesterRepository, UserCountSource, role_not_found,
    semester_not_found,
};

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, AppError> {
    lock.read()
        .map_err(|_| AppError::internal(anyhow::anyhow!("storage lock poisoned")))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, AppError> {
    lock.write()
        .map_err(|_| AppError::internal(anyhow::anyhow!("storage lock poisoned")))
}

#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<HashMap<RoleId, Role>>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn list(&self) -> Result<Vec<Role>, AppError> {
        Ok(read(&self.roles)?.values().cloned().collect())
    }

    async fn find(&self, id: RoleId) -> Result<Option<Role>, AppError> {
        Ok(read(&self.roles)?.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        Ok(read(&self.roles)?
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn insert(&self, role: &Role) -> Result<(), AppError> {
        let mut roles = write(&self.roles)?;
        if roles.contains_key(&role.id) {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Role {} already exists",
                role.id
            )));
        }
        roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn update(&self, id: RoleId, edit: RoleEdit<'_>) -> Result<Role, AppError> {
        let mut roles = write(&self.roles)?;
        let stored = roles.get_mut(&id).ok_or_else(|| role_not_found(id))?;

        let mut edited = stored.clone();
        edit(&mut edited)?;

        stored.name = edited.name;
        stored.name_localized = edited.name_localized;
        stored.description = edited.description;
        stored.description_localized = edited.description_localized;
        stored.color = edited.color;
        stored.icon = edited.icon;
        stored.capabilities = edited.capabilities;
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn grant(&self, id: RoleId, capabilities: &[Capability]) -> Result<Role, AppError> {
        let mut roles = write(&self.roles)?;
        let stored = roles.get_mut(&id).ok_or_else(|| role_not_found(id))?;
        stored.capabilities.extend(capabilities.iter().cloned());
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn revoke(&self, id: RoleId, capabilities: &[Capability]) -> Result<Role, AppError> {
        let mut roles = write(&self.roles)?;
        let stored = roles.get_mut(&id).ok_or_else(|| role_not_found(id))?;
        for capability in capabilities {
            stored.capabilities.remove(capability);
        }
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete(&self, id: RoleId) -> Result<(), AppError> {
        write(&self.roles)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| role_not_found(id))
    }
}

#[derive(Debug, Default)]
pub struct InMemorySemesterRepository {
    semesters: RwLock<HashMap<SemesterId, Semester>>,
}

impl InMemorySemesterRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply<F>(&self, id: SemesterId, change: F) -> Result<Semester, AppError>
    where
        F: FnOnce(&mut Semester),
    {
        let mut semesters = write(&self.semesters)?;
        let stored = semesters
            .get_mut(&id)
            .ok_or_else(|| semester_not_found(id))?;
        change(stored);
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}

#[async_trait]
impl SemesterRepository for InMemorySemesterRepository {
    async fn list(&self, filter: &SemesterFilterParams) -> Result<Vec<Semester>, AppError> {
        let mut semesters: Vec<Semester> = read(&self.semesters)?
            .values()
            .filter(|s| filter.is_current.is_none_or(|current| s.is_current == current))
            .filter(|s| {
                filter
                    .academic_year
                    .as_deref()
                    .is_none_or(|year| s.academic_year == year)
            })
            .cloned()
            .collect();

        semesters.sort_by(|a, b| {
            b.start_date
                .cmp(&a.start_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(semesters)
    }

    async fn find(&self, id: SemesterId) -> Result<Option<Semester>, AppError> {
        Ok(read(&self.semesters)?.get(&id).cloned())
    }

    async fn find_current(&self) -> Result<Option<Semester>, AppError> {
        Ok(read(&self.semesters)?
            .values()
            .find(|s| s.is_current)
            .cloned())
    }

    async fn insert(&self, semester: &Semester) -> Result<(), AppError> {
        let mut semesters = write(&self.semesters)?;
        if semesters.contains_key(&semester.id) {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Semester {} already exists",
                semester.id
            )));
        }
        semesters.insert(semester.id, semester.clone());
        Ok(())
    }

    async fn update(&self, id: SemesterId, edit: SemesterEdit<'_>) -> Result<Semester, AppError> {
        let mut semesters = write(&self.semesters)?;
        let stored = semesters
            .get_mut(&id)
            .ok_or_else(|| semester_not_found(id))?;

        let mut edited = stored.clone();
        edit(&mut edited)?;

        stored.name = edited.name;
        stored.name_localized = edited.name_localized;
        stored.academic_year = edited.academic_year;
        stored.semester_type = edited.semester_type;
        stored.start_date = edited.start_date;
        stored.end_date = edited.end_date;
        stored.registration_start = edited.registration_start;
        stored.registration_end = edited.registration_end;
        stored.add_drop_start = edited.add_drop_start;
        stored.add_drop_end = edited.add_drop_end;
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn delete(&self, id: SemesterId) -> Result<(), AppError> {
        write(&self.semesters)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| semester_not_found(id))
    }

    async fn set_current(&self, id: SemesterId) -> Result<Semester, AppError> {
        let mut semesters = write(&self.semesters)?;
        if !semesters.contains_key(&id) {
            return Err(semester_not_found(id));
        }

        let now = Utc::now();
        for semester in semesters.values_mut() {
            let target = semester.id == id;
            if semester.is_current != target {
                semester.is_current = target;
                semester.updated_at = now;
            }
        }

        semesters
            .get(&id)
            .cloned()
            .ok_or_else(|| semester_not_found(id))
    }

    async fn set_closed(&self, id: SemesterId, closed: bool) -> Result<Semester, AppError> {
        self.apply(id, |stored| stored.is_closed = closed)
    }

    async fn open_registration(
        &self,
        id: SemesterId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Semester, AppError> {
        self.apply(id, |stored| {
            stored.registration_start = start;
            stored.registration_end = end;
            stored.is_closed = false;
        })
    }

    async fn close_registration(
        &self,
        id: SemesterId,
        end: NaiveDate,
    ) -> Result<Semester, AppError> {
        self.apply(id, |stored| stored.registration_end = end)
    }
}

/// Fixed role membership counts, for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryUserCounts {
    counts: RwLock<HashMap<RoleId, i64>>,
}

impl InMemoryUserCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, role: RoleId, count: i64) -> Result<(), AppError> {
        write(&self.counts)?.insert(role, count);
        Ok(())
    }
}

#[async_trait]
impl UserCountSource for InMemoryUserCounts {
    async fn users_count(&self, role: RoleId) -> Result<i64, AppError> {
        Ok(read(&self.counts)?.get(&role).copied().unwrap_or(0))
    }

    async fn all_counts(&self) -> Result<HashMap<RoleId, i64>, AppError> {
        Ok(read(&self.counts)?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registrar_models::SemesterType;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn semester(name: &str, year: &str, start: NaiveDate) -> Semester {
        let now = Utc::now();
        Semester {
            id: SemesterId::new(),
            name: name.to_string(),
            name_localized: name.to_string(),
            academic_year: year.to_string(),
            semester_type: Some(SemesterType::Fall),
            start_date: start,
            end_date: start + chrono::Duration::days(100),
            registration_start: start - chrono::Duration::days(30),
            registration_end: start,
            add_drop_start: None,
            add_drop_end: None,
            is_current: false,
            is_closed: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_orders_by_start_date_desc() {
        let repo = InMemorySemesterRepository::new();
        let older = semester("Fall 2024", "2024-2025", date(2024, 9, 1));
        let newer = semester("Fall 2025", "2025-2026", date(2025, 9, 1));
        repo.insert(&older).await.unwrap();
        repo.insert(&newer).await.unwrap();

        let all = repo.list(&SemesterFilterParams::default()).await.unwrap();
        assert_eq!(all[0].id, newer.id);
        assert_eq!(all[1].id, older.id);
    }

    #[tokio::test]
    async fn test_list_filters_by_academic_year() {
        let repo = InMemorySemesterRepository::new();
        repo.insert(&semester("Fall 2024", "2024-2025", date(2024, 9, 1)))
            .await
            .unwrap();
        let target = semester("Fall 2025", "2025-2026", date(2025, 9, 1));
        repo.insert(&target).await.unwrap();

        let filter = SemesterFilterParams {
            academic_year: Some("2025-2026".to_string()),
            ..SemesterFilterParams::default()
        };
        let found = repo.list(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, target.id);
    }

    #[tokio::test]
    async fn test_update_leaves_lifecycle_flags() {
        let repo = InMemorySemesterRepository::new();
        let stored = semester("Fall 2025", "2025-2026", date(2025, 9, 1));
        repo.insert(&stored).await.unwrap();
        repo.set_current(stored.id).await.unwrap();

        let saved = repo
            .update(stored.id, &|s: &mut Semester| {
                s.name = "Autumn 2025".to_string();
                s.is_current = false;
                s.is_closed = true;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(saved.name, "Autumn 2025");
        assert!(saved.is_current);
        assert!(!saved.is_closed);
    }

    #[tokio::test]
    async fn test_failed_edit_leaves_semester_unchanged() {
        let repo = InMemorySemesterRepository::new();
        let stored = semester("Fall 2025", "2025-2026", date(2025, 9, 1));
        repo.insert(&stored).await.unwrap();

        let err = repo
            .update(stored.id, &|s: &mut Semester| {
                s.name = "Broken".to_string();
                Err(AppError::validation("name", anyhow::anyhow!("rejected")))
            })
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(repo.find(stored.id).await.unwrap().unwrap().name, "Fall 2025");
    }

    #[tokio::test]
    async fn test_role_update_edits_latest_capabilities() {
        let repo = InMemoryRoleRepository::new();
        let now = Utc::now();
        let role = Role {
            id: RoleId::new(),
            name: "auditor".to_string(),
            name_localized: "auditor".to_string(),
            description: None,
            description_localized: None,
            color: None,
            icon: None,
            is_system: false,
            is_super_admin: false,
            capabilities: [Capability::new("finance", "view")].into_iter().collect(),
            created_at: now,
            updated_at: now,
        };
        repo.insert(&role).await.unwrap();
        repo.grant(role.id, &[Capability::new("finance", "approve")])
            .await
            .unwrap();

        let updated = repo
            .update(role.id, &|r: &mut Role| {
                r.name = "controller".to_string();
                r.is_super_admin = true;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(updated.name, "controller");
        assert!(!updated.is_super_admin);
        assert!(updated.has_capability("finance", "view"));
        assert!(updated.has_capability("finance", "approve"));
    }

    #[tokio::test]
    async fn test_set_current_unknown_changes_nothing() {
        let repo = InMemorySemesterRepository::new();
        let stored = semester("Fall 2025", "2025-2026", date(2025, 9, 1));
        repo.insert(&stored).await.unwrap();
        repo.set_current(stored.id).await.unwrap();

        let err = repo.set_current(SemesterId::new()).await.unwrap_err();
        assert!(err.is_not_found());
        let current = repo.find_current().await.unwrap().unwrap();
        assert_eq!(current.id, stored.id);
    }

    #[tokio::test]
    async fn test_role_delete_missing() {
        let repo = InMemoryRoleRepository::new();
        let err = repo.delete(RoleId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_user_counts_default_zero() {
        let counts = InMemoryUserCounts::new();
        let role = RoleId::new();
        assert_eq!(counts.users_count(role).await.unwrap(), 0);
        counts.set(role, 4).unwrap();
        assert_eq!(counts.users_count(role).await.unwrap(), 4);
        assert_eq!(counts.all_counts().await.unwrap().get(&role), Some(&4));
    }
}
