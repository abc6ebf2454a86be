//! PostgreSQL storage backend.
//!
//! Roles live in `roles` with their capability pairs in `role_capabilities`.
//! Semester flags are guarded by a partial unique index on `is_current`;
//! `set_current` serializes on a transaction-scoped advisory lock.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use registrar_core::{AppError, Capability};
use registrar_models::{Role, RoleId, Semester, SemesterFilterParams, SemesterId, SemesterType};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};

use super::{
    RoleEdit, RoleRepository, SemesterEdit, SemesterRepository, UserCountSource, role_not_found,
    semester_not_found,
};

/// Advisory lock key taken by every `set_current` transaction.
const SET_CURRENT_LOCK_KEY: i64 = 0x7265_6769_7374_7261;

const ROLE_COLUMNS: &str = "id, name, name_localized, description, description_localized, \
    color, icon, is_system, is_super_admin, created_at, updated_at";

const SEMESTER_COLUMNS: &str = "id, name, name_localized, academic_year, semester_type, \
    start_date, end_date, registration_start, registration_end, add_drop_start, add_drop_end, \
    is_current, is_closed, created_at, updated_at";

#[derive(Debug, FromRow)]
struct RoleRow {
    id: RoleId,
    name: String,
    name_localized: String,
    description: Option<String>,
    description_localized: Option<String>,
    color: Option<String>,
    icon: Option<String>,
    is_system: bool,
    is_super_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self, capabilities: BTreeSet<Capability>) -> Role {
        Role {
            id: self.id,
            name: self.name,
            name_localized: self.name_localized,
            description: self.description,
            description_localized: self.description_localized,
            color: self.color,
            icon: self.icon,
            is_system: self.is_system,
            is_super_admin: self.is_super_admin,
            capabilities,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CapabilityRow {
    role_id: RoleId,
    module: String,
    action: String,
}

#[derive(Debug, FromRow)]
struct SemesterRow {
    id: SemesterId,
    name: String,
    name_localized: String,
    academic_year: String,
    semester_type: Option<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    registration_start: NaiveDate,
    registration_end: NaiveDate,
    add_drop_start: Option<NaiveDate>,
    add_drop_end: Option<NaiveDate>,
    is_current: bool,
    is_closed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SemesterRow> for Semester {
    type Error = AppError;

    fn try_from(row: SemesterRow) -> Result<Self, Self::Error> {
        let semester_type = row
            .semester_type
            .as_deref()
            .map(str::parse::<SemesterType>)
            .transpose()
            .map_err(|e| AppError::internal(anyhow::anyhow!(e)))?;

        Ok(Semester {
            id: row.id,
            name: row.name,
            name_localized: row.name_localized,
            academic_year: row.academic_year,
            semester_type,
            start_date: row.start_date,
            end_date: row.end_date,
            registration_start: row.registration_start,
            registration_end: row.registration_end,
            add_drop_start: row.add_drop_start,
            add_drop_end: row.add_drop_end,
            is_current: row.is_current,
            is_closed: row.is_closed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_capabilities(
        &self,
        ids: &[RoleId],
    ) -> Result<HashMap<RoleId, BTreeSet<Capability>>, AppError> {
        let rows = sqlx::query_as::<_, CapabilityRow>(
            "SELECT role_id, module, action FROM role_capabilities WHERE role_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_role: HashMap<RoleId, BTreeSet<Capability>> = HashMap::new();
        for row in rows {
            by_role
                .entry(row.role_id)
                .or_default()
                .insert(Capability::new(row.module, row.action));
        }
        Ok(by_role)
    }

    async fn hydrate(&self, rows: Vec<RoleRow>) -> Result<Vec<Role>, AppError> {
        let ids: Vec<RoleId> = rows.iter().map(|r| r.id).collect();
        let mut capabilities = self.load_capabilities(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let caps = capabilities.remove(&row.id).unwrap_or_default();
                row.into_role(caps)
            })
            .collect())
    }

    async fn fetch_one(&self, id: RoleId) -> Result<Role, AppError> {
        self.find(id).await?.ok_or_else(|| role_not_found(id))
    }

    async fn insert_capabilities(
        tx: &mut Transaction<'_, Postgres>,
        id: RoleId,
        capabilities: &[Capability],
    ) -> Result<(), AppError> {
        if capabilities.is_empty() {
            return Ok(());
        }

        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO role_capabilities (role_id, module, action) ");
        builder.push_values(capabilities, |mut row, capability| {
            row.push_bind(id)
                .push_bind(&capability.module)
                .push_bind(&capability.action);
        });
        builder.push(" ON CONFLICT DO NOTHING");
        builder.build().execute(&mut **tx).await?;
        Ok(())
    }

    async fn lock_role(tx: &mut Transaction<'_, Postgres>, id: RoleId) -> Result<(), AppError> {
        sqlx::query_scalar::<_, RoleId>("SELECT id FROM roles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .map(|_| ())
            .ok_or_else(|| role_not_found(id))
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn list(&self) -> Result<Vec<Role>, AppError> {
        let rows = sqlx::query_as::<_, RoleRow>(&format!("SELECT {} FROM roles", ROLE_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    async fn find(&self, id: RoleId) -> Result<Option<Role>, AppError> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {} FROM roles WHERE id = $1",
            ROLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {} FROM roles WHERE name = $1 ORDER BY created_at LIMIT 1",
            ROLE_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn insert(&self, role: &Role) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO roles (id, name, name_localized, description, description_localized,
                                  color, icon, is_system, is_super_admin, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
        )
        .bind(role.id)
        .bind(&role.name)
        .bind(&role.name_localized)
        .bind(&role.description)
        .bind(&role.description_localized)
        .bind(&role.color)
        .bind(&role.icon)
        .bind(role.is_system)
        .bind(role.is_super_admin)
        .bind(role.created_at)
        .bind(role.updated_at)
        .execute(&mut *tx)
        .await?;

        let capabilities: Vec<Capability> = role.capabilities.iter().cloned().collect();
        Self::insert_capabilities(&mut tx, role.id, &capabilities).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, id: RoleId, edit: RoleEdit<'_>) -> Result<Role, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RoleRow>(&format!(
            "SELECT {} FROM roles WHERE id = $1 FOR UPDATE",
            ROLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| role_not_found(id))?;

        let capabilities: BTreeSet<Capability> = sqlx::query_as::<_, CapabilityRow>(
            "SELECT role_id, module, action FROM role_capabilities WHERE role_id = $1",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|row| Capability::new(row.module, row.action))
        .collect();

        let stored = row.into_role(capabilities);
        let mut edited = stored.clone();
        edit(&mut edited)?;

        let updated_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"UPDATE roles
               SET name = $2, name_localized = $3, description = $4, description_localized = $5,
                   color = $6, icon = $7, updated_at = NOW()
               WHERE id = $1
               RETURNING updated_at"#,
        )
        .bind(id)
        .bind(&edited.name)
        .bind(&edited.name_localized)
        .bind(&edited.description)
        .bind(&edited.description_localized)
        .bind(&edited.color)
        .bind(&edited.icon)
        .fetch_one(&mut *tx)
        .await?;

        if edited.capabilities != stored.capabilities {
            sqlx::query("DELETE FROM role_capabilities WHERE role_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            let capabilities: Vec<Capability> = edited.capabilities.iter().cloned().collect();
            Self::insert_capabilities(&mut tx, id, &capabilities).await?;
        }

        tx.commit().await?;

        Ok(Role {
            id: stored.id,
            is_system: stored.is_system,
            is_super_admin: stored.is_super_admin,
            created_at: stored.created_at,
            updated_at,
            ..edited
        })
    }

    async fn grant(&self, id: RoleId, capabilities: &[Capability]) -> Result<Role, AppError> {
        let mut tx = self.pool.begin().await?;
        Self::lock_role(&mut tx, id).await?;
        Self::insert_capabilities(&mut tx, id, capabilities).await?;
        sqlx::query("UPDATE roles SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.fetch_one(id).await
    }

    async fn revoke(&self, id: RoleId, capabilities: &[Capability]) -> Result<Role, AppError> {
        let mut tx = self.pool.begin().await?;
        Self::lock_role(&mut tx, id).await?;

        for capability in capabilities {
            sqlx::query(
                "DELETE FROM role_capabilities WHERE role_id = $1 AND module = $2 AND action = $3",
            )
            .bind(id)
            .bind(&capability.module)
            .bind(&capability.action)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE roles SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.fetch_one(id).await
    }

    async fn delete(&self, id: RoleId) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(role_not_found(id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PgSemesterRepository {
    pool: PgPool,
}

impl PgSemesterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_optional(&self, query: &str, id: SemesterId) -> Result<Option<Semester>, AppError> {
        sqlx::query_as::<_, SemesterRow>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Semester::try_from)
            .transpose()
    }
}

#[async_trait]
impl SemesterRepository for PgSemesterRepository {
    async fn list(&self, filter: &SemesterFilterParams) -> Result<Vec<Semester>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM semesters WHERE TRUE",
            SEMESTER_COLUMNS
        ));

        if let Some(is_current) = filter.is_current {
            builder.push(" AND is_current = ").push_bind(is_current);
        }
        if let Some(year) = &filter.academic_year {
            builder.push(" AND academic_year = ").push_bind(year.clone());
        }
        builder.push(" ORDER BY start_date DESC, created_at DESC");

        builder
            .build_query_as::<SemesterRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Semester::try_from)
            .collect()
    }

    async fn find(&self, id: SemesterId) -> Result<Option<Semester>, AppError> {
        self.fetch_optional(
            &format!("SELECT {} FROM semesters WHERE id = $1", SEMESTER_COLUMNS),
            id,
        )
        .await
    }

    async fn find_current(&self) -> Result<Option<Semester>, AppError> {
        sqlx::query_as::<_, SemesterRow>(&format!(
            "SELECT {} FROM semesters WHERE is_current",
            SEMESTER_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?
        .map(Semester::try_from)
        .transpose()
    }

    async fn insert(&self, semester: &Semester) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO semesters (id, name, name_localized, academic_year, semester_type,
                                      start_date, end_date, registration_start, registration_end,
                                      add_drop_start, add_drop_end, is_current, is_closed,
                                      created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"#,
        )
        .bind(semester.id)
        .bind(&semester.name)
        .bind(&semester.name_localized)
        .bind(&semester.academic_year)
        .bind(semester.semester_type.map(|t| t.as_str()))
        .bind(semester.start_date)
        .bind(semester.end_date)
        .bind(semester.registration_start)
        .bind(semester.registration_end)
        .bind(semester.add_drop_start)
        .bind(semester.add_drop_end)
        .bind(semester.is_current)
        .bind(semester.is_closed)
        .bind(semester.created_at)
        .bind(semester.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, id: SemesterId, edit: SemesterEdit<'_>) -> Result<Semester, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut semester = sqlx::query_as::<_, SemesterRow>(&format!(
            "SELECT {} FROM semesters WHERE id = $1 FOR UPDATE",
            SEMESTER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| semester_not_found(id))
        .and_then(Semester::try_from)?;

        edit(&mut semester)?;

        let row = sqlx::query_as::<_, SemesterRow>(&format!(
            r#"UPDATE semesters
               SET name = $2, name_localized = $3, academic_year = $4, semester_type = $5,
                   start_date = $6, end_date = $7, registration_start = $8,
                   registration_end = $9, add_drop_start = $10, add_drop_end = $11,
                   updated_at = NOW()
               WHERE id = $1
               RETURNING {}"#,
            SEMESTER_COLUMNS
        ))
        .bind(id)
        .bind(&semester.name)
        .bind(&semester.name_localized)
        .bind(&semester.academic_year)
        .bind(semester.semester_type.map(|t| t.as_str()))
        .bind(semester.start_date)
        .bind(semester.end_date)
        .bind(semester.registration_start)
        .bind(semester.registration_end)
        .bind(semester.add_drop_start)
        .bind(semester.add_drop_end)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Semester::try_from(row)
    }

    async fn delete(&self, id: SemesterId) -> Result<(), AppError> {
        let deleted = sqlx::query("DELETE FROM semesters WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(semester_not_found(id));
        }
        Ok(())
    }

    async fn set_current(&self, id: SemesterId) -> Result<Semester, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SET_CURRENT_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let exists = sqlx::query_scalar::<_, SemesterId>(
            "SELECT id FROM semesters WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if exists.is_none() {
            return Err(semester_not_found(id));
        }

        sqlx::query(
            "UPDATE semesters SET is_current = FALSE, updated_at = NOW() WHERE is_current AND id <> $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, SemesterRow>(&format!(
            "UPDATE semesters SET is_current = TRUE, updated_at = NOW() WHERE id = $1 RETURNING {}",
            SEMESTER_COLUMNS
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Semester::try_from(row)
    }

    async fn set_closed(&self, id: SemesterId, closed: bool) -> Result<Semester, AppError> {
        sqlx::query_as::<_, SemesterRow>(&format!(
            "UPDATE semesters SET is_closed = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            SEMESTER_COLUMNS
        ))
        .bind(id)
        .bind(closed)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| semester_not_found(id))
        .and_then(Semester::try_from)
    }

    async fn open_registration(
        &self,
        id: SemesterId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Semester, AppError> {
        sqlx::query_as::<_, SemesterRow>(&format!(
            r#"UPDATE semesters
               SET registration_start = $2, registration_end = $3, is_closed = FALSE, updated_at = NOW()
               WHERE id = $1
               RETURNING {}"#,
            SEMESTER_COLUMNS
        ))
        .bind(id)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| semester_not_found(id))
        .and_then(Semester::try_from)
    }

    async fn close_registration(
        &self,
        id: SemesterId,
        end: NaiveDate,
    ) -> Result<Semester, AppError> {
        sqlx::query_as::<_, SemesterRow>(&format!(
            "UPDATE semesters SET registration_end = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            SEMESTER_COLUMNS
        ))
        .bind(id)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| semester_not_found(id))
        .and_then(Semester::try_from)
    }
}

#[derive(Debug, Clone)]
pub struct PgUserCounts {
    pool: PgPool,
}

impl PgUserCounts {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserCountSource for PgUserCounts {
    async fn users_count(&self, role: RoleId) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_roles WHERE role_id = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn all_counts(&self) -> Result<HashMap<RoleId, i64>, AppError> {
        let rows = sqlx::query_as::<_, (RoleId, i64)>(
            "SELECT role_id, COUNT(*) FROM user_roles GROUP BY role_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }
}
