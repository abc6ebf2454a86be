use chrono::{Duration, Months, NaiveDate, Utc};
use tracing::{info, instrument};
use validator::Validate;

use registrar_core::AppError;
use registrar_models::SemesterId;

use crate::metrics::track_semester_transition;
use crate::state::AppState;

use super::lifecycle::describe;
use super::model::{
    CreateSemesterDto, Semester, SemesterFilterParams, SemesterWithStatus, UpdateSemesterDto,
};

pub struct SemesterService;

impl SemesterService {
    fn required_text(field: &str, value: &mut String) -> Result<(), AppError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation(
                field,
                anyhow::anyhow!("{} must not be empty", field),
            ));
        }
        *value = trimmed.to_string();
        Ok(())
    }

    /// Checks a complete record: non-empty names, ordered instructional
    /// period and a paired add/drop window.
    fn validate_semester(semester: &mut Semester) -> Result<(), AppError> {
        Self::required_text("name", &mut semester.name)?;
        Self::required_text("name_localized", &mut semester.name_localized)?;
        Self::required_text("academic_year", &mut semester.academic_year)?;

        if semester.start_date > semester.end_date {
            return Err(AppError::validation(
                "end_date",
                anyhow::anyhow!("End date must not be before start date"),
            ));
        }

        match (semester.add_drop_start, semester.add_drop_end) {
            (Some(_), None) => Err(AppError::validation(
                "add_drop_end",
                anyhow::anyhow!("Add/drop end date is required when a start date is set"),
            )),
            (None, Some(_)) => Err(AppError::validation(
                "add_drop_start",
                anyhow::anyhow!("Add/drop start date is required when an end date is set"),
            )),
            _ => Ok(()),
        }
    }

    async fn find_semester(state: &AppState, id: SemesterId) -> Result<Semester, AppError> {
        state
            .semesters
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Semester not found")))
    }

    /// Semesters matching `filter`, newest first.
    #[instrument(skip(state))]
    pub async fn list_semesters(
        state: &AppState,
        filter: SemesterFilterParams,
        today: NaiveDate,
    ) -> Result<Vec<SemesterWithStatus>, AppError> {
        let semesters = state.semesters.list(&filter).await?;
        Ok(semesters.into_iter().map(|s| describe(s, today)).collect())
    }

    #[instrument(skip(state))]
    pub async fn get_semester(
        state: &AppState,
        id: SemesterId,
        today: NaiveDate,
    ) -> Result<SemesterWithStatus, AppError> {
        let semester = Self::find_semester(state, id).await?;
        Ok(describe(semester, today))
    }

    #[instrument(skip(state))]
    pub async fn get_current_semester(
        state: &AppState,
        today: NaiveDate,
    ) -> Result<SemesterWithStatus, AppError> {
        let semester = state
            .semesters
            .find_current()
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("No current semester")))?;
        Ok(describe(semester, today))
    }

    #[instrument(skip(state))]
    pub async fn create_semester(
        state: &AppState,
        dto: CreateSemesterDto,
        today: NaiveDate,
    ) -> Result<SemesterWithStatus, AppError> {
        dto.validate().map_err(AppError::from_validation_errors)?;

        let now = Utc::now();
        let mut semester = Semester {
            id: SemesterId::new(),
            name: dto.name,
            name_localized: dto.name_localized,
            academic_year: dto.academic_year,
            semester_type: dto.semester_type,
            start_date: dto.start_date,
            end_date: dto.end_date,
            registration_start: dto.registration_start,
            registration_end: dto.registration_end,
            add_drop_start: dto.add_drop_start,
            add_drop_end: dto.add_drop_end,
            is_current: false,
            is_closed: false,
            created_at: now,
            updated_at: now,
        };
        Self::validate_semester(&mut semester)?;

        state.semesters.insert(&semester).await?;
        info!(semester_id = %semester.id, name = %semester.name, "Semester created");

        Ok(describe(semester, today))
    }

    /// Applies the provided fields over the stored record and validates the
    /// result as a whole. Lifecycle flags are never touched.
    #[instrument(skip(state))]
    pub async fn update_semester(
        state: &AppState,
        id: SemesterId,
        dto: UpdateSemesterDto,
        today: NaiveDate,
    ) -> Result<SemesterWithStatus, AppError> {
        dto.validate().map_err(AppError::from_validation_errors)?;

        let edit = |semester: &mut Semester| {
            if let Some(name) = &dto.name {
                semester.name = name.clone();
            }
            if let Some(name_localized) = &dto.name_localized {
                semester.name_localized = name_localized.clone();
            }
            if let Some(academic_year) = &dto.academic_year {
                semester.academic_year = academic_year.clone();
            }
            if let Some(semester_type) = dto.semester_type {
                semester.semester_type = semester_type;
            }
            if let Some(start_date) = dto.start_date {
                semester.start_date = start_date;
            }
            if let Some(end_date) = dto.end_date {
                semester.end_date = end_date;
            }
            if let Some(registration_start) = dto.registration_start {
                semester.registration_start = registration_start;
            }
            if let Some(registration_end) = dto.registration_end {
                semester.registration_end = registration_end;
            }
            if let Some(add_drop_start) = dto.add_drop_start {
                semester.add_drop_start = add_drop_start;
            }
            if let Some(add_drop_end) = dto.add_drop_end {
                semester.add_drop_end = add_drop_end;
            }
            Self::validate_semester(semester)
        };

        let saved = state.semesters.update(id, &edit).await?;
        Ok(describe(saved, today))
    }

    #[instrument(skip(state))]
    pub async fn delete_semester(state: &AppState, id: SemesterId) -> Result<(), AppError> {
        state.semesters.delete(id).await?;
        info!(semester_id = %id, "Semester deleted");
        Ok(())
    }

    /// Makes `id` the only current semester.
    #[instrument(skip(state))]
    pub async fn set_current_semester(
        state: &AppState,
        id: SemesterId,
        today: NaiveDate,
    ) -> Result<SemesterWithStatus, AppError> {
        let semester = state.semesters.set_current(id).await?;
        track_semester_transition("set_current");
        info!(semester_id = %id, name = %semester.name, "Current semester changed");
        Ok(describe(semester, today))
    }

    #[instrument(skip(state))]
    pub async fn close_semester(
        state: &AppState,
        id: SemesterId,
        today: NaiveDate,
    ) -> Result<SemesterWithStatus, AppError> {
        let semester = state.semesters.set_closed(id, true).await?;
        track_semester_transition("close");
        info!(semester_id = %id, "Semester closed");
        Ok(describe(semester, today))
    }

    #[instrument(skip(state))]
    pub async fn reopen_semester(
        state: &AppState,
        id: SemesterId,
        today: NaiveDate,
    ) -> Result<SemesterWithStatus, AppError> {
        let semester = state.semesters.set_closed(id, false).await?;
        track_semester_transition("reopen");
        info!(semester_id = %id, "Semester reopened");
        Ok(describe(semester, today))
    }

    /// Opens registration from yesterday until one month from today and
    /// clears `is_closed`.
    #[instrument(skip(state))]
    pub async fn open_registration(
        state: &AppState,
        id: SemesterId,
        today: NaiveDate,
    ) -> Result<SemesterWithStatus, AppError> {
        let start = today - Duration::days(1);
        let end = today
            .checked_add_months(Months::new(1))
            .ok_or_else(|| AppError::bad_request(anyhow::anyhow!("Date out of range")))?;

        let semester = state.semesters.open_registration(id, start, end).await?;
        track_semester_transition("open_registration");
        info!(semester_id = %id, %start, %end, "Registration opened");
        Ok(describe(semester, today))
    }

    /// Ends registration yesterday.
    #[instrument(skip(state))]
    pub async fn close_registration(
        state: &AppState,
        id: SemesterId,
        today: NaiveDate,
    ) -> Result<SemesterWithStatus, AppError> {
        let end = today - Duration::days(1);
        let semester = state.semesters.close_registration(id, end).await?;
        track_semester_transition("close_registration");
        info!(semester_id = %id, %end, "Registration closed");
        Ok(describe(semester, today))
    }
}
