//! Demo semesters for local environments.
//!
//! One academic year `YYYY-YYYY+1` gets a fall, a spring and a summer
//! semester with plausible registration and add/drop windows. Seeding is
//! idempotent per `(academic_year, semester_type)`.

use std::time::Instant;

use chrono::NaiveDate;
use registrar_core::AppError;
use registrar_models::{CreateSemesterDto, SemesterFilterParams, SemesterType};
use tracing::info;

use crate::modules::semesters::service::SemesterService;
use crate::state::AppState;

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, AppError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        AppError::bad_request(anyhow::anyhow!(
            "Invalid date {}-{:02}-{:02}",
            year,
            month,
            day
        ))
    })
}

/// The three semesters of the academic year starting in `start_year`.
pub fn demo_semesters(start_year: i32) -> Result<Vec<CreateSemesterDto>, AppError> {
    let next_year = start_year + 1;
    let academic_year = format!("{}-{}", start_year, next_year);

    Ok(vec![
        CreateSemesterDto {
            name: format!("Fall {}", start_year),
            name_localized: format!("الفصل الأول {}", start_year),
            academic_year: academic_year.clone(),
            semester_type: Some(SemesterType::Fall),
            start_date: date(start_year, 9, 1)?,
            end_date: date(start_year, 12, 31)?,
            registration_start: date(start_year, 8, 1)?,
            registration_end: date(start_year, 8, 31)?,
            add_drop_start: Some(date(start_year, 9, 1)?),
            add_drop_end: Some(date(start_year, 9, 14)?),
        },
        CreateSemesterDto {
            name: format!("Spring {}", next_year),
            name_localized: format!("الفصل الثاني {}", next_year),
            academic_year: academic_year.clone(),
            semester_type: Some(SemesterType::Spring),
            start_date: date(next_year, 1, 20)?,
            end_date: date(next_year, 5, 20)?,
            registration_start: date(next_year, 1, 1)?,
            registration_end: date(next_year, 1, 19)?,
            add_drop_start: Some(date(next_year, 1, 20)?),
            add_drop_end: Some(date(next_year, 2, 2)?),
        },
        CreateSemesterDto {
            name: format!("Summer {}", next_year),
            name_localized: format!("الفصل الصيفي {}", next_year),
            academic_year,
            semester_type: Some(SemesterType::Summer),
            start_date: date(next_year, 6, 10)?,
            end_date: date(next_year, 8, 10)?,
            registration_start: date(next_year, 6, 1)?,
            registration_end: date(next_year, 6, 9)?,
            add_drop_start: None,
            add_drop_end: None,
        },
    ])
}

/// Creates the demo semesters of `start_year` that do not exist yet.
///
/// Returns the number of semesters inserted.
pub async fn seed_semesters(
    state: &AppState,
    start_year: i32,
    today: NaiveDate,
) -> Result<usize, AppError> {
    let started = Instant::now();
    let planned = demo_semesters(start_year)?;

    let filter = SemesterFilterParams {
        academic_year: planned.first().map(|s| s.academic_year.clone()),
        ..Default::default()
    };
    let existing = SemesterService::list_semesters(state, filter, today).await?;

    let mut inserted = 0;
    for dto in planned {
        let present = existing.iter().any(|s| {
            s.semester.semester_type == dto.semester_type && s.semester.name == dto.name
        });
        if present {
            info!(name = %dto.name, "Semester already present, skipping");
            continue;
        }

        SemesterService::create_semester(state, dto, today).await?;
        inserted += 1;
    }

    info!(
        start_year,
        inserted,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Demo semesters seeded"
    );
    Ok(inserted)
}
