//! Semester models and DTOs.
//!
//! A semester is an academic term with an instructional period, a
//! registration window and an optional add/drop window. Its lifecycle
//! status is never stored: it is derived from the stored flags and today's
//! date on every read (see [`SemesterStatus`]).
//!
//! `is_current` and `is_closed` are deliberately absent from the create and
//! update DTOs. They change only through the dedicated transitions, and the
//! DTOs reject unknown fields so a body carrying them fails to parse.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use registrar_core::serde::{deserialize_nullable, deserialize_optional_string};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::SemesterId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SemesterType {
    Fall,
    Spring,
    Summer,
}

impl SemesterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fall => "FALL",
            Self::Spring => "SPRING",
            Self::Summer => "SUMMER",
        }
    }
}

impl fmt::Display for SemesterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemesterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FALL" => Ok(Self::Fall),
            "SPRING" => Ok(Self::Spring),
            "SUMMER" => Ok(Self::Summer),
            other => Err(format!("unknown semester type '{}'", other)),
        }
    }
}

/// Derived lifecycle status, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SemesterStatus {
    Current,
    Closed,
    Upcoming,
    Past,
    Open,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Semester {
    pub id: SemesterId,
    pub name: String,
    pub name_localized: String,
    /// Academic year label, e.g. `2025-2026`
    pub academic_year: String,
    pub semester_type: Option<SemesterType>,
    /// First day of instruction
    pub start_date: NaiveDate,
    /// Last day of instruction
    pub end_date: NaiveDate,
    pub registration_start: NaiveDate,
    pub registration_end: NaiveDate,
    pub add_drop_start: Option<NaiveDate>,
    pub add_drop_end: Option<NaiveDate>,
    pub is_current: bool,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Semester {
    /// The add/drop window, when both ends are set.
    pub fn add_drop_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.add_drop_start.zip(self.add_drop_end)
    }
}

/// A semester as returned by the API, with its derived lifecycle fields.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SemesterWithStatus {
    #[serde(flatten)]
    pub semester: Semester,
    pub status: SemesterStatus,
    pub registration_open: bool,
    pub add_drop_open: bool,
}

// DTOs

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateSemesterDto {
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
    #[validate(length(
        min = 1,
        max = 20,
        message = "Academic year must be between 1 and 20 characters"
    ))]
    pub academic_year: String,
    pub semester_type: Option<SemesterType>,
    pub start_date: NaiveDate,
    /// Must not precede `start_date`
    pub end_date: NaiveDate,
    pub registration_start: NaiveDate,
    pub registration_end: NaiveDate,
    /// Set together with `add_drop_end` or not at all
    pub add_drop_start: Option<NaiveDate>,
    pub add_drop_end: Option<NaiveDate>,
}

/// Partial update; omitted fields keep their stored values.
///
/// `semester_type`, `add_drop_start` and `add_drop_end` distinguish an
/// omitted field from an explicit `null`, which clears the stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateSemesterDto {
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
    #[validate(length(
        min = 1,
        max = 20,
        message = "Academic year must be between 1 and 20 characters"
    ))]
    pub academic_year: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<SemesterType>)]
    pub semester_type: Option<Option<SemesterType>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub registration_start: Option<NaiveDate>,
    pub registration_end: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<NaiveDate>)]
    pub add_drop_start: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    #[schema(value_type = Option<NaiveDate>)]
    pub add_drop_end: Option<Option<NaiveDate>>,
}

/// Query parameters for listing semesters.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SemesterFilterParams {
    /// Only the current (or only non-current) semesters
    pub is_current: Option<bool>,
    /// Exact academic year label
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub academic_year: Option<String>,
}
