//! Derived semester state.
//!
//! Nothing here is stored. Status is recomputed from the stored flags and
//! the calendar date on every read, so a semester moves from `UPCOMING` to
//! `OPEN` to `PAST` without any write.

use chrono::NaiveDate;

use super::model::{Semester, SemesterStatus, SemesterWithStatus};

/// Lifecycle status of `semester` on `today`. The first matching rule wins:
///
/// 1. `is_current` gives `CURRENT`
/// 2. `is_closed` gives `CLOSED`
/// 3. before `start_date` gives `UPCOMING`
/// 4. after `end_date` gives `PAST`
/// 5. otherwise `OPEN` (both boundary days included)
pub fn compute_status(semester: &Semester, today: NaiveDate) -> SemesterStatus {
    if semester.is_current {
        SemesterStatus::Current
    } else if semester.is_closed {
        SemesterStatus::Closed
    } else if today < semester.start_date {
        SemesterStatus::Upcoming
    } else if today > semester.end_date {
        SemesterStatus::Past
    } else {
        SemesterStatus::Open
    }
}

pub fn is_registration_open(semester: &Semester, today: NaiveDate) -> bool {
    !semester.is_closed
        && semester.registration_start <= today
        && today <= semester.registration_end
}

pub fn is_add_drop_open(semester: &Semester, today: NaiveDate) -> bool {
    if semester.is_closed {
        return false;
    }
    semester
        .add_drop_window()
        .is_some_and(|(start, end)| start <= today && today <= end)
}

pub fn describe(semester: Semester, today: NaiveDate) -> SemesterWithStatus {
    SemesterWithStatus {
        status: compute_status(&semester, today),
        registration_open: is_registration_open(&semester, today),
        add_drop_open: is_add_drop_open(&semester, today),
        semester,
    }
}
