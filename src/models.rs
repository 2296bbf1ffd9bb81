//! Roster records, request inputs and the views returned to callers.
//!
//! Everything crosses the wire in camelCase so existing front ends keep
//! working against the same field names.

use crate::utils::time::parse_clock_time;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A member of staff who can be put on duty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
}

/// A physical place that needs supervision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// One recurring weekly duty slot.
///
/// Regular entries always carry a location; substitutional entries never
/// do, since a substitute covers whichever location needs them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub location_id: Option<Uuid>,
    pub is_substitutional: bool,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    /// HH:MM, school-local
    pub start_time: String,
    /// HH:MM, school-local
    pub end_time: String,
}

impl ScheduleEntry {
    /// Parsed [start, end] window, `None` if the stored times are malformed
    pub fn window(&self) -> Option<(NaiveTime, NaiveTime)> {
        Some((
            parse_clock_time(&self.start_time)?,
            parse_clock_time(&self.end_time)?,
        ))
    }
}

/// A teacher missing on one calendar date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Absence {
    pub id: Uuid,
    pub teacher_id: Uuid,
    /// YYYY-MM-DD
    pub date: String,
    pub reason: Option<String>,
}

/// An administrator's explicit choice of who covers an absence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub id: Uuid,
    pub absence_id: Uuid,
    pub substitute_teacher_id: Uuid,
    pub notes: Option<String>,
}

/// Create/update payload for a teacher
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
}

/// Create/update payload for a location
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Create/update payload for a weekly schedule entry
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInput {
    pub teacher_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub is_substitutional: Option<bool>,
    pub day_of_week: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Create/update payload for an absence
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceInput {
    pub teacher_id: Option<Uuid>,
    pub date: Option<String>,
    pub reason: Option<String>,
}

/// Create payload for a substitution
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionInput {
    pub absence_id: Option<Uuid>,
    pub substitute_teacher_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Schedule entry with its teacher and location resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntryView {
    #[serde(flatten)]
    pub entry: ScheduleEntry,
    pub teacher: Option<Teacher>,
    pub location: Option<Location>,
}

/// Substitution with its covering teacher resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionView {
    #[serde(flatten)]
    pub substitution: Substitution,
    pub substitute_teacher: Option<Teacher>,
}

/// Absence with the absent teacher and any substitutions resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceView {
    #[serde(flatten)]
    pub absence: Absence,
    pub teacher: Option<Teacher>,
    pub substitutions: Vec<SubstitutionView>,
}

/// Trim optional free text, treating blank values as absent
pub fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
