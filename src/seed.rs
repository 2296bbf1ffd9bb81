//! Initial roster loaded from a TOML file into an empty directory.
//!
//! ```toml
//! [[teachers]]
//! key = "panagou"
//! name = "Μαρία Παναγού"
//!
//! [[locations]]
//! key = "yard-a"
//! name = "Προαύλιο Α"
//!
//! [[duties]]
//! teacher = "panagou"
//! location = "yard-a"
//! days = [1, 2, 3, 4, 5]
//! start = "10:00"
//! end = "10:15"
//! ```

use crate::directory::DirectoryService;
use crate::error::{config_error, DutyResult};
use crate::models::{LocationInput, ScheduleInput, TeacherInput};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedRoster {
    pub teachers: Vec<SeedTeacher>,
    pub locations: Vec<SeedLocation>,
    pub duties: Vec<SeedDuty>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedTeacher {
    /// Name used by `duties` to refer to this teacher
    pub key: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedLocation {
    pub key: String,
    pub name: String,
    pub description: Option<String>,
}

/// A weekly duty repeated on each listed day
#[derive(Debug, Clone, Deserialize)]
pub struct SeedDuty {
    pub teacher: String,
    pub location: Option<String>,
    pub days: Vec<i64>,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub substitutional: bool,
}

/// What a seeding run created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub teachers: usize,
    pub locations: usize,
    pub schedules: usize,
}

/// Parse a roster from TOML text
pub fn parse_roster(content: &str) -> DutyResult<SeedRoster> {
    Ok(toml::from_str(content)?)
}

/// Read and parse a roster file
pub fn load_roster(path: &Path) -> DutyResult<SeedRoster> {
    let content = fs::read_to_string(path)?;
    parse_roster(&content)
}

/// Load the roster unless the directory already has teachers.
///
/// Returns `None` when seeding was skipped.
pub async fn seed_if_empty(
    service: &DirectoryService,
    roster: SeedRoster,
) -> DutyResult<Option<SeedSummary>> {
    if !service.list_teachers().await?.is_empty() {
        info!("Directory already has teachers, skipping seed");
        return Ok(None);
    }

    let mut summary = SeedSummary::default();

    let mut teachers: HashMap<String, Uuid> = HashMap::new();
    for seed in roster.teachers {
        let teacher = service
            .create_teacher(TeacherInput {
                name: Some(seed.name),
                email: seed.email,
                phone: seed.phone,
                subject: seed.subject,
            })
            .await?;
        teachers.insert(seed.key, teacher.id);
        summary.teachers += 1;
    }

    let mut locations: HashMap<String, Uuid> = HashMap::new();
    for seed in roster.locations {
        let location = service
            .create_location(LocationInput {
                name: Some(seed.name),
                description: seed.description,
            })
            .await?;
        locations.insert(seed.key, location.id);
        summary.locations += 1;
    }

    for duty in roster.duties {
        let teacher_id = *teachers.get(&duty.teacher).ok_or_else(|| {
            config_error(&format!("duty references unknown teacher '{}'", duty.teacher))
        })?;
        let location_id = match &duty.location {
            Some(key) => Some(*locations.get(key).ok_or_else(|| {
                config_error(&format!("duty references unknown location '{}'", key))
            })?),
            None => None,
        };

        for day in &duty.days {
            service
                .create_schedule(ScheduleInput {
                    teacher_id: Some(teacher_id),
                    location_id,
                    is_substitutional: Some(duty.substitutional),
                    day_of_week: Some(*day),
                    start_time: Some(duty.start.clone()),
                    end_time: Some(duty.end.clone()),
                })
                .await?;
            summary.schedules += 1;
        }
    }

    info!(
        "Seeded {} teachers, {} locations and {} schedule entries",
        summary.teachers, summary.locations, summary.schedules
    );
    Ok(Some(summary))
}
