pub mod resolver;

use crate::error::{DutyResult, Error};
use crate::models::{Absence, Location, ScheduleEntry, Substitution, Teacher};
use crate::store::Directory;
use crate::utils::time::{DutyMoment, SchoolClock};
use resolver::{ActiveSlot, TodayAbsence};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Who is effectively on duty in one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyAssignment {
    pub schedule_id: Uuid,
    pub teacher: Teacher,
    pub original_teacher: Option<Teacher>,
    pub location: Option<Location>,
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    pub is_substitute: bool,
    pub absence_reason: Option<String>,
}

impl DutyAssignment {
    /// The slot as rostered
    pub(crate) fn rostered(slot: &ActiveSlot) -> Self {
        Self {
            schedule_id: slot.entry.id,
            teacher: slot.teacher.clone(),
            original_teacher: None,
            location: slot.location.clone(),
            day_of_week: slot.entry.day_of_week,
            start_time: slot.entry.start_time.clone(),
            end_time: slot.entry.end_time.clone(),
            is_substitute: false,
            absence_reason: None,
        }
    }

    /// The slot taken over by a substitute
    pub(crate) fn covered(slot: &ActiveSlot, substitute: Teacher, reason: Option<String>) -> Self {
        Self {
            teacher: substitute,
            original_teacher: Some(slot.teacher.clone()),
            is_substitute: true,
            absence_reason: reason,
            ..Self::rostered(slot)
        }
    }
}

/// Computes the current duty from the directory and the school clock
#[derive(Debug, Clone)]
pub struct DutyService {
    directory: Directory,
    clock: SchoolClock,
}

impl DutyService {
    pub fn new(directory: Directory, clock: SchoolClock) -> Self {
        Self { directory, clock }
    }

    /// The school-local moment the next resolution would use
    pub fn moment(&self) -> DutyMoment {
        self.clock.moment()
    }

    /// Who is on duty right now
    pub async fn current_duty(&self) -> DutyResult<Vec<DutyAssignment>> {
        self.duty_at(self.moment()).await
    }

    /// Who is on duty at a moment already taken from the clock
    pub async fn duty_at(&self, moment: DutyMoment) -> DutyResult<Vec<DutyAssignment>> {
        compute_current_duty(&self.directory, moment).await
    }
}

/// Who is on duty at the given moment.
///
/// Reads the roster, today's absences and the substitute pool, then
/// resolves substitutes. Writes nothing.
pub async fn compute_current_duty(
    directory: &Directory,
    moment: DutyMoment,
) -> DutyResult<Vec<DutyAssignment>> {
    let snapshot = Snapshot::load(directory, moment).await.map_err(|e| {
        error!("Failed to load roster for {} {}: {}", moment.date_string(), moment.time_string(), e);
        Error::DutyResolution(e.to_string())
    })?;

    Ok(resolver::resolve(
        &snapshot.slots,
        &snapshot.absences,
        &snapshot.pool,
    ))
}

/// Everything the resolver needs, read in one pass
struct Snapshot {
    slots: Vec<ActiveSlot>,
    absences: Vec<TodayAbsence>,
    pool: Vec<Teacher>,
}

impl Snapshot {
    async fn load(directory: &Directory, moment: DutyMoment) -> DutyResult<Self> {
        let schedules: Vec<ScheduleEntry> = directory.all().await?;
        let teachers: HashMap<Uuid, Teacher> = directory
            .all::<Teacher>()
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        let locations: HashMap<Uuid, Location> = directory
            .all::<Location>()
            .await?
            .into_iter()
            .map(|l| (l.id, l))
            .collect();

        let slots = active_slots(&schedules, &teachers, &locations, moment);
        let pool = substitute_pool(&schedules, &teachers);

        let today = moment.date_string();
        let absences: Vec<Absence> = directory
            .all::<Absence>()
            .await?
            .into_iter()
            .filter(|a| a.date == today)
            .collect();
        let substitutions: Vec<Substitution> = if absences.is_empty() {
            Vec::new()
        } else {
            directory.all().await?
        };

        let absences = absences
            .into_iter()
            .filter(|a| teachers.contains_key(&a.teacher_id))
            .map(|absence| TodayAbsence {
                substitute: substitutions
                    .iter()
                    .filter(|s| s.absence_id == absence.id)
                    .find_map(|s| teachers.get(&s.substitute_teacher_id).cloned()),
                teacher_id: absence.teacher_id,
                reason: absence.reason,
            })
            .collect();

        Ok(Self {
            slots,
            absences,
            pool,
        })
    }
}

/// Regular entries whose day and inclusive window match the moment,
/// ordered by start time. Entries pointing at deleted records are skipped.
fn active_slots(
    schedules: &[ScheduleEntry],
    teachers: &HashMap<Uuid, Teacher>,
    locations: &HashMap<Uuid, Location>,
    moment: DutyMoment,
) -> Vec<ActiveSlot> {
    let mut active: Vec<&ScheduleEntry> = schedules
        .iter()
        .filter(|s| !s.is_substitutional && s.day_of_week == moment.weekday)
        .filter(|s| match s.window() {
            Some((start, end)) => moment.is_within(start, end),
            None => {
                warn!("Schedule entry {} has malformed times, skipping", s.id);
                false
            }
        })
        .collect();
    active.sort_by(|a, b| a.start_time.cmp(&b.start_time));

    active
        .into_iter()
        .filter_map(|entry| {
            let Some(teacher) = teachers.get(&entry.teacher_id) else {
                debug!("Schedule entry {} references a missing teacher", entry.id);
                return None;
            };
            let location = match entry.location_id {
                Some(id) => match locations.get(&id) {
                    Some(location) => Some(location.clone()),
                    None => {
                        debug!("Schedule entry {} references a missing location", entry.id);
                        return None;
                    }
                },
                None => None,
            };
            Some(ActiveSlot {
                entry: entry.clone(),
                teacher: teacher.clone(),
                location,
            })
        })
        .collect()
}

/// Distinct teachers with any substitutional entry, in the order their
/// first such entry was created
fn substitute_pool(schedules: &[ScheduleEntry], teachers: &HashMap<Uuid, Teacher>) -> Vec<Teacher> {
    let mut seen = HashSet::new();
    schedules
        .iter()
        .filter(|s| s.is_substitutional)
        .filter(|s| seen.insert(s.teacher_id))
        .filter_map(|s| teachers.get(&s.teacher_id).cloned())
        .collect()
}
