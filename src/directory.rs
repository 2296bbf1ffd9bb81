//! Administrative CRUD over teachers, locations, the weekly roster,
//! absences and substitutions.
//!
//! Validation happens here so every caller (HTTP API, seeding) gets the
//! same rules. Deleting a teacher or location that is still referenced is
//! rejected; deleting an absence removes its substitutions with it.

use crate::error::{missing_field, not_found, validation_error, DutyResult, Error};
use crate::models::{
    clean_text, Absence, AbsenceInput, AbsenceView, Location, LocationInput, ScheduleEntry,
    ScheduleEntryView, ScheduleInput, Substitution, SubstitutionInput, SubstitutionView, Teacher,
    TeacherInput,
};
use crate::store::{Directory, Record};
use crate::utils::time::{format_clock_time, format_date, parse_clock_time, parse_date};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

/// Validated CRUD operations over the directory
#[derive(Debug, Clone)]
pub struct DirectoryService {
    directory: Directory,
}

impl DirectoryService {
    pub fn new(directory: Directory) -> Self {
        Self { directory }
    }

    /// The underlying typed store
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    // Teachers

    /// All teachers sorted by name
    pub async fn list_teachers(&self) -> DutyResult<Vec<Teacher>> {
        let mut teachers: Vec<Teacher> = self.directory.all().await?;
        teachers.sort_by_key(|t| t.name.to_lowercase());
        Ok(teachers)
    }

    pub async fn create_teacher(&self, input: TeacherInput) -> DutyResult<Teacher> {
        let teacher = teacher_from_input(Uuid::new_v4(), input)?;
        self.directory.insert(&teacher).await?;
        info!("Created teacher {} ({})", teacher.name, teacher.id);
        Ok(teacher)
    }

    pub async fn update_teacher(&self, id: Uuid, input: TeacherInput) -> DutyResult<Teacher> {
        let teacher = teacher_from_input(id, input)?;
        self.replace_existing(&teacher).await?;
        info!("Updated teacher {} ({})", teacher.name, teacher.id);
        Ok(teacher)
    }

    pub async fn delete_teacher(&self, id: Uuid) -> DutyResult<()> {
        self.require::<Teacher>(id).await?;

        let schedules: Vec<ScheduleEntry> = self.directory.all().await?;
        if schedules.iter().any(|s| s.teacher_id == id) {
            return Err(Error::Conflict(
                "teacher still has weekly duty entries".to_string(),
            ));
        }

        let absences: Vec<Absence> = self.directory.all().await?;
        if absences.iter().any(|a| a.teacher_id == id) {
            return Err(Error::Conflict("teacher still has recorded absences".to_string()));
        }

        let substitutions: Vec<Substitution> = self.directory.all().await?;
        if substitutions.iter().any(|s| s.substitute_teacher_id == id) {
            return Err(Error::Conflict(
                "teacher is still assigned as a substitute".to_string(),
            ));
        }

        self.remove_existing::<Teacher>(id).await?;
        info!("Deleted teacher {}", id);
        Ok(())
    }

    // Locations

    /// All locations sorted by name
    pub async fn list_locations(&self) -> DutyResult<Vec<Location>> {
        let mut locations: Vec<Location> = self.directory.all().await?;
        locations.sort_by_key(|l| l.name.to_lowercase());
        Ok(locations)
    }

    pub async fn create_location(&self, input: LocationInput) -> DutyResult<Location> {
        let location = location_from_input(Uuid::new_v4(), input)?;
        self.directory.insert(&location).await?;
        info!("Created location {} ({})", location.name, location.id);
        Ok(location)
    }

    pub async fn update_location(&self, id: Uuid, input: LocationInput) -> DutyResult<Location> {
        let location = location_from_input(id, input)?;
        self.replace_existing(&location).await?;
        info!("Updated location {} ({})", location.name, location.id);
        Ok(location)
    }

    pub async fn delete_location(&self, id: Uuid) -> DutyResult<()> {
        self.require::<Location>(id).await?;

        let schedules: Vec<ScheduleEntry> = self.directory.all().await?;
        if schedules.iter().any(|s| s.location_id == Some(id)) {
            return Err(Error::Conflict(
                "location still has weekly duty entries".to_string(),
            ));
        }

        self.remove_existing::<Location>(id).await?;
        info!("Deleted location {}", id);
        Ok(())
    }

    // Weekly schedule

    /// All schedule entries sorted by day, then start time
    pub async fn list_schedules(&self) -> DutyResult<Vec<ScheduleEntryView>> {
        let mut schedules: Vec<ScheduleEntry> = self.directory.all().await?;
        schedules.sort_by(|a, b| {
            (a.day_of_week, &a.start_time).cmp(&(b.day_of_week, &b.start_time))
        });

        let teachers = self.teachers_by_id().await?;
        let locations = self.locations_by_id().await?;

        Ok(schedules
            .into_iter()
            .map(|entry| ScheduleEntryView {
                teacher: teachers.get(&entry.teacher_id).cloned(),
                location: entry.location_id.and_then(|id| locations.get(&id).cloned()),
                entry,
            })
            .collect())
    }

    pub async fn create_schedule(&self, input: ScheduleInput) -> DutyResult<ScheduleEntryView> {
        let entry = self.schedule_from_input(Uuid::new_v4(), input).await?;
        self.directory.insert(&entry).await?;
        info!(
            "Created schedule entry {} (day {}, {}-{})",
            entry.id, entry.day_of_week, entry.start_time, entry.end_time
        );
        self.schedule_view(entry).await
    }

    pub async fn update_schedule(
        &self,
        id: Uuid,
        input: ScheduleInput,
    ) -> DutyResult<ScheduleEntryView> {
        self.require::<ScheduleEntry>(id).await?;
        let entry = self.schedule_from_input(id, input).await?;
        self.replace_existing(&entry).await?;
        info!("Updated schedule entry {}", entry.id);
        self.schedule_view(entry).await
    }

    pub async fn delete_schedule(&self, id: Uuid) -> DutyResult<()> {
        self.remove_existing::<ScheduleEntry>(id).await?;
        info!("Deleted schedule entry {}", id);
        Ok(())
    }

    // Absences

    /// Absences, optionally for one date, newest date first
    pub async fn list_absences(&self, date: Option<&str>) -> DutyResult<Vec<AbsenceView>> {
        let date = match date {
            Some(raw) => Some(
                parse_date(raw)
                    .map(format_date)
                    .ok_or_else(|| validation_error("date", "must be YYYY-MM-DD"))?,
            ),
            None => None,
        };

        let mut absences: Vec<Absence> = self.directory.all().await?;
        if let Some(date) = &date {
            absences.retain(|a| &a.date == date);
        }
        absences.sort_by(|a, b| b.date.cmp(&a.date));

        let teachers = self.teachers_by_id().await?;
        let substitutions: Vec<Substitution> = self.directory.all().await?;

        Ok(absences
            .into_iter()
            .map(|absence| {
                let substitutions = substitutions
                    .iter()
                    .filter(|s| s.absence_id == absence.id)
                    .map(|s| SubstitutionView {
                        substitute_teacher: teachers.get(&s.substitute_teacher_id).cloned(),
                        substitution: s.clone(),
                    })
                    .collect();
                AbsenceView {
                    teacher: teachers.get(&absence.teacher_id).cloned(),
                    substitutions,
                    absence,
                }
            })
            .collect())
    }

    pub async fn create_absence(&self, input: AbsenceInput) -> DutyResult<AbsenceView> {
        let absence = self.absence_from_input(Uuid::new_v4(), input).await?;
        self.directory.insert(&absence).await?;
        info!(
            "Recorded absence {} for teacher {} on {}",
            absence.id, absence.teacher_id, absence.date
        );
        self.absence_view(absence).await
    }

    pub async fn update_absence(&self, id: Uuid, input: AbsenceInput) -> DutyResult<AbsenceView> {
        let current: Absence = self.require(id).await?;
        let absence = self.absence_from_input(id, input).await?;

        // Nobody may cover their own absence
        if absence.teacher_id != current.teacher_id {
            let substitutions: Vec<Substitution> = self.directory.all().await?;
            if substitutions
                .iter()
                .any(|s| s.absence_id == id && s.substitute_teacher_id == absence.teacher_id)
            {
                return Err(validation_error(
                    "teacherId",
                    "is already assigned as substitute for this absence",
                ));
            }
        }

        self.replace_existing(&absence).await?;
        info!("Updated absence {}", absence.id);
        self.absence_view(absence).await
    }

    /// Delete an absence together with its substitutions
    pub async fn delete_absence(&self, id: Uuid) -> DutyResult<()> {
        self.require::<Absence>(id).await?;

        let substitutions: Vec<Substitution> = self.directory.all().await?;
        for substitution in substitutions.iter().filter(|s| s.absence_id == id) {
            self.directory.remove::<Substitution>(substitution.id).await?;
        }

        self.remove_existing::<Absence>(id).await?;
        info!("Deleted absence {}", id);
        Ok(())
    }

    // Substitutions

    pub async fn create_substitution(
        &self,
        input: SubstitutionInput,
    ) -> DutyResult<SubstitutionView> {
        let absence_id = input.absence_id.ok_or_else(|| missing_field("absenceId"))?;
        let substitute_id = input
            .substitute_teacher_id
            .ok_or_else(|| missing_field("substituteTeacherId"))?;

        let absence: Absence = self.directory.find(absence_id).await?.ok_or_else(|| {
            validation_error("absenceId", "does not reference an existing absence")
        })?;
        let substitute: Teacher = self.directory.find(substitute_id).await?.ok_or_else(|| {
            validation_error("substituteTeacherId", "does not reference an existing teacher")
        })?;
        if substitute.id == absence.teacher_id {
            return Err(validation_error(
                "substituteTeacherId",
                "cannot be the absent teacher",
            ));
        }

        let substitution = Substitution {
            id: Uuid::new_v4(),
            absence_id,
            substitute_teacher_id: substitute_id,
            notes: clean_text(input.notes),
        };
        self.directory.insert(&substitution).await?;
        info!(
            "Assigned {} to cover absence {}",
            substitute.name, substitution.absence_id
        );

        Ok(SubstitutionView {
            substitution,
            substitute_teacher: Some(substitute),
        })
    }

    pub async fn delete_substitution(&self, id: Uuid) -> DutyResult<()> {
        self.remove_existing::<Substitution>(id).await?;
        info!("Deleted substitution {}", id);
        Ok(())
    }

    // Helpers

    async fn require<R: Record>(&self, id: Uuid) -> DutyResult<R> {
        self.directory
            .find(id)
            .await?
            .ok_or_else(|| not_found(R::KIND.label(), id))
    }

    async fn replace_existing<R: Record>(&self, record: &R) -> DutyResult<()> {
        if self.directory.replace(record).await? {
            Ok(())
        } else {
            Err(not_found(R::KIND.label(), record.id()))
        }
    }

    async fn remove_existing<R: Record>(&self, id: Uuid) -> DutyResult<()> {
        if self.directory.remove::<R>(id).await? {
            Ok(())
        } else {
            Err(not_found(R::KIND.label(), id))
        }
    }

    async fn teachers_by_id(&self) -> DutyResult<HashMap<Uuid, Teacher>> {
        let teachers: Vec<Teacher> = self.directory.all().await?;
        Ok(teachers.into_iter().map(|t| (t.id, t)).collect())
    }

    async fn locations_by_id(&self) -> DutyResult<HashMap<Uuid, Location>> {
        let locations: Vec<Location> = self.directory.all().await?;
        Ok(locations.into_iter().map(|l| (l.id, l)).collect())
    }

    async fn schedule_from_input(&self, id: Uuid, input: ScheduleInput) -> DutyResult<ScheduleEntry> {
        let teacher_id = input.teacher_id.ok_or_else(|| missing_field("teacherId"))?;
        let day_of_week = input.day_of_week.ok_or_else(|| missing_field("dayOfWeek"))?;
        let start_time = input.start_time.ok_or_else(|| missing_field("startTime"))?;
        let end_time = input.end_time.ok_or_else(|| missing_field("endTime"))?;

        let day_of_week = u8::try_from(day_of_week)
            .ok()
            .filter(|d| *d <= 6)
            .ok_or_else(|| validation_error("dayOfWeek", "must be between 0 (Sunday) and 6"))?;
        let start = parse_clock_time(&start_time)
            .ok_or_else(|| validation_error("startTime", "must be HH:MM"))?;
        let end = parse_clock_time(&end_time)
            .ok_or_else(|| validation_error("endTime", "must be HH:MM"))?;
        if end < start {
            return Err(validation_error("endTime", "must not be before startTime"));
        }

        if self.directory.find::<Teacher>(teacher_id).await?.is_none() {
            return Err(validation_error(
                "teacherId",
                "does not reference an existing teacher",
            ));
        }

        let is_substitutional = input.is_substitutional.unwrap_or(false);
        // Substitutes cover every location, so any supplied location is dropped
        let location_id = if is_substitutional {
            None
        } else {
            let location_id = input.location_id.ok_or_else(|| {
                validation_error("locationId", "is required for non-substitutional duty")
            })?;
            if self.directory.find::<Location>(location_id).await?.is_none() {
                return Err(validation_error(
                    "locationId",
                    "does not reference an existing location",
                ));
            }
            Some(location_id)
        };

        Ok(ScheduleEntry {
            id,
            teacher_id,
            location_id,
            is_substitutional,
            day_of_week,
            start_time: format_clock_time(start),
            end_time: format_clock_time(end),
        })
    }

    async fn schedule_view(&self, entry: ScheduleEntry) -> DutyResult<ScheduleEntryView> {
        let teacher = self.directory.find(entry.teacher_id).await?;
        let location = match entry.location_id {
            Some(id) => self.directory.find(id).await?,
            None => None,
        };
        Ok(ScheduleEntryView {
            entry,
            teacher,
            location,
        })
    }

    async fn absence_from_input(&self, id: Uuid, input: AbsenceInput) -> DutyResult<Absence> {
        let teacher_id = input.teacher_id.ok_or_else(|| missing_field("teacherId"))?;
        let raw_date = input.date.ok_or_else(|| missing_field("date"))?;
        let date = parse_date(&raw_date)
            .map(format_date)
            .ok_or_else(|| validation_error("date", "must be YYYY-MM-DD"))?;

        if self.directory.find::<Teacher>(teacher_id).await?.is_none() {
            return Err(validation_error(
                "teacherId",
                "does not reference an existing teacher",
            ));
        }

        let absences: Vec<Absence> = self.directory.all().await?;
        if absences
            .iter()
            .any(|a| a.id != id && a.teacher_id == teacher_id && a.date == date)
        {
            return Err(Error::Conflict(format!(
                "teacher already has an absence on {}",
                date
            )));
        }

        Ok(Absence {
            id,
            teacher_id,
            date,
            reason: clean_text(input.reason),
        })
    }

    async fn absence_view(&self, absence: Absence) -> DutyResult<AbsenceView> {
        let teacher = self.directory.find(absence.teacher_id).await?;
        let substitutions: Vec<Substitution> = self.directory.all().await?;

        let mut views = Vec::new();
        for substitution in substitutions.into_iter().filter(|s| s.absence_id == absence.id) {
            let substitute_teacher = self.directory.find(substitution.substitute_teacher_id).await?;
            views.push(SubstitutionView {
                substitution,
                substitute_teacher,
            });
        }

        Ok(AbsenceView {
            absence,
            teacher,
            substitutions: views,
        })
    }
}

fn required_name(name: Option<String>) -> DutyResult<String> {
    clean_text(name).ok_or_else(|| missing_field("name"))
}

fn teacher_from_input(id: Uuid, input: TeacherInput) -> DutyResult<Teacher> {
    Ok(Teacher {
        id,
        name: required_name(input.name)?,
        email: clean_text(input.email),
        phone: clean_text(input.phone),
        subject: clean_text(input.subject),
    })
}

fn location_from_input(id: Uuid, input: LocationInput) -> DutyResult<Location> {
    Ok(Location {
        id,
        name: required_name(input.name)?,
        description: clean_text(input.description),
    })
}
