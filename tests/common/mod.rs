#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use efimeries::directory::DirectoryService;
use efimeries::error::{store_error, DutyResult};
use efimeries::models::{
    Absence, AbsenceInput, Location, LocationInput, ScheduleInput, Teacher, TeacherInput,
};
use efimeries::store::{Directory, DirectoryStore, InMemoryStore, RecordKind};
use efimeries::utils::time::{FixedClock, SchoolClock};
use efimeries::web::auth::AuthConfig;
use std::sync::Arc;
use uuid::Uuid;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "password";

/// Store double whose every call fails, standing in for an unreachable Redis
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl DirectoryStore for FailingStore {
    async fn list(&self, _kind: RecordKind) -> DutyResult<Vec<String>> {
        Err(store_error("connection refused"))
    }

    async fn get(&self, _kind: RecordKind, _id: Uuid) -> DutyResult<Option<String>> {
        Err(store_error("connection refused"))
    }

    async fn insert(&self, _kind: RecordKind, _id: Uuid, _payload: String) -> DutyResult<()> {
        Err(store_error("connection refused"))
    }

    async fn replace(&self, _kind: RecordKind, _id: Uuid, _payload: String) -> DutyResult<bool> {
        Err(store_error("connection refused"))
    }

    async fn remove(&self, _kind: RecordKind, _id: Uuid) -> DutyResult<bool> {
        Err(store_error("connection refused"))
    }
}

pub fn memory_directory() -> Directory {
    Directory::new(Arc::new(InMemoryStore::new()))
}

pub fn failing_directory() -> Directory {
    Directory::new(Arc::new(FailingStore))
}

/// Athens clock pinned to the given UTC instant
pub fn athens_clock_at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> SchoolClock {
    let instant = Utc
        .with_ymd_and_hms(year, month, day, hour, min, sec)
        .single()
        .expect("valid test instant");
    SchoolClock::with_clock(chrono_tz::Europe::Athens, Arc::new(FixedClock(instant)))
}

/// Monday 2025-03-10, 10:05 in Athens
pub fn monday_morning() -> SchoolClock {
    athens_clock_at(2025, 3, 10, 8, 5, 0)
}

pub const MONDAY: &str = "2025-03-10";

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration_secret".to_string(),
        token_expiration_minutes: 60,
        admin_username: ADMIN_USERNAME.to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
    }
}

pub async fn add_teacher(service: &DirectoryService, name: &str) -> Teacher {
    service
        .create_teacher(TeacherInput {
            name: Some(name.to_string()),
            ..Default::default()
        })
        .await
        .expect("create teacher")
}

pub async fn add_location(service: &DirectoryService, name: &str) -> Location {
    service
        .create_location(LocationInput {
            name: Some(name.to_string()),
            description: None,
        })
        .await
        .expect("create location")
}

/// Regular duty of `teacher` at `location`
pub async fn add_duty(
    service: &DirectoryService,
    teacher: &Teacher,
    location: &Location,
    day: i64,
    start: &str,
    end: &str,
) -> Uuid {
    service
        .create_schedule(ScheduleInput {
            teacher_id: Some(teacher.id),
            location_id: Some(location.id),
            is_substitutional: Some(false),
            day_of_week: Some(day),
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
        })
        .await
        .expect("create schedule")
        .entry
        .id
}

/// Put `teacher` in the substitute pool
pub async fn add_to_pool(service: &DirectoryService, teacher: &Teacher, day: i64) {
    service
        .create_schedule(ScheduleInput {
            teacher_id: Some(teacher.id),
            location_id: None,
            is_substitutional: Some(true),
            day_of_week: Some(day),
            start_time: Some("08:00".to_string()),
            end_time: Some("14:00".to_string()),
        })
        .await
        .expect("create substitutional entry");
}

pub async fn mark_absent(
    service: &DirectoryService,
    teacher: &Teacher,
    date: &str,
    reason: &str,
) -> Absence {
    service
        .create_absence(AbsenceInput {
            teacher_id: Some(teacher.id),
            date: Some(date.to_string()),
            reason: Some(reason.to_string()),
        })
        .await
        .expect("create absence")
        .absence
}
