use super::auth::Credentials;
use super::error::{json_body, path_id, query_params};
use super::AppState;
use crate::duty::DutyAssignment;
use crate::error::DutyResult;
use crate::models::{
    AbsenceInput, AbsenceView, Location, LocationInput, ScheduleEntryView, ScheduleInput,
    SubstitutionInput, SubstitutionView, Teacher, TeacherInput,
};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

type Body<T> = Result<Json<T>, JsonRejection>;
type IdPath = Result<Path<Uuid>, PathRejection>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
}

/// Issue a bearer token for API clients
pub async fn login(
    State(state): State<AppState>,
    payload: Body<Credentials>,
) -> DutyResult<Json<TokenResponse>> {
    let credentials = json_body(payload)?;
    let token = state.auth.authenticate(&credentials)?;
    info!("User {} successfully authenticated", credentials.username);

    Ok(Json(TokenResponse {
        token,
        token_type: "Bearer",
    }))
}

/// Who is on duty right now
pub async fn current_duty(State(state): State<AppState>) -> DutyResult<Json<Vec<DutyAssignment>>> {
    Ok(Json(state.duty.current_duty().await?))
}

// Teachers

pub async fn list_teachers(State(state): State<AppState>) -> DutyResult<Json<Vec<Teacher>>> {
    Ok(Json(state.directory_service.list_teachers().await?))
}

pub async fn create_teacher(
    State(state): State<AppState>,
    payload: Body<TeacherInput>,
) -> DutyResult<(StatusCode, Json<Teacher>)> {
    let teacher = state
        .directory_service
        .create_teacher(json_body(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(teacher)))
}

pub async fn update_teacher(
    State(state): State<AppState>,
    id: IdPath,
    payload: Body<TeacherInput>,
) -> DutyResult<Json<Teacher>> {
    let teacher = state
        .directory_service
        .update_teacher(path_id(id)?, json_body(payload)?)
        .await?;
    Ok(Json(teacher))
}

pub async fn delete_teacher(State(state): State<AppState>, id: IdPath) -> DutyResult<StatusCode> {
    state.directory_service.delete_teacher(path_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Locations

pub async fn list_locations(State(state): State<AppState>) -> DutyResult<Json<Vec<Location>>> {
    Ok(Json(state.directory_service.list_locations().await?))
}

pub async fn create_location(
    State(state): State<AppState>,
    payload: Body<LocationInput>,
) -> DutyResult<(StatusCode, Json<Location>)> {
    let location = state
        .directory_service
        .create_location(json_body(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(location)))
}

pub async fn update_location(
    State(state): State<AppState>,
    id: IdPath,
    payload: Body<LocationInput>,
) -> DutyResult<Json<Location>> {
    let location = state
        .directory_service
        .update_location(path_id(id)?, json_body(payload)?)
        .await?;
    Ok(Json(location))
}

pub async fn delete_location(State(state): State<AppState>, id: IdPath) -> DutyResult<StatusCode> {
    state.directory_service.delete_location(path_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Schedules

pub async fn list_schedules(
    State(state): State<AppState>,
) -> DutyResult<Json<Vec<ScheduleEntryView>>> {
    Ok(Json(state.directory_service.list_schedules().await?))
}

pub async fn create_schedule(
    State(state): State<AppState>,
    payload: Body<ScheduleInput>,
) -> DutyResult<(StatusCode, Json<ScheduleEntryView>)> {
    let schedule = state
        .directory_service
        .create_schedule(json_body(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

pub async fn update_schedule(
    State(state): State<AppState>,
    id: IdPath,
    payload: Body<ScheduleInput>,
) -> DutyResult<Json<ScheduleEntryView>> {
    let schedule = state
        .directory_service
        .update_schedule(path_id(id)?, json_body(payload)?)
        .await?;
    Ok(Json(schedule))
}

pub async fn delete_schedule(State(state): State<AppState>, id: IdPath) -> DutyResult<StatusCode> {
    state.directory_service.delete_schedule(path_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Absences

#[derive(Debug, Default, Deserialize)]
pub struct AbsenceQuery {
    pub date: Option<String>,
}

pub async fn list_absences(
    State(state): State<AppState>,
    query: Result<Query<AbsenceQuery>, QueryRejection>,
) -> DutyResult<Json<Vec<AbsenceView>>> {
    let query = query_params(query)?;
    let absences = state
        .directory_service
        .list_absences(query.date.as_deref())
        .await?;
    Ok(Json(absences))
}

pub async fn create_absence(
    State(state): State<AppState>,
    payload: Body<AbsenceInput>,
) -> DutyResult<(StatusCode, Json<AbsenceView>)> {
    let absence = state
        .directory_service
        .create_absence(json_body(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(absence)))
}

pub async fn update_absence(
    State(state): State<AppState>,
    id: IdPath,
    payload: Body<AbsenceInput>,
) -> DutyResult<Json<AbsenceView>> {
    let absence = state
        .directory_service
        .update_absence(path_id(id)?, json_body(payload)?)
        .await?;
    Ok(Json(absence))
}

pub async fn delete_absence(State(state): State<AppState>, id: IdPath) -> DutyResult<StatusCode> {
    state.directory_service.delete_absence(path_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Substitutions

pub async fn create_substitution(
    State(state): State<AppState>,
    payload: Body<SubstitutionInput>,
) -> DutyResult<(StatusCode, Json<SubstitutionView>)> {
    let substitution = state
        .directory_service
        .create_substitution(json_body(payload)?)
        .await?;
    Ok((StatusCode::CREATED, Json(substitution)))
}

pub async fn delete_substitution(
    State(state): State<AppState>,
    id: IdPath,
) -> DutyResult<StatusCode> {
    state
        .directory_service
        .delete_substitution(path_id(id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
