//! Browser-facing pages: the public duty board and the administrator login.

use super::auth::{Credentials, AUTH_COOKIE};
use super::error::{form_body, query_params};
use super::AppState;
use crate::duty::DutyAssignment;
use crate::error::{DutyResult, ErrorCategory};
use crate::utils::i18n::day_name;
use askama::Template;
use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{debug, error, info};

/// Login error codes that may be shown back to the user
const LOGIN_ERRORS: [&str; 2] = ["invalid_credentials", "login_failed"];

/// One row on the duty board
pub struct BoardRow {
    pub location: String,
    pub teacher: String,
    pub hours: String,
    /// "covering for ..." line, empty for rostered teachers
    pub note: String,
}

impl BoardRow {
    fn from_assignment(assignment: &DutyAssignment) -> Self {
        let note = match &assignment.original_teacher {
            Some(original) if assignment.is_substitute => {
                let covers = t!("board.covers_for", name = original.name).to_string();
                match &assignment.absence_reason {
                    Some(reason) => format!("{} ({})", covers, reason),
                    None => covers,
                }
            }
            _ => String::new(),
        };

        Self {
            location: assignment
                .location
                .as_ref()
                .map(|l| l.name.clone())
                .unwrap_or_default(),
            teacher: assignment.teacher.name.clone(),
            hours: format!("{} - {}", assignment.start_time, assignment.end_time),
            note,
        }
    }
}

#[derive(Template)]
#[template(path = "duty.html")]
pub struct DutyBoardTemplate {
    pub lang: String,
    pub title: String,
    pub heading: String,
    pub day: String,
    pub date: String,
    pub time: String,
    pub location_label: String,
    pub teacher_label: String,
    pub hours_label: String,
    pub nobody: String,
    pub sign_in: String,
    pub rows: Vec<BoardRow>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub lang: String,
    pub title: String,
    pub username_label: String,
    pub password_label: String,
    pub submit: String,
    pub error: Option<String>,
}

/// Public board of who is on duty right now
pub async fn duty_board(State(state): State<AppState>) -> DutyResult<Html<String>> {
    let moment = state.duty.moment();

    // The board stays up even when the roster can't be read
    let duty = match state.duty.duty_at(moment).await {
        Ok(duty) => duty,
        Err(e) => {
            error!("Failed to render current duty: {}", e);
            Vec::new()
        }
    };

    let page = DutyBoardTemplate {
        lang: (*rust_i18n::locale()).to_string(),
        title: t!("board.title").to_string(),
        heading: t!("board.now_on_duty").to_string(),
        day: day_name(moment.weekday),
        date: moment.date_string(),
        time: moment.time_string(),
        location_label: t!("board.location").to_string(),
        teacher_label: t!("board.teacher").to_string(),
        hours_label: t!("board.hours").to_string(),
        nobody: t!("board.nobody").to_string(),
        sign_in: t!("board.sign_in").to_string(),
        rows: duty.iter().map(BoardRow::from_assignment).collect(),
    };

    Ok(Html(page.render()?))
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Handler for the login form page
pub async fn login_form(
    query: Result<Query<LoginQuery>, QueryRejection>,
) -> DutyResult<Html<String>> {
    // Only known codes are displayed, anything else in the query is ignored
    let error = query_params(query)
        .unwrap_or_default()
        .error
        .filter(|code| LOGIN_ERRORS.contains(&code.as_str()))
        .map(|code| match code.as_str() {
            "login_failed" => t!("errors.login_failed").to_string(),
            _ => t!("errors.invalid_credentials").to_string(),
        });

    let page = LoginTemplate {
        lang: (*rust_i18n::locale()).to_string(),
        title: t!("login.title").to_string(),
        username_label: t!("login.username").to_string(),
        password_label: t!("login.password").to_string(),
        submit: t!("login.submit").to_string(),
        error,
    };

    Ok(Html(page.render()?))
}

/// Handler for login form submission
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<Credentials>, FormRejection>,
) -> impl IntoResponse {
    let credentials = match form_body(form) {
        Ok(credentials) => credentials,
        Err(e) => {
            debug!("Rejected login form: {}", e);
            return (clear_session(jar), login_redirect(LOGIN_ERRORS[0]));
        }
    };

    match state.auth.authenticate(&credentials) {
        Ok(token) => {
            info!("User {} signed in", credentials.username);
            let cookie = Cookie::build((AUTH_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Strict);
            (jar.add(cookie), Redirect::to("/"))
        }
        Err(e) => {
            let code = if e.category() == ErrorCategory::Unauthorized {
                LOGIN_ERRORS[0]
            } else {
                error!("Authentication error: {:?}", e);
                LOGIN_ERRORS[1]
            };
            (clear_session(jar), login_redirect(code))
        }
    }
}

/// Drop the session cookie and go back to the board
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (clear_session(jar), Redirect::to("/"))
}

fn login_redirect(code: &str) -> Redirect {
    Redirect::to(&format!("/login?error={}", urlencoding::encode(code)))
}

fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(AUTH_COOKIE).path("/"))
}

pub async fn health() -> &'static str {
    "OK"
}
