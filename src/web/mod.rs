pub mod api;
pub mod auth;
pub mod error;
pub mod pages;

use crate::directory::DirectoryService;
use crate::duty::DutyService;
use crate::store::Directory;
use crate::utils::time::SchoolClock;
use auth::{AuthConfig, AuthService};
use axum::routing::{delete, get, post, put};
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    /// Validated CRUD over the directory
    pub directory_service: DirectoryService,
    /// Current-duty resolution
    pub duty: DutyService,
    /// Auth service for JWT operations
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(directory: Directory, clock: SchoolClock, auth: AuthConfig) -> Self {
        Self {
            directory_service: DirectoryService::new(directory.clone()),
            duty: DutyService::new(directory, clock),
            auth: Arc::new(AuthService::new(auth)),
        }
    }
}

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(pages::duty_board))
        .route("/login", get(pages::login_form).post(pages::login))
        .route("/logout", post(pages::logout))
        .route("/health", get(pages::health))
        .route("/api/auth/login", post(api::login))
        .route("/api/schedules/current", get(api::current_duty));

    // Everything that reads or changes the directory needs a session
    let protected = Router::new()
        .route(
            "/api/teachers",
            get(api::list_teachers).post(api::create_teacher),
        )
        .route(
            "/api/teachers/{id}",
            put(api::update_teacher).delete(api::delete_teacher),
        )
        .route(
            "/api/locations",
            get(api::list_locations).post(api::create_location),
        )
        .route(
            "/api/locations/{id}",
            put(api::update_location).delete(api::delete_location),
        )
        .route(
            "/api/schedules",
            get(api::list_schedules).post(api::create_schedule),
        )
        .route(
            "/api/schedules/{id}",
            put(api::update_schedule).delete(api::delete_schedule),
        )
        .route(
            "/api/absences",
            get(api::list_absences).post(api::create_absence),
        )
        .route(
            "/api/absences/{id}",
            put(api::update_absence).delete(api::delete_absence),
        )
        .route("/api/substitutions", post(api::create_substitution))
        .route("/api/substitutions/{id}", delete(api::delete_substitution))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
