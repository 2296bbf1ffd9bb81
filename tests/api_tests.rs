mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::*;
use efimeries::store::Directory;
use efimeries::web::{self, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_with(directory: Directory) -> Router {
    web::router(AppState::new(directory, monday_morning(), auth_config()))
}

fn app() -> Router {
    app_with(memory_directory())
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };
    (status, body)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create(app: &Router, token: &str, uri: &str, body: Value) -> Value {
    let (status, body) = send(app, request(Method::POST, uri, Some(token), Some(body))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

#[tokio::test]
async fn test_directory_requires_authentication() {
    let app = app();

    for (method, uri) in [
        (Method::GET, "/api/teachers"),
        (Method::GET, "/api/locations"),
        (Method::GET, "/api/schedules"),
        (Method::GET, "/api/absences"),
        (Method::DELETE, "/api/substitutions/00000000-0000-0000-0000-000000000000"),
    ] {
        let (status, body) = send(&app, request(method, uri, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "unauthorized");
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }
}

#[tokio::test]
async fn test_unauthorized_post_writes_nothing() {
    let app = app();
    let (status, _) = send(
        &app,
        request(Method::POST, "/api/teachers", None, Some(json!({ "name": "Intruder" }))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app).await;
    let (_, teachers) = send(&app, request(Method::GET, "/api/teachers", Some(&token), None)).await;
    assert_eq!(teachers, json!([]));
}

#[tokio::test]
async fn test_bad_credentials_and_tokens_are_rejected() {
    let app = app();

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": "admin", "password": "wrong" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = send(
        &app,
        request(Method::GET, "/api/teachers", Some("not-a-token"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_teacher_crud() {
    let app = app();
    let token = login(&app).await;

    let teacher = create(
        &app,
        &token,
        "/api/teachers",
        json!({ "name": "  Μαρία Παναγού ", "email": "mp@example.gr" }),
    )
    .await;
    assert_eq!(teacher["name"], "Μαρία Παναγού");
    let id = teacher["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        request(
            Method::PUT,
            &format!("/api/teachers/{}", id),
            Some(&token),
            Some(json!({ "name": "Μαρία Παναγού", "subject": "Φιλόλογος" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["subject"], "Φιλόλογος");
    assert_eq!(updated["email"], Value::Null);

    let (status, body) = send(
        &app,
        request(Method::DELETE, &format!("/api/teachers/{}", id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(
        &app,
        request(Method::DELETE, &format!("/api/teachers/{}", id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_validation_failures() {
    let app = app();
    let token = login(&app).await;

    // Missing teacherId
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/schedules",
            Some(&token),
            Some(json!({ "dayOfWeek": 1, "startTime": "10:00", "endTime": "10:15" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");

    // Blank name
    let (status, body) = send(
        &app,
        request(Method::POST, "/api/teachers", Some(&token), Some(json!({ "name": "   " }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");

    // Malformed JSON
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/locations")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");

    // Malformed id
    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            "/api/locations/not-a-uuid",
            Some(&token),
            Some(json!({ "name": "Gate" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
}

#[tokio::test]
async fn test_referenced_teacher_cannot_be_deleted() {
    let app = app();
    let token = login(&app).await;

    let teacher = create(&app, &token, "/api/teachers", json!({ "name": "Teacher A" })).await;
    let location = create(&app, &token, "/api/locations", json!({ "name": "Yard A" })).await;
    create(
        &app,
        &token,
        "/api/schedules",
        json!({
            "teacherId": teacher["id"],
            "locationId": location["id"],
            "isSubstitutional": false,
            "dayOfWeek": 1,
            "startTime": "10:00",
            "endTime": "10:15"
        }),
    )
    .await;

    let (status, body) = send(
        &app,
        request(
            Method::DELETE,
            &format!("/api/teachers/{}", teacher["id"].as_str().unwrap()),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_current_duty_is_public() {
    let app = app();
    let token = login(&app).await;

    let (status, body) = send(&app, request(Method::GET, "/api/schedules/current", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let a = create(&app, &token, "/api/teachers", json!({ "name": "Teacher A" })).await;
    let b = create(&app, &token, "/api/teachers", json!({ "name": "Teacher B" })).await;
    let yard = create(&app, &token, "/api/locations", json!({ "name": "Yard A" })).await;
    create(
        &app,
        &token,
        "/api/schedules",
        json!({
            "teacherId": a["id"],
            "locationId": yard["id"],
            "dayOfWeek": 1,
            "startTime": "10:00",
            "endTime": "10:15"
        }),
    )
    .await;
    create(
        &app,
        &token,
        "/api/schedules",
        json!({
            "teacherId": b["id"],
            "isSubstitutional": true,
            "dayOfWeek": 1,
            "startTime": "08:00",
            "endTime": "14:00"
        }),
    )
    .await;
    let absence = create(
        &app,
        &token,
        "/api/absences",
        json!({ "teacherId": a["id"], "date": MONDAY, "reason": "Sick leave" }),
    )
    .await;
    assert_eq!(absence["teacher"]["name"], "Teacher A");

    let (status, body) = send(&app, request(Method::GET, "/api/schedules/current", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let duty = body.as_array().unwrap();
    assert_eq!(duty.len(), 1);
    assert_eq!(duty[0]["teacher"]["name"], "Teacher B");
    assert_eq!(duty[0]["originalTeacher"]["name"], "Teacher A");
    assert_eq!(duty[0]["location"]["name"], "Yard A");
    assert_eq!(duty[0]["isSubstitute"], true);
    assert_eq!(duty[0]["absenceReason"], "Sick leave");
    assert_eq!(duty[0]["startTime"], "10:00");
}

#[tokio::test]
async fn test_duplicate_absence_conflicts_and_delete_cascades() {
    let app = app();
    let token = login(&app).await;

    let a = create(&app, &token, "/api/teachers", json!({ "name": "Teacher A" })).await;
    let c = create(&app, &token, "/api/teachers", json!({ "name": "Teacher C" })).await;
    let absence = create(
        &app,
        &token,
        "/api/absences",
        json!({ "teacherId": a["id"], "date": MONDAY }),
    )
    .await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/absences",
            Some(&token),
            Some(json!({ "teacherId": a["id"], "date": MONDAY })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let substitution = create(
        &app,
        &token,
        "/api/substitutions",
        json!({ "absenceId": absence["id"], "substituteTeacherId": c["id"] }),
    )
    .await;
    assert_eq!(substitution["substituteTeacher"]["name"], "Teacher C");

    let (_, listed) = send(
        &app,
        request(Method::GET, &format!("/api/absences?date={}", MONDAY), Some(&token), None),
    )
    .await;
    assert_eq!(listed[0]["substitutions"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        request(
            Method::DELETE,
            &format!("/api/absences/{}", absence["id"].as_str().unwrap()),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The substitution went with its absence
    let (status, _) = send(
        &app,
        request(
            Method::DELETE,
            &format!("/api/substitutions/{}", substitution["id"].as_str().unwrap()),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let app = app_with(failing_directory());

    let (status, body) = send(&app, request(Method::GET, "/api/schedules/current", None, None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert!(!body["message"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_board_renders_even_when_store_fails() {
    let app = app_with(failing_directory());

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_board_shows_current_duty() {
    let app = app();
    let token = login(&app).await;

    let a = create(&app, &token, "/api/teachers", json!({ "name": "Teacher A" })).await;
    let yard = create(&app, &token, "/api/locations", json!({ "name": "Yard A" })).await;
    create(
        &app,
        &token,
        "/api/schedules",
        json!({
            "teacherId": a["id"],
            "locationId": yard["id"],
            "dayOfWeek": 1,
            "startTime": "10:00",
            "endTime": "10:15"
        }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Teacher A"));
    assert!(html.contains("Yard A"));
    assert!(html.contains("10:00 - 10:15"));
}

#[tokio::test]
async fn test_login_form_sets_session_cookie() {
    let app = app();

    let response = app
        .clone()
        .oneshot(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=admin&password=password"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    let session = set_cookie.split(';').next().unwrap().to_string();
    assert!(session.starts_with("auth_token="));

    // The cookie alone opens the directory
    let response = app
        .oneshot(
            Request::get("/api/teachers")
                .header(header::COOKIE, session)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_failed_login_redirects_with_error() {
    let app = app();

    let response = app
        .clone()
        .oneshot(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=admin&password=nope"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?error=invalid_credentials"
    );

    let response = app
        .oneshot(
            Request::get("/login?error=invalid_credentials")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_incomplete_login_form_redirects_with_error() {
    let app = app();

    let response = app
        .clone()
        .oneshot(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=admin"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/login?error=invalid_credentials"
    );

    // A repeated error code is ignored rather than rejected
    let response = app
        .oneshot(
            Request::get("/login?error=a&error=b")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_absence_query_is_validation_failure() {
    let app = app();
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            "/api/absences?date=2025-03-10&date=2025-03-11",
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_failed");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}
