//! HTTP-level tests for the EduTrack API
//!
//! Each test builds the full router over temporary SQLite files and drives
//! it with `oneshot`, so no port is bound.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use edutrack_backend::{
    api::create_router,
    auth::{AuthGateway, SeedAccount, JwtHandler, UserRole, UserStore},
    middleware::{RateLimitConfig, RateLimitLayer, REQUEST_ID_HEADER},
    service::ResultService,
    students::StudentStore,
};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tempfile::NamedTempFile;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    _auth_db: NamedTempFile,
    _records_db: NamedTempFile,
}

fn test_app() -> TestApp {
    test_app_with_limit(RateLimitConfig::default())
}

fn test_app_with_limit(limit: RateLimitConfig) -> TestApp {
    let auth_db = NamedTempFile::new().unwrap();
    let records_db = NamedTempFile::new().unwrap();

    let users = UserStore::with_cost(auth_db.path().to_str().unwrap(), 4).unwrap();
    users.ensure_default_admin(&SeedAccount::default_admin()).unwrap();
    users
        .create_user("Asha", "a@x.com", "student123", UserRole::Student)
        .unwrap();
    users
        .create_user("Ben", "b@x.com", "student123", UserRole::Student)
        .unwrap();

    let gateway = Arc::new(AuthGateway::new(
        Arc::new(users),
        Arc::new(JwtHandler::new("integration-test-secret".to_string())),
    ));
    let store = Arc::new(StudentStore::new(records_db.path().to_str().unwrap()).unwrap());
    let service = ResultService::new(gateway, store);

    TestApp {
        router: create_router(service, RateLimitLayer::new(limit)),
        _auth_db: auth_db,
        _records_db: records_db,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_raw(request).await
    }

    async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        self.login("admin@edutrack.com", "admin123").await
    }
}

fn student_body(email: &str, roll: &str, marks: (u8, u8, u8)) -> Value {
    json!({
        "name": "Asha",
        "email": email,
        "rollNumber": roll,
        "mathMarks": marks.0,
        "scienceMarks": marks.1,
        "englishMarks": marks.2,
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let app = test_app();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_login_response_shape() {
    let app = test_app();
    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "admin@edutrack.com", "password": "admin123" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "ADMIN");
    assert_eq!(body["email"], "admin@edutrack.com");
    assert_eq!(body["name"], "Administrator");
    assert_eq!(body["expiresIn"], 24 * 3600);
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_login_is_unauthorized() {
    let app = test_app();

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "admin@edutrack.com", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");

    // Unknown account fails identically
    let (status, unknown) = app
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "ghost@x.com", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, body);
}

#[tokio::test]
async fn test_admin_create_then_list() {
    let app = test_app();
    let admin = app.admin_token().await;

    let (status, created) = app
        .send(
            Method::POST,
            "/students",
            Some(&admin),
            Some(student_body("a@x.com", "R1", (90, 85, 95))),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["totalMarks"], 270);
    assert_eq!(created["percentage"], 90.0);
    assert_eq!(created["grade"], "A+");
    assert_eq!(created["rollNumber"], "R1");

    let (status, list) = app.send(Method::GET, "/students", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0], created);

    let id = created["id"].as_i64().unwrap();
    let (status, fetched) = app
        .send(Method::GET, &format!("/students/{}", id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_duplicate_roll_number_conflicts() {
    let app = test_app();
    let admin = app.admin_token().await;

    app.send(
        Method::POST,
        "/students",
        Some(&admin),
        Some(student_body("a@x.com", "R1", (90, 85, 95))),
    )
    .await;

    let (status, body) = app
        .send(
            Method::POST,
            "/students",
            Some(&admin),
            Some(student_body("b@x.com", "R1", (10, 10, 10))),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_roll_number");

    let (_, list) = app.send(Method::GET, "/students", Some(&admin), None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_validation_errors_list_fields() {
    let app = test_app();
    let admin = app.admin_token().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/students",
            Some(&admin),
            Some(json!({
                "name": "",
                "email": "not-an-email",
                "rollNumber": "R9",
                "mathMarks": 101,
                "scienceMarks": 50,
                "englishMarks": 50,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"mathMarks"));
    assert!(!fields.contains(&"scienceMarks"));
}

#[tokio::test]
async fn test_marks_accept_numeric_strings() {
    let app = test_app();
    let admin = app.admin_token().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/students",
            Some(&admin),
            Some(json!({
                "name": "Asha",
                "email": "a@x.com",
                "rollNumber": "R1",
                "mathMarks": "40",
                "scienceMarks": 40.0,
                "englishMarks": 40,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["mathMarks"], 40);
    assert_eq!(body["grade"], "C");
}

#[tokio::test]
async fn test_missing_or_null_fields_are_validation_errors() {
    let app = test_app();
    let admin = app.admin_token().await;
    let (_, created) = app
        .send(
            Method::POST,
            "/students",
            Some(&admin),
            Some(student_body("a@x.com", "R1", (90, 85, 95))),
        )
        .await;
    let path = format!("/students/{}", created["id"]);

    // Full replace without englishMarks
    let (status, body) = app
        .send(
            Method::PUT,
            &path,
            Some(&admin),
            Some(json!({
                "name": "Asha",
                "email": "a@x.com",
                "rollNumber": "R1",
                "mathMarks": 40,
                "scienceMarks": 40,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(
        body["details"],
        json!([{ "field": "englishMarks", "message": "is required" }])
    );

    let (_, unchanged) = app.send(Method::GET, &path, Some(&admin), None).await;
    assert_eq!(unchanged, created);

    let mut null_name = student_body("b@x.com", "R2", (50, 50, 50));
    null_name["name"] = Value::Null;
    let (status, body) = app
        .send(Method::POST, "/students", Some(&admin), Some(null_name))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "name");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app();
    let admin = app.admin_token().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/students")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = app.send_raw(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_student_sees_only_own_result() {
    let app = test_app();
    let admin = app.admin_token().await;

    app.send(
        Method::POST,
        "/students",
        Some(&admin),
        Some(student_body("a@x.com", "R1", (90, 85, 95))),
    )
    .await;
    app.send(
        Method::POST,
        "/students",
        Some(&admin),
        Some(student_body("b@x.com", "R2", (30, 30, 30))),
    )
    .await;

    let token = app.login("a@x.com", "student123").await;
    let (status, mine) = app
        .send(Method::GET, "/students/my-result", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["email"], "a@x.com");
    assert_eq!(mine["rollNumber"], "R1");

    let (status, body) = app.send(Method::GET, "/students", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_student_without_record_gets_not_found() {
    let app = test_app();
    let token = app.login("b@x.com", "student123").await;

    let (status, body) = app
        .send(Method::GET, "/students/my-result", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_student_cannot_mutate() {
    let app = test_app();
    let admin = app.admin_token().await;
    let (_, created) = app
        .send(
            Method::POST,
            "/students",
            Some(&admin),
            Some(student_body("a@x.com", "R1", (90, 85, 95))),
        )
        .await;
    let path = format!("/students/{}", created["id"]);

    let token = app.login("a@x.com", "student123").await;
    let body = student_body("a@x.com", "R1", (100, 100, 100));

    let cases = [
        (Method::POST, "/students".to_string(), Some(body.clone())),
        (Method::PUT, path.clone(), Some(body.clone())),
        (Method::DELETE, path.clone(), None),
        (Method::GET, path.clone(), None),
    ];
    for (method, uri, payload) in cases {
        let (status, _) = app.send(method.clone(), &uri, Some(&token), payload).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, uri);
    }

    // Role is checked before the body is parsed
    let request = Request::builder()
        .method(Method::POST)
        .uri("/students")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("garbage"))
        .unwrap();
    let (status, _) = app.send_raw(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, unchanged) = app.send(Method::GET, &path, Some(&admin), None).await;
    assert_eq!(unchanged, created);
}

#[tokio::test]
async fn test_admin_has_no_own_result() {
    let app = test_app();
    let admin = app.admin_token().await;

    let (status, _) = app
        .send(Method::GET, "/students/my-result", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_and_invalid_tokens() {
    let app = test_app();

    let (status, body) = app.send(Method::GET, "/students", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");

    let (status, body) = app
        .send(Method::GET, "/students", Some("not.a.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_or_expired_token");
}

#[tokio::test]
async fn test_update_recomputes_derived_fields() {
    let app = test_app();
    let admin = app.admin_token().await;
    let (_, created) = app
        .send(
            Method::POST,
            "/students",
            Some(&admin),
            Some(student_body("a@x.com", "R1", (90, 85, 95))),
        )
        .await;
    let path = format!("/students/{}", created["id"]);

    let (status, updated) = app
        .send(
            Method::PUT,
            &path,
            Some(&admin),
            Some(student_body("a@x.com", "R1", (40, 40, 40))),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["totalMarks"], 120);
    assert_eq!(updated["percentage"], 40.0);
    assert_eq!(updated["grade"], "C");

    // Same payload again changes nothing
    let (_, again) = app
        .send(
            Method::PUT,
            &path,
            Some(&admin),
            Some(student_body("a@x.com", "R1", (40, 40, 40))),
        )
        .await;
    assert_eq!(again, updated);
}

#[tokio::test]
async fn test_delete_then_update_is_not_found() {
    let app = test_app();
    let admin = app.admin_token().await;
    let (_, created) = app
        .send(
            Method::POST,
            "/students",
            Some(&admin),
            Some(student_body("a@x.com", "R1", (90, 85, 95))),
        )
        .await;
    let path = format!("/students/{}", created["id"]);

    let (status, body) = app.send(Method::DELETE, &path, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app
        .send(
            Method::PUT,
            &path,
            Some(&admin),
            Some(student_body("a@x.com", "R1", (40, 40, 40))),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::DELETE, &path, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_id_is_bad_request() {
    let app = test_app();
    let admin = app.admin_token().await;

    let (status, body) = app
        .send(Method::GET, "/students/abc", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_current_user_from_token() {
    let app = test_app();
    let token = app.login("A@X.com", "student123").await;

    let (status, body) = app.send(Method::GET, "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "a@x.com");
    assert_eq!(body["role"], "STUDENT");
    assert_eq!(body["name"], "Asha");
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let app = test_app_with_limit(RateLimitConfig {
        max_requests: 2,
        window: Duration::from_secs(60),
        burst: 0,
    });

    for _ in 0..2 {
        let (status, _) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "admin@edutrack.com", "password": "wrong" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "admin@edutrack.com", "password": "admin123" }).to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    // Other routes are not throttled
    let (status, _) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = test_app();

    let request = Request::builder()
        .uri("/students")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let id = response.headers().get(REQUEST_ID_HEADER).unwrap();
    assert_eq!(id.len(), 32);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert!(response.headers().get(REQUEST_ID_HEADER).is_none());
}
