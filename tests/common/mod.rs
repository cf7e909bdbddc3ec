// Shared helpers for integration tests: an in-memory application with a
// manually driven clock
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use fitness_tracker::api::{create_routes, AppState};
use fitness_tracker::config::{AppConfig, LevelSettings, StorageBackend};
use fitness_tracker::services::{FixedClock, RoutineCatalog};
use fitness_tracker::storage::Storage;

pub const TEST_SECRET: &str = "test_secret_key_for_testing_only";
pub const TEST_PASSWORD: &str = "secret123";

/// Wednesday; the surrounding week starts on Sunday 2024-03-03
pub fn wednesday() -> DateTime<Utc> {
    at("2024-03-06T10:00:00Z")
}

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        environment: "test".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        bcrypt_cost: 4,
        storage_backend: StorageBackend::Memory,
        ..AppConfig::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::starting_at(wednesday())
    }

    pub fn starting_at(now: DateTime<Utc>) -> Self {
        let clock = Arc::new(FixedClock::new(now));
        let state = AppState::new(
            Storage::memory(),
            &test_config(),
            LevelSettings::default(),
            RoutineCatalog::bundled().unwrap(),
            clock.clone(),
        )
        .unwrap();

        Self {
            router: create_routes(state.clone()),
            state,
            clock,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
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

    /// Register a user and return the bearer token
    pub async fn register(&self, email: &str, level: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "name": "Test Athlete",
                    "email": email,
                    "password": TEST_PASSWORD,
                    "activityLevel": level,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn complete_routine(&self, token: &str, routine_ref: &str, level: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/progress/routines",
            Some(token),
            Some(json!({
                "routineRef": routine_ref,
                "routineName": routine_ref,
                "level": level,
            })),
        )
        .await
    }
}
