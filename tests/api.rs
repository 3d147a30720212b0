//! HTTP API tests driven through the router with `tower::ServiceExt::oneshot`.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{fixture, Fixture, ScriptedGenerator, FAKE_PNG};
use sayings_image_api::api::{router, AppState};
use sayings_image_api::ImageGenerator;

fn app_with(generator: Arc<dyn ImageGenerator>) -> (Fixture, Router) {
    let fx = fixture(generator);
    let state = Arc::new(AppState::new(fx.store.clone(), fx.service.clone()));
    (fx, router(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

#[tokio::test(flavor = "multi_thread")]
async fn crud_round_trip() {
    let (_fx, app) = app_with(ScriptedGenerator::ok());

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/sayings",
        Some(json!({"saying": "Hope is evergreen", "prompt": "a watercolor of %1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["image_path"], Value::Null);
    let id = created["id"].as_i64().unwrap();

    let (status, listed) = send(&app, Method::GET, "/api/sayings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/sayings/{}", id),
        Some(json!({"saying": "Hope is evergreen", "prompt": "an oil painting of %1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["prompt"], "an oil painting of %1");

    let (status, fetched) = send(&app, Method::GET, &format!("/api/sayings/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, updated);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/sayings/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, err) = send(&app, Method::DELETE, &format!("/api/sayings/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["kind"], "not_found");
}

#[tokio::test(flavor = "multi_thread")]
async fn update_unknown_id_is_404() {
    let (_fx, app) = app_with(ScriptedGenerator::ok());
    let (status, err) = send(
        &app,
        Method::PUT,
        "/api/sayings/77",
        Some(json!({"saying": "s", "prompt": "p"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["kind"], "not_found");
}

#[tokio::test(flavor = "multi_thread")]
async fn non_numeric_id_is_a_json_validation_error() {
    let (_fx, app) = app_with(ScriptedGenerator::ok());

    let (status, err) = send(&app, Method::GET, "/api/sayings/abc", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["kind"], "validation_error");

    let (status, err) = send(&app, Method::POST, "/api/sayings/abc/generate", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["kind"], "validation_error");
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_or_empty_saying_is_a_validation_error() {
    let (_fx, app) = app_with(ScriptedGenerator::ok());

    let (status, err) = send(&app, Method::POST, "/api/sayings", Some(json!({"prompt": "p"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["kind"], "validation_error");

    let (status, err) = send(
        &app,
        Method::POST,
        "/api/sayings",
        Some(json!({"saying": "", "prompt": "p"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["kind"], "validation_error");
}

#[tokio::test(flavor = "multi_thread")]
async fn generate_links_image_and_serves_it() {
    let generator = ScriptedGenerator::ok();
    let (fx, app) = app_with(generator.clone());
    fx.write_context("Use pastel tones.");
    let created = fx.store.create("Hope is evergreen", "a watercolor of %1").await.unwrap();

    let (status, prompt) =
        send(&app, Method::GET, &format!("/api/sayings/{}/prompt", created.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prompt["prompt"], "Use pastel tones.\na watercolor of Hope is evergreen");

    let (status, updated) =
        send(&app, Method::POST, &format!("/api/sayings/{}/generate", created.id), None).await;
    assert_eq!(status, StatusCode::OK);
    let image_path = updated["image_path"].as_str().unwrap().to_string();
    assert!(image_path.starts_with("/images/"));

    let response = app
        .clone()
        .oneshot(Request::builder().uri(image_path.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    assert_eq!(&bytes[..], FAKE_PNG);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_generation_reports_reason_and_keeps_record() {
    let (fx, app) = app_with(ScriptedGenerator::failing(400));
    let created = fx.store.create("blocked", "%1").await.unwrap();

    let (status, err) =
        send(&app, Method::POST, &format!("/api/sayings/{}/generate", created.id), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(err["kind"], "generation_failed");
    assert_eq!(err["reason"], "provider_error");
    assert!(err["detail"].as_str().unwrap().contains("content policy"));

    assert_eq!(fx.store.get(created.id).await.unwrap(), created);
}

#[tokio::test(flavor = "multi_thread")]
async fn generate_unknown_id_is_404() {
    let (fx, app) = app_with(ScriptedGenerator::ok());
    let (status, err) = send(&app, Method::POST, "/api/sayings/12/generate", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["kind"], "not_found");
    assert!(fx.image_files().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_generated_image() {
    let (fx, app) = app_with(ScriptedGenerator::ok());
    let created = fx.store.create("short lived", "%1").await.unwrap();
    fx.service.generate(created.id).await.unwrap();
    assert_eq!(fx.image_files().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/sayings/{}", created.id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(fx.image_files().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn import_then_export() {
    let (_fx, app) = app_with(ScriptedGenerator::ok());

    let (status, imported) = send(
        &app,
        Method::POST,
        "/api/import",
        Some(json!({"sayings": [
            {"saying": "A", "prompt": "B %1", "extra": true},
            {"saying": "C", "prompt": "D"}
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(imported.as_array().unwrap().len(), 2);
    assert_eq!(imported[0]["image_path"], Value::Null);

    let (status, exported) = send(&app, Method::GET, "/api/export", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        exported,
        json!({"sayings": [
            {"saying": "A", "prompt": "B %1"},
            {"saying": "C", "prompt": "D"}
        ]})
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn import_rejects_non_array_sayings() {
    let (fx, app) = app_with(ScriptedGenerator::ok());
    let (status, err) = send(&app, Method::POST, "/api/import", Some(json!({"sayings": "nope"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["kind"], "validation_error");
    assert!(fx.store.list().await.unwrap().is_empty());
}
