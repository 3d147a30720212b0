//! Axum request handlers for the HTTP API.
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::api::routes::AppState;
use crate::error::{AppError, AppResult};
use crate::store::{ExportPayload, Saying, SayingEntry};

/// Turn axum's body rejection into our validation error so callers always
/// get the JSON error shape.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Same for a non-numeric `:id` segment.
fn saying_id(path: Result<Path<i64>, PathRejection>) -> AppResult<i64> {
    path.map(|Path(id)| id)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

pub async fn root() -> &'static str {
    "Sayings Image API"
}

pub async fn list_sayings(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Saying>>> {
    state.store.list().await.map(Json)
}

pub async fn get_saying(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Saying>> {
    let id = saying_id(id)?;
    state.store.get(id).await.map(Json)
}

pub async fn create_saying(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SayingEntry>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let entry = json_body(payload)?;
    let created = state.store.create(&entry.saying, &entry.prompt).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_saying(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<SayingEntry>, JsonRejection>,
) -> AppResult<Json<Saying>> {
    let id = saying_id(id)?;
    let entry = json_body(payload)?;
    state.store.update(id, &entry.saying, &entry.prompt).await.map(Json)
}

pub async fn delete_saying(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<StatusCode> {
    let id = saying_id(id)?;
    let removed = state.store.delete(id).await?;
    if let Some(image_path) = removed.image_path.as_deref() {
        state.generation.storage().remove(image_path).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Saying>> {
    let id = saying_id(id)?;
    state.generation.generate(id).await.map(Json)
}

pub async fn preview_prompt(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<serde_json::Value>> {
    let id = saying_id(id)?;
    let prompt = state.generation.preview_prompt(id).await?;
    Ok(Json(json!({ "prompt": prompt })))
}

pub async fn export_sayings(State(state): State<Arc<AppState>>) -> AppResult<Json<ExportPayload>> {
    state.store.export_all().await.map(Json)
}

pub async fn import_sayings(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExportPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let payload = json_body(payload)?;
    let imported = state.store.import_sayings(&payload.sayings).await?;
    Ok((StatusCode::CREATED, Json(imported)))
}
