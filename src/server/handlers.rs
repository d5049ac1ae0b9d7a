//! Request handlers. Each one builds a request context, calls the service
//! and lets [`AdError`]'s `IntoResponse` render failures.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::AppState;
use crate::core::error::{AdError, AdResult};
use crate::core::types::{Advertisement, NewAdvertisement};

/// Body of a listing response
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub items: Vec<Advertisement>,
}

fn body(payload: Result<Json<NewAdvertisement>, JsonRejection>) -> AdResult<NewAdvertisement> {
    payload
        .map(|Json(ad)| ad)
        .map_err(|rejection| AdError::validation("body", rejection.body_text()))
}

pub async fn create_ad(
    State(state): State<AppState>,
    payload: Result<Json<NewAdvertisement>, JsonRejection>,
) -> AdResult<(StatusCode, Json<Advertisement>)> {
    let ad = state.service.create(&state.context(), body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(ad)))
}

pub async fn list_ads(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AdResult<Json<ListResponse>> {
    let items = state.service.list(&state.context(), &params).await?;
    Ok(Json(ListResponse { items }))
}

pub async fn get_ad(State(state): State<AppState>, Path(id): Path<String>) -> AdResult<Json<Advertisement>> {
    let ad = state.service.get(&state.context(), &id).await?;
    Ok(Json(ad))
}

pub async fn update_ad(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NewAdvertisement>, JsonRejection>,
) -> AdResult<Json<Advertisement>> {
    let ad = state.service.update(&state.context(), &id, body(payload)?).await?;
    Ok(Json(ad))
}

pub async fn delete_ad(State(state): State<AppState>, Path(id): Path<String>) -> AdResult<StatusCode> {
    state.service.delete(&state.context(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 200 when both stores answer, 503 otherwise
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.service.health(&state.context()).await;
    let status = if report.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(report))
}
