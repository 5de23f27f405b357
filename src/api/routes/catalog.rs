use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::catalog::{CatalogStore, NewEgg, NewLevel, NewMob};
use crate::models::{Catalog, Egg, LevelThreshold, Mob, Snapshot};

#[derive(Debug, Deserialize)]
pub struct SaveCatalogRequest {
    #[serde(flatten)]
    pub catalog: Catalog,

    #[serde(rename = "expectedVersion")]
    pub expected_version: u64,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: u64,
}

#[derive(Debug, Serialize)]
pub struct AddedResponse<T> {
    pub version: u64,
    pub entry: T,
}

pub async fn get_catalog(State(state): State<AppState>) -> Result<Json<Snapshot>, ApiError> {
    let (catalog, version) = state.sync.load().await?;
    Ok(Json(Snapshot::new(catalog, version)))
}

/// Replace the whole catalog. Fails with 409 when `expectedVersion` is stale.
pub async fn save_catalog(
    State(state): State<AppState>,
    payload: Result<Json<SaveCatalogRequest>, JsonRejection>,
) -> Result<Json<VersionResponse>, ApiError> {
    let Json(request) = payload?;
    let store = CatalogStore::from_catalog(request.catalog)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let _guard = state.write_lock.lock().await;
    let version = state
        .sync
        .save(store.catalog(), request.expected_version)
        .await?;

    Ok(Json(VersionResponse { version }))
}

pub async fn add_mob(
    State(state): State<AppState>,
    payload: Result<Json<NewMob>, JsonRejection>,
) -> Result<Json<AddedResponse<Mob>>, ApiError> {
    let Json(input) = payload?;
    let _guard = state.write_lock.lock().await;
    let (entry, version) = state
        .sync
        .update(|store| store.add_mob(input.clone()).cloned())
        .await?;

    Ok(Json(AddedResponse { version, entry }))
}

pub async fn add_egg(
    State(state): State<AppState>,
    payload: Result<Json<NewEgg>, JsonRejection>,
) -> Result<Json<AddedResponse<Egg>>, ApiError> {
    let Json(input) = payload?;
    let _guard = state.write_lock.lock().await;
    let (entry, version) = state
        .sync
        .update(|store| store.add_egg(input.clone()).cloned())
        .await?;

    Ok(Json(AddedResponse { version, entry }))
}

pub async fn add_level(
    State(state): State<AppState>,
    payload: Result<Json<NewLevel>, JsonRejection>,
) -> Result<Json<AddedResponse<LevelThreshold>>, ApiError> {
    let Json(input) = payload?;
    let _guard = state.write_lock.lock().await;
    let (entry, version) = state
        .sync
        .update(|store| store.add_level(input.clone()).cloned())
        .await?;

    Ok(Json(AddedResponse { version, entry }))
}
