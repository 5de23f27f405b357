use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{analyze, Analysis};
use crate::models::Character;

/// Character fields as typed into the form. Every field may be partial.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisRequest {
    pub damage: String,
    pub level: String,
    pub collected_xp: String,

    /// Index of the selected egg in the catalog
    pub egg: Option<usize>,
}

pub async fn run_analysis(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<Analysis>, ApiError> {
    let Json(request) = payload?;
    let (catalog, _) = state.sync.load().await?;

    let egg = match request.egg {
        Some(index) => Some(
            catalog
                .eggs
                .get(index)
                .ok_or_else(|| ApiError::NotFound(format!("Egg #{}", index)))?,
        ),
        None => None,
    };

    let character = Character::from_input(&request.damage, &request.level, &request.collected_xp);
    let analysis = analyze(&catalog, &character, egg, chrono::Utc::now());

    Ok(Json(analysis))
}
