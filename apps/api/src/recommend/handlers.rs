use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::RecommendResponse;
use crate::errors::AppError;
use crate::extract::extract_text_from_url;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendParams {
    pub query: Option<String>,
    pub url: Option<String>,
}

/// GET /api/recommend?query=… or ?url=…
/// `url` wins when both are supplied; its page text becomes the query.
pub async fn handle_recommend(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> Result<Json<RecommendResponse>, AppError> {
    let query_text = match (&params.url, &params.query) {
        (Some(url), _) if !url.trim().is_empty() => {
            extract_text_from_url(&state.http, url).await
        }
        (_, Some(query)) => query.clone(),
        _ => return Err(AppError::Validation("No query or URL provided".to_string())),
    };
    Ok(Json(state.engine.recommend(&query_text).await))
}

/// GET /api/assessments — full catalog dump for testing and debugging.
pub async fn handle_list_assessments(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "assessments": state.catalog.records }))
}
