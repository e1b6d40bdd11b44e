use crate::api::error_status;
use crate::services::materializer::{MaterializeSummary, RegeneratedPost};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct MaterializeRequest {
    /// First day of the target month, `YYYY-MM-01`.
    pub month: String,
    #[serde(default)]
    pub force: bool,
}

pub async fn materialize_month(
    State(state): State<AppState>,
    Path(brand_id): Path<i32>,
    Json(request): Json<MaterializeRequest>,
) -> Result<Json<MaterializeSummary>, StatusCode> {
    let summary = state
        .materializer
        .materialize_month(brand_id, &request.month, request.force)
        .await
        .map_err(|e| {
            tracing::error!("Materialization for brand {} failed: {}", brand_id, e);
            error_status(&e)
        })?;

    Ok(Json(summary))
}

pub async fn regenerate_post_job(
    State(state): State<AppState>,
    Path(post_job_id): Path<i32>,
) -> Result<Json<RegeneratedPost>, StatusCode> {
    let regenerated = state
        .materializer
        .regenerate_post_job(post_job_id)
        .await
        .map_err(|e| {
            tracing::warn!("Regenerate of post job {} failed: {}", post_job_id, e);
            error_status(&e)
        })?;

    Ok(Json(regenerated))
}
