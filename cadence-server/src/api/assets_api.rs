use crate::models::{Asset, NewAsset};
use crate::services::channels::MediaType;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;

pub async fn list_assets(
    State(state): State<AppState>,
    Path(owner): Path<i32>,
) -> Result<Json<Vec<Asset>>, StatusCode> {
    use crate::schema::assets::dsl::*;

    let mut conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let results = assets
        .filter(brand_id.eq(owner))
        .order(id.asc())
        .select(Asset::as_select())
        .load(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(results))
}

#[derive(Deserialize)]
pub struct AssetInput {
    pub url: String,
    pub asset_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

pub async fn create_asset(
    State(state): State<AppState>,
    Path(owner): Path<i32>,
    Json(input): Json<AssetInput>,
) -> Result<Json<Asset>, StatusCode> {
    use crate::schema::assets;

    let media = MediaType::parse(&input.asset_type).ok_or(StatusCode::BAD_REQUEST)?;
    let tags = serde_json::to_string(&input.tags).map_err(|_| StatusCode::BAD_REQUEST)?;

    let mut conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let asset = diesel::insert_into(assets::table)
        .values(&NewAsset {
            brand_id: owner,
            url: input.url,
            asset_type: media.as_str().to_string(),
            tags: Some(tags),
            width: input.width,
            height: input.height,
        })
        .returning(Asset::as_select())
        .get_result(&mut conn)
        .map_err(|e| {
            tracing::error!("Failed to create asset for brand {}: {}", owner, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(asset))
}

pub async fn delete_asset(
    State(state): State<AppState>,
    Path(asset_id): Path<i32>,
) -> Result<StatusCode, StatusCode> {
    use crate::schema::{asset_usage, assets};

    let mut conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let deleted = diesel::delete(assets::table.filter(assets::id.eq(asset_id)))
        .execute(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if deleted == 0 {
        return Err(StatusCode::NOT_FOUND);
    }

    // Stale history only loses rotation fairness, so a failure here is not fatal.
    if let Err(e) = diesel::delete(asset_usage::table.filter(asset_usage::asset_id.eq(asset_id)))
        .execute(&mut conn)
    {
        tracing::warn!("Failed to clear usage history for asset {}: {}", asset_id, e);
    }

    Ok(StatusCode::NO_CONTENT)
}
