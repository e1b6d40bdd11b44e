use crate::models::{Brand, NewBrand, NewSubcategory, Subcategory};
use crate::services::timezone;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;

pub async fn list_brands(State(state): State<AppState>) -> Result<Json<Vec<Brand>>, StatusCode> {
    use crate::schema::brands::dsl::*;

    let mut conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let results = brands
        .order(id.asc())
        .select(Brand::as_select())
        .load(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(results))
}

pub async fn get_brand(
    State(state): State<AppState>,
    Path(brand_id): Path<i32>,
) -> Result<Json<Brand>, StatusCode> {
    use crate::schema::brands::dsl::*;

    let mut conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let brand = brands
        .filter(id.eq(brand_id))
        .select(Brand::as_select())
        .first(&mut conn)
        .optional()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(brand))
}

pub async fn create_brand(
    State(state): State<AppState>,
    Json(new_brand): Json<NewBrand>,
) -> Result<Json<Brand>, StatusCode> {
    use crate::schema::brands;

    // Reject unknown zones up front; at materialization time they only warn.
    if timezone::parse_zone(&new_brand.timezone).is_err() {
        tracing::warn!("Rejected brand with timezone '{}'", new_brand.timezone);
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let brand = diesel::insert_into(brands::table)
        .values(&new_brand)
        .returning(Brand::as_select())
        .get_result(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(brand))
}

pub async fn list_subcategories(
    State(state): State<AppState>,
    Path(owner): Path<i32>,
) -> Result<Json<Vec<Subcategory>>, StatusCode> {
    use crate::schema::subcategories::dsl::*;

    let mut conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let results = subcategories
        .filter(brand_id.eq(owner))
        .order(name.asc())
        .select(Subcategory::as_select())
        .load(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(results))
}

#[derive(Deserialize)]
pub struct SubcategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub default_hashtags: Option<Vec<String>>,
}

pub async fn create_subcategory(
    State(state): State<AppState>,
    Path(owner): Path<i32>,
    Json(input): Json<SubcategoryInput>,
) -> Result<Json<Subcategory>, StatusCode> {
    use crate::schema::subcategories;

    if input.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let default_hashtags = input
        .default_hashtags
        .map(|tags| serde_json::to_string(&tags))
        .transpose()
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let mut conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let subcategory = diesel::insert_into(subcategories::table)
        .values(&NewSubcategory {
            brand_id: owner,
            name: input.name.trim().to_string(),
            description: input.description,
            default_hashtags,
        })
        .returning(Subcategory::as_select())
        .get_result(&mut conn)
        .map_err(|e| {
            tracing::error!("Failed to create subcategory for brand {}: {}", owner, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(subcategory))
}
