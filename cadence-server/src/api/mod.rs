pub mod assets_api;
pub mod brands_api;
pub mod materialize_api;
pub mod posts_api;
pub mod rules_api;

use crate::error::ScheduleError;
use crate::AppState;
use axum::{
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        // Brands
        .route("/brands", get(brands_api::list_brands))
        .route("/brands", post(brands_api::create_brand))
        .route("/brands/:id", get(brands_api::get_brand))
        .route(
            "/brands/:id/subcategories",
            get(brands_api::list_subcategories).post(brands_api::create_subcategory),
        )
        // Rules
        .route(
            "/brands/:id/rules",
            get(rules_api::list_rules).post(rules_api::create_rule),
        )
        .route("/rules/:id", delete(rules_api::delete_rule))
        .route("/rules/:id/active", post(rules_api::set_rule_active))
        .route("/rules/:id/preview", get(rules_api::preview_rule))
        // Assets
        .route(
            "/brands/:id/assets",
            get(assets_api::list_assets).post(assets_api::create_asset),
        )
        .route("/assets/:id", delete(assets_api::delete_asset))
        // Materialization
        .route(
            "/brands/:id/materialize",
            post(materialize_api::materialize_month),
        )
        .route(
            "/post-jobs/:id/regenerate",
            post(materialize_api::regenerate_post_job),
        )
        // Drafts and post jobs
        .route("/brands/:id/drafts", get(posts_api::list_drafts))
        .route("/brands/:id/post-jobs", get(posts_api::list_post_jobs))
}

/// HTTP status for a scheduling error.
pub fn error_status(err: &ScheduleError) -> StatusCode {
    match err {
        ScheduleError::InvalidRequest(_)
        | ScheduleError::RuleValidation { .. }
        | ScheduleError::InvalidTimezone(_) => StatusCode::BAD_REQUEST,
        ScheduleError::BrandNotFound(_) | ScheduleError::NotFound(_) => StatusCode::NOT_FOUND,
        ScheduleError::PersistenceConflict(_) => StatusCode::CONFLICT,
        ScheduleError::ContentGeneration(_) => StatusCode::BAD_GATEWAY,
        ScheduleError::Database(_) | ScheduleError::Pool(_) | ScheduleError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
