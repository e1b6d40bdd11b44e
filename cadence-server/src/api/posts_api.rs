use crate::models::{Draft, PostJob, PostJobStatus};
use crate::services::recurrence::MonthWindow;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct PostJobQuery {
    /// Limit to jobs scheduled in this month (`YYYY-MM`).
    pub month: Option<String>,
    pub status: Option<String>,
}

pub async fn list_post_jobs(
    State(state): State<AppState>,
    Path(owner): Path<i32>,
    Query(query): Query<PostJobQuery>,
) -> Result<Json<Vec<PostJob>>, StatusCode> {
    use crate::schema::post_jobs::dsl::*;

    let mut conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut sql = post_jobs.filter(brand_id.eq(owner)).into_boxed();

    if let Some(month) = &query.month {
        let window = MonthWindow::parse(month).map_err(|_| StatusCode::BAD_REQUEST)?;
        sql = sql
            .filter(scheduled_at.ge(window.start_instant().naive_utc()))
            .filter(scheduled_at.le(window.end_instant().naive_utc()));
    }
    if let Some(wanted) = &query.status {
        let wanted = PostJobStatus::parse(wanted).ok_or(StatusCode::BAD_REQUEST)?;
        sql = sql.filter(status.eq(wanted.as_str()));
    }

    let results = sql
        .order((scheduled_at.asc(), channel.asc()))
        .select(PostJob::as_select())
        .load(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(results))
}

#[derive(Deserialize)]
pub struct DraftQuery {
    pub rule_id: Option<i32>,
}

pub async fn list_drafts(
    State(state): State<AppState>,
    Path(owner): Path<i32>,
    Query(query): Query<DraftQuery>,
) -> Result<Json<Vec<Draft>>, StatusCode> {
    use crate::schema::drafts::dsl::*;

    let mut conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut sql = drafts.filter(brand_id.eq(owner)).into_boxed();
    if let Some(rule) = query.rule_id {
        sql = sql.filter(schedule_rule_id.eq(rule));
    }

    let results = sql
        .order(id.asc())
        .select(Draft::as_select())
        .load(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(results))
}
