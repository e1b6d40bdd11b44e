use crate::api::error_status;
use crate::models::{Brand, NewScheduleRule, ScheduleRuleRow};
use crate::services::recurrence::{self, MonthWindow};
use crate::services::rules;
use crate::services::timezone::BrandZone;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

pub async fn list_rules(
    State(state): State<AppState>,
    Path(owner): Path<i32>,
) -> Result<Json<Vec<ScheduleRuleRow>>, StatusCode> {
    use crate::schema::schedule_rules::dsl::*;

    let mut conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let results = schedule_rules
        .filter(brand_id.eq(owner))
        .order(id.asc())
        .select(ScheduleRuleRow::as_select())
        .load(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(results))
}

#[derive(Serialize)]
pub struct RuleRejected {
    pub error: String,
}

/// Store a rule after it decodes cleanly, so batches only ever meet rules
/// that were valid when written.
pub async fn create_rule(
    State(state): State<AppState>,
    Path(owner): Path<i32>,
    Json(mut new_rule): Json<NewScheduleRule>,
) -> Result<Json<ScheduleRuleRow>, (StatusCode, Json<RuleRejected>)> {
    use crate::schema::schedule_rules;

    let internal = |e: String| {
        tracing::error!("Failed to store rule for brand {}: {}", owner, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(RuleRejected {
                error: "internal error".to_string(),
            }),
        )
    };

    new_rule.brand_id = owner;
    if let Err(e) = rules::parse_rule(&unsaved_row(&new_rule)) {
        return Err((
            error_status(&e),
            Json(RuleRejected {
                error: e.to_string(),
            }),
        ));
    }

    let mut conn = state.db.get().map_err(|e| internal(e.to_string()))?;

    let rule = diesel::insert_into(schedule_rules::table)
        .values(&new_rule)
        .returning(ScheduleRuleRow::as_select())
        .get_result(&mut conn)
        .map_err(|e| internal(e.to_string()))?;

    tracing::info!("Created {} rule {} for brand {}", rule.frequency, rule.id, owner);
    Ok(Json(rule))
}

pub async fn delete_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<i32>,
) -> Result<StatusCode, StatusCode> {
    use crate::schema::schedule_rules::dsl::*;

    let mut conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // Drafts and jobs reference their rule; those rules are retired instead.
    let deleted = diesel::delete(schedule_rules.filter(id.eq(rule_id)))
        .execute(&mut conn)
        .map_err(|e| {
            tracing::warn!("Could not delete rule {}: {}", rule_id, e);
            StatusCode::CONFLICT
        })?;

    if deleted == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ActiveFlag {
    pub active: bool,
}

pub async fn set_rule_active(
    State(state): State<AppState>,
    Path(rule_id): Path<i32>,
    Json(flag): Json<ActiveFlag>,
) -> Result<Json<ScheduleRuleRow>, StatusCode> {
    use crate::schema::schedule_rules::dsl::*;

    let mut conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let rule = diesel::update(schedule_rules.filter(id.eq(rule_id)))
        .set((is_active.eq(flag.active), updated_at.eq(Utc::now().naive_utc())))
        .returning(ScheduleRuleRow::as_select())
        .get_result(&mut conn)
        .optional()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(rule))
}

#[derive(Deserialize)]
pub struct PreviewQuery {
    /// `YYYY-MM` or `YYYY-MM-01`
    pub month: String,
}

#[derive(Serialize)]
pub struct PreviewSlot {
    pub local: NaiveDateTime,
    pub scheduled_at: NaiveDateTime,
}

#[derive(Serialize)]
pub struct PreviewResponse {
    pub rule_id: i32,
    pub month: String,
    pub timezone: String,
    pub slots: Vec<PreviewSlot>,
}

/// Slots a rule would produce for a month, without writing anything.
pub async fn preview_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<i32>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<PreviewResponse>, StatusCode> {
    use crate::schema::{brands, schedule_rules};

    let window = MonthWindow::parse(&query.month).map_err(|_| StatusCode::BAD_REQUEST)?;

    let mut conn = state
        .db
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let row = schedule_rules::table
        .filter(schedule_rules::id.eq(rule_id))
        .select(ScheduleRuleRow::as_select())
        .first(&mut conn)
        .optional()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let brand = brands::table
        .filter(brands::id.eq(row.brand_id))
        .select(Brand::as_select())
        .first(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let rule = rules::parse_rule(&row).map_err(|e| error_status(&e))?;
    let zone = if brand.timezone.trim().is_empty() {
        BrandZone::resolve_or_utc(&state.config.scheduler.default_timezone)
    } else {
        BrandZone::resolve_or_utc(&brand.timezone)
    };

    let slots = recurrence::expand_month(&rule, &window)
        .into_iter()
        .map(|slot| PreviewSlot {
            local: slot.local(),
            scheduled_at: zone.to_utc(slot.local()).naive_utc(),
        })
        .collect();

    Ok(Json(PreviewResponse {
        rule_id,
        month: window.label(),
        timezone: zone.name,
        slots,
    }))
}

fn unsaved_row(rule: &NewScheduleRule) -> ScheduleRuleRow {
    let now = Utc::now().naive_utc();
    ScheduleRuleRow {
        id: 0,
        brand_id: rule.brand_id,
        subcategory_id: rule.subcategory_id,
        name: rule.name.clone(),
        frequency: rule.frequency.clone(),
        time_of_day: rule.time_of_day.clone(),
        days_of_week: rule.days_of_week.clone(),
        day_of_month: rule.day_of_month,
        nth_week: rule.nth_week,
        weekday: rule.weekday,
        start_date: rule.start_date.clone(),
        end_date: rule.end_date.clone(),
        days_before: rule.days_before.clone(),
        days_during: rule.days_during.clone(),
        channels: rule.channels.clone(),
        image_tag_rule: rule.image_tag_rule.clone(),
        hashtag_rule: rule.hashtag_rule.clone(),
        settings: rule.settings.clone(),
        is_active: rule.is_active,
        created_at: now,
        updated_at: now,
    }
}
