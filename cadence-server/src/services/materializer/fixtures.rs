use anyhow::anyhow;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use super::MaterializeService;
use crate::config::SchedulerConfig;
use crate::db::{DbConnection, DbPool};
use crate::models::{
    Asset, AssetUsageRow, Brand, Draft, NewAsset, NewBrand, NewScheduleRule, NewSubcategory, PostJob,
    ScheduleRuleRow, Subcategory,
};
use crate::services::captions::{Caption, CaptionGenerator, CaptionRequest, TemplateCaptions};
use crate::services::rotation::AssetRotator;

pub fn service(pool: &DbPool) -> MaterializeService {
    service_with(pool, SchedulerConfig::default(), Arc::new(TemplateCaptions))
}

pub fn service_with(
    pool: &DbPool,
    settings: SchedulerConfig,
    captions: Arc<dyn CaptionGenerator>,
) -> MaterializeService {
    MaterializeService::new(
        pool.clone(),
        Arc::new(AssetRotator::new(settings.rotation_history_cap)),
        captions,
        settings,
    )
}

pub struct FailingCaptions;

#[async_trait]
impl CaptionGenerator for FailingCaptions {
    async fn generate_caption(&self, _request: &CaptionRequest<'_>) -> anyhow::Result<Caption> {
        Err(anyhow!("provider unreachable"))
    }
}

pub fn brand(conn: &mut DbConnection, timezone: &str) -> Brand {
    use crate::schema::brands::dsl;
    diesel::insert_into(dsl::brands)
        .values(&NewBrand {
            name: "Corner Bakery".to_string(),
            timezone: timezone.to_string(),
            settings: Some(r#"{"tone": "warm"}"#.to_string()),
        })
        .returning(Brand::as_select())
        .get_result(conn)
        .unwrap()
}

pub fn subcategory(conn: &mut DbConnection, brand_id: i32) -> Subcategory {
    use crate::schema::subcategories::dsl;
    diesel::insert_into(dsl::subcategories)
        .values(&NewSubcategory {
            brand_id,
            name: "pastries".to_string(),
            description: Some("Fresh pastries every morning.".to_string()),
            default_hashtags: Some(r#"["bakery", "pastry"]"#.to_string()),
        })
        .returning(Subcategory::as_select())
        .get_result(conn)
        .unwrap()
}

pub fn asset(
    conn: &mut DbConnection,
    brand_id: i32,
    asset_type: &str,
    size: Option<(i32, i32)>,
) -> Asset {
    use crate::schema::assets::dsl;
    diesel::insert_into(dsl::assets)
        .values(&NewAsset {
            brand_id,
            url: format!("https://cdn.example.com/{}.bin", asset_type),
            asset_type: asset_type.to_string(),
            tags: Some(r#"["pastries"]"#.to_string()),
            width: size.map(|(w, _)| w),
            height: size.map(|(_, h)| h),
        })
        .returning(Asset::as_select())
        .get_result(conn)
        .unwrap()
}

/// Weekly Monday + Thursday rule at 09:00.
pub fn weekly_rule(brand_id: i32, subcategory_id: i32, channels: &str) -> NewScheduleRule {
    NewScheduleRule {
        brand_id,
        subcategory_id,
        name: "Mon/Thu pastries".to_string(),
        frequency: "weekly".to_string(),
        time_of_day: "09:00".to_string(),
        days_of_week: Some("[1, 4]".to_string()),
        channels: channels.to_string(),
        is_active: true,
        ..Default::default()
    }
}

pub fn insert_rule(conn: &mut DbConnection, rule: NewScheduleRule) -> ScheduleRuleRow {
    use crate::schema::schedule_rules::dsl;
    diesel::insert_into(dsl::schedule_rules)
        .values(&rule)
        .returning(ScheduleRuleRow::as_select())
        .get_result(conn)
        .unwrap()
}

pub fn all_jobs(pool: &DbPool) -> Vec<PostJob> {
    use crate::schema::post_jobs::dsl;
    let mut conn = pool.get().unwrap();
    dsl::post_jobs
        .order(dsl::scheduled_at.asc())
        .select(PostJob::as_select())
        .load(&mut conn)
        .unwrap()
}

pub fn all_drafts(pool: &DbPool) -> Vec<Draft> {
    use crate::schema::drafts::dsl;
    let mut conn = pool.get().unwrap();
    dsl::drafts
        .order(dsl::id.asc())
        .select(Draft::as_select())
        .load(&mut conn)
        .unwrap()
}

pub fn usage_rows(pool: &DbPool) -> Vec<AssetUsageRow> {
    use crate::schema::asset_usage::dsl;
    let mut conn = pool.get().unwrap();
    dsl::asset_usage
        .order(dsl::id.asc())
        .select(AssetUsageRow::as_select())
        .load(&mut conn)
        .unwrap()
}

pub fn asset_ids(draft: &Draft) -> Vec<i32> {
    serde_json::from_str(&draft.asset_ids).unwrap()
}
