use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

// Brand models
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::brands)]
pub struct Brand {
    pub id: i32,
    pub name: String,
    pub timezone: String,
    pub settings: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable, Deserialize)]
#[diesel(table_name = crate::schema::brands)]
pub struct NewBrand {
    pub name: String,
    pub timezone: String,
    pub settings: Option<String>,
}

// Subcategory models
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::subcategories)]
pub struct Subcategory {
    pub id: i32,
    pub brand_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub default_hashtags: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable, Deserialize)]
#[diesel(table_name = crate::schema::subcategories)]
pub struct NewSubcategory {
    pub brand_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub default_hashtags: Option<String>,
}

// Schedule rule models. JSON-bearing columns stay raw text here and are
// decoded once by `services::rules`.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::schedule_rules)]
pub struct ScheduleRuleRow {
    pub id: i32,
    pub brand_id: i32,
    pub subcategory_id: i32,
    pub name: String,
    pub frequency: String,
    pub time_of_day: String,
    pub days_of_week: Option<String>,
    pub day_of_month: Option<i32>,
    pub nth_week: Option<i32>,
    pub weekday: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub days_before: Option<String>,
    pub days_during: Option<String>,
    pub channels: String,
    pub image_tag_rule: Option<String>,
    pub hashtag_rule: Option<String>,
    pub settings: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Insertable, Deserialize)]
#[diesel(table_name = crate::schema::schedule_rules)]
pub struct NewScheduleRule {
    #[serde(default)]
    pub brand_id: i32,
    pub subcategory_id: i32,
    pub name: String,
    pub frequency: String,
    pub time_of_day: String,
    pub days_of_week: Option<String>,
    pub day_of_month: Option<i32>,
    pub nth_week: Option<i32>,
    pub weekday: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub days_before: Option<String>,
    pub days_during: Option<String>,
    pub channels: String,
    pub image_tag_rule: Option<String>,
    pub hashtag_rule: Option<String>,
    pub settings: Option<String>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

// Asset models
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::assets)]
pub struct Asset {
    pub id: i32,
    pub brand_id: i32,
    pub url: String,
    pub asset_type: String,
    pub tags: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable, Deserialize)]
#[diesel(table_name = crate::schema::assets)]
pub struct NewAsset {
    pub brand_id: i32,
    pub url: String,
    pub asset_type: String,
    pub tags: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

// Draft models
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::drafts)]
pub struct Draft {
    pub id: i32,
    pub brand_id: i32,
    pub schedule_rule_id: i32,
    pub subcategory_id: i32,
    pub copy: String,
    pub hashtags: String,
    pub asset_ids: String,
    pub channel: String,
    pub approved: bool,
    pub post_job_id: Option<i32>,
    pub source: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::drafts)]
pub struct NewDraft {
    pub brand_id: i32,
    pub schedule_rule_id: i32,
    pub subcategory_id: i32,
    pub copy: String,
    pub hashtags: String,
    pub asset_ids: String,
    pub channel: String,
    pub approved: bool,
    pub source: String,
}

// Post job models
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::post_jobs)]
pub struct PostJob {
    pub id: i32,
    pub brand_id: i32,
    pub schedule_rule_id: i32,
    pub draft_id: i32,
    pub channel: String,
    pub scheduled_at: NaiveDateTime,
    pub scheduled_local: NaiveDateTime,
    pub scheduled_tz: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::post_jobs)]
pub struct NewPostJob {
    pub brand_id: i32,
    pub schedule_rule_id: i32,
    pub draft_id: i32,
    pub channel: String,
    pub scheduled_at: NaiveDateTime,
    pub scheduled_local: NaiveDateTime,
    pub scheduled_tz: String,
    pub status: String,
}

/// Publishing lifecycle of a post job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostJobStatus {
    Pending,
    Generated,
    Scheduled,
    Publishing,
    Success,
    Published,
    Failed,
}

impl PostJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Generated => "generated",
            Self::Scheduled => "scheduled",
            Self::Publishing => "publishing",
            Self::Success => "success",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "generated" => Some(Self::Generated),
            "scheduled" => Some(Self::Scheduled),
            "publishing" => Some(Self::Publishing),
            "success" => Some(Self::Success),
            "published" => Some(Self::Published),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Jobs in these states are in flight or done and are never re-pointed at
    /// regenerated content.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Publishing | Self::Success | Self::Published)
    }
}

// Asset usage models
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::asset_usage)]
pub struct AssetUsageRow {
    pub id: i32,
    pub brand_id: i32,
    pub subcategory_id: i32,
    pub asset_id: i32,
    pub asset_type: String,
    pub last_used_at: NaiveDateTime,
    pub usage_count: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::asset_usage)]
pub struct NewAssetUsage {
    pub brand_id: i32,
    pub subcategory_id: i32,
    pub asset_id: i32,
    pub asset_type: String,
    pub last_used_at: NaiveDateTime,
    pub usage_count: i32,
}
