use diesel::prelude::*;

use crate::db::DbConnection;
use crate::error::ScheduleResult;
use crate::models::{Asset, Subcategory};
use crate::services::channels::{self, MediaType};
use crate::services::rules::{ImageTagRule, TagMatch};

/// An asset as the scheduler sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogAsset {
    pub id: i32,
    pub tags: Vec<String>,
    pub media: MediaType,
    pub aspect_ratio: Option<f64>,
}

impl CatalogAsset {
    pub fn from_row(asset: &Asset) -> Option<Self> {
        let media = match MediaType::parse(&asset.asset_type) {
            Some(media) => media,
            None => {
                tracing::warn!(
                    "Asset {} has unknown type '{}'; leaving it out of rotation",
                    asset.id,
                    asset.asset_type
                );
                return None;
            }
        };
        Some(Self {
            id: asset.id,
            tags: parse_tags(asset.tags.as_deref()),
            media,
            aspect_ratio: channels::aspect_ratio(asset.width, asset.height),
        })
    }
}

/// Brand assets the rule's tag filter admits.
pub fn assets_for_rule(
    conn: &mut DbConnection,
    brand_id: i32,
    filter: &ImageTagRule,
    subcategory: &Subcategory,
) -> ScheduleResult<Vec<CatalogAsset>> {
    use crate::schema::assets::dsl;

    let rows = dsl::assets
        .filter(dsl::brand_id.eq(brand_id))
        .order(dsl::id.asc())
        .select(Asset::as_select())
        .load(conn)?;

    Ok(rows
        .iter()
        .filter_map(CatalogAsset::from_row)
        .filter(|asset| tag_filter_matches(filter, &asset.tags, &subcategory.name))
        .collect())
}

pub fn asset_by_id(conn: &mut DbConnection, asset_id: i32) -> ScheduleResult<Option<CatalogAsset>> {
    use crate::schema::assets::dsl;

    let row = dsl::assets
        .filter(dsl::id.eq(asset_id))
        .select(Asset::as_select())
        .first(conn)
        .optional()?;
    Ok(row.as_ref().and_then(CatalogAsset::from_row))
}

/// Candidates the channel can actually carry.
pub fn eligible_for_channel<'a>(assets: &'a [CatalogAsset], channel: &str) -> Vec<&'a CatalogAsset> {
    assets
        .iter()
        .filter(|asset| channels::supports_media(channel, asset.media))
        .collect()
}

pub fn tag_filter_matches(filter: &ImageTagRule, tags: &[String], subcategory_name: &str) -> bool {
    let has = |wanted: &str| tags.iter().any(|t| t.eq_ignore_ascii_case(wanted.trim()));
    match filter {
        ImageTagRule::Any => true,
        ImageTagRule::Subcategory => has(subcategory_name),
        ImageTagRule::Tags { tags: wanted, mode } => {
            if wanted.is_empty() {
                return true;
            }
            match mode {
                TagMatch::Any => wanted.iter().any(|w| has(w)),
                TagMatch::All => wanted.iter().all(|w| has(w)),
            }
        }
    }
}

/// Tags are stored as a JSON array, or as a comma-separated list.
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Vec::new(),
        Some(raw) => raw,
    };
    let tags: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str(raw).unwrap_or_default()
    } else {
        raw.split(',').map(str::to_string).collect()
    };
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tag_filters() {
        let asset_tags = tags(&["Spring", "bakery"]);

        assert!(tag_filter_matches(&ImageTagRule::Any, &[], "x"));
        assert!(tag_filter_matches(&ImageTagRule::Subcategory, &asset_tags, "bakery"));
        assert!(!tag_filter_matches(&ImageTagRule::Subcategory, &asset_tags, "coffee"));

        let any = ImageTagRule::Tags {
            tags: tags(&["spring", "winter"]),
            mode: TagMatch::Any,
        };
        let all = ImageTagRule::Tags {
            tags: tags(&["spring", "winter"]),
            mode: TagMatch::All,
        };
        assert!(tag_filter_matches(&any, &asset_tags, "x"));
        assert!(!tag_filter_matches(&all, &asset_tags, "x"));
    }

    #[test]
    fn test_parse_tags_forms() {
        assert_eq!(parse_tags(Some(r#"["a", " b "]"#)), vec!["a", "b"]);
        assert_eq!(parse_tags(Some("a, b,,c")), vec!["a", "b", "c"]);
        assert!(parse_tags(None).is_empty());
    }

    #[test]
    fn test_video_excluded_for_image_only_channel() {
        let assets = vec![
            CatalogAsset {
                id: 1,
                tags: vec![],
                media: MediaType::Video,
                aspect_ratio: None,
            },
            CatalogAsset {
                id: 2,
                tags: vec![],
                media: MediaType::Image,
                aspect_ratio: None,
            },
        ];
        let ids: Vec<i32> = eligible_for_channel(&assets, "x").iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2]);
        let ids: Vec<i32> = eligible_for_channel(&assets, "tiktok").iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1]);
    }
}
