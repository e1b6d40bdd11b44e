//! Write-through persistence for rotation buckets, so asset rotation carries
//! over across restarts.

use diesel::prelude::*;

use crate::db::DbConnection;
use crate::error::ScheduleResult;
use crate::models::{AssetUsageRow, NewAssetUsage};
use crate::services::channels::MediaType;
use crate::services::rotation::{RecordOutcome, RotationKey, UsageBucket, UsageRecord};

pub fn load_records(conn: &mut DbConnection, key: RotationKey) -> ScheduleResult<Vec<UsageRecord>> {
    use crate::schema::asset_usage::dsl;

    let rows = dsl::asset_usage
        .filter(dsl::brand_id.eq(key.brand_id))
        .filter(dsl::subcategory_id.eq(key.subcategory_id))
        .order(dsl::last_used_at.asc())
        .select(AssetUsageRow::as_select())
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|row| UsageRecord {
            asset_id: row.asset_id,
            asset_type: MediaType::parse(&row.asset_type).unwrap_or(MediaType::Image),
            subcategory_id: row.subcategory_id,
            last_used_at: row.last_used_at,
            usage_count: row.usage_count,
        })
        .collect())
}

/// Load persisted history into a bucket the first time it is used.
pub fn ensure_hydrated(conn: &mut DbConnection, bucket: &mut UsageBucket) -> ScheduleResult<()> {
    if bucket.is_hydrated() {
        return Ok(());
    }
    let key = bucket.key();
    let records = load_records(conn, key)?;
    let evicted = bucket.hydrate(records);
    delete_evicted(conn, key, &evicted)
}

pub fn persist_outcome(
    conn: &mut DbConnection,
    key: RotationKey,
    outcome: &RecordOutcome,
) -> ScheduleResult<()> {
    use crate::schema::asset_usage::dsl;

    let record = &outcome.record;
    let row = NewAssetUsage {
        brand_id: key.brand_id,
        subcategory_id: key.subcategory_id,
        asset_id: record.asset_id,
        asset_type: record.asset_type.as_str().to_string(),
        last_used_at: record.last_used_at,
        usage_count: record.usage_count,
    };

    diesel::insert_into(dsl::asset_usage)
        .values(&row)
        .on_conflict((dsl::brand_id, dsl::subcategory_id, dsl::asset_id))
        .do_update()
        .set((
            dsl::asset_type.eq(&row.asset_type),
            dsl::last_used_at.eq(row.last_used_at),
            dsl::usage_count.eq(row.usage_count),
        ))
        .execute(conn)?;

    delete_evicted(conn, key, &outcome.evicted)
}

fn delete_evicted(conn: &mut DbConnection, key: RotationKey, evicted: &[i32]) -> ScheduleResult<()> {
    use crate::schema::asset_usage::dsl;

    if evicted.is_empty() {
        return Ok(());
    }
    diesel::delete(
        dsl::asset_usage
            .filter(dsl::brand_id.eq(key.brand_id))
            .filter(dsl::subcategory_id.eq(key.subcategory_id))
            .filter(dsl::asset_id.eq_any(evicted)),
    )
    .execute(conn)?;
    Ok(())
}
