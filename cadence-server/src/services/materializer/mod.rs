//! Turns a brand's schedule rules into drafts and post jobs for one month.
//!
//! Every slot walks `existing job? -> draft -> per-channel jobs -> link ->
//! record asset usage`, with everything after the lookup in one transaction.
//! Slots that already have jobs reuse their draft, so re-running a month with
//! `force = false` converges to the same rows.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::db::{DbConnection, DbPool};
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{
    Brand, Draft, NewDraft, NewPostJob, PostJob, PostJobStatus, ScheduleRuleRow, Subcategory,
};
use crate::services::captions::{self, BrandPreferences, CaptionGenerator, CaptionRequest};
use crate::services::catalog::{self, CatalogAsset};
use crate::services::channels;
use crate::services::recurrence::{self, MonthWindow, TimeSlot};
use crate::services::rotation::{AssetRotator, RotationKey, UsageBucket};
use crate::services::rules::{self, ScheduleRule};
use crate::services::timezone::BrandZone;
use crate::services::usage_store;

/// Provenance for drafts written by the scheduler.
pub const SOURCE_GENERATED: &str = "ai";
/// Provenance after a user asked for the content to be regenerated.
pub const SOURCE_REGENERATED: &str = "ai+human";

#[derive(Debug, Clone, Serialize)]
pub struct SlotError {
    pub rule_id: i32,
    /// Local slot, absent when the whole rule was rejected.
    pub slot: Option<String>,
    pub kind: String,
    pub message: String,
}

impl SlotError {
    fn new(rule_id: i32, slot: Option<TimeSlot>, err: &ScheduleError) -> Self {
        Self {
            rule_id,
            slot: slot.map(|s| s.to_string()),
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MaterializeSummary {
    pub run_id: String,
    pub brand_id: i32,
    pub month: String,
    pub slots_considered: usize,
    pub drafts_created: usize,
    pub jobs_created: usize,
    pub jobs_relinked: usize,
    pub skipped: usize,
    pub errors: Vec<SlotError>,
}

impl MaterializeSummary {
    fn absorb(&mut self, outcome: SlotOutcome) {
        self.drafts_created += outcome.drafts_created;
        self.jobs_created += outcome.jobs_created;
        self.jobs_relinked += outcome.jobs_relinked;
        self.skipped += outcome.skipped;
    }
}

#[derive(Debug, Default)]
struct SlotOutcome {
    drafts_created: usize,
    jobs_created: usize,
    jobs_relinked: usize,
    skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegeneratedPost {
    pub draft: Draft,
    pub post_job: PostJob,
}

/// Everything that stays fixed for one batch.
struct BrandContext {
    brand: Brand,
    zone: BrandZone,
    prefs: BrandPreferences,
}

/// Copy, hashtags and asset chosen for one draft.
struct DraftContent {
    copy: String,
    hashtags: Vec<String>,
    asset: Option<CatalogAsset>,
}

pub struct MaterializeService {
    db: DbPool,
    rotator: Arc<AssetRotator>,
    captions: Arc<dyn CaptionGenerator>,
    settings: SchedulerConfig,
}

impl MaterializeService {
    pub fn new(
        db: DbPool,
        rotator: Arc<AssetRotator>,
        captions: Arc<dyn CaptionGenerator>,
        settings: SchedulerConfig,
    ) -> Self {
        Self {
            db,
            rotator,
            captions,
            settings,
        }
    }

    /// Materialize every active rule of `brand_id` for the month containing
    /// `target_month` (`YYYY-MM-01`).
    ///
    /// Bad requests and storage failures before the first slot fail the call.
    /// Anything that goes wrong for a single rule or slot is reported in
    /// `errors` and the batch carries on.
    pub async fn materialize_month(
        &self,
        brand_id: i32,
        target_month: &str,
        force: bool,
    ) -> ScheduleResult<MaterializeSummary> {
        let window = MonthWindow::parse(target_month).map_err(ScheduleError::InvalidRequest)?;
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "materialize",
            brand_id,
            month = %window.label(),
            run_id = %run_id,
            force
        );

        self.run_batch(brand_id, window, force, run_id)
            .instrument(span)
            .await
    }

    async fn run_batch(
        &self,
        brand_id: i32,
        window: MonthWindow,
        force: bool,
        run_id: String,
    ) -> ScheduleResult<MaterializeSummary> {
        let mut conn = self.db.get()?;
        let ctx = self.brand_context(&mut conn, brand_id)?;
        let rows = active_rules(&mut conn, brand_id)?;

        let mut summary = MaterializeSummary {
            run_id,
            brand_id,
            month: window.label(),
            ..Default::default()
        };

        tracing::info!(
            "Materializing {} active rules in zone {}",
            rows.len(),
            ctx.zone.name
        );

        let mut subcategories: HashMap<i32, Subcategory> = HashMap::new();

        for row in &rows {
            let rule = match rules::parse_rule(row) {
                Ok(rule) => rule,
                Err(e) => {
                    tracing::warn!("Skipping rule {}: {}", row.id, e);
                    summary.errors.push(SlotError::new(row.id, None, &e));
                    continue;
                }
            };

            if !subcategories.contains_key(&rule.subcategory_id) {
                match load_subcategory(&mut conn, brand_id, rule.subcategory_id) {
                    Ok(sub) => {
                        subcategories.insert(sub.id, sub);
                    }
                    Err(e) => {
                        tracing::warn!("Skipping rule {}: {}", rule.id, e);
                        summary.errors.push(SlotError::new(rule.id, None, &e));
                        continue;
                    }
                }
            }
            let Some(subcategory) = subcategories.get(&rule.subcategory_id) else {
                continue;
            };

            let slots = recurrence::expand_month(&rule, &window);
            tracing::debug!("Rule {} expands to {} slots", rule.id, slots.len());

            for slot in slots {
                summary.slots_considered += 1;
                match self
                    .materialize_slot(&mut conn, &ctx, &rule, subcategory, slot, force)
                    .await
                {
                    Ok(outcome) => summary.absorb(outcome),
                    Err(e) => {
                        tracing::error!("Rule {} slot {} failed: {}", rule.id, slot, e);
                        summary.errors.push(SlotError::new(rule.id, Some(slot), &e));
                    }
                }
            }
        }

        let released = self.rotator.release_idle().await;
        tracing::debug!("Released {} idle rotation buckets", released);

        tracing::info!(
            "Materialized {}: {} slots, {} drafts, {} jobs created, {} relinked, {} skipped, {} errors",
            summary.month,
            summary.slots_considered,
            summary.drafts_created,
            summary.jobs_created,
            summary.jobs_relinked,
            summary.skipped,
            summary.errors.len()
        );

        Ok(summary)
    }

    fn brand_context(&self, conn: &mut DbConnection, brand_id: i32) -> ScheduleResult<BrandContext> {
        use crate::schema::brands::dsl;

        let brand = dsl::brands
            .filter(dsl::id.eq(brand_id))
            .select(Brand::as_select())
            .first(conn)
            .optional()?
            .ok_or(ScheduleError::BrandNotFound(brand_id))?;

        let zone = if brand.timezone.trim().is_empty() {
            BrandZone::resolve_or_utc(&self.settings.default_timezone)
        } else {
            BrandZone::resolve_or_utc(brand.timezone.trim())
        };
        let prefs = BrandPreferences::from_brand(&brand);

        Ok(BrandContext { brand, zone, prefs })
    }

    async fn materialize_slot(
        &self,
        conn: &mut DbConnection,
        ctx: &BrandContext,
        rule: &ScheduleRule,
        subcategory: &Subcategory,
        slot: TimeSlot,
        force: bool,
    ) -> ScheduleResult<SlotOutcome> {
        let local = slot.local();
        let scheduled_at = ctx.zone.to_utc(local).naive_utc();

        // Select, generate and record under the key lock so concurrent
        // batches never pick the same "least used" asset.
        let key = RotationKey {
            brand_id: ctx.brand.id,
            subcategory_id: subcategory.id,
        };
        let mut bucket = self.rotator.bucket(key).await;

        if !force {
            let mut outcome = SlotOutcome::default();
            let reused = conn.transaction::<_, ScheduleError, _>(|conn| {
                self.complete_existing(conn, ctx, rule, scheduled_at, local, &mut outcome)
            })?;
            if reused {
                return Ok(outcome);
            }
        }

        usage_store::ensure_hydrated(conn, &mut bucket)?;

        let content = self
            .prepare_content(conn, ctx, rule, subcategory, Some(slot), &bucket)
            .await?;

        if content.asset.is_none() && self.settings.require_assets {
            tracing::info!("No eligible asset for rule {} at {}; skipping", rule.id, slot);
            return Ok(SlotOutcome {
                skipped: 1,
                ..Default::default()
            });
        }

        // Draft, jobs, back-reference and usage commit together or not at all.
        let mut outcome = SlotOutcome::default();
        let written = conn.transaction::<_, ScheduleError, _>(|conn| {
            // Another batch may have filled the slot while copy was generated.
            if !force && self.complete_existing(conn, ctx, rule, scheduled_at, local, &mut outcome)? {
                return Ok(());
            }

            let draft = insert_draft(conn, ctx.brand.id, rule, subcategory.id, &content)?;
            let aspect = content.asset.as_ref().and_then(|a| a.aspect_ratio);
            let first_job =
                self.create_jobs(conn, ctx, rule, &draft, scheduled_at, local, aspect, force, &mut outcome)?;
            if first_job.is_none() {
                // Every channel is taken or locked; the draft would be an orphan.
                return Err(diesel::result::Error::RollbackTransaction.into());
            }
            link_first_job(conn, &draft, first_job)?;
            outcome.drafts_created += 1;

            if let Some(asset) = &content.asset {
                record_usage(conn, &mut bucket, asset)?;
            }
            Ok(())
        });

        match written {
            Ok(()) => Ok(outcome),
            Err(ScheduleError::Database(diesel::result::Error::RollbackTransaction)) => {
                tracing::debug!("Slot {} has no free channel; draft discarded", slot);
                Ok(SlotOutcome {
                    skipped: outcome.skipped,
                    ..Default::default()
                })
            }
            Err(e) => {
                // Usage may have been recorded in memory before the rollback.
                bucket.invalidate();
                Err(e)
            }
        }
    }

    /// Reuse the draft behind any job already materialized for this slot,
    /// adding jobs for channels it is still missing. False when the slot is
    /// empty.
    fn complete_existing(
        &self,
        conn: &mut DbConnection,
        ctx: &BrandContext,
        rule: &ScheduleRule,
        scheduled_at: NaiveDateTime,
        local: NaiveDateTime,
        outcome: &mut SlotOutcome,
    ) -> ScheduleResult<bool> {
        let Some(draft) = existing_draft(conn, ctx.brand.id, rule.id, scheduled_at)? else {
            return Ok(false);
        };
        tracing::debug!("Slot {} already has draft {}", local, draft.id);
        let aspect = draft_aspect_ratio(conn, &draft)?;
        let first_job =
            self.create_jobs(conn, ctx, rule, &draft, scheduled_at, local, aspect, false, outcome)?;
        link_first_job(conn, &draft, first_job)?;
        Ok(true)
    }

    /// Pick the asset and generate copy for a draft. The caller holds the
    /// bucket lock until the usage is recorded.
    async fn prepare_content(
        &self,
        conn: &mut DbConnection,
        ctx: &BrandContext,
        rule: &ScheduleRule,
        subcategory: &Subcategory,
        slot: Option<TimeSlot>,
        bucket: &UsageBucket,
    ) -> ScheduleResult<DraftContent> {
        let assets = catalog::assets_for_rule(conn, ctx.brand.id, &rule.image_tags, subcategory)?;
        let eligible = catalog::eligible_for_channel(&assets, rule.first_channel());
        let candidate_ids: Vec<i32> = eligible.iter().map(|a| a.id).collect();

        let selected = bucket.select_least_used(&candidate_ids, &mut rand::thread_rng());
        let asset = selected.and_then(|id| eligible.iter().find(|a| a.id == id).map(|a| (*a).clone()));
        if asset.is_none() {
            tracing::debug!(
                "Rule {} has no asset usable on {}",
                rule.id,
                rule.first_channel()
            );
        }

        let request = CaptionRequest {
            brand: &ctx.brand,
            rule,
            subcategory,
            prefs: &ctx.prefs,
            slot,
        };
        let (caption, failure) =
            captions::generate_or_placeholder(self.captions.as_ref(), &request).await;
        if let Some(e) = failure {
            let err = ScheduleError::ContentGeneration(e.to_string());
            tracing::warn!("{}; using placeholder copy for rule {}", err, rule.id);
        }

        let hashtags = captions::apply_hashtag_rule(
            &rule.hashtags,
            &caption.hashtags,
            subcategory,
            self.settings.max_hashtags,
        );

        Ok(DraftContent {
            copy: caption.copy,
            hashtags,
            asset,
        })
    }

    /// One pending job per canonical channel. Returns the id of the first
    /// job created or re-pointed at `draft`.
    #[allow(clippy::too_many_arguments)]
    fn create_jobs(
        &self,
        conn: &mut DbConnection,
        ctx: &BrandContext,
        rule: &ScheduleRule,
        draft: &Draft,
        scheduled_at: NaiveDateTime,
        local: NaiveDateTime,
        aspect: Option<f64>,
        force: bool,
        outcome: &mut SlotOutcome,
    ) -> ScheduleResult<Option<i32>> {
        use crate::schema::post_jobs::dsl;

        let mut seen: Vec<String> = Vec::new();
        let mut first_job: Option<i32> = None;

        for raw in &rule.channels {
            let channel = channels::canonicalize(raw, aspect);
            if seen.contains(&channel) {
                continue;
            }
            seen.push(channel.clone());

            let existing: Option<i32> = dsl::post_jobs
                .filter(dsl::draft_id.eq(draft.id))
                .filter(dsl::channel.eq(&channel))
                .select(dsl::id)
                .first(conn)
                .optional()?;
            if let Some(job_id) = existing {
                if !force {
                    outcome.skipped += 1;
                    first_job.get_or_insert(job_id);
                    continue;
                }
            }

            let new_job = NewPostJob {
                brand_id: ctx.brand.id,
                schedule_rule_id: rule.id,
                draft_id: draft.id,
                channel: channel.clone(),
                scheduled_at,
                scheduled_local: local,
                scheduled_tz: ctx.zone.name.clone(),
                status: PostJobStatus::Pending.as_str().to_string(),
            };

            let inserted: ScheduleResult<PostJob> = diesel::insert_into(dsl::post_jobs)
                .values(&new_job)
                .returning(PostJob::as_select())
                .get_result(conn)
                .map_err(ScheduleError::from);

            match inserted {
                Ok(job) => {
                    outcome.jobs_created += 1;
                    first_job.get_or_insert(job.id);
                }
                Err(e) if e.is_unique_violation() => {
                    if force {
                        if let Some(job_id) = relink_job(conn, &new_job)? {
                            outcome.jobs_relinked += 1;
                            first_job.get_or_insert(job_id);
                        } else {
                            outcome.skipped += 1;
                        }
                    } else {
                        tracing::debug!(
                            "{} job for rule {} at {} already exists",
                            channel,
                            rule.id,
                            scheduled_at
                        );
                        outcome.skipped += 1;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok(first_job)
    }

    /// Regenerate the content of a post job's draft in place: new asset,
    /// new copy, provenance `ai+human`. The job goes back to pending.
    pub async fn regenerate_post_job(&self, post_job_id: i32) -> ScheduleResult<RegeneratedPost> {
        use crate::schema::{drafts, post_jobs, schedule_rules};

        let mut conn = self.db.get()?;

        let job = post_jobs::table
            .filter(post_jobs::id.eq(post_job_id))
            .select(PostJob::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| ScheduleError::NotFound(format!("post job {}", post_job_id)))?;

        if PostJobStatus::parse(&job.status).is_some_and(|s| s.is_locked()) {
            return Err(ScheduleError::InvalidRequest(format!(
                "post job {} is {} and can no longer be regenerated",
                job.id, job.status
            )));
        }

        let draft = drafts::table
            .filter(drafts::id.eq(job.draft_id))
            .select(Draft::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| ScheduleError::NotFound(format!("draft {}", job.draft_id)))?;

        let row = schedule_rules::table
            .filter(schedule_rules::id.eq(job.schedule_rule_id))
            .select(ScheduleRuleRow::as_select())
            .first(&mut conn)
            .optional()?
            .ok_or_else(|| ScheduleError::NotFound(format!("rule {}", job.schedule_rule_id)))?;
        let rule = rules::parse_rule(&row)?;

        let ctx = self.brand_context(&mut conn, job.brand_id)?;
        let subcategory = load_subcategory(&mut conn, job.brand_id, rule.subcategory_id)?;
        let slot = TimeSlot {
            date: job.scheduled_local.date(),
            time: job.scheduled_local.time(),
        };

        let key = RotationKey {
            brand_id: ctx.brand.id,
            subcategory_id: subcategory.id,
        };
        let mut bucket = self.rotator.bucket(key).await;
        usage_store::ensure_hydrated(&mut conn, &mut bucket)?;

        let content = self
            .prepare_content(&mut conn, &ctx, &rule, &subcategory, Some(slot), &bucket)
            .await?;

        let written = conn.transaction::<_, ScheduleError, _>(|conn| {
            let now = Utc::now().naive_utc();
            let draft = diesel::update(drafts::table.filter(drafts::id.eq(draft.id)))
                .set((
                    drafts::copy.eq(&content.copy),
                    drafts::hashtags.eq(serde_json::to_string(&content.hashtags)?),
                    drafts::asset_ids.eq(asset_ids_json(&content)?),
                    drafts::approved.eq(false),
                    drafts::source.eq(SOURCE_REGENERATED),
                    drafts::updated_at.eq(now),
                ))
                .returning(Draft::as_select())
                .get_result(conn)?;

            let post_job = diesel::update(post_jobs::table.filter(post_jobs::id.eq(job.id)))
                .set((
                    post_jobs::status.eq(PostJobStatus::Pending.as_str()),
                    post_jobs::updated_at.eq(now),
                ))
                .returning(PostJob::as_select())
                .get_result(conn)?;

            if let Some(asset) = &content.asset {
                record_usage(conn, &mut bucket, asset)?;
            }
            Ok((draft, post_job))
        });

        let (draft, post_job) = match written {
            Ok(written) => written,
            Err(e) => {
                bucket.invalidate();
                return Err(e);
            }
        };
        drop(bucket);
        self.rotator.release_idle().await;

        tracing::info!("Regenerated draft {} for post job {}", draft.id, post_job.id);
        Ok(RegeneratedPost { draft, post_job })
    }
}

fn active_rules(conn: &mut DbConnection, brand_id: i32) -> ScheduleResult<Vec<ScheduleRuleRow>> {
    use crate::schema::schedule_rules::dsl;

    Ok(dsl::schedule_rules
        .filter(dsl::brand_id.eq(brand_id))
        .filter(dsl::is_active.eq(true))
        .order(dsl::id.asc())
        .select(ScheduleRuleRow::as_select())
        .load(conn)?)
}

fn load_subcategory(
    conn: &mut DbConnection,
    brand_id: i32,
    subcategory_id: i32,
) -> ScheduleResult<Subcategory> {
    use crate::schema::subcategories::dsl;

    dsl::subcategories
        .filter(dsl::id.eq(subcategory_id))
        .filter(dsl::brand_id.eq(brand_id))
        .select(Subcategory::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ScheduleError::NotFound(format!("subcategory {}", subcategory_id)))
}

/// Draft behind any job already materialized for this (rule, instant).
fn existing_draft(
    conn: &mut DbConnection,
    brand_id: i32,
    rule_id: i32,
    scheduled_at: NaiveDateTime,
) -> ScheduleResult<Option<Draft>> {
    use crate::schema::{drafts, post_jobs};

    let draft_id: Option<i32> = post_jobs::table
        .filter(post_jobs::brand_id.eq(brand_id))
        .filter(post_jobs::schedule_rule_id.eq(rule_id))
        .filter(post_jobs::scheduled_at.eq(scheduled_at))
        .order(post_jobs::id.asc())
        .select(post_jobs::draft_id)
        .first(conn)
        .optional()?;

    let Some(draft_id) = draft_id else {
        return Ok(None);
    };

    Ok(drafts::table
        .filter(drafts::id.eq(draft_id))
        .select(Draft::as_select())
        .first(conn)
        .optional()?)
}

fn insert_draft(
    conn: &mut DbConnection,
    brand_id: i32,
    rule: &ScheduleRule,
    subcategory_id: i32,
    content: &DraftContent,
) -> ScheduleResult<Draft> {
    use crate::schema::drafts::dsl;

    let new_draft = NewDraft {
        brand_id,
        schedule_rule_id: rule.id,
        subcategory_id,
        copy: content.copy.clone(),
        hashtags: serde_json::to_string(&content.hashtags)?,
        asset_ids: asset_ids_json(content)?,
        channel: rule.first_channel().to_string(),
        approved: false,
        source: SOURCE_GENERATED.to_string(),
    };

    Ok(diesel::insert_into(dsl::drafts)
        .values(&new_draft)
        .returning(Draft::as_select())
        .get_result(conn)?)
}

fn asset_ids_json(content: &DraftContent) -> ScheduleResult<String> {
    let ids: Vec<i32> = content.asset.iter().map(|a| a.id).collect();
    Ok(serde_json::to_string(&ids)?)
}

/// Aspect ratio of a draft's first asset, for channel canonicalization.
fn draft_aspect_ratio(conn: &mut DbConnection, draft: &Draft) -> ScheduleResult<Option<f64>> {
    let ids: Vec<i32> = serde_json::from_str(&draft.asset_ids)?;
    match ids.first() {
        Some(id) => Ok(catalog::asset_by_id(conn, *id)?.and_then(|a| a.aspect_ratio)),
        None => Ok(None),
    }
}

fn link_first_job(conn: &mut DbConnection, draft: &Draft, first_job: Option<i32>) -> ScheduleResult<()> {
    use crate::schema::drafts::dsl;

    if draft.post_job_id.is_some() {
        return Ok(());
    }
    if let Some(job_id) = first_job {
        diesel::update(dsl::drafts.filter(dsl::id.eq(draft.id)))
            .set(dsl::post_job_id.eq(Some(job_id)))
            .execute(conn)?;
    }
    Ok(())
}

/// Under `force`, point the job occupying this slot and channel at the new
/// draft. Jobs already publishing or published keep their content.
fn relink_job(conn: &mut DbConnection, job: &NewPostJob) -> ScheduleResult<Option<i32>> {
    use crate::schema::post_jobs::dsl;

    let existing = dsl::post_jobs
        .filter(dsl::brand_id.eq(job.brand_id))
        .filter(dsl::schedule_rule_id.eq(job.schedule_rule_id))
        .filter(dsl::scheduled_at.eq(job.scheduled_at))
        .filter(dsl::channel.eq(&job.channel))
        .select(PostJob::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| {
            ScheduleError::PersistenceConflict(format!(
                "{} job at {} vanished during relink",
                job.channel, job.scheduled_at
            ))
        })?;

    if PostJobStatus::parse(&existing.status).is_some_and(|s| s.is_locked()) {
        tracing::info!(
            "Post job {} is {}; leaving it on draft {}",
            existing.id,
            existing.status,
            existing.draft_id
        );
        return Ok(None);
    }

    diesel::update(dsl::post_jobs.filter(dsl::id.eq(existing.id)))
        .set((
            dsl::draft_id.eq(job.draft_id),
            dsl::status.eq(PostJobStatus::Pending.as_str()),
            dsl::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;

    if existing.draft_id != job.draft_id {
        release_back_reference(conn, existing.draft_id, existing.id)?;
    }

    Ok(Some(existing.id))
}

/// After `job_id` moved away from `draft_id`, point that draft at one of its
/// remaining jobs, or at nothing.
fn release_back_reference(conn: &mut DbConnection, draft_id: i32, job_id: i32) -> ScheduleResult<()> {
    use crate::schema::{drafts, post_jobs};

    let remaining: Option<i32> = post_jobs::table
        .filter(post_jobs::draft_id.eq(draft_id))
        .order(post_jobs::id.asc())
        .select(post_jobs::id)
        .first(conn)
        .optional()?;

    diesel::update(
        drafts::table
            .filter(drafts::id.eq(draft_id))
            .filter(drafts::post_job_id.eq(job_id)),
    )
    .set((
        drafts::post_job_id.eq(remaining),
        drafts::updated_at.eq(Utc::now().naive_utc()),
    ))
    .execute(conn)?;
    Ok(())
}

fn record_usage(
    conn: &mut DbConnection,
    bucket: &mut UsageBucket,
    asset: &CatalogAsset,
) -> ScheduleResult<()> {
    let outcome = bucket.record_usage(asset.id, asset.media, Utc::now().naive_utc());
    usage_store::persist_outcome(conn, bucket.key(), &outcome)
}

#[cfg(test)]
mod fixtures;

#[cfg(test)]
mod materialize_test;
