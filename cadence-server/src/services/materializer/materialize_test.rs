#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use diesel::prelude::*;
    use diesel::sqlite::SqliteConnection;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use crate::config::SchedulerConfig;
    use crate::db::{create_pool, create_test_pool, run_migrations};
    use crate::error::ScheduleError;
    use crate::models::{Draft, NewDraft, NewPostJob, NewScheduleRule};
    use crate::services::captions::{
        placeholder_caption, Caption, CaptionGenerator, CaptionRequest, TemplateCaptions,
    };
    use crate::services::materializer::fixtures::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_rerun_converges_to_same_rows() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "America/New_York");
            let sub = subcategory(&mut conn, brand.id);
            asset(&mut conn, brand.id, "image", None);
            asset(&mut conn, brand.id, "image", None);
            insert_rule(&mut conn, weekly_rule(brand.id, sub.id, r#"["instagram", "facebook"]"#));
            brand.id
        };
        let service = service(&pool);

        // April 2024: five Mondays, four Thursdays.
        let first = service.materialize_month(brand_id, "2024-04-01", false).await.unwrap();
        assert_eq!(first.slots_considered, 9);
        assert_eq!(first.drafts_created, 9);
        assert_eq!(first.jobs_created, 18);
        assert!(first.errors.is_empty());

        let second = service.materialize_month(brand_id, "2024-04-01", false).await.unwrap();
        assert_eq!(second.slots_considered, 9);
        assert_eq!(second.drafts_created, 0);
        assert_eq!(second.jobs_created, 0);
        assert_eq!(second.skipped, 18);
        assert_ne!(first.run_id, second.run_id);

        assert_eq!(all_jobs(&pool).len(), 18);
        let drafts = all_drafts(&pool);
        assert_eq!(drafts.len(), 9);
        for draft in &drafts {
            assert_eq!(draft.channel, "instagram");
            assert_eq!(draft.source, "ai");
            assert!(draft.post_job_id.is_some());
        }
    }

    #[tokio::test]
    async fn test_one_draft_per_slot_one_job_per_channel() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            asset(&mut conn, brand.id, "image", Some((1080, 1080)));
            insert_rule(
                &mut conn,
                weekly_rule(brand.id, sub.id, r#"["instagram", "linkedin", "twitter"]"#),
            );
            brand.id
        };

        service(&pool)
            .materialize_month(brand_id, "2024-04-01", false)
            .await
            .unwrap();

        let jobs = all_jobs(&pool);
        let channels: HashSet<&str> = jobs.iter().map(|j| j.channel.as_str()).collect();
        assert_eq!(
            channels,
            HashSet::from(["instagram_feed", "linkedin_profile", "x"])
        );

        let drafts = all_drafts(&pool);
        for draft in &drafts {
            let for_draft: Vec<_> = jobs.iter().filter(|j| j.draft_id == draft.id).collect();
            assert_eq!(for_draft.len(), 3);
            assert!(for_draft.iter().all(|j| j.status == "pending"));
            assert_eq!(draft.post_job_id, Some(for_draft.iter().map(|j| j.id).min().unwrap()));
        }
    }

    #[tokio::test]
    async fn test_video_never_chosen_for_image_only_channel() {
        let pool = create_test_pool();
        let (brand_id, image_id) = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            asset(&mut conn, brand.id, "video", None);
            let image = asset(&mut conn, brand.id, "image", None);
            insert_rule(&mut conn, weekly_rule(brand.id, sub.id, r#"["x"]"#));
            (brand.id, image.id)
        };

        service(&pool)
            .materialize_month(brand_id, "2024-04-01", false)
            .await
            .unwrap();

        let drafts = all_drafts(&pool);
        assert_eq!(drafts.len(), 9);
        for draft in &drafts {
            assert_eq!(asset_ids(draft), vec![image_id]);
        }
    }

    #[tokio::test]
    async fn test_vertical_asset_goes_to_instagram_story() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            asset(&mut conn, brand.id, "image", Some((1080, 1920)));
            insert_rule(&mut conn, weekly_rule(brand.id, sub.id, r#"["instagram"]"#));
            brand.id
        };

        service(&pool)
            .materialize_month(brand_id, "2024-04-01", false)
            .await
            .unwrap();

        assert!(all_jobs(&pool).iter().all(|j| j.channel == "instagram_story"));
    }

    #[tokio::test]
    async fn test_fresh_assets_rotate_before_repeating() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            for _ in 0..3 {
                asset(&mut conn, brand.id, "image", None);
            }
            insert_rule(&mut conn, weekly_rule(brand.id, sub.id, r#"["facebook"]"#));
            brand.id
        };

        service(&pool)
            .materialize_month(brand_id, "2024-04-01", false)
            .await
            .unwrap();

        let picks: Vec<i32> = all_drafts(&pool).iter().map(|d| asset_ids(d)[0]).collect();
        let first_three: HashSet<i32> = picks.iter().take(3).copied().collect();
        assert_eq!(first_three.len(), 3);
        // Once all three are used the oldest comes back around.
        assert_eq!(picks[3], picks[0]);

        use crate::schema::asset_usage::dsl;
        let mut conn = pool.get().unwrap();
        let rows: i64 = dsl::asset_usage.count().get_result(&mut conn).unwrap();
        assert_eq!(rows, 3);
    }

    #[tokio::test]
    async fn test_idle_rotation_buckets_released_after_batch() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            for _ in 0..2 {
                asset(&mut conn, brand.id, "image", None);
            }
            insert_rule(&mut conn, weekly_rule(brand.id, sub.id, r#"["facebook"]"#));
            brand.id
        };
        let service = service(&pool);

        service.materialize_month(brand_id, "2024-04-01", false).await.unwrap();
        assert_eq!(service.rotator.tracked_keys().await, 0);

        // Rotation picks up from storage in the next month.
        service.materialize_month(brand_id, "2024-05-01", false).await.unwrap();
        let counts: Vec<i32> = usage_rows(&pool).iter().map(|r| r.usage_count).collect();
        assert_eq!(counts.iter().sum::<i32>(), 9 + 9);
        assert!(counts.iter().all(|c| (8..=10).contains(c)));
    }

    #[tokio::test]
    async fn test_force_relinks_existing_jobs() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            asset(&mut conn, brand.id, "image", None);
            insert_rule(&mut conn, weekly_rule(brand.id, sub.id, r#"["facebook", "x"]"#));
            brand.id
        };
        let service = service(&pool);

        service.materialize_month(brand_id, "2024-04-01", false).await.unwrap();
        let first_drafts: HashSet<i32> = all_drafts(&pool).iter().map(|d| d.id).collect();

        // A published job keeps its content.
        let published_id = {
            use crate::schema::post_jobs::dsl;
            let mut conn = pool.get().unwrap();
            let id: i32 = dsl::post_jobs
                .order(dsl::id.asc())
                .select(dsl::id)
                .first(&mut conn)
                .unwrap();
            diesel::update(dsl::post_jobs.filter(dsl::id.eq(id)))
                .set(dsl::status.eq("published"))
                .execute(&mut conn)
                .unwrap();
            id
        };

        let forced = service.materialize_month(brand_id, "2024-04-01", true).await.unwrap();
        assert_eq!(forced.drafts_created, 9);
        assert_eq!(forced.jobs_created, 0);
        assert_eq!(forced.jobs_relinked, 17);
        assert_eq!(forced.skipped, 1);

        let jobs = all_jobs(&pool);
        assert_eq!(jobs.len(), 18);
        for job in &jobs {
            if job.id == published_id {
                assert!(first_drafts.contains(&job.draft_id));
                assert_eq!(job.status, "published");
            } else {
                assert!(!first_drafts.contains(&job.draft_id));
                assert_eq!(job.status, "pending");
            }
        }
        let drafts = all_drafts(&pool);
        assert_eq!(drafts.len(), 18);
        for draft in &drafts {
            let owned = jobs.iter().find(|j| Some(j.id) == draft.post_job_id);
            if first_drafts.contains(&draft.id) {
                // Old drafts only keep a reference to the job that stayed.
                match owned {
                    Some(job) => {
                        assert_eq!(job.id, published_id);
                        assert_eq!(job.draft_id, draft.id);
                    }
                    None => assert!(draft.post_job_id.is_none()),
                }
            } else {
                assert_eq!(owned.map(|j| j.draft_id), Some(draft.id));
            }
        }
    }

    #[tokio::test]
    async fn test_force_with_every_job_locked_discards_draft() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            asset(&mut conn, brand.id, "image", None);
            insert_rule(&mut conn, weekly_rule(brand.id, sub.id, r#"["facebook"]"#));
            brand.id
        };
        let service = service(&pool);

        service.materialize_month(brand_id, "2024-04-01", false).await.unwrap();
        {
            use crate::schema::post_jobs::dsl;
            let mut conn = pool.get().unwrap();
            diesel::update(dsl::post_jobs)
                .set(dsl::status.eq("published"))
                .execute(&mut conn)
                .unwrap();
        }

        let forced = service.materialize_month(brand_id, "2024-04-01", true).await.unwrap();
        assert_eq!(forced.drafts_created, 0);
        assert_eq!(forced.jobs_relinked, 0);
        assert_eq!(forced.skipped, 9);
        assert!(forced.errors.is_empty());

        let drafts = all_drafts(&pool);
        assert_eq!(drafts.len(), 9);
        assert!(drafts.iter().all(|d| d.post_job_id.is_some()));
        let usage = usage_rows(&pool);
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].usage_count, 9);
    }

    #[tokio::test]
    async fn test_failed_job_insert_leaves_no_draft_or_usage() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            asset(&mut conn, brand.id, "image", None);
            insert_rule(&mut conn, weekly_rule(brand.id, sub.id, r#"["facebook"]"#));
            diesel::sql_query(
                "CREATE TRIGGER block_post_jobs BEFORE INSERT ON post_jobs \
                 BEGIN SELECT RAISE(ABORT, 'post jobs blocked'); END;",
            )
            .execute(&mut conn)
            .unwrap();
            brand.id
        };
        let service = service(&pool);

        for _ in 0..2 {
            let summary = service.materialize_month(brand_id, "2024-04-01", false).await.unwrap();
            assert_eq!(summary.drafts_created, 0);
            assert_eq!(summary.jobs_created, 0);
            assert_eq!(summary.errors.len(), 9);
            assert!(summary.errors.iter().all(|e| e.kind == "database"));
        }
        assert!(all_drafts(&pool).is_empty());
        assert!(usage_rows(&pool).is_empty());

        {
            let mut conn = pool.get().unwrap();
            diesel::sql_query("DROP TRIGGER block_post_jobs")
                .execute(&mut conn)
                .unwrap();
        }
        let summary = service.materialize_month(brand_id, "2024-04-01", false).await.unwrap();
        assert_eq!(summary.drafts_created, 9);
        assert!(summary.errors.is_empty());
        assert_eq!(all_drafts(&pool).len(), 9);
        assert_eq!(usage_rows(&pool)[0].usage_count, 9);
    }

    /// Commits a job for the first slot it is asked about from its own
    /// connection, as a concurrent batch would.
    struct CompetingBatch {
        url: String,
        fired: AtomicBool,
    }

    #[async_trait]
    impl CaptionGenerator for CompetingBatch {
        async fn generate_caption(&self, request: &CaptionRequest<'_>) -> anyhow::Result<Caption> {
            if !self.fired.swap(true, Ordering::SeqCst) {
                use crate::schema::{drafts, post_jobs};

                let at = request.slot.unwrap().local();
                let mut other = SqliteConnection::establish(&self.url)?;
                let draft = diesel::insert_into(drafts::table)
                    .values(&NewDraft {
                        brand_id: request.brand.id,
                        schedule_rule_id: request.rule.id,
                        subcategory_id: request.subcategory.id,
                        copy: "Written by the other batch".to_string(),
                        hashtags: "[]".to_string(),
                        asset_ids: "[]".to_string(),
                        channel: "facebook".to_string(),
                        approved: false,
                        source: "ai".to_string(),
                    })
                    .returning(Draft::as_select())
                    .get_result(&mut other)?;
                diesel::insert_into(post_jobs::table)
                    .values(&NewPostJob {
                        brand_id: request.brand.id,
                        schedule_rule_id: request.rule.id,
                        draft_id: draft.id,
                        channel: "facebook".to_string(),
                        scheduled_at: at,
                        scheduled_local: at,
                        scheduled_tz: "UTC".to_string(),
                        status: "pending".to_string(),
                    })
                    .execute(&mut other)?;
            }
            Ok(placeholder_caption(request.subcategory))
        }
    }

    #[tokio::test]
    async fn test_slot_filled_during_generation_is_not_duplicated() {
        let dir = tempfile::tempdir().unwrap();
        let url = dir.path().join("race.db").to_str().unwrap().to_string();
        let pool = create_pool(&url).unwrap();
        run_migrations(&mut pool.get().unwrap()).unwrap();

        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            asset(&mut conn, brand.id, "image", None);
            insert_rule(&mut conn, weekly_rule(brand.id, sub.id, r#"["facebook"]"#));
            brand.id
        };

        let captions = Arc::new(CompetingBatch {
            url: url.clone(),
            fired: AtomicBool::new(false),
        });
        let summary = service_with(&pool, SchedulerConfig::default(), captions)
            .materialize_month(brand_id, "2024-04-01", false)
            .await
            .unwrap();
        assert_eq!(summary.drafts_created, 8);
        assert_eq!(summary.jobs_created, 8);
        assert_eq!(summary.skipped, 1);
        assert!(summary.errors.is_empty());

        assert_eq!(all_jobs(&pool).len(), 9);
        let drafts = all_drafts(&pool);
        assert_eq!(drafts.len(), 9);
        assert!(drafts.iter().all(|d| d.post_job_id.is_some()));
        assert_eq!(
            drafts
                .iter()
                .filter(|d| d.copy == "Written by the other batch")
                .count(),
            1
        );
        // Only drafts this batch kept count towards rotation.
        assert_eq!(usage_rows(&pool)[0].usage_count, 8);
    }

    #[tokio::test]
    async fn test_malformed_asset_ids_reported_for_slot() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            asset(&mut conn, brand.id, "image", None);
            insert_rule(&mut conn, weekly_rule(brand.id, sub.id, r#"["facebook"]"#));
            brand.id
        };
        let service = service(&pool);
        service.materialize_month(brand_id, "2024-04-01", false).await.unwrap();

        {
            use crate::schema::drafts::dsl;
            let mut conn = pool.get().unwrap();
            let first: i32 = dsl::drafts
                .order(dsl::id.asc())
                .select(dsl::id)
                .first(&mut conn)
                .unwrap();
            diesel::update(dsl::drafts.filter(dsl::id.eq(first)))
                .set(dsl::asset_ids.eq("not json"))
                .execute(&mut conn)
                .unwrap();
        }

        let rerun = service.materialize_month(brand_id, "2024-04-01", false).await.unwrap();
        assert_eq!(rerun.errors.len(), 1);
        assert_eq!(rerun.errors[0].kind, "serialization");
        assert_eq!(rerun.skipped, 8);
        assert_eq!(rerun.drafts_created, 0);
    }

    #[tokio::test]
    async fn test_invalid_rule_reported_without_aborting() {
        let pool = create_test_pool();
        let (brand_id, bad_rule) = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            let mut broken = weekly_rule(brand.id, sub.id, r#"["facebook"]"#);
            broken.days_of_week = None;
            let bad = insert_rule(&mut conn, broken);
            insert_rule(&mut conn, weekly_rule(brand.id, sub.id, r#"["facebook"]"#));
            (brand.id, bad.id)
        };

        let summary = service(&pool)
            .materialize_month(brand_id, "2024-04-01", false)
            .await
            .unwrap();

        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].rule_id, bad_rule);
        assert_eq!(summary.errors[0].kind, "rule_validation");
        assert!(summary.errors[0].slot.is_none());
        assert_eq!(summary.jobs_created, 9);
    }

    #[tokio::test]
    async fn test_inactive_rules_are_ignored() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            let mut rule = weekly_rule(brand.id, sub.id, r#"["facebook"]"#);
            rule.is_active = false;
            insert_rule(&mut conn, rule);
            brand.id
        };

        let summary = service(&pool)
            .materialize_month(brand_id, "2024-04-01", false)
            .await
            .unwrap();
        assert_eq!(summary.slots_considered, 0);
        assert!(all_jobs(&pool).is_empty());
    }

    #[tokio::test]
    async fn test_scheduled_at_follows_brand_zone_across_dst() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "America/New_York");
            let sub = subcategory(&mut conn, brand.id);
            // 02:30 on 2024-03-10 does not exist in New York.
            insert_rule(
                &mut conn,
                NewScheduleRule {
                    brand_id: brand.id,
                    subcategory_id: sub.id,
                    name: "spring forward".to_string(),
                    frequency: "monthly".to_string(),
                    time_of_day: "02:30".to_string(),
                    day_of_month: Some(10),
                    channels: r#"["facebook"]"#.to_string(),
                    is_active: true,
                    ..Default::default()
                },
            );
            brand.id
        };
        let service = service(&pool);

        service.materialize_month(brand_id, "2024-03-01", false).await.unwrap();
        service.materialize_month(brand_id, "2024-01-01", false).await.unwrap();

        let jobs = all_jobs(&pool);
        assert_eq!(jobs.len(), 2);
        // January, EST.
        assert_eq!(jobs[0].scheduled_at, at(2024, 1, 10, 7, 30));
        // Skipped wall time keeps the pre-transition offset: 03:30 EDT.
        assert_eq!(jobs[1].scheduled_at, at(2024, 3, 10, 7, 30));
        assert_eq!(jobs[1].scheduled_local, at(2024, 3, 10, 2, 30));
        assert_eq!(jobs[1].scheduled_tz, "America/New_York");
    }

    #[tokio::test]
    async fn test_unknown_zone_degrades_to_utc() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "Mars/Olympus_Mons");
            let sub = subcategory(&mut conn, brand.id);
            insert_rule(&mut conn, weekly_rule(brand.id, sub.id, r#"["facebook"]"#));
            brand.id
        };

        let summary = service(&pool)
            .materialize_month(brand_id, "2024-04-01", false)
            .await
            .unwrap();
        assert!(summary.errors.is_empty());

        let jobs = all_jobs(&pool);
        assert_eq!(jobs[0].scheduled_at, at(2024, 4, 1, 9, 0));
        assert_eq!(jobs[0].scheduled_tz, "UTC");
    }

    #[tokio::test]
    async fn test_specific_rule_lead_time_slots() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            insert_rule(
                &mut conn,
                NewScheduleRule {
                    brand_id: brand.id,
                    subcategory_id: sub.id,
                    name: "open house".to_string(),
                    frequency: "specific".to_string(),
                    time_of_day: "10:00".to_string(),
                    start_date: Some("2024-04-20T00:00:00Z".to_string()),
                    days_before: Some("[7, 1]".to_string()),
                    channels: r#"["facebook"]"#.to_string(),
                    is_active: true,
                    ..Default::default()
                },
            );
            brand.id
        };
        let service = service(&pool);

        let march = service.materialize_month(brand_id, "2024-03-01", false).await.unwrap();
        assert_eq!(march.slots_considered, 0);

        service.materialize_month(brand_id, "2024-04-01", false).await.unwrap();
        let times: Vec<_> = all_jobs(&pool).iter().map(|j| j.scheduled_at).collect();
        assert_eq!(times, vec![at(2024, 4, 13, 10, 0), at(2024, 4, 19, 10, 0)]);
    }

    #[tokio::test]
    async fn test_missing_assets_follow_policy() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            insert_rule(&mut conn, weekly_rule(brand.id, sub.id, r#"["facebook"]"#));
            brand.id
        };

        let strict = SchedulerConfig {
            require_assets: true,
            ..Default::default()
        };
        let summary = service_with(&pool, strict, Arc::new(TemplateCaptions))
            .materialize_month(brand_id, "2024-04-01", false)
            .await
            .unwrap();
        assert_eq!(summary.drafts_created, 0);
        assert_eq!(summary.skipped, 9);

        let summary = service(&pool)
            .materialize_month(brand_id, "2024-04-01", false)
            .await
            .unwrap();
        assert_eq!(summary.drafts_created, 9);
        assert!(all_drafts(&pool).iter().all(|d| asset_ids(d).is_empty()));
    }

    #[tokio::test]
    async fn test_generator_failure_falls_back_to_placeholder() {
        let pool = create_test_pool();
        let brand_id = {
            let mut conn = pool.get().unwrap();
            let brand = brand(&mut conn, "UTC");
            let sub = subcategory(&mut conn, brand.id);
            let mut rule = weekly_rule(brand.id, sub.id, r#"["facebook"]"#);
            rule.hashtag_rule = Some(r#"{"kind": "subcategory"}"#.to_string());
            insert_rule(&mut conn, rule);
            brand.id
        };

        let summary = service_with(&pool, SchedulerConfig::default(), Arc::new(FailingCaptions))
            .materialize_month(brand_id, "2024-04-01", false)
            .await
            .unwrap();
        assert!(summary.errors.is_empty());

        let draft = &all_drafts(&pool)[0];
        assert_eq!(draft.copy, "Fresh pastries every morning.");
        let tags: Vec<String> = serde_json::from_str(&draft.hashtags).unwrap();
        assert_eq!(tags, vec!["#bakery", "#pastry"]);
    }

    #[tokio::test]
    async fn test_batch_level_failures() {
        let pool = create_test_pool();
        let service = service(&pool);

        let err = service.materialize_month(42, "2024-04-01", false).await.unwrap_err();
        assert!(matches!(err, ScheduleError::BrandNotFound(42)));

        let err = service.materialize_month(42, "April", false).await.unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidRequest(_)));
    }
}
