// ==========================================
// 基线快照集成测试
// ==========================================
// 职责: 验证基线创建、不可变性、整体替换、作废、对比与并发替换
// ==========================================


#[cfg(test)]
mod baseline_snapshot_test {
    use evm_engine::api::ApiError;
    use evm_engine::app::AppState;
    use evm_engine::domain::DeltaPresence;
    use evm_engine::{EacSource, EvmLevel, IndexValue};

    use crate::test_helpers::{
        create_test_db, date, dec, seed_multi_level_scenario, seed_standard_scenario, setup_app, ts, Seeder,
    };

    fn raw_connection(state: &AppState) -> rusqlite::Connection {
        evm_engine::db::open_sqlite_connection(&state.db_path).unwrap()
    }

    // ==========================================
    // 创建与不可变性
    // ==========================================

    #[test]
    fn test_create_baseline_freezes_all_levels() {
        let (_tmp, state) = setup_app();
        seed_multi_level_scenario(&state);

        let set = state
            .baseline_api
            .create_baseline("P1", "2024-07-01", Some("月度基线".to_string()), Some("planner".to_string()))
            .unwrap();

        assert_eq!(set.baseline.project_id, "P1");
        assert_eq!(set.baseline.control_date, date(2024, 7, 1));
        assert_eq!(set.baseline.created_by, "planner");
        assert_eq!(set.baseline.revision, 0);
        assert_eq!(set.count_by_level(), (1, 2, 3));

        let live = state.evm_api.get_project_evm_tree("P1", "2024-07-01").unwrap();
        let frozen_project = &set.project_row().unwrap().metrics;
        assert_eq!(frozen_project.budget_bac, live.project.budget_bac);
        assert_eq!(frozen_project.planned_value, live.project.planned_value);
        assert_eq!(frozen_project.estimate_at_completion, dec("1900.00"));
        assert_eq!(frozen_project.eac_source, EacSource::Partial);

        let ce1 = &set.find_row(EvmLevel::CostElement, "CE1").unwrap().metrics;
        assert_eq!(ce1.actual_cost, dec("420.00"));
        assert_eq!(ce1.cpi, IndexValue::Value(dec("0.9524")));

        let reloaded = state.baseline_api.get_baseline_snapshot(&set.baseline.baseline_id).unwrap();
        assert_eq!(reloaded, set);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_live_changes() {
        let (_tmp, state) = setup_app();
        seed_multi_level_scenario(&state);

        let set = state.baseline_api.create_baseline("P1", "2024-07-01", None, None).unwrap();
        let baseline_id = set.baseline.baseline_id.clone();

        // 补录一笔成本、删除一个成本要素
        Seeder::new(&state).cost("R9", "CE1", date(2024, 6, 25), "100.00");
        state
            .repos
            .project_repo
            .soft_delete_cost_element("CE2", ts(2024, 7, 2, 8))
            .unwrap();

        let reloaded = state.baseline_api.get_baseline_snapshot(&baseline_id).unwrap();
        assert_eq!(reloaded, set);

        let live_ce1 = state.evm_api.get_cost_element_evm("CE1", "2024-07-01").unwrap();
        assert_eq!(live_ce1.actual_cost, dec("520.00"));
    }

    #[test]
    fn test_raw_update_of_snapshot_rows_is_rejected() {
        let (_tmp, state) = setup_app();
        seed_standard_scenario(&state);
        let set = state.baseline_api.create_baseline("P1", "2024-07-01", None, None).unwrap();

        let conn = raw_connection(&state);
        let err = conn
            .execute(
                "UPDATE baseline_snapshot SET actual_cost = '0.00' WHERE baseline_id = ?1",
                [&set.baseline.baseline_id],
            )
            .unwrap_err();
        assert!(err.to_string().contains("IMMUTABLE"), "unexpected error: {}", err);

        let reloaded = state.baseline_api.get_baseline_snapshot(&set.baseline.baseline_id).unwrap();
        assert_eq!(reloaded.rows, set.rows);
    }

    #[test]
    fn test_create_for_missing_project_leaves_nothing_behind() {
        let (_tmp, state) = setup_app();
        seed_standard_scenario(&state);

        let result = state.baseline_api.create_baseline("P404", "2024-07-01", None, None);
        assert!(matches!(result, Err(ApiError::NotFound(_))));

        assert!(state.baseline_api.list_baselines("P404", true).unwrap().is_empty());
        assert!(matches!(
            state.baseline_api.list_project_actions("P404", 20),
            Err(ApiError::NotFound(_))
        ));
        assert!(state.repos.action_log_repo.find_recent(10).unwrap().is_empty());

        assert!(matches!(
            state.baseline_api.create_baseline("P1", "2024-02-30", None, None),
            Err(ApiError::InvalidControlDate(_))
        ));
    }

    // ==========================================
    // 整体替换
    // ==========================================

    #[test]
    fn test_replace_rewrites_every_row_at_new_control_date() {
        let (_tmp, state) = setup_app();
        seed_multi_level_scenario(&state);

        let created = state
            .baseline_api
            .create_baseline("P1", "2024-06-01", Some("初版".to_string()), None)
            .unwrap();
        let baseline_id = created.baseline.baseline_id.clone();

        let replaced = state
            .baseline_api
            .replace_baseline(&baseline_id, Some("2024-07-01"), None, "planner")
            .unwrap();

        assert_eq!(replaced.baseline.revision, 1);
        assert_eq!(replaced.baseline.control_date, date(2024, 7, 1));
        assert_eq!(replaced.baseline.description.as_deref(), Some("初版"));
        assert_eq!(replaced.baseline.created_at, created.baseline.created_at);
        assert_eq!(replaced.rows.len(), created.rows.len());
        assert!(replaced
            .rows
            .iter()
            .all(|r| r.metrics.control_date == date(2024, 7, 1)));

        let live = state.evm_api.get_project_evm("P1", "2024-07-01").unwrap();
        assert_eq!(replaced.project_row().unwrap().metrics.actual_cost, live.actual_cost);

        // 未指定日期时沿用当前控制日期
        let again = state
            .baseline_api
            .replace_baseline(&baseline_id, None, Some("复核".to_string()), "planner")
            .unwrap();
        assert_eq!(again.baseline.revision, 2);
        assert_eq!(again.baseline.control_date, date(2024, 7, 1));
        assert_eq!(again.baseline.description.as_deref(), Some("复核"));
    }

    #[test]
    fn test_failed_replace_keeps_previous_snapshot() {
        let (_tmp, state) = setup_app();
        seed_standard_scenario(&state);
        let created = state.baseline_api.create_baseline("P1", "2024-07-01", None, None).unwrap();
        let baseline_id = created.baseline.baseline_id.clone();

        raw_connection(&state)
            .execute(
                "UPDATE project SET deleted_at = '2024-07-02 00:00:00.000000' WHERE project_id = 'P1'",
                [],
            )
            .unwrap();

        let result = state
            .baseline_api
            .replace_baseline(&baseline_id, Some("2024-08-01"), None, "planner");
        assert!(matches!(result, Err(ApiError::NotFound(_))));

        let reloaded = state.baseline_api.get_baseline_snapshot(&baseline_id).unwrap();
        assert_eq!(reloaded, created);
        assert_eq!(
            state
                .repos
                .action_log_repo
                .count_by_baseline(&baseline_id)
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_replace_validates_input() {
        let (_tmp, state) = setup_app();
        seed_standard_scenario(&state);

        assert!(matches!(
            state.baseline_api.replace_baseline("B404", None, None, "planner"),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            state.baseline_api.replace_baseline("B404", None, None, " "),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            state.baseline_api.replace_baseline("B404", Some("bad"), None, "planner"),
            Err(ApiError::InvalidControlDate(_))
        ));
    }

    // ==========================================
    // 作废
    // ==========================================

    #[test]
    fn test_cancel_keeps_rows_and_blocks_replace() {
        let (_tmp, state) = setup_app();
        seed_standard_scenario(&state);
        let created = state.baseline_api.create_baseline("P1", "2024-07-01", None, None).unwrap();
        let baseline_id = created.baseline.baseline_id.clone();

        let cancelled = state
            .baseline_api
            .cancel_baseline(&baseline_id, "reviewer", Some("口径调整"))
            .unwrap();
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.cancelled_by.as_deref(), Some("reviewer"));
        assert_eq!(cancelled.cancel_reason.as_deref(), Some("口径调整"));

        let reloaded = state.baseline_api.get_baseline_snapshot(&baseline_id).unwrap();
        assert_eq!(reloaded.rows, created.rows);

        assert!(matches!(
            state.baseline_api.replace_baseline(&baseline_id, None, None, "planner"),
            Err(ApiError::BusinessRuleViolation(_))
        ));
        assert!(matches!(
            state.baseline_api.cancel_baseline(&baseline_id, "reviewer", None),
            Err(ApiError::BusinessRuleViolation(_))
        ));

        assert!(state.baseline_api.list_baselines("P1", false).unwrap().is_empty());
        assert_eq!(state.baseline_api.list_baselines("P1", true).unwrap().len(), 1);

        // 操作历史只含成功的创建与作废，最新在前
        let history = state.baseline_api.list_project_actions("P1", 20).unwrap();
        let kinds: Vec<&str> = history.iter().map(|log| log.action_type.as_str()).collect();
        assert_eq!(kinds, vec!["CancelBaseline", "CreateBaseline"]);
        assert_eq!(history[0].actor, "reviewer");
        assert_eq!(history[0].detail.as_deref(), Some("口径调整"));
        assert!(history
            .iter()
            .all(|log| log.baseline_id.as_deref() == Some(baseline_id.as_str())));
    }

    // ==========================================
    // 对比
    // ==========================================

    #[test]
    fn test_compare_baseline_to_live() {
        let (_tmp, state) = setup_app();
        seed_multi_level_scenario(&state);
        let set = state.baseline_api.create_baseline("P1", "2024-07-01", None, None).unwrap();

        Seeder::new(&state).cost("R9", "CE1", date(2024, 6, 25), "100.00");
        state
            .repos
            .project_repo
            .soft_delete_cost_element("CE2", ts(2024, 7, 2, 8))
            .unwrap();

        let cmp = state
            .baseline_api
            .compare_baseline_to_live(&set.baseline.baseline_id, "2024-07-01")
            .unwrap();
        assert_eq!(cmp.before_label, set.baseline.baseline_id);
        assert_eq!(cmp.after_label, "live");
        assert_eq!(cmp.after_control_date, date(2024, 7, 1));

        let ce1 = cmp.find_delta(EvmLevel::CostElement, "CE1").unwrap();
        assert_eq!(ce1.presence, DeltaPresence::Both);
        assert_eq!(ce1.actual_cost_delta, dec("100.00"));
        assert_eq!(ce1.earned_value_delta, dec("0.00"));
        assert_eq!(ce1.cpi.before, Some(IndexValue::Value(dec("0.9524"))));
        assert_eq!(ce1.cpi.after, Some(IndexValue::Value(dec("0.7692"))));

        let ce2 = cmp.find_delta(EvmLevel::CostElement, "CE2").unwrap();
        assert_eq!(ce2.presence, DeltaPresence::BeforeOnly);
        assert_eq!(ce2.budget_bac_delta, dec("-500.00"));
        assert_eq!(ce2.eac_source_after, None);

        let project = cmp.find_delta(EvmLevel::Project, "P1").unwrap();
        assert_eq!(project.budget_bac_delta, dec("-500.00"));
        assert_eq!(project.actual_cost_delta, dec("100.00"));
        assert_eq!(project.estimate_at_completion_delta, dec("-650.00"));
        assert_eq!(project.eac_source_before, Some(EacSource::Partial));
        assert_eq!(project.eac_source_after, Some(EacSource::BacFallback));
    }

    #[test]
    fn test_compare_two_baselines() {
        let (_tmp, state) = setup_app();
        seed_standard_scenario(&state);
        Seeder::new(&state)
            .project("P2")
            .wbe("P2", "W9")
            .cost_element("W9", "CE9", "100.00");

        let june = state.baseline_api.create_baseline("P1", "2024-06-01", None, None).unwrap();
        let july = state.baseline_api.create_baseline("P1", "2024-07-01", None, None).unwrap();

        let cmp = state
            .baseline_api
            .compare_baselines(&june.baseline.baseline_id, &july.baseline.baseline_id)
            .unwrap();
        assert_eq!(cmp.before_control_date, date(2024, 6, 1));
        assert_eq!(cmp.after_control_date, date(2024, 7, 1));
        assert_eq!(cmp.deltas.len(), 3);

        let ce1 = cmp.find_delta(EvmLevel::CostElement, "CE1").unwrap();
        assert_eq!(ce1.actual_cost_delta, dec("120.00"));
        assert_eq!(ce1.earned_value_delta, dec("0.00"));
        assert_eq!(ce1.budget_bac_delta, dec("0.00"));

        let other = state.baseline_api.create_baseline("P2", "2024-07-01", None, None).unwrap();
        assert!(matches!(
            state
                .baseline_api
                .compare_baselines(&june.baseline.baseline_id, &other.baseline.baseline_id),
            Err(ApiError::InvalidInput(_))
        ));
    }

    // ==========================================
    // 操作日志
    // ==========================================

    #[test]
    fn test_lifecycle_is_recorded_in_action_log() {
        let (_tmp, state) = setup_app();
        seed_standard_scenario(&state);

        let created = state
            .baseline_api
            .create_baseline("P1", "2024-06-01", None, Some("planner".to_string()))
            .unwrap();
        let baseline_id = created.baseline.baseline_id.clone();
        state
            .baseline_api
            .replace_baseline(&baseline_id, Some("2024-07-01"), None, "editor")
            .unwrap();
        state
            .baseline_api
            .cancel_baseline(&baseline_id, "reviewer", None)
            .unwrap();

        let logs = state.repos.action_log_repo.find_by_baseline_id(&baseline_id).unwrap();
        let kinds: Vec<(&str, &str)> = logs
            .iter()
            .map(|l| (l.action_type.as_str(), l.actor.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("CreateBaseline", "planner"),
                ("ReplaceBaseline", "editor"),
                ("CancelBaseline", "reviewer"),
            ]
        );

        let replace_payload = logs[1].payload_json.as_ref().unwrap();
        assert_eq!(replace_payload["control_date"], "2024-07-01");
        assert_eq!(replace_payload["previous_control_date"], "2024-06-01");
        assert_eq!(replace_payload["revision"], 1);
        assert_eq!(replace_payload["attempts"], 1);
        assert!(logs.iter().all(|l| l.project_id.as_deref() == Some("P1")));
    }

    // ==========================================
    // 并发替换
    // ==========================================

    #[test]
    fn test_concurrent_replace_across_connections() {
        let (_tmp, db_path) = create_test_db().unwrap();
        let first = AppState::new(db_path.clone()).unwrap();
        let second = AppState::new(db_path).unwrap();

        seed_multi_level_scenario(&first);
        let created = first.baseline_api.create_baseline("P1", "2024-06-01", None, None).unwrap();
        let baseline_id = created.baseline.baseline_id.clone();

        let results: Vec<Result<i32, ApiError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = [(&first, "2024-07-01", "alice"), (&second, "2024-08-01", "bob")]
                .into_iter()
                .map(|(state, control_date, actor)| {
                    let baseline_id = baseline_id.as_str();
                    scope.spawn(move || {
                        state
                            .baseline_api
                            .replace_baseline(baseline_id, Some(control_date), None, actor)
                            .map(|set| set.baseline.revision)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let succeeded = results.iter().filter(|r| r.is_ok()).count() as i32;
        for r in &results {
            assert!(
                matches!(r, Ok(_) | Err(ApiError::SnapshotConflict { .. })),
                "unexpected result: {:?}",
                r
            );
        }
        assert!(succeeded >= 1);

        let final_set = second.baseline_api.get_baseline_snapshot(&baseline_id).unwrap();
        assert_eq!(final_set.baseline.revision, succeeded);
        assert_eq!(final_set.count_by_level(), (1, 2, 3));
        assert!(final_set
            .rows
            .iter()
            .all(|r| r.metrics.control_date == final_set.baseline.control_date));

        assert_eq!(
            first
                .repos
                .action_log_repo
                .count_by_baseline(&baseline_id)
                .unwrap(),
            1 + succeeded
        );
    }
}
