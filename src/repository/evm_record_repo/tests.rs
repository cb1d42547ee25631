use super::EvmRecordRepository;
use crate::domain::project::{CostElement, Project, Wbe};
use crate::domain::records::{CostRegistration, EarnedValueEntry, Forecast, ScheduleEntry};
use crate::domain::types::ProgressionType;
use crate::repository::error::RepositoryError;
use crate::repository::project_repo::ProjectRepository;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    Arc::new(Mutex::new(conn))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
}

fn seed_hierarchy(conn: &Arc<Mutex<Connection>>) {
    let projects = ProjectRepository::new(conn.clone());
    projects
        .insert_project(&Project {
            project_id: "P1".to_string(),
            project_name: "Demo".to_string(),
            deleted_at: None,
        })
        .unwrap();
    projects
        .insert_wbe(&Wbe {
            wbe_id: "W1".to_string(),
            project_id: "P1".to_string(),
            wbe_name: "主体".to_string(),
            deleted_at: None,
        })
        .unwrap();
    for (id, bac, deleted) in [("CE1", "1000.00", None), ("CE2", "250.00", Some(ts(2024, 3, 1, 0)))] {
        projects
            .insert_cost_element(&CostElement {
                cost_element_id: id.to_string(),
                wbe_id: "W1".to_string(),
                cost_element_name: id.to_string(),
                budget_bac: Decimal::from_str(bac).unwrap(),
                deleted_at: deleted,
            })
            .unwrap();
    }
}

#[test]
fn test_insert_and_find_schedules() {
    let conn = setup_test_db();
    seed_hierarchy(&conn);
    let repo = EvmRecordRepository::new(conn);

    repo.insert_schedule(&ScheduleEntry {
        schedule_id: "S2".to_string(),
        cost_element_id: "CE1".to_string(),
        registration_date: date(2024, 6, 1),
        created_at: ts(2024, 6, 1, 9),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 9, 30),
        progression_type: ProgressionType::Gaussian,
    })
    .unwrap();
    repo.insert_schedule(&ScheduleEntry {
        schedule_id: "S1".to_string(),
        cost_element_id: "CE1".to_string(),
        registration_date: date(2024, 1, 1),
        created_at: ts(2024, 1, 1, 9),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        progression_type: ProgressionType::Linear,
    })
    .unwrap();

    let schedules = repo.find_schedules_by_cost_element("CE1").unwrap();
    assert_eq!(schedules.len(), 2);
    assert_eq!(schedules[0].schedule_id, "S1");
    assert_eq!(schedules[1].progression_type, ProgressionType::Gaussian);
    assert!(repo.find_schedules_by_cost_element("CE2").unwrap().is_empty());
}

#[test]
fn test_created_at_keeps_microseconds() {
    let conn = setup_test_db();
    seed_hierarchy(&conn);
    let repo = EvmRecordRepository::new(conn);

    let created = date(2024, 7, 1).and_hms_micro_opt(23, 59, 59, 999_999).unwrap();
    repo.insert_cost_registration(&CostRegistration {
        cost_registration_id: "R1".to_string(),
        cost_element_id: "CE1".to_string(),
        registration_date: date(2024, 7, 1),
        created_at: created,
        amount: Decimal::from_str("12.34").unwrap(),
    })
    .unwrap();

    let regs = repo.find_cost_registrations_by_cost_element("CE1").unwrap();
    assert_eq!(regs[0].created_at, created);
    assert_eq!(regs[0].amount.to_string(), "12.34");
}

#[test]
fn test_percent_complete_out_of_range_rejected() {
    let conn = setup_test_db();
    seed_hierarchy(&conn);
    let repo = EvmRecordRepository::new(conn);

    let err = repo
        .insert_earned_value(&EarnedValueEntry {
            earned_value_id: "E1".to_string(),
            cost_element_id: "CE1".to_string(),
            completion_date: date(2024, 6, 1),
            created_at: ts(2024, 6, 1, 12),
            percent_complete: Decimal::from(120),
        })
        .unwrap_err();
    assert!(matches!(err, RepositoryError::FieldValueError { .. }));
    assert!(repo.find_earned_values_by_cost_element("CE1").unwrap().is_empty());
}

#[test]
fn test_earned_values_and_forecasts_keep_decimal_text() {
    let conn = setup_test_db();
    seed_hierarchy(&conn);
    let repo = EvmRecordRepository::new(conn);

    repo.insert_earned_value(&EarnedValueEntry {
        earned_value_id: "E1".to_string(),
        cost_element_id: "CE1".to_string(),
        completion_date: date(2024, 6, 1),
        created_at: ts(2024, 6, 1, 12),
        percent_complete: Decimal::from_str("37.5").unwrap(),
    })
    .unwrap();
    repo.insert_forecast(&Forecast {
        forecast_id: "F1".to_string(),
        cost_element_id: "CE1".to_string(),
        forecast_date: date(2024, 5, 1),
        created_at: ts(2024, 5, 1, 10),
        estimate_at_completion: Decimal::from_str("1250.50").unwrap(),
    })
    .unwrap();

    let evs = repo.find_earned_values_by_cost_element("CE1").unwrap();
    assert_eq!(evs.len(), 1);
    assert_eq!(evs[0].percent_complete.to_string(), "37.5");
    assert_eq!(evs[0].completion_date, date(2024, 6, 1));

    let forecasts = repo.find_forecasts_by_cost_element("CE1").unwrap();
    assert_eq!(forecasts.len(), 1);
    assert_eq!(forecasts[0].estimate_at_completion.to_string(), "1250.50");
    assert!(repo.find_forecasts_by_cost_element("CE2").unwrap().is_empty());
}

#[test]
fn test_load_project_record_set_skips_deleted_elements() {
    let conn = setup_test_db();
    seed_hierarchy(&conn);
    let repo = EvmRecordRepository::new(conn);

    repo.insert_forecast(&Forecast {
        forecast_id: "F1".to_string(),
        cost_element_id: "CE1".to_string(),
        forecast_date: date(2024, 5, 1),
        created_at: ts(2024, 5, 1, 10),
        estimate_at_completion: Decimal::from_str("1100.00").unwrap(),
    })
    .unwrap();
    repo.batch_insert_cost_registrations(&[
        CostRegistration {
            cost_registration_id: "R1".to_string(),
            cost_element_id: "CE1".to_string(),
            registration_date: date(2024, 2, 1),
            created_at: ts(2024, 2, 1, 10),
            amount: Decimal::from_str("100.00").unwrap(),
        },
        CostRegistration {
            cost_registration_id: "R2".to_string(),
            cost_element_id: "CE2".to_string(),
            registration_date: date(2024, 2, 1),
            created_at: ts(2024, 2, 1, 10),
            amount: Decimal::from_str("50.00").unwrap(),
        },
    ])
    .unwrap();

    let set = repo.load_project_record_set("P1").unwrap();
    assert_eq!(set.wbes.len(), 1);
    assert_eq!(set.cost_element_count(), 1);

    let ce = &set.wbes[0].cost_elements[0];
    assert_eq!(ce.cost_element.cost_element_id, "CE1");
    assert_eq!(ce.forecasts.len(), 1);
    assert_eq!(ce.cost_registrations.len(), 1);
}

#[test]
fn test_load_missing_entities_is_not_found() {
    let conn = setup_test_db();
    seed_hierarchy(&conn);
    let repo = EvmRecordRepository::new(conn);

    assert!(matches!(
        repo.load_project_record_set("nope"),
        Err(RepositoryError::NotFound { .. })
    ));
    assert!(matches!(
        repo.load_wbe_record_set("nope"),
        Err(RepositoryError::NotFound { .. })
    ));
    // 软删除的成本要素按不存在处理
    assert!(matches!(
        repo.load_cost_element_record_set("CE2"),
        Err(RepositoryError::NotFound { .. })
    ));
    assert!(repo.load_cost_element_record_set("CE1").is_ok());
}
