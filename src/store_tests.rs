// src/store_tests.rs

use rand::Rng;
use std::fs;
use std::path::PathBuf;

use crate::model::*;
use crate::store::{JsonStore, StoreError};

/// Unique scratch directory per test; removed on drop.
struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!(
            "zeiterfassung-store-test-{}-{}",
            std::process::id(),
            rand::thread_rng().gen::<u64>()
        ));
        fs::create_dir_all(&path).expect("create scratch dir");
        Self(path)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn sample_employee(id: u64) -> Employee {
    Employee {
        id,
        name: format!("Person {}", id),
        username: format!("person{}", id),
        email: format!("person{}@example.com", id),
        password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
        is_admin: id == 1,
        team: "Montage".to_string(),
        location: "Essen".to_string(),
        work_time_model: WorkTimeModel::Vollzeit,
        weekly_hours: None,
        category: EmployeeCategory::Betrieb,
        entitlement_override: None,
    }
}

#[test]
fn missing_file_loads_as_empty_collection() {
    let dir = ScratchDir::new();
    let store = JsonStore::new(&dir.0);
    let loaded = store.load::<Employee>().unwrap();
    assert!(loaded.records.is_empty());
    assert_eq!(loaded.revision, 0);
    assert_eq!(loaded.next_id(), 1);
}

#[test]
fn save_then_load_round_trips_records() {
    let dir = ScratchDir::new();
    let store = JsonStore::new(&dir.0);

    let employees = vec![sample_employee(1), sample_employee(2)];
    let revision = store.save(&employees, 0).unwrap();
    assert_eq!(revision, 1);

    let loaded = store.load::<Employee>().unwrap();
    assert_eq!(loaded.revision, 1);
    assert_eq!(loaded.records.len(), 2);
    // Byte-equivalent modulo formatting: compare through serde_json values.
    assert_eq!(
        serde_json::to_value(&loaded.records).unwrap(),
        serde_json::to_value(&employees).unwrap()
    );
    assert_eq!(loaded.next_id(), 3);
}

#[test]
fn dates_round_trip_as_iso_strings() {
    let dir = ScratchDir::new();
    let store = JsonStore::new(&dir.0);

    let request = VacationRequest {
        id: 1,
        employee_id: 1,
        start_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
        end_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
        status: VacationStatus::Beantragt,
        reason: "Sommerurlaub".to_string(),
        substitute: None,
        comments: Vec::new(),
        transitions: Vec::new(),
    };
    store.save(&[request.clone()], 0).unwrap();

    let raw = fs::read_to_string(dir.0.join("vacation_requests.json")).unwrap();
    assert!(raw.contains("\"2025-06-02\""));

    let loaded = store.load::<VacationRequest>().unwrap();
    assert_eq!(loaded.records[0].start_date, request.start_date);
    assert_eq!(loaded.records[0].end_date, request.end_date);
}

#[test]
fn malformed_file_is_treated_as_empty_and_warned() {
    let dir = ScratchDir::new();
    let store = JsonStore::new(&dir.0);

    fs::write(dir.0.join("employees.json"), "{ not json").unwrap();
    let loaded = store.load::<Employee>().unwrap();
    assert!(loaded.records.is_empty());

    let warnings = store.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].collection, "employees");
}

#[test]
fn undecodable_record_is_skipped_but_rest_survive() {
    let dir = ScratchDir::new();
    let store = JsonStore::new(&dir.0);

    let good = serde_json::to_value(sample_employee(1)).unwrap();
    let bad = serde_json::json!({ "id": 2, "name": "No Dates", "start_date": "not-a-date" });
    let array = serde_json::Value::Array(vec![good, bad]);
    fs::write(
        dir.0.join("employees.json"),
        serde_json::to_string(&array).unwrap(),
    )
    .unwrap();

    let loaded = store.load::<Employee>().unwrap();
    assert_eq!(loaded.records.len(), 1);
    assert_eq!(loaded.records[0].id, 1);
}

#[test]
fn stale_revision_is_rejected() {
    let dir = ScratchDir::new();
    let store = JsonStore::new(&dir.0);

    let loaded_a = store.load::<Employee>().unwrap();
    let loaded_b = store.load::<Employee>().unwrap();

    let mut records_a = loaded_a.records;
    records_a.push(sample_employee(1));
    store.save(&records_a, loaded_a.revision).unwrap();

    // The second writer is based on the pre-save revision and must not
    // silently clobber the first write.
    let mut records_b = loaded_b.records;
    records_b.push(sample_employee(2));
    let err = store.save(&records_b, loaded_b.revision).unwrap_err();
    assert!(matches!(err, StoreError::Conflict { .. }));

    let reloaded = store.load::<Employee>().unwrap();
    assert_eq!(reloaded.records.len(), 1);
    assert_eq!(reloaded.records[0].id, 1);
}

#[test]
fn next_id_is_max_plus_one_even_with_gaps() {
    let dir = ScratchDir::new();
    let store = JsonStore::new(&dir.0);

    let employees = vec![sample_employee(3), sample_employee(7)];
    store.save(&employees, 0).unwrap();

    let loaded = store.load::<Employee>().unwrap();
    assert_eq!(loaded.next_id(), 8);
}

#[test]
fn collections_have_independent_revisions() {
    let dir = ScratchDir::new();
    let store = JsonStore::new(&dir.0);

    store.save(&[sample_employee(1)], 0).unwrap();

    // A save on employees must not bump the time entry revision.
    let entries = store.load::<TimeEntry>().unwrap();
    assert_eq!(entries.revision, 0);
}
