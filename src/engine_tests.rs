// src/engine_tests.rs

use chrono::{NaiveDate, NaiveTime};

use crate::engine::*;
use crate::model::*;

fn d(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap_or_else(|_| panic!("Invalid date string format: {}", date_str))
}

fn t(time_str: &str) -> NaiveTime {
    NaiveTime::parse_from_str(time_str, "%H:%M")
        .unwrap_or_else(|_| panic!("Invalid time string format: {}", time_str))
}

fn employee(id: u64, category: EmployeeCategory) -> Employee {
    Employee {
        id,
        name: format!("Person {}", id),
        username: format!("person{}", id),
        email: format!("person{}@example.com", id),
        password_hash: String::new(),
        is_admin: false,
        team: "Montage".to_string(),
        location: "Essen".to_string(),
        work_time_model: WorkTimeModel::Vollzeit,
        weekly_hours: None,
        category,
        entitlement_override: None,
    }
}

fn vacation(id: u64, employee_id: u64, start: &str, end: &str, status: VacationStatus) -> VacationRequest {
    VacationRequest {
        id,
        employee_id,
        start_date: d(start),
        end_date: d(end),
        status,
        reason: "Urlaub".to_string(),
        substitute: None,
        comments: Vec::new(),
        transitions: Vec::new(),
    }
}

fn sick(id: u64, employee_id: u64, start: &str, end: &str, status: SickLeaveStatus) -> SickLeave {
    SickLeave {
        id,
        employee_id,
        start_date: d(start),
        end_date: d(end),
        category: "Erkaeltung".to_string(),
        doctor_note: false,
        status,
        transitions: Vec::new(),
    }
}

fn open_entry(id: u64, employee_id: u64, date: &str, check_in: &str) -> TimeEntry {
    TimeEntry {
        id,
        employee_id,
        date: d(date),
        check_in: t(check_in),
        check_out: None,
        break_minutes: None,
        auto_break: false,
        status: TimeEntryStatus::Offen,
        comment: None,
        audit: Audit::default(),
    }
}

// --- Business-day counting ---

#[test]
fn business_days_single_weekday_is_one() {
    // 2025-06-02 is a Monday.
    assert_eq!(business_days(d("2025-06-02"), d("2025-06-02")), 1);
}

#[test]
fn business_days_single_weekend_day_is_zero() {
    // 2025-06-07 is a Saturday.
    assert_eq!(business_days(d("2025-06-07"), d("2025-06-07")), 0);
}

#[test]
fn business_days_full_week_is_five() {
    // Monday through Sunday.
    assert_eq!(business_days(d("2025-06-02"), d("2025-06-08")), 5);
}

#[test]
fn business_days_inverted_range_is_zero() {
    assert_eq!(business_days(d("2025-06-08"), d("2025-06-02")), 0);
}

#[test]
fn business_days_spanning_two_weeks() {
    // Wed 2025-06-04 through Tue 2025-06-10: Wed Thu Fri Mon Tue.
    assert_eq!(business_days(d("2025-06-04"), d("2025-06-10")), 5);
}

// --- Vacation usage ---

#[test]
fn remaining_after_five_day_request_from_26() {
    let emp = employee(1, EmployeeCategory::Betrieb);
    let requests = vec![vacation(1, 1, "2025-06-02", "2025-06-08", VacationStatus::Genehmigt)];
    let usage = vacation_usage(&emp, &requests);
    assert_eq!(usage.entitlement, 26);
    assert_eq!(usage.used, 5);
    assert_eq!(usage.remaining, 21);
    assert!(!usage.overdrawn());
}

#[test]
fn remaining_never_exceeds_entitlement() {
    let emp = employee(1, EmployeeCategory::Buero);
    let usage = vacation_usage(&emp, &[]);
    assert_eq!(usage.entitlement, 27);
    assert_eq!(usage.remaining, 27);
    assert_eq!(usage.used, 0);
}

#[test]
fn pending_and_rejected_requests_do_not_consume_days() {
    let emp = employee(1, EmployeeCategory::Betrieb);
    let requests = vec![
        vacation(1, 1, "2025-06-02", "2025-06-06", VacationStatus::Beantragt),
        vacation(2, 1, "2025-07-07", "2025-07-11", VacationStatus::Abgelehnt),
    ];
    assert_eq!(vacation_usage(&emp, &requests).used, 0);
}

#[test]
fn other_employees_requests_are_ignored() {
    let emp = employee(1, EmployeeCategory::Betrieb);
    let requests = vec![vacation(1, 2, "2025-06-02", "2025-06-06", VacationStatus::Genehmigt)];
    assert_eq!(vacation_usage(&emp, &requests).used, 0);
}

#[test]
fn overdrawn_balance_is_clamped_but_flagged() {
    let mut emp = employee(1, EmployeeCategory::Betrieb);
    emp.entitlement_override = Some(3);
    let requests = vec![vacation(1, 1, "2025-06-02", "2025-06-06", VacationStatus::Genehmigt)];
    let usage = vacation_usage(&emp, &requests);
    assert_eq!(usage.used, 5);
    assert_eq!(usage.remaining, 0);
    assert_eq!(usage.deficit, 2);
    assert!(usage.overdrawn());
}

// --- Overtime ---

#[test]
fn overtime_exact_standard_day_is_zero() {
    assert_eq!(overtime(t("08:00"), t("17:00"), 60, 8.0), 0.0);
}

#[test]
fn overtime_two_extra_hours() {
    assert_eq!(overtime(t("08:00"), t("19:00"), 60, 8.0), 2.0);
}

#[test]
fn overtime_can_be_negative_undertime() {
    assert_eq!(overtime(t("08:00"), t("12:00"), 0, 8.0), -4.0);
}

#[test]
fn auto_break_step_function_boundaries() {
    assert_eq!(auto_break_minutes(3.99), 0);
    assert_eq!(auto_break_minutes(4.0), 15);
    assert_eq!(auto_break_minutes(5.99), 15);
    assert_eq!(auto_break_minutes(6.0), 30);
    assert_eq!(auto_break_minutes(8.99), 30);
    assert_eq!(auto_break_minutes(9.0), 60);
    assert_eq!(auto_break_minutes(12.0), 60);
}

#[test]
fn manual_break_wins_over_auto_policy() {
    let mut entry = open_entry(1, 1, "2025-06-02", "08:00");
    entry.check_out = Some(t("18:00"));
    entry.status = TimeEntryStatus::Abgeschlossen;
    entry.auto_break = true;
    // 10h gross span would auto-deduct 60min, but the manual 15 wins.
    entry.break_minutes = Some(15);
    assert_eq!(effective_break_minutes(&entry), 15);

    entry.break_minutes = None;
    assert_eq!(effective_break_minutes(&entry), 60);
}

#[test]
fn entry_hours_none_while_open() {
    let entry = open_entry(1, 1, "2025-06-02", "08:00");
    assert_eq!(entry_hours(&entry, 8.0), None);
}

#[test]
fn entry_hours_for_closed_entry() {
    let mut entry = open_entry(1, 1, "2025-06-02", "08:00");
    entry.check_out = Some(t("19:00"));
    entry.break_minutes = Some(60);
    entry.status = TimeEntryStatus::Abgeschlossen;
    assert_eq!(entry_hours(&entry, 8.0), Some((10.0, 2.0)));
}

// --- Status machine ---

#[test]
fn pending_to_approved_applies_once() {
    assert_eq!(
        apply_decision(LeaveState::Pending, LeaveState::Approved),
        Ok(Transition::Applied)
    );
    // Re-applying the same target is an idempotent no-op.
    assert_eq!(
        apply_decision(LeaveState::Approved, LeaveState::Approved),
        Ok(Transition::Unchanged)
    );
}

#[test]
fn terminal_states_cannot_be_flipped() {
    assert_eq!(
        apply_decision(LeaveState::Approved, LeaveState::Rejected),
        Err(TransitionError::AlreadyDecided)
    );
    assert_eq!(
        apply_decision(LeaveState::Rejected, LeaveState::Approved),
        Err(TransitionError::AlreadyDecided)
    );
}

#[test]
fn pending_is_never_a_valid_target() {
    assert_eq!(
        apply_decision(LeaveState::Approved, LeaveState::Pending),
        Err(TransitionError::InvalidTarget)
    );
    assert_eq!(
        apply_decision(LeaveState::Pending, LeaveState::Pending),
        Err(TransitionError::InvalidTarget)
    );
}

#[test]
fn rejection_never_changes_presence() {
    let entries: Vec<TimeEntry> = Vec::new();
    let before = presence_on(1, d("2025-06-03"), &entries, &[], &[]);

    let rejected = vec![vacation(1, 1, "2025-06-02", "2025-06-06", VacationStatus::Abgelehnt)];
    let after = presence_on(1, d("2025-06-03"), &entries, &rejected, &[]);

    assert_eq!(before, PresenceStatus::Abwesend);
    assert_eq!(after, before);
}

// --- Overlap checks ---

#[test]
fn overlapping_approved_ranges_are_detected() {
    let existing = vec![vacation(1, 1, "2025-06-02", "2025-06-06", VacationStatus::Genehmigt)];
    let mut candidate = vacation(2, 1, "2025-06-06", "2025-06-10", VacationStatus::Genehmigt);
    assert!(overlaps_approved_vacation(&candidate, &existing));

    candidate.start_date = d("2025-06-09");
    assert!(!overlaps_approved_vacation(&candidate, &existing));
}

#[test]
fn overlap_ignores_other_employees_and_undecided_requests() {
    let existing = vec![
        vacation(1, 2, "2025-06-02", "2025-06-06", VacationStatus::Genehmigt),
        vacation(2, 1, "2025-06-02", "2025-06-06", VacationStatus::Beantragt),
    ];
    let candidate = vacation(3, 1, "2025-06-04", "2025-06-05", VacationStatus::Genehmigt);
    assert!(!overlaps_approved_vacation(&candidate, &existing));
}

// --- Derived presence ---

#[test]
fn presence_prefers_sick_over_vacation_over_checkin() {
    let date = d("2025-06-03");
    let entries = vec![open_entry(1, 1, "2025-06-03", "08:00")];
    let vacations = vec![vacation(1, 1, "2025-06-02", "2025-06-06", VacationStatus::Genehmigt)];
    let sick_leaves = vec![sick(1, 1, "2025-06-03", "2025-06-04", SickLeaveStatus::Bestaetigt)];

    assert_eq!(
        presence_on(1, date, &entries, &vacations, &sick_leaves),
        PresenceStatus::Krank
    );
    assert_eq!(
        presence_on(1, date, &entries, &vacations, &[]),
        PresenceStatus::Urlaub
    );
    assert_eq!(
        presence_on(1, date, &entries, &[], &[]),
        PresenceStatus::Anwesend
    );
    assert_eq!(presence_on(1, date, &[], &[], &[]), PresenceStatus::Abwesend);
}

#[test]
fn presence_recomputes_after_leave_revocation() {
    let date = d("2025-06-03");
    let mut vacations = vec![vacation(1, 1, "2025-06-02", "2025-06-06", VacationStatus::Genehmigt)];
    assert_eq!(presence_on(1, date, &[], &vacations, &[]), PresenceStatus::Urlaub);

    // Deleting the approved range immediately changes the derived status;
    // there is no cached employee field to go stale.
    vacations.clear();
    assert_eq!(presence_on(1, date, &[], &vacations, &[]), PresenceStatus::Abwesend);
}

#[test]
fn cancelled_entries_do_not_count_as_presence() {
    let mut entry = open_entry(1, 1, "2025-06-03", "08:00");
    entry.status = TimeEntryStatus::Storniert;
    assert_eq!(
        presence_on(1, d("2025-06-03"), &[entry], &[], &[]),
        PresenceStatus::Abwesend
    );
}

#[test]
fn unconfirmed_sick_leave_does_not_mark_krank() {
    let sick_leaves = vec![sick(1, 1, "2025-06-03", "2025-06-04", SickLeaveStatus::Eingereicht)];
    assert_eq!(
        presence_on(1, d("2025-06-03"), &[], &[], &sick_leaves),
        PresenceStatus::Abwesend
    );
}
