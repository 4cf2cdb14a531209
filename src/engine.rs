// src/engine.rs
//
// Leave balance and overtime engine. This is the single source of truth for
// business-day arithmetic, vacation usage, overtime thresholding, the leave
// request status machine and derived presence. All handlers call through
// here; nothing in this module touches the store.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use thiserror::Error;

use crate::model::{
    Employee, LeaveState, PresenceStatus, SickLeave, SickLeaveStatus, TimeEntry, VacationRequest,
    VacationStatus,
};

pub const STANDARD_DAILY_HOURS: f64 = 8.0;

// --- Business-day counting ---

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Mon-Fri days in the inclusive range `[start, end]`. Returns 0 when
/// `end < start`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_business_day(*d))
        .count() as u32
}

// --- Vacation balance ---

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct VacationUsage {
    pub entitlement: u32,
    pub used: u32,
    /// Clamped to 0. The negative remainder is not hidden: see `deficit`.
    pub remaining: u32,
    /// Business days approved beyond the entitlement. Surfaced as an admin
    /// warning rather than a silent negative remainder.
    pub deficit: u32,
}

impl VacationUsage {
    pub fn overdrawn(&self) -> bool {
        self.deficit > 0
    }
}

/// Sums business days over all approved requests of one employee.
pub fn vacation_usage(employee: &Employee, requests: &[VacationRequest]) -> VacationUsage {
    let entitlement = employee.entitlement_days();
    let used: u32 = requests
        .iter()
        .filter(|r| r.employee_id == employee.id && r.status == VacationStatus::Genehmigt)
        .map(|r| business_days(r.start_date, r.end_date))
        .sum();
    VacationUsage {
        entitlement,
        used,
        remaining: entitlement.saturating_sub(used),
        deficit: used.saturating_sub(entitlement),
    }
}

// --- Overtime ---

/// Net worked hours minus the daily standard. Negative means undertime.
pub fn overtime(
    check_in: NaiveTime,
    check_out: NaiveTime,
    break_minutes: u32,
    standard_hours: f64,
) -> f64 {
    worked_hours(check_in, check_out, break_minutes) - standard_hours
}

/// Hours between check-in and check-out, net of the break.
pub fn worked_hours(check_in: NaiveTime, check_out: NaiveTime, break_minutes: u32) -> f64 {
    let span_minutes = (check_out - check_in).num_minutes() as f64;
    (span_minutes - break_minutes as f64) / 60.0
}

/// Automatic break policy, a step function of the gross span between
/// check-in and check-out. Only consulted when the entry opts in; a manual
/// break always wins.
pub fn auto_break_minutes(gross_hours: f64) -> u32 {
    if gross_hours >= 9.0 {
        60
    } else if gross_hours >= 6.0 {
        30
    } else if gross_hours >= 4.0 {
        15
    } else {
        0
    }
}

/// Break to apply to a closed entry: manual override first, then the
/// automatic policy if opted in, else none.
pub fn effective_break_minutes(entry: &TimeEntry) -> u32 {
    if let Some(manual) = entry.break_minutes {
        return manual;
    }
    if entry.auto_break {
        if let Some(check_out) = entry.check_out {
            let gross = (check_out - entry.check_in).num_minutes() as f64 / 60.0;
            return auto_break_minutes(gross);
        }
    }
    0
}

/// Net hours and overtime for a closed entry; `None` while the entry is
/// still open.
pub fn entry_hours(entry: &TimeEntry, standard_hours: f64) -> Option<(f64, f64)> {
    let check_out = entry.check_out?;
    let break_minutes = effective_break_minutes(entry);
    let worked = worked_hours(entry.check_in, check_out, break_minutes);
    Some((worked, worked - standard_hours))
}

// --- Leave request status machine ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The request moved from Pending to the target state.
    Applied,
    /// The request was already in the target state; no side effects.
    Unchanged,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Request was already decided and cannot be moved to a different state")]
    AlreadyDecided,
    #[error("A request cannot be moved back to pending")]
    InvalidTarget,
}

/// One-way status machine: `Pending -> {Approved, Rejected}`, both terminal.
/// Re-applying the terminal state a request is already in is an idempotent
/// no-op so a double-click on the admin page has no duplicate side effects.
pub fn apply_decision(current: LeaveState, target: LeaveState) -> Result<Transition, TransitionError> {
    if target == LeaveState::Pending {
        return Err(TransitionError::InvalidTarget);
    }
    if current == target {
        return Ok(Transition::Unchanged);
    }
    match current {
        LeaveState::Pending => Ok(Transition::Applied),
        LeaveState::Approved | LeaveState::Rejected => Err(TransitionError::AlreadyDecided),
    }
}

/// True when `[a_start, a_end]` and `[b_start, b_end]` share at least one day.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

/// Approved vacation ranges of one employee must not overlap. Checked at
/// approval time against every other approved request.
pub fn overlaps_approved_vacation(
    candidate: &VacationRequest,
    requests: &[VacationRequest],
) -> bool {
    requests.iter().any(|r| {
        r.id != candidate.id
            && r.employee_id == candidate.employee_id
            && r.status == VacationStatus::Genehmigt
            && ranges_overlap(candidate.start_date, candidate.end_date, r.start_date, r.end_date)
    })
}

// --- Derived presence ---

/// Presence for one employee on one day, recomputed from source records on
/// every read. Precedence: confirmed sick leave, then approved vacation,
/// then a check-in on the date, else absent. Because nothing is cached on
/// the employee record, editing or revoking a leave can never leave stale
/// status behind.
pub fn presence_on(
    employee_id: u64,
    date: NaiveDate,
    entries: &[TimeEntry],
    vacations: &[VacationRequest],
    sick_leaves: &[SickLeave],
) -> PresenceStatus {
    let sick = sick_leaves.iter().any(|s| {
        s.employee_id == employee_id
            && s.status == SickLeaveStatus::Bestaetigt
            && s.start_date <= date
            && date <= s.end_date
    });
    if sick {
        return PresenceStatus::Krank;
    }

    let on_vacation = vacations.iter().any(|v| {
        v.employee_id == employee_id
            && v.status == VacationStatus::Genehmigt
            && v.start_date <= date
            && date <= v.end_date
    });
    if on_vacation {
        return PresenceStatus::Urlaub;
    }

    let checked_in = entries.iter().any(|e| {
        e.employee_id == employee_id
            && e.date == date
            && e.status != crate::model::TimeEntryStatus::Storniert
    });
    if checked_in {
        PresenceStatus::Anwesend
    } else {
        PresenceStatus::Abwesend
    }
}
