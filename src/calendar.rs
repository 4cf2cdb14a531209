// src/calendar.rs
//
// Derived per-day and per-month views plus the dashboard summary. Purely
// presentational joins over the loaded collections; all arithmetic comes
// from `engine`.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::engine;
use crate::holidays;
use crate::model::{
    Employee, PresenceStatus, SickLeave, TimeEntry, TimeEntryStatus, VacationRequest,
    VacationStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DayKind {
    Workday,
    Weekend,
    Holiday,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub weekday: String,
    pub kind: DayKind,
    pub holiday: Option<&'static str>,
    pub school_holiday: Option<&'static str>,
    pub presence: PresenceStatus,
    pub vacation: bool,
    pub sick: bool,
    pub worked_hours: Option<f64>,
    pub overtime_hours: Option<f64>,
}

/// One cell per day of the month for a single employee.
pub fn month_view(
    year: i32,
    month: u32,
    employee_id: u64,
    entries: &[TimeEntry],
    vacations: &[VacationRequest],
    sick_leaves: &[SickLeave],
    standard_hours: f64,
) -> Option<Vec<DayCell>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let mut cells = Vec::with_capacity(31);

    for date in first.iter_days().take_while(|d| d.month() == month) {
        let holiday = holidays::public_holiday_on(date);
        let kind = if holiday.is_some() {
            DayKind::Holiday
        } else if engine::is_business_day(date) {
            DayKind::Workday
        } else {
            DayKind::Weekend
        };

        let presence = engine::presence_on(employee_id, date, entries, vacations, sick_leaves);

        // Daily totals over all closed entries for the date.
        let mut worked = 0.0;
        let mut over = 0.0;
        let mut any_closed = false;
        for entry in entries.iter().filter(|e| {
            e.employee_id == employee_id && e.date == date && e.status != TimeEntryStatus::Storniert
        }) {
            if let Some((w, o)) = engine::entry_hours(entry, standard_hours) {
                worked += w;
                over += o;
                any_closed = true;
            }
        }

        cells.push(DayCell {
            date,
            weekday: date.weekday().to_string(),
            kind,
            holiday,
            school_holiday: holidays::school_holiday_on(date),
            presence,
            vacation: presence == PresenceStatus::Urlaub,
            sick: presence == PresenceStatus::Krank,
            worked_hours: any_closed.then_some(worked),
            overtime_hours: any_closed.then_some(over),
        });
    }

    Some(cells)
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub date: NaiveDate,
    pub anwesend: usize,
    pub abwesend: usize,
    pub krank: usize,
    pub urlaub: usize,
    pub pending_vacation_requests: usize,
    pub pending_sick_leaves: usize,
    /// Overtime across all closed entries of the current month, all employees.
    pub month_overtime_hours: f64,
}

pub fn dashboard(
    today: NaiveDate,
    employees: &[Employee],
    entries: &[TimeEntry],
    vacations: &[VacationRequest],
    sick_leaves: &[SickLeave],
    standard_hours: f64,
) -> DashboardSummary {
    let mut summary = DashboardSummary {
        date: today,
        anwesend: 0,
        abwesend: 0,
        krank: 0,
        urlaub: 0,
        pending_vacation_requests: vacations
            .iter()
            .filter(|v| v.status == VacationStatus::Beantragt)
            .count(),
        pending_sick_leaves: sick_leaves
            .iter()
            .filter(|s| s.status == crate::model::SickLeaveStatus::Eingereicht)
            .count(),
        month_overtime_hours: 0.0,
    };

    for employee in employees {
        match engine::presence_on(employee.id, today, entries, vacations, sick_leaves) {
            PresenceStatus::Anwesend => summary.anwesend += 1,
            PresenceStatus::Abwesend => summary.abwesend += 1,
            PresenceStatus::Krank => summary.krank += 1,
            PresenceStatus::Urlaub => summary.urlaub += 1,
        }
    }

    summary.month_overtime_hours = entries
        .iter()
        .filter(|e| {
            e.date.year() == today.year()
                && e.date.month() == today.month()
                && e.status != TimeEntryStatus::Storniert
        })
        .filter_map(|e| engine::entry_hours(e, standard_hours).map(|(_, o)| o))
        .sum();

    summary
}
