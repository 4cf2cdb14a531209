// src/export.rs
//
// CSV export of filtered collections. The byte-level format is not
// load-bearing; columns are a flat dump plus the engine's derived fields.

use std::collections::HashMap;
use thiserror::Error;

use crate::engine;
use crate::model::{Employee, TimeEntry, VacationRequest};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV buffer error: {0}")]
    Buffer(#[from] csv::IntoInnerError<csv::Writer<Vec<u8>>>),
}

fn employee_names(employees: &[Employee]) -> HashMap<u64, &str> {
    employees.iter().map(|e| (e.id, e.name.as_str())).collect()
}

pub fn time_entries_csv(
    entries: &[TimeEntry],
    employees: &[Employee],
    standard_hours: f64,
) -> Result<Vec<u8>, ExportError> {
    let names = employee_names(employees);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "date",
        "employee",
        "check_in",
        "check_out",
        "break_minutes",
        "worked_hours",
        "overtime_hours",
        "status",
        "comment",
    ])?;

    for entry in entries {
        let (worked, over) = match engine::entry_hours(entry, standard_hours) {
            Some((w, o)) => (format!("{:.2}", w), format!("{:.2}", o)),
            None => (String::new(), String::new()),
        };
        writer.write_record([
            entry.date.to_string(),
            names.get(&entry.employee_id).unwrap_or(&"?").to_string(),
            entry.check_in.format("%H:%M").to_string(),
            entry
                .check_out
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
            engine::effective_break_minutes(entry).to_string(),
            worked,
            over,
            format!("{:?}", entry.status),
            entry.comment.clone().unwrap_or_default(),
        ])?;
    }

    Ok(writer.into_inner()?)
}

pub fn vacation_requests_csv(
    requests: &[VacationRequest],
    employees: &[Employee],
) -> Result<Vec<u8>, ExportError> {
    let names = employee_names(employees);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "employee",
        "start_date",
        "end_date",
        "business_days",
        "status",
        "reason",
        "substitute",
    ])?;

    for request in requests {
        writer.write_record([
            names.get(&request.employee_id).unwrap_or(&"?").to_string(),
            request.start_date.to_string(),
            request.end_date.to_string(),
            engine::business_days(request.start_date, request.end_date).to_string(),
            request.status.label().to_string(),
            request.reason.clone(),
            request.substitute.clone().unwrap_or_default(),
        ])?;
    }

    Ok(writer.into_inner()?)
}

pub fn employees_csv(employees: &[Employee]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "name",
        "username",
        "email",
        "team",
        "location",
        "work_time_model",
        "category",
        "entitlement_days",
        "is_admin",
    ])?;

    for employee in employees {
        writer.write_record([
            employee.id.to_string(),
            employee.name.clone(),
            employee.username.clone(),
            employee.email.clone(),
            employee.team.clone(),
            employee.location.clone(),
            format!("{:?}", employee.work_time_model),
            format!("{:?}", employee.category),
            employee.entitlement_days().to_string(),
            employee.is_admin.to_string(),
        ])?;
    }

    Ok(writer.into_inner()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Audit, TimeEntryStatus, VacationStatus};
    use chrono::{NaiveDate, NaiveTime};

    fn employee() -> Employee {
        Employee {
            id: 1,
            name: "Maria Muster".to_string(),
            username: "mmuster".to_string(),
            email: "m.muster@example.com".to_string(),
            password_hash: String::new(),
            is_admin: false,
            team: "Montage".to_string(),
            location: "Essen".to_string(),
            work_time_model: crate::model::WorkTimeModel::Vollzeit,
            weekly_hours: None,
            category: crate::model::EmployeeCategory::Betrieb,
            entitlement_override: None,
        }
    }

    #[test]
    fn time_entries_csv_carries_derived_columns() {
        let entry = TimeEntry {
            id: 1,
            employee_id: 1,
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            check_in: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            check_out: Some(NaiveTime::from_hms_opt(19, 0, 0).unwrap()),
            break_minutes: Some(60),
            auto_break: false,
            status: TimeEntryStatus::Abgeschlossen,
            comment: Some("Inventur".to_string()),
            audit: Audit::default(),
        };
        let bytes = time_entries_csv(&[entry], &[employee()], 8.0).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("date,employee,check_in"));
        assert!(text.contains("2025-06-02,Maria Muster,08:00,19:00,60,10.00,2.00"));
    }

    #[test]
    fn vacation_csv_counts_business_days() {
        let request = VacationRequest {
            id: 1,
            employee_id: 1,
            start_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 6, 8).unwrap(),
            status: VacationStatus::Genehmigt,
            reason: "Sommerurlaub".to_string(),
            substitute: None,
            comments: Vec::new(),
            transitions: Vec::new(),
        };
        let bytes = vacation_requests_csv(&[request], &[employee()]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("Maria Muster,2025-06-02,2025-06-08,5,Genehmigt"));
    }
}
