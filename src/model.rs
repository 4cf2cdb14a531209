// src/model.rs
//
// Persisted record types. Collections are whole JSON arrays, one file per
// collection under the data directory; dates serialize as ISO-8601 strings.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub type EmployeeId = u64;

/// A persisted collection record. Every record type names its collection file
/// and exposes its numeric id so the store can hand out `max(id) + 1`.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const COLLECTION: &'static str;
    fn id(&self) -> u64;
}

// --- Employee ---

/// Derived presence for a single day. Never persisted on the employee record;
/// always recomputed from time entries and approved leave ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceStatus {
    Anwesend,
    Abwesend,
    Krank,
    Urlaub,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkTimeModel {
    Vollzeit,
    Teilzeit,
    Individuell,
}

/// Entitlement tier. The source keyed this off free-form role/team strings in
/// two disagreeing places; here it is an explicit field with a fixed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeCategory {
    Buero,
    Betrieb,
}

impl EmployeeCategory {
    pub fn entitlement_days(&self) -> u32 {
        match self {
            EmployeeCategory::Buero => 27,
            EmployeeCategory::Betrieb => 26,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub username: String,
    pub email: String,
    /// bcrypt hash. Plaintext is never stored.
    pub password_hash: String,
    #[serde(default)]
    pub is_admin: bool,
    pub team: String,
    pub location: String,
    pub work_time_model: WorkTimeModel,
    /// Weekly hours for `Individuell` schedules; metadata only, not used for
    /// pro-ration.
    #[serde(default)]
    pub weekly_hours: Option<f64>,
    pub category: EmployeeCategory,
    /// Admin-set override of the category entitlement tier.
    #[serde(default)]
    pub entitlement_override: Option<u32>,
}

impl Employee {
    pub fn entitlement_days(&self) -> u32 {
        self.entitlement_override
            .unwrap_or_else(|| self.category.entitlement_days())
    }
}

impl Record for Employee {
    const COLLECTION: &'static str = "employees";
    fn id(&self) -> u64 {
        self.id
    }
}

// --- Time entries ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeEntryStatus {
    Offen,
    InBearbeitung,
    Abgeschlossen,
    Storniert,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Audit {
    pub created_by: EmployeeId,
    #[serde(default)]
    pub modified_by: Option<EmployeeId>,
    #[serde(default)]
    pub modified_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: u64,
    pub employee_id: EmployeeId,
    pub date: NaiveDate,
    pub check_in: NaiveTime,
    #[serde(default)]
    pub check_out: Option<NaiveTime>,
    /// Manually entered break. Always wins over the automatic policy.
    #[serde(default)]
    pub break_minutes: Option<u32>,
    /// Opt-in to the automatic break step function at checkout.
    #[serde(default)]
    pub auto_break: bool,
    pub status: TimeEntryStatus,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub audit: Audit,
}

impl TimeEntry {
    pub fn is_open(&self) -> bool {
        self.status == TimeEntryStatus::Offen && self.check_out.is_none()
    }
}

impl Record for TimeEntry {
    const COLLECTION: &'static str = "time_entries";
    fn id(&self) -> u64 {
        self.id
    }
}

// --- Leave requests ---

/// Collection-independent view of a leave request's lifecycle, consumed by
/// the status machine in `engine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveState {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VacationStatus {
    Beantragt,
    Genehmigt,
    Abgelehnt,
}

impl VacationStatus {
    pub fn state(&self) -> LeaveState {
        match self {
            VacationStatus::Beantragt => LeaveState::Pending,
            VacationStatus::Genehmigt => LeaveState::Approved,
            VacationStatus::Abgelehnt => LeaveState::Rejected,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VacationStatus::Beantragt => "Beantragt",
            VacationStatus::Genehmigt => "Genehmigt",
            VacationStatus::Abgelehnt => "Abgelehnt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SickLeaveStatus {
    Eingereicht,
    Bestaetigt,
    Abgelehnt,
}

impl SickLeaveStatus {
    pub fn state(&self) -> LeaveState {
        match self {
            SickLeaveStatus::Eingereicht => LeaveState::Pending,
            SickLeaveStatus::Bestaetigt => LeaveState::Approved,
            SickLeaveStatus::Abgelehnt => LeaveState::Rejected,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SickLeaveStatus::Eingereicht => "Eingereicht",
            SickLeaveStatus::Bestaetigt => "Bestaetigt",
            SickLeaveStatus::Abgelehnt => "Abgelehnt",
        }
    }
}

/// One effective status transition, appended to the request's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: String,
    pub to: String,
    pub by: EmployeeId,
    pub at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacationRequest {
    pub id: u64,
    pub employee_id: EmployeeId,
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    pub status: VacationStatus,
    pub reason: String,
    #[serde(default)]
    pub substitute: Option<String>,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub transitions: Vec<StatusChange>,
}

impl Record for VacationRequest {
    const COLLECTION: &'static str = "vacation_requests";
    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SickLeave {
    pub id: u64,
    pub employee_id: EmployeeId,
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    pub category: String,
    #[serde(default)]
    pub doctor_note: bool,
    pub status: SickLeaveStatus,
    #[serde(default)]
    pub transitions: Vec<StatusChange>,
}

impl Record for SickLeave {
    const COLLECTION: &'static str = "sick_leaves";
    fn id(&self) -> u64 {
        self.id
    }
}
