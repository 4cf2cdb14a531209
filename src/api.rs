// src/api.rs
//
// Self-service HTTP handlers. Every handler follows the same shape as the
// original UI events: load the full collection(s), mutate in memory, save
// whole, answer. Admin-only management handlers live in `admin.rs`.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::{self, VacationUsage};
use crate::export;
use crate::model::{
    Audit, Employee, EmployeeCategory, PresenceStatus, SickLeave, SickLeaveStatus, StatusChange,
    TimeEntry, TimeEntryStatus, VacationRequest, VacationStatus, WorkTimeModel,
};
use crate::session;
use crate::{AppError, AppState};

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").expect("valid username regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// --- Request-scoped identity ---

/// The authenticated employee, injected into request extensions by
/// `auth_middleware`. Passed by parameter everywhere; there is no ambient
/// current-user global.
#[derive(Clone)]
pub struct CurrentUser(pub Employee);

impl CurrentUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.0.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Admins may act on anyone; everyone else only on themselves.
    pub fn require_self_or_admin(&self, employee_id: u64) -> Result<(), AppError> {
        if self.0.is_admin || self.0.id == employee_id {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

const PUBLIC_PATHS: [&str; 3] = ["/status", "/api/login", "/api/register"];

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if PUBLIC_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;
    let employee_id = state
        .sessions
        .resolve(token)
        .ok_or(AppError::Unauthorized)?;

    let employees = state.store.load::<Employee>()?;
    let employee = employees
        .records
        .iter()
        .find(|e| e.id == employee_id)
        .cloned()
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(CurrentUser(employee));
    Ok(next.run(request).await)
}

// --- Views ---

/// Employee as returned by the API; never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeView {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub team: String,
    pub location: String,
    pub work_time_model: WorkTimeModel,
    pub category: EmployeeCategory,
    pub entitlement_days: u32,
}

impl From<&Employee> for EmployeeView {
    fn from(e: &Employee) -> Self {
        Self {
            id: e.id,
            name: e.name.clone(),
            username: e.username.clone(),
            email: e.email.clone(),
            is_admin: e.is_admin,
            team: e.team.clone(),
            location: e.location.clone(),
            work_time_model: e.work_time_model,
            category: e.category,
            entitlement_days: e.entitlement_days(),
        }
    }
}

// --- Registration / login ---

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub team: String,
    pub location: String,
    pub work_time_model: WorkTimeModel,
    pub category: EmployeeCategory,
}

pub async fn handle_register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<EmployeeView>), AppError> {
    if !USERNAME_RE.is_match(&body.username) {
        return Err(AppError::Validation(
            "Username must be 3-32 characters (letters, digits, '_', '.', '-')".to_string(),
        ));
    }
    if !EMAIL_RE.is_match(&body.email) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    if body.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let mut employees = state.store.load::<Employee>()?;
    let duplicate = employees
        .records
        .iter()
        .any(|e| e.username == body.username || e.email == body.email);
    if duplicate {
        return Err(AppError::Validation(
            "Username or email is already taken".to_string(),
        ));
    }

    let employee = Employee {
        id: employees.next_id(),
        name: body.name,
        username: body.username,
        email: body.email,
        password_hash: session::hash_password(&body.password)?,
        is_admin: false,
        team: body.team,
        location: body.location,
        work_time_model: body.work_time_model,
        weekly_hours: None,
        category: body.category,
        entitlement_override: None,
    };
    let view = EmployeeView::from(&employee);

    employees.records.push(employee);
    let revision = employees.revision;
    state.store.save(&employees.records, revision)?;
    info!("Registered employee '{}'", view.username);

    Ok((StatusCode::CREATED, Json(view)))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub employee: EmployeeView,
}

pub async fn handle_login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let employees = state.store.load::<Employee>()?;
    let employee = session::authenticate(&body.identifier, &body.password, &employees.records)?;
    let token = state.sessions.open(employee.id);
    Ok(Json(LoginResponse {
        token,
        employee: EmployeeView::from(employee),
    }))
}

pub async fn handle_logout(State(state): State<AppState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.close(token);
    }
    StatusCode::NO_CONTENT
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub employee: EmployeeView,
    pub presence: PresenceStatus,
    pub vacation: VacationUsage,
}

pub async fn handle_me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<MeResponse>, AppError> {
    let entries = state.store.load::<TimeEntry>()?;
    let vacations = state.store.load::<VacationRequest>()?;
    let sick_leaves = state.store.load::<SickLeave>()?;

    Ok(Json(MeResponse {
        presence: engine::presence_on(
            user.0.id,
            today(),
            &entries.records,
            &vacations.records,
            &sick_leaves.records,
        ),
        vacation: engine::vacation_usage(&user.0, &vacations.records),
        employee: EmployeeView::from(&user.0),
    }))
}

// --- Time tracking ---

#[derive(Debug, Default, Deserialize)]
pub struct CheckInRequest {
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub auto_break: bool,
}

pub async fn handle_checkin(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<TimeEntry>), AppError> {
    let mut entries = state.store.load::<TimeEntry>()?;
    let date = today();

    // At most one open entry per employee per day.
    let already_open = entries
        .records
        .iter()
        .any(|e| e.employee_id == user.0.id && e.date == date && e.is_open());
    if already_open {
        return Err(AppError::Conflict(
            "There is already an open time entry for today".to_string(),
        ));
    }

    let entry = TimeEntry {
        id: entries.next_id(),
        employee_id: user.0.id,
        date,
        check_in: now().time(),
        check_out: None,
        break_minutes: None,
        auto_break: body.auto_break,
        status: TimeEntryStatus::Offen,
        comment: body.comment,
        audit: Audit {
            created_by: user.0.id,
            modified_by: None,
            modified_at: None,
        },
    };

    entries.records.push(entry.clone());
    let revision = entries.revision;
    state.store.save(&entries.records, revision)?;
    info!("Employee {} checked in at {}", user.0.id, entry.check_in);
    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckOutRequest {
    /// Manual break override; wins over the automatic policy.
    #[serde(default)]
    pub break_minutes: Option<u32>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckOutResponse {
    pub entry: TimeEntry,
    pub worked_hours: f64,
    pub overtime_hours: f64,
}

pub async fn handle_checkout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CheckOutRequest>,
) -> Result<Json<CheckOutResponse>, AppError> {
    let mut entries = state.store.load::<TimeEntry>()?;
    let date = today();

    let entry = entries
        .records
        .iter_mut()
        .find(|e| e.employee_id == user.0.id && e.date == date && e.is_open())
        .ok_or(AppError::NotFound("Open time entry"))?;

    entry.check_out = Some(now().time());
    if body.break_minutes.is_some() {
        entry.break_minutes = body.break_minutes;
    }
    if body.comment.is_some() {
        entry.comment = body.comment;
    }
    entry.status = TimeEntryStatus::Abgeschlossen;
    entry.audit.modified_by = Some(user.0.id);
    entry.audit.modified_at = Some(now());

    let closed = entry.clone();
    let revision = entries.revision;
    state.store.save(&entries.records, revision)?;

    let (worked_hours, overtime_hours) = engine::entry_hours(&closed, state.standard_hours)
        .unwrap_or((0.0, -state.standard_hours));
    info!(
        "Employee {} checked out ({:.2}h worked)",
        user.0.id, worked_hours
    );
    Ok(Json(CheckOutResponse {
        entry: closed,
        worked_hours,
        overtime_hours,
    }))
}

#[derive(Debug, Deserialize)]
pub struct EntryFilter {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub employee_id: Option<u64>,
}

impl EntryFilter {
    fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

pub async fn handle_list_entries(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<EntryFilter>,
) -> Result<Json<Vec<TimeEntry>>, AppError> {
    let scope_id = filter.employee_id.unwrap_or(user.0.id);
    user.require_self_or_admin(scope_id)?;

    let entries = state.store.load::<TimeEntry>()?;
    let selected = entries
        .records
        .into_iter()
        .filter(|e| e.employee_id == scope_id && filter.contains(e.date))
        .collect();
    Ok(Json(selected))
}

#[derive(Debug, Deserialize)]
pub struct UpdateTimeEntry {
    #[serde(default)]
    pub check_in: Option<NaiveTime>,
    #[serde(default)]
    pub check_out: Option<NaiveTime>,
    #[serde(default)]
    pub break_minutes: Option<u32>,
    #[serde(default)]
    pub auto_break: Option<bool>,
    #[serde(default)]
    pub comment: Option<String>,
}

pub async fn handle_update_entry(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<u64>,
    Json(body): Json<UpdateTimeEntry>,
) -> Result<Json<TimeEntry>, AppError> {
    let mut entries = state.store.load::<TimeEntry>()?;
    let entry = entries
        .records
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or(AppError::NotFound("Time entry"))?;
    user.require_self_or_admin(entry.employee_id)?;

    if entry.status == TimeEntryStatus::Storniert {
        return Err(AppError::Conflict(
            "A cancelled time entry cannot be edited".to_string(),
        ));
    }

    if let Some(check_in) = body.check_in {
        entry.check_in = check_in;
    }
    if let Some(check_out) = body.check_out {
        entry.check_out = Some(check_out);
        entry.status = TimeEntryStatus::Abgeschlossen;
    }
    if body.break_minutes.is_some() {
        entry.break_minutes = body.break_minutes;
    }
    if let Some(auto_break) = body.auto_break {
        entry.auto_break = auto_break;
    }
    if body.comment.is_some() {
        entry.comment = body.comment;
    }

    if let Some(check_out) = entry.check_out {
        if check_out < entry.check_in {
            return Err(AppError::Validation(
                "Check-out must not be before check-in".to_string(),
            ));
        }
    }

    entry.audit.modified_by = Some(user.0.id);
    entry.audit.modified_at = Some(now());

    let updated = entry.clone();
    let revision = entries.revision;
    state.store.save(&entries.records, revision)?;
    Ok(Json(updated))
}

/// Cancels (Storniert) an entry rather than deleting the record, so the
/// audit trail survives.
pub async fn handle_cancel_entry(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<u64>,
) -> Result<Json<TimeEntry>, AppError> {
    let mut entries = state.store.load::<TimeEntry>()?;
    let entry = entries
        .records
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or(AppError::NotFound("Time entry"))?;
    user.require_self_or_admin(entry.employee_id)?;

    entry.status = TimeEntryStatus::Storniert;
    entry.audit.modified_by = Some(user.0.id);
    entry.audit.modified_at = Some(now());

    let cancelled = entry.clone();
    let revision = entries.revision;
    state.store.save(&entries.records, revision)?;
    Ok(Json(cancelled))
}

// --- Vacation requests ---

#[derive(Debug, Deserialize)]
pub struct NewVacationRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    #[serde(default)]
    pub substitute: Option<String>,
}

pub async fn handle_create_vacation(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<NewVacationRequest>,
) -> Result<(StatusCode, Json<VacationRequest>), AppError> {
    if body.end_date < body.start_date {
        return Err(AppError::Validation(
            "End date must not be before start date".to_string(),
        ));
    }
    if engine::business_days(body.start_date, body.end_date) == 0 {
        return Err(AppError::Validation(
            "The requested range contains no business days".to_string(),
        ));
    }

    let mut vacations = state.store.load::<VacationRequest>()?;
    let request = VacationRequest {
        id: vacations.next_id(),
        employee_id: user.0.id,
        start_date: body.start_date,
        end_date: body.end_date,
        status: VacationStatus::Beantragt,
        reason: body.reason,
        substitute: body.substitute,
        comments: Vec::new(),
        transitions: Vec::new(),
    };

    vacations.records.push(request.clone());
    let revision = vacations.revision;
    state.store.save(&vacations.records, revision)?;
    info!(
        "Employee {} requested vacation {} to {}",
        user.0.id, request.start_date, request.end_date
    );
    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Debug, Deserialize)]
pub struct LeaveFilter {
    #[serde(default)]
    pub employee_id: Option<u64>,
}

pub async fn handle_list_vacations(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<LeaveFilter>,
) -> Result<Json<Vec<VacationRequest>>, AppError> {
    let vacations = state.store.load::<VacationRequest>()?;
    let selected = scope_leave_records(&user, filter.employee_id, vacations.records, |v| {
        v.employee_id
    })?;
    Ok(Json(selected))
}

/// Non-admins only ever see their own records; admins may scope by employee
/// or see everything.
fn scope_leave_records<T>(
    user: &CurrentUser,
    requested: Option<u64>,
    records: Vec<T>,
    employee_id: impl Fn(&T) -> u64,
) -> Result<Vec<T>, AppError> {
    match requested {
        Some(id) => {
            user.require_self_or_admin(id)?;
            Ok(records.into_iter().filter(|r| employee_id(r) == id).collect())
        }
        None if user.0.is_admin => Ok(records),
        None => {
            let own = user.0.id;
            Ok(records
                .into_iter()
                .filter(|r| employee_id(r) == own)
                .collect())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VacationDecision {
    pub status: VacationStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Admin decision on a vacation request. Re-applying the decision a request
/// already carries is an idempotent no-op: no audit entry, and the body's
/// comment is dropped with the rest of the side effects.
pub async fn handle_decide_vacation(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<u64>,
    Json(body): Json<VacationDecision>,
) -> Result<Json<VacationRequest>, AppError> {
    user.require_admin()?;

    let mut vacations = state.store.load::<VacationRequest>()?;
    let index = vacations
        .records
        .iter()
        .position(|v| v.id == id)
        .ok_or(AppError::NotFound("Vacation request"))?;

    let current = vacations.records[index].status;
    match engine::apply_decision(current.state(), body.status.state())? {
        engine::Transition::Unchanged => {
            // Idempotent re-apply: no audit entry, no side effects.
            return Ok(Json(vacations.records[index].clone()));
        }
        engine::Transition::Applied => {}
    }

    if body.status == VacationStatus::Genehmigt {
        let mut candidate = vacations.records[index].clone();
        candidate.status = VacationStatus::Genehmigt;
        if engine::overlaps_approved_vacation(&candidate, &vacations.records) {
            return Err(AppError::Conflict(
                "Approved vacation ranges must not overlap".to_string(),
            ));
        }
    }

    let request = &mut vacations.records[index];
    request.transitions.push(StatusChange {
        from: current.label().to_string(),
        to: body.status.label().to_string(),
        by: user.0.id,
        at: now(),
    });
    if let Some(comment) = body.comment {
        request.comments.push(comment);
    }
    request.status = body.status;

    let decided = request.clone();
    let revision = vacations.revision;
    state.store.save(&vacations.records, revision)?;
    info!(
        "Vacation request {} moved to {} by admin {}",
        decided.id,
        decided.status.label(),
        user.0.id
    );
    Ok(Json(decided))
}

// --- Sick leaves ---

#[derive(Debug, Deserialize)]
pub struct NewSickLeave {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub category: String,
    #[serde(default)]
    pub doctor_note: bool,
}

pub async fn handle_create_sick_leave(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<NewSickLeave>,
) -> Result<(StatusCode, Json<SickLeave>), AppError> {
    if body.end_date < body.start_date {
        return Err(AppError::Validation(
            "End date must not be before start date".to_string(),
        ));
    }

    let mut sick_leaves = state.store.load::<SickLeave>()?;
    let leave = SickLeave {
        id: sick_leaves.next_id(),
        employee_id: user.0.id,
        start_date: body.start_date,
        end_date: body.end_date,
        category: body.category,
        doctor_note: body.doctor_note,
        status: SickLeaveStatus::Eingereicht,
        transitions: Vec::new(),
    };

    sick_leaves.records.push(leave.clone());
    let revision = sick_leaves.revision;
    state.store.save(&sick_leaves.records, revision)?;
    Ok((StatusCode::CREATED, Json(leave)))
}

pub async fn handle_list_sick_leaves(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<LeaveFilter>,
) -> Result<Json<Vec<SickLeave>>, AppError> {
    let sick_leaves = state.store.load::<SickLeave>()?;
    let selected = scope_leave_records(&user, filter.employee_id, sick_leaves.records, |s| {
        s.employee_id
    })?;
    Ok(Json(selected))
}

#[derive(Debug, Deserialize)]
pub struct SickLeaveDecision {
    pub status: SickLeaveStatus,
}

pub async fn handle_decide_sick_leave(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<u64>,
    Json(body): Json<SickLeaveDecision>,
) -> Result<Json<SickLeave>, AppError> {
    user.require_admin()?;

    let mut sick_leaves = state.store.load::<SickLeave>()?;
    let leave = sick_leaves
        .records
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or(AppError::NotFound("Sick leave"))?;

    let current = leave.status;
    match engine::apply_decision(current.state(), body.status.state())? {
        engine::Transition::Unchanged => return Ok(Json(leave.clone())),
        engine::Transition::Applied => {}
    }

    leave.transitions.push(StatusChange {
        from: current.label().to_string(),
        to: body.status.label().to_string(),
        by: user.0.id,
        at: now(),
    });
    leave.status = body.status;

    let decided = leave.clone();
    let revision = sick_leaves.revision;
    state.store.save(&sick_leaves.records, revision)?;
    Ok(Json(decided))
}

// --- Balance, calendar, dashboard ---

pub async fn handle_balance(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(employee_id): Path<u64>,
) -> Result<Json<VacationUsage>, AppError> {
    user.require_self_or_admin(employee_id)?;

    let employees = state.store.load::<Employee>()?;
    let employee = employees
        .records
        .iter()
        .find(|e| e.id == employee_id)
        .ok_or(AppError::NotFound("Employee"))?;
    let vacations = state.store.load::<VacationRequest>()?;

    Ok(Json(engine::vacation_usage(employee, &vacations.records)))
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    #[serde(default)]
    pub employee_id: Option<u64>,
}

pub async fn handle_calendar(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path((year, month)): Path<(i32, u32)>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<crate::calendar::DayCell>>, AppError> {
    let scope_id = query.employee_id.unwrap_or(user.0.id);
    user.require_self_or_admin(scope_id)?;

    let entries = state.store.load::<TimeEntry>()?;
    let vacations = state.store.load::<VacationRequest>()?;
    let sick_leaves = state.store.load::<SickLeave>()?;

    let cells = crate::calendar::month_view(
        year,
        month,
        scope_id,
        &entries.records,
        &vacations.records,
        &sick_leaves.records,
        state.standard_hours,
    )
    .ok_or_else(|| AppError::Validation(format!("Invalid month: {}-{}", year, month)))?;

    Ok(Json(cells))
}

pub async fn handle_dashboard(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
) -> Result<Json<crate::calendar::DashboardSummary>, AppError> {
    let employees = state.store.load::<Employee>()?;
    let entries = state.store.load::<TimeEntry>()?;
    let vacations = state.store.load::<VacationRequest>()?;
    let sick_leaves = state.store.load::<SickLeave>()?;

    Ok(Json(crate::calendar::dashboard(
        today(),
        &employees.records,
        &entries.records,
        &vacations.records,
        &sick_leaves.records,
        state.standard_hours,
    )))
}

// --- CSV exports (admin) ---

fn csv_response(filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

pub async fn handle_export_time_csv(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<EntryFilter>,
) -> Result<Response, AppError> {
    user.require_admin()?;

    let employees = state.store.load::<Employee>()?;
    let entries = state.store.load::<TimeEntry>()?;
    let selected: Vec<TimeEntry> = entries
        .records
        .into_iter()
        .filter(|e| {
            filter.contains(e.date)
                && filter.employee_id.map_or(true, |id| e.employee_id == id)
        })
        .collect();

    let bytes = export::time_entries_csv(&selected, &employees.records, state.standard_hours)?;
    Ok(csv_response("time_entries.csv", bytes))
}

pub async fn handle_export_vacation_csv(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, AppError> {
    user.require_admin()?;

    let employees = state.store.load::<Employee>()?;
    let vacations = state.store.load::<VacationRequest>()?;
    let bytes = export::vacation_requests_csv(&vacations.records, &employees.records)?;
    Ok(csv_response("vacation_requests.csv", bytes))
}

pub async fn handle_export_employees_csv(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, AppError> {
    user.require_admin()?;

    let employees = state.store.load::<Employee>()?;
    let bytes = export::employees_csv(&employees.records)?;
    Ok(csv_response("employees.csv", bytes))
}

// --- Status page ---

pub async fn handle_status(State(state): State<AppState>) -> Result<axum::response::Html<String>, AppError> {
    let employees = state.store.load::<Employee>()?;
    let entries = state.store.load::<TimeEntry>()?;
    let vacations = state.store.load::<VacationRequest>()?;
    let sick_leaves = state.store.load::<SickLeave>()?;

    let html = format!(
        "<h1>Server Status</h1><p>Current Time (Server): {}</p><hr>\
         <p>Employees: {}</p>\
         <p>Time Entries: {}</p>\
         <p>Vacation Requests: {}</p>\
         <p>Sick Leaves: {}</p>\
         <p>Store Warnings: {}</p>",
        Local::now().to_rfc3339(),
        employees.records.len(),
        entries.records.len(),
        vacations.records.len(),
        sick_leaves.records.len(),
        state.store.warnings().len(),
    );
    Ok(axum::response::Html(html))
}
