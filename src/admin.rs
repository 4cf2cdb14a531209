// src/admin.rs
//
// Admin management handlers: employee CRUD (delete cascades to the
// employee's time entries and leave records) and the warnings page that
// surfaces store corruption and overdrawn vacation balances.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::{CurrentUser, EmployeeView};
use crate::engine;
use crate::model::{
    Employee, EmployeeCategory, SickLeave, TimeEntry, VacationRequest, WorkTimeModel,
};
use crate::session;
use crate::store::StoreWarning;
use crate::{AppError, AppState};

pub async fn handle_list_employees(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<EmployeeView>>, AppError> {
    user.require_admin()?;
    let employees = state.store.load::<Employee>()?;
    Ok(Json(
        employees.records.iter().map(EmployeeView::from).collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    pub team: String,
    pub location: String,
    pub work_time_model: WorkTimeModel,
    #[serde(default)]
    pub weekly_hours: Option<f64>,
    pub category: EmployeeCategory,
    #[serde(default)]
    pub entitlement_override: Option<u32>,
}

pub async fn handle_create_employee(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<NewEmployee>,
) -> Result<(StatusCode, Json<EmployeeView>), AppError> {
    user.require_admin()?;

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
        is_admin: body.is_admin,
        team: body.team,
        location: body.location,
        work_time_model: body.work_time_model,
        weekly_hours: body.weekly_hours,
        category: body.category,
        entitlement_override: body.entitlement_override,
    };
    let view = EmployeeView::from(&employee);

    employees.records.push(employee);
    let revision = employees.revision;
    state.store.save(&employees.records, revision)?;
    info!("Admin {} created employee '{}'", user.0.id, view.username);
    Ok((StatusCode::CREATED, Json(view)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmployee {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub work_time_model: Option<WorkTimeModel>,
    #[serde(default)]
    pub weekly_hours: Option<f64>,
    #[serde(default)]
    pub category: Option<EmployeeCategory>,
    #[serde(default)]
    pub entitlement_override: Option<u32>,
}

pub async fn handle_update_employee(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<u64>,
    Json(body): Json<UpdateEmployee>,
) -> Result<Json<EmployeeView>, AppError> {
    user.require_admin()?;

    let mut employees = state.store.load::<Employee>()?;

    if let Some(email) = &body.email {
        let taken = employees
            .records
            .iter()
            .any(|e| e.id != id && &e.email == email);
        if taken {
            return Err(AppError::Validation("Email is already taken".to_string()));
        }
    }

    let employee = employees
        .records
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or(AppError::NotFound("Employee"))?;

    if let Some(name) = body.name {
        employee.name = name;
    }
    if let Some(email) = body.email {
        employee.email = email;
    }
    if let Some(password) = body.password {
        employee.password_hash = session::hash_password(&password)?;
    }
    if let Some(is_admin) = body.is_admin {
        employee.is_admin = is_admin;
    }
    if let Some(team) = body.team {
        employee.team = team;
    }
    if let Some(location) = body.location {
        employee.location = location;
    }
    if let Some(model) = body.work_time_model {
        employee.work_time_model = model;
    }
    if body.weekly_hours.is_some() {
        employee.weekly_hours = body.weekly_hours;
    }
    if let Some(category) = body.category {
        employee.category = category;
    }
    if body.entitlement_override.is_some() {
        employee.entitlement_override = body.entitlement_override;
    }

    let view = EmployeeView::from(&*employee);
    let revision = employees.revision;
    state.store.save(&employees.records, revision)?;
    Ok(Json(view))
}

/// Deletes an employee and cascades to their time entries, vacation
/// requests and sick leaves.
pub async fn handle_delete_employee(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    user.require_admin()?;
    if user.0.id == id {
        return Err(AppError::Conflict(
            "Admins cannot delete their own account".to_string(),
        ));
    }

    let mut employees = state.store.load::<Employee>()?;
    let before = employees.records.len();
    employees.records.retain(|e| e.id != id);
    if employees.records.len() == before {
        return Err(AppError::NotFound("Employee"));
    }
    let revision = employees.revision;
    state.store.save(&employees.records, revision)?;

    let mut entries = state.store.load::<TimeEntry>()?;
    entries.records.retain(|e| e.employee_id != id);
    let revision = entries.revision;
    state.store.save(&entries.records, revision)?;

    let mut vacations = state.store.load::<VacationRequest>()?;
    vacations.records.retain(|v| v.employee_id != id);
    let revision = vacations.revision;
    state.store.save(&vacations.records, revision)?;

    let mut sick_leaves = state.store.load::<SickLeave>()?;
    sick_leaves.records.retain(|s| s.employee_id != id);
    let revision = sick_leaves.revision;
    state.store.save(&sick_leaves.records, revision)?;

    warn!("Admin {} deleted employee {} with cascade", user.0.id, id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct BalanceWarning {
    pub employee_id: u64,
    pub name: String,
    pub entitlement: u32,
    pub used: u32,
    pub deficit: u32,
}

#[derive(Debug, Serialize)]
pub struct AdminWarnings {
    pub store: Vec<StoreWarning>,
    pub overdrawn_balances: Vec<BalanceWarning>,
}

/// Data problems an admin must see: collection files that failed to parse
/// and employees whose approved vacation exceeds their entitlement.
pub async fn handle_warnings(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<AdminWarnings>, AppError> {
    user.require_admin()?;

    let employees = state.store.load::<Employee>()?;
    let vacations = state.store.load::<VacationRequest>()?;

    let overdrawn_balances = employees
        .records
        .iter()
        .filter_map(|employee| {
            let usage = engine::vacation_usage(employee, &vacations.records);
            usage.overdrawn().then(|| BalanceWarning {
                employee_id: employee.id,
                name: employee.name.clone(),
                entitlement: usage.entitlement,
                used: usage.used,
                deficit: usage.deficit,
            })
        })
        .collect();

    Ok(Json(AdminWarnings {
        store: state.store.warnings(),
        overdrawn_balances,
    }))
}
