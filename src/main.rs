// src/main.rs
use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use clap::Parser;
use serde::Deserialize;
use std::{path::PathBuf, sync::Arc, time::Duration};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod admin;
mod api;
mod calendar;
mod engine;
mod export;
mod holidays;
mod model;
mod session;
mod store;

#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod store_tests;

use session::{AuthError, SessionManager};
use store::{JsonStore, StoreError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Admin privileges required")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid status transition: {0}")]
    Transition(#[from] engine::TransitionError),
    #[error("Store error")]
    Store(#[from] StoreError),
    #[error("Authentication error")]
    Auth(#[from] AuthError),
    #[error("Export error")]
    Export(#[from] export::ExportError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::Transition(e) => (StatusCode::CONFLICT, e.to_string()),
            AppError::Store(StoreError::Conflict { collection, .. }) => (
                StatusCode::CONFLICT,
                format!(
                    "The '{}' data changed while processing the request. Please retry.",
                    collection
                ),
            ),
            AppError::Store(e) => {
                error!("Store error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal storage error.".to_string(),
                )
            }
            AppError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials.to_string(),
            ),
            AppError::Auth(e) => {
                error!("Password hashing error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal authentication error.".to_string(),
                )
            }
            AppError::Export(e) => {
                error!("Export error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Export failed.".to_string(),
                )
            }
        };
        (status_code, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_data_dir() -> String {
    "data".to_string()
}
fn default_session_ttl_hours() -> u64 {
    12
}
fn default_standard_daily_hours() -> f64 {
    engine::STANDARD_DAILY_HOURS
}

#[derive(Debug, Deserialize, Clone)]
struct EnvConfig {
    #[serde(default = "default_host")]
    server_host: String,
    #[serde(default = "default_port")]
    server_port: u16,
    #[serde(default = "default_data_dir")]
    data_dir: String,
    #[serde(default = "default_session_ttl_hours")]
    session_ttl_hours: u64,
    #[serde(default = "default_standard_daily_hours")]
    standard_daily_hours: f64,
}

impl EnvConfig {
    fn from_env() -> Result<Self, envy::Error> {
        dotenv::dotenv().ok();
        envy::from_env::<EnvConfig>()
    }
}

/// Launcher flags; each overrides the corresponding environment setting.
#[derive(Debug, Parser)]
#[command(name = "zeiterfassung-server", about = "Employee time tracking backend")]
struct Cli {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
    pub sessions: Arc<SessionManager>,
    pub standard_hours: f64,
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/register", post(api::handle_register))
        .route("/login", post(api::handle_login))
        .route("/logout", post(api::handle_logout))
        .route("/me", get(api::handle_me))
        .route("/time/checkin", post(api::handle_checkin))
        .route("/time/checkout", post(api::handle_checkout))
        .route("/time/entries", get(api::handle_list_entries))
        .route(
            "/time/entries/{id}",
            put(api::handle_update_entry).delete(api::handle_cancel_entry),
        )
        .route(
            "/vacation",
            post(api::handle_create_vacation).get(api::handle_list_vacations),
        )
        .route("/vacation/{id}/decide", post(api::handle_decide_vacation))
        .route(
            "/sick",
            post(api::handle_create_sick_leave).get(api::handle_list_sick_leaves),
        )
        .route("/sick/{id}/decide", post(api::handle_decide_sick_leave))
        .route("/balance/{employee_id}", get(api::handle_balance))
        .route("/calendar/{year}/{month}", get(api::handle_calendar))
        .route("/dashboard", get(api::handle_dashboard))
        .route("/export/time.csv", get(api::handle_export_time_csv))
        .route("/export/vacation.csv", get(api::handle_export_vacation_csv))
        .route(
            "/export/employees.csv",
            get(api::handle_export_employees_csv),
        )
        .route(
            "/admin/employees",
            get(admin::handle_list_employees).post(admin::handle_create_employee),
        )
        .route(
            "/admin/employees/{id}",
            put(admin::handle_update_employee).delete(admin::handle_delete_employee),
        )
        .route("/admin/warnings", get(admin::handle_warnings));

    Router::new()
        .nest("/api", api_routes)
        .route("/status", get(api::handle_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = EnvConfig::from_env().context("Loading configuration from environment failed")?;
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = cli.host.unwrap_or(config.server_host);
    let port = cli.port.unwrap_or(config.server_port);
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| PathBuf::from(&config.data_dir));

    info!("Using data directory {:?}", data_dir);
    let state = AppState {
        store: Arc::new(JsonStore::new(data_dir)),
        sessions: Arc::new(SessionManager::new(Duration::from_secs(
            config.session_ttl_hours * 3600,
        ))),
        standard_hours: config.standard_daily_hours,
    };

    let app = build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Binding server address failed")?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
