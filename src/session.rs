// src/session.rs
//
// Identity and sessions: bcrypt password verification and an in-memory
// bearer-token session table. The current user travels as a request-scoped
// value injected by the auth middleware, never as ambient global state.

use rand::RngCore;
use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};
use thiserror::Error;
use tracing::info;

use crate::model::{Employee, EmployeeId};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid username/email or password")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}

/// Looks the employee up by username or email and verifies the password
/// against the stored bcrypt hash. The error does not reveal which of the
/// two checks failed.
pub fn authenticate<'a>(
    identifier: &str,
    password: &str,
    employees: &'a [Employee],
) -> Result<&'a Employee, AuthError> {
    let employee = employees
        .iter()
        .find(|e| e.username == identifier || e.email == identifier)
        .ok_or(AuthError::InvalidCredentials)?;

    if verify_password(password, &employee.password_hash) {
        Ok(employee)
    } else {
        Err(AuthError::InvalidCredentials)
    }
}

struct Session {
    employee_id: EmployeeId,
    expires_at: Instant,
}

pub struct SessionManager {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Opens a session and returns its bearer token.
    pub fn open(&self, employee_id: EmployeeId) -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let mut sessions = self.sessions.lock().unwrap();
        sessions.retain(|_, s| s.expires_at > Instant::now());
        sessions.insert(
            token.clone(),
            Session {
                employee_id,
                expires_at: Instant::now() + self.ttl,
            },
        );
        info!("Opened session for employee {}", employee_id);
        token
    }

    /// Resolves a bearer token to an employee id; expired tokens are dropped.
    pub fn resolve(&self, token: &str) -> Option<EmployeeId> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get(token) {
            Some(s) if s.expires_at > Instant::now() => Some(s.employee_id),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    pub fn close(&self, token: &str) {
        if self.sessions.lock().unwrap().remove(token).is_some() {
            info!("Closed session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EmployeeCategory, WorkTimeModel};

    fn employee(username: &str, email: &str, password: &str) -> Employee {
        Employee {
            id: 1,
            name: "Test Person".to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            is_admin: false,
            team: "Montage".to_string(),
            location: "Essen".to_string(),
            work_time_model: WorkTimeModel::Vollzeit,
            weekly_hours: None,
            category: EmployeeCategory::Betrieb,
            entitlement_override: None,
        }
    }

    #[test]
    fn authenticate_by_username_or_email() {
        let employees = vec![employee("mmuster", "m.muster@example.com", "geheim")];
        assert!(authenticate("mmuster", "geheim", &employees).is_ok());
        assert!(authenticate("m.muster@example.com", "geheim", &employees).is_ok());
    }

    #[test]
    fn authenticate_rejects_bad_password_and_unknown_user() {
        let employees = vec![employee("mmuster", "m.muster@example.com", "geheim")];
        assert!(matches!(
            authenticate("mmuster", "falsch", &employees),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate("niemand", "geheim", &employees),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn hash_is_salted_and_never_plaintext() {
        let a = hash_password("geheim").unwrap();
        let b = hash_password("geheim").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("geheim"));
        assert!(verify_password("geheim", &a));
        assert!(verify_password("geheim", &b));
    }

    #[test]
    fn sessions_resolve_until_expiry() {
        let manager = SessionManager::new(Duration::from_secs(3600));
        let token = manager.open(7);
        assert_eq!(manager.resolve(&token), Some(7));
        manager.close(&token);
        assert_eq!(manager.resolve(&token), None);
    }

    #[test]
    fn expired_sessions_are_rejected() {
        let manager = SessionManager::new(Duration::from_secs(0));
        let token = manager.open(7);
        assert_eq!(manager.resolve(&token), None);
    }
}
