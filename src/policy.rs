//! Access Policy
//! Mission: Decide who may read or change which student records
//!
//! Each request moves through
//! `Unauthenticated -> Authenticated(role) -> Authorized | Forbidden`.
//! Callers without a validated identity never get past the first step, so
//! the record store is not touched for them.

use crate::auth::models::{Identity, UserRole};

/// Record operations a caller can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListStudents,
    GetStudent(i64),
    CreateStudent,
    UpdateStudent(i64),
    DeleteStudent(i64),
    /// The caller's own record, looked up by the email in their token
    MyResult,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ListStudents => "list",
            Operation::GetStudent(_) => "get",
            Operation::CreateStudent => "create",
            Operation::UpdateStudent(_) => "update",
            Operation::DeleteStudent(_) => "delete",
            Operation::MyResult => "my-result",
        }
    }
}

/// Which records an authorized operation may reach
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    AllRecords,
    OwnRecord { email: String },
}

/// Request rejected before reaching the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Insufficient permissions")]
    Forbidden,
}

/// Where a request currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState<'a> {
    Unauthenticated,
    Authenticated(&'a Identity),
    Authorized(Scope),
    Forbidden,
}

impl<'a> RequestState<'a> {
    pub fn new(caller: Option<&'a Identity>) -> Self {
        match caller {
            Some(identity) => RequestState::Authenticated(identity),
            None => RequestState::Unauthenticated,
        }
    }

    /// Apply the role check for `op`
    pub fn check(self, op: Operation) -> Self {
        match self {
            RequestState::Authenticated(identity) => match AccessPolicy::scope_for(identity, op) {
                Some(scope) => RequestState::Authorized(scope),
                None => RequestState::Forbidden,
            },
            other => other,
        }
    }

    pub fn into_result(self) -> Result<Scope, AccessError> {
        match self {
            RequestState::Authorized(scope) => Ok(scope),
            RequestState::Forbidden => Err(AccessError::Forbidden),
            // An unchecked identity is not an authorization
            RequestState::Authenticated(_) => Err(AccessError::Forbidden),
            RequestState::Unauthenticated => Err(AccessError::Unauthenticated),
        }
    }
}

/// Role table for student record operations
pub struct AccessPolicy;

impl AccessPolicy {
    /// Authorize `op` for `caller`, returning the records it may reach
    pub fn authorize(caller: Option<&Identity>, op: Operation) -> Result<Scope, AccessError> {
        RequestState::new(caller).check(op).into_result()
    }

    fn scope_for(identity: &Identity, op: Operation) -> Option<Scope> {
        match (identity.role, op) {
            (UserRole::Admin, Operation::MyResult) => None,
            (UserRole::Admin, _) => Some(Scope::AllRecords),
            (UserRole::Student, Operation::MyResult) => Some(Scope::OwnRecord {
                email: identity.email.clone(),
            }),
            (UserRole::Student, _) => None,
        }
    }
}
