//! Result Service
//! Mission: Run every record operation through identity and policy checks
//!
//! The service owns no ambient state: the gateway and store are handed in at
//! construction and the caller's identity is passed to every call.

use crate::{
    auth::{
        gateway::AuthGateway,
        models::{AuthError, Identity, LoginResponse},
    },
    policy::{AccessError, AccessPolicy, Operation, Scope},
    students::{
        models::{Student, StudentInput},
        store::{StoreError, StudentStore},
    },
};
use std::sync::Arc;
use tracing::debug;

/// Any failure a request can end with
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Clone)]
pub struct ResultService {
    gateway: Arc<AuthGateway>,
    store: Arc<StudentStore>,
}

impl ResultService {
    pub fn new(gateway: Arc<AuthGateway>, store: Arc<StudentStore>) -> Self {
        Self { gateway, store }
    }

    pub fn login(&self, email: &str, password: &str) -> ServiceResult<LoginResponse> {
        Ok(self.gateway.login(email, password)?)
    }

    /// Resolve a bearer token. No token at all is `Unauthenticated`; a bad
    /// one is `InvalidOrExpiredToken`.
    pub fn authenticate(&self, token: Option<&str>) -> ServiceResult<Identity> {
        let token = token.ok_or(AccessError::Unauthenticated)?;
        Ok(self.gateway.validate(token)?)
    }

    pub fn list_students(&self, caller: &Identity) -> ServiceResult<Vec<Student>> {
        self.authorize(caller, Operation::ListStudents)?;
        Ok(self.store.list()?)
    }

    pub fn get_student(&self, caller: &Identity, id: i64) -> ServiceResult<Student> {
        self.authorize(caller, Operation::GetStudent(id))?;
        Ok(self.store.get(id)?)
    }

    pub fn create_student(&self, caller: &Identity, input: &StudentInput) -> ServiceResult<Student> {
        self.authorize(caller, Operation::CreateStudent)?;
        Ok(self.store.create(input)?)
    }

    pub fn update_student(
        &self,
        caller: &Identity,
        id: i64,
        input: &StudentInput,
    ) -> ServiceResult<Student> {
        self.authorize(caller, Operation::UpdateStudent(id))?;
        Ok(self.store.update(id, input)?)
    }

    pub fn delete_student(&self, caller: &Identity, id: i64) -> ServiceResult<()> {
        self.authorize(caller, Operation::DeleteStudent(id))?;
        Ok(self.store.delete(id)?)
    }

    /// The caller's own record, matched on the email inside their token
    pub fn my_result(&self, caller: &Identity) -> ServiceResult<Student> {
        match self.authorize(caller, Operation::MyResult)? {
            Scope::OwnRecord { email } => Ok(self.store.find_by_email(&email)?),
            Scope::AllRecords => Err(AccessError::Forbidden.into()),
        }
    }

    fn authorize(&self, caller: &Identity, op: Operation) -> Result<Scope, AccessError> {
        AccessPolicy::authorize(Some(caller), op).map_err(|e| {
            debug!(
                "Denied {} for {} ({}): {}",
                op.as_str(),
                caller.email,
                caller.role,
                e
            );
            e
        })
    }
}
