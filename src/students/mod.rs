//! Student records

pub mod models;
pub mod store;

pub use models::{FieldError, MarkValue, Student, StudentInput, ValidationError};
pub use store::{ConflictKind, StoreError, StudentStore};
