pub mod error;
pub mod routes;
pub mod students;

pub use error::ApiError;
pub use routes::create_router;
