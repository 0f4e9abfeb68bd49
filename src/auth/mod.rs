//! Authentication Module
//! Mission: Secure record access with bcrypt credentials and JWT identities

pub mod api;
pub mod gateway;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod user_store;

pub use gateway::AuthGateway;
pub use jwt::JwtHandler;
pub use middleware::auth_middleware;
pub use models::{AuthError, Identity, UserRole};
pub use user_store::{SeedAccount, UserStore};
