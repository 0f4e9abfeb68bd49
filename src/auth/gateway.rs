//! Auth Gateway
//! Mission: Turn credentials into tokens and tokens back into identities

use crate::auth::{
    jwt::JwtHandler,
    models::{AuthError, Identity, LoginResponse},
    user_store::UserStore,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Credential check and token issuance/validation
pub struct AuthGateway {
    user_store: Arc<UserStore>,
    jwt_handler: Arc<JwtHandler>,
}

impl AuthGateway {
    pub fn new(user_store: Arc<UserStore>, jwt_handler: Arc<JwtHandler>) -> Self {
        Self {
            user_store,
            jwt_handler,
        }
    }

    pub fn user_store(&self) -> &Arc<UserStore> {
        &self.user_store
    }

    /// Check `email`/`password` and issue a token for the account
    pub fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let user = self
            .user_store
            .verify_credentials(email, password)
            .map_err(AuthError::Internal)?
            .ok_or_else(|| {
                warn!("❌ Failed login attempt: {}", email);
                AuthError::InvalidCredentials
            })?;

        let (token, expires_in) = self
            .jwt_handler
            .generate_token(&user)
            .map_err(AuthError::Internal)?;

        info!("✅ Login successful: {} ({})", user.email, user.role);

        Ok(LoginResponse {
            token,
            name: user.name,
            role: user.role,
            email: user.email,
            expires_in,
        })
    }

    /// Validate a token. Every kind of bad token fails the same way.
    pub fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        self.jwt_handler
            .validate_token(token)
            .map(Identity::from)
            .map_err(|_| AuthError::InvalidOrExpiredToken)
    }
}
