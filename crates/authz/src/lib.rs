//! Authentication and authorization for Shelf: password hashing, bearer
//! tokens, the `AuthUser` extractor and record ownership checks.

pub mod extract;
pub mod ownership;
pub mod password;
pub mod token;

use async_trait::async_trait;
use shelf_http::AppError;
use shelf_kernel::settings::{Environment, DEV_JWT_SECRET};
use shelf_kernel::{InitCtx, Module};

pub use extract::{AuthUser, LoginRequired};
pub use ownership::{ensure_owner, Owned};

/// Authorization failures raised by this crate.
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("token lifetime out of range")]
    TokenLifetime,

    #[error("requester does not own this record")]
    NotOwner,
}

impl From<AuthzError> for AppError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotOwner => AppError::forbidden("You do not own this record"),
            AuthzError::Token(_) => AppError::unauthorized("Invalid or expired token"),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// Core module validating authentication settings at boot.
pub struct AuthzModule;

#[async_trait]
impl Module for AuthzModule {
    fn name(&self) -> &'static str {
        "authz"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let auth = &ctx.settings.auth;
        if auth.jwt_secret == DEV_JWT_SECRET {
            if ctx.settings.environment == Environment::Production {
                anyhow::bail!("auth.jwt_secret must be set in production");
            }
            tracing::warn!(module = self.name(), "using the development JWT secret");
        }
        tracing::info!(
            module = self.name(),
            token_ttl_secs = auth.token_ttl_secs,
            "authz module initialized"
        );
        Ok(())
    }
}

/// Create a new instance of the authz module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AuthzModule)
}
