//! Session Handler
//!
//! Registration and login. Neither requires an existing identity.

use std::sync::Arc;

use serde::Serialize;

use crate::auth::{PasswordService, TokenService};
use crate::domain::{NewUser, User};
use crate::error::{AppError, INVALID_BODY};
use crate::store::CredentialStore;

use super::commands::CredentialsCommand;

const INVALID_CREDENTIALS: &str = "invalid login credentials";

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
}

pub struct SessionHandler {
    store: Arc<dyn CredentialStore>,
    tokens: TokenService,
    passwords: PasswordService,
}

impl SessionHandler {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: TokenService,
        passwords: PasswordService,
    ) -> Self {
        Self {
            store,
            tokens,
            passwords,
        }
    }

    /// Exchange a username and password for an access token
    pub async fn login(&self, command: CredentialsCommand) -> Result<TokenResponse, AppError> {
        command
            .validate()
            .map_err(|_| AppError::BadRequest(INVALID_BODY.to_string()))?;

        let user = self
            .store
            .get_user_by_username(&command.username)
            .await?
            .ok_or_else(|| AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()))?;

        if !self.passwords.verify(&command.password, &user.password)? {
            tracing::info!(user_id = user.id, "login rejected");
            return Err(AppError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
        }

        let access_token = self.tokens.issue(user.id, &user.username)?;
        tracing::info!(user_id = user.id, "access token issued");

        Ok(TokenResponse { access_token })
    }

    /// Create a user with a freshly hashed password
    pub async fn register(&self, command: CredentialsCommand) -> Result<User, AppError> {
        command.validate()?;

        let password_hash = self.passwords.hash(&command.password)?;
        let user = self
            .store
            .create_user(NewUser {
                username: command.username,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                e if e.is_conflict() => {
                    AppError::Conflict("this username is already taken".to_string())
                }
                other => AppError::Store(other),
            })?;

        tracing::info!(user_id = user.id, "user registered");
        Ok(user)
    }
}
