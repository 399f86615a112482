//! User Handler
//!
//! Self-service reads and writes on the caller's own user record.

use std::sync::Arc;

use crate::auth::PasswordService;
use crate::domain::{CallerId, DomainError, User, UserUpdate};
use crate::error::AppError;
use crate::store::CredentialStore;

use super::commands::UpdateUserCommand;

const USER_NOT_FOUND: &str = "this user does not exist";

pub struct UserHandler {
    store: Arc<dyn CredentialStore>,
    passwords: PasswordService,
}

impl UserHandler {
    pub fn new(store: Arc<dyn CredentialStore>, passwords: PasswordService) -> Self {
        Self { store, passwords }
    }

    pub async fn get(&self, caller: CallerId, user_id: i32) -> Result<User, AppError> {
        ensure_owner(caller, user_id)?;

        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))
    }

    /// Rewrite username and password as supplied.
    ///
    /// Blank fields are not treated as "unchanged" here: the password is
    /// always re-hashed, including an empty one.
    pub async fn update(
        &self,
        caller: CallerId,
        user_id: i32,
        command: UpdateUserCommand,
    ) -> Result<User, AppError> {
        ensure_owner(caller, user_id)?;

        if command.password.is_empty() {
            tracing::warn!(user_id, "user update stores a hash of an empty password");
        }

        let password_hash = self.passwords.hash(&command.password)?;
        let update = UserUpdate {
            id: user_id,
            username: command.username,
            password_hash,
        };

        self.store
            .update_user(update)
            .await
            .map_err(|e| match e {
                e if e.is_conflict() => {
                    AppError::Conflict("this username is already taken".to_string())
                }
                other => AppError::Store(other),
            })?
            .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.to_string()))
    }

    /// Every user, without any ownership filter.
    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.store.list_users().await?)
    }
}

fn ensure_owner(caller: CallerId, user_id: i32) -> Result<(), DomainError> {
    if caller.owns(user_id) {
        Ok(())
    } else {
        Err(DomainError::NotOwner {
            caller: caller.user_id(),
            target: user_id,
        })
    }
}
