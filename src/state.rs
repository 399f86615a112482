//! Shared application state

use std::sync::Arc;

use crate::auth::{PasswordService, TokenService};
use crate::store::CredentialStore;

/// Immutable per-process state handed to every request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CredentialStore>,
    pub tokens: TokenService,
    pub passwords: PasswordService,
    /// Mount the unscoped `GET /users` listing
    pub expose_user_directory: bool,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: TokenService,
        passwords: PasswordService,
    ) -> Self {
        Self {
            store,
            tokens,
            passwords,
            expose_user_directory: false,
        }
    }

    pub fn with_user_directory(mut self, expose: bool) -> Self {
        self.expose_user_directory = expose;
        self
    }
}
