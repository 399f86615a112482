//! Reference Data

use std::sync::Arc;

use crate::domain::{MemberRole, TransactionType};
use crate::error::AppError;
use crate::store::CredentialStore;

/// Read-only lookup tables
pub struct ReferenceHandler {
    store: Arc<dyn CredentialStore>,
}

impl ReferenceHandler {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub async fn member_roles(&self) -> Result<Vec<MemberRole>, AppError> {
        Ok(self.store.list_member_roles().await?)
    }

    pub async fn transaction_types(&self) -> Result<Vec<TransactionType>, AppError> {
        Ok(self.store.list_transaction_types().await?)
    }
}
