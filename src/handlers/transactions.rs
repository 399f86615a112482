//! Transaction Handler
//!
//! Reads go through membership-scoped queries. Writes resolve an Update grant
//! first and only then look at the request body.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{CallerId, Capability, NewTransaction, Transaction, TransactionChanges};
use crate::error::{AppError, ACCESS_DENIED, INVALID_BODY};
use crate::store::CredentialStore;

use super::access::AccessResolver;
use super::commands::CreateTransactionCommand;

pub const TRANSACTION_DELETE_STUB: &str = "the transactions cannot be deleted yet";

pub struct TransactionHandler {
    store: Arc<dyn CredentialStore>,
}

impl TransactionHandler {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    fn resolver(&self) -> AccessResolver {
        AccessResolver::new(self.store.clone())
    }

    /// Newest first
    pub async fn list(
        &self,
        caller: CallerId,
        account_id: i32,
    ) -> Result<Vec<Transaction>, AppError> {
        let grant = self
            .resolver()
            .require(caller, account_id, Capability::Read)
            .await?;

        Ok(self
            .store
            .list_transactions_with_member_check(grant.account_id(), caller.user_id())
            .await?)
    }

    pub async fn get(
        &self,
        caller: CallerId,
        account_id: i32,
        transaction_id: i32,
    ) -> Result<Transaction, AppError> {
        self.store
            .get_transaction_with_member_check(account_id, transaction_id, caller.user_id())
            .await?
            .ok_or_else(access_denied)
    }

    /// Record a transaction on the account, stamped with the account and caller.
    ///
    /// `body` is decoded only once the caller is known to hold Update.
    pub async fn create(
        &self,
        caller: CallerId,
        account_id: i32,
        body: &[u8],
    ) -> Result<Transaction, AppError> {
        let grant = self
            .resolver()
            .require(caller, account_id, Capability::Update)
            .await?;

        let command: CreateTransactionCommand = decode(body)?;
        let transaction = self
            .store
            .create_transaction(NewTransaction {
                account_id: grant.account_id(),
                user_id: grant.caller().user_id(),
                transaction_date: command
                    .transaction_date
                    .unwrap_or_else(|| Utc::now().date_naive()),
                transaction_type_id: command.transaction_type_id,
                amount: command.amount,
                description: command.description,
            })
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => {
                    AppError::BadRequest("unknown transaction type".to_string())
                }
                other => AppError::Internal(format!("transaction creation failed: {other}")),
            })?;

        tracing::info!(
            account_id,
            transaction_id = transaction.id,
            user_id = caller.user_id(),
            "transaction recorded"
        );
        Ok(transaction)
    }

    /// Merge the body over the stored transaction.
    ///
    /// An empty body changes nothing.
    pub async fn update(
        &self,
        caller: CallerId,
        account_id: i32,
        transaction_id: i32,
        body: &[u8],
    ) -> Result<Transaction, AppError> {
        let grant = self
            .resolver()
            .require(caller, account_id, Capability::Update)
            .await?;

        let changes: TransactionChanges = if body.iter().all(u8::is_ascii_whitespace) {
            TransactionChanges::default()
        } else {
            decode(body)?
        };

        let current = self
            .store
            .get_transaction_with_member_check(grant.account_id(), transaction_id, caller.user_id())
            .await?
            .ok_or_else(access_denied)?;

        self.store
            .update_transaction(changes.merge_onto(&current))
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => {
                    AppError::BadRequest("unknown transaction type".to_string())
                }
                other => AppError::Internal(format!("transaction update failed: {other}")),
            })?
            .ok_or_else(|| AppError::NotFound("transaction update failed".to_string()))
    }

    pub async fn delete(
        &self,
        caller: CallerId,
        account_id: i32,
        transaction_id: i32,
    ) -> Result<&'static str, AppError> {
        tracing::debug!(
            account_id,
            transaction_id,
            user_id = caller.user_id(),
            "transaction delete requested"
        );
        Ok(TRANSACTION_DELETE_STUB)
    }
}

fn access_denied() -> AppError {
    AppError::Unauthorized(ACCESS_DENIED.to_string())
}

fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "rejected request body");
        AppError::BadRequest(INVALID_BODY.to_string())
    })
}
