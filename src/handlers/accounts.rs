//! Account Handler
//!
//! Accounts are visible to their members only. A non-member asking for an
//! account gets the same answer as for an account that does not exist.

use std::sync::Arc;

use crate::domain::{
    Account, AccountChanges, AccountEvent, AccountMembership, CallerId, Capability, NewAccount,
};
use crate::error::{AppError, ACCESS_DENIED};
use crate::store::CredentialStore;

use super::access::AccessResolver;
use super::commands::CreateAccountCommand;

pub const ACCOUNT_DELETE_STUB: &str = "the accounts cannot be deleted yet";

pub struct AccountHandler {
    store: Arc<dyn CredentialStore>,
}

impl AccountHandler {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Accounts the caller is a member of, in any role
    pub async fn list(&self, caller: CallerId) -> Result<Vec<Account>, AppError> {
        Ok(self.store.list_accounts_for_member(caller.user_id()).await?)
    }

    pub async fn get(&self, caller: CallerId, account_id: i32) -> Result<Account, AppError> {
        self.fetch_visible(caller, account_id).await
    }

    /// Create the account and make the caller its administrator, atomically.
    pub async fn create(
        &self,
        caller: CallerId,
        command: CreateAccountCommand,
    ) -> Result<Account, AppError> {
        command.validate()?;

        let (account, admin) = self
            .store
            .create_account_with_admin(NewAccount {
                user_id: caller.user_id(),
                account_name: command.account_name,
                account_type: command.account_type,
            })
            .await
            .map_err(|e| AppError::Internal(format!("account creation failed: {e}")))?;

        tracing::info!(
            account_id = account.id,
            user_id = caller.user_id(),
            member_id = admin.id,
            "account created"
        );

        Ok(account)
    }

    /// Merge `changes` over the stored account. Any member may do this.
    pub async fn update(
        &self,
        caller: CallerId,
        account_id: i32,
        changes: AccountChanges,
    ) -> Result<Account, AppError> {
        let current = self.fetch_visible(caller, account_id).await?;
        let update = changes.merge_onto(&current);

        self.store
            .update_account(update)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn delete(&self, caller: CallerId, account_id: i32) -> Result<&'static str, AppError> {
        tracing::debug!(account_id, user_id = caller.user_id(), "account delete requested");
        Ok(ACCOUNT_DELETE_STUB)
    }

    /// Events recorded against an account the caller can read
    pub async fn events(
        &self,
        caller: CallerId,
        account_id: i32,
    ) -> Result<Vec<AccountEvent>, AppError> {
        let grant = AccessResolver::new(self.store.clone())
            .require(caller, account_id, Capability::Read)
            .await?;

        Ok(self.store.list_account_events(grant.account_id()).await?)
    }

    async fn fetch_visible(&self, caller: CallerId, account_id: i32) -> Result<Account, AppError> {
        let membership = self
            .store
            .get_account_with_member_check(account_id, caller.user_id())
            .await?;

        visible_account(membership)
    }
}

/// No row is 404; a row without a member role is 403.
fn visible_account(membership: Option<AccountMembership>) -> Result<Account, AppError> {
    let membership = membership.ok_or_else(not_found)?;
    if !membership.is_member() {
        return Err(AppError::Forbidden(ACCESS_DENIED.to_string()));
    }

    Ok(membership.account)
}

fn not_found() -> AppError {
    AppError::NotFound("this account does not exist".to_string())
}
