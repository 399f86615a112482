//! Grant resolution
//!
//! One member-row lookup per (caller, account) pair, turned into an
//! [`AccountGrant`] that the account, member and transaction handlers share.

use std::sync::Arc;

use crate::domain::{AccountGrant, CallerId, Capability, DomainError};
use crate::error::AppError;
use crate::store::CredentialStore;

pub struct AccessResolver {
    store: Arc<dyn CredentialStore>,
}

impl AccessResolver {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Resolve the caller's grant on an account; `NotAMember` without one.
    pub async fn grant(&self, caller: CallerId, account_id: i32) -> Result<AccountGrant, AppError> {
        let member = self
            .store
            .get_member(account_id, caller.user_id())
            .await?
            .ok_or(DomainError::NotAMember { account_id })?;

        Ok(AccountGrant::from_membership(caller, &member))
    }

    /// Resolve the grant and insist on `capability`.
    pub async fn require(
        &self,
        caller: CallerId,
        account_id: i32,
        capability: Capability,
    ) -> Result<AccountGrant, AppError> {
        let grant = self.grant(caller, account_id).await?;
        Ok(grant.require(capability)?)
    }
}
