//! Member Handler
//!
//! Any member may read the member list. Only an administrator may change it,
//! and that check runs before the store is asked to write anything.

use std::sync::Arc;

use crate::domain::{AccountGrant, CallerId, Capability, DomainError, Member, NewMember};
use crate::error::AppError;
use crate::store::CredentialStore;

use super::access::AccessResolver;
use super::commands::{AddMemberCommand, UpdateMemberCommand};

pub const MEMBER_DELETED: &str = "member deleted";

pub struct MemberHandler {
    store: Arc<dyn CredentialStore>,
}

impl MemberHandler {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, caller: CallerId, account_id: i32) -> Result<Vec<Member>, AppError> {
        let members = self
            .store
            .list_members_with_member_check(account_id, caller.user_id())
            .await?;

        if members.is_empty() {
            return Err(AppError::NotFound(
                "no members found for this account".to_string(),
            ));
        }

        Ok(members)
    }

    pub async fn get(
        &self,
        caller: CallerId,
        account_id: i32,
        user_id: i32,
    ) -> Result<Member, AppError> {
        self.store
            .get_member_with_member_check(account_id, user_id, caller.user_id())
            .await?
            .ok_or_else(|| AppError::NotFound("this member does not exist".to_string()))
    }

    pub async fn add(
        &self,
        caller: CallerId,
        account_id: i32,
        command: AddMemberCommand,
    ) -> Result<Member, AppError> {
        let grant = self.admin_grant(caller, account_id).await?;

        let member = self
            .store
            .create_member(NewMember {
                account_id: grant.account_id(),
                user_id: command.user_id,
                member_role_id: command.member_role_id,
            })
            .await
            .map_err(|e| match e {
                e if e.is_conflict() => AppError::Conflict(
                    "this user is already a member of the account".to_string(),
                ),
                e if e.is_not_found() => AppError::NotFound("error adding this member".to_string()),
                other => AppError::Store(other),
            })?;

        tracing::info!(
            account_id,
            user_id = member.user_id,
            member_role_id = member.member_role_id,
            by = caller.user_id(),
            "member added"
        );
        Ok(member)
    }

    pub async fn update(
        &self,
        caller: CallerId,
        account_id: i32,
        user_id: i32,
        command: UpdateMemberCommand,
    ) -> Result<Member, AppError> {
        let grant = self.admin_grant(caller, account_id).await?;

        let member = self
            .store
            .update_member(grant.account_id(), user_id, command.member_role_id)
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => member_update_failed(),
                other => AppError::Store(other),
            })?
            .ok_or_else(member_update_failed)?;

        tracing::info!(
            account_id,
            user_id,
            member_role_id = member.member_role_id,
            by = caller.user_id(),
            "member role changed"
        );
        Ok(member)
    }

    pub async fn delete(
        &self,
        caller: CallerId,
        account_id: i32,
        user_id: i32,
    ) -> Result<&'static str, AppError> {
        let grant = self.admin_grant(caller, account_id).await?;

        if !self.store.delete_member(grant.account_id(), user_id).await? {
            return Err(AppError::NotFound("error when deleting member".to_string()));
        }

        tracing::info!(account_id, user_id, by = caller.user_id(), "member removed");
        Ok(MEMBER_DELETED)
    }

    async fn admin_grant(&self, caller: CallerId, account_id: i32) -> Result<AccountGrant, AppError> {
        AccessResolver::new(self.store.clone())
            .require(caller, account_id, Capability::Admin)
            .await
            .map_err(|e| match e {
                AppError::Domain(DomainError::NotAMember { .. }) => {
                    AppError::Unauthorized("error verifying account permissions".to_string())
                }
                other => other,
            })
    }
}

fn member_update_failed() -> AppError {
    AppError::NotFound("member update failed".to_string())
}
