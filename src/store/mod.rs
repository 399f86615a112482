//! Credential Store module
//!
//! Persistence port for users, accounts, members and transactions.
//! Queries named `*_with_member_check` fold the caller's membership into the
//! filter, so a row the caller may not see is indistinguishable from a
//! missing one.

mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::{
    Account, AccountEvent, AccountMembership, AccountUpdate, Member, MemberRole, NewAccount,
    NewMember, NewTransaction, NewUser, Transaction, TransactionType, TransactionUpdate, User,
    UserUpdate,
};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage operations used by the access-control core.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    // ---------------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------------

    /// Insert a user; `Conflict` when the username is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn get_user(&self, user_id: i32) -> StoreResult<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn update_user(&self, update: UserUpdate) -> StoreResult<Option<User>>;

    /// Every user, unscoped.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    // ---------------------------------------------------------------------
    // Accounts
    // ---------------------------------------------------------------------

    /// Accounts on which `user_id` holds any member role.
    async fn list_accounts_for_member(&self, user_id: i32) -> StoreResult<Vec<Account>>;

    /// The account joined with `user_id`'s membership; `None` for non-members.
    async fn get_account_with_member_check(
        &self,
        account_id: i32,
        user_id: i32,
    ) -> StoreResult<Option<AccountMembership>>;

    /// Insert the account and an administrator member row for its creator.
    ///
    /// All or nothing: if either insert fails nothing is persisted.
    async fn create_account_with_admin(
        &self,
        account: NewAccount,
    ) -> StoreResult<(Account, Member)>;

    async fn update_account(&self, update: AccountUpdate) -> StoreResult<Option<Account>>;

    /// Audit events recorded against an account.
    async fn list_account_events(&self, account_id: i32) -> StoreResult<Vec<AccountEvent>>;

    // ---------------------------------------------------------------------
    // Members
    // ---------------------------------------------------------------------

    async fn get_member(&self, account_id: i32, user_id: i32) -> StoreResult<Option<Member>>;

    async fn list_members_with_member_check(
        &self,
        account_id: i32,
        caller_id: i32,
    ) -> StoreResult<Vec<Member>>;

    async fn get_member_with_member_check(
        &self,
        account_id: i32,
        user_id: i32,
        caller_id: i32,
    ) -> StoreResult<Option<Member>>;

    /// `NotFound` if the account or user is missing, `Conflict` on a duplicate pair.
    async fn create_member(&self, member: NewMember) -> StoreResult<Member>;

    async fn update_member(
        &self,
        account_id: i32,
        user_id: i32,
        member_role_id: i32,
    ) -> StoreResult<Option<Member>>;

    /// Returns whether a row was removed.
    async fn delete_member(&self, account_id: i32, user_id: i32) -> StoreResult<bool>;

    // ---------------------------------------------------------------------
    // Transactions
    // ---------------------------------------------------------------------

    async fn list_transactions_with_member_check(
        &self,
        account_id: i32,
        caller_id: i32,
    ) -> StoreResult<Vec<Transaction>>;

    async fn get_transaction_with_member_check(
        &self,
        account_id: i32,
        transaction_id: i32,
        caller_id: i32,
    ) -> StoreResult<Option<Transaction>>;

    async fn create_transaction(&self, transaction: NewTransaction) -> StoreResult<Transaction>;

    async fn update_transaction(
        &self,
        update: TransactionUpdate,
    ) -> StoreResult<Option<Transaction>>;

    // ---------------------------------------------------------------------
    // Reference data
    // ---------------------------------------------------------------------

    async fn list_member_roles(&self) -> StoreResult<Vec<MemberRole>>;

    async fn list_transaction_types(&self) -> StoreResult<Vec<TransactionType>>;
}
