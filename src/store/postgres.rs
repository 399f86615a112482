//! PostgreSQL Credential Store
//!
//! Every call checks a connection out of the pool and hands it back when the
//! call's future completes or is dropped.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{
    Account, AccountEvent, AccountMembership, AccountUpdate, Member, MemberRole, NewAccount,
    NewMember, NewTransaction, NewUser, RoleId, Transaction, TransactionType, TransactionUpdate,
    User, UserUpdate,
};

use super::{CredentialStore, StoreResult};

/// Credential store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new PgStore with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    // =========================================================================
    // Users
    // =========================================================================

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, created_at, updated_at)
            VALUES ($1, $2, NOW(), NOW())
            RETURNING id, username, password, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user(&self, user_id: i32) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, created_at, updated_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user(&self, update: UserUpdate) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = $2, password = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, password, created_at, updated_at
            "#,
        )
        .bind(update.id)
        .bind(&update.username)
        .bind(&update.password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, password, created_at, updated_at FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    async fn list_accounts_for_member(&self, user_id: i32) -> StoreResult<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT a.id, a.user_id, a.account_name, a.account_type, a.created_at, a.updated_at
            FROM accounts a
            JOIN members m ON m.account_id = a.id
            WHERE m.user_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    async fn get_account_with_member_check(
        &self,
        account_id: i32,
        user_id: i32,
    ) -> StoreResult<Option<AccountMembership>> {
        let row = sqlx::query_as::<_, AccountMembership>(
            r#"
            SELECT a.id, a.user_id, a.account_name, a.account_type, a.created_at, a.updated_at,
                   m.member_role_id
            FROM accounts a
            JOIN members m ON m.account_id = a.id AND m.user_id = $2
            WHERE a.id = $1
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn create_account_with_admin(
        &self,
        account: NewAccount,
    ) -> StoreResult<(Account, Member)> {
        // Rolled back on drop unless committed below
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (user_id, account_name, account_type, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING id, user_id, account_name, account_type, created_at, updated_at
            "#,
        )
        .bind(account.user_id)
        .bind(&account.account_name)
        .bind(&account.account_type)
        .fetch_one(&mut *tx)
        .await?;

        let admin = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (account_id, user_id, member_role_id, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING id, account_id, user_id, member_role_id, created_at, updated_at
            "#,
        )
        .bind(created.id)
        .bind(account.user_id)
        .bind(RoleId::ADMINISTRATOR.0)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((created, admin))
    }

    async fn update_account(&self, update: AccountUpdate) -> StoreResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET account_name = $2, account_type = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, account_name, account_type, created_at, updated_at
            "#,
        )
        .bind(update.id)
        .bind(&update.account_name)
        .bind(&update.account_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn list_account_events(&self, account_id: i32) -> StoreResult<Vec<AccountEvent>> {
        let events = sqlx::query_as::<_, AccountEvent>(
            r#"
            SELECT id, account_id, event_type_id, description, created_at, updated_at
            FROM account_events
            WHERE account_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    // =========================================================================
    // Members
    // =========================================================================

    async fn get_member(&self, account_id: i32, user_id: i32) -> StoreResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT id, account_id, user_id, member_role_id, created_at, updated_at
            FROM members
            WHERE account_id = $1 AND user_id = $2
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn list_members_with_member_check(
        &self,
        account_id: i32,
        caller_id: i32,
    ) -> StoreResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT m.id, m.account_id, m.user_id, m.member_role_id, m.created_at, m.updated_at
            FROM members m
            WHERE m.account_id = $1
              AND EXISTS (
                  SELECT 1 FROM members c WHERE c.account_id = $1 AND c.user_id = $2
              )
            ORDER BY m.id
            "#,
        )
        .bind(account_id)
        .bind(caller_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn get_member_with_member_check(
        &self,
        account_id: i32,
        user_id: i32,
        caller_id: i32,
    ) -> StoreResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            SELECT m.id, m.account_id, m.user_id, m.member_role_id, m.created_at, m.updated_at
            FROM members m
            WHERE m.account_id = $1
              AND m.user_id = $2
              AND EXISTS (
                  SELECT 1 FROM members c WHERE c.account_id = $1 AND c.user_id = $3
              )
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .bind(caller_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn create_member(&self, member: NewMember) -> StoreResult<Member> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (account_id, user_id, member_role_id, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            RETURNING id, account_id, user_id, member_role_id, created_at, updated_at
            "#,
        )
        .bind(member.account_id)
        .bind(member.user_id)
        .bind(member.member_role_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    async fn update_member(
        &self,
        account_id: i32,
        user_id: i32,
        member_role_id: i32,
    ) -> StoreResult<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(
            r#"
            UPDATE members
            SET member_role_id = $3, updated_at = NOW()
            WHERE account_id = $1 AND user_id = $2
            RETURNING id, account_id, user_id, member_role_id, created_at, updated_at
            "#,
        )
        .bind(account_id)
        .bind(user_id)
        .bind(member_role_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn delete_member(&self, account_id: i32, user_id: i32) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM members WHERE account_id = $1 AND user_id = $2")
            .bind(account_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    async fn list_transactions_with_member_check(
        &self,
        account_id: i32,
        caller_id: i32,
    ) -> StoreResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT t.id, t.account_id, t.user_id, t.transaction_date, t.transaction_type_id,
                   t.amount, t.created_at, t.updated_at, t.description
            FROM transactions t
            WHERE t.account_id = $1
              AND EXISTS (
                  SELECT 1 FROM members c WHERE c.account_id = $1 AND c.user_id = $2
              )
            ORDER BY t.transaction_date DESC, t.id DESC
            "#,
        )
        .bind(account_id)
        .bind(caller_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    async fn get_transaction_with_member_check(
        &self,
        account_id: i32,
        transaction_id: i32,
        caller_id: i32,
    ) -> StoreResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT t.id, t.account_id, t.user_id, t.transaction_date, t.transaction_type_id,
                   t.amount, t.created_at, t.updated_at, t.description
            FROM transactions t
            WHERE t.account_id = $1
              AND t.id = $2
              AND EXISTS (
                  SELECT 1 FROM members c WHERE c.account_id = $1 AND c.user_id = $3
              )
            "#,
        )
        .bind(account_id)
        .bind(transaction_id)
        .bind(caller_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn create_transaction(&self, transaction: NewTransaction) -> StoreResult<Transaction> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (
                account_id, user_id, transaction_date, transaction_type_id,
                amount, description, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING id, account_id, user_id, transaction_date, transaction_type_id,
                      amount, created_at, updated_at, description
            "#,
        )
        .bind(transaction.account_id)
        .bind(transaction.user_id)
        .bind(transaction.transaction_date)
        .bind(transaction.transaction_type_id)
        .bind(transaction.amount)
        .bind(&transaction.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn update_transaction(
        &self,
        update: TransactionUpdate,
    ) -> StoreResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET transaction_date = $2, transaction_type_id = $3, amount = $4,
                description = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING id, account_id, user_id, transaction_date, transaction_type_id,
                      amount, created_at, updated_at, description
            "#,
        )
        .bind(update.id)
        .bind(update.transaction_date)
        .bind(update.transaction_type_id)
        .bind(update.amount)
        .bind(&update.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    // =========================================================================
    // Reference data
    // =========================================================================

    async fn list_member_roles(&self) -> StoreResult<Vec<MemberRole>> {
        let roles = sqlx::query_as::<_, MemberRole>("SELECT id, name FROM member_roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    async fn list_transaction_types(&self) -> StoreResult<Vec<TransactionType>> {
        let types =
            sqlx::query_as::<_, TransactionType>("SELECT id, name FROM transaction_types ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(types)
    }
}
