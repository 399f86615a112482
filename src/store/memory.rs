//! In-Memory Credential Store
//!
//! Backs tests and local runs without PostgreSQL. Enforces the same unique
//! and foreign-key rules as the SQL schema, and can be told to fail the next
//! member insert so account-creation atomicity can be observed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};

use crate::domain::{
    Account, AccountEvent, AccountMembership, AccountUpdate, Member, MemberRole, NewAccount,
    NewMember, NewTransaction, NewUser, RoleId, Transaction, TransactionType, TransactionUpdate,
    User, UserUpdate,
};

use super::{CredentialStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    accounts: BTreeMap<i32, Account>,
    members: BTreeMap<i32, Member>,
    transactions: BTreeMap<i32, Transaction>,
    account_events: BTreeMap<i32, AccountEvent>,
    member_roles: Vec<MemberRole>,
    transaction_types: Vec<TransactionType>,
    last_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn member(&self, account_id: i32, user_id: i32) -> Option<&Member> {
        self.members
            .values()
            .find(|m| m.account_id == account_id && m.user_id == user_id)
    }

    fn is_member(&self, account_id: i32, user_id: i32) -> bool {
        self.member(account_id, user_id).is_some()
    }

    fn build_member(&mut self, member: &NewMember, now: NaiveDateTime) -> StoreResult<Member> {
        if !self.accounts.contains_key(&member.account_id)
            || !self.users.contains_key(&member.user_id)
            || !self.member_roles.iter().any(|r| r.id == member.member_role_id)
        {
            return Err(StoreError::NotFound);
        }
        if self.is_member(member.account_id, member.user_id) {
            return Err(StoreError::Conflict("members_account_id_user_id_key".to_string()));
        }

        Ok(Member {
            id: self.next_id(),
            account_id: member.account_id,
            user_id: member.user_id,
            member_role_id: member.member_role_id,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Credential store held in process memory
#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_next_member_insert: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a store seeded with the reference member roles and
    /// transaction types
    pub fn new() -> Self {
        let tables = Tables {
            member_roles: vec![
                MemberRole {
                    id: RoleId::ADMINISTRATOR.0,
                    name: "administrator".to_string(),
                },
                MemberRole {
                    id: 2,
                    name: "member".to_string(),
                },
            ],
            transaction_types: vec![
                TransactionType {
                    id: 1,
                    name: "income".to_string(),
                },
                TransactionType {
                    id: 2,
                    name: "expense".to_string(),
                },
            ],
            ..Default::default()
        };

        Self {
            tables: Mutex::new(tables),
            fail_next_member_insert: AtomicBool::new(false),
        }
    }

    /// Make the next member insert fail with a store error.
    pub fn fail_next_member_insert(&self) {
        self.fail_next_member_insert.store(true, Ordering::SeqCst);
    }

    /// Record an account event; the schema has no writer for these yet.
    pub fn record_account_event(
        &self,
        account_id: i32,
        event_type_id: i32,
        description: &str,
    ) -> StoreResult<AccountEvent> {
        let mut tables = self.tables()?;
        if !tables.accounts.contains_key(&account_id) {
            return Err(StoreError::NotFound);
        }

        let now = now();
        let event = AccountEvent {
            id: tables.next_id(),
            account_id,
            event_type_id,
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.account_events.insert(event.id, event.clone());
        Ok(event)
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn take_member_insert_failure(&self) -> StoreResult<()> {
        if self.fail_next_member_insert.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "injected member insert failure".to_string(),
            ));
        }
        Ok(())
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables()?;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict("users_username_key".to_string()));
        }

        let now = now();
        let created = User {
            id: tables.next_id(),
            username: user.username,
            password: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, user_id: i32) -> StoreResult<Option<User>> {
        Ok(self.tables()?.users.get(&user_id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_user(&self, update: UserUpdate) -> StoreResult<Option<User>> {
        let mut tables = self.tables()?;
        if tables
            .users
            .values()
            .any(|u| u.id != update.id && u.username == update.username)
        {
            return Err(StoreError::Conflict("users_username_key".to_string()));
        }

        Ok(tables.users.get_mut(&update.id).map(|user| {
            user.username = update.username;
            user.password = update.password_hash;
            user.updated_at = now();
            user.clone()
        }))
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables()?.users.values().cloned().collect())
    }

    async fn list_accounts_for_member(&self, user_id: i32) -> StoreResult<Vec<Account>> {
        let tables = self.tables()?;
        Ok(tables
            .accounts
            .values()
            .filter(|a| tables.is_member(a.id, user_id))
            .cloned()
            .collect())
    }

    async fn get_account_with_member_check(
        &self,
        account_id: i32,
        user_id: i32,
    ) -> StoreResult<Option<AccountMembership>> {
        let tables = self.tables()?;
        let Some(member) = tables.member(account_id, user_id) else {
            return Ok(None);
        };

        Ok(tables
            .accounts
            .get(&account_id)
            .map(|account| AccountMembership {
                account: account.clone(),
                member_role_id: Some(member.member_role_id),
            }))
    }

    async fn create_account_with_admin(
        &self,
        account: NewAccount,
    ) -> StoreResult<(Account, Member)> {
        let mut tables = self.tables()?;
        if !tables.users.contains_key(&account.user_id) {
            return Err(StoreError::NotFound);
        }

        let now = now();
        let created = Account {
            id: tables.next_id(),
            user_id: account.user_id,
            account_name: account.account_name,
            account_type: account.account_type,
            created_at: now,
            updated_at: now,
        };

        tables.accounts.insert(created.id, created.clone());

        // Undo the account row if the admin member cannot be written
        let admin = NewMember {
            account_id: created.id,
            user_id: created.user_id,
            member_role_id: RoleId::ADMINISTRATOR.0,
        };
        let admin = match self
            .take_member_insert_failure()
            .and_then(|()| tables.build_member(&admin, now))
        {
            Ok(member) => member,
            Err(err) => {
                tables.accounts.remove(&created.id);
                return Err(err);
            }
        };
        tables.members.insert(admin.id, admin.clone());

        Ok((created, admin))
    }

    async fn update_account(&self, update: AccountUpdate) -> StoreResult<Option<Account>> {
        let mut tables = self.tables()?;
        Ok(tables.accounts.get_mut(&update.id).map(|account| {
            account.account_name = update.account_name;
            account.account_type = update.account_type;
            account.updated_at = now();
            account.clone()
        }))
    }

    async fn list_account_events(&self, account_id: i32) -> StoreResult<Vec<AccountEvent>> {
        let tables = self.tables()?;
        Ok(tables
            .account_events
            .values()
            .rev()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn get_member(&self, account_id: i32, user_id: i32) -> StoreResult<Option<Member>> {
        Ok(self.tables()?.member(account_id, user_id).cloned())
    }

    async fn list_members_with_member_check(
        &self,
        account_id: i32,
        caller_id: i32,
    ) -> StoreResult<Vec<Member>> {
        let tables = self.tables()?;
        if !tables.is_member(account_id, caller_id) {
            return Ok(Vec::new());
        }

        Ok(tables
            .members
            .values()
            .filter(|m| m.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn get_member_with_member_check(
        &self,
        account_id: i32,
        user_id: i32,
        caller_id: i32,
    ) -> StoreResult<Option<Member>> {
        let tables = self.tables()?;
        if !tables.is_member(account_id, caller_id) {
            return Ok(None);
        }

        Ok(tables.member(account_id, user_id).cloned())
    }

    async fn create_member(&self, member: NewMember) -> StoreResult<Member> {
        self.take_member_insert_failure()?;

        let mut tables = self.tables()?;
        let created = tables.build_member(&member, now())?;
        tables.members.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_member(
        &self,
        account_id: i32,
        user_id: i32,
        member_role_id: i32,
    ) -> StoreResult<Option<Member>> {
        let mut tables = self.tables()?;
        if !tables.member_roles.iter().any(|r| r.id == member_role_id) {
            return Err(StoreError::NotFound);
        }

        Ok(tables
            .members
            .values_mut()
            .find(|m| m.account_id == account_id && m.user_id == user_id)
            .map(|member| {
                member.member_role_id = member_role_id;
                member.updated_at = now();
                member.clone()
            }))
    }

    async fn delete_member(&self, account_id: i32, user_id: i32) -> StoreResult<bool> {
        let mut tables = self.tables()?;
        let id = tables.member(account_id, user_id).map(|m| m.id);

        Ok(match id {
            Some(id) => tables.members.remove(&id).is_some(),
            None => false,
        })
    }

    async fn list_transactions_with_member_check(
        &self,
        account_id: i32,
        caller_id: i32,
    ) -> StoreResult<Vec<Transaction>> {
        let tables = self.tables()?;
        if !tables.is_member(account_id, caller_id) {
            return Ok(Vec::new());
        }

        let mut transactions: Vec<Transaction> = tables
            .transactions
            .values()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| {
            b.transaction_date
                .cmp(&a.transaction_date)
                .then(b.id.cmp(&a.id))
        });
        Ok(transactions)
    }

    async fn get_transaction_with_member_check(
        &self,
        account_id: i32,
        transaction_id: i32,
        caller_id: i32,
    ) -> StoreResult<Option<Transaction>> {
        let tables = self.tables()?;
        if !tables.is_member(account_id, caller_id) {
            return Ok(None);
        }

        Ok(tables
            .transactions
            .get(&transaction_id)
            .filter(|t| t.account_id == account_id)
            .cloned())
    }

    async fn create_transaction(&self, transaction: NewTransaction) -> StoreResult<Transaction> {
        let mut tables = self.tables()?;
        if !tables.accounts.contains_key(&transaction.account_id)
            || !tables.users.contains_key(&transaction.user_id)
            || !tables
                .transaction_types
                .iter()
                .any(|t| t.id == transaction.transaction_type_id)
        {
            return Err(StoreError::NotFound);
        }

        let now = now();
        let created = Transaction {
            id: tables.next_id(),
            account_id: transaction.account_id,
            user_id: transaction.user_id,
            transaction_date: transaction.transaction_date,
            transaction_type_id: transaction.transaction_type_id,
            amount: transaction.amount,
            created_at: now,
            updated_at: now,
            description: transaction.description,
        };
        tables.transactions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_transaction(
        &self,
        update: TransactionUpdate,
    ) -> StoreResult<Option<Transaction>> {
        let mut tables = self.tables()?;
        if !tables
            .transaction_types
            .iter()
            .any(|t| t.id == update.transaction_type_id)
        {
            return Err(StoreError::NotFound);
        }

        Ok(tables.transactions.get_mut(&update.id).map(|transaction| {
            transaction.transaction_date = update.transaction_date;
            transaction.transaction_type_id = update.transaction_type_id;
            transaction.amount = update.amount;
            transaction.description = update.description;
            transaction.updated_at = now();
            transaction.clone()
        }))
    }

    async fn list_member_roles(&self) -> StoreResult<Vec<MemberRole>> {
        Ok(self.tables()?.member_roles.clone())
    }

    async fn list_transaction_types(&self) -> StoreResult<Vec<TransactionType>> {
        Ok(self.tables()?.transaction_types.clone())
    }
}
