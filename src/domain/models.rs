//! Data Model
//!
//! Rows persisted by the credential store, the inputs used to create or
//! rewrite them, and the merge rules applied to partial updates.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// =========================================================================
// Users
// =========================================================================

/// A registered user. The password hash never leaves the process.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input for inserting a user; `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

/// Full rewrite of a user's mutable fields.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
}

// =========================================================================
// Accounts
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Account {
    pub id: i32,
    pub user_id: i32,
    pub account_name: String,
    pub account_type: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// An account fetched together with the caller's membership on it.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AccountMembership {
    #[sqlx(flatten)]
    pub account: Account,
    pub member_role_id: Option<i32>,
}

impl AccountMembership {
    pub fn is_member(&self) -> bool {
        self.member_role_id.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_id: i32,
    pub account_name: String,
    pub account_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountUpdate {
    pub id: i32,
    pub account_name: String,
    pub account_type: String,
}

/// Partial account update; blank strings mean "keep the stored value".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountChanges {
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub account_type: String,
}

impl AccountChanges {
    /// Fill blank fields from `current` and target the current row.
    pub fn merge_onto(self, current: &Account) -> AccountUpdate {
        AccountUpdate {
            id: current.id,
            account_name: keep_if_blank(self.account_name, &current.account_name),
            account_type: keep_if_blank(self.account_type, &current.account_type),
        }
    }
}

// =========================================================================
// Members
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Member {
    pub id: i32,
    pub account_id: i32,
    pub user_id: i32,
    pub member_role_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub account_id: i32,
    pub user_id: i32,
    pub member_role_id: i32,
}

// =========================================================================
// Transactions
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Transaction {
    pub id: i32,
    pub account_id: i32,
    pub user_id: i32,
    pub transaction_date: NaiveDate,
    pub transaction_type_id: i32,
    pub amount: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: i32,
    pub user_id: i32,
    pub transaction_date: NaiveDate,
    pub transaction_type_id: i32,
    pub amount: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionUpdate {
    pub id: i32,
    pub transaction_date: NaiveDate,
    pub transaction_type_id: i32,
    pub amount: Decimal,
    pub description: String,
}

/// Partial transaction update.
///
/// Zero amount, blank description, zero type id and a missing date all keep
/// the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionChanges {
    #[serde(default)]
    pub transaction_date: Option<NaiveDate>,
    #[serde(default)]
    pub transaction_type_id: i32,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
}

impl TransactionChanges {
    pub fn merge_onto(self, current: &Transaction) -> TransactionUpdate {
        TransactionUpdate {
            id: current.id,
            transaction_date: self.transaction_date.unwrap_or(current.transaction_date),
            transaction_type_id: if self.transaction_type_id == 0 {
                current.transaction_type_id
            } else {
                self.transaction_type_id
            },
            amount: if self.amount.is_zero() {
                current.amount
            } else {
                self.amount
            },
            description: keep_if_blank(self.description, &current.description),
        }
    }
}

// =========================================================================
// Reference data
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct MemberRole {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TransactionType {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct EventType {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct AccountEvent {
    pub id: i32,
    pub account_id: i32,
    pub event_type_id: i32,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn keep_if_blank(incoming: String, current: &str) -> String {
    if incoming.is_empty() {
        current.to_string()
    } else {
        incoming
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn account() -> Account {
        Account {
            id: 3,
            user_id: 7,
            account_name: "Household".to_string(),
            account_type: "joint".to_string(),
            created_at: timestamp(),
            updated_at: timestamp(),
        }
    }

    fn transaction() -> Transaction {
        Transaction {
            id: 11,
            account_id: 3,
            user_id: 7,
            transaction_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            transaction_type_id: 2,
            amount: dec!(-42.50),
            created_at: timestamp(),
            updated_at: timestamp(),
            description: "groceries".to_string(),
        }
    }

    #[test]
    fn test_account_merge_name_only() {
        let changes = AccountChanges {
            account_name: "Holidays".to_string(),
            account_type: String::new(),
        };

        let update = changes.merge_onto(&account());
        assert_eq!(update.id, 3);
        assert_eq!(update.account_name, "Holidays");
        assert_eq!(update.account_type, "joint");
    }

    #[test]
    fn test_account_merge_all_blank_is_noop() {
        let update = AccountChanges::default().merge_onto(&account());
        assert_eq!(update.account_name, "Household");
        assert_eq!(update.account_type, "joint");
    }

    #[test]
    fn test_account_merge_blank_stays_blank_when_stored_blank() {
        let mut current = account();
        current.account_type = String::new();

        let update = AccountChanges::default().merge_onto(&current);
        assert_eq!(update.account_type, "");
    }

    #[test]
    fn test_account_changes_deserialize_missing_fields() {
        let changes: AccountChanges = serde_json::from_str(r#"{"account_type":"savings"}"#).unwrap();
        assert!(changes.account_name.is_empty());
        assert_eq!(changes.account_type, "savings");
    }

    #[test]
    fn test_transaction_merge_zero_amount_keeps_prior() {
        let changes = TransactionChanges {
            description: "weekly shop".to_string(),
            ..Default::default()
        };

        let update = changes.merge_onto(&transaction());
        assert_eq!(update.id, 11);
        assert_eq!(update.amount, dec!(-42.50));
        assert_eq!(update.description, "weekly shop");
        assert_eq!(update.transaction_type_id, 2);
        assert_eq!(update.transaction_date, transaction().transaction_date);
    }

    #[test]
    fn test_transaction_merge_overrides() {
        let changes = TransactionChanges {
            transaction_date: NaiveDate::from_ymd_opt(2024, 6, 2),
            transaction_type_id: 1,
            amount: dec!(100),
            description: String::new(),
        };

        let update = changes.merge_onto(&transaction());
        assert_eq!(update.amount, dec!(100));
        assert_eq!(update.description, "groceries");
        assert_eq!(update.transaction_type_id, 1);
        assert_eq!(update.transaction_date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
    }

    #[test]
    fn test_user_serialization_hides_password() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            password: "$argon2id$secret".to_string(),
            created_at: timestamp(),
            updated_at: timestamp(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["username"], "alice");
        assert!(json.get("password").is_none());
    }

    #[test]
    fn test_account_membership_flag() {
        let mut membership = AccountMembership {
            account: account(),
            member_role_id: Some(2),
        };
        assert!(membership.is_member());

        membership.member_role_id = None;
        assert!(!membership.is_member());
    }
}
