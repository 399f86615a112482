//! Command definitions
//!
//! Request bodies accepted by the handlers. Identity and path-derived fields
//! (caller, account id, target ids) never come from these.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::DomainError;

fn require(value: &str, field: &'static str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        Err(DomainError::MissingField(field))
    } else {
        Ok(())
    }
}

// =========================================================================
// Session
// =========================================================================

/// Username and password pair used by login and registration
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsCommand {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl CredentialsCommand {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        require(&self.username, "username")?;
        if self.password.is_empty() {
            return Err(DomainError::MissingField("password"));
        }
        Ok(())
    }
}

// =========================================================================
// Users
// =========================================================================

/// Full rewrite of the caller's own user record
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserCommand {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// =========================================================================
// Accounts
// =========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountCommand {
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub account_type: String,
}

impl CreateAccountCommand {
    pub fn new(account_name: impl Into<String>, account_type: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            account_type: account_type.into(),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        require(&self.account_name, "account_name")?;
        require(&self.account_type, "account_type")
    }
}

// =========================================================================
// Members
// =========================================================================

/// Add a user to an account; the account comes from the path
#[derive(Debug, Clone, Deserialize)]
pub struct AddMemberCommand {
    pub user_id: i32,
    pub member_role_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMemberCommand {
    pub member_role_id: i32,
}

// =========================================================================
// Transactions
// =========================================================================

/// New transaction; any account or user fields in the body are ignored
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransactionCommand {
    /// Defaults to today (UTC)
    #[serde(default)]
    pub transaction_date: Option<NaiveDate>,
    pub transaction_type_id: i32,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
}
