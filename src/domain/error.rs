//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

use super::access::Capability;

/// Access and validation failures raised by the access-control core.
///
/// Independent of the web layer; `AppError` decides the status code.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Caller holds no member row on the account
    #[error("user is not a member of account {account_id}")]
    NotAMember { account_id: i32 },

    /// Caller is a member but its role lacks the capability
    #[error("{capability} capability required on account {account_id}")]
    MissingCapability {
        account_id: i32,
        capability: Capability,
    },

    /// Caller addressed a user record that is not its own
    #[error("user {caller} cannot act on user {target}")]
    NotOwner { caller: i32, target: i32 },

    /// Required request field missing or blank
    #[error("{0} is required")]
    MissingField(&'static str),
}

impl DomainError {
    /// Check if this error denies access (as opposed to rejecting input)
    pub fn is_access_denial(&self) -> bool {
        matches!(
            self,
            Self::NotAMember { .. } | Self::MissingCapability { .. } | Self::NotOwner { .. }
        )
    }
}
