//! Domain module
//!
//! Core domain types and access rules.

pub mod access;
pub mod context;
pub mod error;
pub mod models;

pub use access::{AccountGrant, Capability, CapabilitySet, RoleId};
pub use context::CallerId;
pub use error::DomainError;
pub use models::{
    Account, AccountChanges, AccountEvent, AccountMembership, AccountUpdate, EventType, Member,
    MemberRole, NewAccount, NewMember, NewTransaction, NewUser, Transaction, TransactionChanges,
    TransactionType, TransactionUpdate, User, UserUpdate,
};
