//! Handlers module
//!
//! Access-control operations over accounts, members, transactions and users.
//! Every operation takes the caller identity as an explicit argument.

mod access;
mod accounts;
mod commands;
mod members;
mod reference;
mod session;
mod transactions;
mod users;


pub use access::AccessResolver;
pub use accounts::{AccountHandler, ACCOUNT_DELETE_STUB};
pub use commands::*;
pub use members::{MemberHandler, MEMBER_DELETED};
pub use reference::ReferenceHandler;
pub use session::{SessionHandler, TokenResponse};
pub use transactions::{TransactionHandler, TRANSACTION_DELETE_STUB};
pub use users::UserHandler;
