//! cashpal Library
//!
//! Shared finance accounts with member-based access control. Re-exports
//! modules for the server binary and integration tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod handlers;
pub mod state;
pub mod store;

pub use config::Config;
pub use domain::{AccountGrant, CallerId, Capability, DomainError, RoleId};
pub use error::{AppError, AppResult};
pub use state::AppState;
