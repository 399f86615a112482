//! Authentication module
//!
//! Access tokens and password hashing.

pub mod password;
pub mod token;

pub use password::{PasswordError, PasswordService};
pub use token::{AccessTokenClaims, TokenError, TokenService};
