//! Caller Identity
//!
//! The user identifier recovered from a verified access token. It is passed
//! explicitly into every access-control decision for the rest of the request.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Verified identity of the user making the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerId(i32);

impl CallerId {
    pub fn new(user_id: i32) -> Self {
        Self(user_id)
    }

    pub fn user_id(self) -> i32 {
        self.0
    }

    /// Whether `user_id` names the caller's own user record.
    pub fn owns(self, user_id: i32) -> bool {
        self.0 == user_id
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
