//! Access Model
//!
//! Roles, capabilities and the per-account grant that gates every account,
//! member and transaction operation.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::context::CallerId;
use super::error::DomainError;
use super::models::Member;

/// Identifier of a member role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub i32);

impl RoleId {
    /// Role allowed to change an account's member list.
    pub const ADMINISTRATOR: RoleId = RoleId(1);

    pub fn is_administrator(self) -> bool {
        self == Self::ADMINISTRATOR
    }

    /// Capabilities a member holding this role has on the account.
    pub fn capabilities(self) -> CapabilitySet {
        if self.is_administrator() {
            CapabilitySet::ADMINISTRATOR
        } else {
            CapabilitySet::MEMBER
        }
    }
}

/// Something a caller may do on an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// See the account, its members and its transactions
    Read,
    /// Edit the account and record or edit transactions
    Update,
    /// Change the member list
    Admin,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Read => "read",
            Capability::Update => "update",
            Capability::Admin => "admin",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Capability::Read => 0b001,
            Capability::Update => 0b010,
            Capability::Admin => 0b100,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of [`Capability`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const MEMBER: CapabilitySet = CapabilitySet(0b011);
    pub const ADMINISTRATOR: CapabilitySet = CapabilitySet(0b111);

    pub fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }
}

/// Proof that the caller is a member of an account, with the capabilities
/// that membership carries.
///
/// Only built from the caller's own member row, so any operation taking a
/// grant cannot run without the membership lookup having happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountGrant {
    account_id: i32,
    caller: CallerId,
    role: RoleId,
    capabilities: CapabilitySet,
}

impl AccountGrant {
    pub(crate) fn from_membership(caller: CallerId, member: &Member) -> Self {
        debug_assert!(caller.owns(member.user_id));
        let role = RoleId(member.member_role_id);
        Self {
            account_id: member.account_id,
            caller,
            role,
            capabilities: role.capabilities(),
        }
    }

    pub fn account_id(&self) -> i32 {
        self.account_id
    }

    pub fn caller(&self) -> CallerId {
        self.caller
    }

    pub fn role(&self) -> RoleId {
        self.role
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability)
    }

    /// Keep the grant only if it carries `capability`.
    pub fn require(self, capability: Capability) -> Result<Self, DomainError> {
        if self.allows(capability) {
            Ok(self)
        } else {
            Err(DomainError::MissingCapability {
                account_id: self.account_id,
                capability,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn member(account_id: i32, user_id: i32, role: i32) -> Member {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Member {
            id: 1,
            account_id,
            user_id,
            member_role_id: role,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_role_capabilities() {
        let admin = RoleId::ADMINISTRATOR.capabilities();
        assert!(admin.contains(Capability::Read));
        assert!(admin.contains(Capability::Update));
        assert!(admin.contains(Capability::Admin));

        let regular = RoleId(2).capabilities();
        assert!(regular.contains(Capability::Read));
        assert!(regular.contains(Capability::Update));
        assert!(!regular.contains(Capability::Admin));
    }

    #[test]
    fn test_empty_capability_set() {
        let set = CapabilitySet::default();
        assert!(!set.contains(Capability::Read));
        assert!(!set.contains(Capability::Admin));
    }

    #[test]
    fn test_grant_for_administrator() {
        let grant = AccountGrant::from_membership(CallerId::new(7), &member(3, 7, 1));
        assert_eq!(grant.account_id(), 3);
        assert_eq!(grant.caller(), CallerId::new(7));
        assert!(grant.role().is_administrator());
        assert!(grant.require(Capability::Admin).is_ok());
    }

    #[test]
    fn test_grant_for_regular_member_lacks_admin() {
        let grant = AccountGrant::from_membership(CallerId::new(8), &member(3, 8, 2));
        assert!(grant.allows(Capability::Update));

        let err = grant.require(Capability::Admin).unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingCapability {
                account_id: 3,
                capability: Capability::Admin,
            }
        );
    }
}
