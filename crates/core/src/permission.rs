//! Admin eligibility of a reacting guild member.

use serde::{Deserialize, Serialize};

/// Discord `ADMINISTRATOR` permission bit.
pub const ADMINISTRATOR: u64 = 1 << 3;

/// Name of the role that grants review rights regardless of permissions.
const ADMIN_ROLE_NAME: &str = "admin";

/// What the review gate needs to know about a member.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemberPermissions {
    /// Names of the roles the member holds.
    pub role_names: Vec<String>,
    /// Union of the permission bits of those roles (including `@everyone`).
    pub permissions: u64,
    /// Whether the member owns the guild.
    pub is_owner: bool,
}

impl MemberPermissions {
    /// Build from the `(name, permission bits)` of every role the member holds.
    #[must_use]
    pub fn from_roles<'a>(roles: impl IntoIterator<Item = (&'a str, u64)>, is_owner: bool) -> Self {
        let mut role_names = Vec::new();
        let mut permissions = 0;
        for (name, bits) in roles {
            role_names.push(name.to_string());
            permissions |= bits;
        }

        Self {
            role_names,
            permissions,
            is_owner,
        }
    }

    /// Whether the member holds the administrative capability.
    #[must_use]
    pub const fn has_administrator(&self) -> bool {
        self.is_owner || self.permissions & ADMINISTRATOR != 0
    }

    /// Whether the member may approve or reject submissions.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.has_administrator()
            || self
                .role_names
                .iter()
                .any(|name| name.to_lowercase() == ADMIN_ROLE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEND_MESSAGES: u64 = 1 << 11;

    #[test]
    fn test_admin_role_name_any_case() {
        for name in ["admin", "Admin", "ADMIN"] {
            let member = MemberPermissions::from_roles([(name, 0)], false);
            assert!(member.is_authorized(), "role {name} should authorize");
        }
    }

    #[test]
    fn test_similar_role_names_do_not_authorize() {
        let member =
            MemberPermissions::from_roles([("Admins", 0), ("moderator", SEND_MESSAGES)], false);
        assert!(!member.is_authorized());
    }

    #[test]
    fn test_administrator_bit_authorizes() {
        let member =
            MemberPermissions::from_roles([("@everyone", SEND_MESSAGES), ("Staff", ADMINISTRATOR)], false);
        assert!(member.has_administrator());
        assert!(member.is_authorized());
    }

    #[test]
    fn test_owner_is_administrator() {
        let member = MemberPermissions::from_roles([("@everyone", 0)], true);
        assert!(member.is_authorized());
    }

    #[test]
    fn test_default_member_unauthorized() {
        assert!(!MemberPermissions::default().is_authorized());
    }
}
