//! Tenants and their members.

use serde::{Deserialize, Serialize};

/// Role a member holds inside a namespace.
pub const ROLE_OWNER: &str = "owner";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// User ID.
    pub id: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    /// User ID of the owner.
    pub owner: String,
    pub tenant_id: String,
    pub members: Vec<Member>,
}

impl Namespace {
    /// Role of `user_id` in this namespace, or `""` when not a member.
    pub fn role_of(&self, user_id: &str) -> &str {
        self.members
            .iter()
            .find(|m| m.id == user_id)
            .map(|m| m.role.as_str())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespace() -> Namespace {
        Namespace {
            name: "group1".into(),
            owner: "u1".into(),
            tenant_id: "tenant".into(),
            members: vec![
                Member {
                    id: "u1".into(),
                    role: ROLE_OWNER.into(),
                },
                Member {
                    id: "u2".into(),
                    role: "observer".into(),
                },
            ],
        }
    }

    #[test]
    fn role_of_member() {
        let ns = namespace();
        assert_eq!(ns.role_of("u1"), "owner");
        assert_eq!(ns.role_of("u2"), "observer");
    }

    #[test]
    fn role_of_stranger_is_empty() {
        assert_eq!(namespace().role_of("nobody"), "");
    }
}
