//! User, role and group models for identity lookups.
//!
//! These map the `sys_user`, `sys_user_has_role`, `sys_user_role`,
//! `sys_user_grmember` and `sys_user_group` tables.

use serde::{Deserialize, Serialize};

use super::{flag, Reference};

/// A row from `sys_user`.
///
/// Reference columns such as `department` and `location` are kept as raw
/// JSON because their shape depends on the display-value setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user sys_id.
    pub sys_id: String,

    /// Login name.
    #[serde(default)]
    pub user_name: Option<String>,

    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,

    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,

    /// Email address.
    #[serde(default)]
    pub email: Option<String>,

    /// Whether the account is active (`"true"`/`"false"`).
    #[serde(default)]
    pub active: Option<serde_json::Value>,

    /// Whether the account is locked out.
    #[serde(default)]
    pub locked_out: Option<serde_json::Value>,

    /// Last successful login.
    #[serde(default)]
    pub last_login_time: Option<String>,

    /// Department reference.
    #[serde(default)]
    pub department: Option<serde_json::Value>,

    /// Location reference.
    #[serde(default)]
    pub location: Option<serde_json::Value>,
}

impl User {
    /// Returns whether the account is active, if the instance reported it.
    pub fn is_active(&self) -> Option<bool> {
        self.active.as_ref().and_then(flag)
    }

    /// Returns whether the account is locked out, if reported.
    pub fn is_locked_out(&self) -> Option<bool> {
        self.locked_out.as_ref().and_then(flag)
    }

    /// Returns "First Last", falling back to the login name or sys_id.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            full
        } else {
            self.user_name.clone().unwrap_or_else(|| self.sys_id.clone())
        }
    }
}

/// A row from `sys_user_has_role`.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleAssignment {
    /// The assigned role.
    #[serde(default)]
    pub role: Option<Reference>,
}

/// A row from `sys_user_grmember`.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupMembership {
    /// The group the user belongs to.
    #[serde(default)]
    pub group: Option<Reference>,
}

/// A role or group: the tables share the same three columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRecord {
    /// Unique sys_id.
    pub sys_id: String,

    /// Role or group name.
    #[serde(default)]
    pub name: Option<String>,

    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Everything learned about one user by an identity check.
#[derive(Debug, Clone, Serialize)]
pub struct IdentityReport {
    /// The identifier the caller searched for.
    pub user_identifier: String,

    /// The resolved user.
    pub user: User,

    /// Roles granted directly or through groups.
    pub roles: Vec<NamedRecord>,

    /// Groups the user is a member of.
    pub groups: Vec<NamedRecord>,

    /// Number of roles.
    pub role_count: usize,

    /// Number of groups.
    pub group_count: usize,
}

impl IdentityReport {
    /// Builds a report, deriving the counts from the lists.
    pub fn new(
        user_identifier: impl Into<String>,
        user: User,
        roles: Vec<NamedRecord>,
        groups: Vec<NamedRecord>,
    ) -> Self {
        Self {
            user_identifier: user_identifier.into(),
            role_count: roles.len(),
            group_count: groups.len(),
            user,
            roles,
            groups,
        }
    }
}
