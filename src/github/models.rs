use crate::permission::{OrgRole, RepoPermission};
use serde::Deserialize;
use std::fmt;

/// Whether an owner is a personal account or an organization. Decides the API namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerKind {
    Individual,
    Organization,
}

impl OwnerKind {
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Individual => "users",
            Self::Organization => "orgs",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Individual => f.write_str("user"),
            Self::Organization => f.write_str("organization"),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OwnerProfile {
    pub login: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryRef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Collaborator {
    pub login: String,
    #[serde(default)]
    pub permissions: CollaboratorPermissions,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollaboratorPermissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub maintain: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub triage: bool,
    #[serde(default)]
    pub pull: bool,
}

impl Collaborator {
    /// Highest level granted by the permission flags, if any.
    pub fn permission(&self) -> Option<RepoPermission> {
        let p = &self.permissions;
        [
            (p.admin, RepoPermission::Admin),
            (p.maintain, RepoPermission::Maintain),
            (p.push, RepoPermission::Push),
            (p.triage, RepoPermission::Triage),
            (p.pull, RepoPermission::Pull),
        ]
        .into_iter()
        .find_map(|(granted, level)| granted.then_some(level))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub login: String,
    #[serde(default)]
    pub site_admin: bool,
}

impl Member {
    // Role comes from the site_admin flag, not from a separately reported role string.
    pub fn role(&self) -> OrgRole {
        if self.site_admin {
            OrgRole::Admin
        } else {
            OrgRole::Member
        }
    }
}
