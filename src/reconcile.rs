//! Selection of the subjects whose access should be rewritten.

use crate::config::Exclusions;
use crate::github::{Collaborator, Member};
use crate::permission::{OrgRole, RepoPermission};

/// Something holding a comparable access level: a repository collaborator or an org member.
pub trait Subject {
    type Level: Copy + PartialEq;

    fn login(&self) -> &str;
    fn level(&self) -> Option<Self::Level>;
}

impl Subject for Collaborator {
    type Level = RepoPermission;

    fn login(&self) -> &str {
        &self.login
    }

    fn level(&self) -> Option<RepoPermission> {
        self.permission()
    }
}

impl Subject for Member {
    type Level = OrgRole;

    fn login(&self) -> &str {
        &self.login
    }

    fn level(&self) -> Option<OrgRole> {
        Some(self.role())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rule<L> {
    pub original: L,
    pub desired: L,
}

/// Subjects currently at `rule.original` that are not excluded, in input order.
///
/// Nothing is selected when `original == desired`, so running against an
/// already-reconciled set selects nothing.
pub fn candidates<'s, S: Subject>(
    subjects: &'s [S],
    excluded: &Exclusions,
    rule: Rule<S::Level>,
) -> Vec<&'s S> {
    if rule.original == rule.desired {
        return Vec::new();
    }
    subjects
        .iter()
        .filter(|s| !excluded.contains(s.login()))
        .filter(|s| s.level() == Some(rule.original))
        .collect()
}
