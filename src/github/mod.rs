mod client;
mod models;

pub use client::GithubClient;
#[cfg(test)]
pub use models::CollaboratorPermissions;
pub use models::{Collaborator, Member, OwnerKind};
