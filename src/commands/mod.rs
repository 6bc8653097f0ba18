pub mod init;
pub mod org;
pub mod repos;

use crate::config::{load_config, token_path, Config};
use crate::credentials::CredentialSources;
use crate::error::Result;
use crate::github::{GithubClient, OwnerKind};
use std::path::PathBuf;
use tracing::info;

pub struct RunOptions {
    pub config_path: PathBuf,
    pub dry_run: bool,
    pub json: bool,
    pub verbose: bool,
}

/// Resolves the token, then loads the config. No request is made before both succeed.
pub fn connect(opts: &RunOptions) -> Result<(Config, GithubClient)> {
    let token = CredentialSources::new(token_path(&opts.config_path)).resolve()?;

    let config = load_config(&opts.config_path)?;
    info!("Loaded config from {}", opts.config_path.display());

    let client = GithubClient::new(&token, config.api_url.as_deref(), opts.verbose)?;
    Ok((config, client))
}

pub async fn resolve_owner(client: &GithubClient, owner: &str) -> Result<OwnerKind> {
    let kind = client.owner_kind(owner).await?;
    info!("Found owner type for {owner}: {kind}");
    Ok(kind)
}
