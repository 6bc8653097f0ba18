use crate::error::{ChpermError, Result};
use crate::permission::{OrgRole, RepoPermission};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const PLACEHOLDER_OWNER: &str = "your-github-owner";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub owner: String,
    #[serde(default)]
    pub excluded_users: Vec<String>,
    pub original_org_permission: OrgRole,
    pub desired_org_permission: OrgRole,
    pub original_repo_permission: RepoPermission,
    pub desired_repo_permission: RepoPermission,
    /// Alternate API root, e.g. a GitHub Enterprise host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl Config {
    /// Template written by `--init`.
    pub fn template() -> Self {
        Self {
            owner: PLACEHOLDER_OWNER.to_string(),
            excluded_users: vec!["login-to-skip".to_string()],
            original_org_permission: OrgRole::Admin,
            desired_org_permission: OrgRole::Member,
            original_repo_permission: RepoPermission::Admin,
            desired_repo_permission: RepoPermission::Push,
            api_url: None,
        }
    }

    fn validate(&self) -> Result<()> {
        let owner = self.owner.trim();
        if owner.is_empty() || owner == PLACEHOLDER_OWNER {
            return Err(ChpermError::Config(
                "`owner` is not set. Edit the config file created by `chperm --init`.".into(),
            ));
        }
        if let Some(url) = &self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ChpermError::Config(format!(
                    "`api_url` must be an http(s) URL, got {url}"
                )));
            }
        }
        Ok(())
    }

    pub fn exclusions(&self) -> Exclusions {
        Exclusions::new(&self.excluded_users)
    }
}

/// Logins the reconciler must never touch. Matching ignores ASCII case.
#[derive(Debug, Clone, Default)]
pub struct Exclusions(HashSet<String>);

impl Exclusions {
    pub fn new<S: AsRef<str>>(logins: &[S]) -> Self {
        Self(
            logins
                .iter()
                .map(|l| l.as_ref().trim().to_ascii_lowercase())
                .filter(|l| !l.is_empty())
                .collect(),
        )
    }

    pub fn contains(&self, login: &str) -> bool {
        self.0.contains(&login.to_ascii_lowercase())
    }
}

pub fn config_path() -> Result<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg).join("chperm").join("config.json");
        return Ok(path);
    }

    let home =
        dirs::home_dir().ok_or_else(|| ChpermError::Config("Cannot find home directory".into()))?;
    Ok(home.join(".config").join("chperm").join("config.json"))
}

/// Secrets file consulted after the environment variable.
pub fn token_path(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|dir| dir.join("token"))
        .unwrap_or_else(|| PathBuf::from("token"))
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(ChpermError::Config(format!(
            "{} not found. Run `chperm --init` to create it.",
            path.display()
        )));
    }
    let contents = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&contents)
        .map_err(|e| ChpermError::Config(format!("{}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

/// Writes the template to `path` unless a file is already there. Returns whether it was created.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(&Config::template())?;
    fs::write(path, contents + "\n")?;
    Ok(true)
}
