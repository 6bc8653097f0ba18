use crate::error::{ChpermError, Result};
use std::io::{self, BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Where a token may come from, tried in field order before falling back to a prompt.
pub struct CredentialSources {
    pub env_var: String,
    pub file: PathBuf,
}

impl CredentialSources {
    pub fn new(file: PathBuf) -> Self {
        Self {
            env_var: TOKEN_ENV.to_string(),
            file,
        }
    }

    /// Environment, then secrets file, then the interactive prompt.
    pub fn resolve(&self) -> Result<String> {
        self.resolve_with(prompt_for_token)
    }

    pub fn resolve_with(&self, prompt: impl FnOnce() -> io::Result<String>) -> Result<String> {
        if let Some(token) = std::env::var(&self.env_var).ok().and_then(non_empty) {
            info!("Using token from ${}", self.env_var);
            return Ok(token);
        }

        if let Some(token) = read_token_file(&self.file) {
            info!("Using token from {}", self.file.display());
            return Ok(token);
        }

        match prompt() {
            Ok(input) => {
                if let Some(token) = non_empty(input) {
                    info!("Using token from prompt");
                    return Ok(token);
                }
            }
            Err(e) => debug!("Token prompt failed: {e}"),
        }

        Err(ChpermError::MissingCredentials(
            self.file.display().to_string(),
        ))
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn read_token_file(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => non_empty(contents),
        Err(e) => {
            debug!("No token file at {}: {e}", path.display());
            None
        }
    }
}

fn prompt_for_token() -> io::Result<String> {
    if io::stdin().is_terminal() {
        return rpassword::prompt_password("Enter your GitHub personal access token: ");
    }
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
