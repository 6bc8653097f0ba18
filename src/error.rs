use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChpermError {
    #[error("No GitHub token found. Set GITHUB_TOKEN, write it to {0}, or enter it at the prompt.")]
    MissingCredentials(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("GitHub API error: {0}")]
    GitHub(String),

    #[error("Unknown owner type for {owner}: {kind}")]
    UnknownOwnerKind { owner: String, kind: String },

    #[error("{0} is not an organization")]
    NotAnOrganization(String),

    #[error("Failed to enumerate {what} for {owner}: {reason}")]
    EnumerationFailed {
        what: &'static str,
        owner: String,
        reason: String,
    },

    #[error("{failed} of {total} permission change(s) failed. See the log for details.")]
    ChangesFailed { failed: usize, total: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<octocrab::Error> for ChpermError {
    fn from(err: octocrab::Error) -> Self {
        ChpermError::GitHub(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChpermError>;
