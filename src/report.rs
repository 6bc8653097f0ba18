use crate::display;
use crate::error::{ChpermError, Result};
use serde::Serialize;
use std::fmt::Display;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Changed,
    Planned,
    Failed,
}

impl Outcome {
    fn label(self) -> &'static str {
        match self {
            Self::Changed => "changed",
            Self::Planned => "would change",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeRecord {
    /// `owner/repo` for collaborators, the organization for members.
    pub target: String,
    pub login: String,
    pub from: String,
    pub to: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collects one record per processed subject, and writes each one to the log and stdout.
#[derive(Debug, Default)]
pub struct Reporter {
    records: Vec<ChangeRecord>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    pub fn failures(&self) -> usize {
        self.records()
            .iter()
            .filter(|r| r.outcome == Outcome::Failed)
            .count()
    }

    /// Progress line naming the subjects found at `level` on `target`.
    pub fn listed(&self, target: &str, level: impl Display, logins: &[&str]) {
        let names = if logins.is_empty() {
            "none".to_string()
        } else {
            logins.join(", ")
        };
        info!("Subjects with {level} on {target}: {names}");
        display::info(&format!("{target}: {level} → {names}"));
    }

    pub fn changed(&mut self, target: &str, login: &str, from: impl Display, to: impl Display) {
        info!("Changed {login} on {target} from {from} to {to}");
        display::success(&format!("{target}: {login} changed from {from} to {to}"));
        self.push(target, login, from, to, Outcome::Changed, None);
    }

    pub fn planned(&mut self, target: &str, login: &str, from: impl Display, to: impl Display) {
        info!("Dry run: would change {login} on {target} from {from} to {to}");
        display::planned(&format!(
            "{target}: {login} would change from {from} to {to}"
        ));
        self.push(target, login, from, to, Outcome::Planned, None);
    }

    pub fn failed(
        &mut self,
        target: &str,
        login: &str,
        from: impl Display,
        to: impl Display,
        err: &ChpermError,
    ) {
        error!("Failed to change {login} on {target} from {from} to {to}: {err}");
        display::error(&format!("{target}: {login} not changed: {err}"));
        self.push(target, login, from, to, Outcome::Failed, Some(err.to_string()));
    }

    /// A target whose subjects could not be listed at all.
    pub fn unreachable(&mut self, target: &str, err: &ChpermError) {
        error!("Failed to inspect {target}: {err}");
        display::error(&format!("{target}: could not list subjects: {err}"));
        self.push(target, "-", "-", "-", Outcome::Failed, Some(err.to_string()));
    }

    fn push(
        &mut self,
        target: &str,
        login: &str,
        from: impl Display,
        to: impl Display,
        outcome: Outcome,
        error: Option<String>,
    ) {
        self.records.push(ChangeRecord {
            target: target.to_string(),
            login: login.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            outcome,
            error,
        });
    }

    /// Prints the summary; any failed record turns the run into an error.
    pub fn finish(self, json: bool) -> Result<()> {
        let failed = self.failures();
        let records = self.records();
        let total = records.len();
        info!("Run finished: {total} record(s), {failed} failure(s)");

        display::output(json, &records, |data| render_summary(data));

        if failed > 0 {
            return Err(ChpermError::ChangesFailed { failed, total });
        }
        Ok(())
    }
}

/// Logs an error that ended the run. A `ChangesFailed` summary is only a warning, since each
/// failed subject already has its own error record.
pub fn log_run_failure(err: &ChpermError) {
    match err {
        ChpermError::ChangesFailed { .. } => warn!("{err}"),
        _ => error!("{err}"),
    }
}

fn render_summary(records: &[ChangeRecord]) {
    if records.is_empty() {
        display::success("Nothing to change.");
        return;
    }

    display::section_header("Summary");

    let mut table = display::new_table(&["Target", "Login", "From", "To", "Outcome"]);

    for r in records {
        table.add_row(vec![
            r.target.as_str(),
            r.login.as_str(),
            r.from.as_str(),
            r.to.as_str(),
            r.outcome.label(),
        ]);
    }

    println!("{table}");
    println!("\n{} record(s).", records.len());
}
