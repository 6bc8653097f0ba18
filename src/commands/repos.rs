use crate::commands::{connect, resolve_owner, RunOptions};
use crate::config::{Config, Exclusions};
use crate::error::{ChpermError, Result};
use crate::github::GithubClient;
use crate::permission::RepoPermission;
use crate::reconcile::{candidates, Rule};
use crate::report::Reporter;
use tracing::info;

pub async fn run(opts: &RunOptions) -> Result<()> {
    let (config, client) = connect(opts)?;

    let mut reporter = Reporter::new();
    reconcile_repositories(&client, &config, opts.dry_run, &mut reporter).await?;

    client.check_rate_limit_if_verbose().await;

    reporter.finish(opts.json)
}

/// Rewrites collaborator access on every repository of the configured owner.
///
/// Failing to resolve the owner or to enumerate its repositories aborts the run. Failures on a
/// single repository or collaborator are reported and the run moves on.
pub async fn reconcile_repositories(
    client: &GithubClient,
    config: &Config,
    dry_run: bool,
    reporter: &mut Reporter,
) -> Result<()> {
    let owner = config.owner.as_str();
    let kind = resolve_owner(client, owner).await?;

    let repos = client
        .list_repositories(owner, kind)
        .await
        .map_err(|e| ChpermError::EnumerationFailed {
            what: "repositories",
            owner: owner.to_string(),
            reason: e.to_string(),
        })?;
    info!("Found {} repositories for {owner}", repos.len());

    let reconciler = RepoReconciler {
        client,
        owner,
        excluded: config.exclusions(),
        rule: Rule {
            original: config.original_repo_permission,
            desired: config.desired_repo_permission,
        },
        dry_run,
    };

    for repo in &repos {
        client.wait_for_rate_limit().await;
        reconciler.reconcile(repo, reporter).await;
    }

    Ok(())
}

struct RepoReconciler<'a> {
    client: &'a GithubClient,
    owner: &'a str,
    excluded: Exclusions,
    rule: Rule<RepoPermission>,
    dry_run: bool,
}

impl RepoReconciler<'_> {
    async fn reconcile(&self, repo: &str, reporter: &mut Reporter) {
        let target = format!("{}/{repo}", self.owner);
        let Rule { original, desired } = self.rule;

        let collaborators = match self.client.list_collaborators(self.owner, repo).await {
            Ok(c) => c,
            Err(e) => {
                reporter.unreachable(&target, &e);
                return;
            }
        };
        info!("Found {} collaborator(s) on {target}", collaborators.len());

        let selected: Vec<&str> = candidates(&collaborators, &self.excluded, self.rule)
            .into_iter()
            .map(|c| c.login.as_str())
            .collect();
        reporter.listed(&target, original, &selected);

        for login in selected {
            if self.dry_run {
                reporter.planned(&target, login, original, desired);
                continue;
            }
            match self
                .client
                .set_collaborator_permission(self.owner, repo, login, desired)
                .await
            {
                Ok(()) => reporter.changed(&target, login, original, desired),
                Err(e) => reporter.failed(&target, login, original, desired, &e),
            }
        }
    }
}
