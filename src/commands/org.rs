use crate::commands::{connect, resolve_owner, RunOptions};
use crate::config::Config;
use crate::error::{ChpermError, Result};
use crate::github::{GithubClient, OwnerKind};
use crate::reconcile::{candidates, Rule};
use crate::report::Reporter;
use tracing::{error, info};

pub async fn run(opts: &RunOptions) -> Result<()> {
    let (config, client) = connect(opts)?;

    let mut reporter = Reporter::new();
    reconcile_members(&client, &config, opts.dry_run, &mut reporter).await?;

    client.check_rate_limit_if_verbose().await;

    reporter.finish(opts.json)
}

/// Rewrites the organization role of every matching member of the configured owner.
pub async fn reconcile_members(
    client: &GithubClient,
    config: &Config,
    dry_run: bool,
    reporter: &mut Reporter,
) -> Result<()> {
    let org = config.owner.as_str();
    let kind = resolve_owner(client, org).await?;
    if kind != OwnerKind::Organization {
        error!("{org} is a {kind}, organization roles cannot be changed");
        return Err(ChpermError::NotAnOrganization(org.to_string()));
    }

    let members = client
        .list_org_members(org)
        .await
        .map_err(|e| ChpermError::EnumerationFailed {
            what: "members",
            owner: org.to_string(),
            reason: e.to_string(),
        })?;
    info!("Found {} member(s) in {org}", members.len());

    let rule = Rule {
        original: config.original_org_permission,
        desired: config.desired_org_permission,
    };
    let excluded = config.exclusions();
    let selected: Vec<&str> = candidates(&members, &excluded, rule)
        .into_iter()
        .map(|m| m.login.as_str())
        .collect();
    reporter.listed(org, rule.original, &selected);

    if selected.is_empty() {
        return Ok(());
    }
    client.wait_for_rate_limit().await;

    for login in selected {
        if dry_run {
            reporter.planned(org, login, rule.original, rule.desired);
            continue;
        }
        match client.set_membership_role(org, login, rule.desired).await {
            Ok(()) => reporter.changed(org, login, rule.original, rule.desired),
            Err(e) => reporter.failed(org, login, rule.original, rule.desired, &e),
        }
    }

    Ok(())
}
