use crate::display;
use crate::error::{ChpermError, Result};
use crate::github::models::{Collaborator, Member, OwnerKind, OwnerProfile, RepositoryRef};
use crate::permission::{OrgRole, RepoPermission};
use http::{StatusCode, Uri};
use octocrab::{Octocrab, Page};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, warn};

const PER_PAGE: &str = "100";
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60 * 60);

pub struct GithubClient {
    octocrab: Octocrab,
    verbose: bool,
}

#[derive(Debug, Deserialize)]
pub struct RateLimit {
    pub resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitResource,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitResource {
    pub limit: u64,
    pub remaining: u64,
    pub reset: i64,
}

/// Lazy cursor over a paginated listing. Each call to [`Pages::next_page`] issues one request,
/// following the `Link: rel="next"` header until the listing is exhausted.
pub struct Pages<'a, T> {
    octocrab: &'a Octocrab,
    route: String,
    next: Option<Uri>,
    started: bool,
    _item: PhantomData<T>,
}

impl<'a, T: DeserializeOwned> Pages<'a, T> {
    fn new(octocrab: &'a Octocrab, route: String) -> Self {
        Self {
            octocrab,
            route,
            next: None,
            started: false,
            _item: PhantomData,
        }
    }

    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        let page: Option<Page<T>> = if self.started {
            self.octocrab.get_page::<T>(&self.next).await?
        } else {
            self.started = true;
            let first: Page<T> = self
                .octocrab
                .get(&self.route, Some(&[("per_page", PER_PAGE), ("page", "1")]))
                .await?;
            Some(first)
        };

        Ok(page.map(|mut page| {
            self.next = page.next.take();
            std::mem::take(&mut page.items)
        }))
    }

    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut all = Vec::new();
        while let Some(items) = self.next_page().await? {
            debug!("{}: fetched {} item(s)", self.route, items.len());
            all.extend(items);
        }
        Ok(all)
    }
}

impl GithubClient {
    /// `api_url` replaces the public API root, e.g. for GitHub Enterprise.
    pub fn new(token: &str, api_url: Option<&str>, verbose: bool) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());
        if let Some(url) = api_url {
            builder = builder
                .base_uri(url)
                .map_err(|e| ChpermError::Config(format!("Invalid api_url {url}: {e}")))?;
        }
        let octocrab = builder
            .build()
            .map_err(|e| ChpermError::GitHub(e.to_string()))?;
        Ok(Self { octocrab, verbose })
    }

    pub async fn owner_kind(&self, owner: &str) -> Result<OwnerKind> {
        let profile: OwnerProfile = self
            .octocrab
            .get(format!("/users/{owner}"), None::<&()>)
            .await
            .map_err(|e| ChpermError::GitHub(format!("Failed to look up {owner}: {e}")))?;

        match profile.kind.as_str() {
            "Organization" => Ok(OwnerKind::Organization),
            "User" => Ok(OwnerKind::Individual),
            other => Err(ChpermError::UnknownOwnerKind {
                owner: profile.login,
                kind: other.to_string(),
            }),
        }
    }

    pub fn repositories(&self, owner: &str, kind: OwnerKind) -> Pages<'_, RepositoryRef> {
        Pages::new(
            &self.octocrab,
            format!("/{}/{owner}/repos", kind.namespace()),
        )
    }

    pub async fn list_repositories(&self, owner: &str, kind: OwnerKind) -> Result<Vec<String>> {
        let repos = self.repositories(owner, kind).collect_all().await?;
        Ok(repos.into_iter().map(|r| r.name).collect())
    }

    pub async fn list_collaborators(&self, owner: &str, repo: &str) -> Result<Vec<Collaborator>> {
        Pages::new(
            &self.octocrab,
            format!("/repos/{owner}/{repo}/collaborators"),
        )
        .collect_all()
        .await
    }

    pub async fn list_org_members(&self, org: &str) -> Result<Vec<Member>> {
        Pages::new(&self.octocrab, format!("/orgs/{org}/members"))
            .collect_all()
            .await
    }

    /// Succeeds only on 204. A 201 means GitHub sent an invitation instead of updating access.
    pub async fn set_collaborator_permission(
        &self,
        owner: &str,
        repo: &str,
        login: &str,
        permission: RepoPermission,
    ) -> Result<()> {
        let route = format!("/repos/{owner}/{repo}/collaborators/{login}");
        let body = serde_json::json!({ "permission": permission.as_str() });
        let response = self.octocrab._put(route.as_str(), Some(&body)).await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            status => Err(ChpermError::GitHub(format!("PUT {route} returned {status}"))),
        }
    }

    pub async fn set_membership_role(&self, org: &str, login: &str, role: OrgRole) -> Result<()> {
        let route = format!("/orgs/{org}/memberships/{login}");
        let body = serde_json::json!({ "role": role.as_str() });
        let response = self.octocrab._put(route.as_str(), Some(&body)).await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ChpermError::GitHub(format!("PUT {route} returned {status}")))
        }
    }

    pub async fn get_rate_limit(&self) -> Result<RateLimit> {
        let rate_limit: RateLimit = self.octocrab.get("/rate_limit", None::<&()>).await?;
        Ok(rate_limit)
    }

    pub async fn check_rate_limit_if_verbose(&self) {
        if !self.verbose {
            return;
        }
        match self.get_rate_limit().await {
            Ok(rl) => {
                let core = &rl.resources.core;
                eprintln!(
                    "Rate limit: {}/{} remaining (resets at {})",
                    core.remaining,
                    core.limit,
                    format_reset(core.reset)
                );
            }
            Err(e) => eprintln!("Could not check rate limit: {e}"),
        }
    }

    /// Sleeps until the core rate limit resets when no requests are left.
    pub async fn wait_for_rate_limit(&self) {
        let core = match self.get_rate_limit().await {
            Ok(rl) => rl.resources.core,
            Err(e) => {
                warn!("Could not check rate limit: {e}");
                return;
            }
        };
        debug!("Rate limit: {}/{} remaining", core.remaining, core.limit);
        if core.remaining > 0 {
            return;
        }

        let wait = rate_limit_wait(core.reset, chrono::Utc::now().timestamp());
        let msg = format!(
            "Rate limit exhausted, waiting {}s (resets at {})",
            wait.as_secs(),
            format_reset(core.reset)
        );
        warn!("{msg}");
        display::warn(&msg);
        tokio::time::sleep(wait).await;
    }
}

fn rate_limit_wait(reset: i64, now: i64) -> Duration {
    let secs = reset.saturating_sub(now).max(0) as u64 + 1;
    Duration::from_secs(secs).min(MAX_RATE_LIMIT_WAIT)
}

fn format_reset(reset: i64) -> String {
    chrono::DateTime::from_timestamp(reset, 0)
        .map(|dt| dt.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| reset.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GithubClient {
        GithubClient::new("test-token", Some(&server.uri()), false).unwrap()
    }

    async fn mount_owner(server: &MockServer, owner: &str, kind: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/users/{owner}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "login": owner, "type": kind })),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn owner_kind_organization_and_user() {
        let server = MockServer::start().await;
        mount_owner(&server, "acme", "Organization").await;
        mount_owner(&server, "alice", "User").await;
        let client = client(&server);

        assert_eq!(
            client.owner_kind("acme").await.unwrap(),
            OwnerKind::Organization
        );
        assert_eq!(
            client.owner_kind("alice").await.unwrap(),
            OwnerKind::Individual
        );
    }

    #[tokio::test]
    async fn owner_kind_unknown_type() {
        let server = MockServer::start().await;
        mount_owner(&server, "robot", "Bot").await;

        let err = client(&server).owner_kind("robot").await.unwrap_err();
        assert!(matches!(err, ChpermError::UnknownOwnerKind { ref kind, .. } if kind == "Bot"));
    }

    #[tokio::test]
    async fn owner_kind_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "Not Found",
                "documentation_url": "https://docs.github.com"
            })))
            .mount(&server)
            .await;

        let err = client(&server).owner_kind("ghost").await.unwrap_err();
        assert!(matches!(err, ChpermError::GitHub(_)));
    }

    #[tokio::test]
    async fn repositories_use_owner_namespace() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/repos"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "name": "api" }, { "name": "web" }])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/alice/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": "dotfiles" }])))
            .expect(1)
            .mount(&server)
            .await;
        let client = client(&server);

        let org_repos = client
            .list_repositories("acme", OwnerKind::Organization)
            .await
            .unwrap();
        let user_repos = client
            .list_repositories("alice", OwnerKind::Individual)
            .await
            .unwrap();

        assert_eq!(org_repos, vec!["api", "web"]);
        assert_eq!(user_repos, vec!["dotfiles"]);
    }

    #[tokio::test]
    async fn listing_follows_next_links() {
        let server = MockServer::start().await;
        let next = format!(
            "<{}/orgs/acme/members?per_page=100&page=2>; rel=\"next\"",
            server.uri()
        );
        Mock::given(method("GET"))
            .and(path("/orgs/acme/members"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("link", next.as_str())
                    .set_body_json(json!([{ "login": "a", "site_admin": true }])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/members"))
            .and(query_param("page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "login": "b", "site_admin": false }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let members = client(&server).list_org_members("acme").await.unwrap();
        let logins: Vec<&str> = members.iter().map(|m| m.login.as_str()).collect();
        assert_eq!(logins, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn pages_are_fetched_one_at_a_time() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/alice/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "name": "one" }])))
            .mount(&server)
            .await;
        let client = client(&server);

        let mut pages = client.repositories("alice", OwnerKind::Individual);
        let first = pages.next_page().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);
        assert!(pages.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_failure_is_an_error_not_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/acme/repos"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "message": "Forbidden",
                "documentation_url": "https://docs.github.com"
            })))
            .mount(&server)
            .await;

        let result = client(&server)
            .list_repositories("acme", OwnerKind::Organization)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn collaborator_permission_requires_204() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/acme/api/collaborators/alice"))
            .and(body_json(json!({ "permission": "push" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/repos/acme/api/collaborators/newbie"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
            .mount(&server)
            .await;
        let client = client(&server);

        client
            .set_collaborator_permission("acme", "api", "alice", RepoPermission::Push)
            .await
            .unwrap();
        let err = client
            .set_collaborator_permission("acme", "api", "newbie", RepoPermission::Push)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("201"));
    }

    #[tokio::test]
    async fn membership_role_accepts_any_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/orgs/acme/memberships/dev"))
            .and(body_json(json!({ "role": "member" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "role": "member" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/orgs/acme/memberships/locked"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "message": "Forbidden",
                "documentation_url": "https://docs.github.com"
            })))
            .mount(&server)
            .await;
        let client = client(&server);

        client
            .set_membership_role("acme", "dev", OrgRole::Member)
            .await
            .unwrap();
        assert!(client
            .set_membership_role("acme", "locked", OrgRole::Member)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn rate_limit_with_requests_left_does_not_wait() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rate_limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resources": { "core": { "limit": 5000, "remaining": 4999, "reset": 0 } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let started = std::time::Instant::now();
        client(&server).wait_for_rate_limit().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn rate_limit_wait_is_bounded() {
        assert_eq!(rate_limit_wait(100, 90), Duration::from_secs(11));
        assert_eq!(rate_limit_wait(90, 100), Duration::from_secs(1));
        assert_eq!(rate_limit_wait(i64::MAX, 0), MAX_RATE_LIMIT_WAIT);
    }
}
