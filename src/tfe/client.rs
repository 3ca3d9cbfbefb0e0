use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use url::Url;

use super::types::*;
use super::RemoteLookup;
use crate::error::{RunError, RunResult};

/// Upper bound on pages walked per lookup, guarding against malformed
/// pagination metadata
const MAX_PAGES: u32 = 100;

/// HTTP client trait for testing
pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str) -> Result<String>;
}

/// Real HTTP client using reqwest, with bearer auth and a request timeout
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
    token: String,
}

impl ReqwestClient {
    pub fn new(token: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            token: token.to_string(),
        })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header("Content-Type", "application/vnd.api+json")
            .send()
            .with_context(|| format!("Failed to fetch URL: {}", url))?;

        if !response.status().is_success() {
            bail!("HTTP request failed with status {}: {}", response.status(), url);
        }

        response
            .text()
            .with_context(|| format!("Failed to read response body from: {}", url))
    }
}

/// Connection settings for the remote API; the page size is an explicit
/// value here, never a process-wide global
#[derive(Debug, Clone)]
pub struct TfeConfig {
    pub host: String,
    pub organization: String,
    pub page_size: u32,
}

impl TfeConfig {
    pub fn new(host: &str, organization: &str) -> Self {
        Self {
            host: host.to_string(),
            organization: organization.to_string(),
            page_size: 20,
        }
    }
}

/// Remote lookup client for the Terraform Cloud v2 API
pub struct TfeClient<H: HttpClient> {
    http: H,
    config: TfeConfig,
}

impl<H: HttpClient> TfeClient<H> {
    pub fn new(http: H, config: TfeConfig) -> Self {
        Self { http, config }
    }

    fn collection_url(&self, path: &str, filters: &[(&str, &str)]) -> RunResult<Url> {
        let base = format!("https://{}{}", self.config.host, path);
        let mut url = Url::parse(&base).map_err(|err| RunError::RemoteLookup {
            url: base.clone(),
            message: err.to_string(),
        })?;

        for (key, value) in filters {
            url.query_pairs_mut().append_pair(key, value);
        }

        Ok(url)
    }

    /// Walk a paginated collection, returning the first item the predicate
    /// maps to `Some`.
    ///
    /// Iterative, page by page: the next page is fetched only when the
    /// reported next-page indicator exceeds the page just processed, so
    /// malformed metadata cannot loop forever. Exhaustion without a match is
    /// `Ok(None)`, not an error.
    fn paged_find<T, R, F>(&self, url: &Url, mut matches: F) -> RunResult<Option<R>>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> Option<R>,
    {
        let mut page = 1u32;

        loop {
            let mut page_url = url.clone();
            page_url
                .query_pairs_mut()
                .append_pair("page[number]", &page.to_string())
                .append_pair("page[size]", &self.config.page_size.to_string());

            let body =
                self.http
                    .get(page_url.as_str())
                    .map_err(|err| RunError::RemoteLookup {
                        url: page_url.to_string(),
                        message: err.to_string(),
                    })?;

            let document: Document<T> =
                serde_json::from_str(&body).map_err(|err| RunError::RemoteLookup {
                    url: page_url.to_string(),
                    message: format!("invalid response body: {}", err),
                })?;

            for item in document.data {
                if let Some(found) = matches(item) {
                    return Ok(Some(found));
                }
            }

            let next = document
                .meta
                .pagination
                .as_ref()
                .and_then(|pagination| pagination.next_page);

            match next {
                Some(next_page) if next_page > page && page < MAX_PAGES => page = next_page,
                _ => return Ok(None),
            }
        }
    }
}

impl<H: HttpClient> RemoteLookup for TfeClient<H> {
    fn find_workspace(&self, name: &str) -> RunResult<Option<RemoteWorkspace>> {
        let url = self.collection_url(
            &format!(
                "/api/v2/organizations/{}/workspaces",
                self.config.organization
            ),
            &[],
        )?;

        self.paged_find(&url, |ws: WorkspaceResource| {
            (ws.attributes.name == name).then(|| RemoteWorkspace {
                id: ws.id,
                name: ws.attributes.name,
            })
        })
    }

    fn find_variable(&self, workspace_id: &str, key: &str) -> RunResult<Option<RemoteVariable>> {
        let url =
            self.collection_url(&format!("/api/v2/workspaces/{}/vars", workspace_id), &[])?;

        self.paged_find(&url, |var: VariableResource| {
            (var.attributes.key == key).then(|| RemoteVariable {
                id: var.id,
                key: var.attributes.key,
            })
        })
    }

    fn find_team(&self, name: &str) -> RunResult<Option<RemoteTeam>> {
        let url = self.collection_url(
            &format!("/api/v2/organizations/{}/teams", self.config.organization),
            &[],
        )?;

        self.paged_find(&url, |team: TeamResource| {
            (team.attributes.name == name).then(|| RemoteTeam {
                id: team.id,
                name: team.attributes.name,
            })
        })
    }

    fn find_team_access(
        &self,
        workspace_id: &str,
        team_id: &str,
    ) -> RunResult<Option<RemoteTeamAccess>> {
        let url = self.collection_url(
            "/api/v2/team-workspaces",
            &[("filter[workspace][id]", workspace_id)],
        )?;

        self.paged_find(&url, |link: TeamAccessResource| {
            let linked_team = link.relationships.team.data?;

            (linked_team.id == team_id).then_some(RemoteTeamAccess {
                id: link.id,
                team_id: linked_team.id,
            })
        })
    }

    fn find_run_trigger(
        &self,
        workspace_id: &str,
        sourceable_id: &str,
    ) -> RunResult<Option<RemoteRunTrigger>> {
        let url = self.collection_url(
            &format!("/api/v2/workspaces/{}/run-triggers", workspace_id),
            &[("filter[run-trigger][type]", "inbound")],
        )?;

        self.paged_find(&url, |trigger: RunTriggerResource| {
            let sourceable = trigger.relationships.sourceable.data?;

            (sourceable.id == sourceable_id).then_some(RemoteRunTrigger {
                id: trigger.id,
                sourceable_id: sourceable.id,
            })
        })
    }

    fn find_oauth_client(&self, name: &str) -> RunResult<Option<RemoteOauthClient>> {
        let url = self.collection_url(
            &format!(
                "/api/v2/organizations/{}/oauth-clients",
                self.config.organization
            ),
            &[],
        )?;

        self.paged_find(&url, |client: OauthClientResource| {
            (client.attributes.name.as_deref() == Some(name)).then(|| RemoteOauthClient {
                oauth_token_id: client
                    .relationships
                    .and_then(|rel| rel.oauth_tokens.data.into_iter().next())
                    .map(|token| token.id),
                id: client.id,
                name: client.attributes.name,
            })
        })
    }
}
