pub mod client;
pub mod types;

pub use client::{HttpClient, ReqwestClient, TfeClient, TfeConfig};
pub use types::{
    RemoteOauthClient, RemoteRunTrigger, RemoteTeam, RemoteTeamAccess, RemoteVariable,
    RemoteWorkspace,
};

use crate::error::RunResult;

/// Remote lookups against the workspace management platform.
///
/// Every method matches by the entity's natural key and returns `Ok(None)`
/// when the collection is exhausted without a match; errors are genuine
/// transport or API failures only.
pub trait RemoteLookup: Send + Sync {
    fn find_workspace(&self, name: &str) -> RunResult<Option<RemoteWorkspace>>;

    fn find_variable(&self, workspace_id: &str, key: &str) -> RunResult<Option<RemoteVariable>>;

    fn find_team(&self, name: &str) -> RunResult<Option<RemoteTeam>>;

    fn find_team_access(
        &self,
        workspace_id: &str,
        team_id: &str,
    ) -> RunResult<Option<RemoteTeamAccess>>;

    fn find_run_trigger(
        &self,
        workspace_id: &str,
        sourceable_id: &str,
    ) -> RunResult<Option<RemoteRunTrigger>>;

    fn find_oauth_client(&self, name: &str) -> RunResult<Option<RemoteOauthClient>>;
}
