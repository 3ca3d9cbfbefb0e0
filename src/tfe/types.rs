//! Wire types for the Terraform Cloud v2 API (JSON:API shapes) and the
//! plain records the rest of the crate consumes.

use serde::Deserialize;

/// One page of a paginated collection
#[derive(Debug, Deserialize)]
pub struct Document<T> {
    pub data: Vec<T>,

    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(rename = "current-page")]
    pub current_page: u32,

    #[serde(rename = "next-page")]
    pub next_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Relationship {
    pub data: Option<RelationshipData>,
}

#[derive(Debug, Deserialize)]
pub struct RelationshipData {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceResource {
    pub id: String,
    pub attributes: WorkspaceAttributes,
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceAttributes {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct VariableResource {
    pub id: String,
    pub attributes: VariableAttributes,
}

#[derive(Debug, Deserialize)]
pub struct VariableAttributes {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct TeamResource {
    pub id: String,
    pub attributes: TeamAttributes,
}

#[derive(Debug, Deserialize)]
pub struct TeamAttributes {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TeamAccessResource {
    pub id: String,
    pub relationships: TeamAccessRelationships,
}

#[derive(Debug, Deserialize)]
pub struct TeamAccessRelationships {
    pub team: Relationship,
}

#[derive(Debug, Deserialize)]
pub struct RunTriggerResource {
    pub id: String,
    pub relationships: RunTriggerRelationships,
}

#[derive(Debug, Deserialize)]
pub struct RunTriggerRelationships {
    pub sourceable: Relationship,
}

#[derive(Debug, Deserialize)]
pub struct OauthClientResource {
    pub id: String,
    pub attributes: OauthClientAttributes,

    #[serde(default)]
    pub relationships: Option<OauthClientRelationships>,
}

#[derive(Debug, Deserialize)]
pub struct OauthClientAttributes {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OauthClientRelationships {
    #[serde(rename = "oauth-tokens")]
    pub oauth_tokens: TokenList,
}

#[derive(Debug, Deserialize)]
pub struct TokenList {
    #[serde(default)]
    pub data: Vec<RelationshipData>,
}

/// A remote workspace, matched by name
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteWorkspace {
    pub id: String,
    pub name: String,
}

/// A remote workspace variable, matched by key
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteVariable {
    pub id: String,
    pub key: String,
}

/// A remote team, matched by name
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteTeam {
    pub id: String,
    pub name: String,
}

/// A remote team-workspace access link, matched by team ID
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteTeamAccess {
    pub id: String,
    pub team_id: String,
}

/// A remote inbound run trigger, matched by sourceable workspace ID
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRunTrigger {
    pub id: String,
    pub sourceable_id: String,
}

/// A remote OAuth client, matched by display name
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteOauthClient {
    pub id: String,
    pub name: Option<String>,
    pub oauth_token_id: Option<String>,
}
