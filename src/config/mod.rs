use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::{RunError, RunResult};

/// Top-level run configuration, loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Base workspace name; fully-qualified names are `<name>-<suffix>`
    pub name: String,

    /// Logical workspace suffixes; empty means a single workspace named `name`
    #[serde(default)]
    pub workspaces: Vec<String>,

    /// Terraform Cloud organization
    pub organization: String,

    /// Terraform Cloud hostname
    #[serde(default = "default_host")]
    pub host: String,

    /// Backend block for the synthesized module
    #[serde(default)]
    pub backend: Option<BackendConfig>,

    /// Extra providers beyond the always-present tfe provider
    #[serde(default)]
    pub providers: IndexMap<String, ProviderConfig>,

    /// tfe provider version constraint
    #[serde(default = "default_tfe_version")]
    pub tfe_provider_version: String,

    /// Extra attributes merged into every tfe_workspace resource body
    /// (auto_apply, terraform_version, execution_mode, ...)
    #[serde(default)]
    pub workspace_options: IndexMap<String, Value>,

    /// VCS repository attached to every workspace
    #[serde(default)]
    pub vcs: Option<VcsConfig>,

    /// Variables applied to every workspace
    #[serde(default)]
    pub variables: Vec<VariableConfig>,

    /// Variables applied to a single named workspace, keyed by logical key
    #[serde(default)]
    pub workspace_variables: IndexMap<String, Vec<VariableConfig>>,

    /// Team access rules applied to every workspace
    #[serde(default)]
    pub team_access: Vec<TeamAccessConfig>,

    /// Run triggers applied to every workspace
    #[serde(default)]
    pub run_triggers: Vec<RunTriggerConfig>,

    /// Run triggers applied to a single named workspace
    #[serde(default)]
    pub workspace_run_triggers: IndexMap<String, Vec<RunTriggerConfig>>,

    /// Notification configurations applied to every workspace
    #[serde(default)]
    pub notifications: Vec<NotificationConfig>,

    /// terraform_remote_state data sources, keyed by data-source name
    #[serde(default)]
    pub remote_states: IndexMap<String, Value>,
}

fn default_host() -> String {
    "app.terraform.io".to_string()
}

fn default_tfe_version() -> String {
    "~> 0.40".to_string()
}

/// Backend block: `type` selects the backend, remaining keys pass through
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(rename = "type")]
    pub backend_type: String,

    #[serde(flatten)]
    pub settings: IndexMap<String, Value>,
}

/// Required-provider declaration plus optional provider block body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub source: String,

    #[serde(default)]
    pub version: Option<String>,

    /// Body of the provider block, passed through verbatim
    #[serde(default)]
    pub config: Option<Value>,
}

/// VCS repository settings for the workspace resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VcsConfig {
    /// Repository identifier, e.g. "org/repo"
    pub identifier: String,

    #[serde(default)]
    pub branch: Option<String>,

    /// OAuth token ID, used directly when set
    #[serde(default)]
    pub oauth_token_id: Option<String>,

    /// OAuth client display name, resolved to a token ID via a remote lookup
    #[serde(default)]
    pub oauth_client_name: Option<String>,
}

/// A single variable input (flat or per-workspace)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableConfig {
    pub key: String,
    pub value: String,

    #[serde(default)]
    pub description: Option<String>,

    /// "env" or "terraform"
    #[serde(default = "default_category")]
    pub category: String,

    #[serde(default)]
    pub sensitive: bool,
}

fn default_category() -> String {
    "env".to_string()
}

/// A single team access rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamAccessConfig {
    #[serde(default)]
    pub team_name: Option<String>,

    #[serde(default)]
    pub team_id: Option<String>,

    /// Coarse permission level: read, plan, write, admin
    #[serde(default)]
    pub access: Option<String>,

    /// Fine-grained permission set, mutually exclusive with `access`
    #[serde(default)]
    pub permissions: Option<TeamPermissions>,
}

/// Fine-grained team permissions, mirroring the tfe_team_access schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamPermissions {
    pub runs: String,
    pub variables: String,
    pub state_versions: String,
    pub sentinel_mocks: String,
    pub workspace_locking: bool,
    pub run_tasks: bool,
}

/// A single run trigger input: either a literal remote workspace ID
/// (`ws-...`) or the logical key of another managed workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTriggerConfig {
    pub source_id: String,
}

/// A single notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub name: String,

    /// slack, email, generic, microsoft-teams
    pub destination_type: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub email_addresses: Vec<String>,

    #[serde(default)]
    pub triggers: Vec<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl RunConfig {
    /// Load and validate a run configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: RunConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file as YAML")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate structural invariants that do not need remote calls
    pub fn validate(&self) -> RunResult<()> {
        if self.name.is_empty() {
            return Err(RunError::Validation("workspace base name is empty".to_string()));
        }

        for rule in &self.team_access {
            rule.validate()?;
        }

        if let Some(vcs) = &self.vcs {
            if vcs.oauth_token_id.is_some() && vcs.oauth_client_name.is_some() {
                return Err(RunError::Validation(
                    "vcs: set either oauth_token_id or oauth_client_name, not both".to_string(),
                ));
            }

            if vcs.oauth_token_id.is_none() && vcs.oauth_client_name.is_none() {
                return Err(RunError::Validation(
                    "vcs: one of oauth_token_id or oauth_client_name is required".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl TeamAccessConfig {
    /// Exactly one of {access, permissions} and one of {team_name, team_id}
    pub fn validate(&self) -> RunResult<()> {
        match (&self.access, &self.permissions) {
            (Some(_), Some(_)) => {
                return Err(RunError::Validation(
                    "team access: set either access or permissions, not both".to_string(),
                ));
            }
            (None, None) => {
                return Err(RunError::Validation(
                    "team access: one of access or permissions is required".to_string(),
                ));
            }
            _ => {}
        }

        match (&self.team_name, &self.team_id) {
            (Some(_), Some(_)) => Err(RunError::Validation(
                "team access: set either team_name or team_id, not both".to_string(),
            )),
            (None, None) => Err(RunError::Validation(
                "team access: one of team_name or team_id is required".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Stable identifier used in element keys: the name when present,
    /// otherwise the literal team ID
    pub fn team_key(&self) -> &str {
        self.team_name
            .as_deref()
            .or(self.team_id.as_deref())
            .unwrap_or("")
    }
}
