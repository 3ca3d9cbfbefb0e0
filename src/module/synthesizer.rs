use serde_json::{json, Map, Value};

use super::address;
use super::builder::Module;
use crate::config::RunConfig;
use crate::error::{RunError, RunResult};
use crate::merge::{NotificationItem, RunTriggerItem, TeamAccessItem, VariableItem};
use crate::tfe::RemoteLookup;
use crate::workspace::Workspace;

/// Assembles the synthesized module document from the workspace set and the
/// fanned-out item collections.
///
/// Synthesis is read-only: it may resolve a named OAuth client through the
/// remote lookup but never mutates remote state.
pub struct Synthesizer<'a> {
    config: &'a RunConfig,
    workspaces: &'a [Workspace],
    variables: &'a [VariableItem],
    team_access: &'a [TeamAccessItem],
    run_triggers: &'a [RunTriggerItem],
    notifications: &'a [NotificationItem],
    lookup: Option<&'a dyn RemoteLookup>,
}

/// Expression referencing a managed workspace's remote ID
fn workspace_id_ref(workspace: &str) -> String {
    format!("${{tfe_workspace.workspace[\"{}\"].id}}", workspace)
}

impl<'a> Synthesizer<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &'a RunConfig,
        workspaces: &'a [Workspace],
        variables: &'a [VariableItem],
        team_access: &'a [TeamAccessItem],
        run_triggers: &'a [RunTriggerItem],
        notifications: &'a [NotificationItem],
        lookup: Option<&'a dyn RemoteLookup>,
    ) -> Self {
        Self {
            config,
            workspaces,
            variables,
            team_access,
            run_triggers,
            notifications,
            lookup,
        }
    }

    /// Build the full module document
    pub fn synthesize(&self) -> RunResult<Module> {
        let mut module = Module::new();

        self.add_terraform_block(&mut module);
        self.add_providers(&mut module);
        self.add_workspaces(&mut module)?;
        self.add_variables(&mut module);
        self.add_team_access(&mut module);
        self.add_run_triggers(&mut module)?;
        self.add_notifications(&mut module);
        self.add_remote_states(&mut module);

        Ok(module)
    }

    fn add_terraform_block(&self, module: &mut Module) {
        if let Some(backend) = &self.config.backend {
            let settings: Map<String, Value> = backend
                .settings
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();

            module
                .terraform
                .backend
                .insert(backend.backend_type.clone(), Value::Object(settings));
        }

        module.terraform.required_providers.insert(
            "tfe".to_string(),
            json!({
                "source": "hashicorp/tfe",
                "version": self.config.tfe_provider_version,
            }),
        );

        for (name, provider) in &self.config.providers {
            let mut declaration = Map::new();
            declaration.insert("source".to_string(), json!(provider.source));

            if let Some(version) = &provider.version {
                declaration.insert("version".to_string(), json!(version));
            }

            module
                .terraform
                .required_providers
                .insert(name.clone(), Value::Object(declaration));
        }
    }

    fn add_providers(&self, module: &mut Module) {
        module
            .provider
            .insert("tfe".to_string(), json!([{"hostname": self.config.host}]));

        for (name, provider) in &self.config.providers {
            let body = provider.config.clone().unwrap_or_else(|| json!({}));
            module.provider.insert(name.clone(), json!([body]));
        }
    }

    fn add_workspaces(&self, module: &mut Module) -> RunResult<()> {
        let mut for_each = Map::new();

        for ws in self.workspaces {
            for_each.insert(ws.workspace.clone(), json!(ws.name));
        }

        let mut body = Map::new();
        body.insert("for_each".to_string(), Value::Object(for_each));
        body.insert("name".to_string(), json!("${each.value}"));
        body.insert("organization".to_string(), json!(self.config.organization));

        for (key, value) in &self.config.workspace_options {
            body.insert(key.clone(), value.clone());
        }

        if let Some(vcs) = &self.config.vcs {
            let token_id = self.resolve_oauth_token(vcs)?;
            let mut vcs_repo = Map::new();
            vcs_repo.insert("identifier".to_string(), json!(vcs.identifier));
            vcs_repo.insert("oauth_token_id".to_string(), json!(token_id));

            if let Some(branch) = &vcs.branch {
                vcs_repo.insert("branch".to_string(), json!(branch));
            }

            body.insert("vcs_repo".to_string(), Value::Object(vcs_repo));
        }

        module.append_resource(address::WORKSPACE_TYPE, "workspace", Value::Object(body));
        Ok(())
    }

    /// Resolve the VCS OAuth token ID, looking a named client up remotely
    /// when the config gives a client name instead of a token ID
    fn resolve_oauth_token(&self, vcs: &crate::config::VcsConfig) -> RunResult<String> {
        if let Some(token_id) = &vcs.oauth_token_id {
            return Ok(token_id.clone());
        }

        let name = vcs.oauth_client_name.as_deref().unwrap_or_default();
        let lookup = self.lookup.ok_or_else(|| {
            RunError::Validation(format!(
                "resolving OAuth client '{}' requires an API token",
                name
            ))
        })?;

        let client = lookup.find_oauth_client(name)?.ok_or_else(|| {
            RunError::Validation(format!("OAuth client '{}' not found", name))
        })?;

        client.oauth_token_id.ok_or_else(|| {
            RunError::Validation(format!("OAuth client '{}' has no token", name))
        })
    }

    fn add_variables(&self, module: &mut Module) {
        for item in self.variables {
            let mut body = Map::new();
            body.insert("key".to_string(), json!(item.key));
            body.insert("value".to_string(), json!(item.value));
            body.insert("category".to_string(), json!(item.category));

            if let Some(description) = &item.description {
                body.insert("description".to_string(), json!(description));
            }

            if item.sensitive {
                body.insert("sensitive".to_string(), json!(true));
            }

            body.insert(
                "workspace_id".to_string(),
                json!(workspace_id_ref(&item.workspace)),
            );

            module.append_resource(
                "tfe_variable",
                &address::variable_name(&item.workspace, &item.key),
                Value::Object(body),
            );
        }
    }

    fn add_team_access(&self, module: &mut Module) {
        if self.team_access.is_empty() {
            return;
        }

        for item in self.team_access {
            let team_id = match (&item.config.team_name, &item.config.team_id) {
                (Some(name), _) => {
                    // By-name entries get a companion data lookup so the
                    // document resolves the team ID without a prior call
                    module.append_data(
                        "tfe_team",
                        "teams",
                        json!({
                            "for_each": {name.clone(): name},
                            "name": "${each.value}",
                            "organization": self.config.organization,
                        }),
                    );

                    format!("${{data.tfe_team.teams[\"{}\"].id}}", name)
                }
                (None, Some(id)) => id.clone(),
                (None, None) => continue, // rejected earlier by validation
            };

            let permissions: Vec<Value> = item
                .config
                .permissions
                .as_ref()
                .map(|perms| vec![serde_json::to_value(perms).unwrap_or_default()])
                .unwrap_or_default();

            let entry = json!({
                "workspace": item.workspace,
                "team_id": team_id,
                "access": item.config.access,
                "permissions": permissions,
            });

            let key = address::element_key(&item.workspace, item.config.team_key());
            module.append_resource(
                "tfe_team_access",
                "teams",
                json!({"for_each": {key: entry}}),
            );
        }

        // One resource covers both the simple-access and fine-grained
        // variants: `access` interpolates to null for permission entries and
        // the dynamic block emits zero or one permissions blocks
        module.append_resource(
            "tfe_team_access",
            "teams",
            json!({
                "workspace_id": "${tfe_workspace.workspace[each.value.workspace].id}",
                "team_id": "${each.value.team_id}",
                "access": "${each.value.access}",
                "dynamic": {
                    "permissions": {
                        "for_each": "${each.value.permissions}",
                        "content": {
                            "runs": "${permissions.value.runs}",
                            "variables": "${permissions.value.variables}",
                            "state_versions": "${permissions.value.state_versions}",
                            "sentinel_mocks": "${permissions.value.sentinel_mocks}",
                            "workspace_locking": "${permissions.value.workspace_locking}",
                            "run_tasks": "${permissions.value.run_tasks}",
                        },
                    },
                },
            }),
        );
    }

    fn add_run_triggers(&self, module: &mut Module) -> RunResult<()> {
        if self.run_triggers.is_empty() {
            return Ok(());
        }

        for item in self.run_triggers {
            let sourceable_id = self.resolve_trigger_source(&item.source_id)?;
            let entry = json!({
                "workspace": item.workspace,
                "sourceable_id": sourceable_id,
            });

            let key = address::element_key(&item.workspace, &item.source_id);
            module.append_resource(
                "tfe_run_trigger",
                "trigger",
                json!({"for_each": {key: entry}}),
            );
        }

        module.append_resource(
            "tfe_run_trigger",
            "trigger",
            json!({
                "workspace_id": "${tfe_workspace.workspace[each.value.workspace].id}",
                "sourceable_id": "${each.value.sourceable_id}",
            }),
        );

        Ok(())
    }

    /// A trigger source is either a literal remote workspace ID or the
    /// logical key of another managed workspace, rendered as a
    /// cross-workspace reference
    fn resolve_trigger_source(&self, source_id: &str) -> RunResult<String> {
        if source_id.starts_with("ws-") {
            return Ok(source_id.to_string());
        }

        if self.workspaces.iter().any(|ws| ws.workspace == source_id) {
            return Ok(workspace_id_ref(source_id));
        }

        Err(RunError::WorkspaceNotFound {
            key: source_id.to_string(),
            known: self
                .workspaces
                .iter()
                .map(|ws| ws.workspace.clone())
                .collect(),
        })
    }

    fn add_notifications(&self, module: &mut Module) {
        for item in self.notifications {
            let config = &item.config;
            let mut body = Map::new();
            body.insert("name".to_string(), json!(config.name));
            body.insert("destination_type".to_string(), json!(config.destination_type));
            body.insert("enabled".to_string(), json!(config.enabled));

            if let Some(url) = &config.url {
                body.insert("url".to_string(), json!(url));
            }

            if let Some(token) = &config.token {
                body.insert("token".to_string(), json!(token));
            }

            if !config.email_addresses.is_empty() {
                body.insert("email_addresses".to_string(), json!(config.email_addresses));
            }

            if !config.triggers.is_empty() {
                body.insert("triggers".to_string(), json!(config.triggers));
            }

            body.insert(
                "workspace_id".to_string(),
                json!(workspace_id_ref(&item.workspace)),
            );

            module.append_resource(
                "tfe_notification_configuration",
                &address::notification_name(&item.workspace, &config.name),
                Value::Object(body),
            );
        }
    }

    fn add_remote_states(&self, module: &mut Module) {
        for (name, body) in &self.config.remote_states {
            module.append_data("terraform_remote_state", name, body.clone());
        }
    }
}
