//! Fan-out merger: expands per-category declarative inputs across the
//! workspace set.
//!
//! Flat inputs produce one item per (item, workspace) pair; per-workspace
//! maps produce items for the named workspace only. References to unknown
//! workspace keys fail eagerly, before any remote call.

use indexmap::IndexMap;

use crate::config::{NotificationConfig, RunTriggerConfig, TeamAccessConfig, VariableConfig};
use crate::error::{RunError, RunResult};
use crate::workspace::Workspace;

/// A variable bound to one workspace
#[derive(Debug, Clone, PartialEq)]
pub struct VariableItem {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub category: String,
    pub sensitive: bool,
    /// Logical key of the owning workspace
    pub workspace: String,
}

/// A team access rule bound to one workspace
#[derive(Debug, Clone)]
pub struct TeamAccessItem {
    pub config: TeamAccessConfig,
    pub workspace: String,
}

/// A run trigger bound to one workspace
#[derive(Debug, Clone, PartialEq)]
pub struct RunTriggerItem {
    pub source_id: String,
    pub workspace: String,
}

/// A notification configuration bound to one workspace
#[derive(Debug, Clone)]
pub struct NotificationItem {
    pub config: NotificationConfig,
    pub workspace: String,
}

fn check_known_keys<T>(
    per_workspace: &IndexMap<String, Vec<T>>,
    workspaces: &[Workspace],
) -> RunResult<()> {
    for key in per_workspace.keys() {
        if !workspaces.iter().any(|ws| &ws.workspace == key) {
            return Err(RunError::WorkspaceNotFound {
                key: key.clone(),
                known: workspaces.iter().map(|ws| ws.workspace.clone()).collect(),
            });
        }
    }

    Ok(())
}

/// Fan variables out across the workspace set.
///
/// Per-workspace entries take precedence over flat entries with the same
/// (workspace, key); the flat item is replaced in place so output order
/// stays stable.
pub fn merge_variables(
    flat: &[VariableConfig],
    per_workspace: &IndexMap<String, Vec<VariableConfig>>,
    workspaces: &[Workspace],
) -> RunResult<Vec<VariableItem>> {
    check_known_keys(per_workspace, workspaces)?;

    let mut items: Vec<VariableItem> = Vec::new();

    for ws in workspaces {
        for var in flat {
            items.push(variable_item(var, &ws.workspace));
        }
    }

    for (key, vars) in per_workspace {
        for var in vars {
            let item = variable_item(var, key);

            match items
                .iter_mut()
                .find(|existing| existing.workspace == item.workspace && existing.key == item.key)
            {
                Some(existing) => *existing = item,
                None => items.push(item),
            }
        }
    }

    Ok(items)
}

fn variable_item(var: &VariableConfig, workspace: &str) -> VariableItem {
    VariableItem {
        key: var.key.clone(),
        value: var.value.clone(),
        description: var.description.clone(),
        category: var.category.clone(),
        sensitive: var.sensitive,
        workspace: workspace.to_string(),
    }
}

/// Fan team access rules out across the workspace set
pub fn merge_team_access(
    flat: &[TeamAccessConfig],
    workspaces: &[Workspace],
) -> RunResult<Vec<TeamAccessItem>> {
    for rule in flat {
        rule.validate()?;
    }

    let mut items = Vec::with_capacity(flat.len() * workspaces.len());

    for ws in workspaces {
        for rule in flat {
            items.push(TeamAccessItem {
                config: rule.clone(),
                workspace: ws.workspace.clone(),
            });
        }
    }

    Ok(items)
}

/// Fan run triggers out across the workspace set; per-workspace entries
/// attach to the named workspace only
pub fn merge_run_triggers(
    flat: &[RunTriggerConfig],
    per_workspace: &IndexMap<String, Vec<RunTriggerConfig>>,
    workspaces: &[Workspace],
) -> RunResult<Vec<RunTriggerItem>> {
    check_known_keys(per_workspace, workspaces)?;

    let mut items = Vec::new();

    for ws in workspaces {
        for trigger in flat {
            items.push(RunTriggerItem {
                source_id: trigger.source_id.clone(),
                workspace: ws.workspace.clone(),
            });
        }
    }

    for (key, triggers) in per_workspace {
        for trigger in triggers {
            let item = RunTriggerItem {
                source_id: trigger.source_id.clone(),
                workspace: key.clone(),
            };

            if !items.contains(&item) {
                items.push(item);
            }
        }
    }

    Ok(items)
}

/// Fan notification configurations out across the workspace set
pub fn merge_notifications(
    flat: &[NotificationConfig],
    workspaces: &[Workspace],
) -> Vec<NotificationItem> {
    let mut items = Vec::with_capacity(flat.len() * workspaces.len());

    for ws in workspaces {
        for notification in flat {
            items.push(NotificationItem {
                config: notification.clone(),
                workspace: ws.workspace.clone(),
            });
        }
    }

    items
}
