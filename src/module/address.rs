//! Deterministic resource addressing.
//!
//! Every address combines the owning workspace's logical key with the item's
//! own natural key, so collisions are structurally impossible and re-running
//! synthesis reproduces identical addresses. Addresses are used both for
//! labeling resources in the synthesized document and for matching against
//! existing state during import reconciliation.

/// Resource type of the workspace resource, the destroy guard's default
/// protected type
pub const WORKSPACE_TYPE: &str = "tfe_workspace";

/// Element key shared by variables, team access and run triggers:
/// `<workspace>-<item-key>`
pub fn element_key(workspace: &str, item_key: &str) -> String {
    format!("{}-{}", workspace, item_key)
}

/// `tfe_workspace.workspace["<workspace>"]`
pub fn workspace(workspace: &str) -> String {
    format!("tfe_workspace.workspace[\"{}\"]", workspace)
}

/// Resource name of a variable: `<workspace>-<key>`
pub fn variable_name(workspace: &str, key: &str) -> String {
    element_key(workspace, key)
}

/// `tfe_variable.<workspace>-<key>` (flat form, applied uniformly to
/// synthesis and import lookup)
pub fn variable(workspace: &str, key: &str) -> String {
    format!("tfe_variable.{}", variable_name(workspace, key))
}

/// `tfe_team_access.teams["<workspace>-<team>"]`
pub fn team_access(workspace: &str, team_key: &str) -> String {
    format!("tfe_team_access.teams[\"{}\"]", element_key(workspace, team_key))
}

/// `tfe_run_trigger.trigger["<workspace>-<source>"]`
pub fn run_trigger(workspace: &str, source_id: &str) -> String {
    format!("tfe_run_trigger.trigger[\"{}\"]", element_key(workspace, source_id))
}

/// Resource name of a notification configuration: `<workspace>-<name>`
pub fn notification_name(workspace: &str, name: &str) -> String {
    element_key(workspace, name)
}
