//! Import reconciliation: before any plan runs, every resource the module
//! will manage is checked against the state store and, when it already
//! exists remotely, imported by address and remote ID.
//!
//! Per resource the walk is: address already in state → already managed,
//! skip with no remote calls; otherwise a remote lookup by natural key either
//! finds a matching entity (import it) or finds nothing (the resource will be
//! created fresh on apply). Imports mutate the shared state store, so they
//! run strictly sequentially in a fixed order: workspace, then variables,
//! then team access, then run triggers, one workspace at a time.

use crate::error::RunResult;
use crate::merge::{RunTriggerItem, TeamAccessItem, VariableItem};
use crate::module::address;
use crate::terraform::{PlanningTool, StateSnapshot};
use crate::tfe::RemoteLookup;
use crate::workspace::Workspace;

/// Outcome counts of a reconciliation pass
#[derive(Debug, Default)]
pub struct ImportSummary {
    /// Addresses imported this run, in import order
    pub imported: Vec<String>,
    /// Addresses already present in state
    pub already_managed: usize,
    /// Resources with no matching remote entity
    pub not_found: usize,
}

pub struct Reconciler<'a> {
    lookup: &'a dyn RemoteLookup,
    tool: &'a dyn PlanningTool,
    organization: String,
}

impl<'a> Reconciler<'a> {
    pub fn new(lookup: &'a dyn RemoteLookup, tool: &'a dyn PlanningTool, organization: &str) -> Self {
        Self {
            lookup,
            tool,
            organization: organization.to_string(),
        }
    }

    /// Resolve remote workspace IDs, then import everything that exists
    /// remotely but is absent from state.
    ///
    /// A failed lookup or import aborts immediately; earlier imports persist
    /// (each is individually idempotent on re-run).
    pub fn reconcile(
        &self,
        state: &mut StateSnapshot,
        workspaces: &mut [Workspace],
        variables: &[VariableItem],
        team_access: &[TeamAccessItem],
        run_triggers: &[RunTriggerItem],
    ) -> RunResult<ImportSummary> {
        self.resolve_workspace_ids(workspaces)?;

        let mut summary = ImportSummary::default();

        for index in 0..workspaces.len() {
            let ws = workspaces[index].clone();

            self.import_workspace(state, &ws, &mut summary)?;

            // Dependent categories need the remote workspace ID; without one
            // the workspace does not exist yet and everything under it will
            // be created fresh
            let Some(ws_id) = ws.id.clone() else {
                continue;
            };

            self.import_variables(state, &ws, &ws_id, variables, &mut summary)?;
            self.import_team_access(state, &ws, &ws_id, team_access, &mut summary)?;
            self.import_run_triggers(state, &ws, &ws_id, run_triggers, workspaces, &mut summary)?;
        }

        Ok(summary)
    }

    /// Populate `id` for every workspace that exists remotely
    fn resolve_workspace_ids(&self, workspaces: &mut [Workspace]) -> RunResult<()> {
        for ws in workspaces.iter_mut() {
            if ws.id.is_some() {
                continue;
            }

            ws.id = self
                .lookup
                .find_workspace(&ws.name)?
                .map(|remote| remote.id);
        }

        Ok(())
    }

    fn import_workspace(
        &self,
        state: &mut StateSnapshot,
        ws: &Workspace,
        summary: &mut ImportSummary,
    ) -> RunResult<()> {
        let addr = address::workspace(&ws.workspace);

        if state.contains(&addr) {
            summary.already_managed += 1;
            return Ok(());
        }

        match &ws.id {
            Some(id) => self.import(state, summary, addr, id.clone()),
            None => {
                summary.not_found += 1;
                Ok(())
            }
        }
    }

    fn import_variables(
        &self,
        state: &mut StateSnapshot,
        ws: &Workspace,
        ws_id: &str,
        variables: &[VariableItem],
        summary: &mut ImportSummary,
    ) -> RunResult<()> {
        for item in variables.iter().filter(|item| item.workspace == ws.workspace) {
            let addr = address::variable(&item.workspace, &item.key);

            if state.contains(&addr) {
                summary.already_managed += 1;
                continue;
            }

            match self.lookup.find_variable(ws_id, &item.key)? {
                Some(remote) => {
                    let remote_id = format!("{}/{}/{}", self.organization, ws.name, remote.id);
                    self.import(state, summary, addr, remote_id)?;
                }
                None => summary.not_found += 1,
            }
        }

        Ok(())
    }

    fn import_team_access(
        &self,
        state: &mut StateSnapshot,
        ws: &Workspace,
        ws_id: &str,
        team_access: &[TeamAccessItem],
        summary: &mut ImportSummary,
    ) -> RunResult<()> {
        for item in team_access
            .iter()
            .filter(|item| item.workspace == ws.workspace)
        {
            let addr = address::team_access(&item.workspace, item.config.team_key());

            if state.contains(&addr) {
                summary.already_managed += 1;
                continue;
            }

            let team_id = match &item.config.team_id {
                Some(id) => Some(id.clone()),
                None => self
                    .lookup
                    .find_team(item.config.team_key())?
                    .map(|team| team.id),
            };

            let Some(team_id) = team_id else {
                summary.not_found += 1;
                continue;
            };

            match self.lookup.find_team_access(ws_id, &team_id)? {
                Some(remote) => {
                    let remote_id = format!("{}/{}/{}", self.organization, ws.name, remote.id);
                    self.import(state, summary, addr, remote_id)?;
                }
                None => summary.not_found += 1,
            }
        }

        Ok(())
    }

    fn import_run_triggers(
        &self,
        state: &mut StateSnapshot,
        ws: &Workspace,
        ws_id: &str,
        run_triggers: &[RunTriggerItem],
        workspaces: &[Workspace],
        summary: &mut ImportSummary,
    ) -> RunResult<()> {
        for item in run_triggers
            .iter()
            .filter(|item| item.workspace == ws.workspace)
        {
            let addr = address::run_trigger(&item.workspace, &item.source_id);

            if state.contains(&addr) {
                summary.already_managed += 1;
                continue;
            }

            let sourceable_id = if item.source_id.starts_with("ws-") {
                Some(item.source_id.clone())
            } else {
                workspaces
                    .iter()
                    .find(|other| other.workspace == item.source_id)
                    .and_then(|other| other.id.clone())
            };

            let Some(sourceable_id) = sourceable_id else {
                summary.not_found += 1;
                continue;
            };

            match self.lookup.find_run_trigger(ws_id, &sourceable_id)? {
                Some(remote) => self.import(state, summary, addr, remote.id)?,
                None => summary.not_found += 1,
            }
        }

        Ok(())
    }

    fn import(
        &self,
        state: &mut StateSnapshot,
        summary: &mut ImportSummary,
        addr: String,
        remote_id: String,
    ) -> RunResult<()> {
        self.tool.import(&addr, &remote_id)?;
        state.record(addr.clone());
        summary.imported.push(addr);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TeamAccessConfig;
    use crate::error::{RunError, RunResult};
    use crate::terraform::MockPlanningTool;
    use crate::tfe::{
        RemoteOauthClient, RemoteRunTrigger, RemoteTeam, RemoteTeamAccess, RemoteVariable,
        RemoteWorkspace,
    };
    use std::collections::HashMap;

    /// Remote lookup stub serving fixed entities
    #[derive(Default)]
    struct StubLookup {
        workspaces: HashMap<String, String>,
        variables: HashMap<(String, String), String>,
        teams: HashMap<String, String>,
        team_access: HashMap<(String, String), String>,
        run_triggers: HashMap<(String, String), String>,
    }

    impl RemoteLookup for StubLookup {
        fn find_workspace(&self, name: &str) -> RunResult<Option<RemoteWorkspace>> {
            Ok(self.workspaces.get(name).map(|id| RemoteWorkspace {
                id: id.clone(),
                name: name.to_string(),
            }))
        }

        fn find_variable(
            &self,
            workspace_id: &str,
            key: &str,
        ) -> RunResult<Option<RemoteVariable>> {
            Ok(self
                .variables
                .get(&(workspace_id.to_string(), key.to_string()))
                .map(|id| RemoteVariable {
                    id: id.clone(),
                    key: key.to_string(),
                }))
        }

        fn find_team(&self, name: &str) -> RunResult<Option<RemoteTeam>> {
            Ok(self.teams.get(name).map(|id| RemoteTeam {
                id: id.clone(),
                name: name.to_string(),
            }))
        }

        fn find_team_access(
            &self,
            workspace_id: &str,
            team_id: &str,
        ) -> RunResult<Option<RemoteTeamAccess>> {
            Ok(self
                .team_access
                .get(&(workspace_id.to_string(), team_id.to_string()))
                .map(|id| RemoteTeamAccess {
                    id: id.clone(),
                    team_id: team_id.to_string(),
                }))
        }

        fn find_run_trigger(
            &self,
            workspace_id: &str,
            sourceable_id: &str,
        ) -> RunResult<Option<RemoteRunTrigger>> {
            Ok(self
                .run_triggers
                .get(&(workspace_id.to_string(), sourceable_id.to_string()))
                .map(|id| RemoteRunTrigger {
                    id: id.clone(),
                    sourceable_id: sourceable_id.to_string(),
                }))
        }

        fn find_oauth_client(&self, _name: &str) -> RunResult<Option<RemoteOauthClient>> {
            Ok(None)
        }
    }

    fn variable_item(workspace: &str, key: &str) -> VariableItem {
        VariableItem {
            key: key.to_string(),
            value: "x".to_string(),
            description: None,
            category: "env".to_string(),
            sensitive: false,
            workspace: workspace.to_string(),
        }
    }

    fn team_item(workspace: &str, team_name: &str) -> TeamAccessItem {
        TeamAccessItem {
            config: TeamAccessConfig {
                team_name: Some(team_name.to_string()),
                team_id: None,
                access: Some("write".to_string()),
                permissions: None,
            },
            workspace: workspace.to_string(),
        }
    }

    #[test]
    fn test_imports_preexisting_resources_in_fixed_order() {
        let mut lookup = StubLookup::default();
        lookup.workspaces.insert("acme-app".to_string(), "ws-1".to_string());
        lookup
            .variables
            .insert(("ws-1".to_string(), "foo".to_string()), "var-1".to_string());
        lookup.teams.insert("devs".to_string(), "team-1".to_string());
        lookup.team_access.insert(
            ("ws-1".to_string(), "team-1".to_string()),
            "tws-1".to_string(),
        );
        lookup.run_triggers.insert(
            ("ws-1".to_string(), "ws-up".to_string()),
            "rt-1".to_string(),
        );

        let tool = MockPlanningTool::new(StateSnapshot::empty());
        let mut state = tool.show_state().unwrap();
        let mut workspaces = vec![Workspace::new("acme-app", "app")];

        let reconciler = Reconciler::new(&lookup, &tool, "acme-org");
        let summary = reconciler
            .reconcile(
                &mut state,
                &mut workspaces,
                &[variable_item("app", "foo")],
                &[team_item("app", "devs")],
                &[RunTriggerItem {
                    source_id: "ws-up".to_string(),
                    workspace: "app".to_string(),
                }],
            )
            .unwrap();

        assert_eq!(
            summary.imported,
            vec![
                "tfe_workspace.workspace[\"app\"]",
                "tfe_variable.app-foo",
                "tfe_team_access.teams[\"app-devs\"]",
                "tfe_run_trigger.trigger[\"app-ws-up\"]",
            ]
        );

        let imports = tool.imports.lock().unwrap();
        assert_eq!(imports[0].1, "ws-1");
        assert_eq!(imports[1].1, "acme-org/acme-app/var-1");
        assert_eq!(imports[2].1, "acme-org/acme-app/tws-1");
        assert_eq!(imports[3].1, "rt-1");
    }

    #[test]
    fn test_second_run_imports_nothing() {
        let mut lookup = StubLookup::default();
        lookup.workspaces.insert("acme-app".to_string(), "ws-1".to_string());
        lookup
            .variables
            .insert(("ws-1".to_string(), "foo".to_string()), "var-1".to_string());

        let tool = MockPlanningTool::new(StateSnapshot::empty());
        let reconciler = Reconciler::new(&lookup, &tool, "acme-org");

        for run in 0..2 {
            let mut state = tool.show_state().unwrap();
            let mut workspaces = vec![Workspace::new("acme-app", "app")];

            let summary = reconciler
                .reconcile(
                    &mut state,
                    &mut workspaces,
                    &[variable_item("app", "foo")],
                    &[],
                    &[],
                )
                .unwrap();

            if run == 0 {
                assert_eq!(summary.imported.len(), 2);
            } else {
                assert!(summary.imported.is_empty());
                assert_eq!(summary.already_managed, 2);
            }
        }

        assert_eq!(tool.import_count(), 2);
    }

    #[test]
    fn test_workspace_already_in_state_skips_import() {
        let mut lookup = StubLookup::default();
        lookup.workspaces.insert("ws".to_string(), "ws-1".to_string());

        let mut snapshot = StateSnapshot::empty();
        snapshot.record("tfe_workspace.workspace[\"ws\"]".to_string());
        let tool = MockPlanningTool::new(snapshot);

        let mut state = tool.show_state().unwrap();
        let mut workspaces = vec![Workspace::new("ws", "ws")];

        let summary = Reconciler::new(&lookup, &tool, "acme-org")
            .reconcile(&mut state, &mut workspaces, &[], &[], &[])
            .unwrap();

        assert_eq!(tool.import_count(), 0);
        assert_eq!(summary.already_managed, 1);
    }

    #[test]
    fn test_unresolved_workspace_skips_dependent_imports() {
        // Remote has no workspace at all: nothing is importable, nothing fails
        let lookup = StubLookup::default();
        let tool = MockPlanningTool::new(StateSnapshot::empty());

        let mut state = tool.show_state().unwrap();
        let mut workspaces = vec![Workspace::new("acme-app", "app")];

        let summary = Reconciler::new(&lookup, &tool, "acme-org")
            .reconcile(
                &mut state,
                &mut workspaces,
                &[variable_item("app", "foo")],
                &[team_item("app", "devs")],
                &[],
            )
            .unwrap();

        assert_eq!(tool.import_count(), 0);
        assert!(workspaces[0].id.is_none());
        // Only the workspace itself is counted; dependents were skipped
        assert_eq!(summary.not_found, 1);
    }

    #[test]
    fn test_not_found_remotely_proceeds_without_import() {
        let mut lookup = StubLookup::default();
        lookup.workspaces.insert("acme-app".to_string(), "ws-1".to_string());
        // No remote variable matching "foo"

        let tool = MockPlanningTool::new(StateSnapshot::empty());
        let mut state = tool.show_state().unwrap();
        let mut workspaces = vec![Workspace::new("acme-app", "app")];

        let summary = Reconciler::new(&lookup, &tool, "acme-org")
            .reconcile(
                &mut state,
                &mut workspaces,
                &[variable_item("app", "foo")],
                &[],
                &[],
            )
            .unwrap();

        assert_eq!(summary.imported, vec!["tfe_workspace.workspace[\"app\"]"]);
        assert_eq!(summary.not_found, 1);
    }

    #[test]
    fn test_import_failure_aborts_and_keeps_earlier_imports() {
        let mut lookup = StubLookup::default();
        lookup.workspaces.insert("acme-app".to_string(), "ws-1".to_string());
        lookup
            .variables
            .insert(("ws-1".to_string(), "foo".to_string()), "var-1".to_string());

        let mut tool = MockPlanningTool::new(StateSnapshot::empty());
        tool.fail_import_for = Some("tfe_variable.app-foo".to_string());

        let mut state = tool.show_state().unwrap();
        let mut workspaces = vec![Workspace::new("acme-app", "app")];

        let err = Reconciler::new(&lookup, &tool, "acme-org")
            .reconcile(
                &mut state,
                &mut workspaces,
                &[variable_item("app", "foo")],
                &[],
                &[],
            )
            .unwrap_err();

        assert!(matches!(err, RunError::Import { .. }));
        // The workspace import before the failure persisted
        assert_eq!(
            tool.imported_addresses(),
            vec!["tfe_workspace.workspace[\"app\"]"]
        );
    }

    #[test]
    fn test_cross_workspace_trigger_uses_resolved_source_id() {
        let mut lookup = StubLookup::default();
        lookup
            .workspaces
            .insert("acme-staging".to_string(), "ws-stg".to_string());
        lookup
            .workspaces
            .insert("acme-production".to_string(), "ws-prod".to_string());
        lookup.run_triggers.insert(
            ("ws-prod".to_string(), "ws-stg".to_string()),
            "rt-1".to_string(),
        );

        let tool = MockPlanningTool::new(StateSnapshot::empty());
        let mut state = tool.show_state().unwrap();
        let mut workspaces = vec![
            Workspace::new("acme-staging", "staging"),
            Workspace::new("acme-production", "production"),
        ];

        let summary = Reconciler::new(&lookup, &tool, "acme-org")
            .reconcile(
                &mut state,
                &mut workspaces,
                &[],
                &[],
                &[RunTriggerItem {
                    source_id: "staging".to_string(),
                    workspace: "production".to_string(),
                }],
            )
            .unwrap();

        assert!(summary
            .imported
            .contains(&"tfe_run_trigger.trigger[\"production-staging\"]".to_string()));
    }
}
