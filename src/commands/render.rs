use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

use crate::config::RunConfig;
use crate::merge;
use crate::module::Synthesizer;
use crate::output;
use crate::tfe::{RemoteLookup, ReqwestClient, TfeClient, TfeConfig};
use crate::workspace::Workspace;

/// Handles the 'render' command: synthesize the module document and print
/// it, without touching the planning tool or the state store
pub struct RenderCommand;

impl RenderCommand {
    pub fn execute(config_path: &Path, out_dir: Option<&Path>, token: Option<&str>) -> Result<()> {
        let config = RunConfig::from_file(config_path)?;
        let workspaces = Workspace::build_all(&config.name, &config.workspaces);

        let variables = merge::merge_variables(
            &config.variables,
            &config.workspace_variables,
            &workspaces,
        )?;
        let team_access = merge::merge_team_access(&config.team_access, &workspaces)?;
        let run_triggers = merge::merge_run_triggers(
            &config.run_triggers,
            &config.workspace_run_triggers,
            &workspaces,
        )?;
        let notifications = merge::merge_notifications(&config.notifications, &workspaces);

        // A client is only needed when synthesis has to resolve an OAuth
        // client name; rendering stays offline otherwise
        let client = match token {
            Some(token) => Some(TfeClient::new(
                ReqwestClient::new(token, Duration::from_secs(30))?,
                TfeConfig::new(&config.host, &config.organization),
            )),
            None => None,
        };
        let lookup = client.as_ref().map(|client| client as &dyn RemoteLookup);

        let module = Synthesizer::new(
            &config,
            &workspaces,
            &variables,
            &team_access,
            &run_triggers,
            &notifications,
            lookup,
        )
        .synthesize()?;

        let json = module.to_json()?;
        println!("{}", json);

        if let Some(dir) = out_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;

            let path = dir.join("main.tf.json");
            std::fs::write(&path, format!("{}\n", json))
                .with_context(|| format!("Failed to write {}", path.display()))?;

            output::success(&format!("Wrote {}", path.display()));
        }

        Ok(())
    }
}
