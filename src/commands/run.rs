use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

use crate::config::RunConfig;
use crate::error::RunError;
use crate::import::Reconciler;
use crate::merge;
use crate::module::{address, Synthesizer};
use crate::output;
use crate::terraform::{PlanningTool, TerraformCli};
use crate::tfe::{ReqwestClient, TfeClient, TfeConfig};
use crate::workspace::Workspace;

const REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for the run command
pub struct RunOptions<'a> {
    pub config_path: &'a Path,
    pub out_dir: &'a Path,
    pub token: Option<&'a str>,
    pub apply: bool,
    pub import: bool,
    pub allow_destroy: bool,
}

/// Handles the 'run' command: synthesize, initialize the planning tool,
/// reconcile imports, plan, guard against destroys, conditionally apply
pub struct RunCommand;

impl RunCommand {
    pub fn execute(options: &RunOptions) -> Result<()> {
        let config = RunConfig::from_file(options.config_path)?;
        let mut workspaces = Workspace::build_all(&config.name, &config.workspaces);

        // Fan inputs out across the workspace set; validation failures stop
        // the run before any remote call
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

        let token = options
            .token
            .context("an API token is required (pass --token or set TFE_TOKEN)")?;
        let http = ReqwestClient::new(token, REMOTE_TIMEOUT)?;
        let client = TfeClient::new(http, TfeConfig::new(&config.host, &config.organization));

        output::section("Synthesize");

        let module = Synthesizer::new(
            &config,
            &workspaces,
            &variables,
            &team_access,
            &run_triggers,
            &notifications,
            Some(&client),
        )
        .synthesize()?;

        std::fs::create_dir_all(options.out_dir).with_context(|| {
            format!("Failed to create directory {}", options.out_dir.display())
        })?;

        let module_path = options.out_dir.join("main.tf.json");
        std::fs::write(&module_path, format!("{}\n", module.to_json()?))
            .with_context(|| format!("Failed to write {}", module_path.display()))?;

        output::success(&format!(
            "Wrote {} ({} workspaces, {} variables, {} team access rules, {} run triggers)",
            module_path.display(),
            workspaces.len(),
            variables.len(),
            team_access.len(),
            run_triggers.len()
        ));

        let terraform = TerraformCli::new(options.out_dir);

        if !terraform.check_installed() {
            anyhow::bail!("terraform is not installed or not available in PATH");
        }

        output::info("Running terraform init...");
        terraform.init()?;

        if options.import {
            output::section("Reconcile imports");

            let mut state = terraform.show_state()?;
            output::key_value("Resources in state", &state.len().to_string());

            let reconciler = Reconciler::new(&client, &terraform, &config.organization);
            let summary = reconciler.reconcile(
                &mut state,
                &mut workspaces,
                &variables,
                &team_access,
                &run_triggers,
            )?;

            for addr in &summary.imported {
                output::success(&format!("Imported {}", addr));
            }

            output::key_value("Imported", &summary.imported.len().to_string());
            output::key_value("Already managed", &summary.already_managed.to_string());
            output::key_value("Will be created", &summary.not_found.to_string());
        } else {
            output::warning("Skipping import reconciliation (--no-import)");
        }

        output::section("Plan");

        let plan = terraform.plan()?;
        let (add, change, destroy) = plan.summary();
        output::key_value(
            "Plan",
            &format!("{} to add, {} to change, {} to destroy", add, change, destroy),
        );

        if plan.will_destroy(address::WORKSPACE_TYPE) {
            for addr in plan.destroyed_addresses(address::WORKSPACE_TYPE) {
                output::warning(&format!("Plan destroys {}", addr));
            }

            if options.allow_destroy {
                output::warning("Plan destroys workspaces; continuing because --allow-destroy is set");
            } else {
                return Err(RunError::DestructivePlan {
                    resource_type: address::WORKSPACE_TYPE.to_string(),
                }
                .into());
            }
        }

        if !plan.has_changes() {
            output::info("No changes; workspaces match the configuration");
            return Ok(());
        }

        if options.apply {
            output::section("Apply");
            terraform.apply()?;
            output::success("Apply complete");
        } else {
            output::dimmed("Changes detected; re-run with --apply to apply them");
        }

        Ok(())
    }
}
