use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use super::plan::Plan;
use super::state::StateSnapshot;
use crate::error::{RunError, RunResult};

const PLAN_FILE: &str = "tfcw.tfplan";

/// Capability interface over the external planning tool.
///
/// `import` mutates the external state store and callers must keep import
/// calls strictly sequential: the store is a single mutable record with no
/// internal locking guaranteed here.
pub trait PlanningTool: Send + Sync {
    /// Initialize the working directory
    fn init(&self) -> RunResult<()>;

    /// Current resource inventory of the state store
    fn show_state(&self) -> RunResult<StateSnapshot>;

    /// Bind a resource address to a remote identifier in the state store
    fn import(&self, address: &str, remote_id: &str) -> RunResult<()>;

    /// Compute an execution plan
    fn plan(&self) -> RunResult<Plan>;

    /// Apply the previously computed plan
    fn apply(&self) -> RunResult<()>;
}

/// Real planning tool shelling out to the terraform binary
pub struct TerraformCli {
    binary: String,
    working_dir: PathBuf,
}

impl TerraformCli {
    pub fn new(working_dir: &Path) -> Self {
        Self {
            binary: "terraform".to_string(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    pub fn with_binary(working_dir: &Path, binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    /// Check whether the terraform binary is available
    pub fn check_installed(&self) -> bool {
        Command::new(&self.binary)
            .arg("-version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    fn run(&self, args: &[&str]) -> RunResult<Output> {
        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|err| RunError::Executor {
                command: format!("{} {}", self.binary, args.join(" ")),
                message: err.to_string(),
                exit_code: None,
            })?;

        if !output.status.success() {
            return Err(RunError::Executor {
                command: format!("{} {}", self.binary, args.join(" ")),
                message: String::from_utf8_lossy(&output.stderr).to_string(),
                exit_code: output.status.code(),
            });
        }

        Ok(output)
    }
}

impl PlanningTool for TerraformCli {
    fn init(&self) -> RunResult<()> {
        self.run(&["init", "-input=false", "-no-color"])?;
        Ok(())
    }

    fn show_state(&self) -> RunResult<StateSnapshot> {
        let output = self.run(&["show", "-json"])?;
        StateSnapshot::from_show_json(&String::from_utf8_lossy(&output.stdout))
    }

    fn import(&self, address: &str, remote_id: &str) -> RunResult<()> {
        self.run(&["import", "-input=false", "-no-color", address, remote_id])
            .map_err(|err| RunError::Import {
                address: address.to_string(),
                message: err.to_string(),
            })?;

        Ok(())
    }

    fn plan(&self) -> RunResult<Plan> {
        self.run(&[
            "plan",
            "-input=false",
            "-no-color",
            &format!("-out={}", PLAN_FILE),
        ])?;

        let output = self.run(&["show", "-json", PLAN_FILE])?;
        Plan::from_json(&String::from_utf8_lossy(&output.stdout))
    }

    fn apply(&self) -> RunResult<()> {
        self.run(&["apply", "-input=false", "-no-color", PLAN_FILE])?;
        Ok(())
    }
}

/// Mock planning tool for testing: serves a canned snapshot and plan and
/// records every import call
#[cfg(test)]
pub struct MockPlanningTool {
    pub snapshot: std::sync::Mutex<StateSnapshot>,
    pub imports: std::sync::Mutex<Vec<(String, String)>>,
    pub fail_import_for: Option<String>,
}

#[cfg(test)]
impl MockPlanningTool {
    pub fn new(snapshot: StateSnapshot) -> Self {
        Self {
            snapshot: std::sync::Mutex::new(snapshot),
            imports: std::sync::Mutex::new(Vec::new()),
            fail_import_for: None,
        }
    }

    pub fn import_count(&self) -> usize {
        self.imports.lock().unwrap().len()
    }

    pub fn imported_addresses(&self) -> Vec<String> {
        self.imports
            .lock()
            .unwrap()
            .iter()
            .map(|(address, _)| address.clone())
            .collect()
    }
}

#[cfg(test)]
impl PlanningTool for MockPlanningTool {
    fn init(&self) -> RunResult<()> {
        Ok(())
    }

    fn show_state(&self) -> RunResult<StateSnapshot> {
        Ok(self.snapshot.lock().unwrap().clone())
    }

    fn import(&self, address: &str, remote_id: &str) -> RunResult<()> {
        if self.fail_import_for.as_deref() == Some(address) {
            return Err(RunError::Import {
                address: address.to_string(),
                message: "simulated import failure".to_string(),
            });
        }

        self.imports
            .lock()
            .unwrap()
            .push((address.to_string(), remote_id.to_string()));
        self.snapshot.lock().unwrap().record(address.to_string());

        Ok(())
    }

    fn plan(&self) -> RunResult<Plan> {
        Ok(Plan::default())
    }

    fn apply(&self) -> RunResult<()> {
        Ok(())
    }
}
