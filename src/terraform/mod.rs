pub mod cli;
pub mod plan;
pub mod state;

pub use cli::{PlanningTool, TerraformCli};
pub use plan::Plan;
pub use state::StateSnapshot;

#[cfg(test)]
pub use cli::MockPlanningTool;
