mod commands;
mod config;
mod error;
mod import;
mod merge;
mod module;
mod output;
mod terraform;
mod tfe;
mod workspace;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{RenderCommand, RunCommand, RunOptions};
use std::path::Path;

#[derive(Parser)]
#[command(name = "tfcw")]
#[command(about = "Declarative Terraform Cloud workspace manager", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the module document and print it
    Render {
        /// Path to the YAML run configuration
        #[arg(short, long)]
        config: String,

        /// Also write main.tf.json into this directory
        #[arg(short, long)]
        out: Option<String>,

        /// API token (only needed to resolve OAuth client names)
        #[arg(long, env = "TFE_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Synthesize, import pre-existing remote resources, plan and
    /// optionally apply
    Run {
        /// Path to the YAML run configuration
        #[arg(short, long)]
        config: String,

        /// Working directory for the planning tool
        #[arg(short, long, default_value = ".")]
        out: String,

        /// API token
        #[arg(long, env = "TFE_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Apply the computed plan
        #[arg(long)]
        apply: bool,

        /// Skip import reconciliation
        #[arg(long)]
        no_import: bool,

        /// Permit plans that destroy workspaces
        #[arg(long)]
        allow_destroy: bool,
    },
}

fn main() {
    if let Err(err) = run() {
        output::error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { config, out, token } => {
            RenderCommand::execute(
                Path::new(&config),
                out.as_deref().map(Path::new),
                token.as_deref(),
            )?;
        }
        Commands::Run {
            config,
            out,
            token,
            apply,
            no_import,
            allow_destroy,
        } => {
            RunCommand::execute(&RunOptions {
                config_path: Path::new(&config),
                out_dir: Path::new(&out),
                token: token.as_deref(),
                apply,
                import: !no_import,
                allow_destroy,
            })?;
        }
    }

    Ok(())
}
