//! cml-deploy - promote an MLflow experiment run to a CML model deployment
//!
//! Runs inside a CML workbench session: the workspace URL, API key and
//! project identity come from the environment the session provides.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{deploy, sample, show_config};

/// cml-deploy - register, build and deploy the latest experiment run
#[derive(Parser, Debug)]
#[command(
    name = "cml-deploy",
    author,
    version,
    about = "Promote an MLflow experiment run to a CML model deployment",
    long_about = "cml-deploy registers the latest run of an MLflow experiment in the CML model registry,\ncreates the target project, then creates, builds and deploys the model."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Configuration file, applied after ~/.cml-deploy/config.toml and ./.cml-deploy.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the deployment pipeline
    ///
    /// Resolves the experiment run, registers the model, creates the project,
    /// checks it is visible to the owner, then creates, builds and deploys the model.
    Deploy {
        /// Experiment name (overrides experiment.name)
        #[arg(long)]
        experiment: Option<String>,

        /// Artifact path of the model inside the run (overrides model.path)
        #[arg(long)]
        model_path: Option<String>,

        /// Target project name (overrides project.name)
        #[arg(long)]
        project_name: Option<String>,

        /// Reuse an existing project with the same name instead of creating one
        #[arg(long)]
        reuse_project: bool,

        /// Skip checking the project against the owner's project listing
        #[arg(long)]
        skip_project_check: bool,

        /// Output the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a sample inference request for the deployed model
    SampleRequest {
        /// Print on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Show the resolved configuration and environment
    ShowConfig {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so JSON output on stdout stays parseable.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Deploy { experiment, model_path, project_name, reuse_project, skip_project_check, json } => {
            let config = config::load_config(args.config.as_deref())?;
            let options = deploy::DeployOptions {
                experiment,
                model_path,
                project_name,
                reuse_project,
                skip_project_check,
                json,
            };
            deploy::execute(&config, options).await?;
        }
        Command::SampleRequest { compact } => {
            sample::execute(compact)?;
        }
        Command::ShowConfig { json } => {
            let config = config::load_config(args.config.as_deref())?;
            show_config::execute(&config, json)?;
        }
    }

    Ok(())
}
