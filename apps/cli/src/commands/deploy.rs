//! Deploy command implementation.

use anyhow::Context;
use cml_clients::{CmlClient, MlflowClient};
use cml_pipeline::{
    DeployConfig, DeploySettings, DeploymentContext, DeploymentOutcome, DeploymentPipeline,
    EnvSettings, NullProgressSink, ProgressSink, ProjectPolicy, StdoutProgressSink,
};
use colored::Colorize;
use std::sync::Arc;
use tracing::info;

/// Overrides given on the command line.
#[derive(Debug, Default)]
pub struct DeployOptions {
    pub experiment: Option<String>,
    pub model_path: Option<String>,
    pub project_name: Option<String>,
    pub reuse_project: bool,
    pub skip_project_check: bool,
    pub json: bool,
}

impl DeployOptions {
    fn apply(&self, settings: &mut DeploySettings) {
        if let Some(experiment) = &self.experiment {
            settings.experiment_name.clone_from(experiment);
        }
        if let Some(path) = &self.model_path {
            settings.model_path.clone_from(path);
        }
        if let Some(name) = &self.project_name {
            settings.project_name.clone_from(name);
        }
        if self.reuse_project {
            settings.project_policy = ProjectPolicy::ReuseExisting;
        }
        if self.skip_project_check {
            settings.verify_project = false;
        }
    }
}

/// Execute the deploy command.
pub async fn execute(config: &DeployConfig, options: DeployOptions) -> anyhow::Result<()> {
    let mut settings = config.resolve().context("Invalid deployment configuration")?;
    options.apply(&mut settings);
    settings.validate()?;

    let env = EnvSettings::from_env()?;
    let platform = CmlClient::from_env(settings.timeout)
        .context("Failed to configure the CML API client")?;
    let tracker = MlflowClient::from_env(settings.timeout)
        .context("Failed to configure the MLflow tracking client")?;
    info!(workspace = %platform.base_url(), "Using CML workspace");

    let ctx = DeploymentContext::new(Arc::new(platform), Arc::new(tracker), env);
    let progress: Arc<dyn ProgressSink> =
        if options.json { Arc::new(NullProgressSink) } else { Arc::new(StdoutProgressSink) };
    let pipeline = DeploymentPipeline::new(ctx, settings).with_progress(progress);

    let outcome = pipeline.run().await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &DeploymentOutcome) {
    println!();
    println!("{}", "Deployment requested".bold().green());
    println!();
    println!("  {} {}", "Session:".dimmed(), outcome.session_id);
    println!("  {} {}", "Run:".dimmed(), outcome.run_id.cyan());
    if let Some(started) = outcome.run_started_at {
        println!("  {} {}", "Run started:".dimmed(), started);
    }
    println!("  {} {}", "Model name:".dimmed(), outcome.model_name.cyan());
    println!("  {} {}", "Registered model:".dimmed(), outcome.registered_model_id);
    println!("  {} {}", "Model version:".dimmed(), outcome.model_version_id);

    let project_note = if outcome.project_reused { " (reused)" } else { "" };
    println!("  {} {}{}", "Project:".dimmed(), outcome.project_id, project_note.yellow());
    println!("  {} {}", "Model:".dimmed(), outcome.model_entity_id);
    println!(
        "  {} {} {}",
        "Build:".dimmed(),
        outcome.build_id,
        outcome.build_status.as_deref().unwrap_or("").dimmed()
    );
    println!(
        "  {} {} {}",
        "Deployment:".dimmed(),
        outcome.deployment_id.green(),
        outcome.deployment_status.as_deref().unwrap_or("").dimmed()
    );
    println!();
    println!("  {}", "Build and rollout continue on the platform.".dimmed());
    println!("  {}", "Test the endpoint with the body from `cml-deploy sample-request`.".dimmed());
}
