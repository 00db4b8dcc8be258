//! Show-config command implementation.

use cml_clients::{cml, mlflow};
use cml_pipeline::context::{PROJECT_ID_ENV, PROJECT_OWNER_ENV};
use cml_pipeline::{DeployConfig, DeploySettings};
use colored::Colorize;
use serde_json::json;
use std::env;

/// Environment variables the deploy command reads, and whether each is secret.
const ENV_VARS: [(&str, bool); 6] = [
    (cml::API_URL_ENV, false),
    (cml::API_KEY_ENV, true),
    (mlflow::TRACKING_URI_ENV, false),
    (mlflow::TRACKING_TOKEN_ENV, true),
    (PROJECT_ID_ENV, false),
    (PROJECT_OWNER_ENV, false),
];

/// Execute the show-config command.
pub fn execute(config: &DeployConfig, json_output: bool) -> anyhow::Result<()> {
    let settings = config.resolve()?;
    let env_status = read_env();

    if json_output {
        let env: serde_json::Map<String, serde_json::Value> = env_status
            .iter()
            .map(|(name, value)| ((*name).to_string(), json!(value)))
            .collect();
        let output = json!({ "settings": settings, "environment": env });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_human(&settings, &env_status);
    }
    Ok(())
}

/// Secret values are reported as `"set"`, unset ones as `None`.
#[allow(clippy::disallowed_methods)] // reports the process environment as-is
fn read_env() -> Vec<(&'static str, Option<String>)> {
    ENV_VARS
        .iter()
        .map(|(name, secret)| {
            let value = env::var(name).ok().filter(|v| !v.is_empty());
            let shown = if *secret { value.map(|_| "set".to_string()) } else { value };
            (*name, shown)
        })
        .collect()
}

fn print_human(settings: &DeploySettings, env_status: &[(&'static str, Option<String>)]) {
    println!("{}", "cml-deploy configuration".bold().cyan());
    println!();

    println!("{}", "Experiment:".bold());
    println!("  name:          {}", settings.experiment_name);
    println!("  run selection: {:?}", settings.run_selection);
    println!();

    println!("{}", "Model:".bold());
    println!("  path:          {}", settings.model_path);
    println!("  name prefix:   {}", settings.model_name_prefix);
    println!("  description:   {}", settings.model_description);
    println!();

    println!("{}", "Project:".bold());
    println!("  name:          {}", settings.project_name);
    println!("  git url:       {}", settings.project_git_url);
    println!("  policy:        {:?}", settings.project_policy);
    println!("  verify:        {}", settings.verify_project);
    println!();

    println!("{}", "Client:".bold());
    println!("  timeout:       {}s", settings.timeout.as_secs());
    println!();

    println!("{}", "Environment:".bold());
    for (name, value) in env_status {
        match value {
            Some(v) => println!("  {:<22} {}", name, v.green()),
            None => println!("  {:<22} {}", name, "not set".yellow()),
        }
    }
}
