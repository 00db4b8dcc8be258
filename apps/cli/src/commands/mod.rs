//! Command implementations for cml-deploy.

pub mod deploy;
pub mod sample;
pub mod show_config;
