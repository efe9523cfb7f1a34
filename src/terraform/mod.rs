//! Terraform integration
//!
//! The provisioning tool is a black box with two operations, `init` and
//! `apply`, run in the working directory.

pub mod template;

use crate::config::WorkspaceConfig;
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info};

pub use template::{extract_template, validate_template};

/// Provisioning tool handle
#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn init(&self) -> AppResult<()>;
    async fn apply(&self) -> AppResult<()>;
}

/// Runs the terraform binary
#[derive(Debug, Clone)]
pub struct TerraformCli {
    exec_path: PathBuf,
    working_dir: PathBuf,
}

impl TerraformCli {
    pub fn new(exec_path: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            exec_path: exec_path.into(),
            working_dir: working_dir.into(),
        }
    }

    pub fn from_workspace(workspace: &WorkspaceConfig) -> Self {
        Self::new(&workspace.terraform_path, &workspace.working_dir)
    }

    async fn run(&self, args: &[&str]) -> AppResult<()> {
        debug!("Running {} {}", self.exec_path.display(), args.join(" "));

        let status = Command::new(&self.exec_path)
            .args(args)
            .current_dir(&self.working_dir)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| AppError::Provisioning(format!("failed to run {}: {}", self.exec_path.display(), e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(AppError::Provisioning(format!("terraform {} exited with {}", args[0], status)))
        }
    }
}

#[async_trait]
impl Provisioner for TerraformCli {
    async fn init(&self) -> AppResult<()> {
        info!("Running terraform init in {}", self.working_dir.display());
        self.run(&["init", "-input=false"]).await
    }

    async fn apply(&self) -> AppResult<()> {
        info!("Running terraform apply in {}", self.working_dir.display());
        self.run(&["apply", "-auto-approve", "-input=false"]).await
    }
}
