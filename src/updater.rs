use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

pub const PACKAGE: &str = env!("CARGO_PKG_NAME");

/// External command that reinstalls the tool through its package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for UpdateCommand {
    fn default() -> Self {
        Self {
            program: "cargo".to_string(),
            args: vec!["install".to_string(), PACKAGE.to_string(), "--force".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    Failed { reason: String },
}

impl UpdateCommand {
    /// Runs the command with its output captured; only the exit status counts.
    pub async fn run(&self) -> UpdateOutcome {
        info!(program = %self.program, args = ?self.args, "running self-update");

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => UpdateOutcome::Updated,
            Ok(output) => {
                warn!(status = %output.status, "self-update failed");
                UpdateOutcome::Failed {
                    reason: format!("{} {}", self.program, output.status),
                }
            }
            Err(err) => {
                warn!(error = %err, "self-update could not start");
                UpdateOutcome::Failed {
                    reason: format!("could not run {}: {}", self.program, err),
                }
            }
        }
    }
}

pub fn manual_steps() -> [String; 2] {
    [
        format!("cargo uninstall {}", PACKAGE),
        format!("cargo install {}", PACKAGE),
    ]
}
