use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{CommandSource, LauncherSpec, ProcessLauncher, ProcessOutput, ProjectValidator};
use crate::{log_debug, log_trace};

/// The real angreal CLI, spawned in `project_dir`.
#[derive(Debug, Clone)]
pub struct AngrealCli {
    launcher: LauncherSpec,
    project_dir: PathBuf,
}

impl AngrealCli {
    pub fn new(launcher: LauncherSpec, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            launcher,
            project_dir: project_dir.into(),
        }
    }
}

impl ProjectValidator for AngrealCli {
    fn is_valid_project(&self, cwd: &Path) -> bool {
        cwd.join(".angreal").is_dir()
    }
}

impl ProcessLauncher for AngrealCli {
    fn describe(&self) -> String {
        self.launcher.to_string()
    }

    async fn run(&self, command_path: &[String], args: &[String]) -> Result<ProcessOutput> {
        log_debug!(
            "Executing: {} {} {}",
            self.launcher,
            command_path.join(" "),
            args.join(" ")
        );

        // stdin is the JSON-RPC channel; the child must never read from it.
        let output = Command::new(&self.launcher.program)
            .args(&self.launcher.args)
            .args(command_path)
            .args(args)
            .current_dir(&self.project_dir)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to launch '{}'", self.launcher))?;

        let captured = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };
        log_trace!(
            "exit={:?} stdout={}B stderr={}B",
            captured.exit_code,
            captured.stdout.len(),
            captured.stderr.len()
        );
        Ok(captured)
    }
}

impl CommandSource for AngrealCli {
    fn describe(&self) -> String {
        format!("`{} tree --json`", self.launcher)
    }

    async fn load_tree_document(&self) -> Result<Value> {
        let output = self.run(&["tree".to_string()], &["--json".to_string()]).await?;
        if !output.success() {
            let stderr = output.stderr.trim();
            if stderr.contains("No angreal.toml") || stderr.contains("not an angreal project") {
                bail!("not in an angreal project ({})", self.project_dir.display());
            }
            bail!(
                "`{} tree --json` exited with {}: {}",
                self.launcher,
                output.status_label(),
                stderr
            );
        }
        serde_json::from_str(output.stdout.trim())
            .context("`angreal tree --json` did not print valid JSON")
    }
}
