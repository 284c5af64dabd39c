//! Collaborators the server consumes from the host CLI.
//!
//!   ProjectValidator - is this directory an angreal project?
//!   CommandSource    - registry document describing groups / commands / arguments
//!   ProcessLauncher  - run `<launcher> <command path...> <args...>` and capture output
//!
//! `AngrealCli` implements all three against a real angreal install;
//! `SnapshotSource` reads a saved tree document instead of asking angreal.

#![allow(async_fn_in_trait)]

use anyhow::Result;
use serde_json::Value;
use std::path::Path;

mod angreal;
mod launcher;
mod snapshot;

pub use angreal::AngrealCli;
pub use launcher::{DEFAULT_LAUNCHER, LauncherSpec};
pub use snapshot::SnapshotSource;

/// Captured result of one child process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// `exit code N`, or a note that a signal ended the process.
    pub fn status_label(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {code}"),
            None => "termination by signal".to_string(),
        }
    }
}

pub trait ProjectValidator {
    fn is_valid_project(&self, cwd: &Path) -> bool;
}

pub trait CommandSource {
    /// Human label used in logs and error messages.
    fn describe(&self) -> String;

    async fn load_tree_document(&self) -> Result<Value>;
}

pub trait ProcessLauncher {
    /// Human label for the launcher, e.g. `angreal`.
    fn describe(&self) -> String;

    /// Arguments are passed through untouched; no shell is involved.
    async fn run(&self, command_path: &[String], args: &[String]) -> Result<ProcessOutput>;
}
