/*!
shared.rs - settings resolution and server construction shared by every
subcommand.

Precedence for each host setting: flag > environment variable > default.

  --angreal      ANGREAL_MCP_BIN           "angreal"
  --project-dir  ANGREAL_MCP_PROJECT_DIR   current directory
  --tree-file    ANGREAL_MCP_TREE_FILE     (none: ask angreal for `tree --json`)
*/

use anyhow::{Context, Result, bail};
use clap::Args;
use std::path::PathBuf;

use angreal_mcp::host::{AngrealCli, DEFAULT_LAUNCHER, LauncherSpec, SnapshotSource};
use angreal_mcp::log_debug;
use angreal_mcp::mcp::McpServer;
use angreal_mcp::tools::ToolResult;
use angreal_mcp::tree::Discovery;
use angreal_mcp::utils::format::{Role, StyleOptions, box_header, color, emoji};

pub const ENV_LAUNCHER: &str = "ANGREAL_MCP_BIN";
pub const ENV_PROJECT_DIR: &str = "ANGREAL_MCP_PROJECT_DIR";
pub const ENV_TREE_FILE: &str = "ANGREAL_MCP_TREE_FILE";

/// Global host flags (usable before or after the subcommand).
#[derive(Args, Debug, Clone, Default)]
pub struct HostOptions {
    /// Command used to invoke angreal, split shell-style (e.g. "python -m angreal")
    #[arg(long = "angreal", global = true, value_name = "CMD")]
    pub launcher: Option<String>,

    /// Project directory commands run in (default: current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Read the command tree from a JSON/YAML file instead of `angreal tree --json`
    #[arg(long, global = true, value_name = "FILE")]
    pub tree_file: Option<PathBuf>,
}

/// Fully resolved host configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub launcher: LauncherSpec,
    pub project_dir: PathBuf,
    pub tree_file: Option<PathBuf>,
}

impl HostOptions {
    pub fn resolve(&self) -> Result<Settings> {
        self.resolve_with(|key| {
            std::env::var(key)
                .ok()
                .filter(|s| !s.trim().is_empty())
        })
    }

    /// `lookup` stands in for the process environment.
    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Settings> {
        let raw_launcher = self
            .launcher
            .clone()
            .or_else(|| lookup(ENV_LAUNCHER))
            .unwrap_or_else(|| DEFAULT_LAUNCHER.to_string());
        let launcher = LauncherSpec::parse(&raw_launcher)
            .with_context(|| format!("Invalid angreal command: '{raw_launcher}'"))?;

        let project_dir = match self
            .project_dir
            .clone()
            .or_else(|| lookup(ENV_PROJECT_DIR).map(PathBuf::from))
        {
            Some(dir) => {
                if !dir.is_dir() {
                    bail!("Project directory does not exist: {}", dir.display());
                }
                dir
            }
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };

        let tree_file = self
            .tree_file
            .clone()
            .or_else(|| lookup(ENV_TREE_FILE).map(PathBuf::from));

        log_debug!(
            "settings: launcher='{launcher}' project_dir={} tree_file={:?}",
            project_dir.display(),
            tree_file
        );
        Ok(Settings {
            launcher,
            project_dir,
            tree_file,
        })
    }
}

/// Current-thread runtime; the server handles one request at a time.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")
}

/// Discover once, then wrap the host in a dispatcher.
pub async fn build_server(settings: &Settings) -> McpServer<AngrealCli> {
    let host = AngrealCli::new(settings.launcher.clone(), settings.project_dir.clone());
    let discovery = match &settings.tree_file {
        Some(path) => Discovery::run(&SnapshotSource::new(path)).await,
        None => Discovery::run(&host).await,
    };
    McpServer::new(host, settings.project_dir.clone(), discovery)
}

/* ---- Output ---- */

/// Print a tool result: raw JSON, or a boxed header followed by the text.
pub fn print_tool_result(title: &str, result: &ToolResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let style = StyleOptions::detect();
    let (tag, role, status) = if result.is_error {
        ("error", Role::Error, "failed")
    } else {
        ("success", Role::Success, "ok")
    };
    let subtitle = match result.exit_code {
        Some(code) => format!("{status} • exit code {code}"),
        None => status.to_string(),
    };
    let heading = format!("{} {title}", emoji(tag, &style));
    println!("{}", box_header(heading.trim_start(), Some(subtitle), &style));

    let body = result.text();
    if result.is_error {
        eprintln!("{}", color(role, body, &style));
    } else {
        println!("{body}");
    }
    Ok(())
}
