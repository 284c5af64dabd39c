/*!
run.rs - execution dispatcher behind `angreal_run`.

Flow:
  1. resolve `command` against the discovered tree (groups, then the command)
  2. length-check forwarded args (no other validation; angreal owns its flags)
  3. launch `<launcher> <group...> <command> <args...>` and wait
  4. map the captured output:
       exit 0      -> success, stdout (+ "Stderr:" section when non-empty)
       exit != 0   -> isError, exitCode, stderr (+ stdout when non-empty)
       signal      -> isError, no exitCode
       launch fail -> isError, launcher error chain

Output (human text embedded in content[0].text):
  "✓ Successfully executed call-testing command-1 with --option flag\n..."
*/

use serde::Deserialize;
use std::time::Instant;

use super::ToolResult;
use crate::host::{ProcessLauncher, ProcessOutput};
use crate::tree::Discovery;
use crate::{log_debug, log_info};

/// Longest single forwarded argument accepted, in characters.
pub const MAX_ARG_LEN: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct RunArgs {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// `angreal_run`: resolve, then forward to the launcher.
pub async fn angreal_run<L: ProcessLauncher>(
    launcher: &L,
    discovery: &Discovery,
    args: &RunArgs,
) -> ToolResult {
    let requested = args.command.trim();

    let tree = match discovery.tree() {
        Ok(tree) => tree,
        Err(reason) => {
            return ToolResult::failure(format!(
                "Cannot run '{requested}': angreal commands could not be discovered: {reason}"
            ));
        }
    };

    let leaf = match tree.resolve(requested) {
        Ok(leaf) => leaf,
        Err(e) => {
            return ToolResult::failure(format!(
                "Cannot run '{requested}': {e}\n\
                 Use the angreal_tree tool to list available commands."
            ));
        }
    };

    if let Some(too_long) = args.args.iter().find(|a| a.chars().count() > MAX_ARG_LEN) {
        return ToolResult::failure(format!(
            "Argument too long ({} characters, limit {MAX_ARG_LEN})",
            too_long.chars().count()
        ));
    }

    let path: Vec<String> = leaf
        .group_path
        .iter()
        .map(|g| g.to_string())
        .chain(std::iter::once(leaf.command.name.clone()))
        .collect();
    execute(launcher, &path, &args.args).await
}

/// Launch an already resolved command path and capture its output.
pub async fn execute<L: ProcessLauncher>(
    launcher: &L,
    command_path: &[String],
    args: &[String],
) -> ToolResult {
    let display = format!("{} {}", launcher.describe(), command_path.join(" "));
    let started = Instant::now();

    match launcher.run(command_path, args).await {
        Ok(output) => {
            log_info!(
                "`{display}` finished with {} in {} ms",
                output.status_label(),
                started.elapsed().as_millis()
            );
            from_output(&display, output)
        }
        Err(e) => {
            log_debug!("launch of `{display}` failed: {e:#}");
            ToolResult::failure(format!(
                "Failed to execute `{display}`: {e:#}\nIs angreal installed? (pip install angreal)"
            ))
        }
    }
}

fn from_output(display: &str, output: ProcessOutput) -> ToolResult {
    let stdout = output.stdout.trim_end();
    let stderr = output.stderr.trim_end();

    if output.success() {
        let text = match (stdout.is_empty(), stderr.is_empty()) {
            (true, true) => format!("`{display}` completed successfully (no output)"),
            (false, true) => stdout.to_string(),
            (true, false) => format!("Stderr:\n{stderr}"),
            (false, false) => format!("{stdout}\n\nStderr:\n{stderr}"),
        };
        return ToolResult::success(text).with_exit_code(output.exit_code);
    }

    let mut text = format!("Command `{display}` failed with {}", output.status_label());
    if !stderr.is_empty() {
        text.push_str("\n\nStderr:\n");
        text.push_str(stderr);
    }
    if !stdout.is_empty() {
        text.push_str("\n\nOutput:\n");
        text.push_str(stdout);
    }
    if let Some(hint) = failure_hint(&output) {
        text.push_str("\n\n");
        text.push_str(hint);
    }
    ToolResult::failure(text).with_exit_code(output.exit_code)
}

/// Shell exit 127 / "command not found" means the launcher itself is missing.
fn failure_hint(output: &ProcessOutput) -> Option<&'static str> {
    let stderr = output.stderr.as_str();
    if output.exit_code == Some(127) || stderr.contains("command not found") {
        return Some(
            "Hint: angreal does not appear to be installed. Install it with: pip install angreal",
        );
    }
    if stderr.contains("No angreal.toml") || stderr.contains("not an angreal project") {
        return Some(
            "Hint: this directory is not an angreal project. \
             Use the angreal_check tool to inspect it.",
        );
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::sample_tree;
    use anyhow::{Result, bail};
    use std::cell::RefCell;

    /// Stands in for angreal running the `call-testing` fixture tasks.
    #[derive(Default)]
    struct FakeLauncher {
        calls: RefCell<Vec<Vec<String>>>,
        missing: bool,
    }

    impl ProcessLauncher for FakeLauncher {
        fn describe(&self) -> String {
            "angreal".into()
        }

        async fn run(&self, command_path: &[String], args: &[String]) -> Result<ProcessOutput> {
            if self.missing {
                bail!("No such file or directory (os error 2)");
            }
            let mut argv = command_path.to_vec();
            argv.extend_from_slice(args);
            self.calls.borrow_mut().push(argv.clone());

            let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
            Ok(match argv.as_slice() {
                ["call-testing", "command-1", "--option"] => ProcessOutput {
                    stdout: "✓ Successfully executed call-testing command-1 with --option flag\n"
                        .into(),
                    stderr: String::new(),
                    exit_code: Some(0),
                },
                ["call-testing", "command-1"] => ProcessOutput {
                    stdout: String::new(),
                    stderr: "ERROR: command-1 requires --option flag\n".into(),
                    exit_code: Some(1),
                },
                ["check"] => ProcessOutput {
                    stdout: String::new(),
                    stderr: "warning: unused import\n".into(),
                    exit_code: Some(0),
                },
                ["call-testing", "command-2", "--parameter", "no-install"] => ProcessOutput {
                    stdout: String::new(),
                    stderr: "sh: angreal: command not found\n".into(),
                    exit_code: Some(127),
                },
                ["call-testing", "command-2", "--parameter", "outside"] => ProcessOutput {
                    stdout: String::new(),
                    stderr: "Error: No angreal.toml found in this directory\n".into(),
                    exit_code: Some(1),
                },
                ["test"] => ProcessOutput {
                    exit_code: None,
                    ..Default::default()
                },
                _ => ProcessOutput {
                    stdout: String::new(),
                    stderr: "error: unexpected argument\n".into(),
                    exit_code: Some(2),
                },
            })
        }
    }

    fn run_args(command: &str, args: &[&str]) -> RunArgs {
        RunArgs {
            command: command.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn forwards_args_verbatim() {
        let launcher = FakeLauncher::default();
        let discovery = Discovery::from(sample_tree());
        let result = angreal_run(
            &launcher,
            &discovery,
            &run_args("call-testing command-1", &["--option"]),
        )
        .await;
        assert!(!result.is_error);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.text().contains("Successfully executed"));
        assert_eq!(
            launcher.calls.borrow().as_slice(),
            &[vec!["call-testing", "command-1", "--option"]]
        );
    }

    #[tokio::test]
    async fn nonzero_exit_is_marked_and_carries_stderr() {
        let launcher = FakeLauncher::default();
        let discovery = Discovery::from(sample_tree());
        let result =
            angreal_run(&launcher, &discovery, &run_args("call-testing command-1", &[])).await;
        assert!(result.is_error);
        assert_eq!(result.exit_code, Some(1));
        assert!(result.text().contains("requires --option"));
        assert!(result.text().contains("exit code 1"));
    }

    #[tokio::test]
    async fn stderr_on_success_is_appended() {
        let launcher = FakeLauncher::default();
        let discovery = Discovery::from(sample_tree());
        let result = angreal_run(&launcher, &discovery, &run_args("check", &[])).await;
        assert!(!result.is_error);
        assert!(result.text().starts_with("Stderr:\nwarning"));
    }

    #[tokio::test]
    async fn signal_termination_is_a_failure_without_exit_code() {
        let launcher = FakeLauncher::default();
        let discovery = Discovery::from(sample_tree());
        let result = angreal_run(&launcher, &discovery, &run_args("test", &[])).await;
        assert!(result.is_error);
        assert_eq!(result.exit_code, None);
        assert!(result.text().contains("signal"));
    }

    #[tokio::test]
    async fn unknown_path_never_launches() {
        let launcher = FakeLauncher::default();
        let discovery = Discovery::from(sample_tree());
        for command in ["call-testing command-3", "nope command-1", "call-testing", ""] {
            let result = angreal_run(&launcher, &discovery, &run_args(command, &[])).await;
            assert!(result.is_error, "{command:?} should fail");
            assert!(result.exit_code.is_none());
        }
        assert!(launcher.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn oversized_argument_rejected() {
        let launcher = FakeLauncher::default();
        let discovery = Discovery::from(sample_tree());
        let huge = "x".repeat(MAX_ARG_LEN + 1);
        let result = angreal_run(
            &launcher,
            &discovery,
            &run_args("call-testing command-2", &["--parameter", &huge]),
        )
        .await;
        assert!(result.is_error);
        assert!(result.text().contains("too long"));
        assert!(launcher.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn failures_carry_install_and_project_hints() {
        let launcher = FakeLauncher::default();
        let discovery = Discovery::from(sample_tree());

        let missing = angreal_run(
            &launcher,
            &discovery,
            &run_args("call-testing command-2", &["--parameter", "no-install"]),
        )
        .await;
        assert!(missing.is_error);
        assert_eq!(missing.exit_code, Some(127));
        assert!(missing.text().contains("pip install angreal"));

        let outside = angreal_run(
            &launcher,
            &discovery,
            &run_args("call-testing command-2", &["--parameter", "outside"]),
        )
        .await;
        assert!(outside.is_error);
        assert!(outside.text().contains("not an angreal project"));
        assert!(!outside.text().contains("pip install"));

        let plain =
            angreal_run(&launcher, &discovery, &run_args("call-testing command-1", &[])).await;
        assert!(!plain.text().contains("Hint:"));
    }

    #[tokio::test]
    async fn launch_failure_is_reported() {
        let launcher = FakeLauncher {
            missing: true,
            ..Default::default()
        };
        let discovery = Discovery::from(sample_tree());
        let result = angreal_run(&launcher, &discovery, &run_args("check", &[])).await;
        assert!(result.is_error);
        assert!(result.text().contains("Failed to execute `angreal check`"));
    }

    #[tokio::test]
    async fn undiscovered_tree_fails_resolution() {
        let launcher = FakeLauncher::default();
        let discovery = Discovery::Unavailable("angreal not installed".into());
        let result = angreal_run(&launcher, &discovery, &run_args("check", &[])).await;
        assert!(result.is_error);
        assert!(result.text().contains("angreal not installed"));
    }
}
