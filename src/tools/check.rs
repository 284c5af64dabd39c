use std::path::Path;

use super::ToolResult;
use crate::host::{ProcessLauncher, ProjectValidator};
use crate::tree::Discovery;

/// `angreal_check`: installation, project folder, discovery status and cwd.
///
/// The result is a failure when `project_dir` is not an angreal project.
pub async fn angreal_check<H>(host: &H, project_dir: &Path, discovery: &Discovery) -> ToolResult
where
    H: ProcessLauncher + ProjectValidator,
{
    let mut lines: Vec<String> = Vec::new();

    match host.run(&["--version".to_string()], &[]).await {
        Ok(output) if output.success() => {
            lines.push(format!("✓ Angreal is installed: {}", output.stdout.trim()));
        }
        Ok(output) => {
            lines.push(format!(
                "⚠ `{} --version` failed with {}: {}",
                ProcessLauncher::describe(host),
                output.status_label(),
                output.stderr.trim()
            ));
        }
        Err(e) => {
            lines.push(format!("✗ Angreal is not available: {e:#}"));
            lines.push("  Install angreal first: pip install angreal".to_string());
        }
    }

    let valid = host.is_valid_project(project_dir);
    if valid {
        lines.push("✓ Found .angreal/ directory - this is an angreal project".to_string());
    } else {
        lines.push("✗ No .angreal/ directory found - this is not an angreal project".to_string());
        lines.push("  To create an angreal project: angreal init <template>".to_string());
    }

    match discovery {
        Discovery::Ready(tree) if tree.is_empty() => {
            lines.push("⚠ Project has no commands defined".to_string());
            lines.push("  Add tasks in the .angreal/ directory".to_string());
        }
        Discovery::Ready(tree) => {
            lines.push(format!(
                "✓ Project is initialized with {} available command(s)",
                tree.command_count()
            ));
            lines.push("  Use the angreal_tree tool to see them".to_string());
        }
        Discovery::Unavailable(reason) => {
            lines.push(format!("⚠ Could not discover project commands: {reason}"));
        }
    }

    lines.push(format!("\nCurrent directory: {}", project_dir.display()));

    let text = lines.join("\n");
    if valid {
        ToolResult::success(text)
    } else {
        ToolResult::failure(text)
    }
}
