use anyhow::{Result, bail};
use clap::Args;

use angreal_mcp::tools::ToolKind;

use super::shared::{Settings, build_server, print_tool_result, runtime};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Print the raw tool result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Same report as the `angreal_check` tool; fails when the directory is not a project.
pub fn execute_check(settings: Settings, args: CheckArgs) -> Result<()> {
    let rt = runtime()?;
    let result = rt.block_on(async {
        let server = build_server(&settings).await;
        server.call_tool(ToolKind::Check.name(), None).await
    })?;

    print_tool_result("angreal project check", &result, args.json)?;
    if result.is_error {
        bail!(
            "{} is not an angreal project",
            settings.project_dir.display()
        );
    }
    Ok(())
}
