/*!
`run` subcommand: the `angreal_run` tool from the command line.

  angreal-mcp run "call-testing command-2" -- --parameter value

The command path is one (quoted) argument; everything after it is forwarded.
Use `--` before forwarded flags. A failing command's exit code becomes this
process's exit code.
*/

use anyhow::{Result, bail};
use clap::Args;
use serde_json::json;

use angreal_mcp::log_debug;
use angreal_mcp::tools::ToolKind;

use super::shared::{Settings, build_server, print_tool_result, runtime};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Print the raw tool result as JSON
    #[arg(long)]
    pub json: bool,

    /// Space separated command path, e.g. "call-testing command-1"
    #[arg(value_name = "COMMAND")]
    pub command: String,

    /// Arguments forwarded verbatim to the command
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

pub fn execute_run(settings: Settings, args: RunArgs) -> Result<()> {
    let rt = runtime()?;
    let arguments = json!({ "command": args.command, "args": args.args });
    let result = rt.block_on(async {
        let server = build_server(&settings).await;
        server.call_tool(ToolKind::Run.name(), Some(arguments)).await
    })?;

    print_tool_result(&args.command, &result, args.json)?;
    if !result.is_error {
        return Ok(());
    }
    match result.exit_code {
        Some(code) if code != 0 => {
            log_debug!("forwarding exit code {code}");
            std::process::exit(code);
        }
        _ => bail!("`{}` did not complete", args.command),
    }
}
