use anyhow::Result;
use tokio::io::BufReader;

use angreal_mcp::log_info;
use angreal_mcp::mcp::serve;

use super::shared::{Settings, build_server, runtime};

/// Run the MCP server on stdin/stdout until the client closes input.
///
/// stdout carries protocol traffic only; all diagnostics go to stderr.
pub fn execute_serve(settings: Settings) -> Result<()> {
    let rt = runtime()?;
    rt.block_on(async {
        let server = build_server(&settings).await;
        log_info!(
            "angreal-mcp {} serving {} (launcher '{}')",
            env!("CARGO_PKG_VERSION"),
            settings.project_dir.display(),
            settings.launcher
        );

        let stdin = BufReader::new(tokio::io::stdin());
        serve(&server, stdin, tokio::io::stdout()).await?;
        Ok(())
    })
}
