/*!
`tree` subcommand: print the discovered command tree without starting the
server.

  angreal-mcp tree                   colored listing (NO_COLOR / NO_EMOJI honored)
  angreal-mcp tree --json            flat JSON, same document as angreal_tree
  angreal-mcp tree --json --layout nested
*/

use anyhow::{Result, anyhow};
use clap::Args;

use angreal_mcp::tools::{TreeLayout, tree::tree_json};
use angreal_mcp::tree::render_human;
use angreal_mcp::utils::format::{StyleOptions, box_header, emoji};

use super::shared::{Settings, build_server, runtime};

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Output JSON instead of the indented listing
    #[arg(long)]
    pub json: bool,

    /// JSON shape (ignored without --json)
    #[arg(long, value_enum, default_value_t = TreeLayout::Flat)]
    pub layout: TreeLayout,
}

pub fn execute_tree(settings: Settings, args: TreeArgs) -> Result<()> {
    let rt = runtime()?;
    let server = rt.block_on(build_server(&settings));
    let tree = server
        .discovery()
        .tree()
        .map_err(|reason| anyhow!("Could not discover angreal commands: {reason}"))?;

    if args.json {
        println!("{}", tree_json(tree, args.layout)?);
        return Ok(());
    }

    let style = StyleOptions::detect();
    let title = format!("{} angreal-mcp tree", emoji("tree", &style));
    println!(
        "{}",
        box_header(
            title.trim_start(),
            Some(format!("project={}", settings.project_dir.display())),
            &style
        )
    );
    println!("{}", render_human(tree, &style));
    Ok(())
}
