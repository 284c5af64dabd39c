use anyhow::Result;
use serde::Deserialize;

use super::ToolResult;
use crate::tree::{CommandTree, Discovery, render_human};
use crate::utils::format::StyleOptions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TreeFormat {
    Json,
    #[default]
    Human,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TreeLayout {
    #[default]
    Flat,
    Nested,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreeArgs {
    #[serde(default)]
    pub format: TreeFormat,
    #[serde(default)]
    pub layout: TreeLayout,
}

/// `angreal_tree`: the discovered tree as JSON or as a plain indented listing.
pub fn angreal_tree(discovery: &Discovery, args: &TreeArgs) -> ToolResult {
    let tree = match discovery.tree() {
        Ok(tree) => tree,
        Err(reason) => {
            return ToolResult::failure(format!(
                "Could not discover angreal commands: {reason}\n\
                 Use the angreal_check tool to inspect the project state."
            ));
        }
    };

    match args.format {
        TreeFormat::Human => ToolResult::success(render_human(tree, &StyleOptions::plain())),
        TreeFormat::Json => match tree_json(tree, args.layout) {
            Ok(text) => ToolResult::success(text),
            Err(e) => ToolResult::failure(format!("Failed to serialize command tree: {e:#}")),
        },
    }
}

pub fn tree_json(tree: &CommandTree, layout: TreeLayout) -> Result<String> {
    let text = match layout {
        TreeLayout::Flat => serde_json::to_string_pretty(&tree.to_flat())?,
        TreeLayout::Nested => serde_json::to_string_pretty(&tree.to_nested())?,
    };
    Ok(text)
}
