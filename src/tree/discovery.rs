//! One-shot command discovery at startup.
//!
//! The registry source is read exactly once. A failure is kept (not retried)
//! so tools can report it while the rest of the server stays usable.

use crate::host::CommandSource;
use crate::{log_debug, log_error, log_info};

use super::CommandTree;

#[derive(Debug, Clone)]
pub enum Discovery {
    Ready(CommandTree),
    Unavailable(String),
}

impl Discovery {
    pub async fn run<S: CommandSource>(source: &S) -> Self {
        let label = source.describe();
        log_debug!("Discovering commands via {label}");

        let document = match source.load_tree_document().await {
            Ok(doc) => doc,
            Err(e) => {
                log_error!("Command discovery via {label} failed: {e:#}");
                return Discovery::Unavailable(format!("{e:#}"));
            }
        };

        match CommandTree::from_document(&document) {
            Ok((tree, duplicates)) => {
                if duplicates > 0 {
                    log_debug!("Merged {duplicates} duplicate command registration(s)");
                }
                log_info!(
                    "Discovered {} command(s) in {} top-level group(s)",
                    tree.command_count(),
                    tree.groups().len()
                );
                Discovery::Ready(tree)
            }
            Err(e) => {
                log_error!("Invalid command tree from {label}: {e:#}");
                Discovery::Unavailable(format!("invalid command tree from {label}: {e:#}"))
            }
        }
    }

    pub fn tree(&self) -> Result<&CommandTree, &str> {
        match self {
            Discovery::Ready(tree) => Ok(tree),
            Discovery::Unavailable(reason) => Err(reason.as_str()),
        }
    }
}

impl From<CommandTree> for Discovery {
    fn from(tree: CommandTree) -> Self {
        Discovery::Ready(tree)
    }
}
