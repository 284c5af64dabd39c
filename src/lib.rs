//! angreal-mcp: expose an angreal project's command tree as MCP tools over stdio.
//!
//!   tree   - canonical command tree, flat / nested projections, human rendering
//!   host   - collaborators (project validator, command source, process launcher)
//!   tools  - angreal_check / angreal_tree / angreal_run
//!   mcp    - JSON-RPC envelope, method dispatch, line transport
//!   utils  - logging macros and terminal styling

pub mod host;
pub mod mcp;
pub mod tools;
pub mod tree;
pub mod utils;
