/*!
Subcommand dispatch.

  src/cmd/
    mod.rs     (this file: module declarations + re-exports)
    shared.rs  (HostOptions / Settings resolution, runtime, build_server, output)
    serve.rs   (MCP server on stdio; the default when no subcommand is given)
    tree.rs    (print the discovered command tree)
    check.rs   (project check report)
    run.rs     (run one angreal command)

Each subcommand module exposes one `execute_*` function returning
`anyhow::Result<()>`; argument structs derive `clap::Args`.
*/

pub mod check;
pub mod run;
pub mod serve;
pub mod shared;
pub mod tree;

pub use check::{CheckArgs, execute_check};
pub use run::{RunArgs, execute_run};
pub use serve::execute_serve;
pub use shared::HostOptions;
pub use tree::{TreeArgs, execute_tree};
