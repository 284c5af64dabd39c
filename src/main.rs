use anyhow::Result;
use clap::{Parser, Subcommand};

use angreal_mcp::{log_error, utils};

mod cmd;

use cmd::{CheckArgs, HostOptions, RunArgs, TreeArgs};

/// angreal-mcp - MCP server for angreal projects (see cmd/{serve,tree,check,run,shared}.rs)
///
/// Command layout:
///   angreal-mcp [serve]                              JSON-RPC over stdin/stdout (default)
///   angreal-mcp tree [--json] [--layout flat|nested] print the discovered command tree
///   angreal-mcp check [--json]                       project status report
///   angreal-mcp run "<group> <command>" [-- ARGS...] run one command
///
/// Global flags / env:
///   -v / -vv              Increase verbosity (logs go to stderr)
///   -q / --quiet          Errors only
///   --angreal CMD         Launcher (or ANGREAL_MCP_BIN), default "angreal"
///   -C / --project-dir    Project directory (or ANGREAL_MCP_PROJECT_DIR), default cwd
///   --tree-file FILE      JSON/YAML tree snapshot (or ANGREAL_MCP_TREE_FILE)
///
/// Examples:
///   angreal-mcp                                   (register this in an MCP client)
///   angreal-mcp --angreal "python -m angreal" tree --json --layout nested
///   angreal-mcp run "call-testing command-2" -- --parameter test-value
#[derive(Parser, Debug)]
#[command(
    name = "angreal-mcp",
    version,
    author,
    about = "angreal-mcp - expose an angreal project's commands as MCP tools",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    host: HostOptions,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve MCP over stdin/stdout (default)
    Serve,

    /// Print the discovered command tree
    Tree(TreeArgs),

    /// Check whether the project directory is an angreal project
    Check(CheckArgs),

    /// Run an angreal command
    Run(RunArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    let settings = match cli.host.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            log_error!("{e:#}");
            std::process::exit(2);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => cmd::execute_serve(settings),
        Commands::Tree(args) => cmd::execute_tree(settings, args),
        Commands::Check(args) => cmd::execute_check(settings, args),
        Commands::Run(args) => cmd::execute_run(settings, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use angreal_mcp::tools::TreeLayout;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["angreal-mcp", "-v"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "angreal-mcp",
            "tree",
            "--json",
            "--layout",
            "nested",
            "--angreal",
            "python -m angreal",
        ])
        .unwrap();
        assert_eq!(cli.host.launcher.as_deref(), Some("python -m angreal"));
        match cli.command {
            Some(Commands::Tree(args)) => {
                assert!(args.json);
                assert_eq!(args.layout, TreeLayout::Nested);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn run_forwards_everything_after_separator() {
        let cli = Cli::try_parse_from([
            "angreal-mcp",
            "run",
            "call-testing command-2",
            "--",
            "--parameter",
            "test-value",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.command, "call-testing command-2");
                assert_eq!(args.args, vec!["--parameter", "test-value"]);
                assert!(!args.json);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn run_requires_a_command() {
        assert!(Cli::try_parse_from(["angreal-mcp", "run"]).is_err());
    }
}
