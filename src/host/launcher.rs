//! Launcher command line parsing.
//!
//! parse -> LauncherSpec { program, args }
//! The launcher is what gets spawned for every angreal invocation, e.g.
//! `angreal` or `python -m angreal`. Shell-style quoting is honored.

use anyhow::{Context, Result, bail};
use shell_words::split as shell_split;
use std::fmt;

pub const DEFAULT_LAUNCHER: &str = "angreal";

/// A parsed launcher command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherSpec {
    pub program: String,
    /// Fixed arguments placed before the command path.
    pub args: Vec<String>,
}

impl LauncherSpec {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            bail!("Launcher command is empty");
        }
        let parts =
            shell_split(trimmed).context("Failed to parse launcher command (shell splitting)")?;
        let Some((program, args)) = parts.split_first() else {
            bail!("No tokens produced when parsing launcher command");
        };
        if program.is_empty() {
            bail!("Empty program name in launcher command");
        }
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Default for LauncherSpec {
    fn default() -> Self {
        Self {
            program: DEFAULT_LAUNCHER.to_string(),
            args: Vec::new(),
        }
    }
}

impl fmt::Display for LauncherSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.args.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_program() {
        let spec = LauncherSpec::parse("angreal").unwrap();
        assert_eq!(spec.program, "angreal");
        assert!(spec.args.is_empty());
        assert_eq!(spec, LauncherSpec::default());
    }

    #[test]
    fn parse_with_prefix_args() {
        let spec = LauncherSpec::parse("python -m angreal").unwrap();
        assert_eq!(spec.program, "python");
        assert_eq!(spec.args, vec!["-m", "angreal"]);
        assert_eq!(spec.to_string(), "python -m angreal");
    }

    #[test]
    fn parse_quoted_program_path() {
        let spec = LauncherSpec::parse(r#""/opt/my tools/angreal" --verbose"#).unwrap();
        assert_eq!(spec.program, "/opt/my tools/angreal");
        assert_eq!(spec.args, vec!["--verbose"]);
    }

    #[test]
    fn empty_launcher_rejected() {
        let err = LauncherSpec::parse("   ").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn unbalanced_quotes_rejected() {
        assert!(LauncherSpec::parse(r#"angreal "oops"#).is_err());
    }
}
