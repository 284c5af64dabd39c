//! Command tree: the immutable model of angreal's groups, commands and arguments.
//!
//! A `CommandTree` is produced once by `TreeBuilder` (fed from a registry
//! document, see `wire`) and is only read afterwards. The flat and nested
//! wire shapes are both projections of this single tree.
//!
//! Submodules:
//!   discovery - one-shot load from a `CommandSource`
//!   wire      - projections (flat / nested) + ingestion of either shape
//!   render    - indented human listing

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod discovery;
pub mod render;
pub mod wire;

pub use discovery::Discovery;
pub use render::render_human;
pub use wire::{FlatCommand, FlatTree, NestedTree, TreeNode};

/* ---- Model ---- */

/// One declared argument of a command. Positional arguments have neither
/// `short` nor `long`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    #[serde(default)]
    pub takes_value: bool,
    #[serde(default)]
    pub is_flag: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub help: String,
}

impl Argument {
    pub fn is_positional(&self) -> bool {
        self.short.is_none() && self.long.is_none()
    }

    /// A flag never takes a value.
    fn normalized(mut self) -> Self {
        if self.is_flag {
            self.takes_value = false;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub about: String,
    pub arguments: Vec<Argument>,
}

impl Command {
    pub fn new(name: impl Into<String>, about: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: about.into(),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Group {
    pub name: String,
    pub about: String,
    pub groups: Vec<Group>,
    pub commands: Vec<Command>,
}

impl Group {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    fn command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    fn child_names(&self) -> Vec<String> {
        self.groups
            .iter()
            .map(|g| g.name.clone())
            .chain(self.commands.iter().map(|c| c.name.clone()))
            .collect()
    }
}

/// Read-only snapshot of every group and command known to the host CLI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandTree {
    root: Group,
}

/// A leaf command together with the names of the groups enclosing it.
#[derive(Debug, Clone)]
pub struct Leaf<'a> {
    pub group_path: Vec<&'a str>,
    pub command: &'a Command,
}

impl Leaf<'_> {
    /// Space-separated path of the enclosing groups, `None` for top-level commands.
    ///
    /// Same-named subgroups under different parents stay distinguishable.
    pub fn group(&self) -> Option<String> {
        if self.group_path.is_empty() {
            None
        } else {
            Some(self.group_path.join(" "))
        }
    }

    /// Full space-separated invocation path, e.g. `call-testing command-1`.
    pub fn path(&self) -> String {
        let mut parts = self.group_path.clone();
        parts.push(&self.command.name);
        parts.join(" ")
    }
}

impl CommandTree {
    pub fn groups(&self) -> &[Group] {
        &self.root.groups
    }

    pub fn commands(&self) -> &[Command] {
        &self.root.commands
    }

    pub fn is_empty(&self) -> bool {
        self.root.groups.is_empty() && self.root.commands.is_empty()
    }

    /// Every leaf command, depth-first: a scope's own commands before its subgroups.
    pub fn leaves(&self) -> Vec<Leaf<'_>> {
        fn walk<'a>(group: &'a Group, path: &mut Vec<&'a str>, out: &mut Vec<Leaf<'a>>) {
            for command in &group.commands {
                out.push(Leaf {
                    group_path: path.clone(),
                    command,
                });
            }
            for sub in &group.groups {
                path.push(&sub.name);
                walk(sub, path, out);
                path.pop();
            }
        }

        let mut out = Vec::new();
        walk(&self.root, &mut Vec::new(), &mut out);
        out
    }

    pub fn command_count(&self) -> usize {
        self.leaves().len()
    }

    /// Resolve a whitespace separated path (`"call-testing command-1"`) to a command.
    ///
    /// Every segment but the last must name a group; the last must name a command
    /// inside the group reached so far.
    pub fn resolve(&self, path: &str) -> std::result::Result<Leaf<'_>, ResolveError> {
        let segments: Vec<&str> = path.split_whitespace().collect();
        let Some((last, groups)) = segments.split_last() else {
            return Err(ResolveError::EmptyPath);
        };

        let mut scope = &self.root;
        let mut group_path: Vec<&str> = Vec::with_capacity(groups.len());
        for segment in groups {
            match scope.group(segment) {
                Some(next) => {
                    scope = next;
                    group_path.push(&next.name);
                }
                None => {
                    return Err(ResolveError::UnknownGroup {
                        segment: segment.to_string(),
                        scope: scope_label(&group_path),
                        available: scope.child_names(),
                    });
                }
            }
        }

        if let Some(command) = scope.command(last) {
            return Ok(Leaf {
                group_path,
                command,
            });
        }
        if let Some(group) = scope.group(last) {
            return Err(ResolveError::IncompletePath {
                group: last.to_string(),
                available: group.child_names(),
            });
        }
        Err(ResolveError::UnknownCommand {
            name: last.to_string(),
            scope: scope_label(&group_path),
            available: scope.child_names(),
        })
    }
}

fn scope_label(group_path: &[&str]) -> String {
    if group_path.is_empty() {
        "top level".to_string()
    } else {
        format!("group '{}'", group_path.join(" "))
    }
}

/* ---- Resolution errors ---- */

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    EmptyPath,
    UnknownGroup {
        segment: String,
        scope: String,
        available: Vec<String>,
    },
    UnknownCommand {
        name: String,
        scope: String,
        available: Vec<String>,
    },
    IncompletePath {
        group: String,
        available: Vec<String>,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::EmptyPath => write!(f, "no command given"),
            ResolveError::UnknownGroup {
                segment,
                scope,
                available,
            } => write!(
                f,
                "unknown group '{segment}' at {scope} (available: {})",
                list_or_none(available)
            ),
            ResolveError::UnknownCommand {
                name,
                scope,
                available,
            } => write!(
                f,
                "unknown command '{name}' at {scope} (available: {})",
                list_or_none(available)
            ),
            ResolveError::IncompletePath { group, available } => write!(
                f,
                "'{group}' is a command group, not a command; choose one of: {}",
                list_or_none(available)
            ),
        }
    }
}

impl std::error::Error for ResolveError {}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/* ---- Builder ---- */

/// Accumulates registrations and produces the immutable `CommandTree`.
///
/// Duplicate registrations are merged: a command registered twice under the
/// same group path keeps its first position and takes the last definition.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    root: Group,
    duplicates: usize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of redundant command registrations merged so far.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Register (or re-register) a group. A non-empty `about` replaces the stored one.
    pub fn group<S: AsRef<str>>(&mut self, path: &[S], about: &str) -> Result<()> {
        if path.is_empty() {
            bail!("group path cannot be empty");
        }
        let group = self.ensure_group(path)?;
        if !about.trim().is_empty() {
            group.about = about.to_string();
        }
        Ok(())
    }

    /// Register a command under `group_path` (empty for top level).
    pub fn command<S: AsRef<str>>(&mut self, group_path: &[S], command: Command) -> Result<()> {
        if command.name.trim().is_empty() {
            bail!("command name cannot be empty");
        }
        let command = Command {
            arguments: dedup_arguments(command.arguments),
            ..command
        };

        let group = self.ensure_group(group_path)?;
        if group.group(&command.name).is_some() {
            bail!(
                "command '{}' collides with a group of the same name",
                command.name
            );
        }
        let replaced = match group.commands.iter_mut().find(|c| c.name == command.name) {
            Some(existing) => {
                *existing = command;
                true
            }
            None => {
                group.commands.push(command);
                false
            }
        };
        if replaced {
            self.duplicates += 1;
        }
        Ok(())
    }

    pub fn build(self) -> CommandTree {
        CommandTree { root: self.root }
    }

    fn ensure_group<S: AsRef<str>>(&mut self, path: &[S]) -> Result<&mut Group> {
        let mut current = &mut self.root;
        for segment in path {
            let segment = segment.as_ref();
            if segment.trim().is_empty() {
                bail!("group name cannot be empty");
            }
            if current.command(segment).is_some() {
                bail!("group '{segment}' collides with a command of the same name");
            }
            let idx = match current.groups.iter().position(|g| g.name == segment) {
                Some(idx) => idx,
                None => {
                    current.groups.push(Group::new(segment));
                    current.groups.len() - 1
                }
            };
            current = &mut current.groups[idx];
        }
        Ok(current)
    }
}

/// Argument names are unique within a command; the last declaration wins.
fn dedup_arguments(arguments: Vec<Argument>) -> Vec<Argument> {
    let mut out: Vec<Argument> = Vec::with_capacity(arguments.len());
    for argument in arguments.into_iter().map(Argument::normalized) {
        match out.iter_mut().find(|a| a.name == argument.name) {
            Some(existing) => *existing = argument,
            None => out.push(argument),
        }
    }
    out
}
