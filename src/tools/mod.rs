/*!
Tool registry.

Tools (fixed order, as advertised by `tools/list`):
  angreal_check  - is this an angreal project? installed version, discovery status
  angreal_tree   - command tree as JSON (flat or nested) or an indented listing
  angreal_run    - resolve a command path and run it with forwarded arguments

Each tool returns a `ToolResult`; failures of the tool's own work are
`isError: true` results, never JSON-RPC errors.
*/

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

pub mod check;
pub mod run;
pub mod tree;

pub use check::angreal_check;
pub use run::{RunArgs, angreal_run};
pub use tree::{TreeArgs, TreeFormat, TreeLayout, angreal_tree};

/* ---- Registry ---- */

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ToolKind {
    Check,
    Tree,
    Run,
}

impl ToolKind {
    /// Registry order; `tools/list` reports tools in this order.
    pub const fn variants() -> &'static [ToolKind] {
        &[ToolKind::Check, ToolKind::Tree, ToolKind::Run]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Check => "angreal_check",
            ToolKind::Tree => "angreal_tree",
            ToolKind::Run => "angreal_run",
        }
    }

    /// Exact-match lookup; tool names are case sensitive on the wire.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::variants().iter().copied().find(|k| k.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::Check => {
                "Check whether the current directory is an angreal project and report its status. \
Use it first when unsure about the project type: it reports whether angreal is installed, \
whether a .angreal/ folder exists, and whether project commands could be discovered."
            }
            ToolKind::Tree => {
                "List the tasks and command groups available in this angreal project. \
Use it when the user asks what can be run, which tasks exist, or how the project's automation \
is organized. 'json' returns structured data (flat list by default, 'nested' layout on request); \
'human' returns an indented listing."
            }
            ToolKind::Run => {
                "Run an angreal command by its path, e.g. command='call-testing command-1', \
forwarding 'args' (flags and positionals) to it unchanged. Returns the command's output; \
a failing command is reported with isError=true, its exit code and stderr."
            }
        }
    }

    pub fn input_schema(&self) -> Value {
        match self {
            ToolKind::Check => json!({
                "type": "object",
                "properties": {}
            }),
            ToolKind::Tree => json!({
                "type": "object",
                "properties": {
                    "format": {
                        "type": "string",
                        "enum": ["human", "json"],
                        "default": "human",
                        "description": "Output format - 'json' for structured data, 'human' for a readable tree"
                    },
                    "layout": {
                        "type": "string",
                        "enum": ["flat", "nested"],
                        "default": "flat",
                        "description": "JSON shape - 'flat' command list (each with its group) or 'nested' group tree"
                    }
                }
            }),
            ToolKind::Run => json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "Space separated command path, e.g. 'call-testing command-1'"
                    },
                    "args": {
                        "type": "array",
                        "items": { "type": "string" },
                        "default": [],
                        "description": "Arguments forwarded verbatim, e.g. ['--parameter', 'value']"
                    }
                },
                "required": ["command"]
            }),
        }
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// All tool descriptors in registry order.
pub fn registry() -> Vec<ToolDescriptor> {
    ToolKind::variants().iter().map(ToolKind::descriptor).collect()
}

/* ---- Results ---- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Content::Text { text } => text,
        }
    }
}

/// `{content: [...], isError, exitCode?}`; `isError` is always serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<Content>,
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl ToolResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: false,
            exit_code: None,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: true,
            exit_code: None,
        }
    }

    pub fn with_exit_code(mut self, exit_code: Option<i32>) -> Self {
        self.exit_code = exit_code;
        self
    }

    /// All text blocks joined by newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(Content::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
