/*!
wire.rs - the two JSON shapes of the command tree.

Flat (current):
{
  "commands": [
    { "name": "command-1", "about": "...", "group": "call-testing",
      "path": "call-testing command-1", "arguments": [ ... ] },
    { "name": "check", "about": "...", "group": null, "path": "check", "arguments": [] }
  ]
}

Nested (older):
{
  "children": {
    "call-testing": { "type": "group", "name": "call-testing", "about": "...",
                      "children": { "command-1": { "type": "command", ... } } },
    "check": { "type": "command", "name": "check", "about": "...", "arguments": [] }
  }
}

Both are produced from one `CommandTree`; `CommandTree::from_document`
accepts either one (nested children may also be given as an array, and
`type` may be omitted when `children` tells groups apart).
*/

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::{Argument, Command, CommandTree, Group, TreeBuilder};

/* ---- Flat projection ---- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatTree {
    pub commands: Vec<FlatCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatCommand {
    pub name: String,
    pub about: String,
    /// Space-separated group path (`"docs site"`), `null` for top-level commands.
    pub group: Option<String>,
    pub path: String,
    pub arguments: Vec<Argument>,
}

/* ---- Nested projection ---- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedTree {
    pub children: BTreeMap<String, TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    Group {
        name: String,
        about: String,
        children: BTreeMap<String, TreeNode>,
    },
    Command {
        name: String,
        about: String,
        arguments: Vec<Argument>,
    },
}

impl TreeNode {
    /// Names of every command below (and including) this node.
    pub fn leaf_names(&self) -> Vec<&str> {
        match self {
            TreeNode::Command { name, .. } => vec![name.as_str()],
            TreeNode::Group { children, .. } => {
                children.values().flat_map(TreeNode::leaf_names).collect()
            }
        }
    }
}

impl NestedTree {
    pub fn leaf_names(&self) -> Vec<&str> {
        self.children
            .values()
            .flat_map(TreeNode::leaf_names)
            .collect()
    }
}

fn nested_children(group: &Group) -> BTreeMap<String, TreeNode> {
    let mut children = BTreeMap::new();
    for sub in &group.groups {
        children.insert(
            sub.name.clone(),
            TreeNode::Group {
                name: sub.name.clone(),
                about: sub.about.clone(),
                children: nested_children(sub),
            },
        );
    }
    for command in &group.commands {
        children.insert(
            command.name.clone(),
            TreeNode::Command {
                name: command.name.clone(),
                about: command.about.clone(),
                arguments: command.arguments.clone(),
            },
        );
    }
    children
}

impl CommandTree {
    pub fn to_flat(&self) -> FlatTree {
        let commands = self
            .leaves()
            .into_iter()
            .map(|leaf| FlatCommand {
                name: leaf.command.name.clone(),
                about: leaf.command.about.clone(),
                group: leaf.group(),
                path: leaf.path(),
                arguments: leaf.command.arguments.clone(),
            })
            .collect();
        FlatTree { commands }
    }

    pub fn to_nested(&self) -> NestedTree {
        NestedTree {
            children: nested_children(&self.root),
        }
    }

    /// Build a tree from a registry document in either wire shape.
    ///
    /// Also accepts a bare array of flat command entries.
    pub fn from_document(doc: &Value) -> Result<(Self, usize)> {
        let mut builder = TreeBuilder::new();
        match doc {
            Value::Array(entries) => ingest_flat(&mut builder, entries)?,
            Value::Object(obj) => {
                if let Some(children) = obj.get("children") {
                    ingest_children(&mut builder, &[], children)?;
                } else if let Some(commands) = obj.get("commands") {
                    let entries = commands
                        .as_array()
                        .context("`commands` must be an array")?;
                    ingest_flat(&mut builder, entries)?;
                } else {
                    bail!("unrecognized command tree document: expected `children` or `commands`");
                }
            }
            _ => bail!("command tree document must be a JSON object or array"),
        }
        let duplicates = builder.duplicates();
        Ok((builder.build(), duplicates))
    }
}

/* ---- Ingestion ---- */

fn ingest_children(builder: &mut TreeBuilder, scope: &[String], children: &Value) -> Result<()> {
    let nodes: Vec<(Option<&str>, &Value)> = match children {
        Value::Object(map) => map.iter().map(|(k, v)| (Some(k.as_str()), v)).collect(),
        Value::Array(items) => items.iter().map(|v| (None, v)).collect(),
        Value::Null => Vec::new(),
        _ => bail!("`children` must be an object or array"),
    };

    for (key, node) in nodes {
        let obj = node
            .as_object()
            .with_context(|| format!("tree node under '{}' is not an object", scope.join(" ")))?;
        let name = str_field(obj, "name")
            .or(key)
            .filter(|n| !n.trim().is_empty())
            .with_context(|| format!("unnamed tree node under '{}'", scope.join(" ")))?;

        if is_group_node(obj) {
            let mut path = scope.to_vec();
            path.push(name.to_string());
            builder.group(&path, str_field(obj, "about").unwrap_or(""))?;
            if let Some(grandchildren) = obj.get("children") {
                ingest_children(builder, &path, grandchildren)?;
            }
        } else {
            builder.command(scope, command_from_object(name, obj)?)?;
        }
    }
    Ok(())
}

fn is_group_node(obj: &Map<String, Value>) -> bool {
    match str_field(obj, "type") {
        Some(kind) => kind.eq_ignore_ascii_case("group"),
        None => obj.contains_key("children"),
    }
}

fn ingest_flat(builder: &mut TreeBuilder, entries: &[Value]) -> Result<()> {
    for entry in entries {
        let obj = entry
            .as_object()
            .context("flat command entry is not an object")?;
        let name = str_field(obj, "name")
            .filter(|n| !n.trim().is_empty())
            .context("flat command entry without a name")?;

        // `path` carries the full chain; `group` is the space-separated group path.
        let group_path: Vec<String> = match str_field(obj, "path") {
            Some(path) => {
                let mut parts: Vec<String> = path.split_whitespace().map(str::to_string).collect();
                if parts.last().map(String::as_str) == Some(name) {
                    parts.pop();
                }
                parts
            }
            None => str_field(obj, "group")
                .map(|g| g.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        };

        builder.command(&group_path, command_from_object(name, obj)?)?;
    }
    Ok(())
}

fn command_from_object(name: &str, obj: &Map<String, Value>) -> Result<Command> {
    let mut command = Command::new(name, str_field(obj, "about").unwrap_or(""));
    let declared = obj
        .get("arguments")
        .or_else(|| obj.get("args"))
        .and_then(Value::as_array);
    for raw in declared.into_iter().flatten() {
        let arg = raw
            .as_object()
            .with_context(|| format!("argument of '{name}' is not an object"))?;
        let arg_name = str_field(arg, "name")
            .with_context(|| format!("argument of '{name}' has no name"))?;
        command.arguments.push(Argument {
            name: arg_name.to_string(),
            short: str_field(arg, "short").map(str::to_string),
            long: str_field(arg, "long").map(str::to_string),
            takes_value: bool_field(arg, "takes_value"),
            is_flag: bool_field(arg, "is_flag"),
            required: bool_field(arg, "required"),
            help: str_field(arg, "help").unwrap_or("").to_string(),
        });
    }
    Ok(command)
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn bool_field(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::sample_tree;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn flat_names(tree: &CommandTree) -> BTreeSet<String> {
        tree.to_flat().commands.into_iter().map(|c| c.name).collect()
    }

    fn nested_names(tree: &CommandTree) -> BTreeSet<String> {
        tree.to_nested()
            .leaf_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn flat_entries_carry_their_group() {
        let flat = sample_tree().to_flat();
        let c1 = flat.commands.iter().find(|c| c.name == "command-1").unwrap();
        assert_eq!(c1.group.as_deref(), Some("call-testing"));
        assert_eq!(c1.path, "call-testing command-1");
        let check = flat.commands.iter().find(|c| c.name == "check").unwrap();
        assert_eq!(check.group, None);
    }

    #[test]
    fn flat_serializes_null_group() {
        let v = serde_json::to_value(sample_tree().to_flat()).unwrap();
        let check = v["commands"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["name"] == "check")
            .unwrap();
        assert!(check["group"].is_null());
    }

    #[test]
    fn nested_nodes_are_tagged() {
        let v = serde_json::to_value(sample_tree().to_nested()).unwrap();
        assert_eq!(v["children"]["call-testing"]["type"], "group");
        assert_eq!(
            v["children"]["call-testing"]["children"]["command-2"]["type"],
            "command"
        );
        assert_eq!(v["children"]["check"]["type"], "command");
    }

    #[test]
    fn flat_and_nested_list_the_same_commands() {
        let tree = sample_tree();
        assert_eq!(flat_names(&tree), nested_names(&tree));

        let mut b = TreeBuilder::new();
        b.command(&["a", "b", "c"], Command::new("deep", "")).unwrap();
        b.command(&["a"], Command::new("shallow", "")).unwrap();
        b.command::<&str>(&[], Command::new("top", "")).unwrap();
        let tree = b.build();
        assert_eq!(flat_names(&tree), nested_names(&tree));
        assert_eq!(tree.to_flat().commands.len(), 3);
    }

    #[test]
    fn nested_document_reingests_to_same_tree() {
        let tree = sample_tree();
        let doc = serde_json::to_value(tree.to_nested()).unwrap();
        let (back, dups) = CommandTree::from_document(&doc).unwrap();
        assert_eq!(dups, 0);
        assert_eq!(flat_names(&back), flat_names(&tree));
        let c1 = back.resolve("call-testing command-1").unwrap();
        assert_eq!(c1.command.arguments[0].long.as_deref(), Some("option"));
        assert!(c1.command.arguments[0].is_flag);
    }

    #[test]
    fn flat_document_with_duplicates_is_merged() {
        let doc = json!({
            "commands": [
                {"name": "command-1", "about": "old", "group": "call-testing", "arguments": []},
                {"name": "command-1", "about": "new", "group": "call-testing", "arguments": []},
                {"name": "check", "about": "Check code", "group": null}
            ]
        });
        let (tree, dups) = CommandTree::from_document(&doc).unwrap();
        assert_eq!(dups, 1);
        let flat = tree.to_flat();
        assert_eq!(flat.commands.len(), 2);
        assert_eq!(flat.commands.iter().filter(|c| c.name == "command-1").count(), 1);
        assert_eq!(tree.resolve("call-testing command-1").unwrap().command.about, "new");
    }

    #[test]
    fn flat_path_restores_nested_groups() {
        let doc = json!([
            {"name": "serve", "group": "site", "path": "docs site serve"}
        ]);
        let (tree, _) = CommandTree::from_document(&doc).unwrap();
        assert!(tree.resolve("docs site serve").is_ok());
    }

    #[test]
    fn same_named_subgroups_keep_distinct_flat_keys() {
        let mut b = TreeBuilder::new();
        b.command(&["a", "sub"], Command::new("cmd", "in a")).unwrap();
        b.command(&["b", "sub"], Command::new("cmd", "in b")).unwrap();
        let tree = b.build();

        let flat = tree.to_flat();
        let keys: BTreeSet<(Option<String>, String)> = flat
            .commands
            .iter()
            .map(|c| (c.group.clone(), c.name.clone()))
            .collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&(Some("a sub".to_string()), "cmd".to_string())));

        let doc = serde_json::to_value(&flat).unwrap();
        let (back, dups) = CommandTree::from_document(&doc).unwrap();
        assert_eq!(dups, 0);
        assert_eq!(back.resolve("b sub cmd").unwrap().command.about, "in b");
    }

    #[test]
    fn flat_group_without_path_keeps_full_chain() {
        let mut b = TreeBuilder::new();
        b.command(&["docs", "site"], Command::new("serve", "")).unwrap();
        let mut entry = serde_json::to_value(b.build().to_flat()).unwrap();
        entry["commands"][0].as_object_mut().unwrap().remove("path");

        let (tree, _) = CommandTree::from_document(&entry).unwrap();
        let leaf = tree.resolve("docs site serve").unwrap();
        assert_eq!(leaf.group().as_deref(), Some("docs site"));
    }

    #[test]
    fn untyped_nested_array_children() {
        let doc = json!({
            "children": [
                {"name": "docs", "about": "Docs", "children": [
                    {"name": "build", "about": "Build docs", "args": [
                        {"name": "open", "long": "open", "is_flag": true, "takes_value": true}
                    ]}
                ]}
            ]
        });
        let (tree, _) = CommandTree::from_document(&doc).unwrap();
        assert_eq!(tree.groups()[0].about, "Docs");
        let leaf = tree.resolve("docs build").unwrap();
        assert!(!leaf.command.arguments[0].takes_value);
    }

    #[test]
    fn unknown_document_shape_is_rejected() {
        let err = CommandTree::from_document(&json!({"tasks": []})).unwrap_err();
        assert!(err.to_string().contains("unrecognized"));
        assert!(CommandTree::from_document(&json!("tree")).is_err());
    }
}
