//! Indented, human-readable listing of a `CommandTree`.
//!
//! Every command name is printed verbatim so callers can grep the output.

use super::{Argument, Command, CommandTree, Group};
use crate::utils::format::{Role, StyleOptions, color, emoji};

const INDENT: &str = "  ";

pub fn render_human(tree: &CommandTree, style: &StyleOptions) -> String {
    if tree.is_empty() {
        return "No commands found in this angreal project.".to_string();
    }

    let mut out = Vec::new();
    out.push(format!(
        "{}{} ({} commands)",
        prefixed(emoji("tree", style)),
        color(Role::Accent, "angreal commands", style),
        tree.command_count()
    ));
    out.push(String::new());

    for command in tree.commands() {
        render_command(command, 0, style, &mut out);
    }
    for group in tree.groups() {
        render_group(group, 0, style, &mut out);
    }
    out.join("\n")
}

fn render_group(group: &Group, depth: usize, style: &StyleOptions, out: &mut Vec<String>) {
    let pad = INDENT.repeat(depth);
    let name = color(Role::Primary, format!("{}/", group.name), style);
    if group.about.is_empty() {
        out.push(format!("{pad}{}{name}", prefixed(emoji("group", style))));
    } else {
        out.push(format!(
            "{pad}{}{name}  {}",
            prefixed(emoji("group", style)),
            color(Role::Dim, &group.about, style)
        ));
    }
    for command in &group.commands {
        render_command(command, depth + 1, style, out);
    }
    for sub in &group.groups {
        render_group(sub, depth + 1, style, out);
    }
}

fn render_command(
    command: &Command,
    depth: usize,
    style: &StyleOptions,
    out: &mut Vec<String>,
) {
    let pad = INDENT.repeat(depth);
    let name = color(Role::Success, &command.name, style);
    if command.about.is_empty() {
        out.push(format!("{pad}{name}"));
    } else {
        out.push(format!("{pad}{name}  {}", command.about));
    }

    let arg_pad = INDENT.repeat(depth + 2);
    for argument in &command.arguments {
        let mut line = format!("{arg_pad}{}", spelling(argument));
        if !argument.help.is_empty() {
            line.push_str("  ");
            line.push_str(&color(Role::Dim, &argument.help, style));
        }
        if argument.required && !argument.is_positional() {
            line.push_str(&color(Role::Warning, " (required)", style));
        }
        out.push(line);
    }
}

/// `-o, --option <OPTION>` for named arguments, `<NAME>` / `[NAME]` for positionals.
fn spelling(argument: &Argument) -> String {
    let value = argument.name.to_ascii_uppercase().replace('-', "_");
    if argument.is_positional() {
        return if argument.required {
            format!("<{value}>")
        } else {
            format!("[{value}]")
        };
    }

    let mut parts = Vec::new();
    if let Some(short) = &argument.short {
        parts.push(format!("-{short}"));
    }
    if let Some(long) = &argument.long {
        parts.push(format!("--{long}"));
    }
    let mut s = parts.join(", ");
    if argument.takes_value {
        s.push_str(&format!(" <{value}>"));
    }
    s
}

fn prefixed(icon: &str) -> String {
    if icon.is_empty() {
        String::new()
    } else {
        format!("{icon} ")
    }
}
