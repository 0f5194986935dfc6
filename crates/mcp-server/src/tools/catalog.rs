#[derive(Clone, Copy, Debug)]
pub(crate) struct ToolDescriptor {
    pub(crate) name: &'static str,
    pub(crate) summary: &'static str,
}

pub(crate) const TOOL_CATALOG: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: "apply_patch",
        summary: "Apply a *** Begin Patch block (add/delete/update/move files).",
    },
    ToolDescriptor {
        name: "edit",
        summary: "Replace old_string with new_string in one file (exact, then whitespace-tolerant).",
    },
    ToolDescriptor {
        name: "write",
        summary: "Create or overwrite a file (line endings normalized to LF).",
    },
    ToolDescriptor {
        name: "read_file",
        summary: "Line-numbered slice, raw slice, or indentation-aware block of a file.",
    },
    ToolDescriptor {
        name: "grep",
        summary: "Content search (literal or regex) with path/glob/type filters.",
    },
    ToolDescriptor {
        name: "search",
        summary: "Symbol, file or text search returning JSON {items, more}.",
    },
    ToolDescriptor {
        name: "capabilities",
        summary: "Server version, upstream search primitives and effective tunables.",
    },
];

pub(crate) fn tool_names() -> impl Iterator<Item = &'static str> {
    TOOL_CATALOG.iter().map(|tool| tool.name)
}

pub(crate) fn tool_instructions() -> String {
    let mut lines = vec![
        "Relay edits and searches the project through the IDE's MCP server.".to_string(),
        "Read before editing: read_file → edit/apply_patch; use grep/search to locate code."
            .to_string(),
        "Tools:".to_string(),
    ];
    for tool in TOOL_CATALOG {
        lines.push(format!("- {}: {}", tool.name, tool.summary));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_list_every_tool() {
        let text = tool_instructions();
        for name in tool_names() {
            assert!(text.contains(&format!("- {name}:")), "{name} missing");
        }
    }
}
