use relay_protocol::{ToolError, ToolResult};

/// `value` as a 1-based count or index, `default` when absent.
pub(super) fn positive(name: &str, value: Option<i64>, default: usize) -> ToolResult<usize> {
    match value {
        None => Ok(default),
        Some(raw) if raw > 0 => usize::try_from(raw)
            .map_err(|_| ToolError::validation(format!("{name} is too large"))),
        Some(_) => Err(ToolError::validation(format!(
            "{name} must be a positive integer"
        ))),
    }
}

/// `glob` re-rooted at `dir`; slash-free globs match at any depth below it.
pub(super) fn under(dir: &str, glob: &str) -> String {
    if glob.contains('/') {
        format!("{dir}/{glob}")
    } else {
        format!("{dir}/**/{glob}")
    }
}

/// Cut `input` to at most `max_units` UTF-16 code units without splitting a surrogate pair.
pub(super) fn truncate_utf16(input: &str, max_units: usize) -> &str {
    let mut units = 0usize;
    for (idx, ch) in input.char_indices() {
        units += ch.len_utf16();
        if units > max_units {
            return &input[..idx];
        }
    }
    input
}

/// Render lines for the caller: `L<n>: text` when numbered, the bare text otherwise.
pub(super) fn render_lines<'a>(
    first_line: usize,
    lines: impl IntoIterator<Item = &'a str>,
    numbered: bool,
    max_line_chars: usize,
) -> String {
    lines
        .into_iter()
        .enumerate()
        .map(|(idx, line)| {
            let text = truncate_utf16(line, max_line_chars);
            if numbered {
                format!("L{}: {text}", first_line + idx)
            } else {
                text.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
