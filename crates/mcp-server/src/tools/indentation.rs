//! Indentation-aware block extraction for `read_file` in indentation mode.

use std::ops::Range;

const TAB_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct BlockOptions {
    /// Indentation levels above the anchor the block may climb; 0 means the whole file.
    pub(super) max_levels: usize,
    pub(super) include_siblings: bool,
    pub(super) include_header: bool,
}

impl Default for BlockOptions {
    fn default() -> Self {
        Self {
            max_levels: 0,
            include_siblings: false,
            include_header: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LineRecord {
    indent: usize,
    blank: bool,
    headerish: bool,
}

fn measure_indent(line: &str) -> usize {
    line.chars()
        .map_while(|c| match c {
            ' ' => Some(1),
            '\t' => Some(TAB_WIDTH),
            _ => None,
        })
        .sum()
}

/// Comment or annotation line, tracking whether a `/* ... */` block is still open.
fn is_headerish(trimmed: &str, in_block_comment: &mut bool) -> bool {
    if *in_block_comment {
        if trimmed.contains("*/") {
            *in_block_comment = false;
        }
        return true;
    }
    if trimmed.starts_with('#') || trimmed.starts_with("//") || trimmed.starts_with("--") {
        return true;
    }
    if let Some(rest) = trimmed.strip_prefix("/*") {
        *in_block_comment = !rest.contains("*/");
        return true;
    }
    trimmed.starts_with('*') || trimmed.starts_with('@')
}

fn line_records(lines: &[String]) -> Vec<LineRecord> {
    let mut records = Vec::with_capacity(lines.len());
    let mut previous_indent = 0;
    let mut in_block_comment = false;
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            records.push(LineRecord {
                indent: previous_indent,
                blank: true,
                headerish: false,
            });
            continue;
        }
        let indent = measure_indent(line);
        previous_indent = indent;
        records.push(LineRecord {
            indent,
            blank: false,
            headerish: is_headerish(trimmed, &mut in_block_comment),
        });
    }
    records
}

/// One expansion direction: open until it meets a shallower line or a second boundary.
#[derive(Default)]
struct Frontier {
    closed: bool,
    boundaries: usize,
}

impl Frontier {
    /// Whether `record` joins the block; closes the direction otherwise.
    fn admit(
        &mut self,
        record: &LineRecord,
        min_indent: usize,
        options: &BlockOptions,
        upward: bool,
    ) -> bool {
        if record.indent < min_indent {
            self.closed = true;
            return false;
        }
        if options.include_siblings || record.indent != min_indent {
            return true;
        }
        // Comments and annotations above the owning line belong to it.
        let header = upward && options.include_header && record.headerish;
        if header || self.boundaries == 0 {
            self.boundaries += 1;
            return true;
        }
        self.closed = true;
        false
    }
}

/// Zero-based line range of the block around `anchor` (1-based, within `lines`).
///
/// Expands one line up, then one line down, until `max_lines` lines are collected or both
/// directions are closed. Leading and trailing blank lines are dropped.
pub(super) fn extract_block(
    lines: &[String],
    anchor: usize,
    options: &BlockOptions,
    max_lines: usize,
) -> Range<usize> {
    let anchor = anchor.clamp(1, lines.len().max(1)) - 1;
    if lines.is_empty() {
        return 0..0;
    }
    let records = line_records(lines);
    let cap = max_lines.clamp(1, records.len());
    if cap == 1 {
        return anchor..anchor + 1;
    }

    let min_indent = if options.max_levels == 0 {
        0
    } else {
        records[anchor]
            .indent
            .saturating_sub(options.max_levels * TAB_WIDTH)
    };

    let mut start = anchor;
    let mut end = anchor + 1;
    let mut up = Frontier::default();
    let mut down = Frontier::default();
    while end - start < cap && !(up.closed && down.closed) {
        if !up.closed {
            match start.checked_sub(1) {
                Some(idx) if up.admit(&records[idx], min_indent, options, true) => start = idx,
                Some(_) => {}
                None => up.closed = true,
            }
        }
        if end - start >= cap {
            break;
        }
        if !down.closed {
            if end < records.len() && down.admit(&records[end], min_indent, options, false) {
                end += 1;
            } else {
                down.closed = true;
            }
        }
    }

    while start < anchor && records[start].blank {
        start += 1;
    }
    while end > anchor + 1 && records[end - 1].blank {
        end -= 1;
    }
    start..end
}
