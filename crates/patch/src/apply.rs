use crate::error::{PatchError, Result};
use crate::matcher::seek_sequence;
use crate::Hunk;

/// Apply update hunks to `original` and return the new file content.
///
/// Hunks are spliced one at a time; each search starts just past the previous hunk's inserted
/// lines (and past the hunk's `@@` anchor line when it has one). The result always ends with
/// a newline unless it is empty.
pub fn apply_hunks(original: &str, hunks: &[Hunk]) -> Result<String> {
    let mut lines: Vec<String> = original.split('\n').map(str::to_string).collect();
    if lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }

    let mut search_start = 0usize;
    for (idx, hunk) in hunks.iter().enumerate() {
        let mut anchored = false;
        if let Some(header) = hunk.header.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
            let pos = lines
                .iter()
                .skip(search_start)
                .position(|line| line.trim() == header)
                .ok_or_else(|| PatchError::HunkContextNotFound {
                    hunk: idx + 1,
                    context: format!("@@ {header}"),
                })?;
            search_start += pos + 1;
            anchored = true;
        }

        let old_lines = hunk.old_lines();
        let new_lines: Vec<String> = hunk.new_lines().into_iter().map(str::to_string).collect();

        // A bare insertion lands right after its header, or at the end without one.
        let start = if old_lines.is_empty() && anchored {
            search_start
        } else if old_lines.is_empty() {
            lines.len()
        } else {
            locate(&lines, &old_lines, search_start, hunk.is_end_of_file).ok_or_else(|| {
                PatchError::HunkContextNotFound {
                    hunk: idx + 1,
                    context: old_lines.join("\n"),
                }
            })?
        };
        search_start = start + new_lines.len();
        lines.splice(start..start + old_lines.len(), new_lines);
    }

    if lines.is_empty() {
        return Ok(String::new());
    }
    let mut output = lines.join("\n");
    output.push('\n');
    Ok(output)
}

fn locate(lines: &[String], old_lines: &[&str], search_start: usize, eof: bool) -> Option<usize> {
    let found = seek_sequence(lines, old_lines, search_start, eof);
    if found.is_none() && search_start > 0 && !eof {
        return seek_sequence(lines, old_lines, 0, false);
    }
    found
}
