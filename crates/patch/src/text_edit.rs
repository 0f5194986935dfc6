use crate::error::{PatchError, Result};
use crate::matcher::seek_sequence;

const BOM: char = '\u{FEFF}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub content: String,
    pub replacements: usize,
    /// True when the match needed whitespace or punctuation folding.
    pub fuzzy: bool,
}

/// Convert CRLF and lone CR line endings to LF.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Dominant line terminator of `text`, judged by its first line break.
pub fn detect_line_ending(text: &str) -> &'static str {
    match text.find(['\r', '\n']) {
        Some(idx) if text[idx..].starts_with("\r\n") => "\r\n",
        Some(idx) if text[idx..].starts_with('\r') => "\r",
        _ => "\n",
    }
}

/// Replace `old` with `new` in a file's content, keeping its BOM and line endings.
pub fn edit_document(content: &str, old: &str, new: &str, replace_all: bool) -> Result<EditOutcome> {
    let (bom, body) = match content.strip_prefix(BOM) {
        Some(rest) => (true, rest),
        None => (false, content),
    };
    let ending = detect_line_ending(body);

    let old = normalize_newlines(old.strip_prefix(BOM).unwrap_or(old));
    let new = normalize_newlines(new);
    let mut outcome = replace_text(&normalize_newlines(body), &old, &new, replace_all)?;

    if ending != "\n" {
        outcome.content = outcome.content.replace('\n', ending);
    }
    if bom {
        outcome.content.insert(0, BOM);
    }
    Ok(outcome)
}

/// Replace `old` with `new` in LF-normalized text.
///
/// An exact substring match wins. Otherwise `old` is matched line by line with the loose
/// comparisons of [`seek_sequence`], and matched lines are replaced whole.
pub fn replace_text(content: &str, old: &str, new: &str, replace_all: bool) -> Result<EditOutcome> {
    if old == new {
        return Err(PatchError::IdenticalStrings);
    }
    if old.is_empty() {
        return Err(PatchError::EmptyOldString);
    }

    let exact = content.matches(old).count();
    if exact > 0 {
        if exact > 1 && !replace_all {
            return Err(PatchError::OldStringNotUnique { count: exact });
        }
        let content = if replace_all {
            content.replace(old, new)
        } else {
            content.replacen(old, new, 1)
        };
        return Ok(EditOutcome {
            content,
            replacements: exact,
            fuzzy: false,
        });
    }

    let mut lines: Vec<&str> = content.split('\n').collect();
    let needle: Vec<&str> = old.strip_suffix('\n').unwrap_or(old).split('\n').collect();
    let replacement: Vec<&str> = new.strip_suffix('\n').unwrap_or(new).split('\n').collect();
    if needle.iter().all(|line| line.trim().is_empty()) {
        return Err(PatchError::OldStringNotFound);
    }

    let mut matches = Vec::new();
    let mut start = 0usize;
    while let Some(idx) = seek_sequence(&lines, &needle, start, false) {
        matches.push(idx);
        start = idx + needle.len();
    }
    match matches.len() {
        0 => return Err(PatchError::OldStringNotFound),
        n if n > 1 && !replace_all => return Err(PatchError::OldStringNotUnique { count: n }),
        _ => {}
    }

    for &idx in matches.iter().rev() {
        lines.splice(idx..idx + needle.len(), replacement.iter().copied());
    }
    log::debug!("fuzzy edit replaced {} block(s)", matches.len());
    Ok(EditOutcome {
        content: lines.join("\n"),
        replacements: matches.len(),
        fuzzy: true,
    })
}
