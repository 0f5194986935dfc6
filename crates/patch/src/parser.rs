use crate::error::{PatchError, Result};
use crate::{Hunk, HunkLine, PatchOperation};

const BEGIN_PATCH: &str = "*** Begin Patch";
const END_PATCH: &str = "*** End Patch";
const ADD_FILE: &str = "*** Add File:";
const DELETE_FILE: &str = "*** Delete File:";
const UPDATE_FILE: &str = "*** Update File:";
const MOVE_TO: &str = "*** Move to:";
const END_OF_FILE: &str = "*** End of File";
const HUNK_START: &str = "@@";

/// Parse a patch document into its file operations.
pub fn parse_patch(text: &str) -> Result<Vec<PatchOperation>> {
    let lines: Vec<&str> = text.lines().collect();
    let lines = strip_heredoc(&lines);

    let begin = lines
        .iter()
        .position(|line| line.trim() == BEGIN_PATCH)
        .ok_or(PatchError::MissingMarker(BEGIN_PATCH))?;
    let end = lines[begin + 1..]
        .iter()
        .position(|line| line.trim() == END_PATCH)
        .map(|idx| idx + begin + 1)
        .ok_or(PatchError::MissingMarker(END_PATCH))?;

    let parser = Parser {
        lines: &lines[begin + 1..end],
        pos: 0,
        // 1-based line number of `lines[begin + 1]`.
        first_line_no: begin + 2,
    };
    parser.parse()
}

fn strip_heredoc<'a, 'b>(lines: &'b [&'a str]) -> &'b [&'a str] {
    if lines.len() < 4 {
        return lines;
    }
    let first = lines[0].trim();
    let last = lines[lines.len() - 1].trim();
    let opens = matches!(first, "<<EOF" | "<<'EOF'" | "<<\"EOF\"");
    if opens && last == "EOF" {
        &lines[1..lines.len() - 1]
    } else {
        lines
    }
}

fn is_diff_line(line: &str) -> bool {
    line.starts_with([' ', '+', '-'])
}

fn is_header_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    !trimmed.is_empty()
        && !is_diff_line(line)
        && !is_diff_line(trimmed)
        && trimmed.trim_end() != END_OF_FILE
        && trimmed.starts_with("*** ")
}

fn validate_path(raw: &str) -> Result<String> {
    let path = raw.trim();
    let invalid = |reason| PatchError::InvalidPath {
        path: path.to_string(),
        reason,
    };
    if path.is_empty() {
        return Err(invalid("path must not be empty"));
    }
    if path.chars().any(char::is_control) {
        return Err(invalid("path contains control characters"));
    }
    if ["\\n", "\\r", "\\t"].iter().any(|esc| path.contains(esc)) {
        return Err(invalid("path contains an escape sequence"));
    }
    Ok(path.to_string())
}

struct Parser<'a> {
    lines: &'a [&'a str],
    pos: usize,
    first_line_no: usize,
}

impl<'a> Parser<'a> {
    fn parse(mut self) -> Result<Vec<PatchOperation>> {
        let mut operations = Vec::new();
        while let Some(line) = self.peek() {
            if line.trim().is_empty() {
                self.pos += 1;
                continue;
            }
            if !is_header_line(line) {
                return Err(self.unexpected());
            }
            let header = line.trim();
            let operation = if let Some(rest) = header.strip_prefix(ADD_FILE) {
                self.pos += 1;
                self.parse_add(rest)?
            } else if let Some(rest) = header.strip_prefix(DELETE_FILE) {
                self.pos += 1;
                PatchOperation::Delete {
                    path: validate_path(rest)?,
                }
            } else if let Some(rest) = header.strip_prefix(UPDATE_FILE) {
                self.pos += 1;
                self.parse_update(rest)?
            } else {
                return Err(self.unexpected());
            };
            operations.push(operation);
        }

        if operations.is_empty() {
            return Err(PatchError::NoOperations);
        }
        Ok(operations)
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn line_no(&self) -> usize {
        self.first_line_no + self.pos
    }

    fn unexpected(&self) -> PatchError {
        PatchError::UnexpectedPatchLine {
            line: self.line_no(),
            text: self.peek().unwrap_or_default().to_string(),
        }
    }

    /// True when only blank lines remain before the next header (or the end of the patch).
    fn only_blanks_until_header(&self) -> bool {
        self.lines[self.pos..]
            .iter()
            .find(|line| !line.trim().is_empty())
            .map_or(true, |line| is_header_line(line))
    }

    fn parse_add(&mut self, raw_path: &str) -> Result<PatchOperation> {
        let path = validate_path(raw_path)?;
        let mut content_lines: Vec<&str> = Vec::new();
        while let Some(line) = self.peek() {
            if is_header_line(line) {
                break;
            }
            if line.trim().is_empty() && self.only_blanks_until_header() {
                break;
            }
            let Some(content) = line.strip_prefix('+') else {
                return Err(PatchError::AddFileFormat {
                    line: self.line_no(),
                });
            };
            content_lines.push(content);
            self.pos += 1;
        }

        let mut content = content_lines.join("\n");
        if !content_lines.is_empty() {
            content.push('\n');
        }
        Ok(PatchOperation::Add { path, content })
    }

    fn parse_update(&mut self, raw_path: &str) -> Result<PatchOperation> {
        let path = validate_path(raw_path)?;

        let mut move_to = None;
        if let Some(rest) = self.peek().and_then(|l| l.trim().strip_prefix(MOVE_TO)) {
            move_to = Some(validate_path(rest)?);
            self.pos += 1;
        }

        let mut hunks = Vec::new();
        while let Some(line) = self.peek() {
            if is_header_line(line) {
                break;
            }
            if line.trim().is_empty() && self.only_blanks_until_header() {
                break;
            }
            let start_line = self.line_no();
            let header = if let Some(rest) = line.strip_prefix(HUNK_START) {
                self.pos += 1;
                Some(rest.trim().to_string()).filter(|h| !h.is_empty())
            } else if hunks.is_empty() && (is_diff_line(line) || line.is_empty()) {
                None
            } else {
                return Err(self.unexpected());
            };
            hunks.push(self.parse_hunk_body(header, start_line)?);
        }

        if hunks.is_empty() {
            return Err(PatchError::UpdateFileRequiresHunk { path });
        }
        Ok(PatchOperation::Update {
            path,
            move_to,
            hunks,
        })
    }

    fn parse_hunk_body(&mut self, header: Option<String>, start_line: usize) -> Result<Hunk> {
        let mut hunk = Hunk {
            header,
            ..Hunk::default()
        };

        while let Some(line) = self.peek() {
            if line.trim() == END_OF_FILE {
                hunk.is_end_of_file = true;
                self.pos += 1;
                break;
            }
            if line.starts_with(HUNK_START) || is_header_line(line) {
                break;
            }
            if line.is_empty() && self.only_blanks_until_header() {
                break;
            }
            let parsed = if line.is_empty() {
                HunkLine::Context(String::new())
            } else if let Some(text) = line.strip_prefix(' ') {
                HunkLine::Context(text.to_string())
            } else if let Some(text) = line.strip_prefix('+') {
                HunkLine::Add(text.to_string())
            } else if let Some(text) = line.strip_prefix('-') {
                HunkLine::Remove(text.to_string())
            } else {
                return Err(self.unexpected());
            };
            hunk.lines.push(parsed);
            self.pos += 1;
        }

        if hunk.lines.is_empty() {
            return Err(PatchError::EmptyHunk { line: start_line });
        }
        Ok(hunk)
    }
}
