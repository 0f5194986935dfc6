use relay_protocol::{ToolError, ToolResult};
use std::path::{Component, Path, PathBuf};

/// A caller path pinned to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ResolvedPath {
    pub(super) absolute: PathBuf,
    /// Forward-slash path relative to the root; empty for the root itself.
    pub(super) relative: String,
}

impl ResolvedPath {
    pub(super) fn display(&self) -> String {
        self.absolute.display().to_string()
    }
}

/// Lexical root containment: no filesystem access, symlinks are not followed.
#[derive(Debug, Clone)]
pub(super) struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub(super) fn new(root: &Path) -> Self {
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(root))
                .unwrap_or_else(|_| root.to_path_buf())
        };
        Self {
            root: normalize_lexically(&root).unwrap_or(root),
        }
    }

    pub(super) fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative or absolute path; fails when it leaves the root.
    pub(super) fn resolve(&self, raw: &str) -> ToolResult<ResolvedPath> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ToolError::validation("path must not be empty"));
        }
        let candidate = Path::new(raw);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };
        let absolute = normalize_lexically(&joined).ok_or_else(|| escapes_root(raw))?;
        let relative = absolute
            .strip_prefix(&self.root)
            .map_err(|_| escapes_root(raw))?
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/");
        Ok(ResolvedPath { absolute, relative })
    }

    /// Like [`Self::resolve`], but the root itself is rejected.
    pub(super) fn resolve_file(&self, raw: &str) -> ToolResult<ResolvedPath> {
        let resolved = self.resolve(raw)?;
        if resolved.relative.is_empty() {
            return Err(ToolError::validation(format!(
                "'{raw}' is the project root, not a file"
            )));
        }
        Ok(resolved)
    }
}

fn escapes_root(raw: &str) -> ToolError {
    ToolError::validation(format!("Path escapes project root: {raw}"))
}

/// Fold `.` and `..` without touching the filesystem; `None` when `..` climbs above the top.
fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                out.pop();
                depth -= 1;
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
        }
    }
    Some(out)
}
