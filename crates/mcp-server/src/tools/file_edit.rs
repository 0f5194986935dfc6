//! `apply_patch`, `edit` and `write`.
//!
//! Content goes through the upstream writer (`create_new_file` with `overwrite`). The upstream
//! has no delete primitive, so deletes and the source side of a move act on the local file.
//! A patch is staged completely (every hunk located) before anything is written.

use super::context::ToolContext;
use super::paths::ResolvedPath;
use relay_patch::{
    apply_hunks, detect_line_ending, edit_document, normalize_newlines, parse_patch, Hunk,
    PatchError, PatchOperation,
};
use relay_protocol::upstream::tools;
use relay_protocol::{ToolError, ToolResult};
use serde_json::json;

const BOM: char = '\u{FEFF}';

fn patch_error(err: PatchError, path: &str) -> ToolError {
    if err.is_syntax() {
        ToolError::Parse(err.to_string())
    } else if err.is_context_miss() {
        ToolError::ContextNotFound(format!("{err} in {path}"))
    } else {
        ToolError::Validation(format!("{err} in {path}"))
    }
}

/// Apply hunks to stored text, keeping its BOM and line terminator.
fn apply_to_document(original: &str, hunks: &[Hunk]) -> relay_patch::Result<String> {
    let (bom, body) = match original.strip_prefix(BOM) {
        Some(rest) => (true, rest),
        None => (false, original),
    };
    let ending = detect_line_ending(body);
    let mut updated = apply_hunks(&normalize_newlines(body), hunks)?;
    if ending != "\n" {
        updated = updated.replace('\n', ending);
    }
    if bom {
        updated.insert(0, BOM);
    }
    Ok(updated)
}

async fn write_upstream(ctx: ToolContext<'_>, relative: &str, text: &str) -> ToolResult<()> {
    ctx.upstream
        .call(
            tools::CREATE_FILE,
            json!({
                "pathInProject": relative,
                "text": text,
                "overwrite": true,
            }),
        )
        .await?;
    Ok(())
}

async fn remove_local(target: &ResolvedPath) -> ToolResult<()> {
    tokio::fs::remove_file(&target.absolute)
        .await
        .map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => {
                ToolError::validation(format!("cannot delete {}: file not found", target.relative))
            }
            _ => ToolError::transport(format!("failed to delete {}: {err}", target.display())),
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Change {
    Write(String),
    Remove,
}

/// Final state of every file a patch touches, in first-touch order.
#[derive(Default)]
struct StagedPatch {
    files: Vec<(ResolvedPath, Change)>,
}

impl StagedPatch {
    fn current(&self, relative: &str) -> Option<&Change> {
        self.files
            .iter()
            .find(|(target, _)| target.relative == relative)
            .map(|(_, change)| change)
    }

    fn stage(&mut self, target: ResolvedPath, change: Change) {
        match self
            .files
            .iter_mut()
            .find(|(staged, _)| staged.relative == target.relative)
        {
            Some(entry) => entry.1 = change,
            None => self.files.push((target, change)),
        }
    }

    async fn commit(self, ctx: ToolContext<'_>) -> ToolResult<()> {
        for (target, change) in self.files {
            match change {
                Change::Write(text) => write_upstream(ctx, &target.relative, &text).await?,
                Change::Remove => remove_local(&target).await?,
            }
            log::debug!("patched {}", target.relative);
        }
        Ok(())
    }
}

async fn stage_operation(
    ctx: ToolContext<'_>,
    staged: &mut StagedPatch,
    operation: &PatchOperation,
) -> ToolResult<()> {
    match operation {
        PatchOperation::Add { path, content } => {
            let target = ctx.paths.resolve_file(path)?;
            staged.stage(target, Change::Write(content.clone()));
        }
        PatchOperation::Delete { path } => {
            let target = ctx.paths.resolve_file(path)?;
            let exists = match staged.current(&target.relative) {
                Some(change) => *change != Change::Remove,
                None => tokio::fs::metadata(&target.absolute).await.is_ok(),
            };
            if !exists {
                return Err(ToolError::validation(format!(
                    "cannot delete {path}: file not found"
                )));
            }
            staged.stage(target, Change::Remove);
        }
        PatchOperation::Update {
            path,
            move_to,
            hunks,
        } => {
            let source = ctx.paths.resolve_file(path)?;
            let original = match staged.current(&source.relative) {
                Some(Change::Write(text)) => text.clone(),
                Some(Change::Remove) => {
                    return Err(ToolError::validation(format!(
                        "cannot update {path}: it is deleted earlier in the patch"
                    )))
                }
                None => ctx.reader().read_full(&source.relative).await?,
            };
            let updated =
                apply_to_document(&original, hunks).map_err(|err| patch_error(err, path))?;

            match move_to {
                Some(destination) => {
                    let destination = ctx.paths.resolve_file(destination)?;
                    if destination.relative != source.relative {
                        staged.stage(source, Change::Remove);
                    }
                    staged.stage(destination, Change::Write(updated));
                }
                None => staged.stage(source, Change::Write(updated)),
            }
        }
    }
    Ok(())
}

pub(super) async fn apply_patch(ctx: ToolContext<'_>, patch: &str) -> ToolResult<String> {
    let operations = parse_patch(patch).map_err(|err| ToolError::Parse(err.to_string()))?;

    let mut staged = StagedPatch::default();
    for operation in &operations {
        log::debug!("staging {}", operation.path());
        stage_operation(ctx, &mut staged, operation).await?;
    }
    staged.commit(ctx).await?;

    log::info!("applied patch with {} operation(s)", operations.len());
    Ok(format!("Applied patch to {} file(s).", operations.len()))
}

pub(super) async fn edit(
    ctx: ToolContext<'_>,
    file_path: &str,
    old_string: &str,
    new_string: &str,
    replace_all: bool,
) -> ToolResult<String> {
    if old_string == new_string {
        return Err(ToolError::validation(PatchError::IdenticalStrings.to_string()));
    }
    if old_string.is_empty() {
        return Err(ToolError::validation(PatchError::EmptyOldString.to_string()));
    }

    let target = ctx.paths.resolve_file(file_path)?;
    let original = ctx.reader().read_full(&target.relative).await?;
    let outcome = edit_document(&original, old_string, new_string, replace_all)
        .map_err(|err| patch_error(err, &target.relative))?;
    if outcome.fuzzy {
        log::info!(
            "edit of {} matched old_string loosely (whitespace/punctuation folded)",
            target.relative
        );
    }

    write_upstream(ctx, &target.relative, &outcome.content).await?;
    Ok(format!("Updated {}", target.display()))
}

pub(super) async fn write(ctx: ToolContext<'_>, file_path: &str, content: &str) -> ToolResult<String> {
    let target = ctx.paths.resolve_file(file_path)?;
    write_upstream(ctx, &target.relative, &normalize_newlines(content)).await?;
    Ok(format!("Wrote {}", target.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedUpstream;
    use crate::tools::context::Fixture;
    use pretty_assertions::assert_eq;

    fn patch(body: &str) -> String {
        format!("*** Begin Patch\n{body}*** End Patch\n")
    }

    #[tokio::test]
    async fn update_replaces_a_line() {
        let fx = Fixture::new(ScriptedUpstream::default().with_file("f.txt", "alpha\nbeta\n"));
        let message = apply_patch(fx.ctx(), &patch("*** Update File: f.txt\n@@\n-beta\n+gamma\n"))
            .await
            .unwrap();
        assert_eq!(message, "Applied patch to 1 file(s).");
        assert_eq!(fx.upstream.file("f.txt").unwrap(), "alpha\ngamma\n");
    }

    #[tokio::test]
    async fn pure_insertion_appends() {
        let fx = Fixture::new(ScriptedUpstream::default().with_file("f.txt", "alpha\nbeta\n"));
        apply_patch(fx.ctx(), &patch("*** Update File: f.txt\n@@\n+gamma\n"))
            .await
            .unwrap();
        assert_eq!(fx.upstream.file("f.txt").unwrap(), "alpha\nbeta\ngamma\n");
    }

    #[tokio::test]
    async fn end_of_file_anchor_must_match_the_tail() {
        let fx = Fixture::new(
            ScriptedUpstream::default().with_file("f.txt", "alpha\nbeta\ngamma\n"),
        );
        let err = apply_patch(
            fx.ctx(),
            &patch("*** Update File: f.txt\n@@\n-beta\n+BETA\n*** End of File\n"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "context_not_found");
        assert!(err.to_string().contains("Hunk context not found"));
        assert_eq!(fx.upstream.call_names(), vec![tools::READ_FILE.to_string()]);
    }

    #[tokio::test]
    async fn malformed_patch_is_a_parse_error() {
        let fx = Fixture::new(ScriptedUpstream::default());
        let err = apply_patch(fx.ctx(), "*** Update File: f.txt\n-a\n+b\n")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "parse_error");
        assert!(err.to_string().contains("Begin Patch"));
        assert!(fx.upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn crlf_files_stay_crlf() {
        let fx = Fixture::new(ScriptedUpstream::default().with_file("f.txt", "a\r\nb\r\n"));
        apply_patch(fx.ctx(), &patch("*** Update File: f.txt\n@@\n-b\n+c\n"))
            .await
            .unwrap();
        assert_eq!(fx.upstream.file("f.txt").unwrap(), "a\r\nc\r\n");
    }

    #[tokio::test]
    async fn add_delete_and_move() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("gone.txt"), "bye\n").unwrap();
        std::fs::write(dir.path().join("src/a.txt"), "one\ntwo\n").unwrap();
        let fx = Fixture::rooted(
            ScriptedUpstream::default().with_file("src/a.txt", "one\ntwo\n"),
            dir.path(),
        );

        let message = apply_patch(
            fx.ctx(),
            &patch(
                "*** Add File: new.txt\n+hello\n\
                 *** Delete File: gone.txt\n\
                 *** Update File: src/a.txt\n*** Move to: src/b.txt\n@@\n-two\n+three\n",
            ),
        )
        .await
        .unwrap();

        assert_eq!(message, "Applied patch to 3 file(s).");
        assert_eq!(fx.upstream.file("new.txt").unwrap(), "hello\n");
        assert_eq!(fx.upstream.file("src/b.txt").unwrap(), "one\nthree\n");
        assert!(!dir.path().join("gone.txt").exists());
        assert!(!dir.path().join("src/a.txt").exists());
    }

    #[tokio::test]
    async fn missing_delete_target_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let fx = Fixture::rooted(ScriptedUpstream::default(), dir.path());
        let err = apply_patch(
            fx.ctx(),
            &patch("*** Add File: a.txt\n+x\n*** Delete File: nope.txt\n"),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
        assert!(fx.upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn patch_paths_cannot_escape_the_root() {
        let fx = Fixture::new(ScriptedUpstream::default());
        let err = apply_patch(fx.ctx(), &patch("*** Add File: ../outside.txt\n+x\n"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
    }

    #[tokio::test]
    async fn identical_strings_fail_before_reading() {
        let fx = Fixture::new(ScriptedUpstream::default());
        let err = edit(fx.ctx(), "f.txt", "a", "a", false).await.unwrap_err();
        assert_eq!(err.to_string(), "old_string and new_string must differ");
        assert_eq!(err.code(), "invalid_argument");
        assert!(fx.upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn edit_keeps_line_endings() {
        let fx = Fixture::new(
            ScriptedUpstream::default().with_file("cfg.txt", "x = 1\r\ny = 2\r\n"),
        );
        let message = edit(fx.ctx(), "cfg.txt", "y = 2", "y = 3", false)
            .await
            .unwrap();
        assert_eq!(message, "Updated /work/project/cfg.txt");
        assert_eq!(fx.upstream.file("cfg.txt").unwrap(), "x = 1\r\ny = 3\r\n");
    }

    #[tokio::test]
    async fn edit_reports_missing_old_string() {
        let fx = Fixture::new(ScriptedUpstream::default().with_file("f.txt", "alpha\n"));
        let err = edit(fx.ctx(), "f.txt", "omega", "psi", false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "context_not_found");
    }

    #[tokio::test]
    async fn write_normalizes_line_endings() {
        let fx = Fixture::new(ScriptedUpstream::default());
        let message = write(fx.ctx(), "out.txt", "a\r\nb\rc").await.unwrap();
        assert_eq!(message, "Wrote /work/project/out.txt");
        assert_eq!(fx.upstream.file("out.txt").unwrap(), "a\nb\nc");
        assert_eq!(
            fx.upstream.calls()[0].1,
            json!({"pathInProject": "out.txt", "text": "a\nb\nc", "overwrite": true})
        );
    }
}
