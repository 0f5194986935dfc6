use super::context::ToolContext;
use super::indentation::BlockOptions;
use super::schemas::read_file::{ReadFileRequest, ReadMode};
use super::util::positive;
use relay_protocol::{ToolError, ToolResult};

fn levels(value: Option<i64>) -> ToolResult<usize> {
    match value {
        None => Ok(0),
        Some(raw) => usize::try_from(raw)
            .map_err(|_| ToolError::validation("max_levels must be a non-negative integer")),
    }
}

/// `read_file` in slice, raw or indentation mode. Arguments are validated before any upstream
/// call.
pub(super) async fn read_file(ctx: ToolContext<'_>, request: ReadFileRequest) -> ToolResult<String> {
    let offset = positive("offset", request.offset, 1)?;
    let limit = positive("limit", request.limit, ctx.config.read.default_limit)?;
    let mode = request.mode.unwrap_or_default();
    let target = ctx.paths.resolve_file(&request.file_path)?;
    let reader = ctx.reader();

    match mode {
        ReadMode::Slice | ReadMode::Raw => {
            reader
                .read_slice(&target.relative, offset, limit, mode == ReadMode::Slice)
                .await
        }
        ReadMode::Indentation => {
            let settings = request.indentation.unwrap_or_default();
            let anchor = positive("anchor_line", settings.anchor_line, offset)?;
            let max_lines = positive("max_lines", settings.max_lines, limit)?;
            let options = BlockOptions {
                max_levels: levels(settings.max_levels)?,
                include_siblings: settings.include_siblings.unwrap_or(false),
                include_header: settings.include_header.unwrap_or(true),
            };
            reader
                .read_indentation_block(&target.relative, anchor, limit.min(max_lines), &options)
                .await
        }
    }
}
