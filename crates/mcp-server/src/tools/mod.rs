//! Relay MCP tool surface.
//!
//! Schemas, dispatch and per-tool implementations live in separate submodules; the per-tool
//! modules only talk to the upstream through [`crate::upstream::Upstream`].

pub(crate) mod catalog;
mod context;
mod dispatch;
mod file_edit;
mod grep;
mod indentation;
mod paths;
mod read_file;
mod reader;
mod schemas;
mod search;
mod util;

pub use dispatch::RelayService;
