//! Request and response shapes of the relay tools.

pub(super) mod apply_patch;
pub(super) mod capabilities;
pub(super) mod edit;
pub(super) mod grep;
pub(super) mod read_file;
pub(super) mod search;
