//! Error-recovering recursive-descent parser for the declaration language.

mod state;
mod state_declarations;
mod state_members;
mod state_types;

pub use state::ParserState;

use crate::ast::{FileId, SourceFile};
use std::sync::Arc;

/// Parse one file into a syntax tree. Syntax errors are attached to the
/// returned `SourceFile` as diagnostics.
#[must_use]
pub fn parse_source_file(
    file_id: FileId,
    file_name: impl Into<Arc<str>>,
    text: impl Into<Arc<str>>,
) -> SourceFile {
    ParserState::new(file_id, file_name, text).parse_source_file()
}
