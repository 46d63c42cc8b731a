//! Parser and syntax trees for the depgen declaration front-end.
//!
//! This crate provides:
//! - `ast` - Declaration-only syntax trees (`SourceFile`, `TypeDecl`, `MemberDecl`, attributes)
//! - `parser` - `ParserState`, an error-recovering parser that skips bodies structurally
//! - `syntax` - Cheap syntactic queries, including the candidate eligibility filter

pub mod ast;
pub mod parser;
pub mod syntax;

pub use ast::{FileId, SourceFile, SyntaxRef};
pub use parser::{ParserState, parse_source_file};
pub use syntax::eligibility::{EligibleDeclaration, eligible_class_declarations};
