//! Code emitter for dependency activators.
//!
//! This crate provides:
//! - `source_writer` - Indentation-aware output (`SourceWriter`)
//! - `printer` - The activator partial declaration for one candidate
//! - `errors` - Internal emission failures (`EmitError`, surfaced as `DG9001`)
//!
//! Emission is a pure function of the candidate: the same candidate always
//! produces byte-identical output, which the incremental cache relies on.

pub mod errors;
pub mod printer;
mod printer_delegates;
pub mod source_writer;

pub use errors::{EmitError, EmitResult};
pub use printer::EmitOptions;
pub use source_writer::SourceWriter;

use depgen_analysis::{Candidate, DeclarationRef};
use printer::ActivatorPrinter;
use rustc_hash::FxHashMap;
use tracing::trace;

/// One generated file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedSource {
    pub hint_name: String,
    pub text: String,
}

/// Emit the activator for `candidate`.
#[tracing::instrument(level = "debug", skip_all, fields(class = %candidate.symbol))]
pub fn emit_candidate(candidate: &Candidate, options: &EmitOptions) -> EmitResult<GeneratedSource> {
    if !candidate.is_emittable() {
        return Err(EmitError::NotEmittable);
    }
    check_declaration_order(candidate)?;
    let text = ActivatorPrinter::new(candidate, options).print();
    trace!(bytes = text.len(), "activator emitted");
    Ok(GeneratedSource {
        hint_name: candidate.hint_name(),
        text,
    })
}

/// Every member set must already be in declaration order, and no two members
/// may share an ordering key; otherwise output would depend on scheduling.
pub fn check_declaration_order(candidate: &Candidate) -> EmitResult<()> {
    let mut claimed: FxHashMap<(u32, u32), &str> = FxHashMap::default();
    check_set(
        candidate
            .resolved_members
            .iter()
            .map(|m| (&m.declaration, m.name.as_str())),
        &mut claimed,
    )?;
    check_set(
        candidate
            .cached_members
            .iter()
            .map(|m| (&m.declaration, m.name.as_str())),
        &mut claimed,
    )?;
    check_set(
        candidate
            .dependency_loader_members
            .iter()
            .map(|l| (&l.declaration, l.name.as_str())),
        &mut claimed,
    )
}

fn check_set<'c>(
    members: impl Iterator<Item = (&'c DeclarationRef, &'c str)>,
    claimed: &mut FxHashMap<(u32, u32), &'c str>,
) -> EmitResult<()> {
    let mut previous = None;
    for (declaration, name) in members {
        let key = declaration.order_key();
        if let Some(first) = claimed.insert(key, name) {
            return Err(EmitError::DuplicateOrderingKey {
                first: first.to_string(),
                second: name.to_string(),
            });
        }
        if previous.is_some_and(|previous| previous > key) {
            return Err(EmitError::OutOfOrder {
                member: name.to_string(),
            });
        }
        previous = Some(key);
    }
    Ok(())
}
