//! Prints the activator partial declaration of one candidate.
//!
//! The generated file re-declares the class (inside its namespace and every
//! containing type) as `partial` and implements
//! `RegisterForDependencyActivation`, which hands the runtime registry two
//! delegates: one injecting dependencies into an instance, one publishing the
//! instance's cached values. Delegate bodies live in `printer_delegates.rs`.

use crate::source_writer::SourceWriter;
use depgen_analysis::{Candidate, TypeHeader};
use depgen_common::contract::{ACTIVATOR_INTERFACE, ACTIVATOR_METHOD, ACTIVATOR_REGISTRY};
use depgen_common::CONTRACT_VERSION;

/// Formatting of generated files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitOptions {
    pub indent: &'static str,
    pub new_line: &'static str,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            indent: "    ",
            new_line: "\n",
        }
    }
}

pub(crate) struct ActivatorPrinter<'c> {
    pub(crate) candidate: &'c Candidate,
    pub(crate) writer: SourceWriter,
    /// `global::`-qualified type of the class as seen from inside it.
    pub(crate) self_type: String,
}

impl<'c> ActivatorPrinter<'c> {
    pub(crate) fn new(candidate: &'c Candidate, options: &EmitOptions) -> Self {
        Self {
            candidate,
            writer: SourceWriter::new(options.indent, options.new_line),
            self_type: self_type(candidate),
        }
    }

    pub(crate) fn print(mut self) -> String {
        self.writer.line("// <auto-generated/>");
        self.writer.line(&format!(
            "// Generated by depgen (contract v{CONTRACT_VERSION}). Do not edit."
        ));
        self.writer.line("#nullable disable");
        self.writer.write_line();

        let candidate = self.candidate;
        let target = &candidate.target;
        let has_namespace = !target.namespace.is_empty();
        if has_namespace {
            self.writer.line(&format!("namespace {}", target.namespace));
            self.writer.open_block();
        }
        for header in &target.containing {
            self.writer.line(&declaration_header(header, None));
            self.writer.open_block();
        }

        // Classes with a participating base inherit the interface.
        let activator = format!("global::{ACTIVATOR_INTERFACE}");
        let interface = target.base.is_none().then_some(activator.as_str());
        self.writer.line(&declaration_header(&target.class, interface));
        self.writer.open_block();
        self.print_register_method();
        self.writer.close_block("}");

        for _ in &target.containing {
            self.writer.close_block("}");
        }
        if has_namespace {
            self.writer.close_block("}");
        }
        self.writer.finish()
    }

    fn print_register_method(&mut self) {
        let candidate = self.candidate;
        let target = &candidate.target;
        let modifiers = if target.base.is_some() {
            "public override"
        } else if target.is_sealed {
            "public"
        } else {
            "public virtual"
        };
        self.writer.line(&format!(
            "{modifiers} void {ACTIVATOR_METHOD}(global::{ACTIVATOR_REGISTRY} registry)"
        ));
        self.writer.open_block();

        self.writer
            .line(&format!("if (registry.IsRegistered(typeof({})))", self.self_type));
        self.writer.increase_indent();
        self.writer.line("return;");
        self.writer.decrease_indent();
        self.writer.write_line();

        if target.base.is_some() {
            self.writer.line(&format!("base.{ACTIVATOR_METHOD}(registry);"));
            self.writer.write_line();
        }

        self.print_registration();
        self.writer.close_block("}");
    }
}

/// `partial class Name<T, U>` with an optional single interface.
fn declaration_header(header: &TypeHeader, interface: Option<&str>) -> String {
    let mut text = format!("partial {} {}", header.keyword, header.name);
    push_type_parameters(&mut text, &header.type_parameters);
    if let Some(interface) = interface {
        text.push_str(" : ");
        text.push_str(interface);
    }
    text
}

fn push_type_parameters(text: &mut String, type_parameters: &[String]) {
    if type_parameters.is_empty() {
        return;
    }
    text.push('<');
    text.push_str(&type_parameters.join(", "));
    text.push('>');
}

/// Open generic form of the candidate's own type, e.g.
/// `global::Game.Outer<T>.Box<U>`.
fn self_type(candidate: &Candidate) -> String {
    let target = &candidate.target;
    let mut text = String::from("global::");
    if !target.namespace.is_empty() {
        text.push_str(&target.namespace);
        text.push('.');
    }
    for header in target.containing.iter().chain(std::iter::once(&target.class)) {
        if !text.ends_with('.') && !text.ends_with(':') {
            text.push('.');
        }
        text.push_str(&header.name);
        push_type_parameters(&mut text, &header.type_parameters);
    }
    text
}
