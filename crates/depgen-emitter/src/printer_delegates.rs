//! Injection and caching delegates handed to the activator registry.

use crate::printer::ActivatorPrinter;
use depgen_common::contract::{ACTIVATOR_HELPERS, DEPENDENCY_CONTAINER};

/// Delegate parameters: target instance, parent dependencies, cache info.
const DELEGATE_PARAMETERS: &str = "(t, d, i) =>";

impl ActivatorPrinter<'_> {
    /// `registry.Register(typeof(Self), inject, cache);`
    pub(crate) fn print_registration(&mut self) {
        let candidate = self.candidate;
        let injects =
            !candidate.resolved_members.is_empty() || !candidate.dependency_loader_members.is_empty();
        let caches = !candidate.cached_classes.is_empty()
            || !candidate.cached_interfaces.is_empty()
            || !candidate.cached_members.is_empty();

        if !injects && !caches {
            self.writer
                .line(&format!("registry.Register(typeof({}), null, null);", self.self_type));
            return;
        }

        self.writer.line("registry.Register(");
        self.writer.increase_indent();
        self.writer.line(&format!("typeof({}),", self.self_type));
        if injects {
            self.print_inject_delegate();
        } else {
            self.writer.write("null");
        }
        self.writer.line(",");
        if caches {
            self.print_cache_delegate();
        } else {
            self.writer.write("null");
        }
        self.writer.line(");");
        self.writer.decrease_indent();
    }

    /// Resolved members in declaration order, then each loader invocation.
    fn print_inject_delegate(&mut self) {
        let candidate = self.candidate;
        self.writer.line(DELEGATE_PARAMETERS);
        self.writer.open_block();
        self.writer
            .line(&format!("var target = ({})t;", self.self_type));

        for member in &candidate.resolved_members {
            self.writer.write(&format!(
                "target.{} = global::{ACTIVATOR_HELPERS}.Resolve<{}>(d, i, typeof({}), ",
                member.name, member.ty, self.self_type
            ));
            self.writer.write_string_literal(&member.name);
            self.writer.write(", ");
            self.write_optional_string(member.dependency_name.as_deref());
            self.writer.line(&format!(", {});", member.can_be_null));
        }

        for loader in &candidate.dependency_loader_members {
            self.writer.write(&format!("target.{}(", loader.name));
            if !loader.parameters.is_empty() {
                self.writer.write_line();
                self.writer.increase_indent();
                for (index, parameter) in loader.parameters.iter().enumerate() {
                    self.writer.write(&format!(
                        "global::{ACTIVATOR_HELPERS}.Resolve<{}>(d, i, typeof({}), ",
                        parameter.ty, self.self_type
                    ));
                    self.writer.write_string_literal(&parameter.name);
                    self.writer.write(&format!(", null, {})", loader.permit_nulls));
                    if index + 1 < loader.parameters.len() {
                        self.writer.line(",");
                    }
                }
                self.writer.decrease_indent();
            }
            self.writer.line(");");
        }

        self.writer.decrease_indent();
        self.writer.write("}");
    }

    /// Cached classes, then cached interfaces, then cached members.
    fn print_cache_delegate(&mut self) {
        let candidate = self.candidate;
        self.writer.line(DELEGATE_PARAMETERS);
        self.writer.open_block();
        self.writer
            .line(&format!("var target = ({})t;", self.self_type));
        self.writer
            .line(&format!("var dc = new global::{DEPENDENCY_CONTAINER}(d);"));

        for class in &candidate.cached_classes {
            for registration in &class.registrations {
                self.print_cache_call(&registration.ty, "target", registration.name.as_deref());
            }
        }
        for interface in &candidate.cached_interfaces {
            self.print_cache_call(&interface.ty, "target", None);
        }
        for member in &candidate.cached_members {
            let value = format!("target.{}", member.name);
            for registration in &member.registrations {
                self.print_cache_call(&registration.ty, &value, registration.name.as_deref());
            }
        }

        self.writer.line("return dc;");
        self.writer.decrease_indent();
        self.writer.write("}");
    }

    fn print_cache_call(&mut self, ty: &str, value: &str, name: Option<&str>) {
        self.writer.write(&format!(
            "global::{ACTIVATOR_HELPERS}.Cache<{ty}>(dc, {value}, "
        ));
        self.write_optional_string(name);
        self.writer.line(&format!(", typeof({}));", self.self_type));
    }

    fn write_optional_string(&mut self, value: Option<&str>) {
        match value {
            Some(value) => self.writer.write_string_literal(value),
            None => self.writer.write("null"),
        }
    }
}
