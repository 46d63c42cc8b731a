use colored::Colorize;
use std::collections::HashMap;
use std::path::PathBuf;

use depgen_common::{
    Diagnostic, DiagnosticCategory, DiagnosticRelatedInformation, LineMap, format_code,
};

use crate::compilation::Compilation;

pub struct Reporter {
    color: bool,
    base_dir: Option<PathBuf>,
    sources: HashMap<String, String>,
    line_maps: HashMap<String, LineMap>,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter {
            color,
            base_dir: None,
            sources: HashMap::new(),
            line_maps: HashMap::new(),
        }
    }

    /// Resolve file names that are not registered relative to `base_dir`.
    pub fn with_base_dir(mut self, base_dir: PathBuf) -> Self {
        self.base_dir = Some(base_dir);
        self
    }

    /// Register every source of `compilation` so snippets need no disk reads.
    pub fn add_compilation(&mut self, compilation: &Compilation) {
        for source in compilation.sources.iter().chain(&compilation.references) {
            self.add_source(&source.file_name, &source.text);
        }
    }

    pub fn add_source(&mut self, file: &str, text: &str) {
        self.line_maps.remove(file);
        self.sources.insert(file.to_string(), text.to_string());
    }

    pub fn render(&mut self, diagnostics: &[Diagnostic]) -> String {
        let mut out = String::new();
        for diagnostic in diagnostics {
            out.push_str(&self.format_diagnostic(diagnostic));
            out.push('\n');
        }
        out
    }

    pub fn format_diagnostic(&mut self, diagnostic: &Diagnostic) -> String {
        let location = self.format_location(&diagnostic.file, diagnostic.start);
        let category = self.format_category(diagnostic.category);
        let code = self.format_code(diagnostic.code);

        let mut output = String::new();
        if let Some(location) = location {
            output.push_str(&location);
        } else if !diagnostic.file.is_empty() {
            output.push_str(&diagnostic.file);
        } else {
            output.push_str("<unknown>");
        }

        output.push_str(" - ");
        output.push_str(&category);
        if !code.is_empty() {
            output.push(' ');
            output.push_str(&code);
        }
        output.push_str(": ");
        output.push_str(&diagnostic.message_text);

        if let Some(snippet) =
            self.format_snippet(&diagnostic.file, diagnostic.start, diagnostic.length)
        {
            output.push_str(&snippet);
        }

        for related in &diagnostic.related_information {
            output.push('\n');
            output.push_str(&self.format_related(related));
            if let Some(snippet) = self.format_snippet(&related.file, related.start, related.length)
            {
                output.push_str(&snippet);
            }
        }

        output
    }

    /// Source line with the span underlined:
    ///   12       [Resolved] private readonly Audio audio;
    ///                                          ~~~~~
    fn format_snippet(&mut self, file: &str, start: u32, length: u32) -> Option<String> {
        if file.is_empty() || length == 0 {
            return None;
        }

        let (line_num, column) = self.position_for(file, start)?;
        let source = self.sources.get(file)?;
        let line_map = self.line_maps.get(file)?;
        let line_text = line_map.line_text(line_num - 1, source)?;

        let mut underline = String::new();
        for (i, ch) in line_text.chars().enumerate() {
            let offset = i as u32;
            if offset < column - 1 {
                underline.push_str(if ch == '\t' { "    " } else { " " });
            } else if offset < column - 1 + length {
                underline.push_str(if ch == '\t' { "~~~~" } else { "~" });
            } else {
                break;
            }
        }
        if !underline.contains('~') {
            underline.push('~');
        }

        let line_display = line_text.replace('\t', "    ");
        let underline_display = if self.color {
            underline.red().to_string()
        } else {
            underline
        };
        Some(format!(
            "\n  {:>3}   {}\n        {}",
            line_num, line_display, underline_display
        ))
    }

    fn format_related(&mut self, related: &DiagnosticRelatedInformation) -> String {
        let location = self
            .format_location(&related.file, related.start)
            .unwrap_or_else(|| related.file.clone());
        let prefix = if self.color {
            "  Related".dimmed().to_string()
        } else {
            "  Related".to_string()
        };

        format!("{}: {} - {}", prefix, location, related.message_text)
    }

    fn format_location(&mut self, file: &str, offset: u32) -> Option<String> {
        if file.is_empty() {
            return None;
        }

        let (line, column) = self.position_for(file, offset)?;
        Some(format!("{}:{}:{}", file, line, column))
    }

    fn position_for(&mut self, file: &str, offset: u32) -> Option<(u32, u32)> {
        self.ensure_source(file)?;
        if !self.line_maps.contains_key(file) {
            let source = self.sources.get(file)?;
            let map = LineMap::build(source);
            self.line_maps.insert(file.to_string(), map);
        }

        let source = self.sources.get(file)?;
        let line_map = self.line_maps.get(file)?;
        let position = line_map.offset_to_position(offset, source);
        Some((position.line + 1, position.character + 1))
    }

    fn ensure_source(&mut self, file: &str) -> Option<()> {
        if !self.sources.contains_key(file) {
            let path = match &self.base_dir {
                Some(base) => base.join(file),
                None => PathBuf::from(file),
            };
            let contents = std::fs::read_to_string(path).ok()?;
            self.sources.insert(file.to_string(), contents);
        }
        Some(())
    }

    fn format_category(&self, category: DiagnosticCategory) -> String {
        let label = category.name();
        if !self.color {
            return label.to_string();
        }

        match category {
            DiagnosticCategory::Error => label.red().bold().to_string(),
            DiagnosticCategory::Warning => label.yellow().bold().to_string(),
            DiagnosticCategory::Suggestion => label.blue().bold().to_string(),
            DiagnosticCategory::Message => label.cyan().bold().to_string(),
        }
    }

    fn format_code(&self, code: u32) -> String {
        if code == 0 {
            return String::new();
        }

        let label = format_code(code);
        if self.color {
            label.bright_blue().to_string()
        } else {
            label
        }
    }
}
