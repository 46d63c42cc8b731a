//! Indentation-aware text output.

/// Line-oriented writer that indents lazily: indentation is written with the
/// first text of a line, so blank lines never carry trailing whitespace.
#[derive(Debug)]
pub struct SourceWriter {
    output: String,
    indent_level: u32,
    indent_str: &'static str,
    new_line: &'static str,
    at_line_start: bool,
}

impl SourceWriter {
    #[must_use]
    pub fn new(indent_str: &'static str, new_line: &'static str) -> Self {
        Self {
            output: String::with_capacity(1024),
            indent_level: 0,
            indent_str,
            new_line,
            at_line_start: true,
        }
    }

    pub fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.at_line_start {
            for _ in 0..self.indent_level {
                self.output.push_str(self.indent_str);
            }
            self.at_line_start = false;
        }
        self.output.push_str(text);
    }

    /// Write `text` as a string literal.
    pub fn write_string_literal(&mut self, text: &str) {
        let mut literal = String::with_capacity(text.len() + 2);
        literal.push('"');
        for c in text.chars() {
            match c {
                '"' => literal.push_str("\\\""),
                '\\' => literal.push_str("\\\\"),
                '\n' => literal.push_str("\\n"),
                '\r' => literal.push_str("\\r"),
                '\t' => literal.push_str("\\t"),
                '\0' => literal.push_str("\\0"),
                c if (c as u32) < 0x20 => {
                    literal.push_str(&format!("\\u{:04X}", c as u32));
                }
                _ => literal.push(c),
            }
        }
        literal.push('"');
        self.write(&literal);
    }

    /// End the current line.
    pub fn write_line(&mut self) {
        self.output.push_str(self.new_line);
        self.at_line_start = true;
    }

    /// Write `text` and end the line.
    pub fn line(&mut self, text: &str) {
        self.write(text);
        self.write_line();
    }

    /// Write `{` on its own line and indent.
    pub fn open_block(&mut self) {
        self.line("{");
        self.increase_indent();
    }

    /// Dedent and write `closing` (usually `}`) on its own line.
    pub fn close_block(&mut self, closing: &str) {
        self.decrease_indent();
        self.line(closing);
    }

    pub const fn increase_indent(&mut self) {
        self.indent_level += 1;
    }

    pub const fn decrease_indent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    #[must_use]
    pub const fn indent_level(&self) -> u32 {
        self.indent_level
    }

    #[must_use]
    pub fn is_at_line_start(&self) -> bool {
        self.at_line_start
    }

    #[must_use]
    pub fn finish(self) -> String {
        self.output
    }
}
