//! Indentation-aware text sink shared by the language writers.

/// Accumulates the lines of one generated file
#[derive(Debug, Clone)]
pub struct LanguageWriter {
    buffer: String,
    indent_unit: &'static str,
    level: usize,
}

impl LanguageWriter {
    pub fn new(indent_unit: &'static str) -> Self {
        Self {
            buffer: String::new(),
            indent_unit,
            level: 0,
        }
    }

    pub fn increase_indent(&mut self) {
        self.level += 1;
    }

    pub fn decrease_indent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    /// Write one line at the current indentation; empty lines carry no indentation
    pub fn write_line(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        if !line.is_empty() {
            for _ in 0..self.level {
                self.buffer.push_str(self.indent_unit);
            }
            self.buffer.push_str(line);
        }
        self.buffer.push('\n');
    }

    pub fn write_lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.write_line(line);
        }
    }

    /// One blank line, never two in a row
    pub fn blank_line(&mut self) {
        if !self.buffer.is_empty() && !self.buffer.ends_with("\n\n") {
            self.buffer.push('\n');
        }
    }

    /// Write `opener` and indent what follows
    pub fn start_block(&mut self, opener: impl AsRef<str>) {
        self.write_line(opener);
        self.increase_indent();
    }

    /// Outdent and write `closer`, when there is one
    pub fn end_block(&mut self, closer: Option<&str>) {
        self.decrease_indent();
        if let Some(closer) = closer {
            // A block never ends on a blank line
            while self.buffer.ends_with("\n\n") {
                self.buffer.pop();
            }
            self.write_line(closer);
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// The file content, with exactly one trailing newline
    pub fn finish(mut self) -> String {
        while self.buffer.ends_with("\n\n") {
            self.buffer.pop();
        }
        if !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_indent_their_content() {
        let mut writer = LanguageWriter::new("    ");
        writer.start_block("class A {");
        writer.write_line("int x;");
        writer.blank_line();
        writer.end_block(Some("}"));
        assert_eq!(writer.finish(), "class A {\n    int x;\n}\n");
    }

    #[test]
    fn test_blank_lines_collapse() {
        let mut writer = LanguageWriter::new("\t");
        writer.blank_line();
        writer.write_line("a");
        writer.blank_line();
        writer.blank_line();
        writer.write_line("b");
        assert_eq!(writer.finish(), "a\n\nb\n");
    }

    #[test]
    fn test_python_blocks_have_no_closer() {
        let mut writer = LanguageWriter::new("    ");
        writer.start_block("def f():");
        writer.write_line("pass");
        writer.end_block(None);
        writer.write_line("x = 1");
        assert_eq!(writer.level(), 0);
        assert_eq!(writer.finish(), "def f():\n    pass\nx = 1\n");
    }
}
