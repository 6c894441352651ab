/// Indent-aware line buffer for emitted statements.
#[derive(Debug, Clone)]
pub struct CodeWriter {
    lines: Vec<String>,
    depth: usize,
    indent: String,
}

impl CodeWriter {
    pub fn new(indent: impl Into<String>) -> Self {
        Self {
            lines: Vec::new(),
            depth: 0,
            indent: indent.into(),
        }
    }

    /// Appends `text` at the current depth. Embedded newlines (for example
    /// from a lowered function literal) keep their relative indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let prefix = self.indent.repeat(self.depth);
        for piece in text.as_ref().split('\n') {
            if piece.is_empty() {
                self.lines.push(String::new());
            } else {
                self.lines.push(format!("{}{}", prefix, piece));
            }
        }
    }

    pub fn indent(&mut self) {
        self.depth += 1;
    }

    pub fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn finish(self, line_ending: &str) -> String {
        self.lines.join(line_ending)
    }
}
