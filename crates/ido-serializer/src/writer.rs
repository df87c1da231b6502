use crate::Serialized;

/// Line-oriented output buffer with indentation and collected warnings.
pub(crate) struct CodeWriter {
    unit: String,
    depth: usize,
    lines: Vec<String>,
    warnings: Vec<String>,
}

impl CodeWriter {
    pub(crate) fn new(indent: usize) -> Self {
        Self {
            unit: " ".repeat(indent),
            depth: 0,
            lines: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        self.lines
            .push(format!("{}{text}", self.unit.repeat(self.depth)));
    }

    /// Write without indentation (preamble and comment blocks).
    pub(crate) fn raw(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    pub(crate) fn indent(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub(crate) fn finish(self) -> Serialized {
        let mut code = self.lines.join("\n");
        code.push('\n');
        Serialized {
            code,
            warnings: self.warnings,
        }
    }
}
