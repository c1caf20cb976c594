//! Output emitter.
//!
//! Code generation writes through an [`Emitter`]; [`Printer`] adds the
//! indentation bookkeeping on top.

/// Sink for generated text.
pub trait Emitter {
    /// Emit a text fragment.
    fn emit(&mut self, text: &str);

    /// Emit a newline (Unix-style `\n`).
    fn emit_newline(&mut self);

    /// Emit indentation (4 spaces per level).
    fn emit_indent(&mut self, level: usize);

    /// Emit a single space.
    fn emit_space(&mut self);
}

/// String-based emitter for in-memory generation.
///
/// Output is only handed out once a run has succeeded, so this is the only
/// emitter the pipeline needs.
#[derive(Default)]
pub struct StringEmitter {
    buffer: String,
}

impl StringEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: String::with_capacity(capacity),
        }
    }

    /// Get the generated output.
    pub fn output(self) -> String {
        self.buffer
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Ensure the output ends with exactly one newline.
    pub fn ensure_trailing_newline(&mut self) {
        while self.buffer.ends_with("\n\n") {
            self.buffer.pop();
        }
        if !self.buffer.is_empty() && !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
    }
}

impl Emitter for StringEmitter {
    fn emit(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn emit_newline(&mut self) {
        self.buffer.push('\n');
    }

    fn emit_indent(&mut self, level: usize) {
        for _ in 0..level * 4 {
            self.buffer.push(' ');
        }
    }

    fn emit_space(&mut self) {
        self.buffer.push(' ');
    }
}

/// Line-oriented writer with an indentation level.
pub struct Printer<E: Emitter> {
    out: E,
    level: usize,
}

impl<E: Emitter> Printer<E> {
    pub fn new(out: E) -> Self {
        Printer { out, level: 0 }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// One indented line. An empty `text` gives a blank line.
    pub fn line(&mut self, text: &str) {
        if !text.is_empty() {
            self.out.emit_indent(self.level);
            self.out.emit(text);
        }
        self.out.emit_newline();
    }

    pub fn blank(&mut self) {
        self.out.emit_newline();
    }

    /// `head {`, then indent.
    pub fn open(&mut self, head: &str) {
        self.out.emit_indent(self.level);
        self.out.emit(head);
        self.out.emit_space();
        self.out.emit("{");
        self.out.emit_newline();
        self.level += 1;
    }

    /// Dedent, then `}` followed by `tail`.
    pub fn close(&mut self, tail: &str) {
        debug_assert!(self.level > 0, "close without open");
        self.level = self.level.saturating_sub(1);
        self.out.emit_indent(self.level);
        self.out.emit("}");
        self.out.emit(tail);
        self.out.emit_newline();
    }

    pub fn finish(self) -> E {
        self.out
    }
}
