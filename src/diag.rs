//! Diagnostic output.
//!
//! Recoverable failures (enumeration errors, property failures, format
//! rejections, read errors) produce one text line each. Where that line goes
//! is the embedder's choice: everything that can fail takes a
//! [`DiagnosticSink`], and the default is standard error.
//!
//! Failures are never surfaced through the query API; a slot that ran into
//! trouble simply reads as disconnected.

/// Line-oriented sink for diagnostic messages.
pub trait DiagnosticSink {
    /// Record one message. Implementations append their own line separator.
    fn write(&mut self, message: &str);
}

/// Default sink: one line per message on standard error.
#[derive(Debug, Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn write(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

/// Sink that collects messages in memory. Useful for embedding the library in
/// environments without a console, and for asserting on diagnostics in tests.
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Vec<String>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages recorded so far, oldest first.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Drop all recorded messages.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl DiagnosticSink for BufferSink {
    fn write(&mut self, message: &str) {
        self.lines.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_sink_keeps_messages_in_order() {
        let mut sink = BufferSink::new();
        sink.write("first");
        sink.write("second");
        assert_eq!(sink.lines(), ["first", "second"]);
        sink.clear();
        assert!(sink.lines().is_empty());
    }
}
