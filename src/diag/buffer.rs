//! Per-caller line buffer.
//!
//! Text is accumulated with `write!` and handed to the [`Log`] sink as one
//! complete line on [`LineBuffer::flush`], prefixed with the label of the
//! thread that created the buffer. Concurrent writers therefore never
//! interleave inside a line.

use std::fmt;
use std::thread;

use super::Log;

pub struct LineBuffer<'a> {
    log: &'a dyn Log,
    prefix: String,
    line: String,
}

impl<'a> LineBuffer<'a> {
    pub fn new(log: &'a dyn Log) -> Self {
        Self {
            log,
            prefix: thread_label(),
            line: String::new(),
        }
    }

    /// Emit the buffered text as one line and clear the buffer.
    /// Does nothing if nothing was written since the last flush.
    pub fn flush(&mut self) {
        if self.line.is_empty() {
            return;
        }
        self.log.log(&format!("{}: {}", self.prefix, self.line));
        self.line.clear();
    }

    /// Text written since the last flush.
    pub fn pending(&self) -> &str {
        &self.line
    }
}

impl fmt::Write for LineBuffer<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.line.push_str(s);
        Ok(())
    }
}

impl Drop for LineBuffer<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Thread name if it has one, otherwise its id.
fn thread_label() -> String {
    let current = thread::current();
    match current.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", current.id()),
    }
}
