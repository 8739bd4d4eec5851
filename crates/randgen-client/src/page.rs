//! The surface the page controller renders into.
//!
//! [`Page`] stands in for the browser DOM: a blocking alert, the
//! `numbersOutput` element, and the submit controls.

use std::io::{self, Write};

pub trait Page {
    /// Shows a message the user must acknowledge.
    fn alert(&mut self, message: &str);

    /// Replaces the content of the output element. An empty string clears it.
    fn set_output(&mut self, text: &str);

    /// Appends to the content of the output element.
    fn append_output(&mut self, text: &str);

    /// Enables or disables the submit controls.
    fn set_controls_enabled(&mut self, enabled: bool);

    /// Called once a streamed output is complete.
    fn output_complete(&mut self) {}
}

/// In-memory page. Keeps everything that was rendered so it can be inspected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferPage {
    pub alerts: Vec<String>,
    pub output: String,
    pub controls_enabled: bool,
    pub completed_streams: usize,
}

impl Default for BufferPage {
    fn default() -> Self {
        Self {
            alerts: Vec::new(),
            output: String::new(),
            controls_enabled: true,
            completed_streams: 0,
        }
    }
}

impl Page for BufferPage {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_owned());
    }

    fn set_output(&mut self, text: &str) {
        text.clone_into(&mut self.output);
    }

    fn append_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        self.controls_enabled = enabled;
    }

    fn output_complete(&mut self) {
        self.completed_streams += 1;
    }
}

/// Renders to a terminal: output on `out`, alerts on `err`.
///
/// Replaced output is printed as a full line. Appended output is written as it
/// arrives and terminated with a newline once the stream completes.
pub struct TerminalPage<O, E> {
    out: O,
    err: E,
    line_open: bool,
}

impl TerminalPage<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TerminalPage<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            line_open: false,
        }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn end_line(&mut self) -> io::Result<()> {
        if self.line_open {
            self.line_open = false;
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn report(result: io::Result<()>) {
        if let Err(e) = result {
            tracing::warn!("Failed to write to terminal: {e}");
        }
    }
}

impl<O: Write, E: Write> Page for TerminalPage<O, E> {
    fn alert(&mut self, message: &str) {
        let result = writeln!(self.err, "{message}");
        Self::report(result);
    }

    fn set_output(&mut self, text: &str) {
        let result = self.end_line().and_then(|()| {
            if !text.is_empty() {
                writeln!(self.out, "{text}")?;
            }
            self.out.flush()
        });
        Self::report(result);
    }

    fn append_output(&mut self, text: &str) {
        self.line_open = true;
        let result = write!(self.out, "{text}").and_then(|()| self.out.flush());
        Self::report(result);
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        tracing::debug!(enabled, "Submit controls toggled");
    }

    fn output_complete(&mut self) {
        let result = self.end_line().and_then(|()| self.out.flush());
        Self::report(result);
    }
}
