//! Terminal line reader for interactive decisions

use std::io;

use ctxprop_core::LineReader;
use rustyline::{error::ReadlineError, DefaultEditor};

/// Reads operator answers with line editing
pub struct TerminalReader {
    editor: DefaultEditor,
}

impl TerminalReader {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineReader for TerminalReader {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            // Ctrl-C and Ctrl-D both end the session; the run aborts.
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(ReadlineError::Io(e)) => Err(e),
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
        }
    }

    fn show(&mut self, message: &str) {
        println!("{}", message);
    }
}
