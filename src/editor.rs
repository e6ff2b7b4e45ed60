use std::fmt;

use rustyline::{error::ReadlineError, Config, DefaultEditor};

use crate::errors::Result;

/// Interactive line source with in-memory history.
pub struct Editor {
    internal: DefaultEditor,
    /// The total number of history items ever saved
    history_count: usize,
}

impl Editor {
    pub fn new() -> Result<Editor> {
        let config = Config::builder()
            .auto_add_history(false)
            .history_ignore_space(true)
            .build();

        Ok(Editor {
            internal: DefaultEditor::with_config(config)?,
            history_count: 0,
        })
    }

    /// Reads one line after displaying `prompt`.
    ///
    /// Returns `None` at end of input. An interrupt (Ctrl-C) discards the
    /// line being edited and yields an empty line.
    pub fn readline(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.internal.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(e) => Err(e.into()),
        }
    }

    pub fn add_history_entry(&mut self, line: &str) {
        match self.internal.add_history_entry(line) {
            Ok(true) => self.history_count += 1,
            Ok(false) => (),
            Err(e) => log::warn!("unable to add history entry: {}", e),
        }
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Editor {{ history_count: {} }}", self.history_count)
    }
}
