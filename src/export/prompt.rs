use std::io::{BufRead, IsTerminal};

use crate::error::{ExportError, Result};

/// Operator interaction used by the export flows.
pub trait Prompt {
    /// Ask a question and return the answer, or `None` once input is exhausted.
    fn ask(&mut self, question: &str) -> Result<Option<String>>;

    /// Show a status line to the operator.
    fn notice(&mut self, message: &str);
}

/// Reads answers from the terminal. Falls back to plain line reads when stdin
/// is piped so scripted invocations still work.
pub struct ConsolePrompt {
    interactive: bool,
}

impl ConsolePrompt {
    pub fn new() -> Self {
        Self {
            interactive: std::io::stdin().is_terminal(),
        }
    }
}

impl Default for ConsolePrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompt for ConsolePrompt {
    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        if self.interactive {
            let answer: String = dialoguer::Input::new()
                .with_prompt(question)
                .allow_empty(true)
                .interact_text()
                .map_err(|e| ExportError::Input(format!("failed to read input: {e}")))?;
            return Ok(Some(answer));
        }

        println!("{question}: ");
        let mut line = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| ExportError::Input(format!("failed to read input: {e}")))?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn notice(&mut self, message: &str) {
        println!("{message}");
    }
}

#[cfg(test)]
pub use scripted::ScriptedPrompt;
