//! Line-based terminal I/O shared by the interactive commands.

use std::fmt::Display;
use std::io::{BufRead, Stdout, StdinLock, Write};

use anyhow::{Context, Result};

/// Prompt/answer channel. Generic so tests can script the input.
pub struct Console<R, W> {
    input: R,
    output: W,
}

pub type StdConsole = Console<StdinLock<'static>, Stdout>;

/// Console on the process's stdin/stdout.
pub fn stdio() -> StdConsole {
    Console::new(std::io::stdin().lock(), std::io::stdout())
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `prompt` and read one line without its line ending.
    /// Returns `None` at end of input.
    pub fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}").context("failed to write prompt")?;
        self.output.flush().context("failed to flush output")?;

        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .context("failed to read input")?;
        if n == 0 {
            // Keep the next output off the prompt line.
            writeln!(self.output).context("failed to write output")?;
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    pub fn say(&mut self, line: impl Display) -> Result<()> {
        writeln!(self.output, "{line}").context("failed to write output")
    }

    pub fn blank(&mut self) -> Result<()> {
        writeln!(self.output).context("failed to write output")
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

/// `x`, `exit` and `quit` leave the current mode.
pub fn is_exit(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "x" | "exit" | "quit"
    )
}

/// Question-prompt keys that are not answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizKey {
    /// `x`: leave the quiz.
    Stop,
    /// `?`: show the answer and skip the question unscored.
    Reveal,
    /// `m`: put the current item into the mistake book.
    Mark,
}

/// Only bare single-key tokens count, so words like `exit` stay answerable.
pub fn quiz_key(input: &str) -> Option<QuizKey> {
    match input.trim() {
        "x" | "X" => Some(QuizKey::Stop),
        "?" | "？" => Some(QuizKey::Reveal),
        "m" | "M" => Some(QuizKey::Mark),
        _ => None,
    }
}
