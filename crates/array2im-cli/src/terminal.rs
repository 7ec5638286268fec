use std::io::{self, BufRead, IsTerminal};

use console::{style, Term};

/// Where user-facing status lines go: stdout when it is a terminal,
/// otherwise stderr so that piped image data stays clean.
pub struct Messages {
    term: Term,
    to_stderr: bool,
}

impl Messages {
    pub fn detect() -> Self {
        let stdout = Term::stdout();
        if stdout.is_term() {
            Self {
                term: stdout,
                to_stderr: false,
            }
        } else {
            Self {
                term: Term::stderr(),
                to_stderr: true,
            }
        }
    }

    pub fn line(&self, msg: &str) -> io::Result<()> {
        self.term.write_line(msg)
    }

    /// Write without a newline and flush, for lines finished later.
    pub fn partial(&self, msg: &str) -> io::Result<()> {
        self.term.write_str(msg)?;
        self.term.flush()
    }

    pub fn warn(&self, msg: &str) -> io::Result<()> {
        let mut label = style("Warning:").yellow().bold();
        if self.to_stderr {
            label = label.for_stderr();
        }
        self.term.write_line(&format!("{label} {msg}"))
    }
}

/// Interaction needed to settle an overwrite conflict.
pub trait Console {
    fn notice(&mut self, msg: &str) -> io::Result<()>;

    /// Show `prompt` and read one answer. `None` means end of input.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

impl Console for Messages {
    fn notice(&mut self, msg: &str) -> io::Result<()> {
        self.line(msg)
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.partial(prompt)?;
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer)? == 0 {
            return Ok(None);
        }
        Ok(Some(answer.trim_end_matches(['\r', '\n']).to_string()))
    }
}

pub fn stdin_is_terminal() -> bool {
    io::stdin().is_terminal()
}

pub fn stdout_is_terminal() -> bool {
    Term::stdout().is_term()
}
