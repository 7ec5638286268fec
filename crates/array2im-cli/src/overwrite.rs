use std::path::Path;

use anyhow::{bail, Result};

use crate::terminal::Console;

/// What to do when the output file already exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverwritePolicy {
    /// Prompt when interactive, refuse otherwise.
    Ask,
    Always,
    Never,
}

impl OverwritePolicy {
    pub fn from_flags(overwrite: bool, no_overwrite: bool) -> Self {
        match (overwrite, no_overwrite) {
            (true, _) => Self::Always,
            (_, true) => Self::Never,
            _ => Self::Ask,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Answer {
    Yes,
    No,
}

fn parse_answer(input: &str) -> Option<Answer> {
    match input.trim().to_ascii_uppercase().as_str() {
        "Y" | "YES" => Some(Answer::Yes),
        "N" | "NO" => Some(Answer::No),
        _ => None,
    }
}

/// Decide whether writing to `path` may go ahead.
///
/// Returns `Ok(())` when the file is absent or may be replaced; any refusal
/// is an error carrying the message to show.
pub fn check_destination(
    path: &Path,
    policy: OverwritePolicy,
    interactive: bool,
    console: &mut impl Console,
) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let shown = path.display();

    match policy {
        OverwritePolicy::Never => {
            bail!("Output file '{shown}' exists. Terminating because '-n' was specified.")
        }
        OverwritePolicy::Always => {
            console.notice(&format!(
                "Warning: Output file '{shown}' exists. Overwriting because '-y' was specified."
            ))?;
            Ok(())
        }
        OverwritePolicy::Ask if interactive => {
            let prompt =
                format!("Warning: Output file '{shown}' exists. Do you wish to overwrite file? (Y/N) ");
            loop {
                let Some(reply) = console.ask(&prompt)? else {
                    bail!("Operation aborted.");
                };
                match parse_answer(&reply) {
                    Some(Answer::Yes) => {
                        console.notice(&format!("Overwriting '{shown}'."))?;
                        console.notice("")?;
                        return Ok(());
                    }
                    Some(Answer::No) => bail!("Operation aborted."),
                    None => console.notice(&format!("Invalid answer: '{reply}'"))?,
                }
            }
        }
        OverwritePolicy::Ask => {
            bail!("Operation aborted. Cowardly refusing to overwrite '{shown}'.")
        }
    }
}
