//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Output sinks
//! - This module - Interactive prompts and user input handling

use std::io::{self, Write};

use crate::error::{ReleaseError, Result};

pub mod formatter;

pub use formatter::{display_error, ConsoleSpeaker, Speaker, Tone, Transcript};

/// Source of operator decisions and input
pub trait Prompter {
    /// Ask a yes/no question; the default answer is no.
    fn confirm(&self, prompt: &str) -> Result<bool>;

    /// Ask for a line of free text
    fn input(&self, prompt: &str) -> Result<String>;
}

/// Asks on stdout and reads answers from stdin
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    /// Accepts "y" or "yes" (case-insensitive) as confirmation.
    fn confirm(&self, prompt: &str) -> Result<bool> {
        print!("{} [y/N]: ", prompt);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        let response = input.trim().to_lowercase();
        Ok(response == "y" || response == "yes")
    }

    fn input(&self, prompt: &str) -> Result<String> {
        print!("{}", prompt);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }
}

/// Ask for confirmation and turn a "no" into [ReleaseError::Aborted].
pub fn confirm_or_abort(prompter: &dyn Prompter, prompt: &str) -> Result<()> {
    if prompter.confirm(prompt)? {
        Ok(())
    } else {
        Err(ReleaseError::Aborted)
    }
}
