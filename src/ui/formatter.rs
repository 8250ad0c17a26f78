//! Operator-facing output.
//!
//! Release steps report through a [Speaker] handed to them, so the same code
//! can print to the terminal or record into a [Transcript] under test.

use std::sync::Mutex;

use console::style;

use crate::boundary::BoundaryWarning;

/// How a message should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Status,
    Success,
    Warning,
    Error,
}

/// Sink for messages meant for the operator
pub trait Speaker {
    fn speak(&self, tone: Tone, message: &str);

    fn say(&self, message: &str) {
        self.speak(Tone::Plain, message);
    }

    fn status(&self, message: &str) {
        self.speak(Tone::Status, message);
    }

    fn success(&self, message: &str) {
        self.speak(Tone::Success, message);
    }

    fn warning(&self, warning: &BoundaryWarning) {
        self.speak(Tone::Warning, &warning.to_string());
    }

    fn error(&self, message: &str) {
        self.speak(Tone::Error, message);
    }
}

/// Prints to the terminal: errors and warnings on stderr, the rest on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSpeaker;

impl Speaker for ConsoleSpeaker {
    fn speak(&self, tone: Tone, message: &str) {
        match tone {
            Tone::Plain => println!("{}", message),
            Tone::Status => println!("{} {}", style("→").yellow(), message),
            Tone::Success => println!("{} {}", style("✓").green(), message),
            Tone::Warning => eprintln!("{} {}", style("⚠ WARNING:").yellow(), message),
            Tone::Error => eprintln!("{} {}", style("ERROR:").red(), message),
        }
    }
}

/// Records everything said, for assertions in tests.
#[derive(Debug, Default)]
pub struct Transcript {
    lines: Mutex<Vec<(Tone, String)>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Tone, String)> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Whether any recorded message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(_, message)| message.contains(needle))
    }
}

impl Speaker for Transcript {
    fn speak(&self, tone: Tone, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((tone, message.to_string()));
        }
    }
}

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    ConsoleSpeaker.error(message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_records_tones() {
        let transcript = Transcript::new();
        transcript.say("Updating Cargo.lock");
        transcript.success("Created tag v0.5.1");
        transcript.warning(&BoundaryWarning::PullreqsNotConfigured {
            upstream: "MaterializeInc/materialize".to_string(),
        });

        let lines = transcript.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], (Tone::Plain, "Updating Cargo.lock".to_string()));
        assert_eq!(lines[1].0, Tone::Success);
        assert_eq!(lines[2].0, Tone::Warning);
        assert!(transcript.contains("pullreqs"));
        assert!(!transcript.contains("nothing like this"));
    }

    #[test]
    fn test_console_speaker() {
        // Visual verification test - output is printed to stdout/stderr
        ConsoleSpeaker.status("test status");
        ConsoleSpeaker.error("test error");
    }
}
