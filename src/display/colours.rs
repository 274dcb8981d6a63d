//! Colour management for CLI output
//!
//! Honours `NO_COLOR` and only colours output written to a terminal unless
//! colours are enabled explicitly.

use std::io::IsTerminal;
use colored::{ColoredString, Colorize};

/// Manages colour output for the CLI application
#[derive(Debug, Clone)]
pub struct ColourManager {
    enabled: bool,
}

impl ColourManager {
    /// Detect colour support from the environment
    pub fn new() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal();
        Self { enabled }
    }

    /// Create a ColourManager with explicit colour control
    pub fn with_colours(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Colours from the environment unless `--no-color` was given
    pub fn from_args(no_color_flag: bool) -> Self {
        if no_color_flag {
            Self::with_colours(false)
        } else {
            Self::new()
        }
    }

    pub fn colours_enabled(&self) -> bool {
        self.enabled
    }

    fn paint(&self, text: &str, paint: fn(&str) -> ColoredString) -> ColoredString {
        if self.enabled {
            paint(text)
        } else {
            text.normal()
        }
    }

    pub fn error(&self, text: &str) -> ColoredString {
        self.paint(text, |t| t.red().bold())
    }

    pub fn warning(&self, text: &str) -> ColoredString {
        self.paint(text, |t| t.yellow())
    }

    pub fn info(&self, text: &str) -> ColoredString {
        self.paint(text, |t| t.blue())
    }

    pub fn success(&self, text: &str) -> ColoredString {
        self.paint(text, |t| t.green())
    }

    pub fn highlight(&self, text: &str) -> ColoredString {
        self.paint(text, |t| t.cyan().bold())
    }
}

impl Default for ColourManager {
    fn default() -> Self {
        Self::new()
    }
}
