// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub label: Option<String>,
    pub help: Option<String>,
    pub notes: Vec<String>,
    pub cause: Option<Box<Diagnostic>>,
}

impl Diagnostic {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            label: None,
            help: None,
            notes: vec![],
            cause: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_cause(mut self, cause: Diagnostic) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(label) = &self.label {
            write!(f, " ({})", label)?;
        }
        if let Some(help) = &self.help {
            write!(f, "\nhelp: {}", help)?;
        }
        for note in &self.notes {
            write!(f, "\nnote: {}", note)?;
        }
        if let Some(cause) = &self.cause {
            write!(f, "\ncaused by: {}", cause)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Diagnostic;

    #[test]
    fn test_render() {
        let diagnostic = Diagnostic::new("TY_001", "shape mismatch")
            .with_help("operands must broadcast")
            .with_note("left: var * float8");

        let out = diagnostic.to_string();
        assert!(out.starts_with("[TY_001] shape mismatch"));
        assert!(out.contains("help: operands must broadcast"));
        assert!(out.contains("note: left: var * float8"));
    }
}
