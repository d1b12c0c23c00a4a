//! Structured diagnostics raised while compiling an API description.
//!
//! The core never prints anything. Warnings from the validation rules and
//! subtree-scoped input errors from resolution are handed to a
//! [`DiagnosticsCollector`] supplied by the caller.

// Internal imports (std, crate)
use std::fmt;

use crate::Error;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Generation proceeds, the description likely has a quality issue
    Warning,
    /// Part of the description was not generated
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single finding, optionally located by a JSON pointer into the description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
}

impl Diagnostic {
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.into(),
            message: message.into(),
            pointer: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            pointer: None,
        }
    }

    /// Attach the location of the offending element
    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.pointer = Some(pointer.into());
        self
    }

    /// Turn a subtree-scoped error into an error diagnostic
    pub fn from_error(code: impl Into<String>, error: &Error) -> Self {
        match error {
            Error::Input { pointer, message } => {
                Self::error(code, message.clone()).with_pointer(pointer.clone())
            }
            other => Self::error(code, other.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.severity, self.code, self.message)?;
        if let Some(pointer) = &self.pointer {
            write!(f, " ({pointer})")?;
        }
        Ok(())
    }
}

/// Sink for diagnostics raised by the core
pub trait DiagnosticsCollector {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticsCollector for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Default collector keeping diagnostics in report order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    /// Whether a diagnostic with the given code was reported
    pub fn contains_code(&self, code: &str) -> bool {
        self.items.iter().any(|d| d.code == code)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(diagnostics);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl DiagnosticsCollector for Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::trace!("diagnostic reported: {}", diagnostic);
        self.items.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_keeps_report_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report(Diagnostic::warning("GetWithBody", "first"));
        diagnostics.report(
            Diagnostic::error("composition", "second").with_pointer("#/components/schemas/A"),
        );

        let codes: Vec<_> = diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, ["GetWithBody", "composition"]);
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.warnings().count(), 1);
        assert!(diagnostics.contains_code("composition"));
    }

    #[test]
    fn test_display_includes_pointer() {
        let diagnostic =
            Diagnostic::warning("NoServerEntry", "no servers").with_pointer("#/servers");
        assert_eq!(
            diagnostic.to_string(),
            "warning [NoServerEntry] no servers (#/servers)"
        );
    }

    #[test]
    fn test_from_input_error_keeps_pointer() {
        let error = Error::input("#/components/schemas/A", "bad allOf");
        let diagnostic = Diagnostic::from_error("composition", &error);
        assert!(diagnostic.is_error());
        assert_eq!(diagnostic.pointer.as_deref(), Some("#/components/schemas/A"));
        assert_eq!(diagnostic.message, "bad allOf");
    }
}
