use std::fmt;

use super::DecodeError;

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
    FatalError,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
            Severity::FatalError => f.write_str("fatal error"),
        }
    }
}

/// Where in the input a validation finding was raised.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    /// 1-based line of the element that triggered the event.
    pub line: u64,
    /// 1-based column of the element that triggered the event.
    pub column: u64,
    /// Element or attribute name the event is about, when there is one.
    pub node: Option<String>,
}

/// A single finding produced while checking a document against its DTD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationEvent {
    pub severity: Severity,
    pub message: String,
    pub location: Option<Location>,
}

impl ValidationEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for ValidationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(
                f,
                "{} at line {}, column {}: {}",
                self.severity, loc.line, loc.column, self.message
            ),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Decides whether decoding continues after a validation event.
///
/// Returning `true` keeps parsing; `false` aborts the decode with
/// [`DecodeError::Validation`](super::DecodeError::Validation).
pub type ValidationPolicy<'a> = dyn Fn(&ValidationEvent) -> bool + Send + Sync + 'a;

/// Passes `event` to `policy`, turning a refusal into an error.
pub(crate) fn report(policy: &ValidationPolicy<'_>, event: ValidationEvent) -> Result<(), DecodeError> {
    if policy(&event) {
        Ok(())
    } else {
        Err(DecodeError::Validation(event))
    }
}

/// Warnings are logged and tolerated; errors and fatal errors abort.
pub fn default_policy(event: &ValidationEvent) -> bool {
    match event.severity {
        Severity::Warning => {
            tracing::warn!(event = %event, "Feed validation warning");
            true
        }
        Severity::Error | Severity::FatalError => false,
    }
}

/// Tolerates every event. Only useful for salvaging documents the caller
/// already knows to be slightly off-grammar.
pub fn lenient_policy(event: &ValidationEvent) -> bool {
    tracing::debug!(event = %event, "Ignoring feed validation event");
    true
}
