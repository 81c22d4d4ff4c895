//! Secure XML reading and writing for feed documents.
//!
//! The pipeline is:
//!
//! 1. [`SecureParser`] parses with `xmloxide`, which reads the DOCTYPE and
//!    expands internal entities under its quota. External entities resolve to
//!    empty text and are never loaded.
//! 2. In [`ValidationMode::WithDtd`] the document is checked against the
//!    grammar its DOCTYPE names, using `xmloxide`'s DTD validator, and every
//!    finding is passed to a [`ValidationPolicy`].
//! 3. The expanded tree is bound to a typed document with quick-xml serde.
//!
//! # Security
//!
//! - SEC-002: external general and parameter entities are never dereferenced
//!   in either mode. The only external DTD ever read is the one bundled for
//!   the fixed public identifier.
//! - SEC-003: element depth and attribute count are bounded.
//! - SEC-004: entity expansions and their amplification are bounded by the
//!   parser, so nested entity bombs fail fast with [`DecodeError::Parse`].

mod codec;
mod events;
mod parser;
mod resolver;
mod tree;

use thiserror::Error;

pub use codec::DocumentCodec;
pub use events::{
    default_policy, lenient_policy, Location, Severity, ValidationEvent, ValidationPolicy,
};
pub use parser::{Doctype, ParsedDocument, ParserSettings, SecureParser, SkippedEntity};
pub use resolver::{bundled_dtd, resolve_entity, EntityResolver, EntitySource, PUBLIC_ID};
pub use tree::{Element, Node};

/// Whether decoding loads and enforces the DTD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationMode {
    /// Resolve the DOCTYPE through the resolver and validate against it.
    WithDtd,
    /// Ignore the external DTD and skip validation.
    WithoutDtd,
}

/// Errors that can occur while decoding a feed document.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Input is not well-formed XML, or a parser limit was exceeded.
    #[error("XML parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: u64,
        column: u64,
    },

    /// The validation policy refused to continue past this event.
    #[error("Feed validation failed: {0}")]
    Validation(ValidationEvent),

    /// The document is well-formed but does not fit the typed model.
    #[error("Failed to bind feed document: {0}")]
    Bind(String),
}

/// Errors that can occur while encoding a feed document.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Failed to serialize feed document: {0}")]
    Serialize(String),
}
