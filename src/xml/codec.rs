//! Decoding and encoding of whole feed documents.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use xmloxide::validation::dtd::{parse_dtd, validate, Dtd};
use xmloxide::validation::ValidationError;

use super::events::{default_policy, report, Location, Severity, ValidationEvent, ValidationPolicy};
use super::parser::{ParsedDocument, ParserSettings};
use super::resolver::{bundled_dtd, resolve_entity, EntityResolver, PUBLIC_ID};
use super::tree::Element;
use super::{DecodeError, EncodeError, ValidationMode};
use crate::feed::date::parse_rfc822;
use crate::feed::{Gsafeed, Xmlgroups};

/// Reads and writes one feed grammar.
///
/// A codec is immutable configuration and can be shared freely; every call
/// builds its own parser.
///
/// # Examples
///
/// ```
/// use gsafeed::xml::{DocumentCodec, ValidationMode};
///
/// let codec = DocumentCodec::gsafeed();
/// let feed = codec
///     .decode(
///         br#"<gsafeed><header><datasource>sample</datasource><feedtype>full</feedtype></header>
///             <group><record url="http://www.example.com/hello01" mimetype="text/plain"/></group>
///             </gsafeed>"#,
///         ValidationMode::WithoutDtd,
///     )
///     .unwrap();
/// assert_eq!(feed.header.datasource, "sample");
/// ```
#[derive(Debug, Clone)]
pub struct DocumentCodec<T> {
    root: &'static str,
    settings: ParserSettings,
    date_attributes: &'static [(&'static str, &'static str)],
    _document: PhantomData<fn() -> T>,
}

impl DocumentCodec<Gsafeed> {
    pub fn gsafeed() -> Self {
        Self {
            root: "gsafeed",
            settings: ParserSettings::default(),
            date_attributes: &[("record", "last-modified")],
            _document: PhantomData,
        }
    }
}

impl DocumentCodec<Xmlgroups> {
    pub fn xmlgroups() -> Self {
        Self {
            root: "xmlgroups",
            settings: ParserSettings::default(),
            date_attributes: &[],
            _document: PhantomData,
        }
    }
}

impl<T> DocumentCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Replaces the parser limits.
    #[must_use]
    pub fn with_settings(mut self, settings: ParserSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn root_element(&self) -> &'static str {
        self.root
    }

    /// Decodes a document with the bundled resolver and the default policy.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Parse`] if the input is not well-formed or a parser
    ///   limit is hit
    /// - [`DecodeError::Validation`] if `mode` is [`ValidationMode::WithDtd`]
    ///   and the document breaks its grammar
    /// - [`DecodeError::Bind`] if the tree does not fit the typed document
    pub fn decode(&self, input: &[u8], mode: ValidationMode) -> Result<T, DecodeError> {
        self.decode_with(input, mode, &resolve_entity, &default_policy)
    }

    /// Decodes a document with a caller-supplied resolver and policy.
    ///
    /// The resolver is consulted only in [`ValidationMode::WithDtd`], for the
    /// DOCTYPE's external identifier. Entity declarations in the document
    /// itself never reach it.
    pub fn decode_with(
        &self,
        input: &[u8],
        mode: ValidationMode,
        resolver: &EntityResolver<'_>,
        policy: &ValidationPolicy<'_>,
    ) -> Result<T, DecodeError> {
        let mut document = self.settings.build().parse(input)?;
        if mode == ValidationMode::WithDtd {
            self.validate(&mut document, resolver, policy)?;
        }
        self.bind(&document.root)
    }

    /// Encodes a document as UTF-8 XML with the feed DOCTYPE.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if serialization fails.
    pub fn encode(&self, document: &T) -> Result<Vec<u8>, EncodeError> {
        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::with_root(&mut body, Some(self.root))
            .map_err(|e| EncodeError::Serialize(e.to_string()))?;
        serializer.indent(' ', 2);
        document
            .serialize(serializer)
            .map_err(|e| EncodeError::Serialize(e.to_string()))?;

        let mut out = String::with_capacity(body.len() + 128);
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!(
            "<!DOCTYPE {} PUBLIC \"{}\" \"\">\n",
            self.root, PUBLIC_ID
        ));
        out.push_str(&body);
        out.push('\n');
        Ok(out.into_bytes())
    }

    fn validate(
        &self,
        document: &mut ParsedDocument,
        resolver: &EntityResolver<'_>,
        policy: &ValidationPolicy<'_>,
    ) -> Result<(), DecodeError> {
        // The grammar is named by the document, not by this codec
        let name = match &document.doctype {
            Some(doctype) => doctype.name.clone(),
            None => document.root.name.clone(),
        };

        for skipped in &document.skipped_entities {
            let message = if skipped.external {
                format!(
                    "The external entity \"{}\" was referenced, but external entities are disabled.",
                    skipped.name
                )
            } else {
                format!("The entity \"{}\" was referenced, but not declared.", skipped.name)
            };
            report(
                policy,
                ValidationEvent::new(Severity::Error, message).at(Location {
                    node: Some(skipped.name.clone()),
                    ..Location::default()
                }),
            )?;
        }

        if let Some(grammar) = self.grammar(document, &name, resolver, policy)? {
            if grammar.elements.is_empty() {
                report(
                    policy,
                    ValidationEvent::new(
                        Severity::Error,
                        format!("Element type \"{}\" must be declared.", document.root.name),
                    ),
                )?;
            }

            let result = validate(&mut document.document, &grammar);
            for error in &result.errors {
                report(policy, grammar_event(Severity::Error, error))?;
            }
            for warning in &result.warnings {
                report(policy, grammar_event(Severity::Warning, warning))?;
            }
        }

        self.check_dates(&document.root, policy)
    }

    /// Builds the grammar for `name`: the internal subset, then whatever the
    /// resolver returns for the external identifier. Earlier declarations win.
    ///
    /// Returns `None` when no grammar is known and the policy tolerated that.
    fn grammar(
        &self,
        document: &ParsedDocument,
        name: &str,
        resolver: &EntityResolver<'_>,
        policy: &ValidationPolicy<'_>,
    ) -> Result<Option<Dtd>, DecodeError> {
        let Some(doctype) = &document.doctype else {
            let Some(text) = bundled_dtd(name) else {
                report(
                    policy,
                    ValidationEvent::new(
                        Severity::Error,
                        format!("No grammar is known for root element \"{}\".", name),
                    ),
                )?;
                return Ok(None);
            };
            report(
                policy,
                ValidationEvent::new(
                    Severity::Warning,
                    format!(
                        "Document has no DOCTYPE; validating against the bundled \"{}\" grammar.",
                        name
                    ),
                ),
            )?;
            return read_grammar(text, "bundled DTD").map(Some);
        };

        let mut grammar = match &doctype.internal_subset {
            Some(subset) => read_grammar(subset, "DTD internal subset")?,
            None => Dtd::default(),
        };
        if doctype.has_external_id() {
            let source = resolver(
                name,
                doctype.public_id.as_deref(),
                doctype.system_id.as_deref(),
            );
            if !source.text().is_empty() {
                let external = read_grammar(source.text(), "external DTD")?;
                merge_declarations(&mut grammar, external);
            }
        }
        Ok(Some(grammar))
    }

    fn check_dates(&self, root: &Element, policy: &ValidationPolicy<'_>) -> Result<(), DecodeError> {
        for element in root.descendants() {
            for (element_name, attribute) in self.date_attributes {
                if element.name != *element_name {
                    continue;
                }
                if let Some(value) = element.attribute(attribute) {
                    if parse_rfc822(value).is_none() {
                        report(
                            policy,
                            ValidationEvent::new(
                                Severity::Error,
                                format!("Unparseable date: \"{}\"", value),
                            )
                            .at(Location {
                                node: Some(attribute.to_string()),
                                ..Location::default()
                            }),
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    fn bind(&self, root: &Element) -> Result<T, DecodeError> {
        if root.name != self.root {
            return Err(DecodeError::Bind(format!(
                "Expected root element \"{}\", found \"{}\"",
                self.root, root.name
            )));
        }
        let xml = root.to_xml().map_err(|e| DecodeError::Bind(e.to_string()))?;
        quick_xml::de::from_str(&xml).map_err(|e| DecodeError::Bind(e.to_string()))
    }
}

fn read_grammar(text: &str, what: &str) -> Result<Dtd, DecodeError> {
    parse_dtd(text).map_err(|e| DecodeError::Parse {
        message: format!("error in {}: {}", what, e.message),
        line: u64::from(e.location.line),
        column: u64::from(e.location.column),
    })
}

/// Adds the declarations of `later` that `grammar` does not already make.
fn merge_declarations(grammar: &mut Dtd, later: Dtd) {
    for (name, decl) in later.elements {
        grammar.elements.entry(name).or_insert(decl);
    }
    for (element, decls) in later.attributes {
        let declared = grammar.attributes.entry(element).or_default();
        for decl in decls {
            if !declared
                .iter()
                .any(|d| d.attribute_name == decl.attribute_name)
            {
                declared.push(decl);
            }
        }
    }
}

fn grammar_event(severity: Severity, error: &ValidationError) -> ValidationEvent {
    let event = ValidationEvent::new(severity, error.message.clone());
    match error.line {
        Some(line) => event.at(Location {
            line: line as u64,
            column: error.column.unwrap_or(0) as u64,
            node: None,
        }),
        None => event,
    }
}
