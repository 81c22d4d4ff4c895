//! Hardened XML reader.
//!
//! Parsing is delegated to `xmloxide` with its entity-expansion quota, depth
//! limit and an entity resolver that never touches the filesystem or the
//! network. The parsed document is flattened into an [`Element`] tree for
//! binding and kept alongside it for DTD validation.

use std::sync::{Arc, Mutex};

use xmloxide::error::ParseError;
use xmloxide::parser::{parse_str_with_options, ExternalEntityRequest, ParseOptions};
use xmloxide::tree::{Attribute, NodeId, NodeKind};
use xmloxide::Document;

use super::tree::{Element, Node};
use super::DecodeError;

/// Entity expansions allowed per document, matching the common JAXP default.
pub const DEFAULT_MAX_ENTITY_EXPANSIONS: u32 = 64_000;

/// SEC-004: Cap on a single text node or attribute value.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 10 * 1024 * 1024;

/// SEC-003: Maximum element nesting depth.
pub const DEFAULT_MAX_DEPTH: u32 = 256;

pub const DEFAULT_MAX_ATTRIBUTES: u32 = 256;

/// Limits applied by every [`SecureParser`].
///
/// # Examples
///
/// ```
/// use gsafeed::xml::ParserSettings;
///
/// let settings = ParserSettings::new()
///     .max_entity_expansions(1_000)
///     .max_depth(64);
/// assert_eq!(settings.max_depth_limit(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserSettings {
    max_entity_expansions: u32,
    max_text_length: usize,
    max_depth: u32,
    max_attributes: u32,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            max_entity_expansions: DEFAULT_MAX_ENTITY_EXPANSIONS,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
            max_attributes: DEFAULT_MAX_ATTRIBUTES,
        }
    }
}

impl ParserSettings {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_entity_expansions(mut self, limit: u32) -> Self {
        self.max_entity_expansions = limit;
        self
    }

    #[must_use]
    pub fn max_text_length(mut self, bytes: usize) -> Self {
        self.max_text_length = bytes;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    #[must_use]
    pub fn max_attributes(mut self, count: u32) -> Self {
        self.max_attributes = count;
        self
    }

    pub fn max_depth_limit(&self) -> u32 {
        self.max_depth
    }

    pub fn max_entity_expansions_limit(&self) -> u32 {
        self.max_entity_expansions
    }

    /// Creates a parser with these limits. Parsers hold no state between
    /// calls; building one per document is cheap.
    pub fn build(self) -> SecureParser {
        SecureParser { settings: self }
    }

    /// SEC-002: every external entity resolves to empty text. The names are
    /// collected so validation can report them.
    fn parse_options(&self, external: Arc<Mutex<Vec<String>>>) -> ParseOptions {
        ParseOptions::default()
            .max_entity_expansions(self.max_entity_expansions)
            .max_depth(self.max_depth)
            .max_attributes(self.max_attributes)
            .max_text_length(self.max_text_length)
            .max_attribute_length(self.max_text_length)
            .entity_resolver(move |request: ExternalEntityRequest<'_>| {
                tracing::debug!(
                    entity = request.name,
                    system_id = request.system_id,
                    "Refusing to load external entity"
                );
                if let Ok(mut names) = external.lock() {
                    names.push(request.name.to_string());
                }
                Some(String::new())
            })
    }
}

/// The DOCTYPE declaration of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctype {
    pub name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    /// Declarations between `[` and `]`, re-serialized by the parser.
    pub internal_subset: Option<String>,
}

impl Doctype {
    pub fn has_external_id(&self) -> bool {
        self.public_id.is_some() || self.system_id.is_some()
    }
}

/// A general entity reference that contributed no text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntity {
    pub name: String,
    /// `true` for a declared external entity, `false` for an undeclared one.
    pub external: bool,
}

/// Result of a successful parse.
#[derive(Debug)]
pub struct ParsedDocument {
    pub doctype: Option<Doctype>,
    pub root: Element,
    /// Skipped references in document order.
    pub skipped_entities: Vec<SkippedEntity>,
    pub(crate) document: Document,
}

/// Per-call XML parser. Created by [`ParserSettings::build`].
#[derive(Debug, Clone, Copy)]
pub struct SecureParser {
    settings: ParserSettings,
}

impl SecureParser {
    /// Parses `input` into an element tree.
    ///
    /// The input encoding is taken from the byte order mark or the XML
    /// declaration. The DOCTYPE's external identifier is recorded but never
    /// dereferenced.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Parse`] for malformed or undecodable input,
    /// entity recursion, and any exceeded limit.
    pub fn parse(&self, input: &[u8]) -> Result<ParsedDocument, DecodeError> {
        let text = xmloxide::encoding::decode_to_utf8(input).map_err(|e| DecodeError::Parse {
            message: e.message,
            line: 1,
            column: 1,
        })?;
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(&text);

        let external = Arc::new(Mutex::new(Vec::new()));
        let options = self.settings.parse_options(Arc::clone(&external));
        let document = parse_str_with_options(text, &options).map_err(parse_error)?;
        let external: Vec<String> = external
            .lock()
            .map(|names| names.clone())
            .unwrap_or_default();

        let root_id = document.root_element().ok_or_else(|| DecodeError::Parse {
            message: "Premature end of file.".to_string(),
            line: 1,
            column: 1,
        })?;

        let mut conversion = Conversion {
            document: &document,
            external: &external,
            max_attributes: self.settings.max_attributes,
            skipped: Vec::new(),
        };
        let root = conversion.element(root_id)?;
        let skipped_entities = conversion.skipped;

        Ok(ParsedDocument {
            doctype: doctype(&document),
            root,
            skipped_entities,
            document,
        })
    }
}

fn parse_error(e: ParseError) -> DecodeError {
    DecodeError::Parse {
        message: e.message,
        line: u64::from(e.location.line),
        column: u64::from(e.location.column),
    }
}

fn doctype(document: &Document) -> Option<Doctype> {
    document
        .children(document.root())
        .find_map(|id| match &document.node(id).kind {
            NodeKind::DocumentType {
                name,
                system_id,
                public_id,
                internal_subset,
            } => Some(Doctype {
                name: name.clone(),
                public_id: public_id.clone(),
                system_id: system_id.clone(),
                internal_subset: internal_subset.clone(),
            }),
            _ => None,
        })
}

fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}

/// Walks the parsed document once, building the [`Element`] tree.
struct Conversion<'a> {
    document: &'a Document,
    external: &'a [String],
    max_attributes: u32,
    skipped: Vec<SkippedEntity>,
}

impl Conversion<'_> {
    fn element(&mut self, id: NodeId) -> Result<Element, DecodeError> {
        let document = self.document;
        let name = match &document.node(id).kind {
            NodeKind::Element { name, prefix, .. } => qualified(prefix.as_deref(), name),
            _ => String::new(),
        };

        let attributes = document.attributes(id);
        if attributes.len() > self.max_attributes as usize {
            return Err(DecodeError::Parse {
                message: format!(
                    "Element \"{}\" has more than {} attributes",
                    name, self.max_attributes
                ),
                line: 0,
                column: 0,
            });
        }

        let mut element = Element::new(name);
        element.attributes = attributes
            .iter()
            .map(|Attribute { name, prefix, value, .. }| {
                (qualified(prefix.as_deref(), name), value.clone())
            })
            .collect();
        self.content(id, &mut element)?;
        Ok(element)
    }

    /// Appends the children of `parent` to `target`. Entity references are
    /// looked through, so their replacement content lands in place.
    fn content(&mut self, parent: NodeId, target: &mut Element) -> Result<(), DecodeError> {
        let document = self.document;
        for child in document.children(parent) {
            match &document.node(child).kind {
                NodeKind::Element { .. } => {
                    let element = self.element(child)?;
                    target.children.push(Node::Element(element));
                }
                NodeKind::Text { content } | NodeKind::CData { content } => {
                    target.push_text(content);
                }
                NodeKind::EntityRef { name, value } => {
                    if self.external.iter().any(|e| e == name) {
                        self.skipped.push(SkippedEntity {
                            name: name.clone(),
                            external: true,
                        });
                    } else if value.is_none() {
                        self.skipped.push(SkippedEntity {
                            name: name.clone(),
                            external: false,
                        });
                    }
                    self.content(child, target)?;
                }
                // Comments and processing instructions carry no data
                _ => {}
            }
        }
        Ok(())
    }
}
