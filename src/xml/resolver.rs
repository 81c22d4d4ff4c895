//! DOCTYPE external identifier resolution.
//!
//! Nothing here touches the filesystem or the network. The only identifier
//! that resolves to real content is [`PUBLIC_ID`], and it resolves to a DTD
//! compiled into the binary.

/// Public identifier shared by both feed grammars.
pub const PUBLIC_ID: &str = "-//Google//DTD GSA Feeds//EN";

pub(crate) const GSAFEED_DTD: &str = include_str!("../../dtd/gsafeed.dtd");
pub(crate) const GROUPSFEED_DTD: &str = include_str!("../../dtd/groupsfeed.dtd");

/// What an external identifier resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitySource {
    /// A DTD bundled with the crate.
    Bundled(&'static str),
    /// Empty replacement text. Used for every identifier that is not ours.
    Empty,
}

impl EntitySource {
    pub fn text(&self) -> &'static str {
        match self {
            EntitySource::Bundled(text) => text,
            EntitySource::Empty => "",
        }
    }
}

/// Maps `(doctype_name, public_id, system_id)` to replacement text.
///
/// `doctype_name` is the name declared by the document's DOCTYPE, or its
/// root element when there is no DOCTYPE.
pub type EntityResolver<'a> =
    dyn Fn(&str, Option<&str>, Option<&str>) -> EntitySource + Send + Sync + 'a;

/// Returns the bundled DTD for a root element name, if there is one.
pub fn bundled_dtd(root_element: &str) -> Option<&'static str> {
    match root_element {
        "gsafeed" => Some(GSAFEED_DTD),
        "xmlgroups" => Some(GROUPSFEED_DTD),
        _ => None,
    }
}

/// Resolves the fixed public identifier to the DTD named by `root_element`.
///
/// Any other public identifier, and any bare `SYSTEM` identifier, yields
/// [`EntitySource::Empty`] so that `file://` paths and remote URLs are never
/// followed.
pub fn resolve_entity(
    root_element: &str,
    public_id: Option<&str>,
    system_id: Option<&str>,
) -> EntitySource {
    if public_id == Some(PUBLIC_ID) {
        if let Some(dtd) = bundled_dtd(root_element) {
            return EntitySource::Bundled(dtd);
        }
    }

    tracing::debug!(
        public_id = public_id.unwrap_or(""),
        system_id = system_id.unwrap_or(""),
        "Refusing to resolve external identifier"
    );
    EntitySource::Empty
}
