//! In-memory element tree produced by the secure parser.
//!
//! The tree holds fully expanded text and attribute values, so rendering it
//! back to XML yields a document with no DOCTYPE and no entity references.
//! That rendering is what the typed projection deserializes from.

use quick_xml::events::{BytesCData, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    /// Attributes in document order, values already normalized and expanded.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Every element in document order, starting with `self`.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a Element>) {
        out.push(self);
        for child in self.child_elements() {
            child.collect_into(out);
        }
    }

    /// Concatenated character data of the direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Appends character data, merging with a preceding text node.
    pub(crate) fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    fn has_element_children(&self) -> bool {
        self.children.iter().any(|n| matches!(n, Node::Element(_)))
    }

    /// Serializes the tree as a standalone XML fragment.
    ///
    /// Whitespace-only text between child elements is dropped, so elements
    /// with element-only content render without formatting noise. Character
    /// data is written as CDATA: quick-xml's deserializer trims plain text
    /// runs but passes CDATA through untouched.
    pub fn to_xml(&self) -> Result<String, quick_xml::Error> {
        let mut writer = Writer::new(Vec::new());
        self.write(&mut writer)?;
        // Every string pushed into the writer came from a &str
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), quick_xml::Error> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        let element_only = self.has_element_children();
        for child in &self.children {
            match child {
                Node::Element(e) => e.write(writer)?,
                Node::Text(t) if element_only && t.trim().is_empty() => {}
                Node::Text(t) => {
                    // Splits around any "]]>" in the text
                    for section in BytesCData::escaped(t) {
                        writer.write_event(Event::CData(section))?;
                    }
                }
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        let mut leaf = Element::new("datasource");
        leaf.push_text("a < b");
        leaf.push_text(" & c");

        let mut root = Element::new("header");
        root.attributes.push(("note".into(), "\"quoted\"".into()));
        root.push_text("\n  ");
        root.children.push(Node::Element(leaf));
        root.push_text("\n");
        root
    }

    #[test]
    fn test_text_merges_adjacent_runs() {
        let root = sample();
        let leaf = root.child_elements().next().unwrap();
        assert_eq!(leaf.text(), "a < b & c");
        assert_eq!(leaf.children.len(), 1);
    }

    #[test]
    fn test_to_xml_keeps_text_verbatim_and_drops_formatting_whitespace() {
        let xml = sample().to_xml().unwrap();
        assert_eq!(
            xml,
            "<header note=\"&quot;quoted&quot;\"><datasource><![CDATA[a < b & c]]></datasource></header>"
        );
    }

    #[test]
    fn test_cdata_terminator_in_text_is_split() {
        let mut content = Element::new("content");
        content.push_text("x]]>y");
        let xml = content.to_xml().unwrap();
        assert!(!xml.contains("x]]>y"), "{}", xml);

        #[derive(serde::Deserialize)]
        struct Content {
            #[serde(rename = "$text")]
            value: String,
        }
        let parsed: Content = quick_xml::de::from_str(&xml).unwrap();
        assert_eq!(parsed.value, "x]]>y");
    }

    #[test]
    fn test_padding_survives_deserialization() {
        let mut principal = Element::new("principal");
        principal.attributes.push(("scope".into(), "USER".into()));
        principal.push_text("  alice \n");

        #[derive(serde::Deserialize)]
        struct Principal {
            #[serde(rename = "$text")]
            value: String,
        }
        let parsed: Principal = quick_xml::de::from_str(&principal.to_xml().unwrap()).unwrap();
        assert_eq!(parsed.value, "  alice \n");
    }

    #[test]
    fn test_descendants_in_document_order() {
        let root = sample();
        let names: Vec<&str> = root.descendants().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["header", "datasource"]);
    }

    #[test]
    fn test_empty_element_renders_self_closing() {
        let mut meta = Element::new("meta");
        meta.attributes.push(("name".into(), "author".into()));
        assert_eq!(meta.to_xml().unwrap(), "<meta name=\"author\"/>");
        assert_eq!(meta.attribute("name"), Some("author"));
        assert_eq!(meta.attribute("content"), None);
    }
}
