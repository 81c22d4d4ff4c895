//! Typed projection of the `gsafeed` grammar.
//!
//! Field names follow quick-xml's serde conventions: `@name` for attributes,
//! `$text` for character data and `$value` for an ordered mix of children.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::date::{format_rfc822, parse_rfc822};
use super::value::attribute_value;
pub use super::value::Flag;

/// Root of a content feed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Gsafeed {
    pub header: Header,
    #[serde(rename = "group", default)]
    pub groups: Vec<Group>,
}

impl Gsafeed {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Header {
    pub datasource: String,
    /// `full`, `incremental` or `metadata-and-url`.
    pub feedtype: String,
}

impl Header {
    pub fn new(datasource: impl Into<String>, feedtype: impl Into<String>) -> Self {
        Self {
            datasource: datasource.into(),
            feedtype: feedtype.into(),
        }
    }
}

attribute_value! {
    Action {
        Add => "add",
        Delete => "delete",
    }
}

/// A set of records and ACLs sharing an action.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Group {
    #[serde(rename = "@action", default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(rename = "@pagerank", default, skip_serializing_if = "Option::is_none")]
    pub pagerank: Option<String>,
    #[serde(rename = "@feedrank", default, skip_serializing_if = "Option::is_none")]
    pub feedrank: Option<String>,
    /// `acl` and `record` children in document order.
    #[serde(rename = "$value", default)]
    pub entries: Vec<GroupEntry>,
}

impl Group {
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_record(mut self, record: Record) -> Self {
        self.entries.push(GroupEntry::Record(record));
        self
    }

    pub fn with_acl(mut self, acl: Acl) -> Self {
        self.entries.push(GroupEntry::Acl(acl));
        self
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().filter_map(|entry| match entry {
            GroupEntry::Record(record) => Some(record),
            GroupEntry::Acl(_) => None,
        })
    }

    pub fn acls(&self) -> impl Iterator<Item = &Acl> {
        self.entries.iter().filter_map(|entry| match entry {
            GroupEntry::Acl(acl) => Some(acl),
            GroupEntry::Record(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupEntry {
    #[serde(rename = "acl")]
    Acl(Acl),
    #[serde(rename = "record")]
    Record(Record),
}

attribute_value! {
    AuthMethod {
        None => "none",
        HttpBasic => "httpbasic",
        Ntlm => "ntlm",
        HttpSso => "httpsso",
        Negotiate => "negotiate",
    }
}

attribute_value! {
    Scoring {
        Content => "content",
        Web => "web",
    }
}

/// One document pushed to the index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "@url")]
    pub url: String,
    #[serde(rename = "@displayurl", default, skip_serializing_if = "Option::is_none")]
    pub displayurl: Option<String>,
    #[serde(rename = "@action", default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(rename = "@mimetype")]
    pub mimetype: String,
    /// RFC 822 text; see [`Record::last_modified_date`].
    #[serde(rename = "@last-modified", default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(rename = "@lock", default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<Flag>,
    #[serde(rename = "@authmethod", default, skip_serializing_if = "Option::is_none")]
    pub authmethod: Option<AuthMethod>,
    #[serde(rename = "@pagerank", default, skip_serializing_if = "Option::is_none")]
    pub pagerank: Option<String>,
    #[serde(rename = "@feedrank", default, skip_serializing_if = "Option::is_none")]
    pub feedrank: Option<String>,
    #[serde(rename = "@crawl-immediately", default, skip_serializing_if = "Option::is_none")]
    pub crawl_immediately: Option<Flag>,
    #[serde(rename = "@crawl-once", default, skip_serializing_if = "Option::is_none")]
    pub crawl_once: Option<Flag>,
    #[serde(rename = "@scoring", default, skip_serializing_if = "Option::is_none")]
    pub scoring: Option<Scoring>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<Acl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<Metadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Content>,
}

impl Record {
    pub fn new(url: impl Into<String>, mimetype: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mimetype: mimetype.into(),
            ..Self::default()
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_displayurl(mut self, url: impl Into<String>) -> Self {
        self.displayurl = Some(url.into());
        self
    }

    pub fn with_lock(mut self, lock: bool) -> Self {
        self.lock = Some(Flag::from(lock));
        self
    }

    pub fn with_authmethod(mut self, method: AuthMethod) -> Self {
        self.authmethod = Some(method);
        self
    }

    pub fn with_crawl_immediately(mut self, value: bool) -> Self {
        self.crawl_immediately = Some(Flag::from(value));
        self
    }

    pub fn with_crawl_once(mut self, value: bool) -> Self {
        self.crawl_once = Some(Flag::from(value));
        self
    }

    pub fn with_scoring(mut self, scoring: Scoring) -> Self {
        self.scoring = Some(scoring);
        self
    }

    pub fn with_acl(mut self, acl: Acl) -> Self {
        self.acl = Some(acl);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata.push(metadata);
        self
    }

    pub fn with_content(mut self, content: Content) -> Self {
        self.content.push(content);
        self
    }

    pub fn with_last_modified_date(mut self, date: DateTime<Utc>) -> Self {
        self.last_modified = Some(format_rfc822(&date));
        self
    }

    /// Parsed `last-modified`, or `None` when absent or not an RFC 822 date.
    pub fn last_modified_date(&self) -> Option<DateTime<Utc>> {
        self.last_modified.as_deref().and_then(parse_rfc822)
    }
}

attribute_value! {
    InheritanceType {
        ChildOverrides => "child-overrides",
        ParentOverrides => "parent-overrides",
        AndBothPermit => "and-both-permit",
        LeafNode => "leaf-node",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Acl {
    #[serde(rename = "@url", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "@inheritance-type", default, skip_serializing_if = "Option::is_none")]
    pub inheritance_type: Option<InheritanceType>,
    #[serde(rename = "@inherit-from", default, skip_serializing_if = "Option::is_none")]
    pub inherit_from: Option<String>,
    #[serde(rename = "principal", default)]
    pub principals: Vec<Principal>,
}

impl Acl {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_inheritance_type(mut self, kind: InheritanceType) -> Self {
        self.inheritance_type = Some(kind);
        self
    }

    pub fn with_inherit_from(mut self, url: impl Into<String>) -> Self {
        self.inherit_from = Some(url.into());
        self
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principals.push(principal);
        self
    }
}

attribute_value! {
    Scope {
        User => "user",
        Group => "group",
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::User
    }
}

attribute_value! {
    Access {
        Permit => "permit",
        Deny => "deny",
    }
}

impl Default for Access {
    fn default() -> Self {
        Access::Permit
    }
}

attribute_value! {
    CaseSensitivity {
        EverythingCaseSensitive => "everything-case-sensitive",
        EverythingCaseInsensitive => "everything-case-insensitive",
    }
}

attribute_value! {
    PrincipalType {
        Unqualified => "unqualified",
    }
}

/// A user or group named in an ACL.
///
/// A missing `scope` or `access` reads as `user` and `permit`; the DTD
/// requires both, so validation still rejects the omission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "@scope", default)]
    pub scope: Scope,
    #[serde(rename = "@access", default)]
    pub access: Access,
    #[serde(rename = "@namespace", default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(
        rename = "@case-sensitivity-type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub case_sensitivity_type: Option<CaseSensitivity>,
    #[serde(rename = "@principal-type", default, skip_serializing_if = "Option::is_none")]
    pub principal_type: Option<PrincipalType>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

impl Principal {
    pub fn new(scope: Scope, access: Access, value: impl Into<String>) -> Self {
        Self {
            scope,
            access,
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_case_sensitivity_type(mut self, kind: CaseSensitivity) -> Self {
        self.case_sensitivity_type = Some(kind);
        self
    }

    pub fn with_principal_type(mut self, kind: PrincipalType) -> Self {
        self.principal_type = Some(kind);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "@overwrite-acls", default, skip_serializing_if = "Option::is_none")]
    pub overwrite_acls: Option<Flag>,
    #[serde(default)]
    pub meta: Vec<Meta>,
}

impl Metadata {
    pub fn with_overwrite_acls(mut self, value: bool) -> Self {
        self.overwrite_acls = Some(Flag::from(value));
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta.push(meta);
        self
    }
}

attribute_value! {
    MetaEncoding {
        Base64Binary => "base64binary",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Meta {
    #[serde(rename = "@encoding", default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<MetaEncoding>,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@content")]
    pub content: String,
}

impl Meta {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            encoding: None,
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn with_encoding(mut self, encoding: MetaEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }
}

attribute_value! {
    ContentEncoding {
        Base64Binary => "base64binary",
        /// zlib compressed, then base64 encoded.
        Base64Compressed => "base64compressed",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(rename = "@encoding", default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<ContentEncoding>,
    #[serde(rename = "$text", default)]
    pub value: String,
}

impl Content {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            encoding: None,
            value: value.into(),
        }
    }

    pub fn with_encoding(mut self, encoding: ContentEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }
}
