//! Typed projection of the `xmlgroups` grammar.

use serde::{Deserialize, Serialize};

use super::value::attribute_value;

/// Root of a group membership feed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Xmlgroups {
    #[serde(rename = "membership", default)]
    pub memberships: Vec<Membership>,
}

impl Xmlgroups {
    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.memberships.push(membership);
        self
    }
}

/// A group principal and its members.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Membership {
    #[serde(rename = "@source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub principal: Principal,
    pub members: Members,
}

impl Membership {
    pub fn new(principal: Principal) -> Self {
        Self {
            source: None,
            principal,
            members: Members::default(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_member(mut self, member: Principal) -> Self {
        self.members.principals.push(member);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Members {
    #[serde(rename = "principal", default)]
    pub principals: Vec<Principal>,
}

attribute_value! {
    Scope {
        User => "USER",
        Group => "GROUP",
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::User
    }
}

attribute_value! {
    CaseSensitivity {
        EverythingCaseSensitive => "EVERYTHING_CASE_SENSITIVE",
        EverythingCaseInsensitive => "EVERYTHING_CASE_INSENSITIVE",
    }
}

attribute_value! {
    PrincipalType {
        Unqualified => "unqualified",
    }
}

/// A user or group in a membership feed. Unlike the content feed's
/// principal it carries no access decision. A missing `scope` reads as
/// `USER`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "@scope", default)]
    pub scope: Scope,
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
    pub fn new(scope: Scope, value: impl Into<String>) -> Self {
        Self {
            scope,
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
