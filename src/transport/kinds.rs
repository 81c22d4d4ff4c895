use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unsupported {endpoint} feed type \"{value}\"")]
pub struct UnknownKind {
    pub endpoint: &'static str,
    pub value: String,
}

/// `feedtype` values accepted by the content feed endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Full,
    Incremental,
    MetadataAndUrl,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Full => "full",
            FeedKind::Incremental => "incremental",
            FeedKind::MetadataAndUrl => "metadata-and-url",
        }
    }
}

impl FromStr for FeedKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(FeedKind::Full),
            "incremental" => Ok(FeedKind::Incremental),
            "metadata-and-url" => Ok(FeedKind::MetadataAndUrl),
            other => Err(UnknownKind {
                endpoint: "content",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `feedtype` values accepted by the groups endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Full,
    Incremental,
    /// Drops every group of the source; sent without a body.
    Cleanup,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Full => "full",
            GroupKind::Incremental => "incremental",
            GroupKind::Cleanup => "cleanup",
        }
    }
}

impl FromStr for GroupKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(GroupKind::Full),
            "incremental" => Ok(GroupKind::Incremental),
            "cleanup" => Ok(GroupKind::Cleanup),
            other => Err(UnknownKind {
                endpoint: "groups",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_kinds() {
        for kind in [FeedKind::Full, FeedKind::Incremental, FeedKind::MetadataAndUrl] {
            assert_eq!(kind.as_str().parse::<FeedKind>(), Ok(kind));
        }
        assert!("cleanup".parse::<FeedKind>().is_err());
        assert!("FULL".parse::<FeedKind>().is_err());
    }

    #[test]
    fn test_group_kinds() {
        assert_eq!("cleanup".parse::<GroupKind>(), Ok(GroupKind::Cleanup));
        let err = "metadata-and-url".parse::<GroupKind>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported groups feed type \"metadata-and-url\""
        );
    }
}
