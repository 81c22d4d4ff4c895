//! Typed documents for the two feed grammars.
//!
//! - [`gsafeed`] - content feeds: header, groups, records, ACLs, metadata
//! - [`groups`] - group membership feeds
//! - [`date`] - RFC 822 helpers for `record/@last-modified`
//! - [`Flag`] and the other enumerated attribute values, which keep text
//!   outside the grammar instead of failing
//!
//! The types carry no behaviour beyond their XML shape. Reading and writing
//! them goes through [`DocumentCodec`](crate::xml::DocumentCodec).
//!
//! # Example
//!
//! ```
//! use gsafeed::feed::gsafeed::{Content, Gsafeed, Group, Header, Record};
//!
//! let feed = Gsafeed::new(Header::new("sample", "full")).with_group(
//!     Group::default().with_record(
//!         Record::new("http://www.example.com/hello01", "text/plain")
//!             .with_content(Content::new("This is hello01")),
//!     ),
//! );
//! assert_eq!(feed.groups[0].records().count(), 1);
//! ```

pub mod date;
pub mod groups;
pub mod gsafeed;
mod value;

pub use date::{format_rfc822, parse_rfc822};
pub use groups::Xmlgroups;
pub use gsafeed::Gsafeed;
pub use value::Flag;
