//! Secure feed documents and submission for Google Search Appliance feeds.
//!
//! - [`xml`]: hardened XML decoding with DTD validation, and encoding
//! - [`feed`]: typed `gsafeed` and `xmlgroups` documents
//! - [`transport`]: multipart HTTP submission to the appliance
//! - [`config`]: optional TOML sender configuration
//!
//! The crate logs through `tracing` and never installs a subscriber.

pub mod config;
pub mod feed;
pub mod transport;
pub mod util;
pub mod xml;

pub use config::{ConfigError, SenderConfig};
pub use feed::{Gsafeed, Xmlgroups};
pub use transport::{FeedSender, SendError, TransportResult};
pub use xml::{DecodeError, DocumentCodec, EncodeError, ValidationMode};
