//! HTTP submission of encoded feeds to the appliance.
//!
//! Every request is a single `multipart/form-data` POST with the fixed
//! boundary `<<`, optionally gzip-compressed. Names and feed types are
//! validated before any I/O happens.
//!
//! # Security
//!
//! - **SEC-006**: Replies are read with a 1MB cap
//! - **SEC-010**: Data source and group source names are restricted to
//!   `^[A-Za-z_][A-Za-z0-9_]*$`
//! - Redirects are never followed

mod kinds;
mod multipart;
mod sender;

pub use kinds::{FeedKind, GroupKind, UnknownKind};
pub use multipart::{MultipartBody, BOUNDARY, CONTENT_TYPE};
pub use sender::{FeedSender, SendError, TransportResult};
