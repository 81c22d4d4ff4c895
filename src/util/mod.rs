//! Validation helpers for values that leave this process.
//!
//! - **Identifiers**: data source and group source names
//! - **Endpoints**: appliance feed and groups URLs
//!
//! # Examples
//!
//! ```
//! use gsafeed::util::{endpoint_for_host, validate_identifier};
//!
//! validate_identifier("docspot").unwrap();
//!
//! let url = endpoint_for_host("gsa.example.com", false, "xmlfeed").unwrap();
//! assert_eq!(url.as_str(), "http://gsa.example.com:19900/xmlfeed");
//! ```

mod identifier;
mod url_validator;

pub use identifier::{validate_identifier, IdentifierError, MAX_IDENTIFIER_LENGTH};
pub use url_validator::{
    endpoint_for_host, validate_endpoint, EndpointError, FEED_PORT, SECURE_FEED_PORT,
};
