//! The appliance's fixed multipart/form-data layout.
//!
//! The boundary is always `<<`. Field values are written verbatim; callers
//! validate them before they get here.

/// Multipart boundary expected by the appliance.
pub const BOUNDARY: &str = "<<";

/// `Content-Type` header value matching [`BOUNDARY`].
pub const CONTENT_TYPE: &str = "multipart/form-data; boundary=<<";

/// Accumulates form fields into a request body.
#[derive(Debug, Default)]
pub struct MultipartBody {
    buf: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `text/plain` field.
    pub fn text_field(self, name: &str, value: &str) -> Self {
        self.field(name, "text/plain", value.as_bytes())
    }

    /// Adds a `text/xml` field.
    pub fn xml_field(self, name: &str, value: &[u8]) -> Self {
        self.field(name, "text/xml", value)
    }

    fn field(mut self, name: &str, content_type: &str, value: &[u8]) -> Self {
        self.buf.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, content_type
            )
            .as_bytes(),
        );
        self.buf.extend_from_slice(value);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    /// Appends the closing delimiter and returns the body.
    pub fn finish(mut self) -> Vec<u8> {
        self.buf
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.buf
    }
}
