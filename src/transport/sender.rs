use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

use encoding_rs::Encoding;
use flate2::write::GzEncoder;
use flate2::Compression;
use futures::StreamExt;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use thiserror::Error;
use url::Url;

use super::kinds::{FeedKind, GroupKind};
use super::multipart::{self, MultipartBody};
use crate::config::SenderConfig;
use crate::util::{endpoint_for_host, validate_endpoint, validate_identifier};

/// SEC-006: Appliance replies are a short status line; anything past this is refused.
const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Errors that can occur while submitting a feed.
///
/// A reply other than `Success` is not an error; see [`TransportResult`].
#[derive(Error, Debug)]
pub enum SendError {
    /// Bad identifier, feed type, endpoint or charset. Nothing was sent.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the connect plus read timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the 1MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Gzip compression of the request body failed
    #[error("Compression failed: {0}")]
    Compression(#[from] std::io::Error),
}

/// Outcome of a request the appliance answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResult {
    /// True only when the reply was exactly `Success`.
    pub success: bool,
    /// Decoded reply body, kept verbatim.
    pub raw_response: String,
}

impl TransportResult {
    fn from_response(raw_response: String) -> Self {
        Self {
            success: raw_response == "Success",
            raw_response,
        }
    }
}

/// Submits content and groups feeds to one appliance.
///
/// Holds a shared `reqwest::Client`; cloning is cheap and every call builds
/// its own request.
#[derive(Debug, Clone)]
pub struct FeedSender {
    client: reqwest::Client,
    feed_url: Url,
    groups_url: Url,
    encoding: &'static Encoding,
    request_timeout: Duration,
}

impl FeedSender {
    /// Targets the standard endpoints of `host`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Configuration`] if `host` is not a plain host
    /// name or `charset` is unknown.
    pub fn for_host(host: &str, secure: bool, charset: &str) -> Result<Self, SendError> {
        let feed_url = endpoint_for_host(host, secure, "xmlfeed")
            .map_err(|e| SendError::Configuration(e.to_string()))?;
        let groups_url = endpoint_for_host(host, secure, "xmlgroups")
            .map_err(|e| SendError::Configuration(e.to_string()))?;
        Self::build(
            feed_url,
            groups_url,
            charset,
            DEFAULT_CONNECT_TIMEOUT,
            DEFAULT_READ_TIMEOUT,
        )
    }

    /// Targets explicit feed and groups endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Configuration`] if either URL is not a plain
    /// `http`/`https` URL or `charset` is unknown.
    pub fn new(feed_url: &str, groups_url: &str, charset: &str) -> Result<Self, SendError> {
        let feed_url =
            validate_endpoint(feed_url).map_err(|e| SendError::Configuration(e.to_string()))?;
        let groups_url =
            validate_endpoint(groups_url).map_err(|e| SendError::Configuration(e.to_string()))?;
        Self::build(
            feed_url,
            groups_url,
            charset,
            DEFAULT_CONNECT_TIMEOUT,
            DEFAULT_READ_TIMEOUT,
        )
    }

    /// Builds a sender from loaded configuration.
    ///
    /// Explicit URLs take precedence over `host`.
    pub fn from_config(config: &SenderConfig) -> Result<Self, SendError> {
        let (feed_url, groups_url) = match (&config.feed_url, &config.groups_url, &config.host) {
            (Some(feed), Some(groups), _) => (
                validate_endpoint(feed).map_err(|e| SendError::Configuration(e.to_string()))?,
                validate_endpoint(groups).map_err(|e| SendError::Configuration(e.to_string()))?,
            ),
            (None, None, Some(host)) => (
                endpoint_for_host(host, config.secure, "xmlfeed")
                    .map_err(|e| SendError::Configuration(e.to_string()))?,
                endpoint_for_host(host, config.secure, "xmlgroups")
                    .map_err(|e| SendError::Configuration(e.to_string()))?,
            ),
            (None, None, None) => {
                return Err(SendError::Configuration(
                    "Either host or both feed_url and groups_url must be set".to_string(),
                ))
            }
            _ => {
                return Err(SendError::Configuration(
                    "feed_url and groups_url must be set together".to_string(),
                ))
            }
        };
        Self::build(
            feed_url,
            groups_url,
            &config.charset,
            config.connect_timeout(),
            config.read_timeout(),
        )
    }

    fn build(
        feed_url: Url,
        groups_url: Url,
        charset: &str,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, SendError> {
        let encoding = Encoding::for_label(charset.trim().as_bytes())
            .ok_or_else(|| SendError::Configuration(format!("Unknown charset: {}", charset)))?;

        // Redirects are not followed: a POST body must not be replayed elsewhere
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()?;

        Ok(Self {
            client,
            feed_url,
            groups_url,
            encoding,
            request_timeout: connect_timeout.saturating_add(read_timeout),
        })
    }

    pub fn feed_url(&self) -> &Url {
        &self.feed_url
    }

    pub fn groups_url(&self) -> &Url {
        &self.groups_url
    }

    /// Name of the charset used to decode replies, e.g. `UTF-8`.
    pub fn charset(&self) -> &'static str {
        self.encoding.name()
    }

    /// Pushes a content feed for `datasource`.
    ///
    /// # Arguments
    ///
    /// * `datasource` - Data source name, `^[A-Za-z_][A-Za-z0-9_]*$`
    /// * `feed_type` - `full`, `incremental` or `metadata-and-url`
    /// * `xml` - Encoded `gsafeed` document
    /// * `compress` - Gzip the request body
    ///
    /// # Errors
    ///
    /// - [`SendError::Configuration`] before any I/O for a bad name or type
    /// - [`SendError::Network`], [`SendError::Timeout`] and friends when the
    ///   exchange itself fails
    pub async fn send_feed(
        &self,
        datasource: &str,
        feed_type: &str,
        xml: &[u8],
        compress: bool,
    ) -> Result<TransportResult, SendError> {
        validate_identifier(datasource).map_err(|e| SendError::Configuration(e.to_string()))?;
        let kind =
            FeedKind::from_str(feed_type).map_err(|e| SendError::Configuration(e.to_string()))?;

        let body = MultipartBody::new()
            .text_field("datasource", datasource)
            .text_field("feedtype", kind.as_str())
            .xml_field("data", xml)
            .finish();

        tracing::debug!(
            datasource = %datasource,
            feedtype = %kind,
            bytes = body.len(),
            compress = compress,
            "Sending content feed"
        );
        let result = self.post(&self.feed_url, body, compress).await?;
        log_result(&self.feed_url, datasource, &result);
        Ok(result)
    }

    /// Pushes a groups feed for `group_source`.
    ///
    /// A `cleanup` request carries only the group source; `xml` is ignored.
    ///
    /// # Errors
    ///
    /// Same as [`FeedSender::send_feed`], with `feed_type` one of `full`,
    /// `incremental` or `cleanup`.
    pub async fn send_groups(
        &self,
        group_source: &str,
        feed_type: &str,
        xml: &[u8],
        compress: bool,
    ) -> Result<TransportResult, SendError> {
        validate_identifier(group_source).map_err(|e| SendError::Configuration(e.to_string()))?;
        let kind =
            GroupKind::from_str(feed_type).map_err(|e| SendError::Configuration(e.to_string()))?;

        let body = match kind {
            GroupKind::Cleanup => MultipartBody::new().text_field("cleanup", group_source),
            GroupKind::Full | GroupKind::Incremental => MultipartBody::new()
                .text_field("groupsource", group_source)
                .text_field("feedtype", kind.as_str())
                .xml_field("data", xml),
        }
        .finish();

        tracing::debug!(
            groupsource = %group_source,
            feedtype = %kind,
            bytes = body.len(),
            compress = compress,
            "Sending groups feed"
        );
        let result = self.post(&self.groups_url, body, compress).await?;
        log_result(&self.groups_url, group_source, &result);
        Ok(result)
    }

    async fn post(
        &self,
        url: &Url,
        body: Vec<u8>,
        compress: bool,
    ) -> Result<TransportResult, SendError> {
        let mut request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, multipart::CONTENT_TYPE);

        let body = if compress {
            request = request.header(CONTENT_ENCODING, "gzip");
            gzip(&body)?
        } else {
            body
        };

        let exchange = async {
            let response = request.body(body).send().await?;
            if !response.status().is_success() {
                return Err(SendError::HttpStatus(response.status().as_u16()));
            }
            read_limited_bytes(response, MAX_RESPONSE_SIZE).await
        };

        let bytes = tokio::time::timeout(self.request_timeout, exchange)
            .await
            .map_err(|_| SendError::Timeout)??;

        let (text, _, had_errors) = self.encoding.decode(&bytes);
        if had_errors {
            tracing::warn!(
                url = %url,
                charset = self.encoding.name(),
                "Reply contained bytes invalid for the configured charset"
            );
        }
        Ok(TransportResult::from_response(text.into_owned()))
    }
}

fn log_result(url: &Url, name: &str, result: &TransportResult) {
    if result.success {
        tracing::info!(url = %url, name = %name, "Feed accepted");
    } else {
        tracing::warn!(
            url = %url,
            name = %name,
            response = %result.raw_response,
            "Feed rejected by appliance"
        );
    }
}

/// Gzip-compresses a whole request body.
pub(crate) fn gzip(body: &[u8]) -> Result<Vec<u8>, SendError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(body.len() / 2), Compression::default());
    encoder.write_all(body)?;
    Ok(encoder.finish()?)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, SendError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(SendError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(SendError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(SendError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(SendError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_for_host_endpoints() {
        let sender = FeedSender::for_host("gsa.example.com", false, "UTF-8").unwrap();
        assert_eq!(
            sender.feed_url().as_str(),
            "http://gsa.example.com:19900/xmlfeed"
        );
        assert_eq!(
            sender.groups_url().as_str(),
            "http://gsa.example.com:19900/xmlgroups"
        );

        let sender = FeedSender::for_host("gsa.example.com", true, "UTF-8").unwrap();
        assert_eq!(
            sender.feed_url().as_str(),
            "https://gsa.example.com:19902/xmlfeed"
        );
    }

    #[test]
    fn test_bad_host_is_configuration_error() {
        assert!(matches!(
            FeedSender::for_host("badname:", false, "UTF-8"),
            Err(SendError::Configuration(_))
        ));
    }

    #[test]
    fn test_explicit_urls_validated() {
        assert!(FeedSender::new(
            "http://127.0.0.1:8080/xmlfeed",
            "http://127.0.0.1:8080/xmlgroups",
            "UTF-8"
        )
        .is_ok());
        assert!(matches!(
            FeedSender::new("ftp://gsa/xmlfeed", "http://gsa/xmlgroups", "UTF-8"),
            Err(SendError::Configuration(_))
        ));
    }

    #[test]
    fn test_charset_labels() {
        let sender = FeedSender::for_host("gsa", false, "latin1").unwrap();
        assert_eq!(sender.charset(), "windows-1252");

        let err = FeedSender::for_host("gsa", false, "no-such-charset").unwrap_err();
        assert!(err.to_string().contains("Unknown charset"));
    }

    #[test]
    fn test_from_config() {
        let config = SenderConfig {
            host: Some("gsa.example.com".to_string()),
            secure: true,
            ..SenderConfig::default()
        };
        let sender = FeedSender::from_config(&config).unwrap();
        assert_eq!(
            sender.groups_url().as_str(),
            "https://gsa.example.com:19902/xmlgroups"
        );

        let config = SenderConfig {
            host: Some("ignored".to_string()),
            feed_url: Some("http://10.0.0.5:19900/xmlfeed".to_string()),
            groups_url: Some("http://10.0.0.5:19900/xmlgroups".to_string()),
            ..SenderConfig::default()
        };
        let sender = FeedSender::from_config(&config).unwrap();
        assert_eq!(sender.feed_url().host_str(), Some("10.0.0.5"));
    }

    #[test]
    fn test_from_config_requires_a_target() {
        assert!(matches!(
            FeedSender::from_config(&SenderConfig::default()),
            Err(SendError::Configuration(_))
        ));

        let config = SenderConfig {
            feed_url: Some("http://10.0.0.5:19900/xmlfeed".to_string()),
            ..SenderConfig::default()
        };
        assert!(matches!(
            FeedSender::from_config(&config),
            Err(SendError::Configuration(_))
        ));
    }

    #[test]
    fn test_result_success_is_exact() {
        assert!(TransportResult::from_response("Success".to_string()).success);
        assert!(!TransportResult::from_response("Success\n".to_string()).success);
        assert!(!TransportResult::from_response("success".to_string()).success);

        let failure = TransportResult::from_response("Some failure".to_string());
        assert!(!failure.success);
        assert_eq!(failure.raw_response, "Some failure");
    }

    #[test]
    fn test_gzip_round_trip() {
        let body = b"--<<\r\nContent-Disposition: form-data; name=\"cleanup\"\r\n".repeat(20);
        let compressed = gzip(&body).unwrap();
        assert_ne!(compressed, body);

        let mut decoded = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, body);
    }

    #[tokio::test]
    async fn test_validation_happens_before_io() {
        // Nothing listens on port 9; reaching the network would be a Network error
        let sender = FeedSender::new(
            "http://127.0.0.1:9/xmlfeed",
            "http://127.0.0.1:9/xmlgroups",
            "UTF-8",
        )
        .unwrap();

        let err = sender
            .send_feed("bad#source", "full", b"<gsafeed/>", false)
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Configuration(_)));

        let err = sender
            .send_feed("docspot", "cleanup", b"<gsafeed/>", false)
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Configuration(_)));

        let err = sender
            .send_groups("docspot", "metadata-and-url", b"", false)
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Configuration(_)));
    }
}
