//! Integration tests for feed submission against a mock appliance.
//!
//! Each test starts its own wiremock server. Golden bodies pin the exact
//! multipart layout the appliance expects.

use flate2::read::GzDecoder;
use gsafeed::config::SenderConfig;
use gsafeed::transport::{FeedSender, SendError};
use pretty_assertions::assert_eq;
use std::io::Read;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED_XML: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<gsafeed/>";

fn sender_for(server: &MockServer) -> FeedSender {
    FeedSender::new(
        &format!("{}/xmlfeed", server.uri()),
        &format!("{}/xmlgroups", server.uri()),
        "UTF-8",
    )
    .unwrap()
}

fn part(name: &str, content_type: &str, value: &str) -> String {
    format!(
        "--<<\r\nContent-Disposition: form-data; name=\"{}\"\r\nContent-Type: {}\r\n\r\n{}\r\n",
        name, content_type, value
    )
}

// ============================================================================
// Wire format
// ============================================================================

#[tokio::test]
async fn test_send_feed_golden_body() {
    let server = MockServer::start().await;
    let expected = "--<<\r\n\
                    Content-Disposition: form-data; name=\"datasource\"\r\n\
                    Content-Type: text/plain\r\n\
                    \r\n\
                    docspot\r\n\
                    --<<\r\n\
                    Content-Disposition: form-data; name=\"feedtype\"\r\n\
                    Content-Type: text/plain\r\n\
                    \r\n\
                    incremental\r\n\
                    --<<\r\n\
                    Content-Disposition: form-data; name=\"data\"\r\n\
                    Content-Type: text/xml\r\n\
                    \r\n\
                    <?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<gsafeed/>\r\n\
                    --<<--\r\n";

    Mock::given(method("POST"))
        .and(path("/xmlfeed"))
        .and(header("Content-Type", "multipart/form-data; boundary=<<"))
        .and(body_string(expected))
        .respond_with(ResponseTemplate::new(200).set_body_string("Success"))
        .expect(1)
        .mount(&server)
        .await;

    let result = sender_for(&server)
        .send_feed("docspot", "incremental", FEED_XML, false)
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.raw_response, "Success");

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("content-encoding").is_none());
}

#[tokio::test]
async fn test_send_groups_golden_body() {
    let server = MockServer::start().await;
    let expected = [
        part("groupsource", "text/plain", "hr_groups"),
        part("feedtype", "text/plain", "full"),
        part("data", "text/xml", "<xmlgroups/>"),
        "--<<--\r\n".to_string(),
    ]
    .concat();

    Mock::given(method("POST"))
        .and(path("/xmlgroups"))
        .and(body_string(expected))
        .respond_with(ResponseTemplate::new(200).set_body_string("Success"))
        .expect(1)
        .mount(&server)
        .await;

    let result = sender_for(&server)
        .send_groups("hr_groups", "full", b"<xmlgroups/>", false)
        .await
        .unwrap();
    assert!(result.success);
}

#[tokio::test]
async fn test_cleanup_sends_only_the_cleanup_field() {
    let server = MockServer::start().await;
    let expected = [part("cleanup", "text/plain", "docspot"), "--<<--\r\n".to_string()].concat();

    Mock::given(method("POST"))
        .and(path("/xmlgroups"))
        .and(body_string(expected))
        .respond_with(ResponseTemplate::new(200).set_body_string("Success"))
        .expect(1)
        .mount(&server)
        .await;

    let result = sender_for(&server)
        .send_groups("docspot", "cleanup", b"<xmlgroups/>", false)
        .await
        .unwrap();
    assert!(result.success);
}

#[tokio::test]
async fn test_compressed_body_decompresses_to_plain_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/xmlfeed"))
        .and(header("Content-Encoding", "gzip"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Success"))
        .expect(1)
        .mount(&server)
        .await;

    let result = sender_for(&server)
        .send_feed("docspot", "full", FEED_XML, true)
        .await
        .unwrap();
    assert!(result.success);

    let requests = server.received_requests().await.unwrap();
    let mut body = String::new();
    GzDecoder::new(requests[0].body.as_slice())
        .read_to_string(&mut body)
        .unwrap();

    let expected = [
        part("datasource", "text/plain", "docspot"),
        part("feedtype", "text/plain", "full"),
        part("data", "text/xml", std::str::from_utf8(FEED_XML).unwrap()),
        "--<<--\r\n".to_string(),
    ]
    .concat();
    assert_eq!(body, expected);
}

// ============================================================================
// Replies
// ============================================================================

#[tokio::test]
async fn test_failure_reply_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Some failure"))
        .mount(&server)
        .await;

    let result = sender_for(&server)
        .send_feed("docspot", "full", FEED_XML, false)
        .await
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.raw_response, "Some failure");
}

#[tokio::test]
async fn test_reply_decoded_with_configured_charset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"Caf\xe9 error".to_vec()))
        .mount(&server)
        .await;

    let sender = FeedSender::new(
        &format!("{}/xmlfeed", server.uri()),
        &format!("{}/xmlgroups", server.uri()),
        "ISO-8859-1",
    )
    .unwrap();
    let result = sender
        .send_feed("docspot", "full", FEED_XML, false)
        .await
        .unwrap();
    assert_eq!(result.raw_response, "Café error");
}

#[tokio::test]
async fn test_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = sender_for(&server)
        .send_feed("docspot", "full", FEED_XML, false)
        .await
        .unwrap_err();
    assert!(matches!(err, SendError::HttpStatus(500)), "{:?}", err);
}

#[tokio::test]
async fn test_oversized_reply_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 2 * 1024 * 1024]))
        .mount(&server)
        .await;

    let err = sender_for(&server)
        .send_feed("docspot", "full", FEED_XML, false)
        .await
        .unwrap_err();
    assert!(matches!(err, SendError::ResponseTooLarge), "{:?}", err);
}

#[tokio::test]
async fn test_slow_appliance_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("Success")
                .set_delay(std::time::Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let config = SenderConfig {
        feed_url: Some(format!("{}/xmlfeed", server.uri())),
        groups_url: Some(format!("{}/xmlgroups", server.uri())),
        connect_timeout_secs: 1,
        read_timeout_secs: 1,
        ..SenderConfig::default()
    };
    let err = FeedSender::from_config(&config)
        .unwrap()
        .send_feed("docspot", "full", FEED_XML, false)
        .await
        .unwrap_err();
    match err {
        SendError::Timeout => {}
        SendError::Network(e) => assert!(e.is_timeout(), "{:?}", e),
        other => panic!("expected a timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let sender = FeedSender::new(
        &format!("http://127.0.0.1:{}/xmlfeed", port),
        &format!("http://127.0.0.1:{}/xmlgroups", port),
        "UTF-8",
    )
    .unwrap();

    let err = sender
        .send_feed("docspot", "full", FEED_XML, false)
        .await
        .unwrap_err();
    assert!(matches!(err, SendError::Network(_)), "{:?}", err);
}

// ============================================================================
// Pre-flight validation
// ============================================================================

#[tokio::test]
async fn test_bad_names_never_reach_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Success"))
        .expect(0)
        .mount(&server)
        .await;

    let sender = sender_for(&server);
    for name in ["bad#source", "9badsource", "", "test-DataSource"] {
        let err = sender
            .send_feed(name, "full", FEED_XML, false)
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Configuration(_)), "{}: {:?}", name, err);

        let err = sender
            .send_groups(name, "full", b"<xmlgroups/>", false)
            .await
            .unwrap_err();
        assert!(matches!(err, SendError::Configuration(_)), "{}: {:?}", name, err);
    }
}

#[tokio::test]
async fn test_bad_feed_types_never_reach_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Success"))
        .expect(0)
        .mount(&server)
        .await;

    let sender = sender_for(&server);
    let err = sender
        .send_feed("docspot", "cleanup", FEED_XML, false)
        .await
        .unwrap_err();
    assert!(matches!(err, SendError::Configuration(_)), "{:?}", err);

    let err = sender
        .send_groups("docspot", "metadata-and-url", b"<xmlgroups/>", false)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("metadata-and-url"), "{}", err);
}

#[test]
fn test_bad_host_name() {
    let err = FeedSender::for_host("badname:", false, "UTF-8").unwrap_err();
    assert!(matches!(err, SendError::Configuration(_)), "{:?}", err);
}
