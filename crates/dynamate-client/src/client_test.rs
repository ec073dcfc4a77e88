use super::*;

fn test_client(base_url: &str) -> DynamateClient {
    DynamateClient::with_base_url(base_url, 30, "dynamate-test/0.1", 0, 0)
        .expect("client construction should not fail")
}

#[test]
fn endpoint_appends_path_to_base() {
    let client = test_client("https://prices.example.com");
    let url = client.endpoint("tags", &[]).unwrap();
    assert_eq!(url.as_str(), "https://prices.example.com/tags");
}

#[test]
fn endpoint_keeps_base_path_segment() {
    let client = test_client("https://prices.example.com/api/");
    let url = client.endpoint("preview", &[("tag", "sale")]).unwrap();
    assert_eq!(url.as_str(), "https://prices.example.com/api/preview?tag=sale");
}

#[test]
fn endpoint_encodes_special_characters() {
    let client = test_client("https://prices.example.com");
    let url = client.endpoint("preview", &[("tag", "summer & fall")]).unwrap();
    assert!(
        url.as_str().contains("summer+%26+fall") || url.as_str().contains("summer%20%26%20fall"),
        "query param should be percent-encoded: {url}"
    );
}

#[test]
fn unparseable_base_url_is_rejected() {
    let result = DynamateClient::with_base_url("not a url", 30, "ua", 0, 0);
    assert!(matches!(result, Err(ClientError::InvalidBaseUrl { .. })));
}

#[test]
fn ack_accepts_object_string_and_empty_bodies() {
    assert_eq!(
        parse_ack(r#"{"message":"Scheduled"}"#).message.as_deref(),
        Some("Scheduled")
    );
    assert_eq!(parse_ack(r#""done""#).message.as_deref(), Some("done"));
    assert_eq!(parse_ack(""), BackendAck::default());
    assert_eq!(parse_ack(r#"{"ok":true}"#), BackendAck::default());
}

#[test]
fn truncate_cuts_long_bodies() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("abcdefghij", 4), "abcd...");
}
