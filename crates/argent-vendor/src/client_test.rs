use super::*;

fn make_client(api_url: &str) -> VendorClient {
    VendorClient::new(api_url, "https://vendor.example", 5, "argent-test/0.1")
        .expect("failed to build VendorClient")
}

// ---------------------------------------------------------------------------
// Construction and endpoint building
// ---------------------------------------------------------------------------

#[test]
fn endpoint_appends_to_base_path() {
    let client = make_client("https://api.vendor.example/api/v1");
    let url = client.endpoint("auth/login").unwrap();
    assert_eq!(url.as_str(), "https://api.vendor.example/api/v1/auth/login");
}

#[test]
fn endpoint_tolerates_trailing_slash_on_base() {
    let client = make_client("https://api.vendor.example/api/v1/");
    let url = client.endpoint("profile/homepage").unwrap();
    assert_eq!(
        url.as_str(),
        "https://api.vendor.example/api/v1/profile/homepage"
    );
}

#[test]
fn construction_rejects_invalid_base_url() {
    let result = VendorClient::new("not a url", "https://vendor.example", 5, "ua");
    assert!(
        matches!(result, Err(VendorError::Parse { ref context, .. }) if context == "client configuration"),
        "expected Parse(client configuration)"
    );
}

#[test]
fn new_client_has_no_session() {
    let client = make_client("https://api.vendor.example/api/v1");
    assert!(client.session_token().is_none());
}

#[test]
fn session_token_round_trips_through_restore_and_clear() {
    let client = make_client("https://api.vendor.example/api/v1");
    client.restore_session_token("abc");
    assert_eq!(client.session_token().as_deref(), Some("abc"));
    client.clear_session_token();
    assert!(client.session_token().is_none());
}

// ---------------------------------------------------------------------------
// Envelope handling
// ---------------------------------------------------------------------------

#[test]
fn require_success_passes_data_through() {
    let envelope = Envelope {
        success: true,
        message: None,
        data: Some(42),
    };
    assert_eq!(require_success(envelope, "fallback").unwrap(), Some(42));
}

#[test]
fn require_success_surfaces_vendor_message_verbatim() {
    let envelope: Envelope<()> = Envelope {
        success: false,
        message: Some("حساب شما مسدود است".to_owned()),
        data: None,
    };
    let err = require_success(envelope, "fallback").unwrap_err();
    assert!(
        matches!(err, VendorError::Rejected { ref message } if message == "حساب شما مسدود است"),
        "vendor message must not be rewritten"
    );
}

#[test]
fn require_success_uses_fallback_when_vendor_sends_no_message() {
    let envelope: Envelope<()> = Envelope {
        success: false,
        message: None,
        data: None,
    };
    let err = require_success(envelope, "fallback").unwrap_err();
    assert!(matches!(err, VendorError::Rejected { ref message } if message == "fallback"));
}

#[test]
fn truncate_for_log_bounds_long_bodies() {
    let body = "x".repeat(2_000);
    assert_eq!(truncate_for_log(&body).chars().count(), LOG_BODY_LIMIT);
    assert_eq!(truncate_for_log("short"), "short");
}

#[test]
fn truncate_for_log_respects_char_boundaries() {
    let body = "نقره".repeat(400);
    let truncated = truncate_for_log(&body);
    assert_eq!(truncated.chars().count(), LOG_BODY_LIMIT);
}
