// Referral code validation tests
// Covers structural short-circuiting, case-insensitive lookup and the HTTP
// validate endpoints in both POST and GET form.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, json_request, test_app, test_state};
use serde_json::json;
use tower::util::ServiceExt;

#[tokio::test]
async fn validate_rejects_bad_lengths_without_storage_lookup() {
    let (state, ledger) = test_state();

    for code in ["a", "abc", "ABCDEFGHIJKLM", "ABCDEFGHIJKLMNOP"] {
        let result = state.referral_codes.validate(code).await.unwrap();
        assert!(!result.valid, "code {:?} must be invalid", code);
        assert!(result.referrer_name.is_none());
    }

    assert_eq!(
        ledger.lookup_count(),
        0,
        "length violations must not query storage"
    );
}

#[tokio::test]
async fn validate_rejects_bad_charset_without_storage_lookup() {
    let (state, ledger) = test_state();

    for code in ["AB-C1", "CODE 123", "CÖDE12"] {
        let result = state.referral_codes.validate(code).await.unwrap();
        assert!(!result.valid, "code {:?} must be invalid", code);
    }

    assert_eq!(ledger.lookup_count(), 0);
}

#[tokio::test]
async fn validate_is_case_insensitive_and_leaks_only_name_and_plan() {
    let (state, ledger) = test_state();
    ledger
        .seed_account("referrer@example.com", "Jane Referrer", "MIKY2024", None)
        .await;

    let upper = state.referral_codes.validate("MIKY2024").await.unwrap();
    let lower = state.referral_codes.validate("miky2024").await.unwrap();
    let padded = state.referral_codes.validate("  miky2024  ").await.unwrap();

    for result in [&upper, &lower, &padded] {
        assert!(result.valid);
        assert_eq!(result.referrer_name.as_deref(), Some("Jane Referrer"));
        assert_eq!(result.referrer_plan.as_deref(), Some("free"));
    }
}

#[tokio::test]
async fn validate_endpoint_post_returns_referrer_preview() {
    let (app, ledger, _config) = test_app();
    ledger
        .seed_account("referrer@example.com", "Jane Referrer", "MIKY2024", None)
        .await;

    let request = json_request(
        Method::POST,
        "/api/v1/referral/validate",
        &json!({ "referral_code": "miky2024" }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["valid"], json!(true));
    assert_eq!(body["referrer"]["name"], json!("Jane Referrer"));
    assert_eq!(body["referrer"]["plan"], json!("free"));
}

#[tokio::test]
async fn validate_endpoint_unknown_code_is_200_with_valid_false() {
    let (app, _ledger, _config) = test_app();

    let request = json_request(
        Method::POST,
        "/api/v1/referral/validate",
        &json!({ "referral_code": "NOPE1234" }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["valid"], json!(false));
    assert!(body.get("referrer").is_none());
}

#[tokio::test]
async fn validate_endpoint_empty_code_is_400() {
    let (app, _ledger, _config) = test_app();

    let request = json_request(
        Method::POST,
        "/api/v1/referral/validate",
        &json!({ "referral_code": "   " }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn validate_endpoint_get_form_matches_post_form() {
    let (app, ledger, _config) = test_app();
    ledger
        .seed_account("referrer@example.com", "Jane Referrer", "MIKY2024", None)
        .await;

    let request = json_request(
        Method::GET,
        "/api/v1/referral/validate?code=MIKY2024",
        &json!({}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["valid"], json!(true));

    // Missing the query parameter entirely is malformed input
    let request = json_request(Method::GET, "/api/v1/referral/validate", &json!({}));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
