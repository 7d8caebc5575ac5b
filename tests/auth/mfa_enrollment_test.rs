use axum::http::StatusCode;
use serde_json::json;

use crate::common::{TestContext, TestWallet};

/// A six digit code guaranteed to differ from the one passed in.
fn wrong_code(code: &str) -> String {
    code.chars()
        .map(|c| {
            let d = c.to_digit(10).unwrap();
            char::from_digit((d + 1) % 10, 10).unwrap()
        })
        .collect()
}

#[tokio::test]
async fn initialize_requires_a_session() {
    let ctx = TestContext::new().await;
    let wallet = TestWallet::new(1);

    let response = ctx
        .server
        .post("/auth/mfa/initialize")
        .json(&json!({
            "message": "enableMFA",
            "signature": wallet.sign("enableMFA"),
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Not authenticated");
}

#[tokio::test]
async fn initialize_returns_provisioning_material() {
    let ctx = TestContext::new().await;
    let wallet = TestWallet::new(1);
    ctx.login(&wallet).await.assert_status(StatusCode::OK);

    let response = ctx
        .server
        .post("/auth/mfa/initialize")
        .json(&json!({
            "message": "enableMFA",
            "signature": wallet.sign("enableMFA"),
        }))
        .await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["qrCode"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));

    // The secret is a pure function of the address, so a replacement device
    // can be provisioned with the same code sequence at any time.
    assert_eq!(
        body["secret"].as_str().unwrap(),
        ctx.mfa.derive_secret(&wallet.address)
    );
}

#[tokio::test]
async fn initialize_rejects_wrong_message() {
    let ctx = TestContext::new().await;
    let wallet = TestWallet::new(1);
    ctx.login(&wallet).await.assert_status(StatusCode::OK);

    let response = ctx
        .server
        .post("/auth/mfa/initialize")
        .json(&json!({
            "message": "login",
            "signature": wallet.sign("login"),
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Invalid enrollment message");
}

#[tokio::test]
async fn initialize_rejects_a_foreign_signature() {
    let ctx = TestContext::new().await;
    let wallet = TestWallet::new(1);
    let other = TestWallet::new(2);
    ctx.login(&wallet).await.assert_status(StatusCode::OK);

    let response = ctx
        .server
        .post("/auth/mfa/initialize")
        .json(&json!({
            "message": "enableMFA",
            "signature": other.sign("enableMFA"),
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Invalid signature");
}

#[tokio::test]
async fn verify_before_initialize_returns_bad_request() {
    let ctx = TestContext::new().await;
    let wallet = TestWallet::new(1);
    ctx.login(&wallet).await.assert_status(StatusCode::OK);

    let response = ctx
        .server
        .post("/auth/mfa/verify")
        .json(&json!({ "mfa_code": ctx.mfa_code(&wallet) }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "MFA enrollment not started");
}

#[tokio::test]
async fn verify_rejects_a_wrong_code_and_keeps_enrollment_open() {
    let ctx = TestContext::new().await;
    let wallet = TestWallet::new(1);
    ctx.login(&wallet).await.assert_status(StatusCode::OK);
    ctx.server
        .post("/auth/mfa/initialize")
        .json(&json!({
            "message": "enableMFA",
            "signature": wallet.sign("enableMFA"),
        }))
        .await
        .assert_status(StatusCode::OK);

    let response = ctx
        .server
        .post("/auth/mfa/verify")
        .json(&json!({ "mfa_code": wrong_code(&ctx.mfa_code(&wallet)) }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Invalid MFA code");

    // The failed attempt does not cancel the enrollment.
    ctx.server
        .post("/auth/mfa/verify")
        .json(&json!({ "mfa_code": ctx.mfa_code(&wallet) }))
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn verify_with_the_current_code_enables_mfa() {
    let ctx = TestContext::new().await;
    let wallet = TestWallet::new(1);
    ctx.login(&wallet).await.assert_status(StatusCode::OK);
    ctx.server
        .post("/auth/mfa/initialize")
        .json(&json!({
            "message": "enableMFA",
            "signature": wallet.sign("enableMFA"),
        }))
        .await
        .assert_status(StatusCode::OK);

    let response = ctx
        .server
        .post("/auth/mfa/verify")
        .json(&json!({ "mfa_code": ctx.mfa_code(&wallet) }))
        .await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "MFA enabled");

    let me: serde_json::Value = ctx.server.get("/auth").await.json();
    assert_eq!(me["mfaEnabled"], true);
}

#[tokio::test]
async fn verify_again_after_enabling_is_idempotent() {
    let ctx = TestContext::new().await;
    let wallet = TestWallet::new(1);
    ctx.enroll_mfa(&wallet).await;

    let response = ctx
        .server
        .post("/auth/mfa/verify")
        .json(&json!({ "mfa_code": ctx.mfa_code(&wallet) }))
        .await;

    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn enrollment_turns_the_next_login_into_a_challenge() {
    let ctx = TestContext::new().await;
    let wallet = TestWallet::new(1);
    ctx.enroll_mfa(&wallet).await;

    let response = ctx.login(&wallet).await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["mfa"], true);
    assert!(body["mfaBonusPhrase"].as_str().is_some());
}
