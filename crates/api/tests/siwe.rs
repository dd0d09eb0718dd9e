mod support;

use std::time::Duration;

use axum::http::StatusCode;
use db::KeyValueStore;
use serde_json::{json, Value};
use support::{TestApp, Wallet};

async fn request_nonce(app: &TestApp, address: &str) -> String {
    let (status, body) = app
        .get(&format!("/v1/auth/siwe/{address}/nonce"), None)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["nonce"].as_str().unwrap().to_string()
}

fn error_code(body: &Value) -> &str {
    body["error"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn nonce_rejects_invalid_address() {
    let app = TestApp::new();
    let (status, body) = app.get("/v1/auth/siwe/0x1234/nonce", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(error_code(&body), "validation_error");
    assert_eq!(body["issues"][0]["field"], "address");
    assert_eq!(body["issues"][0]["message"], "Invalid EVM Address");
}

#[tokio::test]
async fn nonce_is_stored_under_lowercased_address() {
    let app = TestApp::new();
    let wallet = Wallet::new(7);
    let checksummed = auth::to_checksum_address(&wallet.address).unwrap();

    let nonce = request_nonce(&app, &checksummed).await;
    assert_eq!(nonce.len(), 96);
    assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));

    let stored = app
        .kv
        .get(&format!("siwe:nonce:{}", wallet.address))
        .await
        .unwrap();
    assert_eq!(stored, Some(nonce));
}

#[tokio::test]
async fn sign_in_issues_token_and_nonce_is_single_use() {
    let app = TestApp::new();
    let wallet = Wallet::new(7);
    let nonce = request_nonce(&app, &wallet.address).await;
    let message = wallet.siwe_message(&nonce, None);
    let request = json!({
        "address": wallet.address,
        "message": message,
        "signature": wallet.sign(&message),
    });

    let (status, body) = app.post_json("/v1/auth/siwe", None, request.clone()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let token = body["data"]["token"].as_str().unwrap();
    let session = app.tokens.verify(token).expect("token verifies");
    assert_eq!(session.address, wallet.address);
    assert_eq!(app.store.users.lock().unwrap().len(), 1);

    let (status, body) = app.post_json("/v1/auth/siwe", None, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "invalid_message");
    assert_eq!(body["message"], "Invalid message");
}

#[tokio::test]
async fn returning_wallet_keeps_its_user() {
    let app = TestApp::new();
    let wallet = Wallet::new(9);

    let mut subjects = Vec::new();
    for _ in 0..2 {
        let nonce = request_nonce(&app, &wallet.address).await;
        let message = wallet.siwe_message(&nonce, None);
        let (status, body) = app
            .post_json(
                "/v1/auth/siwe",
                None,
                json!({
                    "address": wallet.address,
                    "message": message,
                    "signature": wallet.sign(&message),
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["data"]["token"].as_str().unwrap();
        subjects.push(app.tokens.verify(token).unwrap().sub);
    }
    assert_eq!(subjects[0], subjects[1]);
}

#[tokio::test]
async fn mismatched_nonce_is_rejected() {
    let app = TestApp::new();
    let wallet = Wallet::new(7);
    request_nonce(&app, &wallet.address).await;
    let message = wallet.siwe_message("someothernonce", None);

    let (status, body) = app
        .post_json(
            "/v1/auth/siwe",
            None,
            json!({
                "address": wallet.address,
                "message": message,
                "signature": wallet.sign(&message),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "invalid_message");
}

#[tokio::test]
async fn reissued_nonce_replaces_the_old_one() {
    let app = TestApp::new();
    let wallet = Wallet::new(7);
    let stale = request_nonce(&app, &wallet.address).await;
    let fresh = request_nonce(&app, &wallet.address).await;

    let message = wallet.siwe_message(&stale, None);
    let (status, body) = app
        .post_json(
            "/v1/auth/siwe",
            None,
            json!({
                "address": wallet.address,
                "message": message,
                "signature": wallet.sign(&message),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "invalid_message");

    let key = format!("siwe:nonce:{}", wallet.address);
    assert!(!app.kv.consume(&key, &stale).await.unwrap());
    assert_eq!(app.kv.get(&key).await.unwrap(), Some(fresh.clone()));

    let message = wallet.siwe_message(&fresh, None);
    let (status, body) = app
        .post_json(
            "/v1/auth/siwe",
            None,
            json!({
                "address": wallet.address,
                "message": message,
                "signature": wallet.sign(&message),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(app.kv.get(&key).await.unwrap(), None);
}

#[tokio::test]
async fn message_without_nonce_is_rejected() {
    let app = TestApp::new();
    let wallet = Wallet::new(7);
    request_nonce(&app, &wallet.address).await;

    let (status, body) = app
        .post_json(
            "/v1/auth/siwe",
            None,
            json!({
                "address": wallet.address,
                "message": "hello",
                "signature": wallet.sign("hello"),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "invalid_message");
}

#[tokio::test]
async fn expired_message_is_rejected() {
    let app = TestApp::new();
    let wallet = Wallet::new(7);
    let nonce = request_nonce(&app, &wallet.address).await;
    let message = wallet.siwe_message(&nonce, Some("2024-01-01T00:10:00Z"));

    let (status, body) = app
        .post_json(
            "/v1/auth/siwe",
            None,
            json!({
                "address": wallet.address,
                "message": message,
                "signature": wallet.sign(&message),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "invalid_message");
}

#[tokio::test]
async fn foreign_signature_is_rejected_and_nonce_survives() {
    let app = TestApp::new();
    let wallet = Wallet::new(7);
    let impostor = Wallet::new(8);
    let nonce = request_nonce(&app, &wallet.address).await;
    let message = wallet.siwe_message(&nonce, None);

    let (status, body) = app
        .post_json(
            "/v1/auth/siwe",
            None,
            json!({
                "address": wallet.address,
                "message": message,
                "signature": impostor.sign(&message),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "invalid_signature");
    assert!(app.store.users.lock().unwrap().is_empty());

    let (status, _) = app
        .post_json(
            "/v1/auth/siwe",
            None,
            json!({
                "address": wallet.address,
                "message": message,
                "signature": wallet.sign(&message),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn expired_nonce_is_rejected() {
    let app = TestApp::with_nonce_ttl(Duration::from_millis(20));
    let wallet = Wallet::new(7);
    let nonce = request_nonce(&app, &wallet.address).await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    let message = wallet.siwe_message(&nonce, None);

    let (status, body) = app
        .post_json(
            "/v1/auth/siwe",
            None,
            json!({
                "address": wallet.address,
                "message": message,
                "signature": wallet.sign(&message),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "invalid_message");
}

#[tokio::test]
async fn body_fields_are_validated() {
    let app = TestApp::new();

    let (status, body) = app.post_json("/v1/auth/siwe", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "validation_error");
    let messages: Vec<_> = body["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["message"].as_str().unwrap())
        .collect();
    assert_eq!(
        messages,
        ["Address is required", "Message is required", "Signature is required"]
    );

    let (_, body) = app
        .post_json(
            "/v1/auth/siwe",
            None,
            json!({ "address": "0xnope", "message": 1, "signature": "zz" }),
        )
        .await;
    let messages: Vec<_> = body["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["message"].as_str().unwrap())
        .collect();
    assert_eq!(
        messages,
        ["Invalid EVM Address", "Message must be a string", "Invalid signature"]
    );
}
