use std::sync::Arc;

use auth::{
    generate_nonce, is_address, is_hex, verify_personal_signature, AuthUser, SiweMessage,
};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics::SIWE_VERIFICATIONS;
use crate::response::{created, ok};
use crate::routes::ApiState;
use crate::validation::{JsonObject, Validator};

pub(crate) fn nonce_key(address: &str) -> String {
    format!("siwe:nonce:{}", address.to_ascii_lowercase())
}

#[derive(Debug, Serialize)]
struct NonceResponse {
    nonce: String,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    token: String,
}

#[instrument(skip(state))]
pub async fn create_nonce(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let mut v = Validator::new();
    if !is_address(&address) {
        v.push("address", "Invalid EVM Address");
    }
    v.finish(())?;

    let nonce = generate_nonce();
    state
        .kv
        .put(&nonce_key(&address), &nonce, state.nonce_ttl)
        .await?;
    Ok(created(NonceResponse { nonce }))
}

struct SiweRequest {
    address: String,
    message: String,
    signature: String,
}

fn parse_siwe_request(body: &Bytes) -> ApiResult<SiweRequest> {
    let object = JsonObject::parse(body)?;
    let mut v = Validator::new();

    let address = object.required_string(&mut v, "address", "Address");
    if address.as_deref().is_some_and(|address| !is_address(address)) {
        v.push("address", "Invalid EVM Address");
    }
    let message = object.required_string(&mut v, "message", "Message");
    let signature = object.required_string(&mut v, "signature", "Signature");
    if signature.as_deref().is_some_and(|signature| !is_hex(signature)) {
        v.push("signature", "Invalid signature");
    }

    v.finish(())?;
    match (address, message, signature) {
        (Some(address), Some(message), Some(signature)) => Ok(SiweRequest {
            address,
            message,
            signature,
        }),
        _ => Err(ApiError::invalid_message()),
    }
}

fn rejected(outcome: &'static str, err: ApiError) -> ApiError {
    SIWE_VERIFICATIONS.with_label_values(&[outcome]).inc();
    err
}

#[instrument(skip_all)]
pub async fn verify_siwe(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let request = parse_siwe_request(&body)?;
    let key = nonce_key(&request.address);

    let message = SiweMessage::parse(&request.message)
        .map_err(|_| rejected("invalid_message", ApiError::invalid_message()))?;
    let Some(nonce) = message.nonce.as_deref() else {
        return Err(rejected("invalid_message", ApiError::invalid_message()));
    };
    if message
        .address
        .as_deref()
        .is_some_and(|signed_for| !signed_for.eq_ignore_ascii_case(&request.address))
    {
        return Err(rejected("invalid_message", ApiError::invalid_message()));
    }
    if !message.is_valid_at(Utc::now()) {
        return Err(rejected("invalid_message", ApiError::invalid_message()));
    }

    let stored = state.kv.get(&key).await?;
    if stored.as_deref() != Some(nonce) {
        return Err(rejected("invalid_message", ApiError::invalid_message()));
    }

    if let Err(err) =
        verify_personal_signature(&request.address, &request.message, &request.signature)
    {
        warn!(error = %err, "siwe signature rejected");
        return Err(rejected(
            "invalid_signature",
            ApiError::unauthorized_with("invalid_signature", "Invalid signature"),
        ));
    }

    let user = state
        .repositories
        .users()
        .find_or_create(&request.address)
        .await?;

    // Only one request may spend a nonce, and a newer nonce for the same
    // address stays usable.
    if !state.kv.consume(&key, nonce).await? {
        return Err(rejected("invalid_message", ApiError::invalid_message()));
    }

    let token = state
        .tokens
        .sign(&AuthUser {
            sub: user.id,
            address: request.address,
        })
        .map_err(|err| {
            warn!(error = %err, "failed to sign session token");
            rejected(
                "token_error",
                ApiError::unauthorized_with("failed_to_generate_token", "Failed to generate token"),
            )
        })?;

    SIWE_VERIFICATIONS.with_label_values(&["success"]).inc();
    info!(user = %user.id, "wallet signed in");
    Ok(ok(TokenResponse { token }))
}
