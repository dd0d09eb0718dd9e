use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};
use tracing::debug;

use crate::error::{AuthError, Result};

/// Keccak-256 of the EIP-191 "personal_sign" envelope around `message`.
pub fn personal_message_hash(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(format!("\x19Ethereum Signed Message:\n{}", message.len()).as_bytes());
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// Lowercase `0x` address derived from an uncompressed public key.
pub fn address_from_key(key: &VerifyingKey) -> String {
    let point = key.as_affine().to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

fn split_signature(signature: &str) -> Result<(Signature, RecoveryId)> {
    let raw = signature
        .strip_prefix("0x")
        .ok_or(AuthError::InvalidSignature)?;
    let bytes = hex::decode(raw).map_err(|_| AuthError::InvalidSignature)?;
    if bytes.len() != 65 {
        return Err(AuthError::InvalidSignature);
    }

    let v = match bytes[64] {
        27 | 28 => bytes[64] - 27,
        v @ (0 | 1) => v,
        _ => return Err(AuthError::InvalidSignature),
    };
    let mut recovery_id = RecoveryId::from_byte(v).ok_or(AuthError::InvalidSignature)?;
    let mut sig = Signature::from_slice(&bytes[..64]).map_err(|_| AuthError::InvalidSignature)?;

    // Recovery only accepts low-s; flipping s mirrors the point's y parity.
    if let Some(normalized) = sig.normalize_s() {
        sig = normalized;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }
    Ok((sig, recovery_id))
}

/// Recovers the signer of an EIP-191 personal message and compares it with
/// `address`, ignoring case.
pub fn verify_personal_signature(address: &str, message: &str, signature: &str) -> Result<()> {
    let (sig, recovery_id) = split_signature(signature)?;
    let digest = personal_message_hash(message);
    let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|_| AuthError::InvalidSignature)?;

    let recovered = address_from_key(&key);
    if recovered.eq_ignore_ascii_case(address) {
        Ok(())
    } else {
        debug!(%recovered, expected = %address, "signature recovered a different signer");
        Err(AuthError::InvalidSignature)
    }
}
