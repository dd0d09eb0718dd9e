use sha3::{Digest, Keccak256};

fn hex_body(value: &str) -> Option<&str> {
    value
        .strip_prefix("0x")
        .filter(|body| body.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// `0x` followed by hex digits.
pub fn is_hex(value: &str) -> bool {
    hex_body(value).is_some()
}

/// EIP-55 mixed-case rendering of a 20-byte address. Returns `None` for
/// anything that is not `0x` + 40 hex digits.
pub fn to_checksum_address(address: &str) -> Option<String> {
    let body = hex_body(address).filter(|body| body.len() == 40)?;
    let lower = body.to_ascii_lowercase();
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    Some(out)
}

/// Accepts all-lowercase addresses and mixed-case ones with a valid EIP-55
/// checksum.
pub fn is_address(value: &str) -> bool {
    let Some(body) = hex_body(value) else {
        return false;
    };
    if body.len() != 40 {
        return false;
    }
    if body.bytes().all(|b| !b.is_ascii_uppercase()) {
        return true;
    }
    to_checksum_address(value).as_deref() == Some(value)
}
