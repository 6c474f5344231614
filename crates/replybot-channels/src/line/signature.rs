//! `x-line-signature` verification: base64(HMAC-SHA256(channel secret, body)).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

fn keyed(secret: &str, body: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(mac)
}

/// Compute the signature LINE would send for `body`. Empty if the key is
/// rejected, which never verifies.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let Some(mac) = keyed(secret, body) else {
        return String::new();
    };
    BASE64.encode(mac.finalize().into_bytes())
}

/// Constant-time check of `signature` against the exact request bytes.
///
/// An empty secret never verifies.
pub fn verify(secret: &str, body: &[u8], signature: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Ok(expected) = BASE64.decode(signature.trim()) else {
        return false;
    };
    let Some(mac) = keyed(secret, body) else {
        return false;
    };
    mac.verify_slice(&expected).is_ok()
}
