//! KSO-1 handshake signing and per-event signature verification (spec §4.1).

use std::time::SystemTime;

use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::rfc1123::format_gmt;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 accepts a key of any length (it's hashed down if it exceeds
/// the block size), so construction cannot fail here.
#[allow(clippy::expect_used)]
fn new_hmac(secret: &str) -> HmacSha256 {
    <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).expect("HMAC key of any length is valid")
}

/// `X-Kso-Date` and `X-Kso-Authorization` header values for the WebSocket
/// handshake request.
pub(crate) struct HandshakeHeaders {
    pub(crate) date: String,
    pub(crate) authorization: String,
}

/// Build the handshake headers for `GET <uri>` at `now`.
///
/// `stringToSign = "KSO-1" + "GET" + uri + "" + dateStr + ""` (the empty
/// segments are literal per spec §4.1 — there is no `Content-MD5` or
/// `Content-Type` leg in this handshake, unlike typical AWS-style
/// signing schemes this one is modeled on).
pub(crate) fn sign_handshake(
    app_id: &str,
    app_secret: &str,
    uri: &str,
    now: SystemTime,
) -> HandshakeHeaders {
    let date = format_gmt(now);
    let string_to_sign = format!("KSO-1GET{uri}{date}");

    let mut mac = new_hmac(app_secret);
    mac.update(string_to_sign.as_bytes());
    let sig_hex = hex::encode(mac.finalize().into_bytes());

    HandshakeHeaders {
        date,
        authorization: format!("KSO-1 {app_id}:{sig_hex}"),
    }
}

/// Compute the URL-safe, unpadded base64 HMAC-SHA256 signature for an
/// inbound event, per spec §4.1:
/// `content = accessKey + ":" + topic + ":" + nonce + ":" + time + ":" + encryptedData`.
fn event_signature(
    access_key: &str,
    app_secret: &str,
    topic: &str,
    nonce: &str,
    time: i64,
    encrypted_data: &str,
) -> String {
    let content = format!("{access_key}:{topic}:{nonce}:{time}:{encrypted_data}");
    let mut mac = new_hmac(app_secret);
    mac.update(content.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

/// Verify an inbound event's signature in constant time. Mismatched lengths
/// compare as `false` without a timing-variable short circuit on content.
pub(crate) fn verify_event_signature(
    access_key: &str,
    app_secret: &str,
    topic: &str,
    nonce: &str,
    time: i64,
    encrypted_data: &str,
    signature: &str,
) -> bool {
    let expected = event_signature(access_key, app_secret, topic, nonce, time, encrypted_data);
    if expected.len() != signature.len() {
        return false;
    }
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

/// Test-only access to [`event_signature`] for constructing valid frames in
/// other modules' test suites.
#[cfg(test)]
pub(crate) fn sign_event_signature_for_test(
    access_key: &str,
    app_secret: &str,
    topic: &str,
    nonce: &str,
    time: i64,
    encrypted_data: &str,
) -> String {
    event_signature(access_key, app_secret, topic, nonce, time, encrypted_data)
}
