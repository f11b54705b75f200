//! AES-256-CBC decryption with a tolerant PKCS7 unpad (spec §4.2).
//!
//! Key derivation is the spec's documented oddity: the AES-256 key is the
//! *ASCII bytes of the lowercase-hex MD5 string* of the secret key (32
//! bytes), not the 16 raw MD5 digest bytes. This has to be preserved
//! bit-for-bit for wire compatibility with the server.

use base64::Engine as _;
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::error::{Error, Result};

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

const BLOCK_SIZE: usize = 16;

fn derive_key(secret_key: &str) -> [u8; 32] {
    let digest = md5::compute(secret_key.as_bytes());
    let hex = format!("{digest:x}");
    let mut key = [0u8; 32];
    key.copy_from_slice(hex.as_bytes());
    key
}

fn iv_from_nonce(nonce: &str) -> Result<[u8; 16]> {
    let bytes = nonce.as_bytes();
    if bytes.len() < BLOCK_SIZE {
        return Err(Error::DecryptError(format!(
            "nonce too short for IV: {} bytes, need at least {BLOCK_SIZE}",
            bytes.len()
        )));
    }
    let mut iv = [0u8; 16];
    iv.copy_from_slice(&bytes[..BLOCK_SIZE]);
    Ok(iv)
}

/// Strip PKCS7 padding, tolerating implausible padding by returning the
/// buffer unmodified rather than failing (spec §4.2/§9 — preserved for
/// compatibility with server paths that may send unpadded data).
fn strip_pkcs7(mut buf: Vec<u8>) -> Vec<u8> {
    let Some(&last) = buf.last() else {
        return buf;
    };
    let pad = last as usize;
    if pad == 0 || pad > BLOCK_SIZE || pad > buf.len() {
        return buf;
    }
    let tail_start = buf.len() - pad;
    if buf[tail_start..].iter().all(|&b| b as usize == pad) {
        buf.truncate(tail_start);
    }
    buf
}

/// Decrypt an inbound event's `encrypted_data` (standard base64) using
/// `secret_key` and `nonce`, per spec §4.2.
pub(crate) fn decrypt(secret_key: &str, encrypted_data: &str, nonce: &str) -> Result<String> {
    let key = derive_key(secret_key);
    let iv = iv_from_nonce(nonce)?;

    let mut ciphertext = base64::engine::general_purpose::STANDARD
        .decode(encrypted_data)
        .map_err(|e| Error::DecryptError(format!("invalid base64: {e}")))?;

    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(Error::DecryptError(format!(
            "ciphertext length {} is not a multiple of the block size",
            ciphertext.len()
        )));
    }

    let decryptor = Aes256CbcDec::new(&key.into(), &iv.into());
    let plain_len = decryptor
        .decrypt_padded_mut::<NoPadding>(&mut ciphertext)
        .map_err(|e| Error::DecryptError(format!("cipher error: {e}")))?
        .len();
    ciphertext.truncate(plain_len);

    let unpadded = strip_pkcs7(ciphertext);
    String::from_utf8(unpadded).map_err(|e| Error::DecryptError(format!("invalid utf-8: {e}")))
}

/// Test-only counterpart to [`decrypt`], used by round-trip property tests.
#[cfg(test)]
pub(crate) fn encrypt_for_test(plaintext: &str, secret_key: &str, nonce: &str) -> String {
    let key = derive_key(secret_key);
    let iv = iv_from_nonce(nonce).expect("test nonce is at least 16 bytes");

    let data = plaintext.as_bytes();
    let pad = BLOCK_SIZE - (data.len() % BLOCK_SIZE);
    let mut buf = data.to_vec();
    buf.extend(std::iter::repeat(pad as u8).take(pad));

    let encryptor = Aes256CbcEnc::new(&key.into(), &iv.into());
    let buf_len = buf.len();
    let ciphertext = encryptor
        .encrypt_padded_mut::<NoPadding>(&mut buf, buf_len)
        .expect("buffer is already block-aligned");
    base64::engine::general_purpose::STANDARD.encode(ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_ascii() {
        let secret = "my_secret_key_12";
        let nonce = "nonce_12345678901234567890";
        let plaintext = r#"{"message":"hello"}"#;
        let ciphertext = encrypt_for_test(plaintext, secret, nonce);
        assert_eq!(decrypt(secret, &ciphertext, nonce).unwrap(), plaintext);
    }

    #[test]
    fn round_trip_unicode() {
        let secret = "my_secret_key_12";
        let nonce = "nonce_12345678901234567890";
        let plaintext = r#"{"message":"你好，世界！"}"#;
        let ciphertext = encrypt_for_test(plaintext, secret, nonce);
        assert_eq!(decrypt(secret, &ciphertext, nonce).unwrap(), plaintext);
    }

    #[test]
    fn key_is_hex_string_bytes_not_raw_digest() {
        let digest = md5::compute(b"my_secret_key_12");
        let hex = format!("{digest:x}");
        assert_eq!(derive_key("my_secret_key_12"), hex.as_bytes());
    }

    #[test]
    fn nonce_shorter_than_block_size_errors() {
        let err = iv_from_nonce("short").unwrap_err();
        assert!(matches!(err, Error::DecryptError(_)));
    }

    #[test]
    fn implausible_padding_is_left_unmodified() {
        let buf = vec![1, 2, 3, 4];
        assert_eq!(strip_pkcs7(buf.clone()), buf);
    }

    #[test]
    fn valid_padding_is_stripped() {
        let buf = vec![b'a', b'b', b'c', 3, 3, 3];
        assert_eq!(strip_pkcs7(buf), vec![b'a', b'b', b'c']);
    }

    #[test]
    fn zero_padding_byte_is_implausible() {
        let buf = vec![1, 2, 3, 0];
        assert_eq!(strip_pkcs7(buf.clone()), buf);
    }

    #[test]
    fn invalid_base64_is_a_decrypt_error() {
        let err = decrypt("secret", "not base64!!", "nonce_12345678901234567890").unwrap_err();
        assert!(matches!(err, Error::DecryptError(_)));
    }
}
