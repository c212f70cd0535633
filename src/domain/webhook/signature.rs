//! HMAC-SHA256 payload signing and verification.
//!
//! `sign` produces the digest carried in the `X-FisioFlow-Signature` header
//! (prefixed with `sha256=` by the delivery engine). `verify` is the
//! wire-level contract subscribers implement before trusting a payload; the
//! dispatcher itself never calls it.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Error parsing a signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureParseError {
    /// Header is empty or missing.
    MissingHeader,
    /// Missing the `sha256=` prefix.
    MissingPrefix,
    /// Digest is not exactly 64 characters.
    WrongLength,
    /// Digest contains non-hex characters.
    InvalidHex,
}

impl std::fmt::Display for SignatureParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "Missing or empty signature header"),
            Self::MissingPrefix => write!(f, "Invalid signature format (missing sha256= prefix)"),
            Self::WrongLength => write!(f, "Invalid signature length (not 64 hex chars)"),
            Self::InvalidHex => write!(f, "Invalid signature (not hex)"),
        }
    }
}

impl std::error::Error for SignatureParseError {}

/// Computes the HMAC-SHA256 of `payload` keyed by `secret`, as lowercase hex.
pub fn sign(payload: &[u8], secret: &str) -> String {
    hex_encode(&hmac_sha256(payload, secret))
}

/// Verifies a signature header of the form `sha256=<64 hex chars>` against
/// the payload.
///
/// Rejections are logged with their reason. Digest comparison is
/// constant-time and never short-circuits on mismatch.
pub fn verify(payload: &[u8], signature_header: &str, secret: &str) -> bool {
    let provided = match parse_signature_header(signature_header) {
        Ok(bytes) => bytes,
        Err(reason) => {
            tracing::warn!(reason = %reason, "Rejected webhook signature header");
            return false;
        }
    };

    let expected = hmac_sha256(payload, secret);
    if expected.len() != provided.len() {
        tracing::warn!("Rejected webhook signature: digest length mismatch");
        return false;
    }

    expected.as_slice().ct_eq(provided.as_slice()).unwrap_u8() == 1
}

/// Parses a signature header into the raw digest bytes.
pub fn parse_signature_header(header: &str) -> Result<Vec<u8>, SignatureParseError> {
    if header.is_empty() {
        return Err(SignatureParseError::MissingHeader);
    }
    let hex = header
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(SignatureParseError::MissingPrefix)?;
    if hex.len() != 64 {
        return Err(SignatureParseError::WrongLength);
    }
    hex_decode(hex).ok_or(SignatureParseError::InvalidHex)
}

fn hmac_sha256(payload: &[u8], secret: &str) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Decode a hex string to bytes.
fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }

    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let byte = u8::from_str_radix(hex.get(i..i + 2)?, 16).ok()?;
        bytes.push(byte);
    }
    Some(bytes)
}

/// Encode bytes to hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
