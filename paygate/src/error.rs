use thiserror::Error;

use crate::types::ResponseEnvelope;

/// Errors specific to the gateway envelope exchange.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    // ── Input validation ──────────────────────────────────────────────
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),
    #[error("invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("IV length {0} outside supported range 6..=16")]
    InvalidIvLength(usize),
    #[error("auth tag must be 16 bytes, got {0}")]
    InvalidTagLength(usize),
    #[error("ciphertext too short ({len} bytes, need at least {need})")]
    CiphertextTooShort { len: usize, need: usize },
    #[error("missing required response field '{0}'")]
    MissingField(&'static str),
    #[error("reference identifier is {0} bytes, outside the 6..=16 IV range")]
    InvalidReference(usize),

    // ── Encoding ──────────────────────────────────────────────────────
    #[error("invalid base64: {0}")]
    InvalidBase64(String),
    #[error("input is not PEM-formatted key material")]
    InvalidPem,

    // ── Crypto providers ──────────────────────────────────────────────
    #[error("RSA key parse failed: {0}")]
    RsaKeyParse(String),
    #[error("public key derivation failed: {0}")]
    KeyDerivation(String),
    #[error("encryption failed: {0}")]
    Encryption(String),
    #[error("decryption failed: {0}")]
    Decryption(String),
    #[error("random source failure: {0}")]
    Rng(String),

    // ── Authentication ────────────────────────────────────────────────
    #[error("AES-GCM authentication tag mismatch")]
    AuthTagMismatch,

    // ── Gateway exchange ──────────────────────────────────────────────
    #[error("gateway rejected request: respCode {} ({})", .0.resp_code, .0.resp_desc)]
    GatewayRejected(Box<ResponseEnvelope>),
    #[error("no exchange in flight (build_request must run first)")]
    NoActiveExchange,
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("payload encode/decode failed: {0}")]
    Payload(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Payload(e.to_string())
    }
}

impl From<data_encoding::DecodeError> for GatewayError {
    fn from(e: data_encoding::DecodeError) -> Self {
        Self::InvalidBase64(e.to_string())
    }
}

/// Type alias for results that may return a [`GatewayError`].
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
