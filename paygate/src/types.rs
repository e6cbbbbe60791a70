use serde::{Deserialize, Serialize};

use crate::constants::TAG_LENGTH;

/// RSA padding scheme for session-key wrapping.
///
/// The gateway's inbound endpoint mandates PKCS#1 v1.5 for the `wk`
/// field; OAEP (SHA-256 digest and MGF1-SHA-256 mask) is the preferred
/// scheme everywhere the gateway does not dictate otherwise.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapScheme {
    #[default]
    Oaep,
    Pkcs1,
}

/// Output of one AES-256-GCM encryption.
///
/// The gateway transmits the combined form: `ciphertext ‖ tag`, with the
/// tag always in the trailing 16 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherEnvelope {
    pub ciphertext: Vec<u8>,
    pub iv: Vec<u8>,
    /// 16-byte GCM authentication tag.
    pub tag: Vec<u8>,
}

impl CipherEnvelope {
    /// Combined wire form `ciphertext ‖ tag`.
    pub fn full_ciphertext(&self) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.ciphertext.len() + TAG_LENGTH);
        full.extend_from_slice(&self.ciphertext);
        full.extend_from_slice(&self.tag);
        full
    }
}

/// Inner envelope encrypted into the outbound `payload` field:
/// the target URL plus the base64 of the business payload JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerPayload {
    pub url: String,
    pub payload: String,
}

/// Outbound JSON body. Field names are the gateway's own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    /// base64(RSA(session key)) — the wrapped session key.
    pub wk: String,
    /// base64(AES-256-GCM ciphertext ‖ tag) of the inner envelope.
    pub payload: String,
    /// Request reference identifier; its raw UTF-8 bytes are the GCM IV.
    pub req_ref_no: String,
}

/// Inbound JSON body. Field names are the gateway's own.
///
/// Only `respCode` is guaranteed present; rejection responses routinely
/// omit the encrypted body and the response reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub resp_code: String,
    #[serde(default)]
    pub resp_desc: String,
    #[serde(default)]
    pub req_ref_no: String,
    /// Response reference identifier; its raw UTF-8 bytes are the IV for
    /// decrypting `response`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resp_ref_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,
    /// base64(AES-256-GCM ciphertext ‖ tag), encrypted under the same
    /// session key as the request it answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}
