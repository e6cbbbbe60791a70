use data_encoding::BASE64;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

/// Nonce length used when the caller has no reason to pick another.
pub const DEFAULT_NONCE_LENGTH: usize = 32;

/// Inputs to one `X-Signature` header value.
#[derive(Debug, Clone)]
pub struct SignatureContext {
    pub client_id: String,
    /// Shared secret, used directly as the HMAC key. The gateway defines
    /// no key derivation and no minimum secret length.
    pub secret: String,
    pub nonce: String,
}

/// Build the signature header value:
/// `"{clientId} {nonce} {base64(HMAC-SHA256(secret, clientId ‖ nonce))}"`.
///
/// Deterministic for fixed inputs; all randomness lives in the nonce.
pub fn generate_signature(ctx: &SignatureContext) -> String {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(ctx.secret.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(ctx.client_id.as_bytes());
    mac.update(ctx.nonce.as_bytes());
    let digest = mac.finalize().into_bytes();
    format!("{} {} {}", ctx.client_id, ctx.nonce, BASE64.encode(&digest))
}

/// Random alphanumeric nonce of `length` characters.
///
/// Draws from the thread-local generator: nonces need only per-request
/// uniqueness. Identifiers that need OS-entropy-backed unpredictability
/// come from `ident::random_id` instead.
pub fn generate_nonce(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| rng.sample(rand::distr::Alphanumeric) as char)
        .collect()
}
