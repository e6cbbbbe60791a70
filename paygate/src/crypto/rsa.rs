use rsa::{
    RsaPrivateKey, RsaPublicKey, oaep,
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey},
    pkcs1v15,
    pkcs8::{DecodePrivateKey, DecodePublicKey},
    traits::{Decryptor, RandomizedEncryptor},
};
use sha2::Sha256;

use crate::crypto::KeyUnwrap;
use crate::error::{GatewayError, GatewayResult};
use crate::types::WrapScheme;

/// Parse an RSA private key from PEM, accepting PKCS#1
/// (`RSA PRIVATE KEY`) with PKCS#8 (`PRIVATE KEY`) as fallback.
pub(crate) fn parse_private_key(pem: &str) -> GatewayResult<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs1_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs8_pem(pem))
        .map_err(|e| GatewayError::RsaKeyParse(e.to_string()))
}

/// Parse an RSA public key from PEM, accepting SPKI (`PUBLIC KEY`) with
/// PKCS#1 (`RSA PUBLIC KEY`) as fallback.
pub(crate) fn parse_public_key(pem: &str) -> GatewayResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| GatewayError::RsaKeyParse(e.to_string()))
}

/**
    RSA session-key wrapping under the gateway public key.

    Parameters (protocol-mandated):
      PKCS1: PKCS#1 v1.5 padding — required by the gateway's inbound
             endpoint for the `wk` field.
      OAEP: SHA-256 digest, MGF1-SHA-256 mask, empty label — used
            wherever the gateway does not dictate PKCS#1 v1.5.

    Input: the raw 32-byte session key (any non-empty plaintext within
    the modulus limit is accepted; the protocol only ever wraps keys).
    Output: ciphertext of modulus size (256 bytes for 2048-bit keys).
*/
pub fn encrypt(
    public_key_pem: &str,
    plaintext: &[u8],
    scheme: WrapScheme,
) -> GatewayResult<Vec<u8>> {
    if public_key_pem.trim().is_empty() {
        return Err(GatewayError::EmptyInput("public key"));
    }
    if plaintext.is_empty() {
        return Err(GatewayError::EmptyInput("plaintext"));
    }
    let public_key = parse_public_key(public_key_pem)?;
    let mut rng = rsa::rand_core::OsRng;
    match scheme {
        WrapScheme::Oaep => oaep::EncryptingKey::<Sha256>::new(public_key)
            .encrypt_with_rng(&mut rng, plaintext)
            .map_err(|e| GatewayError::Encryption(format!("RSA-OAEP wrap: {e}"))),
        WrapScheme::Pkcs1 => pkcs1v15::EncryptingKey::new(public_key)
            .encrypt_with_rng(&mut rng, plaintext)
            .map_err(|e| GatewayError::Encryption(format!("RSA-PKCS1v15 wrap: {e}"))),
    }
}

/// Session-key unwrapping through the RustCrypto `rsa` implementation.
///
/// One of the two independent unwrap providers; see
/// [`crate::crypto::decrypt`] for how production traffic is dispatched.
pub struct RsaCryptoProvider;

impl KeyUnwrap for RsaCryptoProvider {
    fn unwrap_key(
        &self,
        private_key_pem: &str,
        ciphertext: &[u8],
        scheme: WrapScheme,
    ) -> GatewayResult<Vec<u8>> {
        let private_key = parse_private_key(private_key_pem)?;
        match scheme {
            WrapScheme::Oaep => oaep::DecryptingKey::<Sha256>::new(private_key)
                .decrypt(ciphertext)
                .map_err(|e| GatewayError::Decryption(format!("RSA-OAEP unwrap: {e}"))),
            WrapScheme::Pkcs1 => pkcs1v15::DecryptingKey::new(private_key)
                .decrypt(ciphertext)
                .map_err(|e| GatewayError::Decryption(format!("RSA-PKCS1v15 unwrap: {e}"))),
        }
    }
}
