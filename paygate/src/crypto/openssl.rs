use openssl::encrypt::Decrypter;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::rsa::Padding;

use crate::crypto::KeyUnwrap;
use crate::error::{GatewayError, GatewayResult};
use crate::types::WrapScheme;

/// Session-key unwrapping through OpenSSL.
///
/// Deliberately shares no code with the primary provider in
/// `crypto::rsa`: padding and format edge cases differ subtly between
/// RSA implementations, and the gateway's reference implementation is
/// OpenSSL-based, so the PKCS#1 v1.5 production path runs through this
/// provider and equivalence with the primary one is asserted in tests
/// rather than assumed.
pub struct OpensslProvider;

impl KeyUnwrap for OpensslProvider {
    fn unwrap_key(
        &self,
        private_key_pem: &str,
        ciphertext: &[u8],
        scheme: WrapScheme,
    ) -> GatewayResult<Vec<u8>> {
        let pkey = PKey::private_key_from_pem(private_key_pem.as_bytes())
            .map_err(|e| GatewayError::RsaKeyParse(e.to_string()))?;
        let mut decrypter = Decrypter::new(&pkey)
            .map_err(|e| GatewayError::Decryption(format!("OpenSSL decrypter init: {e}")))?;
        match scheme {
            WrapScheme::Oaep => {
                decrypter
                    .set_rsa_padding(Padding::PKCS1_OAEP)
                    .and_then(|_| decrypter.set_rsa_oaep_md(MessageDigest::sha256()))
                    .and_then(|_| decrypter.set_rsa_mgf1_md(MessageDigest::sha256()))
                    .map_err(|e| GatewayError::Decryption(format!("OpenSSL OAEP setup: {e}")))?;
            }
            WrapScheme::Pkcs1 => {
                decrypter
                    .set_rsa_padding(Padding::PKCS1)
                    .map_err(|e| GatewayError::Decryption(format!("OpenSSL padding setup: {e}")))?;
            }
        }

        let buffer_len = decrypter
            .decrypt_len(ciphertext)
            .map_err(|e| GatewayError::Decryption(format!("OpenSSL unwrap: {e}")))?;
        let mut plaintext = vec![0u8; buffer_len];
        let written = decrypter
            .decrypt(ciphertext, &mut plaintext)
            .map_err(|e| GatewayError::Decryption(format!("OpenSSL unwrap: {e}")))?;
        plaintext.truncate(written);
        Ok(plaintext)
    }
}
