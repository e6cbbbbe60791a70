pub mod gcm;
pub mod openssl;
pub mod rsa;

use crate::error::GatewayResult;
use crate::types::WrapScheme;

/// Capability contract for RSA session-key unwrapping.
///
/// Two independent implementations exist — the RustCrypto one in
/// `crypto::rsa` and the OpenSSL one in `crypto::openssl` — behind the
/// same contract, so cross-implementation equivalence is directly
/// testable: any ciphertext produced by [`rsa::encrypt`] must unwrap to
/// bit-identical plaintext through both, for both padding schemes.
pub trait KeyUnwrap {
    fn unwrap_key(
        &self,
        private_key_pem: &str,
        ciphertext: &[u8],
        scheme: WrapScheme,
    ) -> GatewayResult<Vec<u8>>;
}

/// Unwrap a wrapped session key, dispatching by padding scheme.
///
/// PKCS#1 v1.5 runs through the OpenSSL provider — the scheme the
/// gateway mandates, matched against its OpenSSL-based reference
/// implementation. OAEP runs through the RustCrypto provider.
pub fn decrypt(
    private_key_pem: &str,
    ciphertext: &[u8],
    scheme: WrapScheme,
) -> GatewayResult<Vec<u8>> {
    match scheme {
        WrapScheme::Oaep => {
            self::rsa::RsaCryptoProvider.unwrap_key(private_key_pem, ciphertext, scheme)
        }
        WrapScheme::Pkcs1 => {
            self::openssl::OpensslProvider.unwrap_key(private_key_pem, ciphertext, scheme)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_PEM: &str = include_str!("../../testfiles/gateway_rsa.pem");
    const PUBLIC_PEM: &str = include_str!("../../testfiles/gateway_pub.pem");

    #[test]
    fn dispatched_decrypt_round_trips_both_schemes() {
        for scheme in [WrapScheme::Oaep, WrapScheme::Pkcs1] {
            let wrapped = rsa::encrypt(PUBLIC_PEM, b"one fresh session key", scheme).unwrap();
            let unwrapped = decrypt(PRIVATE_PEM, &wrapped, scheme).unwrap();
            assert_eq!(unwrapped, b"one fresh session key");
        }
    }
}
