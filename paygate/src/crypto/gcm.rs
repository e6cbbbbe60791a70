use aes::Aes256;
use aes_gcm::aead::Aead;
use aes_gcm::aead::consts::{U6, U7, U8, U9, U10, U11, U12, U13, U14, U15, U16};
use aes_gcm::aead::generic_array::ArrayLength;
use aes_gcm::{AesGcm, KeyInit, Nonce};
use rand::{TryRngCore, rngs::OsRng};

use crate::constants::{DEFAULT_IV_LENGTH, IV_MAX_LENGTH, IV_MIN_LENGTH, KEY_LENGTH, TAG_LENGTH};
use crate::error::{GatewayError, GatewayResult};
use crate::types::CipherEnvelope;

/// Generate a fresh 32-byte AES-256 session key from the OS generator.
pub fn generate_key() -> GatewayResult<[u8; KEY_LENGTH]> {
    let mut key = [0u8; KEY_LENGTH];
    OsRng
        .try_fill_bytes(&mut key)
        .map_err(|e| GatewayError::Rng(e.to_string()))?;
    Ok(key)
}

/// Generate a random IV of `length` bytes (6..=16).
pub fn generate_iv(length: usize) -> GatewayResult<Vec<u8>> {
    check_iv(length)?;
    let mut iv = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| GatewayError::Rng(e.to_string()))?;
    Ok(iv)
}

/// Generate a random IV and return it as an uppercase hex string
/// (two characters per IV byte).
pub fn generate_iv_hex(length: usize) -> GatewayResult<String> {
    Ok(hex::encode_upper(generate_iv(length)?))
}

/**
    AES-256-GCM encryption.

    Parameters (protocol-mandated):
      Key: exactly 32 bytes.
      IV: 6-16 bytes; when omitted, 6 random bytes are drawn. The short
          default comes from the gateway's reference-identifier-as-IV
          convention and must not be widened.
      Tag: 16 bytes, returned separately in the envelope; the wire form
          is `ciphertext ‖ tag` via `CipherEnvelope::full_ciphertext`.

    Empty plaintext is rejected — the protocol never encrypts nothing.
*/
pub fn encrypt(key: &[u8], plaintext: &[u8], iv: Option<&[u8]>) -> GatewayResult<CipherEnvelope> {
    check_key(key)?;
    if plaintext.is_empty() {
        return Err(GatewayError::EmptyInput("plaintext"));
    }
    let iv = match iv {
        Some(iv) => {
            check_iv(iv.len())?;
            iv.to_vec()
        }
        None => generate_iv(DEFAULT_IV_LENGTH)?,
    };

    let mut sealed = seal_dispatch(key, &iv, plaintext)?;
    let tag = sealed.split_off(sealed.len() - TAG_LENGTH);
    Ok(CipherEnvelope { ciphertext: sealed, iv, tag })
}

/**
    AES-256-GCM decryption with explicit tag.

    Fails with `AuthTagMismatch` when tag verification fails — a distinct
    kind from the shape errors, so callers can tell tampering apart from
    malformed input. All argument validation happens before the cipher
    runs.
*/
pub fn decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8], tag: &[u8]) -> GatewayResult<Vec<u8>> {
    check_key(key)?;
    check_iv(iv.len())?;
    if tag.len() != TAG_LENGTH {
        return Err(GatewayError::InvalidTagLength(tag.len()));
    }
    if ciphertext.is_empty() {
        return Err(GatewayError::EmptyInput("ciphertext"));
    }

    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_LENGTH);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);
    open_dispatch(key, iv, &combined)
}

/// Split a combined `ciphertext ‖ tag` buffer (tag in the trailing 16
/// bytes, as the gateway transmits it) and decrypt.
pub fn decrypt_full_ciphertext(key: &[u8], iv: &[u8], full: &[u8]) -> GatewayResult<Vec<u8>> {
    if full.len() < TAG_LENGTH {
        return Err(GatewayError::CiphertextTooShort { len: full.len(), need: TAG_LENGTH });
    }
    let (ciphertext, tag) = full.split_at(full.len() - TAG_LENGTH);
    decrypt(key, iv, ciphertext, tag)
}

fn check_key(key: &[u8]) -> GatewayResult<()> {
    if key.len() != KEY_LENGTH {
        return Err(GatewayError::InvalidKeyLength { expected: KEY_LENGTH, got: key.len() });
    }
    Ok(())
}

fn check_iv(length: usize) -> GatewayResult<()> {
    if !(IV_MIN_LENGTH..=IV_MAX_LENGTH).contains(&length) {
        return Err(GatewayError::InvalidIvLength(length));
    }
    Ok(())
}

// The cipher fixes the nonce length in its type; the gateway varies it
// at runtime (reference identifiers are 6-16 bytes), so each legal
// length dispatches to its own instantiation. The cipher handles
// non-96-bit nonces with the standard GHASH counter-block derivation.

fn seal_dispatch(key: &[u8], iv: &[u8], plaintext: &[u8]) -> GatewayResult<Vec<u8>> {
    match iv.len() {
        6 => seal::<U6>(key, iv, plaintext),
        7 => seal::<U7>(key, iv, plaintext),
        8 => seal::<U8>(key, iv, plaintext),
        9 => seal::<U9>(key, iv, plaintext),
        10 => seal::<U10>(key, iv, plaintext),
        11 => seal::<U11>(key, iv, plaintext),
        12 => seal::<U12>(key, iv, plaintext),
        13 => seal::<U13>(key, iv, plaintext),
        14 => seal::<U14>(key, iv, plaintext),
        15 => seal::<U15>(key, iv, plaintext),
        16 => seal::<U16>(key, iv, plaintext),
        n => Err(GatewayError::InvalidIvLength(n)),
    }
}

fn open_dispatch(key: &[u8], iv: &[u8], combined: &[u8]) -> GatewayResult<Vec<u8>> {
    match iv.len() {
        6 => open::<U6>(key, iv, combined),
        7 => open::<U7>(key, iv, combined),
        8 => open::<U8>(key, iv, combined),
        9 => open::<U9>(key, iv, combined),
        10 => open::<U10>(key, iv, combined),
        11 => open::<U11>(key, iv, combined),
        12 => open::<U12>(key, iv, combined),
        13 => open::<U13>(key, iv, combined),
        14 => open::<U14>(key, iv, combined),
        15 => open::<U15>(key, iv, combined),
        16 => open::<U16>(key, iv, combined),
        n => Err(GatewayError::InvalidIvLength(n)),
    }
}

fn seal<N: ArrayLength<u8>>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> GatewayResult<Vec<u8>> {
    let cipher = AesGcm::<Aes256, N>::new_from_slice(key)
        .map_err(|e| GatewayError::Encryption(e.to_string()))?;
    cipher
        .encrypt(Nonce::<N>::from_slice(iv), plaintext)
        .map_err(|e| GatewayError::Encryption(format!("AES-256-GCM seal: {e}")))
}

fn open<N: ArrayLength<u8>>(key: &[u8], iv: &[u8], combined: &[u8]) -> GatewayResult<Vec<u8>> {
    let cipher = AesGcm::<Aes256, N>::new_from_slice(key)
        .map_err(|e| GatewayError::Decryption(e.to_string()))?;
    cipher
        .decrypt(Nonce::<N>::from_slice(iv), combined)
        .map_err(|_| GatewayError::AuthTagMismatch)
}
