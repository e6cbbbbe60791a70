use data_encoding::BASE64URL_NOPAD;
use rand::{TryRngCore, rngs::OsRng};

use crate::error::{GatewayError, GatewayResult};

/// Alphabet flavor for [`random_id`].
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdFlavor {
    /// Uppercase hex — the gateway's reference-identifier alphabet.
    #[default]
    Hex,
    /// base64url with `-`, `_` and `/` stripped, leaving alphanumerics.
    UrlSafe,
}

/// Generate a random identifier of exactly `length` characters.
///
/// Hex flavor draws `length` bytes from the OS generator, hex-encodes
/// them and keeps the last `length` characters, uppercased. URL-safe
/// flavor base64url-encodes random bytes, strips the non-alphanumeric
/// symbols and keeps the last `length` characters.
///
/// Uniqueness is probabilistic only; a failing OS random source is
/// propagated, never masked.
pub fn random_id(length: usize, flavor: IdFlavor) -> GatewayResult<String> {
    match flavor {
        IdFlavor::Hex => hex_id(length, true),
        IdFlavor::UrlSafe => url_safe_id(length),
    }
}

/// Hex-flavor identifier in lowercase, for callers that need the
/// case toggle.
pub fn random_hex_lowercase(length: usize) -> GatewayResult<String> {
    hex_id(length, false)
}

fn hex_id(length: usize, uppercase: bool) -> GatewayResult<String> {
    let mut bytes = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| GatewayError::Rng(e.to_string()))?;
    let encoded = if uppercase {
        hex::encode_upper(&bytes)
    } else {
        hex::encode(&bytes)
    };
    Ok(encoded[encoded.len() - length..].to_owned())
}

fn url_safe_id(length: usize) -> GatewayResult<String> {
    let mut cleaned = String::with_capacity(length * 2);
    while cleaned.len() < length {
        let mut bytes = vec![0u8; length.max(1)];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| GatewayError::Rng(e.to_string()))?;
        cleaned.extend(
            BASE64URL_NOPAD
                .encode(&bytes)
                .chars()
                .filter(|c| !matches!(c, '-' | '_' | '/')),
        );
    }
    Ok(cleaned[cleaned.len() - length..].to_owned())
}
