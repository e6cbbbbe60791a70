/**
    AES-256 session key length in bytes. Fixed by the gateway protocol,
    no negotiation.
*/
pub const KEY_LENGTH: usize = 32;

/**
    GCM authentication tag length in bytes. The gateway always transmits
    `ciphertext ‖ tag` with the tag in the trailing 16 bytes.
*/
pub const TAG_LENGTH: usize = 16;

/**
    Inclusive bounds on the GCM IV length. The gateway derives IVs from
    reference identifiers (reqRefNo/respRefNo raw UTF-8 bytes), so any
    length a reference can take must be accepted.
*/
pub const IV_MIN_LENGTH: usize = 6;
pub const IV_MAX_LENGTH: usize = 16;

/**
    IV length used when the caller supplies none.

    6 bytes is narrower than the commonly recommended 12 for GCM. It is
    inherited from the gateway's reqRefNo-as-IV convention and must not
    be widened: the gateway's reference implementation will not decrypt
    otherwise. Reduced security margin, accepted for interoperability.
*/
pub const DEFAULT_IV_LENGTH: usize = 6;

/**
    respCode value the gateway sends for an accepted request. Any other
    value is a business rejection. Overridable per deployment via
    `GatewayConfig::success_code`.
*/
pub const DEFAULT_SUCCESS_CODE: &str = "00";

/// Request header carrying the HMAC signature built by the request signer.
pub const HEADER_SIGNATURE: &str = "X-Signature";
/// Request header carrying the static API token from configuration.
pub const HEADER_TOKEN: &str = "X-Token";
/// Request header carrying the configured client display name.
pub const HEADER_CLIENT_NAME: &str = "X-ClientName";
/// Fixed content type for every gateway call.
pub const CONTENT_TYPE_JSON: &str = "application/json";
