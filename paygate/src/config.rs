use crate::constants::DEFAULT_SUCCESS_CODE;

/// Connection and credential material for one gateway deployment.
///
/// Constructed once by the embedding application and passed by reference
/// into [`Session`](crate::Session); the envelope layer never mutates it
/// and never reads the environment itself.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway endpoint base URL, e.g. `https://gw.example.com/api`.
    pub base_url: String,
    /// Client identifier issued by the gateway operator.
    pub client_id: String,
    /// Shared HMAC secret for the `X-Signature` header. Used directly as
    /// the HMAC-SHA256 key — the gateway defines no derivation step.
    pub secret: String,
    /// Static API token passed through in the `X-Token` header.
    pub token: String,
    /// Client display name passed through in the `X-ClientName` header.
    pub client_name: String,
    /// Gateway RSA public key as unarmored base64 SPKI DER, exactly as
    /// distributed by the gateway operator. Converted to PEM on use.
    pub gateway_public_key: String,
    /// respCode value that marks an accepted request.
    pub success_code: String,
}

impl GatewayConfig {
    /// Build a config with the standard success code (`"00"`).
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        secret: impl Into<String>,
        token: impl Into<String>,
        client_name: impl Into<String>,
        gateway_public_key: impl Into<String>,
    ) -> Self {
        GatewayConfig {
            base_url: base_url.into(),
            client_id: client_id.into(),
            secret: secret.into(),
            token: token.into(),
            client_name: client_name.into(),
            gateway_public_key: gateway_public_key.into(),
            success_code: DEFAULT_SUCCESS_CODE.to_owned(),
        }
    }
}
