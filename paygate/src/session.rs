use async_trait::async_trait;
use data_encoding::BASE64;
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::constants::{IV_MAX_LENGTH, IV_MIN_LENGTH};
use crate::crypto::{self, gcm};
use crate::error::{GatewayError, GatewayResult};
use crate::ident::{self, IdFlavor};
use crate::pem::{KeyKind, KeyMaterial};
use crate::signer::{self, DEFAULT_NONCE_LENGTH, SignatureContext};
use crate::types::{InnerPayload, RequestEnvelope, ResponseEnvelope, WrapScheme};

/// Length of a generated request reference identifier, in characters.
/// Its raw UTF-8 bytes double as the GCM IV, so the length must sit
/// inside the 6..=16 window; 12 matches the gateway's convention.
const REFERENCE_LENGTH: usize = 12;

/// Headers accompanying one outbound envelope, ready for the transport
/// to map onto `X-Signature`, `X-Token` and `X-ClientName`.
#[derive(Debug, Clone)]
pub struct AuthHeaders {
    pub signature: String,
    pub token: String,
    pub client_name: String,
}

/// Everything the transport collaborator needs to deliver one request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// Where to POST: the configured gateway base URL.
    pub url: String,
    pub envelope: RequestEnvelope,
    pub headers: AuthHeaders,
}

/// Transport collaborator: delivers one outbound envelope and returns
/// the gateway's parsed reply. Retry, backoff and timeouts belong here,
/// never in the envelope layer.
#[async_trait]
pub trait Transport {
    async fn exchange(&self, request: &OutboundRequest) -> GatewayResult<ResponseEnvelope>;
}

/// One client-side envelope exchange with the payment gateway.
///
/// Typical usage:
/// ```ignore
/// let mut session = Session::new(&config);
/// let request = session.build_request("https://gw.example.com/api/tx", &payload)?;
///
/// // ... transport POSTs request.envelope with request.headers ...
///
/// let decrypted = session.decrypt_response(&response)?;
/// ```
/// Or in one pass, given a [`Transport`] implementation:
/// ```ignore
/// let decrypted = session.execute(url, &payload, &transport).await?;
/// ```
///
/// Each `build_request` draws a fresh session key, valid for exactly
/// that request and its response; `decrypt_response` consumes it.
pub struct Session<'a> {
    config: &'a GatewayConfig,
    /// Session key of the exchange in flight, if any. Set by
    /// `build_request`, taken by `decrypt_response`.
    session_key: Option<[u8; 32]>,
}

impl<'a> Session<'a> {
    pub fn new(config: &'a GatewayConfig) -> Self {
        Session { config, session_key: None }
    }

    /// Build the outbound envelope for `payload`, addressed (inside the
    /// encrypted inner envelope) to `endpoint_url`.
    ///
    /// Generates the session key, the reference identifier whose bytes
    /// serve as the IV, the wrapped key and the signature header. The
    /// session key is retained for decrypting the matching response.
    pub fn build_request(
        &mut self,
        endpoint_url: &str,
        payload: &Value,
    ) -> GatewayResult<OutboundRequest> {
        // Inner envelope: target URL plus base64 of the business payload
        let inner = InnerPayload {
            url: endpoint_url.to_owned(),
            payload: BASE64.encode(&serde_json::to_vec(payload)?),
        };
        let inner_bytes = serde_json::to_vec(&inner)?;

        // Fresh key per exchange; IV derived from the request reference
        let session_key = gcm::generate_key()?;
        let req_ref_no = ident::random_id(REFERENCE_LENGTH, IdFlavor::Hex)?;
        let iv = iv_from_reference(&req_ref_no)?;
        let sealed = gcm::encrypt(&session_key, &inner_bytes, Some(&iv))?;

        // Wrap the session key under the gateway public key. PKCS#1 v1.5
        // is gateway-mandated for the wk field; the key arrives as
        // unarmored base64 and goes through the PEM codec first.
        let gateway_key = KeyMaterial::from_base64(
            KeyKind::Public,
            "gateway",
            &self.config.gateway_public_key,
        )?;
        let wrapped_key = crypto::rsa::encrypt(gateway_key.pem(), &session_key, WrapScheme::Pkcs1)?;

        // Signature nonce is independent of the reference identifier
        let signature = signer::generate_signature(&SignatureContext {
            client_id: self.config.client_id.clone(),
            secret: self.config.secret.clone(),
            nonce: signer::generate_nonce(DEFAULT_NONCE_LENGTH),
        });

        self.session_key = Some(session_key);

        Ok(OutboundRequest {
            url: self.config.base_url.clone(),
            envelope: RequestEnvelope {
                wk: BASE64.encode(&wrapped_key),
                payload: BASE64.encode(&sealed.full_ciphertext()),
                req_ref_no,
            },
            headers: AuthHeaders {
                signature,
                token: self.config.token.clone(),
                client_name: self.config.client_name.clone(),
            },
        })
    }

    /// Validate and decrypt the gateway's reply to the request built by
    /// the preceding `build_request`.
    pub fn decrypt_response(&mut self, response: &ResponseEnvelope) -> GatewayResult<Value> {
        // Step 1: take the in-flight session key — one key, one exchange
        let session_key = self.session_key.take().ok_or(GatewayError::NoActiveExchange)?;

        // Step 2: business validation before any cryptographic work
        if response.resp_code != self.config.success_code {
            return Err(GatewayError::GatewayRejected(Box::new(response.clone())));
        }

        // Step 3: response IV from the response reference identifier
        let resp_ref_no = response
            .resp_ref_no
            .as_deref()
            .ok_or(GatewayError::MissingField("respRefNo"))?;
        let iv = iv_from_reference(resp_ref_no)?;

        // Step 4: split ciphertext ‖ tag and decrypt with the same key
        // that encrypted the request
        let body = response
            .response
            .as_deref()
            .ok_or(GatewayError::MissingField("response"))?;
        let full = BASE64.decode(body.as_bytes())?;
        let plaintext = gcm::decrypt_full_ciphertext(&session_key, &iv, &full)?;

        // Step 5: parse the structured response payload
        Ok(serde_json::from_slice(&plaintext)?)
    }

    /// Run one full exchange: build, transmit through `transport`,
    /// validate and decrypt. Terminal on the first error — there is no
    /// retry and no way to resume a failed exchange.
    pub async fn execute<T>(
        &mut self,
        endpoint_url: &str,
        payload: &Value,
        transport: &T,
    ) -> GatewayResult<Value>
    where
        T: Transport + ?Sized,
    {
        let request = self.build_request(endpoint_url, payload)?;
        let response = transport.exchange(&request).await?;
        self.decrypt_response(&response)
    }
}

/// A reference identifier's raw UTF-8 bytes, checked against the IV
/// length window.
fn iv_from_reference(reference: &str) -> GatewayResult<Vec<u8>> {
    let bytes = reference.as_bytes();
    if !(IV_MIN_LENGTH..=IV_MAX_LENGTH).contains(&bytes.len()) {
        return Err(GatewayError::InvalidReference(bytes.len()));
    }
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyUnwrap;
    use crate::signer::generate_signature;

    const PRIVATE_PEM: &str = include_str!("../testfiles/gateway_rsa.pem");
    const PUBLIC_B64: &str = include_str!("../testfiles/gateway_pub.b64");

    fn test_config() -> GatewayConfig {
        GatewayConfig::new(
            "https://gw.test/api",
            "AC2TEST9001",
            "s3cr3t-hmac-key",
            "token-123",
            "ACME PAYMENTS",
            PUBLIC_B64.trim(),
        )
    }

    /// Encrypt `reply` the way the gateway would: same session key, IV
    /// from a fresh response reference.
    fn encrypted_reply(
        session_key: &[u8; 32],
        resp_ref_no: &str,
        reply: &Value,
    ) -> ResponseEnvelope {
        let sealed = gcm::encrypt(
            session_key,
            &serde_json::to_vec(reply).unwrap(),
            Some(resp_ref_no.as_bytes()),
        )
        .unwrap();
        ResponseEnvelope {
            resp_code: "00".into(),
            resp_desc: "SUCCESS".into(),
            req_ref_no: String::new(),
            resp_ref_no: Some(resp_ref_no.to_owned()),
            status_code: Some(200),
            response: Some(BASE64.encode(&sealed.full_ciphertext())),
        }
    }

    #[test]
    fn build_request_shapes_the_envelope() {
        let config = test_config();
        let mut session = Session::new(&config);
        let payload = serde_json::json!({"txnId": "TX1", "amount": "250.00"});
        let request = session.build_request("https://gw.test/api/tx", &payload).unwrap();

        assert_eq!(request.url, "https://gw.test/api");
        assert_eq!(request.headers.token, "token-123");
        assert_eq!(request.headers.client_name, "ACME PAYMENTS");
        assert_eq!(request.headers.signature.split(' ').count(), 3);

        let reference = &request.envelope.req_ref_no;
        assert_eq!(reference.len(), REFERENCE_LENGTH);
        assert!(reference.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));

        // wk is the RSA-wrapped session key: modulus-sized once decoded
        let wrapped = BASE64.decode(request.envelope.wk.as_bytes()).unwrap();
        assert_eq!(wrapped.len(), 256);
        assert!(BASE64.decode(request.envelope.payload.as_bytes()).unwrap().len() > 16);
    }

    #[test]
    fn each_request_draws_a_fresh_key_and_reference() {
        let config = test_config();
        let mut session = Session::new(&config);
        let payload = serde_json::json!({"a": 1});

        let first = session.build_request("https://gw.test/api/tx", &payload).unwrap();
        let key_one = session.session_key.unwrap();
        let second = session.build_request("https://gw.test/api/tx", &payload).unwrap();
        let key_two = session.session_key.unwrap();

        assert_ne!(key_one, key_two);
        assert_ne!(first.envelope.req_ref_no, second.envelope.req_ref_no);
    }

    #[test]
    fn decrypt_response_round_trips_with_the_stored_key() {
        let config = test_config();
        let mut session = Session::new(&config);
        session
            .build_request("https://gw.test/api/tx", &serde_json::json!({"q": true}))
            .unwrap();
        let session_key = session.session_key.unwrap();

        let reply = serde_json::json!({"status": "APPROVED", "authCode": "991122"});
        let response = encrypted_reply(&session_key, "A1B2C3D4E5F6", &reply);
        let decrypted = session.decrypt_response(&response).unwrap();
        assert_eq!(decrypted, reply);

        // The key is consumed — a second decrypt has nothing to use
        let err = session.decrypt_response(&response).unwrap_err();
        assert!(matches!(err, GatewayError::NoActiveExchange));
    }

    #[test]
    fn decrypt_before_build_is_a_state_error() {
        let config = test_config();
        let mut session = Session::new(&config);
        let response = ResponseEnvelope {
            resp_code: "00".into(),
            resp_desc: String::new(),
            req_ref_no: String::new(),
            resp_ref_no: Some("A1B2C3D4E5F6".into()),
            status_code: None,
            response: Some(BASE64.encode(b"irrelevant-bytes")),
        };
        let err = session.decrypt_response(&response).unwrap_err();
        assert!(matches!(err, GatewayError::NoActiveExchange));
    }

    #[test]
    fn rejection_short_circuits_before_decryption() {
        let config = test_config();
        let mut session = Session::new(&config);
        session
            .build_request("https://gw.test/api/tx", &serde_json::json!({}))
            .unwrap();

        let response = ResponseEnvelope {
            resp_code: "96".into(),
            resp_desc: "SYSTEM MALFUNCTION".into(),
            req_ref_no: String::new(),
            resp_ref_no: None,
            status_code: Some(500),
            response: None,
        };
        let err = session.decrypt_response(&response).unwrap_err();
        match err {
            GatewayError::GatewayRejected(envelope) => {
                assert_eq!(envelope.resp_code, "96");
                assert_eq!(envelope.resp_desc, "SYSTEM MALFUNCTION");
            }
            other => panic!("expected GatewayRejected, got {other:?}"),
        }
    }

    #[test]
    fn success_response_without_body_fields_is_rejected() {
        let config = test_config();

        for (resp_ref_no, body, field) in [
            (None, Some(BASE64.encode(b"0123456789abcdef0")), "respRefNo"),
            (Some("A1B2C3D4E5F6".to_owned()), None, "response"),
        ] {
            let mut session = Session::new(&config);
            session
                .build_request("https://gw.test/api/tx", &serde_json::json!({}))
                .unwrap();
            let response = ResponseEnvelope {
                resp_code: "00".into(),
                resp_desc: String::new(),
                req_ref_no: String::new(),
                resp_ref_no,
                status_code: None,
                response: body,
            };
            let err = session.decrypt_response(&response).unwrap_err();
            assert!(matches!(err, GatewayError::MissingField(f) if f == field));
        }
    }

    #[test]
    fn out_of_range_response_reference_is_rejected() {
        let config = test_config();
        let mut session = Session::new(&config);
        session
            .build_request("https://gw.test/api/tx", &serde_json::json!({}))
            .unwrap();
        let session_key = session.session_key.unwrap();

        let mut response =
            encrypted_reply(&session_key, "A1B2C3D4E5F6", &serde_json::json!({"ok": true}));
        response.resp_ref_no = Some("AB12".into());
        let err = session.decrypt_response(&response).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidReference(4)));
    }

    #[test]
    fn tampered_response_body_is_detected() {
        let config = test_config();
        let mut session = Session::new(&config);
        session
            .build_request("https://gw.test/api/tx", &serde_json::json!({}))
            .unwrap();
        let session_key = session.session_key.unwrap();

        let mut response =
            encrypted_reply(&session_key, "A1B2C3D4E5F6", &serde_json::json!({"ok": true}));
        let mut full = BASE64.decode(response.response.unwrap().as_bytes()).unwrap();
        full[0] ^= 0x01;
        response.response = Some(BASE64.encode(&full));
        let err = session.decrypt_response(&response).unwrap_err();
        assert!(matches!(err, GatewayError::AuthTagMismatch));
    }

    #[test]
    fn reference_iv_window_is_enforced() {
        assert!(iv_from_reference("sixchr").is_ok());
        assert!(iv_from_reference("sixteen chars!!!").is_ok());
        assert!(matches!(iv_from_reference("five5"), Err(GatewayError::InvalidReference(5))));
        assert!(matches!(
            iv_from_reference("seventeen chars!!"),
            Err(GatewayError::InvalidReference(17))
        ));
    }

    // ── End-to-end against a simulated gateway ────────────────────────

    /// Counterpart playing the gateway's role: unwraps `wk` through both
    /// independent RSA providers, verifies the signature header, decrypts
    /// the request and answers under the same session key.
    struct SimulatedGateway {
        config: GatewayConfig,
        reply: Value,
    }

    #[async_trait]
    impl Transport for SimulatedGateway {
        async fn exchange(&self, request: &OutboundRequest) -> GatewayResult<ResponseEnvelope> {
            // Signature check exactly as the gateway performs it:
            // recompute from the presented clientId and nonce
            let parts: Vec<&str> = request.headers.signature.split(' ').collect();
            assert_eq!(parts.len(), 3);
            let expected = generate_signature(&SignatureContext {
                client_id: parts[0].to_owned(),
                secret: self.config.secret.clone(),
                nonce: parts[1].to_owned(),
            });
            assert_eq!(request.headers.signature, expected);
            assert_eq!(parts[0], self.config.client_id);

            // Unwrap the session key through both providers; they must
            // agree bit for bit
            let wrapped = BASE64.decode(request.envelope.wk.as_bytes())?;
            let via_openssl = crypto::decrypt(PRIVATE_PEM, &wrapped, WrapScheme::Pkcs1)?;
            let via_rustcrypto = crypto::rsa::RsaCryptoProvider.unwrap_key(
                PRIVATE_PEM,
                &wrapped,
                WrapScheme::Pkcs1,
            )?;
            assert_eq!(via_openssl, via_rustcrypto);

            // Decrypt the inner envelope with the reqRefNo-derived IV
            let full = BASE64.decode(request.envelope.payload.as_bytes())?;
            let inner_bytes = gcm::decrypt_full_ciphertext(
                &via_openssl,
                request.envelope.req_ref_no.as_bytes(),
                &full,
            )?;
            let inner: InnerPayload = serde_json::from_slice(&inner_bytes)?;
            assert_eq!(inner.url, "https://gw.test/api/tx");
            let business = BASE64.decode(inner.payload.as_bytes())?;
            let business: Value = serde_json::from_slice(&business)?;
            assert_eq!(business["txnId"], "TX900");

            // Answer under the same session key, fresh response reference
            let resp_ref_no = ident::random_id(REFERENCE_LENGTH, IdFlavor::Hex)?;
            let sealed = gcm::encrypt(
                &via_openssl,
                &serde_json::to_vec(&self.reply)?,
                Some(resp_ref_no.as_bytes()),
            )?;
            Ok(ResponseEnvelope {
                resp_code: "00".into(),
                resp_desc: "SUCCESS".into(),
                req_ref_no: request.envelope.req_ref_no.clone(),
                resp_ref_no: Some(resp_ref_no),
                status_code: Some(200),
                response: Some(BASE64.encode(&sealed.full_ciphertext())),
            })
        }
    }

    #[tokio::test]
    async fn end_to_end_exchange_round_trips() {
        let config = test_config();
        let reply = serde_json::json!({"status": "APPROVED", "authCode": "765431"});
        let gateway = SimulatedGateway { config: test_config(), reply: reply.clone() };

        let mut session = Session::new(&config);
        let payload = serde_json::json!({"txnId": "TX900", "amount": "19.99"});
        let decrypted = session
            .execute("https://gw.test/api/tx", &payload, &gateway)
            .await
            .unwrap();
        assert_eq!(decrypted, reply);
    }

    #[tokio::test]
    async fn execute_surfaces_gateway_rejection() {
        struct RejectingGateway;

        #[async_trait]
        impl Transport for RejectingGateway {
            async fn exchange(&self, _: &OutboundRequest) -> GatewayResult<ResponseEnvelope> {
                Ok(ResponseEnvelope {
                    resp_code: "05".into(),
                    resp_desc: "DO NOT HONOR".into(),
                    req_ref_no: String::new(),
                    resp_ref_no: None,
                    status_code: Some(200),
                    response: None,
                })
            }
        }

        let config = test_config();
        let mut session = Session::new(&config);
        let err = session
            .execute("https://gw.test/api/tx", &serde_json::json!({}), &RejectingGateway)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::GatewayRejected(e) if e.resp_code == "05"));
    }
}
