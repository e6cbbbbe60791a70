use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use paygate::{
    GatewayConfig, GatewayError, GatewayResult, OutboundRequest, ResponseEnvelope, Session,
    Transport, constants, pem, signer,
};

/**
    Payment gateway envelope client.
*/
#[derive(Parser)]
#[command(name = "paygate")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Credentials {
    /// Gateway base URL to POST envelopes to.
    #[arg(long, env = "PAYGATE_BASE_URL")]
    base_url: String,

    /// Client identifier issued by the gateway operator.
    #[arg(long, env = "PAYGATE_CLIENT_ID")]
    client_id: String,

    /// Shared HMAC secret for the X-Signature header.
    #[arg(long, env = "PAYGATE_SECRET")]
    secret: String,

    /// Static API token for the X-Token header.
    #[arg(long, env = "PAYGATE_TOKEN")]
    token: String,

    /// Client display name for the X-ClientName header.
    #[arg(long, env = "PAYGATE_CLIENT_NAME")]
    client_name: String,

    /// Gateway RSA public key as unarmored base64 DER, or @path to a
    /// file holding it.
    #[arg(long, env = "PAYGATE_PUBLIC_KEY")]
    public_key: String,
}

#[derive(Subcommand)]
enum Command {
    /// Encrypt a JSON payload, exchange it with the gateway and print
    /// the decrypted reply.
    Send {
        #[command(flatten)]
        credentials: Credentials,

        /// Target endpoint URL, carried inside the encrypted envelope.
        #[arg(short, long)]
        endpoint: String,

        /// JSON payload: inline text, @path to a file, or "-" for stdin.
        payload: String,
    },
    /// Derive the SPKI public-key PEM from an RSA private key file.
    DerivePubkey {
        /// RSA private key file (PEM, PKCS#1 or PKCS#8).
        path: PathBuf,
    },
    /// Compute an X-Signature header value.
    Sign {
        /// Client identifier.
        #[arg(long, env = "PAYGATE_CLIENT_ID")]
        client_id: String,

        /// Shared HMAC secret.
        #[arg(long, env = "PAYGATE_SECRET")]
        secret: String,

        /// Nonce to sign; a fresh 32-character one is drawn when omitted.
        #[arg(long)]
        nonce: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Send {
            credentials,
            endpoint,
            payload,
        } => cmd_send(credentials, &endpoint, &payload).await,
        Command::DerivePubkey { path } => cmd_derive_pubkey(&path),
        Command::Sign {
            client_id,
            secret,
            nonce,
        } => cmd_sign(client_id, secret, nonce),
    }
}

async fn cmd_send(credentials: Credentials, endpoint: &str, payload: &str) -> Result<()> {
    let public_key = string_or_file(&credentials.public_key)
        .context("failed to load the gateway public key")?;
    let config = GatewayConfig::new(
        credentials.base_url,
        credentials.client_id,
        credentials.secret,
        credentials.token,
        credentials.client_name,
        public_key,
    );

    let payload_text = read_payload(payload)?;
    let payload: serde_json::Value =
        serde_json::from_str(&payload_text).context("payload is not valid JSON")?;

    let transport = HttpTransport {
        client: reqwest::Client::new(),
    };
    let mut session = Session::new(&config);

    let request = session
        .build_request(endpoint, &payload)
        .context("failed to build the request envelope")?;
    eprintln!("Built envelope (reqRefNo {})", request.envelope.req_ref_no);

    eprintln!("Sending to {}", request.url);
    let response = transport.exchange(&request).await?;
    eprintln!(
        "Gateway answered: respCode {} ({})",
        response.resp_code, response.resp_desc
    );

    let reply = session
        .decrypt_response(&response)
        .context("failed to decrypt the gateway response")?;

    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

fn cmd_derive_pubkey(path: &PathBuf) -> Result<()> {
    let private_pem = std::fs::read_to_string(path).context("failed to read private key file")?;
    let public_pem =
        pem::derive_public_key_pem(&private_pem).context("failed to derive the public key")?;
    print!("{public_pem}");
    Ok(())
}

fn cmd_sign(client_id: String, secret: String, nonce: Option<String>) -> Result<()> {
    let nonce = nonce.unwrap_or_else(|| signer::generate_nonce(signer::DEFAULT_NONCE_LENGTH));
    let signature = signer::generate_signature(&signer::SignatureContext {
        client_id,
        secret,
        nonce,
    });
    println!("{signature}");
    Ok(())
}

/// One POST per exchange over reqwest, headers mapped per the gateway
/// contract.
struct HttpTransport {
    client: reqwest::Client,
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exchange(&self, request: &OutboundRequest) -> GatewayResult<ResponseEnvelope> {
        let body = serde_json::to_string(&request.envelope)
            .map_err(|e| GatewayError::Payload(e.to_string()))?;
        let response = self
            .client
            .post(&request.url)
            .header(reqwest::header::CONTENT_TYPE, constants::CONTENT_TYPE_JSON)
            .header(constants::HEADER_SIGNATURE, &request.headers.signature)
            .header(constants::HEADER_TOKEN, &request.headers.token)
            .header(constants::HEADER_CLIENT_NAME, &request.headers.client_name)
            .body(body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        // Rejections frequently arrive with a non-2xx status and a
        // regular envelope body; let respCode validation see those.
        match serde_json::from_str(&text) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(GatewayError::Transport(format!(
                "gateway returned HTTP {status}: {}",
                text.chars().take(200).collect::<String>()
            ))),
            Err(e) => Err(GatewayError::Payload(e.to_string())),
        }
    }
}

/// Resolve a flag that takes either a literal value or `@path`.
fn string_or_file(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {path}"))?;
            Ok(text.trim().to_owned())
        }
        None => Ok(value.to_owned()),
    }
}

/// Resolve the payload argument: inline JSON, `@path`, or `-` for stdin.
fn read_payload(value: &str) -> Result<String> {
    if value == "-" {
        return std::io::read_to_string(std::io::stdin()).context("failed to read stdin");
    }
    string_or_file(value)
}
