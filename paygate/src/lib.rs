#![allow(clippy::doc_overindented_list_items)]

mod config;
pub mod constants;
pub mod crypto;
mod error;
pub mod ident;
pub mod pem;
mod session;
pub mod signer;
mod types;

pub use self::config::GatewayConfig;
pub use self::error::{GatewayError, GatewayResult};
pub use self::session::{AuthHeaders, OutboundRequest, Session, Transport};
pub use self::types::{CipherEnvelope, InnerPayload, RequestEnvelope, ResponseEnvelope, WrapScheme};
