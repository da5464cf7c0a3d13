//! TCP endpoints.
//!
//! A `client` dials `host:port`; a `server` binds `host:port` and blocks until
//! exactly one peer connects. Either way the connection is wrapped in an
//! [`AuthenticatedChannel`], which is a passthrough when no token is set.

use super::TCP;
use crate::error::EndpointError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::net::{TcpListener, TcpStream};
use streamcast_core::net::AuthenticatedChannel;
use streamcast_core::pipeline::{Registry, Spec};
use streamcast_core::{Result, Sink, Source, StreamError};
use tracing::{debug, info};

/// Which side of the connection this endpoint plays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TcpRole {
    #[default]
    Client,
    Server,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Port {
    Number(u16),
    Text(String),
}

/// Configuration of a `tcp` source or sink
#[derive(Debug, Clone, Deserialize)]
pub struct TcpConfig {
    pub host: String,
    port: Port,
    #[serde(default)]
    pub role: TcpRole,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    token_base64: Option<String>,
}

impl TcpConfig {
    pub fn from_spec(spec: &Spec) -> Result<Self> {
        spec.decode()
    }

    pub fn port(&self) -> Result<u16> {
        match &self.port {
            Port::Number(port) => Ok(*port),
            Port::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| StreamError::config(format!("invalid tcp port '{text}'"))),
        }
    }

    /// Shared token bytes; empty when none is configured
    pub fn token(&self) -> Result<Vec<u8>> {
        match (&self.token, &self.token_base64) {
            (Some(_), Some(_)) => Err(StreamError::config(
                "set either 'token' or 'token_base64', not both",
            )),
            (Some(token), None) => Ok(token.as_bytes().to_vec()),
            (None, Some(encoded)) => STANDARD
                .decode(encoded.trim())
                .map_err(|err| StreamError::config(format!("invalid token_base64: {err}"))),
            (None, None) => Ok(Vec::new()),
        }
    }

    fn address(&self, port: u16) -> String {
        if self.host.contains(':') {
            format!("[{}]:{port}", self.host)
        } else {
            format!("{}:{port}", self.host)
        }
    }

    /// Dial or accept according to the role
    pub fn connect(&self) -> Result<TcpStream> {
        let port = self.port()?;
        let addr = self.address(port);
        let target = (self.host.as_str(), port);

        match self.role {
            TcpRole::Client => {
                let stream = TcpStream::connect(target).map_err(|source| {
                    let addr = addr.clone();
                    StreamError::construction(TCP, EndpointError::Connect { addr, source })
                })?;
                debug!("Connected to {addr}");
                Ok(stream)
            }
            TcpRole::Server => {
                let listener = TcpListener::bind(target).map_err(|source| {
                    let addr = addr.clone();
                    StreamError::construction(TCP, EndpointError::Listen { addr, source })
                })?;
                info!("Waiting for a peer on {addr}");
                let (stream, peer) = listener.accept().map_err(|source| {
                    StreamError::construction(TCP, EndpointError::Accept { addr, source })
                })?;
                info!("Accepted peer {peer}");
                Ok(stream)
            }
        }
    }

    /// Connect and wrap the stream in a token channel
    pub fn open(&self) -> Result<AuthenticatedChannel<TcpStream>> {
        // Reject a bad token before touching the network
        let token = self.token()?;
        let stream = self.connect()?;
        Ok(AuthenticatedChannel::new(stream, token))
    }
}

pub fn open_tcp_source(spec: &Spec, _registry: &Registry) -> Result<Box<dyn Source>> {
    let channel = TcpConfig::from_spec(spec)?.open()?;
    Ok(Box::new(channel))
}

pub fn open_tcp_sink(spec: &Spec, _registry: &Registry) -> Result<Box<dyn Sink>> {
    let channel = TcpConfig::from_spec(spec)?.open()?;
    Ok(Box::new(channel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: serde_json::Value) -> Result<TcpConfig> {
        TcpConfig::from_spec(&Spec::from_value(value)?)
    }

    #[test]
    fn test_port_accepts_number_or_string() {
        let numeric = config(json!({ "kind": "tcp", "host": "localhost", "port": 9000 })).unwrap();
        let textual = config(json!({ "kind": "tcp", "host": "localhost", "port": "9000" })).unwrap();

        assert_eq!(numeric.port().unwrap(), 9000);
        assert_eq!(textual.port().unwrap(), 9000);
        assert_eq!(numeric.role, TcpRole::Client);
    }

    #[test]
    fn test_invalid_port_text() {
        let config = config(json!({ "kind": "tcp", "host": "localhost", "port": "http" })).unwrap();
        assert!(matches!(config.port(), Err(StreamError::Config(_))));
    }

    #[test]
    fn test_unknown_role_is_config_error() {
        let err = config(json!({ "kind": "tcp", "host": "h", "port": 1, "role": "peer" }))
            .unwrap_err();
        assert!(matches!(err, StreamError::Config(_)));
    }

    #[test]
    fn test_token_base64() {
        let config = config(json!({
            "kind": "tcp", "host": "h", "port": 1, "token_base64": "AAH/"
        }))
        .unwrap();
        assert_eq!(config.token().unwrap(), vec![0x00, 0x01, 0xff]);
    }

    #[test]
    fn test_both_tokens_rejected() {
        let config = config(json!({
            "kind": "tcp", "host": "h", "port": 1, "token": "a", "token_base64": "YQ=="
        }))
        .unwrap();
        assert!(matches!(config.token(), Err(StreamError::Config(_))));
    }

    #[test]
    fn test_ipv6_address_is_bracketed() {
        let config = config(json!({ "kind": "tcp", "host": "::1", "port": 80 })).unwrap();
        assert_eq!(config.address(80), "[::1]:80");
    }
}
