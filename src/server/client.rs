//! Client for the one-shot query protocol.

use crate::server::protocol::MAX_REQUEST_LEN;
use crate::server::tls;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Read/write timeout
const IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in client operations
#[derive(Debug)]
pub enum ClientError {
    /// Could not reach the server
    Connect(std::io::Error),
    /// TLS session failure
    Tls(rustls::Error),
    /// Host name not usable for TLS verification
    InvalidServerName,
    /// Communication error
    Io(std::io::Error),
    /// Server closed without a usable response line
    InvalidResponse,
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Connect(e) => write!(f, "Connection failed: {}", e),
            ClientError::Tls(e) => write!(f, "TLS error: {}", e),
            ClientError::InvalidServerName => write!(f, "Invalid server name for TLS"),
            ClientError::Io(e) => write!(f, "I/O error: {}", e),
            ClientError::InvalidResponse => write!(f, "Invalid response from server"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Io(e)
    }
}

impl From<rustls::Error> for ClientError {
    fn from(e: rustls::Error) -> Self {
        ClientError::Tls(e)
    }
}

/// One-shot query client: connect, send a line, read the response, close
pub struct QueryClient {
    host: String,
    port: u16,
    tls: Option<Arc<rustls::ClientConfig>>,
}

impl QueryClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            tls: None,
        }
    }

    /// Connect over TLS, trusting the certificates in the given PEM bundle
    pub fn with_tls_roots(mut self, ca_path: &Path) -> anyhow::Result<Self> {
        self.tls = Some(tls::client_config(ca_path)?);
        Ok(self)
    }

    /// Send one query and return the response line (terminator stripped)
    pub fn send(&self, query: &str) -> ClientResult<String> {
        let stream =
            TcpStream::connect((self.host.as_str(), self.port)).map_err(ClientError::Connect)?;
        let _ = stream.set_read_timeout(Some(IO_TIMEOUT));
        let _ = stream.set_write_timeout(Some(IO_TIMEOUT));

        match &self.tls {
            Some(config) => {
                let name = rustls::pki_types::ServerName::try_from(self.host.clone())
                    .map_err(|_| ClientError::InvalidServerName)?;
                let session = rustls::ClientConnection::new(Arc::clone(config), name)?;
                let mut stream = rustls::StreamOwned::new(session, stream);
                exchange(&mut stream, query)
            }
            None => {
                let mut stream = stream;
                exchange(&mut stream, query)
            }
        }
    }
}

/// One write carrying the terminated query, one read for the response.
/// The request goes out in a single write so the server's single bounded
/// read sees the whole line.
fn exchange<S: Read + Write>(stream: &mut S, query: &str) -> ClientResult<String> {
    let mut request = Vec::with_capacity(query.len() + 1);
    request.extend_from_slice(query.as_bytes());
    request.push(b'\n');
    stream.write_all(&request)?;
    stream.flush()?;

    let mut buf = [0u8; MAX_REQUEST_LEN];
    let n = stream.read(&mut buf)?;
    let text = std::str::from_utf8(&buf[..n]).map_err(|_| ClientError::InvalidResponse)?;
    let line = text.strip_suffix('\n').unwrap_or(text);
    if line.is_empty() {
        return Err(ClientError::InvalidResponse);
    }
    Ok(line.to_string())
}
