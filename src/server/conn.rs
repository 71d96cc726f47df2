//! Per-connection handler: one bounded read, one response, close.

use crate::engine::{ErrorKind, QueryEngine, QueryResult};
use crate::server::protocol;
use std::io::{self, Read, Write};
use tracing::debug;

/// Serve exactly one query on `stream`.
///
/// Generic over the stream so plain TCP and TLS connections go through the
/// same path. A response is always attempted before returning; a write to a
/// peer that already went away is the caller's to ignore.
pub fn serve<S: Read + Write>(stream: &mut S, engine: &QueryEngine) -> io::Result<()> {
    let mut buf = [0u8; protocol::MAX_REQUEST_LEN];
    let n = match stream.read(&mut buf) {
        Ok(n) => n,
        Err(err) => {
            // Transport failure before a query arrived; best-effort reply
            let reply = protocol::encode_line(&QueryResult::Error(ErrorKind::Unexpected));
            let _ = stream.write_all(reply.as_bytes());
            return Err(err);
        }
    };

    let query = protocol::strip_terminator(&buf[..n]);
    let result = engine.evaluate(query);
    debug!(
        query = %String::from_utf8_lossy(query),
        result = ?result,
        "query evaluated"
    );

    stream.write_all(protocol::encode_line(&result).as_bytes())?;
    stream.flush()
}
