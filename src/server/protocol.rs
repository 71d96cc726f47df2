//! Wire protocol for the one-shot query exchange.
//!
//! Framing is identical whether the transport is plain TCP or TLS:
//! - Request: UTF-8 text, at most one read's worth of bytes, optionally
//!   `\n`-terminated; the terminator is stripped, everything else is
//!   significant
//! - Response: a single `\n`-terminated line

use crate::engine::QueryResult;

/// Upper bound on a request body; one read of this capacity bounds the
/// maximum query length
pub const MAX_REQUEST_LEN: usize = 1024;

pub const EXISTS: &str = "STRING EXISTS";
pub const NOT_FOUND: &str = "STRING NOT FOUND";
pub const INVALID: &str = "INVALID REQUEST";
pub const ERROR_PREFIX: &str = "ERROR";

/// Strip a single trailing `\n` if present. `\r` and all other whitespace
/// are query bytes like any other.
pub fn strip_terminator(raw: &[u8]) -> &[u8] {
    raw.strip_suffix(b"\n").unwrap_or(raw)
}

/// Encode a result as its `\n`-terminated response line
pub fn encode_line(result: &QueryResult) -> String {
    match result {
        QueryResult::Found => format!("{EXISTS}\n"),
        QueryResult::NotFound => format!("{NOT_FOUND}\n"),
        QueryResult::Invalid => format!("{INVALID}\n"),
        QueryResult::Error(kind) => format!("{ERROR_PREFIX} {}\n", kind.as_code()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ErrorKind;

    #[test]
    fn test_strip_terminator() {
        assert_eq!(strip_terminator(b"query\n"), b"query");
        assert_eq!(strip_terminator(b"query"), b"query");
        assert_eq!(strip_terminator(b"\n"), b"");
        assert_eq!(strip_terminator(b""), b"");

        // Only one terminator is stripped; everything else is significant
        assert_eq!(strip_terminator(b"query\n\n"), b"query\n");
        assert_eq!(strip_terminator(b"query\r\n"), b"query\r");
        assert_eq!(strip_terminator(b"  query  \n"), b"  query  ");
    }

    #[test]
    fn test_encode_line() {
        assert_eq!(encode_line(&QueryResult::Found), "STRING EXISTS\n");
        assert_eq!(encode_line(&QueryResult::NotFound), "STRING NOT FOUND\n");
        assert_eq!(encode_line(&QueryResult::Invalid), "INVALID REQUEST\n");
        assert_eq!(
            encode_line(&QueryResult::Error(ErrorKind::FileNotFound)),
            "ERROR FILE_NOT_FOUND\n"
        );
        assert_eq!(
            encode_line(&QueryResult::Error(ErrorKind::PermissionDenied)),
            "ERROR PERMISSION_DENIED\n"
        );
        assert_eq!(
            encode_line(&QueryResult::Error(ErrorKind::Unexpected)),
            "ERROR UNEXPECTED\n"
        );
    }
}
