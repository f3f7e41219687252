//! Minimal memcached text-protocol client.

use super::{ErrorKind, ShardStore, StoreError, StoreResult};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

/// Longest key memcached accepts.
const MAX_KEY_LEN: usize = 250;

/// Writes with `set` over a new TCP connection per call.
///
/// No pooling and no retries: every call connects, sends one `set`, reads one
/// reply line and drops the connection.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemcacheStore;

impl MemcacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ShardStore for MemcacheStore {
    fn set(&self, addr: &str, key: &str, value: &[u8]) -> StoreResult<()> {
        validate_key(key)?;

        let stream = TcpStream::connect(addr)
            .map_err(|e| StoreError::new(ErrorKind::Network, format!("connect {addr}: {e}")))?;
        let mut writer = stream.try_clone()?;

        let mut request = format!("set {key} 0 0 {}\r\n", value.len()).into_bytes();
        request.extend_from_slice(value);
        request.extend_from_slice(b"\r\n");
        writer.write_all(&request)?;
        writer.flush()?;

        let mut reply = String::new();
        if BufReader::new(stream).read_line(&mut reply)? == 0 {
            return Err(StoreError::new(
                ErrorKind::Network,
                format!("{addr} closed the connection without replying"),
            ));
        }
        match reply.trim_end() {
            "STORED" => Ok(()),
            "NOT_STORED" => Err(StoreError::new(ErrorKind::Rejected, "NOT_STORED")),
            other if other.starts_with("SERVER_ERROR") || other.starts_with("CLIENT_ERROR") => {
                Err(StoreError::new(ErrorKind::Rejected, other))
            }
            other => Err(StoreError::new(
                ErrorKind::Protocol,
                format!("unexpected reply: {other}"),
            )),
        }
    }
}

fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(StoreError::new(
            ErrorKind::InvalidInput,
            format!("key length {} outside 1..={MAX_KEY_LEN}", key.len()),
        ));
    }
    if key.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return Err(StoreError::new(
            ErrorKind::InvalidInput,
            format!("key contains whitespace or control bytes: {key:?}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsendable_keys() {
        assert_eq!(validate_key("").unwrap_err().kind, ErrorKind::InvalidInput);
        assert_eq!(
            validate_key("idfa:has space").unwrap_err().kind,
            ErrorKind::InvalidInput
        );
        assert_eq!(
            validate_key(&"k".repeat(MAX_KEY_LEN + 1)).unwrap_err().kind,
            ErrorKind::InvalidInput
        );
        assert!(validate_key("idfa:1rfw452y52g2gq4g").is_ok());
    }

    #[test]
    fn refused_connection_is_a_network_error() {
        // Bind then drop to get a port nothing listens on.
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let err = MemcacheStore::new()
            .set(&addr.to_string(), "idfa:1", b"v")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Network);
    }
}
