//! The memcached client against a loopback server.

use anyhow::Result;
use memc_loader::store::{ErrorKind, MemcacheStore, ShardStore};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Accept one connection, read one `set`, answer with `reply`.
fn serve_once(reply: &'static str) -> Result<(String, JoinHandle<(String, Vec<u8>)>)> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?.to_string();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);

        let mut header = String::new();
        reader.read_line(&mut header).unwrap();
        let len: usize = header.split_whitespace().nth(4).unwrap().parse().unwrap();
        let mut data = vec![0u8; len + 2];
        reader.read_exact(&mut data).unwrap();
        data.truncate(len);

        writer.write_all(reply.as_bytes()).unwrap();
        (header, data)
    });
    Ok((addr, handle))
}

#[test]
fn set_sends_key_and_value() -> Result<()> {
    let (addr, server) = serve_once("STORED\r\n")?;
    MemcacheStore::new().set(&addr, "idfa:abc", b"\x00\x01payload")?;

    let (header, data) = server.join().unwrap();
    assert_eq!(header, "set idfa:abc 0 0 9\r\n");
    assert_eq!(data, b"\x00\x01payload");
    Ok(())
}

#[test]
fn not_stored_is_a_rejection() -> Result<()> {
    let (addr, server) = serve_once("NOT_STORED\r\n")?;
    let err = MemcacheStore::new().set(&addr, "gaid:x", b"v").unwrap_err();
    server.join().unwrap();
    assert_eq!(err.kind, ErrorKind::Rejected);
    Ok(())
}

#[test]
fn garbage_reply_is_a_protocol_error() -> Result<()> {
    let (addr, server) = serve_once("HELLO\r\n")?;
    let err = MemcacheStore::new().set(&addr, "gaid:x", b"v").unwrap_err();
    server.join().unwrap();
    assert_eq!(err.kind, ErrorKind::Protocol);
    Ok(())
}

#[test]
fn silent_close_is_a_network_error() -> Result<()> {
    let (addr, server) = serve_once("")?;
    let err = MemcacheStore::new().set(&addr, "adid:x", b"v").unwrap_err();
    server.join().unwrap();
    assert_eq!(err.kind, ErrorKind::Network);
    Ok(())
}
