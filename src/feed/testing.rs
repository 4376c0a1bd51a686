//! Shared fixtures for feed tests: scripted in-process NNTP peers

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::storage::{FeedDirection, Peer};
use crate::types::{HostName, PeerName, Port};

pub(crate) const TIMEOUT: Duration = Duration::from_secs(5);

/// Peer record pointing at a test listener; tests adjust fields as needed
pub(crate) fn peer_record(addr: SocketAddr) -> Peer {
    Peer {
        name: PeerName::new("testpeer").unwrap(),
        host: HostName::new(addr.ip().to_string()).unwrap(),
        port: Port::new(addr.port()).unwrap(),
        username: None,
        password: None,
        direction: FeedDirection::Both,
        group_filter: "*".to_string(),
        checkpoint: 0,
    }
}

/// Bind a listener, accept one connection, and run the given dialogue
/// against it. The returned handle propagates script panics to the test.
pub(crate) fn scripted_peer<F, Fut>(script: F) -> (SocketAddr, JoinHandle<()>)
where
    F: FnOnce(BufReader<TcpStream>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let listener = TcpListener::from_std(listener).unwrap();
        let (stream, _) = tokio::time::timeout(TIMEOUT, listener.accept())
            .await
            .expect("test timed out")
            .unwrap();
        script(BufReader::new(stream)).await;
    });
    (addr, handle)
}

/// Like [`scripted_peer`] but the script runs once per accepted
/// connection, up to `connections` times.
pub(crate) fn scripted_peer_serving<F, Fut>(connections: usize, script: F) -> (SocketAddr, JoinHandle<()>)
where
    F: Fn(usize, BufReader<TcpStream>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let listener = TcpListener::from_std(listener).unwrap();
        for nth in 0..connections {
            let (stream, _) = tokio::time::timeout(TIMEOUT, listener.accept())
                .await
                .expect("test timed out")
                .unwrap();
            script(nth, BufReader::new(stream)).await;
        }
    });
    (addr, handle)
}

pub(crate) async fn read_line(reader: &mut BufReader<TcpStream>) -> String {
    let mut line = String::new();
    tokio::time::timeout(TIMEOUT, reader.read_line(&mut line))
        .await
        .expect("test timed out")
        .unwrap();
    line.trim_end().to_string()
}

pub(crate) async fn send(reader: &mut BufReader<TcpStream>, text: &str) {
    tokio::time::timeout(TIMEOUT, reader.get_mut().write_all(text.as_bytes()))
        .await
        .expect("test timed out")
        .unwrap();
}

/// Serve one complete inbound IHAVE exchange, answering 335 then `verdict`
pub(crate) async fn accept_ihave(conn: &mut BufReader<TcpStream>, expected_id: &str, verdict: &str) {
    send(conn, "200 ready\r\n").await;
    assert_eq!(read_line(conn).await, format!("IHAVE {}", expected_id));
    send(conn, "335 Send it\r\n").await;
    loop {
        if read_line(conn).await == "." {
            break;
        }
    }
    send(conn, verdict).await;
    if read_line(conn).await == "QUIT" {
        send(conn, "205 bye\r\n").await;
    }
}
