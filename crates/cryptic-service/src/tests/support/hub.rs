//! Minimal routing hub bound to a local port.

use std::net::SocketAddr;
use std::time::Duration;

use futures::StreamExt;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

use cryptic_wire::JsonObjectCodec;

const WAIT: Duration = Duration::from_secs(5);

/// Listening side of the fake hub.
pub struct FakeHub {
    listener: TcpListener,
    address: SocketAddr,
}

impl FakeHub {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake hub");
        let address = listener.local_addr().expect("fake hub address");
        Self { listener, address }
    }

    #[must_use]
    pub fn address(&self) -> String {
        self.address.to_string()
    }

    /// Waits for the next service connection.
    pub async fn accept(&self) -> HubPeer {
        let (stream, _) = tokio::time::timeout(WAIT, self.listener.accept())
            .await
            .expect("service did not connect in time")
            .expect("accept service connection");
        HubPeer {
            framed: Framed::new(stream, JsonObjectCodec::new()),
        }
    }
}

/// One accepted service connection.
pub struct HubPeer {
    framed: Framed<TcpStream, JsonObjectCodec>,
}

impl HubPeer {
    /// Next frame written by the service, decoded as JSON.
    pub async fn receive(&mut self) -> Value {
        let bytes = tokio::time::timeout(WAIT, self.framed.next())
            .await
            .expect("service did not write in time")
            .expect("service closed the connection")
            .expect("decode frame");
        serde_json::from_slice(&bytes).expect("service wrote invalid JSON")
    }

    /// Writes raw bytes to the service.
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.framed
            .get_mut()
            .write_all(bytes)
            .await
            .expect("write to service");
    }

    pub async fn send(&mut self, value: &Value) {
        self.send_raw(value.to_string().as_bytes()).await;
    }
}
