use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{Incoming, Transport};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport backed by tokio-tungstenite.
///
/// Sends are serialized on the sink mutex; the stream half has a single
/// consumer. Ping/pong is answered by tungstenite below this layer. The
/// last observed close code is kept for fault classification.
pub struct WebSocketTransport {
    url: String,
    subprotocols: Vec<String>,
    sink: Mutex<Option<SplitSink<WsStream, Message>>>,
    stream: Mutex<Option<SplitStream<WsStream>>>,
    open: AtomicBool,
    // 0 = no close frame observed.
    close_code: AtomicU16,
}

impl WebSocketTransport {
    /// Create a transport for the given `ws://` or `wss://` URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subprotocols: Vec::new(),
            sink: Mutex::new(None),
            stream: Mutex::new(None),
            open: AtomicBool::new(false),
            close_code: AtomicU16::new(0),
        }
    }

    /// Request WebSocket subprotocols during the upgrade.
    pub fn with_subprotocols<S: Into<String>>(mut self, subprotocols: impl IntoIterator<Item = S>) -> Self {
        self.subprotocols = subprotocols.into_iter().map(Into::into).collect();
        self
    }

    /// The connection URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn classify_fault(&self, err: WsError) -> TransportError {
        let code = self.close_code.load(Ordering::SeqCst);
        if code != 0 {
            return TransportError::from_close_code(code);
        }
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Connection,
            other => TransportError::Transport(other.to_string()),
        }
    }
}

impl Transport for WebSocketTransport {
    async fn open(&self) -> Result<()> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|err| TransportError::Connect(err.to_string()))?;

        if !self.subprotocols.is_empty() {
            let protocols = HeaderValue::from_str(&self.subprotocols.join(", "))
                .map_err(|err| TransportError::Connect(err.to_string()))?;
            request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, protocols);
        }

        let (ws, response) = connect_async(request)
            .await
            .map_err(|err| TransportError::Connect(err.to_string()))?;
        debug!(url = %self.url, status = %response.status(), "websocket open");

        let (sink, stream) = ws.split();
        *self.sink.lock().await = Some(sink);
        *self.stream.lock().await = Some(stream);
        self.close_code.store(0, Ordering::SeqCst);
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send_text(&self, text: String) -> Result<()> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(TransportError::NotConnected)?;
        sink.send(Message::text(text))
            .await
            .map_err(|err| self.classify_fault(err))
    }

    async fn recv(&self) -> Option<Result<Incoming>> {
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut()?;
        loop {
            return match stream.next().await {
                None => {
                    self.open.store(false, Ordering::SeqCst);
                    None
                }
                Some(Ok(Message::Text(text))) => {
                    Some(Ok(Incoming::Text(text.as_str().to_owned())))
                }
                Some(Ok(Message::Binary(payload))) => Some(Ok(Incoming::Binary(payload))),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(Message::Close(frame))) => {
                    let code = frame.as_ref().map_or(0, |f| u16::from(f.code));
                    self.close_code.store(code, Ordering::SeqCst);
                    self.open.store(false, Ordering::SeqCst);
                    Some(Err(TransportError::from_close_code(code)))
                }
                Some(Ok(Message::Frame(_))) => Some(Err(TransportError::UnsupportedData)),
                Some(Err(err)) => {
                    self.open.store(false, Ordering::SeqCst);
                    Some(Err(self.classify_fault(err)))
                }
            };
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink.close().await;
        }
        self.open.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
    use tokio_tungstenite::tungstenite::protocol::CloseFrame;

    use super::*;

    async fn echo_server_once(listener: tokio::net::TcpListener) {
        let (stream, _) = listener.accept().await.expect("accept should succeed");
        let mut ws = tokio_tungstenite::accept_async(stream)
            .await
            .expect("upgrade should succeed");

        while let Some(msg) = ws.next().await {
            if let Message::Text(text) = msg.expect("server read should succeed") {
                ws.send(Message::text(format!("echo:{text}")))
                    .await
                    .expect("server send should succeed");
                break;
            }
        }

        ws.close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "done".into(),
        }))
        .await
        .expect("server close should succeed");
    }

    #[tokio::test]
    async fn open_send_recv_roundtrip() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let addr = listener.local_addr().expect("local addr should resolve");
        let server = tokio::spawn(echo_server_once(listener));

        let transport = WebSocketTransport::new(format!("ws://{addr}"));
        transport.open().await.expect("open should succeed");
        assert!(transport.is_open());

        transport
            .send_text("ping".to_string())
            .await
            .expect("send should succeed");

        match transport.recv().await {
            Some(Ok(Incoming::Text(text))) => assert_eq!(text, "echo:ping"),
            other => panic!("expected text frame, got {other:?}"),
        }

        // Server close maps to the normal-closure fault, then end-of-stream.
        match transport.recv().await {
            Some(Err(TransportError::Closed)) | None => {}
            other => panic!("expected closed, got {other:?}"),
        }
        assert!(!transport.is_open());

        server.await.expect("server task should finish");
    }

    #[tokio::test]
    async fn send_before_open_is_not_connected() {
        let transport = WebSocketTransport::new("ws://127.0.0.1:9");
        let err = transport
            .send_text("x".to_string())
            .await
            .expect_err("send without open should fail");
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[tokio::test]
    async fn open_failure_is_connect_error() {
        // Port 1 is essentially never listening.
        let transport = WebSocketTransport::new("ws://127.0.0.1:1");
        let err = transport.open().await.expect_err("open should fail");
        assert!(matches!(err, TransportError::Connect(_)));
        assert!(!transport.is_open());
    }

    #[tokio::test]
    async fn subprotocols_are_offered() {
        let transport = WebSocketTransport::new("ws://example.invalid")
            .with_subprotocols(["sc", "sc-2"]);
        assert_eq!(transport.subprotocols, vec!["sc", "sc-2"]);
    }
}
