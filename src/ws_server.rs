// WebSocket server for communication with draft clients.

use futures_util::stream::{SplitSink, SplitStream, Stream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{info, warn};

/// Events emitted by the WebSocket server to the application layer.
#[derive(Debug, PartialEq)]
pub enum WsEvent {
    /// A new WebSocket client has connected.
    Connected { addr: String },
    /// The current WebSocket client has disconnected.
    Disconnected,
    /// A text message was received from the client (raw JSON string).
    Message(String),
}

/// Run the WebSocket server on the given port.
///
/// Binds a TCP listener on `127.0.0.1:{port}` and serves one connection at a
/// time. Incoming text frames are forwarded through `tx` as
/// [`WsEvent::Message`]; strings arriving on `out_rx` (replies and engine
/// notifications from the app layer) are written back to the connected
/// client. Outbound messages produced while no client is connected are
/// dropped with a warning -- the client refetches state on reconnect.
pub async fn run(
    port: u16,
    tx: mpsc::Sender<WsEvent>,
    mut out_rx: mpsc::Receiver<String>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    let local_addr = listener.local_addr()?;
    info!("WebSocket server listening on {local_addr}");

    loop {
        // Drain any replies queued while nobody was connected.
        while let Ok(stale) = out_rx.try_recv() {
            warn!("Dropping outbound message with no client connected: {stale}");
        }

        let (stream, addr) = listener.accept().await?;
        let addr_str = addr.to_string();
        info!("Accepted TCP connection from {addr_str}");

        let ws_stream = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!("WebSocket handshake failed for {addr_str}: {e}");
                continue;
            }
        };

        if tx
            .send(WsEvent::Connected {
                addr: addr_str.clone(),
            })
            .await
            .is_err()
        {
            break;
        }

        let (write, read) = ws_stream.split();
        if serve_client(write, read, &tx, &mut out_rx, &addr_str)
            .await
            .is_err()
        {
            break;
        }

        if tx.send(WsEvent::Disconnected).await.is_err() {
            break;
        }
    }

    Ok(())
}

/// Serve one connected client: forward its text frames through `tx` and
/// write app-layer messages from `out_rx` back to it. Returns `Err(())`
/// when the app-layer channels are closed, signalling the accept loop to
/// stop; a client disconnect returns `Ok(())` so the next connection can
/// be served.
async fn serve_client<S>(
    mut write: SplitSink<WebSocketStream<S>, Message>,
    mut read: SplitStream<WebSocketStream<S>>,
    tx: &mpsc::Sender<WsEvent>,
    out_rx: &mut mpsc::Receiver<String>,
    addr: &str,
) -> Result<(), ()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            msg_result = read.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        if tx.send(WsEvent::Message(text.to_string())).await.is_err() {
                            return Err(());
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {addr} sent close frame");
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error from {addr}: {e}");
                        return Ok(());
                    }
                    Some(Ok(_)) => {
                        // Ignore Binary, Ping, Pong, Frame variants.
                    }
                    None => return Ok(()),
                }
            }
            outbound = out_rx.recv() => {
                match outbound {
                    Some(text) => {
                        if write.send(Message::text(text)).await.is_err() {
                            warn!("Failed to write to {addr}, dropping connection");
                            return Ok(());
                        }
                    }
                    None => return Err(()),
                }
            }
        }
    }
}

/// Forward raw WebSocket [`Message`] items from any [`Stream`] through `tx`.
/// Pure logic with no I/O; the unit-test seam for the inbound path.
pub async fn process_message_stream<St>(
    mut stream: St,
    tx: &mpsc::Sender<WsEvent>,
    addr: &str,
) -> Result<(), ()>
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                if tx.send(WsEvent::Message(text.to_string())).await.is_err() {
                    return Err(());
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client {addr} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
            _ => {
                // Ignore Binary, Ping, Pong, Frame variants.
            }
        }
    }
    Ok(())
}
