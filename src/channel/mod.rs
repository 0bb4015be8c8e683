//! Push channel manager.
//!
//! Owns the lifecycle of exactly one WebSocket connection to the
//! aggregator: connect, receive, detect closure, schedule reconnection,
//! tear down on shutdown. Reconnection is unconditional and indefinite with
//! a fixed delay; cancellation is the only way out of the loop.

mod error;

pub use error::ChannelError;

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::config::ConnectionConfig;
use crate::protocol::Batch;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Derive the channel endpoint from an HTTP(S) origin: secure origins
/// upgrade to `wss`, plain ones to `ws`. Already-websocket origins pass
/// through unchanged.
pub fn ws_endpoint(origin: &str, path: &str) -> Result<String, ChannelError> {
    if !path.starts_with('/') {
        return Err(ChannelError::InvalidPath(path.to_string()));
    }

    let (scheme, rest) = origin
        .split_once("://")
        .ok_or_else(|| ChannelError::InvalidOrigin(origin.to_string()))?;
    let ws_scheme = match scheme {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(ChannelError::InvalidOrigin(origin.to_string())),
    };

    let host = rest.trim_end_matches('/');
    if host.is_empty() {
        return Err(ChannelError::InvalidOrigin(origin.to_string()));
    }

    Ok(format!("{ws_scheme}://{host}{path}"))
}

/// Background service owning the push connection. Decoded batches are
/// forwarded into the injected single-consumer queue; malformed frames are
/// logged and dropped without affecting the connection.
pub struct ChannelManager {
    endpoint: String,
    reconnect_delay: Duration,
    log_frames: bool,
    batches: mpsc::Sender<Batch>,
}

impl ChannelManager {
    /// Build a manager from explicit configuration. Fails only on a
    /// malformed origin or path; no I/O happens here.
    pub fn new(config: &ConnectionConfig, batches: mpsc::Sender<Batch>) -> Result<Self, ChannelError> {
        Ok(Self {
            endpoint: ws_endpoint(&config.origin, &config.path)?,
            reconnect_delay: Duration::from_secs(config.reconnect_delay_seconds),
            log_frames: false,
            batches,
        })
    }

    /// Opt in to logging every raw inbound frame at debug level.
    pub fn with_frame_logging(mut self, enabled: bool) -> Self {
        self.log_frames = enabled;
        self
    }

    /// The derived channel endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Start the connection loop. Returns a JoinHandle that resolves when
    /// the manager stops. Cancelling the token performs a scoped disconnect
    /// and suppresses any further reconnect attempt; cancelling again is a
    /// no-op.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(endpoint = %self.endpoint, "channel manager started");
            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    connected = connect_async(self.endpoint.as_str()) => match connected {
                        Ok((stream, _)) => {
                            tracing::info!(endpoint = %self.endpoint, "channel connected");
                            if self.drive(stream, &cancel_token).await.is_break() {
                                break;
                            }
                            tracing::info!(
                                retry_in_seconds = self.reconnect_delay.as_secs_f64(),
                                "channel disconnected, scheduling reconnect"
                            );
                        }
                        Err(error) => {
                            tracing::warn!(
                                endpoint = %self.endpoint,
                                %error,
                                retry_in_seconds = self.reconnect_delay.as_secs_f64(),
                                "channel connect failed, scheduling reconnect"
                            );
                        }
                    }
                }

                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = tokio::time::sleep(self.reconnect_delay) => {}
                }
            }
            tracing::info!("channel manager stopped");
        })
    }

    /// Pump one established connection until it closes or the token is
    /// cancelled. Returns `Break` when the loop must not reconnect.
    async fn drive(
        &self,
        stream: WsStream,
        cancel_token: &CancellationToken,
    ) -> std::ops::ControlFlow<()> {
        let (mut sink, mut frames) = stream.split();

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    // Best-effort close handshake on shutdown.
                    let _ = sink.send(Message::Close(None)).await;
                    return std::ops::ControlFlow::Break(());
                }
                frame = frames.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if self.log_frames {
                            tracing::debug!(frame = %text, "inbound frame");
                        }
                        if !self.dispatch(&text).await {
                            return std::ops::ControlFlow::Break(());
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = sink.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::debug!("aggregator closed the channel");
                        return std::ops::ControlFlow::Continue(());
                    }
                    Some(Ok(_)) => {
                        // Binary / pong frames are not part of the contract.
                    }
                    Some(Err(error)) => {
                        tracing::warn!(%error, "channel transport error");
                        return std::ops::ControlFlow::Continue(());
                    }
                    None => {
                        tracing::debug!("channel stream ended");
                        return std::ops::ControlFlow::Continue(());
                    }
                }
            }
        }
    }

    /// Decode and forward one text frame. Returns false when the consumer
    /// side of the queue is gone and the manager should stop.
    async fn dispatch(&self, text: &str) -> bool {
        match Batch::decode(text) {
            Ok(batch) => {
                if self.batches.send(batch).await.is_err() {
                    tracing::info!("batch queue receiver dropped, stopping channel");
                    return false;
                }
                true
            }
            Err(error) => {
                tracing::warn!(%error, bytes = text.len(), "dropping malformed frame");
                true
            }
        }
    }
}
