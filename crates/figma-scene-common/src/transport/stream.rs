//! Byte-stream channel
//!
//! Carries host messages over any `AsyncRead + AsyncWrite` stream (a pipe to a
//! webview process, a child's stdio, an in-memory duplex) using the
//! length-prefixed frames from [`codec`](super::codec).
//!
//! Unlike [`MemoryChannel`](super::MemoryChannel) no host wrapping rules are
//! applied: messages arrive exactly as the peer posted them, and the
//! envelope filter unwraps `pluginMessage` where present.

use serde_json::Value as JsonValue;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use super::channel::{Channel, Inbound, InboundSlot};
use super::codec::{read_frame, write_frame};
use crate::protocol::error::{BridgeError, Result};

/// A [`Channel`] over a framed byte stream.
///
/// Spawns a writer task that drains posted messages in order and a reader
/// task that decodes frames into the inbound queue. Both stop when the stream
/// closes; later posts are dropped silently.
pub struct StreamChannel {
    outbound: mpsc::UnboundedSender<JsonValue>,
    inbound: InboundSlot,
}

impl StreamChannel {
    /// Wraps a stream and starts its reader and writer tasks.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::NoRuntime` when called outside a tokio runtime.
    pub fn new<S>(stream: S) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| BridgeError::NoRuntime(e.to_string()))?;

        let (mut reader, mut writer) = tokio::io::split(stream);
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<JsonValue>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        handle.spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                match write_frame(&mut writer, &message).await {
                    Ok(()) => {}
                    Err(BridgeError::MessageTooLarge(len)) => {
                        tracing::warn!("Dropping outbound message of {} bytes", len);
                    }
                    Err(e) => {
                        tracing::debug!("Stream writer stopped: {}", e);
                        break;
                    }
                }
            }
        });

        handle.spawn(async move {
            loop {
                match read_frame(&mut reader).await {
                    Ok(Some(message)) => {
                        if inbound_tx.send(message).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::debug!("Stream closed by peer");
                        break;
                    }
                    Err(e @ (BridgeError::MessageTooLarge(_) | BridgeError::JsonSerialization(_))) => {
                        tracing::warn!("Skipping undecodable frame: {}", e);
                    }
                    Err(e) => {
                        tracing::debug!("Stream reader stopped: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            outbound,
            inbound: InboundSlot::new(inbound_rx),
        })
    }
}

impl Channel for StreamChannel {
    fn post(&self, message: JsonValue) {
        if self.outbound.send(message).is_err() {
            tracing::debug!("Stream writer is gone, message dropped");
        }
    }

    fn take_inbound(&self) -> Result<Inbound> {
        self.inbound.take()
    }
}
