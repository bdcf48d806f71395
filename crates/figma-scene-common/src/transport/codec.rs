//! Length-prefixed JSON framing
//!
//! Used by [`StreamChannel`](super::StreamChannel) to carry host messages over
//! a byte stream:
//!
//! ```text
//! [4-byte length as u32 big-endian] [JSON data]
//! ```
//!
//! Frames larger than [`MAX_MESSAGE_SIZE`] are rejected on write and skipped
//! on read, so one bad frame never desynchronises the stream.

use serde_json::Value as JsonValue;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::error::{BridgeError, Result};

/// Upper bound on a single frame (100 MB).
pub const MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

/// Encodes a message into a complete frame.
///
/// # Errors
///
/// Returns `BridgeError::MessageTooLarge` if the JSON body exceeds
/// [`MAX_MESSAGE_SIZE`].
pub fn encode_frame(message: &JsonValue) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(message)?;
    if body.len() > MAX_MESSAGE_SIZE {
        return Err(BridgeError::MessageTooLarge(body.len()));
    }

    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Writes one frame and flushes the writer.
pub async fn write_frame<W>(writer: &mut W, message: &JsonValue) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(message)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame.
///
/// Returns `Ok(None)` when the stream ended cleanly between frames.
///
/// # Errors
///
/// - `BridgeError::MessageTooLarge` - the frame was skipped, the stream is
///   still usable
/// - `BridgeError::JsonSerialization` - the frame body was not JSON, the
///   stream is still usable
/// - `BridgeError::Io` - the stream is broken
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<JsonValue>>
where
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(BridgeError::Io(e)),
    };

    if len > MAX_MESSAGE_SIZE {
        let mut limited = (&mut *reader).take(len as u64);
        tokio::io::copy(&mut limited, &mut tokio::io::sink()).await?;
        return Err(BridgeError::MessageTooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(serde_json::from_slice(&body)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_frame_prefixes_length() {
        let frame = encode_frame(&json!({"a": 1})).unwrap();
        let body = br#"{"a":1}"#;
        assert_eq!(&frame[..4], &(body.len() as u32).to_be_bytes());
        assert_eq!(&frame[4..], body);
    }

    #[tokio::test]
    async fn test_write_then_read_frame() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        let message = json!({"pluginMessage": {"action": "figma-scene-init"}});

        write_frame(&mut client, &message).await.unwrap();
        let received = read_frame(&mut server).await.unwrap();

        assert_eq!(received, Some(message));
    }

    #[tokio::test]
    async fn test_read_frame_reports_clean_eof() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        assert!(read_frame(&mut server).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_json_frame_keeps_stream_usable() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        client.write_all(&3u32.to_be_bytes()).await.unwrap();
        client.write_all(b"{{{").await.unwrap();
        write_frame(&mut client, &json!(7)).await.unwrap();

        let first = read_frame(&mut server).await;
        assert!(matches!(first, Err(BridgeError::JsonSerialization(_))));
        assert_eq!(read_frame(&mut server).await.unwrap(), Some(json!(7)));
    }

    #[tokio::test]
    async fn test_truncated_frame_is_io_error() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        client.write_all(&10u32.to_be_bytes()).await.unwrap();
        client.write_all(b"{}").await.unwrap();
        drop(client);

        assert!(matches!(read_frame(&mut server).await, Err(BridgeError::Io(_))));
    }
}
