//! Transport Layer
//!
//! This module wraps the cross-context message primitive the bridge runs on.
//!
//! # Components
//!
//! - **[`Channel`]**: the raw host primitive (post a message, one inbound listener)
//! - **[`MemoryChannel`]**: in-process UI/sandbox pair following the host's wrapping rules
//! - **[`StreamChannel`]**: length-prefixed JSON frames over any async byte stream
//! - **[`TransportAdapter`]**: role-aware envelope send/receive on top of a channel
//!
//! # Delivery Semantics
//!
//! Sends are fire-and-forget and FIFO per channel. Nothing acknowledges
//! delivery: if the peer context is gone the message is dropped, and any call
//! waiting on it simply never settles.
//!
//! # Example
//!
//! ```
//! use figma_scene_common::transport::{MemoryChannel, TransportAdapter};
//! use figma_scene_common::protocol::{Envelope, Role};
//! use std::sync::Arc;
//!
//! let (ui, sandbox) = MemoryChannel::pair();
//! let ui = TransportAdapter::new(Role::Ui, Arc::new(ui));
//! ui.send(&Envelope::init()).unwrap();
//! # drop(sandbox);
//! ```

pub mod adapter;
pub mod channel;
pub mod codec;
pub mod stream;

pub use adapter::{Envelopes, TransportAdapter};
pub use channel::{Channel, Inbound, MemoryChannel};
pub use codec::{encode_frame, read_frame, write_frame, MAX_MESSAGE_SIZE};
pub use stream::StreamChannel;
