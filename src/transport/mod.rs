// SPDX-License-Identifier: MPL-2.0

//! Transport collaborator abstraction
//!
//! The protocol layer never talks HTTP itself. It consumes two operations:
//!
//! ```text
//! ┌─────────────────────┐
//! │ CommandClient /     │
//! │ Capture / Preview   │
//! └──────────┬──────────┘
//!            │  post(path, body) -> body
//!            │  subscribe(path, body) -> frames
//!            ▼
//! ┌─────────────────────┐
//! │   Transport trait   │  ← implemented outside this crate
//! └─────────────────────┘  (or by ReplayTransport for tests and demos)
//! ```

pub mod replay;

pub use crate::errors::TransportError;
pub use replay::ReplayTransport;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use serde_json::Value;
use std::sync::Arc;

/// Future returned by transport operations
pub type TransportFuture<'a, T> = BoxFuture<'a, Result<T, TransportError>>;

/// Sequence of raw preview frames
pub type FrameStream = BoxStream<'static, Result<RawFrame, TransportError>>;

/// One frame as handed over by the transport
///
/// Buffers may be over-allocated, so only the first `valid_len` bytes are
/// frame data.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub buffer: Arc<[u8]>,
    pub valid_len: usize,
}

impl RawFrame {
    pub fn new(buffer: Arc<[u8]>, valid_len: usize) -> Self {
        Self { buffer, valid_len }
    }

    /// Frame whose buffer is exactly its payload
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        let buffer = bytes.into();
        let valid_len = buffer.len();
        Self { buffer, valid_len }
    }

    /// The valid bytes, or `None` if `valid_len` overruns the buffer
    pub fn payload(&self) -> Option<&[u8]> {
        self.buffer.get(..self.valid_len)
    }
}

/// Request/response and streaming transport to one device
pub trait Transport: Send + Sync + 'static {
    /// Send a JSON body to `path` and return the JSON reply
    fn post<'a>(&'a self, path: &'a str, body: Value) -> TransportFuture<'a, Value>;

    /// Open a binary frame subscription
    fn subscribe<'a>(&'a self, path: &'a str, body: Value) -> TransportFuture<'a, FrameStream>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn post<'a>(&'a self, path: &'a str, body: Value) -> TransportFuture<'a, Value> {
        (**self).post(path, body)
    }

    fn subscribe<'a>(&'a self, path: &'a str, body: Value) -> TransportFuture<'a, FrameStream> {
        (**self).subscribe(path, body)
    }
}
