// SPDX-License-Identifier: GPL-3.0-only

//! Scripted in-memory transport
//!
//! Replays queued responses per path and queued preview frames, and records
//! every request it receives. Used by the test suite and by the `replay` and
//! `preview` CLI commands, which load a transcript file.

use super::{FrameStream, RawFrame, Transport, TransportError, TransportFuture};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, trace};

/// A scripted reply to one `post`
#[derive(Debug, Clone)]
enum Reply {
    Body(Value),
    /// Reply only after the gate is opened
    Gated(Arc<Notify>, Value),
    Fail(String),
}

/// A scripted preview frame, or a transport failure in its place
#[derive(Debug, Clone)]
enum FrameEvent {
    Frame(RawFrame),
    Fail(String),
}

#[derive(Default)]
struct ReplayState {
    replies: HashMap<String, VecDeque<Reply>>,
    frames: VecDeque<FrameEvent>,
    requests: Vec<(String, Value)>,
    subscriptions: usize,
}

/// Request recorded by the replay transport
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub path: String,
    pub body: Value,
}

/// Scripted transport
#[derive(Default)]
pub struct ReplayTransport {
    state: Mutex<ReplayState>,
    frame_interval: Option<Duration>,
}

/// On-disk transcript format
#[derive(Debug, Deserialize)]
pub struct Transcript {
    /// Responses per path, in the order they are returned
    #[serde(default)]
    pub responses: HashMap<String, Vec<Value>>,
    /// Frame files, relative to the transcript
    #[serde(default)]
    pub frames: Vec<PathBuf>,
    /// Delay between replayed frames
    #[serde(default)]
    pub frame_interval_ms: Option<u64>,
}

impl ReplayTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pace preview frames instead of replaying them back to back
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval);
        self
    }

    /// Load a transcript and the frame files it references
    pub fn from_transcript(path: &Path) -> Result<Self, TransportError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TransportError::with_source(format!("read {}", path.display()), e))?;
        let transcript: Transcript = serde_json::from_str(&text)
            .map_err(|e| TransportError::with_source("parse transcript", e))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let mut transport = Self::new();
        if let Some(ms) = transcript.frame_interval_ms {
            transport = transport.with_frame_interval(Duration::from_millis(ms));
        }
        for (route, bodies) in transcript.responses {
            for body in bodies {
                transport.push_response(&route, body);
            }
        }
        for frame in transcript.frames {
            let frame_path = base.join(&frame);
            let bytes = std::fs::read(&frame_path).map_err(|e| {
                TransportError::with_source(format!("read {}", frame_path.display()), e)
            })?;
            transport.push_frame(RawFrame::from_bytes(bytes));
        }
        Ok(transport)
    }

    fn state(&self) -> MutexGuard<'_, ReplayState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, path: &str, reply: Reply) {
        self.state()
            .replies
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Queue a reply body for `path`
    pub fn push_response(&self, path: &str, body: Value) {
        self.push(path, Reply::Body(body));
    }

    /// Queue a reply that is held back until the returned gate is notified
    pub fn push_gated_response(&self, path: &str, body: Value) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(path, Reply::Gated(Arc::clone(&gate), body));
        gate
    }

    /// Queue a transport failure for `path`
    pub fn push_failure(&self, path: &str, message: &str) {
        self.push(path, Reply::Fail(message.to_string()));
    }

    pub fn push_frame(&self, frame: RawFrame) {
        self.state().frames.push_back(FrameEvent::Frame(frame));
    }

    /// Queue a failure that ends the frame stream
    pub fn push_frame_failure(&self, message: &str) {
        self.state()
            .frames
            .push_back(FrameEvent::Fail(message.to_string()));
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state()
            .requests
            .iter()
            .map(|(path, body)| RecordedRequest {
                path: path.clone(),
                body: body.clone(),
            })
            .collect()
    }

    /// Command names of requests posted so far, in order
    pub fn command_names(&self) -> Vec<String> {
        self.state()
            .requests
            .iter()
            .filter_map(|(_, body)| body.get("name").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    /// Number of subscriptions opened
    pub fn subscriptions(&self) -> usize {
        self.state().subscriptions
    }

    /// Replies still queued for `path`
    pub fn pending(&self, path: &str) -> usize {
        self.state().replies.get(path).map_or(0, VecDeque::len)
    }
}

impl Transport for ReplayTransport {
    fn post<'a>(&'a self, path: &'a str, body: Value) -> TransportFuture<'a, Value> {
        Box::pin(async move {
            let reply = {
                let mut state = self.state();
                trace!(path, body = %body, "Replay request");
                state.requests.push((path.to_string(), body));
                state.replies.get_mut(path).and_then(VecDeque::pop_front)
            };
            match reply {
                Some(Reply::Body(value)) => Ok(value),
                Some(Reply::Gated(gate, value)) => {
                    gate.notified().await;
                    Ok(value)
                }
                Some(Reply::Fail(message)) => Err(TransportError::new(message)),
                None => Err(TransportError::new(format!(
                    "no scripted response for {}",
                    path
                ))),
            }
        })
    }

    fn subscribe<'a>(&'a self, path: &'a str, body: Value) -> TransportFuture<'a, FrameStream> {
        Box::pin(async move {
            let events: Vec<FrameEvent> = {
                let mut state = self.state();
                state.requests.push((path.to_string(), body));
                state.subscriptions += 1;
                state.frames.drain(..).collect()
            };
            debug!(path, frames = events.len(), "Replay subscription opened");

            let interval = self.frame_interval;
            let stream = futures::stream::iter(events)
                .then(move |event| async move {
                    if let Some(interval) = interval {
                        tokio::time::sleep(interval).await;
                    }
                    match event {
                        FrameEvent::Frame(frame) => Ok(frame),
                        FrameEvent::Fail(message) => Err(TransportError::new(message)),
                    }
                })
                .boxed();
            Ok(stream)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_replies_in_order_per_path() {
        let transport = ReplayTransport::new();
        transport.push_response("/a", json!(1));
        transport.push_response("/a", json!(2));
        transport.push_response("/b", json!("b"));

        assert_eq!(transport.post("/a", json!({})).await.unwrap(), json!(1));
        assert_eq!(transport.post("/b", json!({})).await.unwrap(), json!("b"));
        assert_eq!(transport.post("/a", json!({})).await.unwrap(), json!(2));
        assert!(transport.post("/a", json!({})).await.is_err());
        assert_eq!(transport.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_frames_then_failure() {
        let transport = ReplayTransport::new();
        transport.push_frame(RawFrame::from_bytes(vec![0xff, 0xd8]));
        transport.push_frame_failure("connection reset");

        let mut stream = transport.subscribe("/live", json!({})).await.unwrap();
        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }
}
