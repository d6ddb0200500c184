// SPDX-License-Identifier: GPL-3.0-only

//! Live preview
//!
//! The device streams motion-JPEG frames over a long-lived subscription.
//! Frames are exposed two ways:
//!
//! ```text
//! Transport::subscribe ──▶ PreviewFrames (pull, Stream of PreviewFrame)
//!                                │
//!                                └──▶ LivePreview::start(on_frame)
//!                                       background task, on_frame(&[u8]) -> bool
//!                                       PreviewHandle { stop(), finished() }
//! ```
//!
//! Both check the stop signal before every frame, so a stop takes effect at
//! the next frame boundary. A connection runs at most one preview.

use crate::command::CommandRequest;
use crate::constants::{commands, paths};
use crate::errors::{ThetaError, ThetaResult};
use crate::sync::{Slot, SlotGuard, StopSignal};
use crate::transport::{FrameStream, RawFrame, Transport};
use async_stream::stream;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One preview frame
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    buffer: Arc<[u8]>,
    len: usize,
}

impl PreviewFrame {
    fn from_raw(raw: RawFrame) -> ThetaResult<Self> {
        if raw.payload().is_none() {
            return Err(ThetaError::Protocol(format!(
                "frame length {} exceeds its {}-byte buffer",
                raw.valid_len,
                raw.buffer.len()
            )));
        }
        Ok(Self {
            len: raw.valid_len,
            buffer: raw.buffer,
        })
    }

    /// The frame data, usually one JPEG image
    pub fn bytes(&self) -> &[u8] {
        self.buffer.get(..self.len).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// How a preview ended
#[derive(Debug, Clone)]
pub enum PreviewEnd {
    /// The frame callback returned `false`
    ConsumerStopped,
    /// [`PreviewHandle::stop`] was called
    Stopped,
    /// The device closed the stream
    StreamEnded,
    Failed(ThetaError),
}

/// Pull-based sequence of preview frames
///
/// Holds the connection's preview slot until dropped or exhausted. A
/// transport failure or malformed frame is yielded once and ends the
/// sequence.
pub struct PreviewFrames {
    inner: BoxStream<'static, ThetaResult<PreviewFrame>>,
    signal: Arc<StopSignal>,
}

impl PreviewFrames {
    fn new(frames: FrameStream, signal: Arc<StopSignal>, guard: SlotGuard<Arc<StopSignal>>) -> Self {
        let stop = Arc::clone(&signal);
        let inner = stream! {
            let _guard = guard;
            let mut frames = frames;
            loop {
                let next = tokio::select! {
                    biased;
                    _ = stop.stopped() => {
                        debug!("Preview stop observed");
                        break;
                    }
                    next = frames.next() => next,
                };
                match next {
                    None => break,
                    Some(Err(e)) => {
                        warn!(error = %e, "Preview transport failed");
                        yield Err(ThetaError::Transport(e));
                        break;
                    }
                    Some(Ok(raw)) => match PreviewFrame::from_raw(raw) {
                        Ok(frame) => yield Ok(frame),
                        Err(e) => {
                            warn!(error = %e, "Malformed preview frame");
                            yield Err(e);
                            break;
                        }
                    },
                }
            }
        };
        Self {
            inner: inner.boxed(),
            signal,
        }
    }

    /// End the sequence at the next frame boundary
    pub fn stop(&self) {
        self.signal.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.signal.is_stopped()
    }
}

impl Stream for PreviewFrames {
    type Item = ThetaResult<PreviewFrame>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

/// Handle to a callback-driven preview
///
/// Dropping it does not stop delivery or free the preview slot. The preview
/// ends when [`PreviewHandle::stop`] or [`LivePreview::stop`] is called, the
/// frame callback returns `false`, or the stream itself ends.
#[derive(Debug)]
pub struct PreviewHandle {
    signal: Arc<StopSignal>,
    task: JoinHandle<PreviewEnd>,
}

impl PreviewHandle {
    /// Stop delivery; no frame callback starts after the current one returns
    pub fn stop(&self) {
        self.signal.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.signal.is_stopped()
    }

    /// Wait for the preview task to end
    pub async fn finished(self) -> PreviewEnd {
        match self.task.await {
            Ok(end) => end,
            Err(e) => PreviewEnd::Failed(ThetaError::State(format!(
                "preview task ended abnormally: {}",
                e
            ))),
        }
    }
}

/// Preview state of one connection
pub struct LivePreview<T> {
    transport: Arc<T>,
    slot: Slot<Arc<StopSignal>>,
}

impl<T: Transport> LivePreview<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            slot: Slot::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_occupied()
    }

    /// Stop whichever preview is running; `false` if none is
    pub fn stop(&self) -> bool {
        match self.slot.current() {
            Some(signal) => {
                signal.stop();
                true
            }
            None => false,
        }
    }

    /// Open the preview as a pull-based stream
    pub async fn frames(&self) -> ThetaResult<PreviewFrames> {
        let signal = Arc::new(StopSignal::new());
        let guard = self.slot.claim(Arc::clone(&signal), "preview")?;
        open(&self.transport, signal, guard).await
    }

    /// Deliver frames to `on_frame` on a background task
    ///
    /// Delivery ends when `on_frame` returns `false`, when the handle is
    /// stopped, or when the stream ends or fails. Fails fast with
    /// [`ThetaError::State`] while another preview runs.
    pub fn start<F>(&self, mut on_frame: F) -> ThetaResult<PreviewHandle>
    where
        F: FnMut(&[u8]) -> bool + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ThetaError::State("preview requires a tokio runtime".to_string()))?;
        let signal = Arc::new(StopSignal::new());
        let guard = self.slot.claim(Arc::clone(&signal), "preview")?;
        info!("Preview started");

        let transport = Arc::clone(&self.transport);
        let task_signal = Arc::clone(&signal);
        let task = runtime.spawn(async move {
            let mut frames = match open(&transport, Arc::clone(&task_signal), guard).await {
                Ok(frames) => frames,
                Err(e) => return PreviewEnd::Failed(e),
            };

            let mut delivered = 0u64;
            let end = loop {
                match frames.next().await {
                    Some(Ok(frame)) => {
                        delivered += 1;
                        if !on_frame(frame.bytes()) {
                            frames.stop();
                            break PreviewEnd::ConsumerStopped;
                        }
                    }
                    Some(Err(e)) => break PreviewEnd::Failed(e),
                    None if task_signal.is_stopped() => break PreviewEnd::Stopped,
                    None => break PreviewEnd::StreamEnded,
                }
            };
            drop(frames);
            info!(frames = delivered, end = ?end, "Preview ended");
            end
        });

        Ok(PreviewHandle { signal, task })
    }
}

async fn open<T: Transport>(
    transport: &Arc<T>,
    signal: Arc<StopSignal>,
    guard: SlotGuard<Arc<StopSignal>>,
) -> ThetaResult<PreviewFrames> {
    let body = CommandRequest::new(commands::GET_LIVE_PREVIEW).to_wire();
    let frames = transport.subscribe(paths::EXECUTE, body).await?;
    Ok(PreviewFrames::new(frames, signal, guard))
}
