// SPDX-License-Identifier: GPL-3.0-only

//! Photo and video capture
//!
//! # Architecture
//!
//! ```text
//! PhotoCaptureBuilder ─┐
//!                      ├─ build() ──▶ CaptureConfig (validated, immutable)
//! VideoCaptureBuilder ─┘                    │
//!                                           ▼
//!                         CaptureSession::start_capture(config, on_complete)
//!                                           │ claims the capture slot
//!                                           ▼
//!                         ┌───────── background task ─────────┐
//!                         │ setOptions (captureMode + config) │
//!                         │ takePicture | startCapture        │
//!                         │ poll until done                   │
//!                         │ (video) wait for stop_capture()   │
//!                         │ (video) stopCapture, poll         │
//!                         └─────────────────┬─────────────────┘
//!                                           │ frees the slot
//!                                           ▼
//!                                on_complete(Ok(url) | Err(e))
//! ```

pub mod config;
pub mod session;

pub use config::{CaptureConfig, CaptureKind, PhotoCaptureBuilder, VideoCaptureBuilder};
pub use session::{CaptureHandle, CaptureSession};
