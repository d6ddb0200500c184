// SPDX-License-Identifier: MPL-2.0

//! thetalink - protocol layer for remote control of 360° cameras
//!
//! Speaks the Open Spherical Camera command protocol with vendor extensions:
//! typed device options, named commands with status polling, still and video
//! capture, and the live preview stream. The HTTP transport itself is a
//! collaborator supplied by the caller.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`options`]: Option keys, values and the wire codec
//! - [`command`]: Command envelope, status polling and typed commands
//! - [`capture`]: Photo and video capture sessions
//! - [`preview`]: Live preview frame delivery
//! - [`transport`]: Transport trait and a scripted replay transport
//! - [`connection`]: Per-device bundle of the above
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! let connection = Connection::new(Arc::new(my_transport));
//! connection.initialize(2).await?;
//! let config = PhotoCaptureBuilder::new().exposure_delay(2).build()?;
//! connection.start_capture(config, |result| println!("{:?}", result))?;
//! ```

pub mod capture;
pub mod command;
pub mod config;
pub mod connection;
pub mod constants;
pub mod errors;
pub mod options;
pub mod preview;
pub mod sync;
pub mod transport;

// Re-export commonly used types
pub use capture::{CaptureConfig, CaptureKind, PhotoCaptureBuilder, VideoCaptureBuilder};
pub use command::{CommandClient, CommandRequest, CommandResponse, CommandState};
pub use config::Config;
pub use connection::Connection;
pub use errors::{DeviceError, ThetaError, ThetaResult, TransportError};
pub use options::{OptionKey, OptionSet, OptionValue};
pub use preview::{PreviewEnd, PreviewFrame, PreviewHandle};
pub use transport::{RawFrame, ReplayTransport, Transport};
