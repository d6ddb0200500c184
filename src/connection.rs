// SPDX-License-Identifier: GPL-3.0-only

//! Per-device connection
//!
//! Bundles the command client with the two pieces of shared mutable state a
//! device connection has: the capture slot and the preview slot. Commands
//! may be issued concurrently; captures and previews are exclusive.
//!
//! Captures and previews are refused until [`Connection::initialize`] has
//! negotiated the client API version.

use crate::capture::{CaptureConfig, CaptureHandle, CaptureSession};
use crate::command::CommandClient;
use crate::errors::{ThetaError, ThetaResult};
use crate::options::{OptionKey, OptionSet};
use crate::preview::{LivePreview, PreviewFrames, PreviewHandle};
use crate::transport::Transport;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

pub struct Connection<T> {
    client: CommandClient<T>,
    capture: CaptureSession<T>,
    preview: LivePreview<T>,
    initialized: AtomicBool,
}

impl<T: Transport> Connection<T> {
    pub fn new(transport: Arc<T>) -> Self {
        let client = CommandClient::new(Arc::clone(&transport));
        Self {
            capture: CaptureSession::new(client.clone()),
            preview: LivePreview::new(transport),
            client,
            initialized: AtomicBool::new(false),
        }
    }

    /// Negotiate the client API version
    ///
    /// The device falls back to version 1 whenever the connection drops, so
    /// this is sent again on every new connection.
    pub async fn initialize(&self, client_version: i64) -> ThetaResult<()> {
        let current = self
            .client
            .get_options(&[OptionKey::ClientVersion])
            .await?
            .int(OptionKey::ClientVersion);
        if current != Some(client_version) {
            let options = OptionSet::new().with(OptionKey::ClientVersion, client_version)?;
            self.client.set_options(&options).await?;
        }
        self.initialized.store(true, Ordering::SeqCst);
        info!(client_version, "Connection initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn ensure_initialized(&self) -> ThetaResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(ThetaError::State("connection is not initialized".to_string()))
        }
    }

    pub fn commands(&self) -> &CommandClient<T> {
        &self.client
    }

    pub fn capture(&self) -> &CaptureSession<T> {
        &self.capture
    }

    pub fn preview(&self) -> &LivePreview<T> {
        &self.preview
    }

    pub fn start_capture<F>(&self, config: CaptureConfig, on_complete: F) -> ThetaResult<CaptureHandle>
    where
        F: FnOnce(ThetaResult<String>) + Send + 'static,
    {
        self.ensure_initialized()?;
        self.capture.start_capture(config, on_complete)
    }

    pub fn stop_capture(&self) -> ThetaResult<()> {
        self.capture.stop_capture()
    }

    pub fn start_preview<F>(&self, on_frame: F) -> ThetaResult<PreviewHandle>
    where
        F: FnMut(&[u8]) -> bool + Send + 'static,
    {
        self.ensure_initialized()?;
        self.preview.start(on_frame)
    }

    pub async fn preview_frames(&self) -> ThetaResult<PreviewFrames> {
        self.ensure_initialized()?;
        self.preview.frames().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::paths;
    use crate::transport::ReplayTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_initialize_skips_set_when_current() {
        let transport = Arc::new(ReplayTransport::new());
        transport.push_response(
            paths::EXECUTE,
            json!({"name": "camera.getOptions", "state": "done", "results": {"options": {"clientVersion": 2}}}),
        );
        let connection = Connection::new(Arc::clone(&transport));
        connection.initialize(2).await.unwrap();
        assert_eq!(transport.command_names(), vec!["camera.getOptions"]);
        assert!(connection.is_initialized());
    }

    #[tokio::test]
    async fn test_capture_and_preview_refused_before_initialize() {
        let transport = Arc::new(ReplayTransport::new());
        let connection = Connection::new(Arc::clone(&transport));
        let config = crate::capture::PhotoCaptureBuilder::new().build().unwrap();

        let err = connection.start_capture(config, |_| {}).unwrap_err();
        assert!(err.is_state());
        assert!(connection.start_preview(|_| true).unwrap_err().is_state());
        assert!(matches!(
            connection.preview_frames().await,
            Err(ThetaError::State(_))
        ));
        assert!(!connection.capture().is_capturing());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_initialize_keeps_connection_closed() {
        let transport = Arc::new(ReplayTransport::new());
        transport.push_failure(paths::EXECUTE, "connection refused");
        let connection = Connection::new(Arc::clone(&transport));

        assert!(connection.initialize(2).await.is_err());
        assert!(!connection.is_initialized());
    }

    #[tokio::test]
    async fn test_initialize_upgrades_version() {
        let transport = Arc::new(ReplayTransport::new());
        transport.push_response(
            paths::EXECUTE,
            json!({"name": "camera.getOptions", "state": "done", "results": {"options": {"clientVersion": 1}}}),
        );
        transport.push_response(
            paths::EXECUTE,
            json!({"name": "camera.setOptions", "state": "done"}),
        );
        let connection = Connection::new(Arc::clone(&transport));
        connection.initialize(2).await.unwrap();
        let requests = transport.requests();
        assert_eq!(
            requests[1].body["parameters"]["options"],
            json!({"clientVersion": 2})
        );
    }
}
