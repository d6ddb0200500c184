// SPDX-License-Identifier: GPL-3.0-only

//! Capture slot and the background task driving one capture

use super::config::{CaptureConfig, CaptureKind};
use crate::command::{CommandClient, CommandExecution, CommandRequest, CommandResponse};
use crate::constants::commands;
use crate::errors::{ThetaError, ThetaResult};
use crate::sync::{Slot, StopSignal};
use crate::transport::Transport;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// `_captureStatus` reported once the device is no longer recording
const CAPTURE_STATUS_IDLE: &str = "idle";

/// The capture currently occupying the slot
#[derive(Clone)]
struct ActiveCapture {
    id: Uuid,
    kind: CaptureKind,
    stop: Arc<StopSignal>,
}

/// Handle to a started capture
///
/// Dropping it does not affect the capture; the completion callback fires
/// regardless.
#[derive(Debug)]
pub struct CaptureHandle {
    id: Uuid,
    kind: CaptureKind,
    task: JoinHandle<()>,
}

impl CaptureHandle {
    /// Identifier used in log output
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> CaptureKind {
        self.kind
    }

    /// Wait until the completion callback has returned
    pub async fn finished(self) {
        if let Err(e) = self.task.await {
            warn!(capture = %self.id, error = %e, "Capture task did not complete");
        }
    }
}

/// Capture state of one connection
///
/// At most one capture runs at a time. The slot is freed before the
/// completion callback runs, so the callback may start the next capture.
pub struct CaptureSession<T> {
    client: CommandClient<T>,
    slot: Slot<ActiveCapture>,
}

impl<T: Transport> CaptureSession<T> {
    pub fn new(client: CommandClient<T>) -> Self {
        Self {
            client,
            slot: Slot::default(),
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.slot.is_occupied()
    }

    /// Kind of the running capture, if any
    pub fn active_kind(&self) -> Option<CaptureKind> {
        self.slot.current().map(|active| active.kind)
    }

    /// Start a capture on a background task
    ///
    /// `on_complete` is called exactly once with the file URL or the failure.
    /// Fails fast with [`ThetaError::State`] while another capture runs; in
    /// that case `on_complete` is dropped without being called.
    pub fn start_capture<F>(&self, config: CaptureConfig, on_complete: F) -> ThetaResult<CaptureHandle>
    where
        F: FnOnce(ThetaResult<String>) + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ThetaError::State("capture requires a tokio runtime".to_string()))?;

        let active = ActiveCapture {
            id: Uuid::new_v4(),
            kind: config.kind(),
            stop: Arc::new(StopSignal::new()),
        };
        let guard = self.slot.claim(active.clone(), "capture")?;

        let id = active.id;
        let kind = active.kind;
        info!(capture = %id, kind = %kind, "Capture started");

        let client = self.client.clone();
        let task = runtime.spawn(async move {
            let result = run_capture(&client, &config, &active.stop).await;
            match &result {
                Ok(file_url) => info!(capture = %id, file = %file_url, "Capture finished"),
                Err(e) => warn!(capture = %id, error = %e, "Capture failed"),
            }
            drop(guard);
            on_complete(result);
        });

        Ok(CaptureHandle { id, kind, task })
    }

    /// Ask a running video capture to stop
    ///
    /// Only valid while a video capture runs. The completion callback of that
    /// capture still fires exactly once, with the recorded file.
    pub fn stop_capture(&self) -> ThetaResult<()> {
        let active = self
            .slot
            .current()
            .ok_or_else(|| ThetaError::State("no capture in progress".to_string()))?;
        if active.kind != CaptureKind::Video {
            return Err(ThetaError::State(format!(
                "a {} capture cannot be stopped",
                active.kind
            )));
        }
        info!(capture = %active.id, "Capture stop requested");
        active.stop.stop();
        Ok(())
    }
}

async fn run_capture<T: Transport>(
    client: &CommandClient<T>,
    config: &CaptureConfig,
    stop: &StopSignal,
) -> ThetaResult<String> {
    client.set_options(&config.device_options()?).await?;

    match config.kind() {
        CaptureKind::Photo => {
            let execution = client
                .begin(CommandRequest::new(commands::TAKE_PICTURE))
                .await?;
            let results = wait_until_done(client, execution, config).await?;
            photo_file_url(&results)
        }
        CaptureKind::Video => {
            let execution = client
                .begin(CommandRequest::new(commands::START_CAPTURE))
                .await?;
            wait_until_done(client, execution, config).await?;

            debug!("Recording until stopped");
            if let Some(file_url) = record_until_stopped(client, config, stop).await? {
                return Ok(file_url);
            }

            let execution = client
                .begin(CommandRequest::new(commands::STOP_CAPTURE))
                .await?;
            let results = wait_until_done(client, execution, config).await?;
            video_file_url(&results)
        }
    }
}

/// Wait for a stop request while watching the device capture status
///
/// Returns the file URL when the device ended the recording itself, for
/// example on reaching `_maxRecordableTime` or running out of storage. A
/// failed status poll does not end the recording.
async fn record_until_stopped<T: Transport>(
    client: &CommandClient<T>,
    config: &CaptureConfig,
    stop: &StopSignal,
) -> ThetaResult<Option<String>> {
    loop {
        tokio::select! {
            biased;
            _ = stop.stopped() => return Ok(None),
            _ = tokio::time::sleep(config.poll_interval()) => {}
        }

        let state = match client.state().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Capture status poll failed");
                continue;
            }
        };
        let status = state
            .pointer("/state/_captureStatus")
            .and_then(Value::as_str);
        trace!(status = ?status, "Capture status");
        if status == Some(CAPTURE_STATUS_IDLE) && !stop.is_stopped() {
            info!("Recording ended on the device");
            return latest_file_url(&state).map(Some);
        }
    }
}

/// Poll at the configured cadence until the command reaches a terminal state
async fn wait_until_done<T: Transport>(
    client: &CommandClient<T>,
    mut execution: CommandExecution,
    config: &CaptureConfig,
) -> ThetaResult<Value> {
    let started = Instant::now();

    while !execution.is_terminal() {
        if let Some(progress) = execution.last_response().and_then(CommandResponse::progress) {
            debug!(
                command = %execution.request().name,
                progress = progress.percentage,
                "Command in progress"
            );
        }

        tokio::time::sleep(config.poll_interval()).await;

        if let Some(timeout) = config.timeout()
            && started.elapsed() >= timeout
        {
            return Err(ThetaError::Timeout {
                operation: execution.request().name.clone(),
                after: timeout,
            });
        }

        client.advance(&mut execution).await?;
    }

    execution
        .into_last_response()
        .ok_or_else(|| ThetaError::Protocol("command finished without a response".to_string()))?
        .into_results()
}

fn photo_file_url(results: &Value) -> ThetaResult<String> {
    results
        .get("fileUrl")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ThetaError::Protocol("takePicture results carry no fileUrl".to_string()))
}

fn video_file_url(results: &Value) -> ThetaResult<String> {
    results
        .get("fileUrls")
        .and_then(|urls| urls.get(0))
        .or_else(|| results.get("fileUrl"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ThetaError::Protocol("stopCapture results carry no file URL".to_string()))
}

fn latest_file_url(state: &Value) -> ThetaResult<String> {
    state
        .pointer("/state/_latestFileUrl")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ThetaError::Protocol("recording ended without a _latestFileUrl".to_string())
        })
}
