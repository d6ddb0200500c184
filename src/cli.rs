// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing option keys
//! - Decoding option records
//! - Replaying captures and previews from recorded transcripts

use crate::CaptureArg;
use chrono::Local;
use futures::channel::oneshot;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thetalink::options::{self, OptionKey, WireRecord};
use thetalink::preview::PreviewEnd;
use thetalink::sync::StopSignal;
use thetalink::{Config, Connection, ReplayTransport};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Load the configuration from `path` or the default location
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// List every option key
pub fn list_keys() -> CliResult {
    println!("{:<36} {:<10} shape", "wire name", "access");
    println!();
    for key in OptionKey::ALL {
        let access = if key.is_read_only() { "read" } else { "read/write" };
        println!("{:<36} {:<10} {}", key.wire_name(), access, key.shape());
    }
    Ok(())
}

/// Decode an options object and print its normalized re-encoding
///
/// Accepts either a bare options object or a `getOptions` response.
pub fn decode_file(path: &Path) -> CliResult {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;

    let record: WireRecord = value
        .pointer("/results/options")
        .or_else(|| value.get("options"))
        .unwrap_or(&value)
        .as_object()
        .cloned()
        .ok_or("expected a JSON object of options")?;

    let decoded = options::decode(&record)?;
    let dropped = record.len() - decoded.len();

    println!(
        "{}",
        serde_json::to_string_pretty(&options::encode(&decoded))?
    );
    println!();
    println!("{} keys decoded, {} unknown keys dropped", decoded.len(), dropped);
    Ok(())
}

/// Run a photo or video capture against a transcript
pub fn replay_capture(
    config: &Config,
    transcript: &Path,
    kind: CaptureArg,
    duration: u64,
) -> CliResult {
    let transport = ReplayTransport::from_transcript(transcript)?;
    let capture = match kind {
        CaptureArg::Photo => config.photo_builder().build()?,
        CaptureArg::Video => config.video_builder().build()?,
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let connection = Connection::new(Arc::new(transport));
        connection.initialize(config.client_version).await?;

        let (tx, rx) = oneshot::channel();
        let handle = connection.start_capture(capture, move |result| {
            let _ = tx.send(result);
        })?;
        println!("Capture {} started ({:?})", handle.id(), handle.kind());

        if let CaptureArg::Video = kind {
            // Set up Ctrl+C handler
            let interrupt = Arc::new(StopSignal::new());
            let interrupt_clone = Arc::clone(&interrupt);
            ctrlc::set_handler(move || interrupt_clone.stop())?;

            println!("Recording... (press Ctrl+C to stop early)");
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(duration)) => {}
                _ = interrupt.stopped() => println!("Stopping early..."),
            }
            connection.stop_capture()?;
        }

        match rx.await {
            Ok(Ok(file_url)) => println!("Saved on device: {}", file_url),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err("capture ended without a result".into()),
        }
        handle.finished().await;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Replay preview frames, saving each one as a timestamped JPEG file
pub fn replay_preview(
    config: &Config,
    transcript: &Path,
    output: Option<PathBuf>,
    limit: Option<u64>,
) -> CliResult {
    let transport = ReplayTransport::from_transcript(transcript)?;
    let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&output_dir)?;
    let limit = limit.or(config.preview_frame_limit);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let connection = Arc::new(Connection::new(Arc::new(transport)));
        connection.initialize(config.client_version).await?;

        let written = Arc::new(AtomicU64::new(0));
        let written_clone = Arc::clone(&written);
        let handle = connection.start_preview(move |bytes| {
            let index = written_clone.fetch_add(1, Ordering::SeqCst) + 1;
            match save_frame(&output_dir, index, bytes) {
                Ok(path) => println!("{}", path.display()),
                Err(e) => {
                    eprintln!("Failed to save frame {}: {}", index, e);
                    return false;
                }
            }
            limit.is_none_or(|limit| index < limit)
        })?;

        // Set up Ctrl+C handler
        let interrupt = Arc::new(StopSignal::new());
        let interrupt_clone = Arc::clone(&interrupt);
        ctrlc::set_handler(move || interrupt_clone.stop())?;
        let watcher = {
            let connection = Arc::clone(&connection);
            tokio::spawn(async move {
                interrupt.stopped().await;
                connection.preview().stop();
            })
        };

        let end = handle.finished().await;
        watcher.abort();

        let count = written.load(Ordering::SeqCst);
        match end {
            PreviewEnd::Failed(e) => return Err(e.into()),
            PreviewEnd::ConsumerStopped => println!("Stopped after {} frames", count),
            PreviewEnd::Stopped => println!("Interrupted after {} frames", count),
            PreviewEnd::StreamEnded => println!("Stream ended after {} frames", count),
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

fn save_frame(dir: &Path, index: u64, bytes: &[u8]) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S%.3f");
    let path = dir.join(format!("preview_{}_{:05}.jpg", timestamp, index));
    std::fs::write(&path, bytes)?;

    match image::load_from_memory(bytes) {
        Ok(img) => println!("  frame {}: {}x{}", index, img.width(), img.height()),
        Err(e) => println!("  frame {}: not a decodable image ({})", index, e),
    }
    Ok(path)
}

/// Print the effective configuration, optionally saving it
pub fn show_config(config: &Config, path: Option<&Path>, save: bool) -> CliResult {
    println!("{}", serde_json::to_string_pretty(config)?);
    if save {
        let written = match path {
            Some(path) => {
                config.save_to(path)?;
                path.to_path_buf()
            }
            None => config.save()?,
        };
        println!();
        println!("Saved to {}", written.display());
    } else if let Some(path) = path.map(Path::to_path_buf).or_else(Config::default_path) {
        println!();
        println!("Config file: {}", path.display());
    }
    Ok(())
}
