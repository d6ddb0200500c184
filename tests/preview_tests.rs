// SPDX-License-Identifier: MPL-2.0

//! Integration tests for live preview delivery

use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use serde_json::json;
use std::time::Duration;
use thetalink::constants::paths;
use thetalink::preview::PreviewEnd;
use thetalink::{Connection, RawFrame, ReplayTransport, ThetaError};

fn jpeg_like(marker: u8) -> Vec<u8> {
    vec![0xff, 0xd8, marker, 0xff, 0xd9]
}

fn transport_with_frames(count: u8, interval: Option<Duration>) -> Arc<ReplayTransport> {
    let transport = match interval {
        Some(interval) => ReplayTransport::new().with_frame_interval(interval),
        None => ReplayTransport::new(),
    };
    for marker in 0..count {
        transport.push_frame(RawFrame::from_bytes(jpeg_like(marker)));
    }
    Arc::new(transport)
}

/// A connection that has negotiated client version 2
async fn connect(transport: &Arc<ReplayTransport>) -> Connection<ReplayTransport> {
    transport.push_response(
        paths::EXECUTE,
        json!({"name": "camera.getOptions", "state": "done", "results": {"options": {"clientVersion": 2}}}),
    );
    let connection = Connection::new(Arc::clone(transport));
    connection.initialize(2).await.unwrap();
    connection
}

#[tokio::test]
async fn test_no_callback_after_false() {
    let transport = transport_with_frames(5, None);
    let connection = connect(&transport).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let handle = connection
        .start_preview(move |_| counter.fetch_add(1, Ordering::SeqCst) + 1 < 2)
        .unwrap();

    let end = handle.finished().await;
    assert!(matches!(end, PreviewEnd::ConsumerStopped));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!connection.preview().is_active());
}

#[tokio::test]
async fn test_frames_delivered_in_order_until_end() {
    let transport = transport_with_frames(3, None);
    let connection = connect(&transport).await;
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let handle = connection
        .start_preview(move |bytes| {
            sink.lock().unwrap().push(bytes[2]);
            true
        })
        .unwrap();

    assert!(matches!(handle.finished().await, PreviewEnd::StreamEnded));
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    assert_eq!(transport.subscriptions(), 1);
    let request = transport.requests().pop().unwrap();
    assert_eq!(request.path, paths::EXECUTE);
    assert_eq!(request.body["name"], "camera.getLivePreview");
}

#[tokio::test]
async fn test_stop_ends_delivery() {
    let transport = transport_with_frames(50, Some(Duration::from_millis(10)));
    let connection = connect(&transport).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let handle = connection
        .start_preview(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .unwrap();

    tokio::time::sleep(Duration::from_millis(45)).await;
    handle.stop();
    let end = handle.finished().await;

    assert!(matches!(end, PreviewEnd::Stopped));
    let delivered = calls.load(Ordering::SeqCst);
    assert!(delivered < 50);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(calls.load(Ordering::SeqCst), delivered);
}

#[tokio::test]
async fn test_second_start_fails_fast() {
    let transport = transport_with_frames(50, Some(Duration::from_millis(10)));
    let connection = connect(&transport).await;

    let handle = connection.start_preview(|_| true).unwrap();
    let err = connection.start_preview(|_| true).unwrap_err();
    assert!(matches!(err, ThetaError::State(_)));
    assert!(matches!(
        connection.preview_frames().await,
        Err(ThetaError::State(_))
    ));

    handle.stop();
    handle.finished().await;

    // The slot is free again once the first preview has ended
    let again = connection.start_preview(|_| false).unwrap();
    again.finished().await;
}

#[tokio::test]
async fn test_pull_stream_honours_valid_len() {
    let transport = Arc::new(ReplayTransport::new());
    transport.push_frame(RawFrame::new(Arc::from(vec![1u8, 2, 3, 0, 0, 0]), 3));
    transport.push_frame(RawFrame::new(Arc::from(vec![4u8, 5]), 2));
    let connection = connect(&transport).await;

    let frames: Vec<_> = connection
        .preview_frames()
        .await
        .unwrap()
        .map(|frame| frame.unwrap().bytes().to_vec())
        .collect()
        .await;

    assert_eq!(frames, vec![vec![1, 2, 3], vec![4, 5]]);
    assert!(!connection.preview().is_active());
}

#[tokio::test]
async fn test_overrunning_frame_ends_stream() {
    let transport = Arc::new(ReplayTransport::new());
    transport.push_frame(RawFrame::from_bytes(jpeg_like(0)));
    transport.push_frame(RawFrame::new(Arc::from(vec![0u8; 4]), 16));
    transport.push_frame(RawFrame::from_bytes(jpeg_like(2)));
    let connection = connect(&transport).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let end = connection
        .start_preview(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .unwrap()
        .finished()
        .await;

    assert!(matches!(end, PreviewEnd::Failed(ThetaError::Protocol(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_transport_failure_ends_stream() {
    let transport = Arc::new(ReplayTransport::new());
    transport.push_frame(RawFrame::from_bytes(jpeg_like(0)));
    transport.push_frame_failure("socket closed");
    let connection = connect(&transport).await;

    let end = connection.start_preview(|_| true).unwrap().finished().await;

    assert!(matches!(end, PreviewEnd::Failed(ThetaError::Transport(_))));
}

#[tokio::test]
async fn test_dropped_handle_keeps_delivering() {
    let transport = transport_with_frames(50, Some(Duration::from_millis(10)));
    let connection = connect(&transport).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    drop(
        connection
            .start_preview(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            })
            .unwrap(),
    );

    tokio::time::sleep(Duration::from_millis(45)).await;
    assert!(connection.preview().is_active());
    assert!(calls.load(Ordering::SeqCst) > 0);

    assert!(connection.preview().stop());
    for _ in 0..100 {
        if !connection.preview().is_active() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(!connection.preview().is_active());
}
