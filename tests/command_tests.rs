// SPDX-License-Identifier: MPL-2.0

//! Integration tests for command issuance and status polling

use serde_json::{Map, json};
use std::sync::Arc;
use thetalink::command::{AccessPoint, AuthMode, CommandPhase, FileType, IpAddressAllocation, Progress};
use thetalink::constants::{commands, paths};
use thetalink::options::{CaptureMode, OptionKey, OptionSet, WhiteBalance};
use thetalink::{CommandClient, CommandRequest, CommandState, ReplayTransport, ThetaError};
use uuid::Uuid;

fn setup() -> (Arc<ReplayTransport>, CommandClient<ReplayTransport>) {
    let transport = Arc::new(ReplayTransport::new());
    let client = CommandClient::new(Arc::clone(&transport));
    (transport, client)
}

#[tokio::test]
async fn test_poll_sequence_in_order() {
    let (transport, client) = setup();
    transport.push_response(
        paths::EXECUTE,
        json!({"name": "camera.takePicture", "state": "inProgress", "id": "X", "progress": {"completion": 0.0}}),
    );
    transport.push_response(
        paths::STATUS,
        json!({"name": "camera.takePicture", "state": "inProgress", "id": "X", "progress": {"completion": 10}}),
    );
    transport.push_response(
        paths::STATUS,
        json!({"name": "camera.takePicture", "state": "inProgress", "id": "X", "progress": {"completion": 50}}),
    );
    transport.push_response(
        paths::STATUS,
        json!({"name": "camera.takePicture", "state": "done", "id": "X", "results": {"fileUrl": "http://cam/R0010001.JPG"}}),
    );

    let first = client
        .execute(commands::TAKE_PICTURE, None, Map::new())
        .await
        .unwrap();
    assert_eq!(first.state(), CommandState::InProgress);
    let id = first.id.clone().unwrap();

    let a = client.poll(&id).await.unwrap();
    let b = client.poll(&id).await.unwrap();
    let c = client.poll(&id).await.unwrap();

    assert_eq!(a.state(), CommandState::InProgress);
    assert_eq!(a.progress(), Some(Progress { percentage: 10.0 }));
    assert!(a.results().is_none());

    assert_eq!(b.state(), CommandState::InProgress);
    assert_eq!(b.progress(), Some(Progress { percentage: 50.0 }));
    assert!(b.results().is_none());

    assert_eq!(c.state(), CommandState::Done);
    assert_eq!(
        c.results(),
        Some(&json!({"fileUrl": "http://cam/R0010001.JPG"}))
    );

    let polls: Vec<_> = transport
        .requests()
        .into_iter()
        .filter(|r| r.path == paths::STATUS)
        .map(|r| r.body)
        .collect();
    assert_eq!(polls, vec![json!({"id": "X"}); 3]);
}

#[tokio::test]
async fn test_session_id_inside_parameters() {
    let (transport, client) = setup();
    transport.push_response(
        paths::EXECUTE,
        json!({"name": "camera.reset", "state": "done"}),
    );

    client
        .execute(commands::RESET, Some("SID_0001"), Map::new())
        .await
        .unwrap();

    let body = &transport.requests()[0].body;
    assert_eq!(body["parameters"]["sessionId"], json!("SID_0001"));
    assert!(body.get("sessionId").is_none());
}

#[tokio::test]
async fn test_tracked_execution_reaches_done() {
    let (transport, client) = setup();
    transport.push_response(
        paths::EXECUTE,
        json!({"name": "camera._convertVideoFormats", "state": "inProgress", "id": "7"}),
    );
    transport.push_response(
        paths::STATUS,
        json!({"name": "camera._convertVideoFormats", "state": "done", "id": "7", "results": {"fileUrl": "http://cam/low.MP4"}}),
    );

    let mut execution = client
        .convert_video_formats(
            "http://cam/R0010002.MP4",
            true,
            thetalink::options::TopBottomCorrection::Apply,
        )
        .await
        .unwrap();
    assert_eq!(
        execution.phase(),
        &CommandPhase::InProgress { id: "7".to_string() }
    );

    client.advance(&mut execution).await.unwrap();
    assert_eq!(execution.phase(), &CommandPhase::Done);

    // Terminal executions cannot be polled again
    let err = client.advance(&mut execution).await.unwrap_err();
    assert!(err.is_state());

    let params = &transport.requests()[0].body["parameters"];
    assert_eq!(params["size"], json!("1920x960"));
    assert_eq!(params["topBottomCorrection"], json!("Apply"));
}

#[tokio::test]
async fn test_poll_with_foreign_id_is_protocol_error() {
    let (transport, client) = setup();
    transport.push_response(
        paths::EXECUTE,
        json!({"name": "camera.takePicture", "state": "inProgress", "id": "1"}),
    );
    transport.push_response(
        paths::STATUS,
        json!({"name": "camera.takePicture", "state": "inProgress", "id": "2"}),
    );

    let mut execution = client
        .begin(CommandRequest::new(commands::TAKE_PICTURE))
        .await
        .unwrap();
    let err = client.advance(&mut execution).await.unwrap_err();
    assert!(matches!(err, ThetaError::Protocol(_)));
}

#[tokio::test]
async fn test_transport_failure_is_wrapped() {
    let (transport, client) = setup();
    transport.push_failure(paths::EXECUTE, "connection refused");

    let err = client.reset().await.unwrap_err();
    let ThetaError::Transport(inner) = err else {
        panic!("expected transport error, got {:?}", err);
    };
    assert_eq!(inner.message(), "connection refused");
}

#[tokio::test]
async fn test_no_retry_after_failure() {
    let (transport, client) = setup();
    transport.push_failure(paths::EXECUTE, "timeout");
    transport.push_response(
        paths::EXECUTE,
        json!({"name": "camera.reset", "state": "done"}),
    );

    assert!(client.reset().await.is_err());
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(transport.pending(paths::EXECUTE), 1);
}

#[tokio::test]
async fn test_plugin_orders_and_files() {
    let (transport, client) = setup();
    transport.push_response(
        paths::EXECUTE,
        json!({"name": "camera._getPluginOrders", "state": "done", "results": {"pluginOrders": ["a.b.c", ""]}}),
    );
    transport.push_response(
        paths::EXECUTE,
        json!({
            "name": "camera.listFiles",
            "state": "done",
            "results": {
                "entries": [{"name": "R0010001.JPG", "fileUrl": "http://cam/R0010001.JPG", "size": 4096}],
                "totalEntries": 12
            }
        }),
    );

    assert_eq!(client.get_plugin_orders().await.unwrap(), vec!["a.b.c", ""]);

    let (entries, total) = client
        .list_files(thetalink::command::FileType::Image, 0, 1)
        .await
        .unwrap();
    assert_eq!(total, 12);
    assert_eq!(entries[0].name, "R0010001.JPG");
    assert_eq!(entries[0].size, 4096);
}

fn done(name: &str) -> serde_json::Value {
    json!({"name": name, "state": "done"})
}

#[tokio::test]
async fn test_convert_done_after_cancel_is_accepted() {
    let (transport, client) = setup();
    transport.push_response(
        paths::EXECUTE,
        json!({"name": "camera._convertVideoFormats", "state": "inProgress", "id": "9"}),
    );
    transport.push_response(paths::EXECUTE, done("camera._cancelVideoConvert"));
    transport.push_response(
        paths::STATUS,
        json!({"name": "camera._convertVideoFormats", "state": "done", "id": "9", "results": {"fileUrl": "http://cam/low.MP4"}}),
    );

    let mut execution = client
        .convert_video_formats(
            "http://cam/R0010003.MP4",
            false,
            thetalink::options::TopBottomCorrection::Disapply,
        )
        .await
        .unwrap();
    client.cancel_video_convert().await.unwrap();

    // The cancel is advisory; the conversion may still finish
    let response = client.advance(&mut execution).await.unwrap();
    assert_eq!(response.state(), CommandState::Done);
    assert_eq!(execution.phase(), &CommandPhase::Done);
    assert_eq!(
        transport.command_names(),
        vec!["camera._convertVideoFormats", "camera._cancelVideoConvert"]
    );
    assert_eq!(transport.requests()[0].body["parameters"]["size"], json!("3840x1920"));
}

#[tokio::test]
async fn test_plugin_control_and_orders() {
    let (transport, client) = setup();
    for name in [
        "camera._pluginControl",
        "camera._pluginControl",
        "camera._pluginControl",
        "camera._setPluginOrders",
    ] {
        transport.push_response(paths::EXECUTE, done(name));
    }

    client.start_plugin(Some("com.example.timelapse")).await.unwrap();
    client.start_plugin(None).await.unwrap();
    client.stop_plugin().await.unwrap();
    client
        .set_plugin_orders(&["com.example.timelapse".to_string(), String::new()])
        .await
        .unwrap();

    let bodies: Vec<_> = transport.requests().into_iter().map(|r| r.body).collect();
    assert_eq!(
        bodies[0]["parameters"],
        json!({"action": "boot", "plugin": "com.example.timelapse"})
    );
    assert_eq!(bodies[1]["parameters"], json!({"action": "boot"}));
    assert_eq!(bodies[2]["parameters"], json!({"action": "finish"}));
    assert_eq!(
        bodies[3]["parameters"]["pluginOrders"],
        json!(["com.example.timelapse", ""])
    );
}

#[tokio::test]
async fn test_delete_files_and_delete_all() {
    let (transport, client) = setup();
    for _ in 0..4 {
        transport.push_response(paths::EXECUTE, done("camera.delete"));
    }

    client
        .delete_files(&["http://cam/R0010001.JPG".to_string()])
        .await
        .unwrap();
    client.delete_all_files(FileType::All).await.unwrap();
    client.delete_all_files(FileType::Image).await.unwrap();
    client.delete_all_files(FileType::Video).await.unwrap();

    let urls: Vec<_> = transport
        .requests()
        .into_iter()
        .map(|r| r.body["parameters"]["fileUrls"].clone())
        .collect();
    assert_eq!(
        urls,
        vec![
            json!(["http://cam/R0010001.JPG"]),
            json!(["all"]),
            json!(["image"]),
            json!(["video"])
        ]
    );
}

#[tokio::test]
async fn test_list_files_without_total_is_protocol_error() {
    let (transport, client) = setup();
    transport.push_response(
        paths::EXECUTE,
        json!({"name": "camera.listFiles", "state": "done", "results": {"entries": []}}),
    );

    let err = client.list_files(FileType::Video, 0, 10).await.unwrap_err();
    assert!(matches!(err, ThetaError::Protocol(_)));
}

#[tokio::test]
async fn test_my_setting_uses_option_codec() {
    let (transport, client) = setup();
    transport.push_response(
        paths::EXECUTE,
        json!({
            "name": "camera._getMySetting",
            "state": "done",
            "results": {"options": {"whiteBalance": "cloudy-daylight", "_colorTemperature": 5000}}
        }),
    );
    transport.push_response(paths::EXECUTE, done("camera._setMySetting"));
    transport.push_response(paths::EXECUTE, done("camera._deleteMySetting"));

    let stored = client.get_my_setting(CaptureMode::Image).await.unwrap();
    assert_eq!(
        stored.enum_value(OptionKey::WhiteBalance),
        Some(WhiteBalance::CloudyDaylight.into())
    );
    assert_eq!(stored.int(OptionKey::ColorTemperature), Some(5000));

    let update = OptionSet::new().with(OptionKey::Iso, 400).unwrap();
    client.set_my_setting(CaptureMode::Video, &update).await.unwrap();
    client.delete_my_setting(CaptureMode::Video).await.unwrap();

    let bodies: Vec<_> = transport.requests().into_iter().map(|r| r.body).collect();
    assert_eq!(bodies[0]["parameters"], json!({"mode": "image"}));
    assert_eq!(
        bodies[1]["parameters"],
        json!({"mode": "video", "options": {"iso": 400}})
    );
    assert_eq!(bodies[2]["parameters"], json!({"mode": "video"}));
}

#[tokio::test]
async fn test_my_setting_refuses_read_only_and_requires_options() {
    let (transport, client) = setup();
    let read_only = OptionSet::new().with(OptionKey::TotalSpace, 1).unwrap();
    let err = client
        .set_my_setting(CaptureMode::Image, &read_only)
        .await
        .unwrap_err();
    assert!(matches!(err, ThetaError::Configuration(_)));
    assert!(transport.requests().is_empty());

    transport.push_response(paths::EXECUTE, done("camera._getMySetting"));
    let err = client.get_my_setting(CaptureMode::Image).await.unwrap_err();
    assert!(matches!(err, ThetaError::Protocol(_)));
}

#[tokio::test]
async fn test_restore_settings_merges_overrides() {
    let (transport, client) = setup();
    transport.push_response(paths::EXECUTE, done("camera.setOptions"));

    let overrides = OptionSet::new()
        .with(OptionKey::WhiteBalance, WhiteBalance::Daylight)
        .unwrap();
    client.restore_settings(&overrides).await.unwrap();

    let options = &transport.requests()[0].body["parameters"]["options"];
    assert_eq!(options["whiteBalance"], json!("daylight"));
    assert_eq!(options["exposureProgram"], json!(2));
    assert_eq!(options["gpsInfo"], json!({"lat": 65535, "lng": 65535}));
}

#[tokio::test]
async fn test_access_points() {
    let (transport, client) = setup();
    transport.push_response(
        paths::EXECUTE,
        json!({
            "name": "camera._listAccessPoints",
            "state": "done",
            "results": {"accessPoints": [{
                "ssid": "office",
                "ssidStealth": false,
                "security": "WPA/WPA2 PSK",
                "connectionPriority": 2,
                "ipAddressAllocation": "static",
                "ipAddress": "192.168.0.20",
                "subnetMask": "255.255.255.0",
                "defaultGateway": "192.168.0.1"
            }]}
        }),
    );
    transport.push_response(paths::EXECUTE, done("camera._setAccessPoint"));
    transport.push_response(paths::EXECUTE, done("camera._deleteAccessPoint"));

    let access_points = client.list_access_points().await.unwrap();
    assert_eq!(access_points.len(), 1);
    assert_eq!(access_points[0].security, AuthMode::WpaPsk);
    assert_eq!(
        access_points[0].ip_address_allocation,
        IpAddressAllocation::Static
    );

    client
        .set_access_point(&AccessPoint::dynamic("home", AuthMode::WpaPsk), Some("secret"))
        .await
        .unwrap();
    client.delete_access_point("office").await.unwrap();

    let bodies: Vec<_> = transport.requests().into_iter().map(|r| r.body).collect();
    assert_eq!(
        bodies[1]["parameters"],
        json!({
            "ssid": "home",
            "ssidStealth": false,
            "security": "WPA/WPA2 PSK",
            "connectionPriority": 1,
            "ipAddressAllocation": "dynamic",
            "password": "secret"
        })
    );
    assert_eq!(bodies[2]["parameters"], json!({"ssid": "office"}));
}

#[tokio::test]
async fn test_metadata_and_bluetooth() {
    let (transport, client) = setup();
    transport.push_response(
        paths::EXECUTE,
        json!({
            "name": "camera._getMetadata",
            "state": "done",
            "results": {"exif": {"ExposureTime": 0.008}, "xmp": {"ProjectionType": "equirectangular"}}
        }),
    );
    transport.push_response(
        paths::EXECUTE,
        json!({"name": "camera._setBluetoothDevice", "state": "done", "results": {"deviceName": "10100001"}}),
    );

    let metadata = client.get_metadata("http://cam/R0010001.JPG").await.unwrap();
    assert_eq!(metadata.exif["ExposureTime"], json!(0.008));
    assert_eq!(metadata.xmp["ProjectionType"], json!("equirectangular"));

    let device = Uuid::new_v4();
    assert_eq!(client.set_bluetooth_device(device).await.unwrap(), "10100001");
    assert_eq!(
        transport.requests()[1].body["parameters"]["uuid"],
        json!(device.to_string())
    );
}
