// SPDX-License-Identifier: MPL-2.0

//! Command issuance over a transport
//!
//! [`CommandClient`] sends one request per call. It never loops; a command
//! that answers `inProgress` is advanced by calling [`CommandClient::poll`]
//! again.

use super::{CommandExecution, CommandRequest, CommandResponse};
use crate::constants::{commands, paths};
use crate::errors::{ThetaError, ThetaResult};
use crate::options::{
    self, CaptureMode, GpsInfo, ImageFilter, OptionKey, OptionSet, TopBottomCorrection,
    WhiteBalance, WireRecord,
};
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// File category for `camera.listFiles`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    All,
    Image,
    Video,
}

impl FileType {
    fn wire_name(self) -> &'static str {
        match self {
            FileType::All => "all",
            FileType::Image => "image",
            FileType::Video => "video",
        }
    }
}

/// Entry reported by `camera.listFiles`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub file_url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub date_time_zone: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Plugin reported by `camera._listPlugins`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    pub plugin_name: String,
    pub package_name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "type")]
    pub plugin_type: Option<String>,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub foreground: bool,
    #[serde(default)]
    pub boot: bool,
    #[serde(default)]
    pub web_server: bool,
}

/// Security of an access point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "WEP")]
    Wep,
    #[serde(rename = "WPA/WPA2 PSK")]
    WpaPsk,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpAddressAllocation {
    #[default]
    Dynamic,
    Static,
}

/// Access point the camera joins in client mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPoint {
    pub ssid: String,
    #[serde(default)]
    pub ssid_stealth: bool,
    pub security: AuthMode,
    /// 1 (highest) to 5
    #[serde(default = "default_connection_priority")]
    pub connection_priority: i64,
    #[serde(default)]
    pub ip_address_allocation: IpAddressAllocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_mask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_gateway: Option<String>,
}

fn default_connection_priority() -> i64 {
    1
}

impl AccessPoint {
    /// Access point that hands out the camera address over DHCP
    pub fn dynamic(ssid: &str, security: AuthMode) -> Self {
        Self {
            ssid: ssid.to_string(),
            ssid_stealth: false,
            security,
            connection_priority: default_connection_priority(),
            ip_address_allocation: IpAddressAllocation::Dynamic,
            ip_address: None,
            subnet_mask: None,
            default_gateway: None,
        }
    }

    /// Access point with a fixed camera address
    pub fn fixed(
        ssid: &str,
        security: AuthMode,
        ip_address: &str,
        subnet_mask: &str,
        default_gateway: &str,
    ) -> Self {
        Self {
            ip_address_allocation: IpAddressAllocation::Static,
            ip_address: Some(ip_address.to_string()),
            subnet_mask: Some(subnet_mask.to_string()),
            default_gateway: Some(default_gateway.to_string()),
            ..Self::dynamic(ssid, security)
        }
    }
}

/// Exif and XMP metadata of a still image
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub exif: Map<String, Value>,
    #[serde(default)]
    pub xmp: Map<String, Value>,
}

/// Issues commands and single polls to one device
pub struct CommandClient<T> {
    transport: Arc<T>,
}

impl<T> Clone for CommandClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport> CommandClient<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Issue `name` with optional session id and parameters
    pub async fn execute(
        &self,
        name: &str,
        session_id: Option<&str>,
        parameters: Map<String, Value>,
    ) -> ThetaResult<CommandResponse> {
        let mut request = CommandRequest::new(name).with_parameters(parameters);
        if let Some(session_id) = session_id {
            request = request.with_session(session_id);
        }
        self.send(&request).await
    }

    /// Issue a prepared request once
    pub async fn send(&self, request: &CommandRequest) -> ThetaResult<CommandResponse> {
        debug!(command = %request.name, "Executing command");
        let body = self.transport.post(paths::EXECUTE, request.to_wire()).await?;
        CommandResponse::from_wire(body, &request.name)
    }

    /// Query the status of an in-progress command once
    pub async fn poll(&self, id: &str) -> ThetaResult<CommandResponse> {
        self.poll_named(id, "").await
    }

    async fn poll_named(&self, id: &str, name: &str) -> ThetaResult<CommandResponse> {
        debug!(id, command = name, "Polling command status");
        let body = self.transport.post(paths::STATUS, json!({ "id": id })).await?;
        CommandResponse::from_wire(body, name)
    }

    /// Issue `request` and track it
    pub async fn begin(&self, request: CommandRequest) -> ThetaResult<CommandExecution> {
        let mut execution = CommandExecution::new(request);
        execution.mark_sent()?;
        let response = self.send(execution.request()).await?;
        execution.record(response)?;
        Ok(execution)
    }

    /// Poll a tracked command once
    ///
    /// Fails with [`ThetaError::State`] when the command is not in progress.
    pub async fn advance<'e>(
        &self,
        execution: &'e mut CommandExecution,
    ) -> ThetaResult<&'e CommandResponse> {
        let id = execution
            .pending_id()
            .ok_or_else(|| {
                ThetaError::State(format!(
                    "{} is not in progress ({:?})",
                    execution.request().name,
                    execution.phase()
                ))
            })?
            .to_string();
        let response = self.poll_named(&id, &execution.request().name).await?;
        execution.record(response)
    }

    /// `camera.getOptions` for `keys`
    pub async fn get_options(&self, keys: &[OptionKey]) -> ThetaResult<OptionSet> {
        let request = CommandRequest::new(commands::GET_OPTIONS)
            .with_parameter("optionNames", options::codec::encode_names(keys));
        self.fetch_options(&request).await
    }

    /// `camera.setOptions`; read-only keys are refused before sending
    pub async fn set_options(&self, options: &OptionSet) -> ThetaResult<()> {
        refuse_read_only(options)?;
        let request = CommandRequest::new(commands::SET_OPTIONS)
            .with_parameter("options", Value::Object(options::encode(options)));
        self.send(&request).await?.into_results()?;
        info!(count = options.len(), "Options set");
        Ok(())
    }

    pub async fn take_picture(&self) -> ThetaResult<CommandResponse> {
        self.send(&CommandRequest::new(commands::TAKE_PICTURE)).await
    }

    pub async fn start_capture(&self) -> ThetaResult<CommandResponse> {
        self.send(&CommandRequest::new(commands::START_CAPTURE)).await
    }

    pub async fn stop_capture(&self) -> ThetaResult<CommandResponse> {
        self.send(&CommandRequest::new(commands::STOP_CAPTURE)).await
    }

    /// `camera._convertVideoFormats`, long-running
    pub async fn convert_video_formats(
        &self,
        file_url: &str,
        to_low_resolution: bool,
        top_bottom_correction: TopBottomCorrection,
    ) -> ThetaResult<CommandExecution> {
        let size = if to_low_resolution { "1920x960" } else { "3840x1920" };
        let request = CommandRequest::new(commands::CONVERT_VIDEO_FORMATS)
            .with_parameter("fileUrl", file_url)
            .with_parameter("size", size)
            .with_parameter("projectionType", "Equirectangular")
            .with_parameter("codec", "H.264/MPEG-4 AVC")
            .with_parameter("topBottomCorrection", top_bottom_correction.wire_name());
        self.begin(request).await
    }

    pub async fn cancel_video_convert(&self) -> ThetaResult<()> {
        self.run(CommandRequest::new(commands::CANCEL_VIDEO_CONVERT))
            .await
    }

    pub async fn reset(&self) -> ThetaResult<()> {
        self.run(CommandRequest::new(commands::RESET)).await
    }

    pub async fn stop_self_timer(&self) -> ThetaResult<()> {
        self.run(CommandRequest::new(commands::STOP_SELF_TIMER)).await
    }

    pub async fn finish_wlan(&self) -> ThetaResult<()> {
        self.run(CommandRequest::new(commands::FINISH_WLAN)).await
    }

    /// Boot a plugin; `None` boots the one currently selected
    pub async fn start_plugin(&self, package_name: Option<&str>) -> ThetaResult<()> {
        let mut request =
            CommandRequest::new(commands::PLUGIN_CONTROL).with_parameter("action", "boot");
        if let Some(package_name) = package_name {
            request = request.with_parameter("plugin", package_name);
        }
        self.run(request).await
    }

    pub async fn stop_plugin(&self) -> ThetaResult<()> {
        self.run(CommandRequest::new(commands::PLUGIN_CONTROL).with_parameter("action", "finish"))
            .await
    }

    pub async fn set_plugin(&self, package_name: &str) -> ThetaResult<()> {
        self.run(
            CommandRequest::new(commands::SET_PLUGIN)
                .with_parameter("packageName", package_name)
                .with_parameter("boot", true),
        )
        .await
    }

    pub async fn list_plugins(&self) -> ThetaResult<Vec<PluginInfo>> {
        let results = self
            .send(&CommandRequest::new(commands::LIST_PLUGINS))
            .await?
            .into_results()?;
        parse_results(commands::LIST_PLUGINS, results, "plugins")
    }

    pub async fn get_plugin_orders(&self) -> ThetaResult<Vec<String>> {
        let results = self
            .send(&CommandRequest::new(commands::GET_PLUGIN_ORDERS))
            .await?
            .into_results()?;
        parse_results(commands::GET_PLUGIN_ORDERS, results, "pluginOrders")
    }

    pub async fn set_plugin_orders(&self, package_names: &[String]) -> ThetaResult<()> {
        self.run(
            CommandRequest::new(commands::SET_PLUGIN_ORDERS)
                .with_parameter("pluginOrders", package_names.to_vec()),
        )
        .await
    }

    /// One page of files, with the total count reported by the device
    pub async fn list_files(
        &self,
        file_type: FileType,
        start_position: u64,
        entry_count: u64,
    ) -> ThetaResult<(Vec<FileEntry>, u64)> {
        let request = CommandRequest::new(commands::LIST_FILES)
            .with_parameter("fileType", file_type.wire_name())
            .with_parameter("startPosition", start_position)
            .with_parameter("entryCount", entry_count)
            .with_parameter("maxThumbSize", 0);
        let results = self.send(&request).await?.into_results()?;
        let total = results
            .get("totalEntries")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                ThetaError::Protocol("listFiles results have no totalEntries".to_string())
            })?;
        let entries = parse_results(commands::LIST_FILES, results, "entries")?;
        Ok((entries, total))
    }

    pub async fn delete_files(&self, file_urls: &[String]) -> ThetaResult<()> {
        self.run(CommandRequest::new(commands::DELETE).with_parameter("fileUrls", file_urls.to_vec()))
            .await
    }

    /// Delete every file of `file_type`
    pub async fn delete_all_files(&self, file_type: FileType) -> ThetaResult<()> {
        self.delete_files(&[file_type.wire_name().to_string()]).await
    }

    /// Write factory values for the shooting options, with `overrides` on top
    pub async fn restore_settings(&self, overrides: &OptionSet) -> ThetaResult<()> {
        let options = restore_defaults()?.merge(overrides);
        self.set_options(&options).await
    }

    /// My Setting stored on the device for `mode`
    pub async fn get_my_setting(&self, mode: CaptureMode) -> ThetaResult<OptionSet> {
        let request =
            CommandRequest::new(commands::GET_MY_SETTING).with_parameter("mode", mode.wire_name());
        self.fetch_options(&request).await
    }

    /// My Setting on models that address it by option names
    pub async fn get_my_setting_for_keys(&self, keys: &[OptionKey]) -> ThetaResult<OptionSet> {
        let request = CommandRequest::new(commands::GET_MY_SETTING)
            .with_parameter("optionNames", options::codec::encode_names(keys));
        self.fetch_options(&request).await
    }

    pub async fn set_my_setting(&self, mode: CaptureMode, options: &OptionSet) -> ThetaResult<()> {
        refuse_read_only(options)?;
        self.run(
            CommandRequest::new(commands::SET_MY_SETTING)
                .with_parameter("mode", mode.wire_name())
                .with_parameter("options", Value::Object(options::encode(options))),
        )
        .await
    }

    pub async fn delete_my_setting(&self, mode: CaptureMode) -> ThetaResult<()> {
        self.run(
            CommandRequest::new(commands::DELETE_MY_SETTING).with_parameter("mode", mode.wire_name()),
        )
        .await
    }

    pub async fn list_access_points(&self) -> ThetaResult<Vec<AccessPoint>> {
        let results = self
            .send(&CommandRequest::new(commands::LIST_ACCESS_POINTS))
            .await?
            .into_results()?;
        parse_results(commands::LIST_ACCESS_POINTS, results, "accessPoints")
    }

    /// Register or update an access point for client mode
    ///
    /// A static allocation without an address is refused before sending.
    pub async fn set_access_point(
        &self,
        access_point: &AccessPoint,
        password: Option<&str>,
    ) -> ThetaResult<()> {
        if access_point.ip_address_allocation == IpAddressAllocation::Static
            && (access_point.ip_address.is_none()
                || access_point.subnet_mask.is_none()
                || access_point.default_gateway.is_none())
        {
            return Err(ThetaError::Configuration(format!(
                "static access point {} needs an address, subnet mask and gateway",
                access_point.ssid
            )));
        }
        let Value::Object(mut parameters) = serde_json::to_value(access_point)
            .map_err(|e| ThetaError::Protocol(format!("access point: {}", e)))?
        else {
            return Err(ThetaError::Protocol(
                "access point did not serialize to an object".to_string(),
            ));
        };
        if let Some(password) = password {
            parameters.insert("password".to_string(), Value::from(password));
        }
        self.run(CommandRequest::new(commands::SET_ACCESS_POINT).with_parameters(parameters))
            .await
    }

    pub async fn delete_access_point(&self, ssid: &str) -> ThetaResult<()> {
        self.run(CommandRequest::new(commands::DELETE_ACCESS_POINT).with_parameter("ssid", ssid))
            .await
    }

    /// Exif and XMP of the still image at `file_url`
    pub async fn get_metadata(&self, file_url: &str) -> ThetaResult<Metadata> {
        let request =
            CommandRequest::new(commands::GET_METADATA).with_parameter("fileUrl", file_url);
        let results = self.send(&request).await?.into_results()?;
        serde_json::from_value(results)
            .map_err(|e| ThetaError::Protocol(format!("{}: {}", commands::GET_METADATA, e)))
    }

    /// Pair a Bluetooth device; returns the name the camera reports for it
    pub async fn set_bluetooth_device(&self, device: Uuid) -> ThetaResult<String> {
        let request = CommandRequest::new(commands::SET_BLUETOOTH_DEVICE)
            .with_parameter("uuid", device.to_string());
        let results = self.send(&request).await?.into_results()?;
        parse_results(commands::SET_BLUETOOTH_DEVICE, results, "deviceName")
    }

    /// Raw `/osc/state` document
    pub async fn state(&self) -> ThetaResult<Value> {
        Ok(self.transport.post(paths::STATE, json!({})).await?)
    }

    /// Send a command whose results carry an `options` object and decode it
    async fn fetch_options(&self, request: &CommandRequest) -> ThetaResult<OptionSet> {
        let results = self.send(request).await?.into_results()?;
        let record: WireRecord = match results.get("options") {
            Some(Value::Object(map)) => map.clone(),
            _ => {
                return Err(ThetaError::Protocol(format!(
                    "{} results carry no options object",
                    request.name
                )));
            }
        };
        options::decode(&record)
    }

    /// Send a command that must finish immediately
    async fn run(&self, request: CommandRequest) -> ThetaResult<()> {
        let response = self.send(&request).await?;
        if !response.is_terminal() {
            return Err(ThetaError::Protocol(format!(
                "{} unexpectedly answered inProgress",
                request.name
            )));
        }
        response.into_results().map(|_| ())
    }
}

fn refuse_read_only(options: &OptionSet) -> ThetaResult<()> {
    match options.keys().find(|key| key.is_read_only()) {
        Some(key) => Err(ThetaError::Configuration(format!("{} is read-only", key))),
        None => Ok(()),
    }
}

/// Factory values written by [`CommandClient::restore_settings`]
fn restore_defaults() -> ThetaResult<OptionSet> {
    OptionSet::new()
        .with(OptionKey::ExposureCompensation, 0.0)?
        .with(OptionKey::ExposureDelay, 0)?
        .with(OptionKey::ExposureProgram, 2)?
        .with(OptionKey::Filter, ImageFilter::Off)?
        .with(OptionKey::GpsInfo, GpsInfo::disabled())?
        .with(OptionKey::Iso, 0)?
        .with(OptionKey::ShutterSpeed, 0.0)?
        .with(OptionKey::WhiteBalance, WhiteBalance::Auto)
}

fn parse_results<R: serde::de::DeserializeOwned>(
    command: &str,
    mut results: Value,
    field: &str,
) -> ThetaResult<R> {
    let value = results
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| ThetaError::Protocol(format!("{} results have no {}", command, field)))?;
    serde_json::from_value(value)
        .map_err(|e| ThetaError::Protocol(format!("{} {}: {}", command, field, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ReplayTransport;

    fn client() -> (Arc<ReplayTransport>, CommandClient<ReplayTransport>) {
        let transport = Arc::new(ReplayTransport::new());
        (Arc::clone(&transport), CommandClient::new(transport))
    }

    #[tokio::test]
    async fn test_get_options_decodes_results() {
        let (transport, client) = client();
        transport.push_response(
            paths::EXECUTE,
            json!({
                "name": "camera.getOptions",
                "state": "done",
                "results": {"options": {"iso": 200, "captureMode": "video"}}
            }),
        );

        let options = client
            .get_options(&[OptionKey::Iso, OptionKey::CaptureMode])
            .await
            .unwrap();

        assert_eq!(options.int(OptionKey::Iso), Some(200));
        assert_eq!(
            options.enum_value(OptionKey::CaptureMode),
            Some(CaptureMode::Video.into())
        );
        let sent = &transport.requests()[0].body;
        assert_eq!(
            sent["parameters"]["optionNames"],
            json!(["iso", "captureMode"])
        );
    }

    #[tokio::test]
    async fn test_set_options_refuses_read_only() {
        let (transport, client) = client();
        let options = OptionSet::new().with(OptionKey::RemainingSpace, 10).unwrap();
        let err = client.set_options(&options).await.unwrap_err();
        assert!(matches!(err, ThetaError::Configuration(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_device_error_passthrough() {
        let (transport, client) = client();
        transport.push_response(
            paths::EXECUTE,
            json!({
                "name": "camera.reset",
                "state": "error",
                "error": {"code": "unexpected", "message": "boom"}
            }),
        );
        let err = client.reset().await.unwrap_err();
        assert!(matches!(err, ThetaError::Device(ref e) if e.code == "unexpected"));
    }

    #[tokio::test]
    async fn test_list_plugins() {
        let (transport, client) = client();
        transport.push_response(
            paths::EXECUTE,
            json!({
                "name": "camera._listPlugins",
                "state": "done",
                "results": {"plugins": [{
                    "pluginName": "Timelapse",
                    "packageName": "com.example.timelapse",
                    "running": true
                }]}
            }),
        );
        let plugins = client.list_plugins().await.unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].package_name, "com.example.timelapse");
        assert!(plugins[0].running);
        assert!(!plugins[0].boot);
    }

    #[test]
    fn test_restore_defaults_are_writable() {
        let defaults = restore_defaults().unwrap();
        assert!(refuse_read_only(&defaults).is_ok());
        assert_eq!(defaults.int(OptionKey::ExposureProgram), Some(2));
    }

    #[tokio::test]
    async fn test_my_setting_by_option_names() {
        let (transport, client) = client();
        transport.push_response(
            paths::EXECUTE,
            json!({"name": "camera._getMySetting", "state": "done", "results": {"options": {"iso": 0}}}),
        );

        let options = client
            .get_my_setting_for_keys(&[OptionKey::Iso])
            .await
            .unwrap();

        assert_eq!(options.int(OptionKey::Iso), Some(0));
        assert_eq!(
            transport.requests()[0].body["parameters"],
            json!({"optionNames": ["iso"]})
        );
    }

    #[tokio::test]
    async fn test_static_access_point_needs_address() {
        let (transport, client) = client();
        let mut access_point = AccessPoint::fixed("lab", AuthMode::WpaPsk, "10.0.0.9", "255.255.255.0", "10.0.0.1");
        access_point.default_gateway = None;

        let err = client.set_access_point(&access_point, None).await.unwrap_err();
        assert!(matches!(err, ThetaError::Configuration(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_advance_requires_in_progress() {
        let (transport, client) = client();
        transport.push_response(
            paths::EXECUTE,
            json!({"name": "camera.reset", "state": "done"}),
        );
        let mut exec = client
            .begin(CommandRequest::new(commands::RESET))
            .await
            .unwrap();
        assert!(client.advance(&mut exec).await.unwrap_err().is_state());
        assert_eq!(transport.pending(paths::STATUS), 0);
    }
}
