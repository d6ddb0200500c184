// SPDX-License-Identifier: GPL-3.0-only

//! Protocol-wide constants

use std::time::Duration;

/// Default device endpoint when the camera acts as access point
pub const DEFAULT_ENDPOINT: &str = "http://192.168.1.1:80/";

/// Device paths
pub mod paths {
    /// Command issuance
    pub const EXECUTE: &str = "/osc/commands/execute";

    /// Status of a long-running command
    pub const STATUS: &str = "/osc/commands/status";

    /// Static device information
    pub const INFO: &str = "/osc/info";

    /// Dynamic device state
    pub const STATE: &str = "/osc/state";
}

/// Command names
pub mod commands {
    pub const GET_OPTIONS: &str = "camera.getOptions";
    pub const SET_OPTIONS: &str = "camera.setOptions";
    pub const TAKE_PICTURE: &str = "camera.takePicture";
    pub const START_CAPTURE: &str = "camera.startCapture";
    pub const STOP_CAPTURE: &str = "camera.stopCapture";
    pub const GET_LIVE_PREVIEW: &str = "camera.getLivePreview";
    pub const LIST_FILES: &str = "camera.listFiles";
    pub const DELETE: &str = "camera.delete";
    pub const RESET: &str = "camera.reset";
    pub const STOP_SELF_TIMER: &str = "camera._stopSelfTimer";
    pub const CONVERT_VIDEO_FORMATS: &str = "camera._convertVideoFormats";
    pub const CANCEL_VIDEO_CONVERT: &str = "camera._cancelVideoConvert";
    pub const FINISH_WLAN: &str = "camera._finishWlan";
    pub const PLUGIN_CONTROL: &str = "camera._pluginControl";
    pub const SET_PLUGIN: &str = "camera._setPlugin";
    pub const LIST_PLUGINS: &str = "camera._listPlugins";
    pub const GET_PLUGIN_ORDERS: &str = "camera._getPluginOrders";
    pub const SET_PLUGIN_ORDERS: &str = "camera._setPluginOrders";
    pub const GET_MY_SETTING: &str = "camera._getMySetting";
    pub const SET_MY_SETTING: &str = "camera._setMySetting";
    pub const DELETE_MY_SETTING: &str = "camera._deleteMySetting";
    pub const LIST_ACCESS_POINTS: &str = "camera._listAccessPoints";
    pub const SET_ACCESS_POINT: &str = "camera._setAccessPoint";
    pub const DELETE_ACCESS_POINT: &str = "camera._deleteAccessPoint";
    pub const GET_METADATA: &str = "camera._getMetadata";
    pub const SET_BLUETOOTH_DEVICE: &str = "camera._setBluetoothDevice";
}

/// Timing defaults used by callers of the command layer
pub mod timing {
    use super::Duration;

    /// Interval between status polls of a long-running capture
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

    /// Smallest poll interval accepted by capture configurations
    pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);
}

/// Client API version requested from the device
pub const DEFAULT_CLIENT_VERSION: i64 = 2;

/// Application information utilities
pub mod app_info {
    /// Get the crate version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}
