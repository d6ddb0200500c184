// SPDX-License-Identifier: GPL-3.0-only

//! Capture configuration and its builders

use crate::constants::timing;
use crate::errors::{ThetaError, ThetaResult};
use crate::options::{
    CaptureMode, EnumValue, GpsInfo, ImageFilter, ImageStitching, MediaFileFormat, MicrophoneChannel,
    MicrophoneOption, OptionKey, OptionSet, OptionValue, TimeShift, TopBottomCorrection,
    VideoStitching, WhiteBalance,
};
use std::fmt;
use std::time::Duration;

/// What a capture produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureKind {
    Photo,
    Video,
}

impl CaptureKind {
    /// `captureMode` the device must be in
    pub fn capture_mode(self) -> CaptureMode {
        match self {
            CaptureKind::Photo => CaptureMode::Image,
            CaptureKind::Video => CaptureMode::Video,
        }
    }

    fn accepts(self, key: OptionKey) -> bool {
        COMMON_KEYS.contains(&key)
            || match self {
                CaptureKind::Photo => PHOTO_KEYS.contains(&key),
                CaptureKind::Video => VIDEO_KEYS.contains(&key),
            }
    }
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureKind::Photo => write!(f, "photo"),
            CaptureKind::Video => write!(f, "video"),
        }
    }
}

/// Keys both capture kinds may set
const COMMON_KEYS: &[OptionKey] = &[
    OptionKey::Aperture,
    OptionKey::CaptureMode,
    OptionKey::ColorTemperature,
    OptionKey::ExposureCompensation,
    OptionKey::ExposureProgram,
    OptionKey::FileFormat,
    OptionKey::GpsInfo,
    OptionKey::GpsTagRecording,
    OptionKey::Iso,
    OptionKey::IsoAutoHighLimit,
    OptionKey::ShutterSpeed,
    OptionKey::TopBottomCorrection,
    OptionKey::WhiteBalance,
    OptionKey::WhiteBalanceAutoStrength,
];

const PHOTO_KEYS: &[OptionKey] = &[
    OptionKey::AiAutoThumbnail,
    OptionKey::ExposureDelay,
    OptionKey::Filter,
    OptionKey::ImageStitching,
    OptionKey::ShootingMethod,
    OptionKey::TimeShift,
];

const VIDEO_KEYS: &[OptionKey] = &[
    OptionKey::MaxRecordableTime,
    OptionKey::Microphone,
    OptionKey::MicrophoneChannel,
    OptionKey::VideoStitching,
];

/// Immutable description of one capture
///
/// Only obtainable through [`CaptureConfig::new`] or a builder, so every
/// value of this type has been validated against its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    kind: CaptureKind,
    options: OptionSet,
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl CaptureConfig {
    /// Validate `options` for `kind`
    ///
    /// Fails with [`ThetaError::Configuration`] when a key does not apply to
    /// the kind, is read-only or null, when `fileFormat` names a media type of
    /// the other kind, when `captureMode` contradicts the kind, or when the
    /// poll interval is below [`timing::MIN_POLL_INTERVAL`].
    pub fn new(
        kind: CaptureKind,
        options: OptionSet,
        poll_interval: Duration,
        timeout: Option<Duration>,
    ) -> ThetaResult<Self> {
        for (key, value) in &options {
            if key.is_read_only() {
                return Err(config_error(format!("{} is read-only", key)));
            }
            if !kind.accepts(*key) {
                return Err(config_error(format!("{} is not a {} option", key, kind)));
            }
            if matches!(value, OptionValue::Null) {
                return Err(config_error(format!("{} must not be null", key)));
            }
        }

        if let Some(mode) = options.enum_value(OptionKey::CaptureMode)
            && mode != EnumValue::from(kind.capture_mode())
        {
            return Err(config_error(format!(
                "captureMode {} contradicts a {} capture",
                mode.literal().unwrap_or("?"),
                kind
            )));
        }

        if let Some(format) = options.file_format() {
            let media_type = format.media_type.present().copied().ok_or_else(|| {
                config_error("fileFormat carries no media type".to_string())
            })?;
            let fits = match kind {
                CaptureKind::Photo => media_type.is_image(),
                CaptureKind::Video => media_type.is_video(),
            };
            if !fits {
                return Err(config_error(format!(
                    "fileFormat type {} is not a {} format",
                    media_type, kind
                )));
            }
        }

        if poll_interval < timing::MIN_POLL_INTERVAL {
            return Err(config_error(format!(
                "poll interval {:?} is below {:?}",
                poll_interval,
                timing::MIN_POLL_INTERVAL
            )));
        }

        Ok(Self {
            kind,
            options,
            poll_interval,
            timeout,
        })
    }

    pub fn kind(&self) -> CaptureKind {
        self.kind
    }

    /// Options as given by the caller
    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Options sent to the device before capturing, `captureMode` included
    pub fn device_options(&self) -> ThetaResult<OptionSet> {
        self.options
            .clone()
            .with(OptionKey::CaptureMode, self.kind.capture_mode())
    }
}

fn config_error(message: String) -> ThetaError {
    ThetaError::Configuration(message)
}

/// Builder state shared by both capture kinds
#[derive(Debug, Clone)]
struct BuilderState {
    options: OptionSet,
    poll_interval: Duration,
    timeout: Option<Duration>,
    error: Option<ThetaError>,
}

impl Default for BuilderState {
    fn default() -> Self {
        Self {
            options: OptionSet::new(),
            poll_interval: timing::DEFAULT_POLL_INTERVAL,
            timeout: None,
            error: None,
        }
    }
}

impl BuilderState {
    fn set(mut self, key: OptionKey, value: impl Into<OptionValue>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.options.clone().with(key, value) {
            Ok(options) => self.options = options,
            Err(e) => self.error = Some(e),
        }
        self
    }

    fn build(self, kind: CaptureKind) -> ThetaResult<CaptureConfig> {
        if let Some(e) = self.error {
            return Err(e);
        }
        CaptureConfig::new(kind, self.options, self.poll_interval, self.timeout)
    }
}

macro_rules! common_setters {
    () => {
        pub fn poll_interval(mut self, interval: Duration) -> Self {
            self.state.poll_interval = interval;
            self
        }

        /// Give up waiting for the device after `timeout`
        pub fn timeout(mut self, timeout: Duration) -> Self {
            self.state.timeout = Some(timeout);
            self
        }

        /// Set any option; unsuitable keys are reported by `build`
        pub fn option(mut self, key: OptionKey, value: impl Into<OptionValue>) -> Self {
            self.state = self.state.set(key, value);
            self
        }

        /// Start from an existing option set
        pub fn options(mut self, options: &OptionSet) -> Self {
            for (key, value) in options {
                self.state = self.state.set(*key, value.clone());
            }
            self
        }

        pub fn file_format(self, format: MediaFileFormat) -> Self {
            self.option(OptionKey::FileFormat, format)
        }

        pub fn aperture(self, f_number: f64) -> Self {
            self.option(OptionKey::Aperture, f_number)
        }

        pub fn color_temperature(self, kelvin: i64) -> Self {
            self.option(OptionKey::ColorTemperature, kelvin)
        }

        pub fn exposure_compensation(self, ev: f64) -> Self {
            self.option(OptionKey::ExposureCompensation, ev)
        }

        pub fn exposure_program(self, program: i64) -> Self {
            self.option(OptionKey::ExposureProgram, program)
        }

        pub fn gps_info(self, gps: GpsInfo) -> Self {
            self.option(OptionKey::GpsInfo, gps)
        }

        pub fn iso(self, iso: i64) -> Self {
            self.option(OptionKey::Iso, iso)
        }

        pub fn iso_auto_high_limit(self, iso: i64) -> Self {
            self.option(OptionKey::IsoAutoHighLimit, iso)
        }

        pub fn shutter_speed(self, seconds: f64) -> Self {
            self.option(OptionKey::ShutterSpeed, seconds)
        }

        pub fn top_bottom_correction(self, correction: TopBottomCorrection) -> Self {
            self.option(OptionKey::TopBottomCorrection, correction)
        }

        pub fn white_balance(self, white_balance: WhiteBalance) -> Self {
            self.option(OptionKey::WhiteBalance, white_balance)
        }
    };
}

/// Builder for still captures
#[derive(Debug, Clone, Default)]
pub struct PhotoCaptureBuilder {
    state: BuilderState,
}

impl PhotoCaptureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    common_setters!();

    /// Self-timer, seconds
    pub fn exposure_delay(self, seconds: i64) -> Self {
        self.option(OptionKey::ExposureDelay, seconds)
    }

    pub fn filter(self, filter: ImageFilter) -> Self {
        self.option(OptionKey::Filter, filter)
    }

    pub fn image_stitching(self, stitching: ImageStitching) -> Self {
        self.option(OptionKey::ImageStitching, stitching)
    }

    pub fn time_shift(self, time_shift: TimeShift) -> Self {
        self.option(OptionKey::TimeShift, time_shift)
    }

    pub fn build(self) -> ThetaResult<CaptureConfig> {
        self.state.build(CaptureKind::Photo)
    }
}

/// Builder for video captures
#[derive(Debug, Clone, Default)]
pub struct VideoCaptureBuilder {
    state: BuilderState,
}

impl VideoCaptureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    common_setters!();

    /// Recording length limit, seconds
    pub fn max_recordable_time(self, seconds: i64) -> Self {
        self.option(OptionKey::MaxRecordableTime, seconds)
    }

    pub fn microphone(self, microphone: MicrophoneOption) -> Self {
        self.option(OptionKey::Microphone, microphone)
    }

    pub fn microphone_channel(self, channel: MicrophoneChannel) -> Self {
        self.option(OptionKey::MicrophoneChannel, channel)
    }

    pub fn video_stitching(self, stitching: VideoStitching) -> Self {
        self.option(OptionKey::VideoStitching, stitching)
    }

    pub fn build(self) -> ThetaResult<CaptureConfig> {
        self.state.build(CaptureKind::Video)
    }
}
