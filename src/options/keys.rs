// SPDX-License-Identifier: GPL-3.0-only

//! Option keys and their wire schema

use super::value::{EnumKind, RecordKind};
use std::fmt;

/// Wire type of a single (non-list) value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Float,
    Text,
    Enum(EnumKind),
    Record(RecordKind),
}

/// Shape of the value a key carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    Single(ScalarKind),
    /// List of currently valid values, reported under a `…Support` key
    SupportList(ScalarKind),
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Int => write!(f, "integer"),
            ScalarKind::Float => write!(f, "number"),
            ScalarKind::Text => write!(f, "string"),
            ScalarKind::Enum(kind) => write!(f, "{}", kind.name()),
            ScalarKind::Record(kind) => write!(f, "{}", kind.name()),
        }
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueShape::Single(kind) => write!(f, "{}", kind),
            ValueShape::SupportList(kind) => write!(f, "list of {}", kind),
        }
    }
}

/// Whether clients may write a key through `camera.setOptions`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadWrite,
    ReadOnly,
}

/// Schema entry for one key
#[derive(Debug, Clone, Copy)]
pub struct KeySchema {
    pub key: OptionKey,
    pub wire: &'static str,
    pub shape: ValueShape,
    pub access: Access,
}

const RW: Access = Access::ReadWrite;
const RO: Access = Access::ReadOnly;

const fn one(kind: ScalarKind) -> ValueShape {
    ValueShape::Single(kind)
}

const fn list(kind: ScalarKind) -> ValueShape {
    ValueShape::SupportList(kind)
}

const INT: ScalarKind = ScalarKind::Int;
const FLOAT: ScalarKind = ScalarKind::Float;
const TEXT: ScalarKind = ScalarKind::Text;

const fn en(kind: EnumKind) -> ScalarKind {
    ScalarKind::Enum(kind)
}

const fn rec(kind: RecordKind) -> ScalarKind {
    ScalarKind::Record(kind)
}

macro_rules! option_keys {
    ($( $(#[$meta:meta])* $key:ident => $wire:literal, $shape:expr, $access:expr; )+) => {
        /// Identifier of a device option
        ///
        /// The set of keys is closed; wire names are stable across firmware
        /// versions.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum OptionKey {
            $( $(#[$meta])* $key, )+
        }

        impl OptionKey {
            /// Every key, in schema order
            pub const ALL: &'static [OptionKey] = &[ $( OptionKey::$key, )+ ];

            const SCHEMA: &'static [KeySchema] = &[
                $( KeySchema {
                    key: OptionKey::$key,
                    wire: $wire,
                    shape: $shape,
                    access: $access,
                }, )+
            ];
        }
    };
}

option_keys! {
    AiAutoThumbnail => "_aiAutoThumbnail", one(en(EnumKind::OnOff)), RW;
    AiAutoThumbnailSupport => "_aiAutoThumbnailSupport", list(en(EnumKind::OnOff)), RO;
    /// F-number
    Aperture => "aperture", one(FLOAT), RW;
    ApertureSupport => "apertureSupport", list(FLOAT), RO;
    BluetoothPower => "_bluetoothPower", one(en(EnumKind::OnOff)), RW;
    CameraControlSource => "_cameraControlSource", one(en(EnumKind::CameraControlSource)), RW;
    CameraControlSourceSupport => "_cameraControlSourceSupport", list(en(EnumKind::CameraControlSource)), RO;
    CameraMode => "_cameraMode", one(en(EnumKind::CameraMode)), RW;
    CaptureMode => "captureMode", one(en(EnumKind::CaptureMode)), RW;
    CaptureModeSupport => "captureModeSupport", list(en(EnumKind::CaptureMode)), RO;
    /// API version; resets to 1 when the connection drops
    ClientVersion => "clientVersion", one(INT), RW;
    ClientVersionSupport => "clientVersionSupport", list(INT), RO;
    /// Kelvin, 2500 to 10000 in steps of 100
    ColorTemperature => "_colorTemperature", one(INT), RW;
    /// `YYYY:MM:DD hh:mm:ss+(-)hh:mm`
    DateTimeZone => "dateTimeZone", one(TEXT), RW;
    ExposureCompensation => "exposureCompensation", one(FLOAT), RW;
    ExposureCompensationSupport => "exposureCompensationSupport", list(FLOAT), RO;
    /// Self-timer, seconds
    ExposureDelay => "exposureDelay", one(INT), RW;
    ExposureDelaySupport => "exposureDelaySupport", list(INT), RO;
    ExposureProgram => "exposureProgram", one(INT), RW;
    ExposureProgramSupport => "exposureProgramSupport", list(INT), RO;
    FileFormat => "fileFormat", one(rec(RecordKind::FileFormat)), RW;
    FileFormatSupport => "fileFormatSupport", list(rec(RecordKind::FileFormat)), RO;
    Filter => "_filter", one(en(EnumKind::ImageFilter)), RW;
    FilterSupport => "_filterSupport", list(en(EnumKind::ImageFilter)), RO;
    GpsInfo => "gpsInfo", one(rec(RecordKind::Gps)), RW;
    GpsTagRecording => "_gpsTagRecording", one(en(EnumKind::GpsTagRecording)), RW;
    ImageStitching => "_imageStitching", one(en(EnumKind::ImageStitching)), RW;
    ImageStitchingSupport => "_imageStitchingSupport", list(en(EnumKind::ImageStitching)), RO;
    Iso => "iso", one(INT), RW;
    IsoSupport => "isoSupport", list(INT), RO;
    IsoAutoHighLimit => "isoAutoHighLimit", one(INT), RW;
    IsoAutoHighLimitSupport => "isoAutoHighLimitSupport", list(INT), RO;
    Language => "_language", one(en(EnumKind::Language)), RW;
    LanguageSupport => "_languageSupport", list(en(EnumKind::Language)), RO;
    /// Seconds
    MaxRecordableTime => "_maxRecordableTime", one(INT), RW;
    MaxRecordableTimeSupport => "_maxRecordableTimeSupport", list(INT), RO;
    Microphone => "_microphone", one(en(EnumKind::MicrophoneOption)), RW;
    MicrophoneSupport => "_microphoneSupport", list(en(EnumKind::MicrophoneOption)), RO;
    MicrophoneChannel => "_microphoneChannel", one(en(EnumKind::MicrophoneChannel)), RW;
    MicrophoneChannelSupport => "_microphoneChannelSupport", list(en(EnumKind::MicrophoneChannel)), RO;
    NetworkType => "_networkType", one(en(EnumKind::NetworkType)), RW;
    NetworkTypeSupport => "_networkTypeSupport", list(en(EnumKind::NetworkType)), RO;
    /// Auto power off, seconds
    OffDelay => "offDelay", one(INT), RW;
    OffDelaySupport => "offDelaySupport", list(INT), RO;
    Password => "_password", one(TEXT), RW;
    PowerSaving => "_powerSaving", one(en(EnumKind::OnOff)), RW;
    PowerSavingSupport => "_powerSavingSupport", list(en(EnumKind::OnOff)), RO;
    PreviewFormat => "previewFormat", one(rec(RecordKind::PreviewFormat)), RW;
    PreviewFormatSupport => "previewFormatSupport", list(rec(RecordKind::PreviewFormat)), RO;
    Proxy => "_proxy", one(rec(RecordKind::Proxy)), RW;
    RemainingPictures => "remainingPictures", one(INT), RO;
    /// Bytes
    RemainingSpace => "remainingSpace", one(INT), RO;
    RemainingVideoSeconds => "remainingVideoSeconds", one(INT), RO;
    ShootingMethod => "_shootingMethod", one(en(EnumKind::ShootingMethod)), RW;
    ShootingMethodSupport => "_shootingMethodSupport", list(en(EnumKind::ShootingMethod)), RO;
    /// Seconds
    ShutterSpeed => "shutterSpeed", one(FLOAT), RW;
    ShutterSpeedSupport => "shutterSpeedSupport", list(FLOAT), RO;
    ShutterVolume => "_shutterVolume", one(INT), RW;
    /// Reported as a min/max record rather than a list
    ShutterVolumeSupport => "_shutterVolumeSupport", one(rec(RecordKind::ShutterVolumeRange)), RO;
    /// Auto sleep, seconds
    SleepDelay => "sleepDelay", one(INT), RW;
    SleepDelaySupport => "sleepDelaySupport", list(INT), RO;
    TimeShift => "_timeShift", one(rec(RecordKind::TimeShift)), RW;
    TimeShiftSupport => "_timeShiftSupport", list(rec(RecordKind::TimeShift)), RO;
    TopBottomCorrection => "_topBottomCorrection", one(en(EnumKind::TopBottomCorrection)), RW;
    TopBottomCorrectionSupport => "_topBottomCorrectionSupport", list(en(EnumKind::TopBottomCorrection)), RO;
    /// Bytes
    TotalSpace => "totalSpace", one(INT), RO;
    Username => "_username", one(TEXT), RW;
    VideoStitching => "videoStitching", one(en(EnumKind::VideoStitching)), RW;
    VideoStitchingSupport => "videoStitchingSupport", list(en(EnumKind::VideoStitching)), RO;
    VisibilityReduction => "_visibilityReduction", one(en(EnumKind::OnOff)), RW;
    VisibilityReductionSupport => "_visibilityReductionSupport", list(en(EnumKind::OnOff)), RO;
    WhiteBalance => "whiteBalance", one(en(EnumKind::WhiteBalance)), RW;
    WhiteBalanceSupport => "whiteBalanceSupport", list(en(EnumKind::WhiteBalance)), RO;
    WhiteBalanceAutoStrength => "_whiteBalanceAutoStrength", one(en(EnumKind::OnOff)), RW;
    WhiteBalanceAutoStrengthSupport => "_whiteBalanceAutoStrengthSupport", list(en(EnumKind::OnOff)), RO;
    /// Numeric on the wire, see [`WlanFrequency::bucket`](super::enums::WlanFrequency::bucket)
    WlanFrequency => "_wlanFrequency", one(en(EnumKind::WlanFrequency)), RW;
    WlanFrequencySupport => "_wlanFrequencySupport", list(en(EnumKind::WlanFrequency)), RO;
}

impl OptionKey {
    pub fn schema(self) -> &'static KeySchema {
        &Self::SCHEMA[self as usize]
    }

    /// Canonical wire name
    pub fn wire_name(self) -> &'static str {
        self.schema().wire
    }

    pub fn shape(self) -> ValueShape {
        self.schema().shape
    }

    pub fn is_read_only(self) -> bool {
        self.schema().access == Access::ReadOnly
    }

    /// Look a key up by wire name
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::SCHEMA
            .iter()
            .find(|schema| schema.wire == name)
            .map(|schema| schema.key)
    }

    /// The parallel `…Support` key reporting valid values for this key
    pub fn support_key(self) -> Option<OptionKey> {
        let wire = self.wire_name();
        if wire.ends_with("Support") {
            return None;
        }
        Self::SCHEMA
            .iter()
            .find(|schema| {
                schema.wire.strip_suffix("Support") == Some(wire)
            })
            .map(|schema| schema.key)
    }

    /// For a `…Support` key, the key whose values it lists
    pub fn supported_key(self) -> Option<OptionKey> {
        self.wire_name()
            .strip_suffix("Support")
            .and_then(OptionKey::from_wire)
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
