// SPDX-License-Identifier: GPL-3.0-only

//! Tagged option values

use super::enums::*;
use super::keys::{ScalarKind, ValueShape};
use super::records::*;

/// Value held by an option
///
/// `Null` is an explicit null reported by (or sent to) the device. It is not
/// the same as the key being absent from an [`OptionSet`](super::OptionSet).
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Enum(EnumValue),
    Record(RecordValue),
    /// Support list, only reported by the device
    List(Vec<OptionValue>),
}

/// Tri-state record field: absent, explicit null, or a value
///
/// Record fields keep the same absent/null distinction as top-level keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Field<T> {
    #[default]
    Absent,
    Null,
    Present(T),
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    /// The value, if one is present
    pub fn present(&self) -> Option<&T> {
        match self {
            Field::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_present(self) -> Option<T> {
        match self {
            Field::Present(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Field::Present(value)
    }
}

macro_rules! enum_values {
    ($($kind:ident),+ $(,)?) => {
        /// Which enum a key holds
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EnumKind {
            $($kind,)+
            WlanFrequency,
        }

        /// A value of one of the option enums
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EnumValue {
            $($kind($kind),)+
            WlanFrequency(WlanFrequency),
        }

        impl EnumValue {
            pub fn kind(&self) -> EnumKind {
                match self {
                    $(EnumValue::$kind(_) => EnumKind::$kind,)+
                    EnumValue::WlanFrequency(_) => EnumKind::WlanFrequency,
                }
            }

            /// String literal, `None` for numerically encoded enums
            pub fn literal(&self) -> Option<&'static str> {
                match self {
                    $(EnumValue::$kind(v) => Some(v.wire_name()),)+
                    EnumValue::WlanFrequency(_) => None,
                }
            }
        }

        impl EnumKind {
            /// Parse a string literal for this enum
            pub fn parse_literal(self, literal: &str) -> Option<EnumValue> {
                match self {
                    $(EnumKind::$kind => $kind::from_wire(literal).map(EnumValue::$kind),)+
                    EnumKind::WlanFrequency => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(EnumKind::$kind => stringify!($kind),)+
                    EnumKind::WlanFrequency => "WlanFrequency",
                }
            }

            /// Every value of this enum, in table order
            pub fn values(self) -> Vec<EnumValue> {
                match self {
                    $(EnumKind::$kind => $kind::TABLE
                        .iter()
                        .map(|(variant, _)| EnumValue::$kind(*variant))
                        .collect(),)+
                    EnumKind::WlanFrequency => WlanFrequency::ALL
                        .iter()
                        .map(|frequency| EnumValue::WlanFrequency(*frequency))
                        .collect(),
                }
            }
        }

        $(
            impl From<$kind> for EnumValue {
                fn from(value: $kind) -> Self {
                    EnumValue::$kind(value)
                }
            }

            impl From<$kind> for OptionValue {
                fn from(value: $kind) -> Self {
                    OptionValue::Enum(EnumValue::$kind(value))
                }
            }
        )+
    };
}

enum_values! {
    OnOff,
    CameraControlSource,
    CameraMode,
    CaptureMode,
    MicrophoneOption,
    MicrophoneChannel,
    NetworkType,
    ShootingMethod,
    WhiteBalance,
    VideoStitching,
    TopBottomCorrection,
    Language,
    GpsTagRecording,
    ImageFilter,
    ImageStitching,
}

impl From<WlanFrequency> for EnumValue {
    fn from(value: WlanFrequency) -> Self {
        EnumValue::WlanFrequency(value)
    }
}

impl From<WlanFrequency> for OptionValue {
    fn from(value: WlanFrequency) -> Self {
        OptionValue::Enum(EnumValue::WlanFrequency(value))
    }
}

/// Which record a key holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Gps,
    PreviewFormat,
    Proxy,
    TimeShift,
    FileFormat,
    ShutterVolumeRange,
}

impl RecordKind {
    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Gps => "GpsInfo",
            RecordKind::PreviewFormat => "PreviewFormat",
            RecordKind::Proxy => "Proxy",
            RecordKind::TimeShift => "TimeShift",
            RecordKind::FileFormat => "MediaFileFormat",
            RecordKind::ShutterVolumeRange => "ShutterVolumeRange",
        }
    }
}

/// A structured option value
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Gps(GpsInfo),
    PreviewFormat(PreviewFormat),
    Proxy(Proxy),
    TimeShift(TimeShift),
    FileFormat(MediaFileFormat),
    ShutterVolumeRange(ShutterVolumeRange),
}

impl RecordValue {
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordValue::Gps(_) => RecordKind::Gps,
            RecordValue::PreviewFormat(_) => RecordKind::PreviewFormat,
            RecordValue::Proxy(_) => RecordKind::Proxy,
            RecordValue::TimeShift(_) => RecordKind::TimeShift,
            RecordValue::FileFormat(_) => RecordKind::FileFormat,
            RecordValue::ShutterVolumeRange(_) => RecordKind::ShutterVolumeRange,
        }
    }
}

macro_rules! record_from {
    ($($ty:ident => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for OptionValue {
                fn from(value: $ty) -> Self {
                    OptionValue::Record(RecordValue::$variant(value))
                }
            }
        )+
    };
}

record_from! {
    GpsInfo => Gps,
    PreviewFormat => PreviewFormat,
    Proxy => Proxy,
    TimeShift => TimeShift,
    MediaFileFormat => FileFormat,
    ShutterVolumeRange => ShutterVolumeRange,
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(value.into())
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        OptionValue::Int(value.into())
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl<T: Into<OptionValue>> From<Vec<T>> for OptionValue {
    fn from(values: Vec<T>) -> Self {
        OptionValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl OptionValue {
    pub fn is_null(&self) -> bool {
        matches!(self, OptionValue::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            OptionValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OptionValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<EnumValue> {
        match self {
            OptionValue::Enum(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            OptionValue::Record(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[OptionValue]> {
        match self {
            OptionValue::List(v) => Some(v),
            _ => None,
        }
    }

    /// Bring the value into the form `shape` requires
    ///
    /// Integers are widened to floats for float keys. Returns `None` when
    /// the value cannot stand for the shape.
    pub(crate) fn conform(self, shape: ValueShape) -> Option<OptionValue> {
        match (self, shape) {
            (OptionValue::Null, _) => Some(OptionValue::Null),
            (OptionValue::List(items), ValueShape::SupportList(kind)) => items
                .into_iter()
                .map(|item| item.conform_scalar(kind))
                .collect::<Option<Vec<_>>>()
                .map(OptionValue::List),
            (OptionValue::List(_), ValueShape::Single(_)) => None,
            (_, ValueShape::SupportList(_)) => None,
            (value, ValueShape::Single(kind)) => value.conform_scalar(kind),
        }
    }

    fn conform_scalar(self, kind: ScalarKind) -> Option<OptionValue> {
        match (self, kind) {
            (v @ OptionValue::Int(_), ScalarKind::Int) => Some(v),
            (v @ OptionValue::Float(_), ScalarKind::Float) => Some(v),
            (OptionValue::Int(i), ScalarKind::Float) => Some(OptionValue::Float(i as f64)),
            (v @ OptionValue::Text(_), ScalarKind::Text) => Some(v),
            (OptionValue::Enum(e), ScalarKind::Enum(expected)) if e.kind() == expected => {
                Some(OptionValue::Enum(e))
            }
            (OptionValue::Record(r), ScalarKind::Record(expected)) if r.kind() == expected => {
                Some(OptionValue::Record(r))
            }
            _ => None,
        }
    }
}
