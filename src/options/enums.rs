// SPDX-License-Identifier: GPL-3.0-only

//! Enumerated option values and their wire literals
//!
//! Every enum keeps an explicit table of `(variant, literal)` pairs. The wire
//! literals do not follow a single naming convention (`"ON"`, `"on"`,
//! `"cloudy-daylight"`, `"_underwater"`, `"4ch+1ch"`), so nothing here is
//! derived from variant names.

/// Declare an enum together with its bidirectional wire table
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Wire table, in declaration order
            pub const TABLE: &'static [($name, &'static str)] = &[
                $( ($name::$variant, $wire) ),+
            ];

            /// Literal used on the wire
            pub fn wire_name(self) -> &'static str {
                Self::TABLE
                    .iter()
                    .find(|(variant, _)| *variant == self)
                    .map(|(_, wire)| *wire)
                    .unwrap_or_default()
            }

            /// Parse a wire literal
            pub fn from_wire(literal: &str) -> Option<Self> {
                Self::TABLE
                    .iter()
                    .find(|(_, wire)| *wire == literal)
                    .map(|(variant, _)| *variant)
            }
        }

        impl WireEnum for $name {
            fn wire_name(self) -> &'static str {
                $name::wire_name(self)
            }

            fn from_wire(literal: &str) -> Option<Self> {
                $name::from_wire(literal)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.wire_name())
            }
        }
    };
}

/// Enum serialized as a string literal
pub trait WireEnum: Copy + Sized {
    fn wire_name(self) -> &'static str;
    fn from_wire(literal: &str) -> Option<Self>;
}

wire_enum! {
    /// Upper-case ON/OFF switch shared by several options
    OnOff {
        On => "ON",
        Off => "OFF",
    }
}

wire_enum! {
    /// Which side currently controls the camera
    CameraControlSource {
        Camera => "camera",
        App => "app",
    }
}

wire_enum! {
    CameraMode {
        Capture => "capture",
        Playback => "playback",
        Setting => "setting",
        Plugin => "plugin",
    }
}

wire_enum! {
    /// Shooting mode
    CaptureMode {
        Image => "image",
        Video => "video",
        LiveStreaming => "_liveStreaming",
    }
}

wire_enum! {
    MicrophoneOption {
        Auto => "Auto",
        Internal => "Internal",
        External => "External",
    }
}

wire_enum! {
    MicrophoneChannel {
        /// Spatial audio, 4 channels plus 1
        Spatial => "4ch+1ch",
        Monaural => "1ch",
    }
}

wire_enum! {
    NetworkType {
        /// Camera acts as access point
        Direct => "AP",
        /// Camera joins an existing network
        Client => "CL",
        Ethernet => "ETHERNET",
        Off => "OFF",
    }
}

wire_enum! {
    ShootingMethod {
        Normal => "normal",
        Interval => "interval",
        MoveInterval => "moveInterval",
        FixedInterval => "fixedInterval",
        Bracket => "bracket",
        Composite => "composite",
        Continuous => "continuous",
        TimeShift => "timeShift",
        Burst => "burst",
    }
}

wire_enum! {
    /// Lens used for the first shot of a time-shift capture
    FirstShooting {
        Front => "front",
        Rear => "rear",
    }
}

wire_enum! {
    WhiteBalance {
        Auto => "auto",
        Daylight => "daylight",
        Shade => "shade",
        CloudyDaylight => "cloudy-daylight",
        Incandescent => "incandescent",
        WarmWhiteFluorescent => "_warmWhiteFluorescent",
        DaylightFluorescent => "_dayLightFluorescent",
        DayWhiteFluorescent => "_dayWhiteFluorescent",
        Fluorescent => "fluorescent",
        BulbFluorescent => "_bulbFluorescent",
        ColorTemperature => "_colorTemperature",
        Underwater => "_underwater",
    }
}

wire_enum! {
    VideoStitching {
        None => "none",
        OnDevice => "ondevice",
    }
}

wire_enum! {
    TopBottomCorrection {
        Apply => "Apply",
        ApplyAuto => "ApplyAuto",
        ApplySemiAuto => "ApplySemiAuto",
        ApplySave => "ApplySave",
        ApplyLoad => "ApplyLoad",
        Disapply => "Disapply",
        Manual => "Manual",
    }
}

wire_enum! {
    /// Camera UI language
    Language {
        EnUs => "en-US",
        EnGb => "en-GB",
        Ja => "ja",
        Fr => "fr",
        De => "de",
        ZhTw => "zh-TW",
        ZhCn => "zh-CN",
        It => "it",
        Ko => "ko",
    }
}

wire_enum! {
    /// Lower-case on/off, only used by GPS tag recording
    GpsTagRecording {
        On => "on",
        Off => "off",
    }
}

wire_enum! {
    ImageFilter {
        Off => "off",
        DrComp => "DR Comp",
        NoiseReduction => "Noise Reduction",
        Hdr => "hdr",
        HandheldHdr => "Hh hdr",
    }
}

wire_enum! {
    MediaType {
        Jpeg => "jpeg",
        Mp4 => "mp4",
        Raw => "raw+",
    }
}

wire_enum! {
    ImageStitching {
        Auto => "auto",
        Static => "static",
        Dynamic => "dynamic",
        DynamicAuto => "dynamicAuto",
        DynamicSemiAuto => "dynamicSemiAuto",
        DynamicSave => "dynamicSave",
        DynamicLoad => "dynamicLoad",
        None => "none",
    }
}

impl MediaType {
    /// Still image formats
    pub fn is_image(self) -> bool {
        matches!(self, MediaType::Jpeg | MediaType::Raw)
    }

    pub fn is_video(self) -> bool {
        matches!(self, MediaType::Mp4)
    }
}

/// Wireless LAN band
///
/// Unlike the other enums this one travels as a number (`2.4`, `5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WlanFrequency {
    Ghz2_4,
    Ghz5,
}

/// Decoded frequencies below this value fall into the 2.4 GHz bucket.
///
/// Taken from observed device behaviour; what firmware does exactly at the
/// boundary has not been verified.
pub const WLAN_FREQUENCY_BUCKET_THRESHOLD: f64 = 5.0;

impl WlanFrequency {
    pub const ALL: [WlanFrequency; 2] = [WlanFrequency::Ghz2_4, WlanFrequency::Ghz5];

    /// Numeric wire value
    pub fn gigahertz(self) -> f64 {
        match self {
            WlanFrequency::Ghz2_4 => 2.4,
            WlanFrequency::Ghz5 => 5.0,
        }
    }

    /// Many-to-one bucket decode of a reported frequency
    ///
    /// Any value under [`WLAN_FREQUENCY_BUCKET_THRESHOLD`] is 2.4 GHz, anything
    /// else is 5 GHz. `4.9` and `2.0` both become 2.4 GHz; this is lossy on
    /// purpose and must not be tightened into an exact match.
    pub fn bucket(gigahertz: f64) -> Self {
        if gigahertz < WLAN_FREQUENCY_BUCKET_THRESHOLD {
            WlanFrequency::Ghz2_4
        } else {
            WlanFrequency::Ghz5
        }
    }
}

impl std::fmt::Display for WlanFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} GHz", self.gigahertz())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_bijective() {
        fn check<T: Copy + PartialEq + std::fmt::Debug>(table: &[(T, &str)]) {
            for (i, (variant, wire)) in table.iter().enumerate() {
                for (other_variant, other_wire) in &table[i + 1..] {
                    assert_ne!(variant, other_variant);
                    assert_ne!(wire, other_wire, "duplicate literal {}", wire);
                }
            }
        }
        check(OnOff::TABLE);
        check(CaptureMode::TABLE);
        check(WhiteBalance::TABLE);
        check(ShootingMethod::TABLE);
        check(TopBottomCorrection::TABLE);
        check(Language::TABLE);
        check(ImageFilter::TABLE);
        check(ImageStitching::TABLE);
        check(NetworkType::TABLE);
    }

    #[test]
    fn test_divergent_literals() {
        assert_eq!(WhiteBalance::CloudyDaylight.wire_name(), "cloudy-daylight");
        assert_eq!(
            WhiteBalance::from_wire("_dayLightFluorescent"),
            Some(WhiteBalance::DaylightFluorescent)
        );
        assert_eq!(MicrophoneChannel::Spatial.wire_name(), "4ch+1ch");
        assert_eq!(CaptureMode::from_wire("_liveStreaming"), Some(CaptureMode::LiveStreaming));
        assert_eq!(GpsTagRecording::On.wire_name(), "on");
        assert_eq!(OnOff::On.wire_name(), "ON");
        assert_eq!(OnOff::from_wire("on"), None);
    }

    #[test]
    fn test_wlan_frequency_bucket() {
        assert_eq!(WlanFrequency::bucket(4.9), WlanFrequency::Ghz2_4);
        assert_eq!(WlanFrequency::bucket(2.4), WlanFrequency::Ghz2_4);
        assert_eq!(WlanFrequency::bucket(5.0), WlanFrequency::Ghz5);
        assert_eq!(WlanFrequency::bucket(5.8), WlanFrequency::Ghz5);
        for freq in WlanFrequency::ALL {
            assert_eq!(WlanFrequency::bucket(freq.gigahertz()), freq);
        }
    }
}
