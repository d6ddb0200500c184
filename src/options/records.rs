// SPDX-License-Identifier: GPL-3.0-only

//! Structured option values
//!
//! Each record decodes field by field. A field missing from the wire object
//! stays [`Field::Absent`], an explicit `null` becomes [`Field::Null`]; no
//! field is ever filled with a default value.

use super::codec::{decode_bool, decode_float, decode_int, decode_literal, decode_text, json_type, narrow_number};
use super::enums::{FirstShooting, MediaType, WireEnum};
use super::value::{Field, RecordKind, RecordValue};
use crate::errors::{ThetaError, ThetaResult};
use serde_json::{Map, Value};

/// GPS position attached to captures
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpsInfo {
    pub lat: Field<f64>,
    pub lng: Field<f64>,
    /// Meters
    pub altitude: Field<f64>,
    pub date_time_zone: Field<String>,
    /// Geodetic datum, normally `WGS84`
    pub datum: Field<String>,
}

/// Live preview resolution and frame rate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewFormat {
    pub width: Field<i64>,
    pub height: Field<i64>,
    pub framerate: Field<i64>,
}

/// HTTP proxy used in client mode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Proxy {
    /// `use` on the wire
    pub enabled: Field<bool>,
    pub url: Field<String>,
    pub port: Field<i64>,
    pub user_id: Field<String>,
    pub password: Field<String>,
}

/// Time-shift capture settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeShift {
    pub first_shooting: Field<FirstShooting>,
    /// Seconds before the first shot
    pub first_interval: Field<i64>,
    /// Seconds between the two shots
    pub second_interval: Field<i64>,
}

/// Media file format
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaFileFormat {
    pub media_type: Field<MediaType>,
    pub width: Field<i64>,
    pub height: Field<i64>,
    pub codec: Field<String>,
    pub frame_rate: Field<i64>,
}

/// Range reported by `_shutterVolumeSupport`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShutterVolumeRange {
    pub min: Field<i64>,
    pub max: Field<i64>,
}

impl GpsInfo {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat: lat.into(),
            lng: lng.into(),
            ..Default::default()
        }
    }

    /// Marker the device understands as "no position"
    pub fn disabled() -> Self {
        Self {
            lat: Field::Present(65535.0),
            lng: Field::Present(65535.0),
            ..Default::default()
        }
    }
}

impl PreviewFormat {
    pub fn new(width: i64, height: i64, framerate: i64) -> Self {
        Self {
            width: width.into(),
            height: height.into(),
            framerate: framerate.into(),
        }
    }
}

impl MediaFileFormat {
    pub fn image(media_type: MediaType, width: i64, height: i64) -> Self {
        Self {
            media_type: media_type.into(),
            width: width.into(),
            height: height.into(),
            ..Default::default()
        }
    }

    pub fn video(width: i64, height: i64, codec: &str, frame_rate: i64) -> Self {
        Self {
            media_type: MediaType::Mp4.into(),
            width: width.into(),
            height: height.into(),
            codec: codec.to_string().into(),
            frame_rate: frame_rate.into(),
        }
    }
}

/// Reads fields of one wire object
struct FieldReader<'a> {
    path: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> FieldReader<'a> {
    fn new(path: &'a str, value: &'a Value) -> ThetaResult<Self> {
        match value {
            Value::Object(map) => Ok(Self { path, map }),
            other => Err(ThetaError::decode(
                path,
                format!("expected object, found {}", json_type(other)),
            )),
        }
    }

    fn field<T>(
        &self,
        name: &str,
        decode: impl Fn(&str, &Value) -> ThetaResult<T>,
    ) -> ThetaResult<Field<T>> {
        match self.map.get(name) {
            None => Ok(Field::Absent),
            Some(Value::Null) => Ok(Field::Null),
            Some(value) => {
                let path = format!("{}.{}", self.path, name);
                decode(&path, value).map(Field::Present)
            }
        }
    }

    fn int(&self, name: &str) -> ThetaResult<Field<i64>> {
        self.field(name, decode_int)
    }

    fn float(&self, name: &str) -> ThetaResult<Field<f64>> {
        self.field(name, decode_float)
    }

    fn text(&self, name: &str) -> ThetaResult<Field<String>> {
        self.field(name, decode_text)
    }

    fn boolean(&self, name: &str) -> ThetaResult<Field<bool>> {
        self.field(name, decode_bool)
    }

    fn literal<T: WireEnum>(&self, name: &str) -> ThetaResult<Field<T>> {
        self.field(name, decode_literal::<T>)
    }
}

/// Builds one wire object, skipping absent fields
#[derive(Default)]
struct FieldWriter {
    map: Map<String, Value>,
}

impl FieldWriter {
    fn put<T>(mut self, name: &str, field: &Field<T>, encode: impl Fn(&T) -> Value) -> Self {
        match field {
            Field::Absent => {}
            Field::Null => {
                self.map.insert(name.to_string(), Value::Null);
            }
            Field::Present(value) => {
                self.map.insert(name.to_string(), encode(value));
            }
        }
        self
    }

    fn int(self, name: &str, field: &Field<i64>) -> Self {
        self.put(name, field, |v| Value::from(*v))
    }

    fn float(self, name: &str, field: &Field<f64>) -> Self {
        self.put(name, field, |v| narrow_number(*v))
    }

    fn text(self, name: &str, field: &Field<String>) -> Self {
        self.put(name, field, |v| Value::from(v.as_str()))
    }

    fn literal<T: WireEnum>(self, name: &str, field: &Field<T>) -> Self {
        self.put(name, field, |v| Value::from(v.wire_name()))
    }

    fn finish(self) -> Value {
        Value::Object(self.map)
    }
}

pub(crate) fn decode_record(path: &str, kind: RecordKind, value: &Value) -> ThetaResult<RecordValue> {
    let r = FieldReader::new(path, value)?;
    let record = match kind {
        RecordKind::Gps => RecordValue::Gps(GpsInfo {
            lat: r.float("lat")?,
            lng: r.float("lng")?,
            altitude: r.float("_altitude")?,
            date_time_zone: r.text("_dateTimeZone")?,
            datum: r.text("_datum")?,
        }),
        RecordKind::PreviewFormat => RecordValue::PreviewFormat(PreviewFormat {
            width: r.int("width")?,
            height: r.int("height")?,
            framerate: r.int("framerate")?,
        }),
        RecordKind::Proxy => RecordValue::Proxy(Proxy {
            enabled: r.boolean("use")?,
            url: r.text("url")?,
            port: r.int("port")?,
            user_id: r.text("userid")?,
            password: r.text("password")?,
        }),
        RecordKind::TimeShift => RecordValue::TimeShift(TimeShift {
            first_shooting: r.literal("firstShooting")?,
            first_interval: r.int("firstInterval")?,
            second_interval: r.int("secondInterval")?,
        }),
        RecordKind::FileFormat => RecordValue::FileFormat(MediaFileFormat {
            media_type: r.literal("type")?,
            width: r.int("width")?,
            height: r.int("height")?,
            codec: r.text("_codec")?,
            frame_rate: r.int("_frameRate")?,
        }),
        RecordKind::ShutterVolumeRange => RecordValue::ShutterVolumeRange(ShutterVolumeRange {
            min: r.int("minShutterVolume")?,
            max: r.int("maxShutterVolume")?,
        }),
    };
    Ok(record)
}

pub(crate) fn encode_record(record: &RecordValue) -> Value {
    let w = FieldWriter::default();
    match record {
        RecordValue::Gps(gps) => w
            .float("lat", &gps.lat)
            .float("lng", &gps.lng)
            .float("_altitude", &gps.altitude)
            .text("_dateTimeZone", &gps.date_time_zone)
            .text("_datum", &gps.datum),
        RecordValue::PreviewFormat(format) => w
            .int("width", &format.width)
            .int("height", &format.height)
            .int("framerate", &format.framerate),
        RecordValue::Proxy(proxy) => w
            .put("use", &proxy.enabled, |v| Value::Bool(*v))
            .text("url", &proxy.url)
            .int("port", &proxy.port)
            .text("userid", &proxy.user_id)
            .text("password", &proxy.password),
        RecordValue::TimeShift(shift) => w
            .literal("firstShooting", &shift.first_shooting)
            .int("firstInterval", &shift.first_interval)
            .int("secondInterval", &shift.second_interval),
        RecordValue::FileFormat(format) => w
            .literal("type", &format.media_type)
            .int("width", &format.width)
            .int("height", &format.height)
            .text("_codec", &format.codec)
            .int("_frameRate", &format.frame_rate),
        RecordValue::ShutterVolumeRange(range) => w
            .int("minShutterVolume", &range.min)
            .int("maxShutterVolume", &range.max),
    }
    .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_stay_absent() {
        let record = decode_record("previewFormat", RecordKind::PreviewFormat, &json!({"width": 1024}))
            .unwrap();
        let RecordValue::PreviewFormat(format) = record else {
            panic!("wrong record kind");
        };
        assert_eq!(format.width, Field::Present(1024));
        assert!(format.height.is_absent());
        assert!(format.framerate.is_absent());
    }

    #[test]
    fn test_null_field_differs_from_absent() {
        let record = decode_record(
            "gpsInfo",
            RecordKind::Gps,
            &json!({"lat": 35.5, "lng": null}),
        )
        .unwrap();
        let RecordValue::Gps(gps) = record else {
            panic!("wrong record kind");
        };
        assert!(gps.lng.is_null());
        assert!(gps.altitude.is_absent());
        assert_eq!(encode_record(&RecordValue::Gps(gps)), json!({"lat": 35.5, "lng": null}));
    }

    #[test]
    fn test_field_error_names_path() {
        let err = decode_record(
            "fileFormat",
            RecordKind::FileFormat,
            &json!({"type": "jpeg", "width": 5504.5}),
        )
        .unwrap_err();
        assert_eq!(err.decode_key(), Some("fileFormat.width"));
    }

    #[test]
    fn test_proxy_use_field() {
        let proxy = Proxy {
            enabled: true.into(),
            url: "10.0.0.1".to_string().into(),
            port: 8080.into(),
            ..Default::default()
        };
        let wire = encode_record(&RecordValue::Proxy(proxy.clone()));
        assert_eq!(wire, json!({"use": true, "url": "10.0.0.1", "port": 8080}));
        assert_eq!(
            decode_record("_proxy", RecordKind::Proxy, &wire).unwrap(),
            RecordValue::Proxy(proxy)
        );
    }
}
