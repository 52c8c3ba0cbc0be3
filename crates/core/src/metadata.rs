use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Normalized metadata record for one photo group.
///
/// Every field is optional; an absent field is distinct from an empty value
/// and absent fields are omitted from the persisted database. The record is
/// produced atomically by the winning extraction backend and never patched
/// field-by-field afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taken: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lens_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aperture: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter_speed: Option<String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.taken.is_none()
            && self.camera_make.is_none()
            && self.camera_model.is_none()
            && self.lens_model.is_none()
            && self.serial_number.is_none()
            && self.iso.is_none()
            && self.aperture.is_none()
            && self.focal_length.is_none()
            && self.shutter_speed.is_none()
    }
}

/// Trim a string value, dropping it entirely when blank.
pub(crate) fn normalize(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse the date spellings that show up in EXIF tags and XMP sidecars.
///
/// Offset-qualified timestamps keep their local wall-clock components; the
/// capture moment as the photographer saw it is what ends up in filenames.
pub fn parse_exif_datetime(input: &str) -> Option<NaiveDateTime> {
    let normalized = input.trim();

    let naive_formats = [
        "%Y:%m:%d %H:%M:%S",
        "%Y:%m:%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in naive_formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(normalized, fmt) {
            return Some(naive);
        }
    }

    let offset_formats = ["%Y-%m-%dT%H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"];
    for fmt in offset_formats {
        if let Ok(dt) = DateTime::parse_from_str(normalized, fmt) {
            return Some(dt.naive_local());
        }
    }

    // Covers the `Z` UTC suffix, which `%:z` does not match.
    if let Ok(dt) = DateTime::parse_from_rfc3339(normalized) {
        return Some(dt.naive_local());
    }

    None
}
