use crate::formats::{self, FileKind};
use crate::metadata::{normalize, parse_exif_datetime, Metadata};
use crate::photo::PhotoFile;
use crate::resolver::MetadataBackend;
use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Extraction backend that shells out to the `exiftool` binary.
///
/// exiftool traverses maker notes and nested sub-IFDs that in-process parsers
/// never reach, and understands every RAW dialect, so it sits first in the
/// fallback chain when available. Each call spawns one child process; the
/// pipeline absorbs that latency serially.
pub struct ExifToolBackend {
    program: String,
}

impl ExifToolBackend {
    /// Probe for a working `exiftool` on PATH. `None` just shortens the
    /// fallback chain; it is not an error.
    pub fn detect() -> Option<Self> {
        let backend = Self {
            program: "exiftool".to_string(),
        };
        match Command::new(&backend.program).arg("-ver").output() {
            Ok(output) if output.status.success() => Some(backend),
            _ => {
                debug!("exiftool binary not found, backend disabled");
                None
            }
        }
    }

    #[cfg(test)]
    fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl MetadataBackend for ExifToolBackend {
    fn name(&self) -> &'static str {
        "exiftool"
    }

    fn supports(&self, file: &PhotoFile) -> bool {
        matches!(
            formats::classify(file.extension()),
            Some(FileKind::Jpeg | FileKind::Raw | FileKind::Heic | FileKind::Other)
        )
    }

    fn extract(&self, path: &Path) -> Result<Metadata> {
        // -n keeps numeric tags numeric; -json gives one object per file.
        let output = Command::new(&self.program)
            .args(["-json", "-n"])
            .arg(path)
            .output()
            .with_context(|| format!("failed to execute exiftool for {}", path.display()))?;

        if !output.status.success() {
            bail!("exiftool returned non-zero status for {}", path.display());
        }

        let entries: Vec<Value> = serde_json::from_slice(&output.stdout)
            .with_context(|| format!("failed to parse exiftool output for {}", path.display()))?;
        let entry = entries.into_iter().next().unwrap_or(Value::Null);

        let taken = get_string(&entry, "DateTimeOriginal")
            .or_else(|| get_string(&entry, "SubSecDateTimeOriginal"))
            .as_deref()
            .and_then(parse_exif_datetime);

        Ok(Metadata {
            taken,
            camera_make: normalize(get_string(&entry, "Make")),
            camera_model: normalize(get_string(&entry, "Model")),
            lens_model: normalize(
                get_string(&entry, "LensModel").or_else(|| get_string(&entry, "Lens")),
            ),
            serial_number: normalize(
                get_string(&entry, "BodySerialNumber")
                    .or_else(|| get_string(&entry, "SerialNumber")),
            ),
            iso: get_u32(&entry, "ISO"),
            aperture: get_f64(&entry, "FNumber"),
            focal_length: get_f64(&entry, "FocalLength"),
            shutter_speed: normalize(format_exposure(&entry)),
        })
    }
}

/// With -n ExposureTime comes back as seconds; render the familiar 1/x form
/// for anything faster than a second.
fn format_exposure(entry: &Value) -> Option<String> {
    let seconds = get_f64(entry, "ExposureTime")?;
    if seconds <= 0.0 {
        return None;
    }
    if seconds < 1.0 {
        Some(format!("1/{}", (1.0 / seconds).round() as u64))
    } else {
        Some(crate::scheme::format_number(seconds))
    }
}

fn get_string(entry: &Value, key: &str) -> Option<String> {
    entry.get(key).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn get_u32(entry: &Value, key: &str) -> Option<u32> {
    entry.get(key).and_then(|v| match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f as u64))
            .and_then(|u| u32::try_from(u).ok()),
        Value::String(s) => s.parse::<u32>().ok(),
        _ => None,
    })
}

fn get_f64(entry: &Value, key: &str) -> Option<f64> {
    entry.get(key).and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    })
}
