use crate::formats::{self, FileKind};
use crate::metadata::{normalize, parse_exif_datetime, Metadata};
use crate::photo::PhotoFile;
use crate::resolver::MetadataBackend;
use anyhow::{Context, Result};
use exif::{In, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// In-process EXIF reader backed by kamadak-exif.
///
/// Parses the full IFD tree including the Exif sub-IFD, so DateTimeOriginal
/// is read from where cameras actually put it. Only TIFF-shaped containers
/// are readable, which rules out the modern RAW dialects (cr3, raf, rw2, x3f).
pub struct EmbeddedExifBackend;

impl MetadataBackend for EmbeddedExifBackend {
    fn name(&self) -> &'static str {
        "embedded-exif"
    }

    fn supports(&self, file: &PhotoFile) -> bool {
        match formats::classify(file.extension()) {
            Some(FileKind::Jpeg | FileKind::Heic | FileKind::Other) => true,
            Some(FileKind::Raw) => formats::is_tiff_based_raw(file.extension()),
            _ => false,
        }
    }

    fn extract(&self, path: &Path) -> Result<Metadata> {
        let file = File::open(path)
            .with_context(|| format!("failed to open for EXIF read: {}", path.display()))?;
        let mut buf = BufReader::new(file);
        let exif = exif::Reader::new()
            .read_from_container(&mut buf)
            .with_context(|| format!("failed to parse EXIF: {}", path.display()))?;

        // DateTimeOriginal only: DateTime is the file modification stamp and
        // must never leak into capture timestamps.
        let taken = string_field(&exif, Tag::DateTimeOriginal)
            .as_deref()
            .and_then(parse_exif_datetime);

        Ok(Metadata {
            taken,
            camera_make: normalize(string_field(&exif, Tag::Make)),
            camera_model: normalize(string_field(&exif, Tag::Model)),
            lens_model: normalize(string_field(&exif, Tag::LensModel)),
            serial_number: normalize(string_field(&exif, Tag::BodySerialNumber)),
            iso: uint_field(&exif, Tag::PhotographicSensitivity),
            aperture: rational_field(&exif, Tag::FNumber),
            focal_length: rational_field(&exif, Tag::FocalLength),
            shutter_speed: normalize(string_field(&exif, Tag::ExposureTime)),
        })
    }
}

fn string_field(exif: &exif::Exif, tag: Tag) -> Option<String> {
    exif.get_field(tag, In::PRIMARY)
        .map(|field| field.display_value().to_string())
}

fn uint_field(exif: &exif::Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
}

fn rational_field(exif: &exif::Exif, tag: Tag) -> Option<f64> {
    exif.get_field(tag, In::PRIMARY)
        .and_then(|field| match &field.value {
            Value::Rational(values) => values.first().map(|r| r.to_f64()),
            Value::SRational(values) => values.first().map(|r| r.to_f64()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::EmbeddedExifBackend;
    use crate::photo::PhotoFile;
    use crate::resolver::MetadataBackend;
    use std::path::Path;

    fn file(path: &str) -> PhotoFile {
        PhotoFile::from_path(Path::new(path)).expect("supported extension")
    }

    #[test]
    fn supports_jpeg_and_tiff_based_raw_only() {
        let backend = EmbeddedExifBackend;
        assert!(backend.supports(&file("/p/a.jpg")));
        assert!(backend.supports(&file("/p/a.tiff")));
        assert!(backend.supports(&file("/p/a.dng")));
        assert!(backend.supports(&file("/p/a.NEF")));
        // Non-TIFF RAW dialects are skipped instead of failing slowly.
        assert!(!backend.supports(&file("/p/a.cr3")));
        assert!(!backend.supports(&file("/p/a.raf")));
        assert!(!backend.supports(&file("/p/a.xmp")));
    }

    #[test]
    fn unreadable_file_reports_an_error() {
        let backend = EmbeddedExifBackend;
        let err = backend.extract(Path::new("/nonexistent/a.jpg"));
        assert!(err.is_err());
    }
}
