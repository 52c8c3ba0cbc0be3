use crate::metadata::Metadata;
use crate::photo::PhotoGroup;
use crate::sanitize::sanitize_component;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SchemeError {
    #[error("naming scheme is empty")]
    Empty,
    #[error("unbalanced braces in naming scheme")]
    UnbalancedBraces,
    #[error("unknown placeholder: {{{0}}}")]
    UnknownPlaceholder(String),
    #[error(
        "{count} groups render to \"{rendered}\"; add {{sequence}} to the scheme to disambiguate"
    )]
    AmbiguousCollision { rendered: String, count: usize },
}

/// A metadata value the scheme can interpolate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    DateTime,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    CameraMake,
    CameraModel,
    LensModel,
    SerialNumber,
    Iso,
    Aperture,
    FocalLength,
    ShutterSpeed,
    Basename,
    Sequence,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "year" => Self::Year,
            "month" => Self::Month,
            "day" => Self::Day,
            "hour" => Self::Hour,
            "minute" => Self::Minute,
            "second" => Self::Second,
            "camera_make" => Self::CameraMake,
            "camera_model" => Self::CameraModel,
            "lens_model" => Self::LensModel,
            "serial_number" => Self::SerialNumber,
            "iso" => Self::Iso,
            "aperture" => Self::Aperture,
            "focal_length" => Self::FocalLength,
            "shutter_speed" => Self::ShutterSpeed,
            "basename" => Self::Basename,
            "sequence" => Self::Sequence,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::CameraMake => "camera_make",
            Self::CameraModel => "camera_model",
            Self::LensModel => "lens_model",
            Self::SerialNumber => "serial_number",
            Self::Iso => "iso",
            Self::Aperture => "aperture",
            Self::FocalLength => "focal_length",
            Self::ShutterSpeed => "shutter_speed",
            Self::Basename => "basename",
            Self::Sequence => "sequence",
        }
    }

    /// Value for this field, before sanitization. `None` means the group's
    /// metadata cannot satisfy the field.
    fn value(&self, group: &PhotoGroup) -> Option<String> {
        let meta: &Metadata = &group.metadata;
        match self {
            Self::Date => meta.taken.map(|t| t.format("%Y-%m-%d").to_string()),
            Self::DateTime => meta.taken.map(|t| t.format("%Y-%m-%d_%H-%M-%S").to_string()),
            Self::Year => meta.taken.map(|t| t.format("%Y").to_string()),
            Self::Month => meta.taken.map(|t| t.format("%m").to_string()),
            Self::Day => meta.taken.map(|t| t.format("%d").to_string()),
            Self::Hour => meta.taken.map(|t| t.format("%H").to_string()),
            Self::Minute => meta.taken.map(|t| t.format("%M").to_string()),
            Self::Second => meta.taken.map(|t| t.format("%S").to_string()),
            Self::CameraMake => meta.camera_make.clone(),
            Self::CameraModel => meta.camera_model.clone(),
            Self::LensModel => meta.lens_model.clone(),
            Self::SerialNumber => meta.serial_number.clone(),
            Self::Iso => meta.iso.map(|v| v.to_string()),
            Self::Aperture => meta.aperture.map(format_number),
            Self::FocalLength => meta.focal_length.map(format_number),
            Self::ShutterSpeed => meta.shutter_speed.clone(),
            Self::Basename => Some(group.key.clone()),
            Self::Sequence => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SchemePart {
    Literal(String),
    Field(Field),
}

/// What to do when a placeholder has no value for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnMissing {
    /// Abort rendering; the caller skips the group.
    Skip,
    /// Substitute the literal "unknown".
    Sentinel,
}

const SENTINEL: &str = "unknown";

/// A parsed naming scheme such as `{date}_{camera_model}_{sequence}`.
///
/// Literal text passes through verbatim, so a `/` in the scheme produces
/// subdirectories under the destination. Interpolated values are sanitized
/// individually, which keeps a shutter speed of `1/250` from doing the same.
#[derive(Debug, Clone, PartialEq)]
pub struct NamingScheme {
    source: String,
    parts: Vec<SchemePart>,
}

impl NamingScheme {
    pub fn parse(input: &str) -> Result<Self, SchemeError> {
        if input.trim().is_empty() {
            return Err(SchemeError::Empty);
        }

        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = input.chars();
        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => return Err(SchemeError::UnbalancedBraces),
                            Some(inner) => name.push(inner),
                        }
                    }
                    let field = Field::from_name(&name)
                        .ok_or_else(|| SchemeError::UnknownPlaceholder(name.clone()))?;
                    if !literal.is_empty() {
                        parts.push(SchemePart::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(SchemePart::Field(field));
                }
                '}' => return Err(SchemeError::UnbalancedBraces),
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            parts.push(SchemePart::Literal(literal));
        }

        Ok(Self {
            source: input.to_string(),
            parts,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn has_sequence(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, SchemePart::Field(Field::Sequence)))
    }

    /// Render the scheme for one group.
    ///
    /// `sequence` substitutes `{sequence}`; pass an empty string for the
    /// pre-sequence pass that buckets colliding groups. `Err` names the first
    /// placeholder the group's metadata could not satisfy.
    pub fn render(
        &self,
        group: &PhotoGroup,
        sequence: &str,
        on_missing: OnMissing,
    ) -> Result<String, Field> {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                SchemePart::Literal(text) => out.push_str(text),
                SchemePart::Field(Field::Sequence) => out.push_str(sequence),
                SchemePart::Field(field) => match field.value(group) {
                    Some(value) => out.push_str(&sanitize_component(&value)),
                    None => match on_missing {
                        OnMissing::Skip => return Err(*field),
                        OnMissing::Sentinel => out.push_str(SENTINEL),
                    },
                },
            }
        }
        Ok(out)
    }
}

/// Render a numeric metadata value without a trailing `.0` and without
/// float noise: 2.0 becomes "2", 2.8 stays "2.8".
pub fn format_number(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        let text = format!("{value:.2}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{format_number, Field, NamingScheme, OnMissing, SchemeError};
    use crate::metadata::Metadata;
    use crate::photo::{PhotoFile, PhotoGroup};
    use chrono::NaiveDate;
    use std::path::Path;

    fn group_with(metadata: Metadata) -> PhotoGroup {
        let mut group = PhotoGroup::new(
            "IMG_0001".to_string(),
            PhotoFile::from_path(Path::new("/lib/IMG_0001.jpg")).expect("supported"),
        );
        group.metadata = metadata;
        group
    }

    fn full_metadata() -> Metadata {
        Metadata {
            taken: NaiveDate::from_ymd_opt(2024, 3, 15).and_then(|d| d.and_hms_opt(10, 20, 30)),
            camera_make: Some("Canon".to_string()),
            camera_model: Some("EOS R5".to_string()),
            lens_model: Some("RF 35mm".to_string()),
            serial_number: Some("0123456".to_string()),
            iso: Some(100),
            aperture: Some(2.8),
            focal_length: Some(35.0),
            shutter_speed: Some("1/250".to_string()),
        }
    }

    #[test]
    fn parses_literals_and_placeholders() {
        let scheme = NamingScheme::parse("{date}_{camera_model}_{sequence}").expect("parse");
        assert!(scheme.has_sequence());
        assert_eq!(scheme.source(), "{date}_{camera_model}_{sequence}");

        let plain = NamingScheme::parse("{basename}").expect("parse");
        assert!(!plain.has_sequence());
    }

    #[test]
    fn rejects_bad_schemes() {
        assert_eq!(NamingScheme::parse(""), Err(SchemeError::Empty));
        assert_eq!(NamingScheme::parse("   "), Err(SchemeError::Empty));
        assert_eq!(NamingScheme::parse("{date"), Err(SchemeError::UnbalancedBraces));
        assert_eq!(NamingScheme::parse("date}"), Err(SchemeError::UnbalancedBraces));
        assert_eq!(NamingScheme::parse("{{date}}"), Err(SchemeError::UnbalancedBraces));
        assert_eq!(
            NamingScheme::parse("{camera}"),
            Err(SchemeError::UnknownPlaceholder("camera".to_string()))
        );
    }

    #[test]
    fn renders_full_metadata() {
        let scheme =
            NamingScheme::parse("{date}_{camera_model}_{iso}_{aperture}").expect("parse");
        let group = group_with(full_metadata());
        let rendered = scheme.render(&group, "", OnMissing::Skip).expect("render");
        assert_eq!(rendered, "2024-03-15_EOS R5_100_2.8");
    }

    #[test]
    fn renders_datetime_and_components() {
        let scheme = NamingScheme::parse("{datetime}/{year}-{month}").expect("parse");
        let group = group_with(full_metadata());
        let rendered = scheme.render(&group, "", OnMissing::Skip).expect("render");
        assert_eq!(rendered, "2024-03-15_10-20-30/2024-03");
    }

    #[test]
    fn sequence_substitution() {
        let scheme = NamingScheme::parse("{date}_{sequence}").expect("parse");
        let group = group_with(full_metadata());
        assert_eq!(
            scheme.render(&group, "001", OnMissing::Skip).expect("render"),
            "2024-03-15_001"
        );
        // Pre-sequence pass renders the sequence as nothing.
        assert_eq!(
            scheme.render(&group, "", OnMissing::Skip).expect("render"),
            "2024-03-15_"
        );
    }

    #[test]
    fn missing_field_skips_or_renders_sentinel() {
        let scheme = NamingScheme::parse("{date}_{lens_model}").expect("parse");
        let group = group_with(Metadata {
            lens_model: None,
            ..full_metadata()
        });
        assert_eq!(scheme.render(&group, "", OnMissing::Skip), Err(Field::LensModel));
        assert_eq!(
            scheme.render(&group, "", OnMissing::Sentinel).expect("render"),
            "2024-03-15_unknown"
        );
    }

    #[test]
    fn field_values_are_sanitized_but_literals_are_not() {
        let scheme = NamingScheme::parse("{year}/{shutter_speed}").expect("parse");
        let group = group_with(full_metadata());
        let rendered = scheme.render(&group, "", OnMissing::Skip).expect("render");
        // The literal slash survives as a path separator; the one inside the
        // shutter speed does not.
        assert_eq!(rendered, "2024/1_250");
    }

    #[test]
    fn basename_is_always_available() {
        let scheme = NamingScheme::parse("{basename}").expect("parse");
        let group = group_with(Metadata::default());
        assert_eq!(
            scheme.render(&group, "", OnMissing::Skip).expect("render"),
            "IMG_0001"
        );
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(2.8), "2.8");
        assert_eq!(format_number(35.0), "35");
        assert_eq!(format_number(1.75), "1.75");
    }
}
