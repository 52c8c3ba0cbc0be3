use crate::metadata::{normalize, parse_exif_datetime, Metadata};
use crate::photo::PhotoFile;
use crate::resolver::MetadataBackend;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Sidecar XMP reader.
///
/// XMP writers disagree on whether values live in rdf:Description attributes
/// or in element text, and on namespace prefixes. The parser therefore keys
/// on the local tag name only and accepts both spellings.
pub struct XmpBackend;

const DATE_KEYS: &[&str] = &["datetimeoriginal", "createdate", "datecreated"];

const WANTED_KEYS: &[&str] = &[
    "datetimeoriginal",
    "createdate",
    "datecreated",
    "make",
    "model",
    "lensmodel",
    "lens",
    "serialnumber",
    "bodyserialnumber",
    "isospeedratings",
    "iso",
    "fnumber",
    "exposuretime",
    "focallength",
];

impl MetadataBackend for XmpBackend {
    fn name(&self) -> &'static str {
        "xmp-sidecar"
    }

    fn supports(&self, file: &PhotoFile) -> bool {
        file.extension().eq_ignore_ascii_case("xmp")
    }

    fn extract(&self, path: &Path) -> Result<Metadata> {
        let xml = fs::read_to_string(path)
            .with_context(|| format!("failed to read XMP sidecar: {}", path.display()))?;
        let values = scan_document(&xml);

        let taken = first_of(&values, DATE_KEYS)
            .as_deref()
            .and_then(parse_exif_datetime);

        Ok(Metadata {
            taken,
            camera_make: normalize(first_of(&values, &["make"])),
            camera_model: normalize(first_of(&values, &["model"])),
            lens_model: normalize(first_of(&values, &["lensmodel", "lens"])),
            serial_number: normalize(first_of(&values, &["serialnumber", "bodyserialnumber"])),
            iso: first_of(&values, &["isospeedratings", "iso"])
                .as_deref()
                .and_then(|v| v.parse::<u32>().ok()),
            aperture: first_of(&values, &["fnumber"])
                .as_deref()
                .and_then(parse_rational),
            focal_length: first_of(&values, &["focallength"])
                .as_deref()
                .and_then(parse_rational),
            shutter_speed: normalize(first_of(&values, &["exposuretime"])),
        })
    }
}

fn first_of(values: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| values.get(*key).cloned())
}

/// XMP stores rationals like "28/10"; plain decimals also appear.
fn parse_rational(value: &str) -> Option<f64> {
    let value = value.trim();
    if let Some((num, den)) = value.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        if den == 0.0 {
            return None;
        }
        return Some(num / den);
    }
    value.parse().ok()
}

/// Single pass over the document collecting wanted values from both element
/// text and attributes. First occurrence of a key wins.
fn scan_document(xml: &str) -> HashMap<String, String> {
    let mut values = HashMap::<String, String>::new();

    for (tag, rest) in tags(xml) {
        let Some(tag_name) = tag.split_whitespace().next() else {
            continue;
        };

        for (attr, attr_value) in attributes(tag) {
            let key = local_name(attr);
            if is_wanted(&key) && !values.contains_key(&key) && !attr_value.trim().is_empty() {
                values.insert(key, unescape(attr_value.trim()));
            }
        }

        let key = local_name(tag_name);
        if !is_wanted(&key) || values.contains_key(&key) {
            continue;
        }
        let close = format!("</{}>", tag_name);
        if let Some(end) = rest.find(&close) {
            let text = inner_text(&rest[..end]);
            if !text.is_empty() {
                values.insert(key, unescape(&text));
            }
        }
    }

    values
}

/// Iterate over `(tag contents, remainder after the tag)` for each opening
/// element tag, skipping closers, comments and processing instructions.
fn tags(xml: &str) -> impl Iterator<Item = (&str, &str)> + '_ {
    let mut rest = xml;
    std::iter::from_fn(move || loop {
        let start = rest.find('<')?;
        let after = &rest[start + 1..];
        let end = after.find('>')?;
        let tag = &after[..end];
        rest = &after[end + 1..];
        if tag.starts_with('/') || tag.starts_with('?') || tag.starts_with('!') {
            continue;
        }
        return Some((tag.trim_end_matches('/'), rest));
    })
}

/// `name="value"` pairs inside one tag. Tolerates single quotes and skips
/// bare attributes without values.
fn attributes(tag: &str) -> impl Iterator<Item = (&str, &str)> + '_ {
    let body = tag.split_once(char::is_whitespace).map(|(_, b)| b).unwrap_or("");
    let mut rest = body;
    std::iter::from_fn(move || loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return None;
        }
        let eq = rest.find('=')?;
        let name = rest[..eq].trim();
        let after = rest[eq + 1..].trim_start();
        let quote = after.chars().next()?;
        if quote != '"' && quote != '\'' {
            // Malformed; stop scanning this tag.
            return None;
        }
        let value_body = &after[1..];
        let close = value_body.find(quote)?;
        let value = &value_body[..close];
        rest = &value_body[close + 1..];
        if name.is_empty() || name.contains(char::is_whitespace) {
            continue;
        }
        return Some((name, value));
    })
}

/// Text content of an element, digging through nested markup such as the
/// rdf:Seq/rdf:li wrappers XMP uses for list-valued tags.
fn inner_text(content: &str) -> String {
    if !content.contains('<') {
        return content.trim().to_string();
    }
    let mut rest = content;
    loop {
        let Some(open) = rest.find('<') else {
            return rest.trim().to_string();
        };
        let head = rest[..open].trim();
        if !head.is_empty() {
            return head.to_string();
        }
        let Some(close) = rest[open..].find('>') else {
            return String::new();
        };
        rest = &rest[open + close + 1..];
    }
}

fn local_name(qualified: &str) -> String {
    qualified
        .rsplit(':')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn is_wanted(key: &str) -> bool {
    WANTED_KEYS.iter().any(|k| *k == key)
}

fn unescape(input: &str) -> String {
    input
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}
