use crate::exif_backend::EmbeddedExifBackend;
use crate::exiftool_backend::ExifToolBackend;
use crate::metadata::Metadata;
use crate::photo::{PhotoFile, PhotoGroup};
use crate::xmp_backend::XmpBackend;
use anyhow::Result;
use std::path::Path;
use tracing::debug;

/// One strategy for reading metadata out of a file.
///
/// A backend that knows it cannot handle a format says so via `supports`, so
/// the chain skips it instead of letting it fail slowly.
pub trait MetadataBackend {
    fn name(&self) -> &'static str;
    fn supports(&self, file: &PhotoFile) -> bool;
    fn extract(&self, path: &Path) -> Result<Metadata>;
}

/// Ordered fallback chain of extraction backends.
///
/// Formats vary wildly in which backend can parse them; a failure in one
/// backend must never block extraction via another, so every failure here
/// falls through silently (logged at debug level only).
pub struct MetadataResolver {
    backends: Vec<Box<dyn MetadataBackend>>,
}

impl MetadataResolver {
    /// Default chain: exiftool first when installed (full traversal,
    /// including maker notes), then the in-process EXIF parser, then the
    /// XMP sidecar reader.
    pub fn with_default_backends() -> Self {
        let mut backends: Vec<Box<dyn MetadataBackend>> = Vec::new();
        if let Some(exiftool) = ExifToolBackend::detect() {
            backends.push(Box::new(exiftool));
        }
        backends.push(Box::new(EmbeddedExifBackend));
        backends.push(Box::new(XmpBackend));
        Self { backends }
    }

    pub fn new(backends: Vec<Box<dyn MetadataBackend>>) -> Self {
        Self { backends }
    }

    /// Resolve metadata for one group.
    ///
    /// Picks the most authoritative member (raw > primary > sidecar) and
    /// runs the chain on it. The first backend that yields the minimum
    /// required field (the capture timestamp) wins and its whole record is
    /// taken atomically; weaker attempts leave no trace. An exhausted chain
    /// leaves the group with empty metadata, which is not an error.
    pub fn resolve(&self, group: &mut PhotoGroup) {
        group.metadata = group
            .metadata_source()
            .and_then(|source| self.run_chain(source))
            .unwrap_or_default();
    }

    /// Resolve every group in place, returning how many ended up with a
    /// capture timestamp.
    pub fn resolve_all(&self, groups: &mut [PhotoGroup]) -> usize {
        let mut resolved = 0;
        for group in groups.iter_mut() {
            self.resolve(group);
            if group.metadata.taken.is_some() {
                resolved += 1;
            }
        }
        resolved
    }

    fn run_chain(&self, source: &PhotoFile) -> Option<Metadata> {
        for backend in &self.backends {
            if !backend.supports(source) {
                continue;
            }
            match backend.extract(&source.path) {
                Ok(metadata) if metadata.taken.is_some() => {
                    debug!(
                        backend = backend.name(),
                        path = %source.path.display(),
                        "metadata extracted"
                    );
                    return Some(metadata);
                }
                Ok(_) => {
                    debug!(
                        backend = backend.name(),
                        path = %source.path.display(),
                        "no capture timestamp, trying next backend"
                    );
                }
                Err(err) => {
                    debug!(
                        backend = backend.name(),
                        path = %source.path.display(),
                        error = %err,
                        "extraction failed, trying next backend"
                    );
                }
            }
        }
        None
    }
}
