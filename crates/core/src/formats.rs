use serde::{Deserialize, Serialize};

/// Classification of a supported file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileKind {
    Jpeg,
    Raw,
    Heic,
    LivePhoto,
    Sidecar,
    Other,
}

/// Role a file plays inside its group. Pure function of the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Primary,
    Raw,
    Sidecar,
}

const JPEG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

const RAW_EXTENSIONS: &[&str] = &[
    "cr2", "cr3", "crw", // Canon
    "nef", "nrw", // Nikon
    "arw", "srf", "sr2", // Sony
    "raf", // Fujifilm
    "orf", // Olympus
    "rw2", // Panasonic
    "pef", "ptx", // Pentax
    "rwl", // Leica
    "dcr", "kdc", // Kodak
    "mrw", // Minolta
    "srw", // Samsung
    "3fr", // Hasselblad
    "mef", // Mamiya
    "iiq", // Phase One
    "x3f", // Sigma
    "dng", "raw",
];

const HEIC_EXTENSIONS: &[&str] = &["heic", "heif", "hif"];

// Apple Live Photo companion clips travel with the still image.
const LIVE_PHOTO_EXTENSIONS: &[&str] = &["mov"];

const SIDECAR_EXTENSIONS: &[&str] = &["xmp", "xml", "thm", "pp3", "dop", "pto", "lrtemplate"];

const OTHER_IMAGE_EXTENSIONS: &[&str] = &["png", "gif", "bmp", "tiff", "tif", "webp"];

/// Classify an extension (without dot, any case). `None` means unsupported.
pub fn classify(extension: &str) -> Option<FileKind> {
    let ext = extension.to_ascii_lowercase();
    let matches_any = |set: &[&str]| set.iter().any(|e| *e == ext);

    if matches_any(JPEG_EXTENSIONS) {
        Some(FileKind::Jpeg)
    } else if matches_any(RAW_EXTENSIONS) {
        Some(FileKind::Raw)
    } else if matches_any(HEIC_EXTENSIONS) {
        Some(FileKind::Heic)
    } else if matches_any(LIVE_PHOTO_EXTENSIONS) {
        Some(FileKind::LivePhoto)
    } else if matches_any(SIDECAR_EXTENSIONS) {
        Some(FileKind::Sidecar)
    } else if matches_any(OTHER_IMAGE_EXTENSIONS) {
        Some(FileKind::Other)
    } else {
        None
    }
}

impl FileKind {
    pub fn role(self) -> FileRole {
        match self {
            FileKind::Jpeg | FileKind::Heic | FileKind::Other => FileRole::Primary,
            FileKind::Raw => FileRole::Raw,
            FileKind::LivePhoto | FileKind::Sidecar => FileRole::Sidecar,
        }
    }
}

/// RAW dialects that are TIFF containers and therefore readable by an
/// in-process TIFF/EXIF parser. cr3 (ISO-BMFF), raf, rw2 and x3f are not.
const TIFF_BASED_RAW: &[&str] = &[
    "dng", "cr2", "nef", "nrw", "arw", "srf", "sr2", "orf", "pef", "ptx", "rwl", "dcr", "kdc",
    "mrw", "srw", "3fr", "mef", "iiq", "raw",
];

pub fn is_tiff_based_raw(extension: &str) -> bool {
    let ext = extension.to_ascii_lowercase();
    TIFF_BASED_RAW.iter().any(|e| *e == ext)
}
