//! Core library for shotgroup: scans photo libraries into basename groups,
//! resolves capture metadata through a chain of backends, persists the result
//! as a JSON database, and turns naming schemes into executable rename plans.

pub mod config;
pub mod database;
pub mod executor;
pub mod exif_backend;
pub mod exiftool_backend;
pub mod formats;
pub mod metadata;
pub mod photo;
pub mod planner;
pub mod resolver;
pub mod sanitize;
pub mod scanner;
pub mod scheme;
pub mod xmp_backend;

pub use config::AppConfig;
pub use database::GroupDatabase;
pub use executor::{execute_plan, ExecuteOptions, ExecutionReport, TransferMode};
pub use formats::{FileKind, FileRole};
pub use metadata::Metadata;
pub use photo::{PhotoFile, PhotoGroup};
pub use planner::{build_plan, PlanError, PlanOptions, RenamePlan};
pub use resolver::{MetadataBackend, MetadataResolver};
pub use scanner::{scan_directory, ScanError, ScanOutcome, ScanStats};
pub use scheme::{NamingScheme, OnMissing, SchemeError};
