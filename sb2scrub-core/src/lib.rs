//! Sb2Scrub Core Library
//!
//! This crate provides the core functionality for Sb2Scrub:
//! - Canonical default shapes for Scratch 2 project documents
//! - Whitelist reconstruction of untrusted documents
//! - `.sb2` archive container handling
//! - The validate pipeline (archive in, sanitized archive out)

pub mod archive;
pub mod pipeline;
pub mod reconstruct;
pub mod schema;

// Re-export commonly used types
pub use archive::{ArchiveError, ProjectArchive};
pub use pipeline::{
    inspect_bytes, validate_bytes, validate_file, validated_path, ValidateConfig, ValidateError,
    ValidationOutcome, OUTPUT_PREFIX, PROJECT_ENTRY,
};
pub use reconstruct::{
    classify, reconstruct_project, Reconstruction, ReconstructionReport, StageChildKind,
};
