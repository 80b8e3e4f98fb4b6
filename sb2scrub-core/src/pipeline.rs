//! The validate pipeline: archive in, sanitized archive out.
//!
//! Linear, one attempt per step: read → decode container → parse document →
//! reconstruct → serialize → re-encode container → write. Any failing step
//! aborts the invocation; the only locally recovered condition is an unknown
//! stage child, which reconstruction drops and counts.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::archive::{ArchiveError, ProjectArchive};
use crate::reconstruct::{reconstruct_project, Reconstruction, ReconstructionReport};

/// Conventional name of the document entry inside a project archive.
pub const PROJECT_ENTRY: &str = "project.json";

/// Prefix for output file names.
pub const OUTPUT_PREFIX: &str = "validated_";

/// Configuration for a validate run.
#[derive(Debug, Clone)]
pub struct ValidateConfig {
    /// Name of the document entry to sanitize (default: `project.json`).
    pub entry_name: String,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            entry_name: PROJECT_ENTRY.to_string(),
        }
    }
}

/// Error cases for a single validate invocation.
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("document entry is not valid JSON: {0}")]
    DocumentSyntax(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What a successful validate run produced.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Path of the rewritten archive.
    pub output: PathBuf,

    /// Counters from the reconstruction pass.
    pub report: ReconstructionReport,
}

/// Output path for a source archive: the file name prefixed with
/// `validated_`, in the same directory.
pub fn validated_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    input.with_file_name(format!("{OUTPUT_PREFIX}{name}"))
}

/// Decode an archive and reconstruct its document in memory, without writing
/// anything.
pub fn inspect_bytes(bytes: &[u8], config: &ValidateConfig) -> Result<Reconstruction, ValidateError> {
    let archive = ProjectArchive::open(bytes)?;
    let document: Value = serde_json::from_slice(archive.entry(&config.entry_name)?)?;
    Ok(reconstruct_project(&document))
}

/// Run the pipeline on in-memory archive bytes.
///
/// Returns the rewritten archive bytes plus the reconstruction report. All
/// non-document entries carry their original bytes.
pub fn validate_bytes(
    bytes: &[u8],
    config: &ValidateConfig,
) -> Result<(Vec<u8>, ReconstructionReport), ValidateError> {
    let mut archive = ProjectArchive::open(bytes)?;

    let document: Value = serde_json::from_slice(archive.entry(&config.entry_name)?)?;
    let Reconstruction { document, report } = reconstruct_project(&document);

    let serialized = serde_json::to_string_pretty(&document)?;
    archive.replace_entry(&config.entry_name, serialized.into_bytes());

    Ok((archive.encode()?, report))
}

/// Run the full pipeline against the filesystem.
///
/// Reads `input`, sanitizes its document entry, and writes the rewritten
/// archive next to the source with a `validated_` name prefix. No output is
/// written if any earlier step fails.
pub fn validate_file(input: &Path, config: &ValidateConfig) -> Result<ValidationOutcome, ValidateError> {
    tracing::info!(input = %input.display(), "validating project archive");

    let bytes = std::fs::read(input).map_err(|source| ValidateError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let (encoded, report) = validate_bytes(&bytes, config)?;

    let output = validated_path(input);
    std::fs::write(&output, encoded).map_err(|source| ValidateError::Write {
        path: output.clone(),
        source,
    })?;

    tracing::info!(
        output = %output.display(),
        dropped = report.dropped_children,
        "wrote sanitized archive"
    );

    Ok(ValidationOutcome { output, report })
}
