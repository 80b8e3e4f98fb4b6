//! `.sb2` container handling.
//!
//! An `.sb2` file is a plain ZIP archive: one `project.json` document entry
//! plus binary asset entries. The whole container is decoded into memory so
//! a single entry can be replaced and everything else carried through
//! untouched.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Error cases for container decode/encode.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The bytes are not a readable ZIP container.
    #[error("failed to decode archive: {0}")]
    Decode(#[from] zip::result::ZipError),

    /// The container lacks the requested entry.
    #[error("archive has no `{0}` entry")]
    MissingEntry(String),

    /// An entry could not be read or written.
    #[error("archive i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// An opened project archive, fully decoded into memory.
///
/// Entry order is preserved from the source so the rewritten container keeps
/// the original layout.
#[derive(Debug, Clone)]
pub struct ProjectArchive {
    entries: Vec<ArchiveEntry>,
}

#[derive(Debug, Clone)]
struct ArchiveEntry {
    name: String,
    data: Vec<u8>,
}

impl ProjectArchive {
    /// Decode a container from raw bytes. Directory entries are skipped.
    pub fn open(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(zip.len());

        for index in 0..zip.len() {
            let mut file = zip.by_index(index)?;
            if file.is_dir() {
                continue;
            }

            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(ArchiveEntry {
                name: file.name().to_string(),
                data,
            });
        }

        Ok(Self { entries })
    }

    /// Borrow the bytes of a named entry.
    pub fn entry(&self, name: &str) -> Result<&[u8], ArchiveError> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.data.as_slice())
            .ok_or_else(|| ArchiveError::MissingEntry(name.to_string()))
    }

    /// Replace a named entry in place, or append it if the container has none.
    pub fn replace_entry(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(ArchiveEntry {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Entry names in container order.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Re-encode the container to bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ArchiveError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in &self.entries {
            writer.start_file(entry.name.as_str(), options)?;
            writer.write_all(&entry.data)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}
