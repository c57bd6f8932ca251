//! Office package (ZIP container) access
//!
//! Reads every entry of a DOCX/PPTX archive into memory so individual parts
//! can be swapped and the archive rewritten in the original entry order. Stored
//! entries stay stored; everything else is deflated.
//!
//! Declared entry sizes are never trusted: reads are capped by the expanded
//! size limit and stop as soon as it is exceeded.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::error::{DocumentError, Result};

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// Default ceiling on the total decompressed size of one package
pub const DEFAULT_MAX_EXPANDED_BYTES: u64 = 500 * 1024 * 1024;

/// In-memory office package
#[derive(Debug, Clone)]
pub struct OfficePackage {
    entries: Vec<PackageEntry>,
}

impl OfficePackage {
    /// Read all entries from archive bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_limited(data, DEFAULT_MAX_EXPANDED_BYTES)
    }

    /// Read all entries, failing once more than `max_expanded` bytes decompress
    pub fn from_bytes_limited(data: &[u8], max_expanded: u64) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut entries = Vec::with_capacity(archive.len());
        let mut expanded: u64 = 0;

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            let remaining = max_expanded.saturating_sub(expanded);

            let mut data = Vec::new();
            // One byte past the allowance tells an exact fit from an overflow
            (&mut file).take(remaining.saturating_add(1)).read_to_end(&mut data)?;
            if data.len() as u64 > remaining {
                return Err(DocumentError::ParseError(format!(
                    "package expands beyond {} bytes (at entry {})",
                    max_expanded,
                    file.name()
                )));
            }
            expanded += data.len() as u64;

            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        Ok(Self { entries })
    }

    /// Entry names in archive order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Contents of a part
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.data.as_slice())
    }

    /// Contents of a part that must exist
    pub fn require_part(&self, name: &str) -> Result<&[u8]> {
        self.part(name)
            .ok_or_else(|| DocumentError::MissingPart(name.to_string()))
    }

    /// Serialize, substituting the given parts
    pub fn to_bytes_with(&self, replacements: &[(&str, Vec<u8>)]) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for entry in &self.entries {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(method);
            if entry.is_dir {
                writer.add_directory(entry.name.as_str(), options)?;
                continue;
            }

            let data = replacements
                .iter()
                .find(|(name, _)| *name == entry.name)
                .map(|(_, data)| data.as_slice())
                .unwrap_or(entry.data.as_slice());

            writer.start_file(entry.name.as_str(), options)?;
            writer.write_all(data)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}
