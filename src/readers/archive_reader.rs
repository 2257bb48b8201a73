use crate::error::{LoadError, Result};
use crate::models::Dataset;
use crate::readers::DatasetReader;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// Reads every `.csv` member of a zip archive and concatenates them, in
/// member-name order. Per-station exports ship this way.
pub struct ArchiveReader {
    reader: DatasetReader,
}

impl ArchiveReader {
    pub fn new(reader: DatasetReader) -> Self {
        Self { reader }
    }

    pub fn read_archive(&self, zip_path: &Path) -> Result<Dataset> {
        let members = self.list_csv_members(zip_path)?;
        if members.is_empty() {
            return Err(LoadError::EmptyArchive {
                path: zip_path.to_path_buf(),
            }
            .into());
        }

        let file = File::open(zip_path)?;
        let mut archive = ZipArchive::new(file)?;
        let mut parts = Vec::with_capacity(members.len());

        for name in &members {
            let mut zip_file = archive.by_name(name)?;
            let mut bytes = Vec::with_capacity(zip_file.size() as usize);
            zip_file.read_to_end(&mut bytes)?;

            let source = zip_path.join(name);
            let part = self.reader.parse_bytes(&bytes, &source)?;
            debug!(member = %name, records = part.len(), "read archive member");
            parts.push(part);
        }

        Ok(Dataset::concat(parts))
    }

    /// CSV member names, sorted.
    pub fn list_csv_members(&self, zip_path: &Path) -> Result<Vec<String>> {
        let file = File::open(zip_path)?;
        let mut archive = ZipArchive::new(file).map_err(|source| LoadError::CorruptArchive {
            path: zip_path.to_path_buf(),
            source,
        })?;
        let mut names = Vec::new();

        for i in 0..archive.len() {
            let zip_file = archive.by_index(i)?;
            if zip_file.is_dir() {
                continue;
            }

            let name = zip_file.name().to_string();
            let is_csv = PathBuf::from(&name)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

            // macOS archivers add resource forks under __MACOSX/
            if is_csv && !name.starts_with("__MACOSX") {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }
}
