//! In-memory zip archive of downloaded record images.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::api::ApiResult;

/// Make a record title usable as a folder or file name.
///
/// Path separators, characters rejected by common filesystems and control
/// characters become `_`; leading/trailing dots and spaces are trimmed.
pub fn sanitize_name(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed != title {
        log::debug!("Sanitized name: {:?} -> {:?}", title, trimmed);
    }
    trimmed.to_string()
}

/// File name of the `index`-th (1-based) image of a record
pub fn image_file_name(folder: &str, index: usize) -> String {
    format!("{}_{}.jpg", folder, index)
}

/// Builds a zip with one folder per record
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    folders: HashSet<String>,
    file_count: usize,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            folders: HashSet::new(),
            file_count: 0,
        }
    }

    /// Reserve a unique folder name for a record and create it.
    ///
    /// Titles that sanitize to nothing fall back to `record_<id>`; a title
    /// already used by another record gets the id appended, then a counter
    /// until the name is free.
    pub fn add_folder(&mut self, title: &str, record_id: i64) -> ApiResult<String> {
        let mut name = sanitize_name(title);
        if name.is_empty() {
            name = format!("record_{}", record_id);
        }
        if self.folders.contains(&name) {
            let base = format!("{}_{}", name, record_id);
            name = base.clone();
            let mut n = 2;
            while self.folders.contains(&name) {
                name = format!("{}_{}", base, n);
                n += 1;
            }
        }
        self.writer.add_directory(format!("{}/", name), self.options)?;
        self.folders.insert(name.clone());
        Ok(name)
    }

    pub fn add_file(&mut self, folder: &str, file_name: &str, bytes: &[u8]) -> ApiResult<()> {
        self.writer
            .start_file(format!("{}/{}", folder, file_name), self.options)?;
        self.writer.write_all(bytes)?;
        self.file_count += 1;
        Ok(())
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    pub fn finish(self) -> ApiResult<Vec<u8>> {
        Ok(self.writer.finish()?.into_inner())
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_name("  sunset?  "), "sunset_");
        assert_eq!(sanitize_name("..hidden."), "hidden");
        assert_eq!(sanitize_name("line\nbreak"), "line_break");
        assert_eq!(sanitize_name("夕焼け"), "夕焼け");
    }

    #[test]
    fn test_folder_names_are_unique() {
        let mut builder = ArchiveBuilder::new();
        assert_eq!(builder.add_folder("Portrait", 1).unwrap(), "Portrait");
        assert_eq!(builder.add_folder("Portrait", 2).unwrap(), "Portrait_2");
        assert_eq!(builder.add_folder("...", 3).unwrap(), "record_3");
        assert_eq!(builder.folder_count(), 3);
    }

    #[test]
    fn test_suffixed_name_already_taken() {
        let mut builder = ArchiveBuilder::new();
        assert_eq!(builder.add_folder("Portrait_2", 9).unwrap(), "Portrait_2");
        assert_eq!(builder.add_folder("Portrait", 1).unwrap(), "Portrait");
        assert_eq!(builder.add_folder("Portrait", 2).unwrap(), "Portrait_2_2");
        assert_eq!(builder.add_folder("Portrait", 2).unwrap(), "Portrait_2_3");
        assert_eq!(builder.folder_count(), 4);

        let bytes = builder.finish().unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 4);
    }

    #[test]
    fn test_archive_contents() {
        let mut builder = ArchiveBuilder::new();
        let folder = builder.add_folder("Forest", 7).unwrap();
        builder
            .add_file(&folder, &image_file_name(&folder, 1), b"first")
            .unwrap();
        builder
            .add_file(&folder, &image_file_name(&folder, 2), b"second")
            .unwrap();
        assert_eq!(builder.file_count(), 2);

        let bytes = builder.finish().unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut contents = String::new();
        archive
            .by_name("Forest/Forest_2.jpg")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "second");
        assert!(archive.by_name("Forest/Forest_1.jpg").is_ok());
    }
}
