//! SAF data file access
//!
//! A `.saf` file is a flat blob; its [`Sah`] index says where each file
//! starts and how long it is. [`SafReader`] pulls single entries out of it
//! or extracts the whole tree into a directory.

use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{FormatError, Result};
use crate::sah::{Sah, SahEntry, SahFolder, join_path};

/// Characters that cannot appear in an extracted file or folder name
const INVALID_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Whether `name` can be used as a single path component on disk
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name
            .chars()
            .any(|c| c.is_control() || INVALID_NAME_CHARS.contains(&c))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Skip (and log) entries with unusable names instead of failing
    pub skip_invalid_names: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            skip_invalid_names: true,
        }
    }
}

/// Totals from a tree extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub files: usize,
    pub folders: usize,
    pub skipped: Vec<String>,
    pub bytes: u64,
}

/// Random access to the contents of a `.saf` data file
pub struct SafReader<R> {
    inner: R,
    len: u64,
}

impl SafReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> SafReader<R> {
    pub fn new(mut inner: R) -> Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        Ok(Self { inner, len })
    }

    /// Size of the data file in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read the bytes of one entry
    pub fn read_entry(&mut self, entry: &SahEntry) -> Result<Vec<u8>> {
        self.read_at(&entry.path, entry.offset, entry.length)
    }

    /// Write one entry into `dir` under its file name, returning the written path
    pub fn extract_file(&mut self, entry: &SahEntry, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let name = entry.path.rsplit('/').next().unwrap_or(&entry.path);
        if !is_valid_name(name) {
            return Err(FormatError::InvalidName(entry.path.clone()));
        }
        let bytes = self.read_entry(entry)?;
        fs::create_dir_all(dir.as_ref())?;
        let target = dir.as_ref().join(name);
        fs::write(&target, &bytes)?;
        debug!(path = %entry.path, bytes = bytes.len(), "extracted file");
        Ok(target)
    }

    /// Extract every file of `sah` into `dir`, recreating its folders
    pub fn extract_all(
        &mut self,
        sah: &Sah,
        dir: impl AsRef<Path>,
        options: ExtractOptions,
    ) -> Result<ExtractReport> {
        let mut report = ExtractReport::default();
        fs::create_dir_all(dir.as_ref())?;
        self.extract_folder(&sah.root, "", dir.as_ref(), options, &mut report)?;
        info!(
            files = report.files,
            folders = report.folders,
            skipped = report.skipped.len(),
            bytes = report.bytes,
            "extraction complete"
        );
        Ok(report)
    }

    fn extract_folder(
        &mut self,
        folder: &SahFolder,
        prefix: &str,
        dir: &Path,
        options: ExtractOptions,
        report: &mut ExtractReport,
    ) -> Result<()> {
        for file in &folder.files {
            let path = join_path(prefix, &file.name);
            if !self.check_name(&file.name, &path, options, report)? {
                continue;
            }
            let bytes = self.read_at(&path, file.offset, file.length)?;
            fs::write(dir.join(&file.name), &bytes)?;
            debug!(path = %path, bytes = bytes.len(), "extracted file");
            report.files += 1;
            report.bytes += bytes.len() as u64;
        }

        for sub in &folder.folders {
            let path = join_path(prefix, &sub.name);
            if !self.check_name(&sub.name, &path, options, report)? {
                continue;
            }
            let target = dir.join(&sub.name);
            fs::create_dir_all(&target)?;
            info!(folder = %path, files = sub.files.len(), "extracting folder");
            report.folders += 1;
            self.extract_folder(sub, &path, &target, options, report)?;
        }
        Ok(())
    }

    fn check_name(
        &self,
        name: &str,
        path: &str,
        options: ExtractOptions,
        report: &mut ExtractReport,
    ) -> Result<bool> {
        if is_valid_name(name) {
            return Ok(true);
        }
        if !options.skip_invalid_names {
            return Err(FormatError::InvalidName(path.to_string()));
        }
        warn!(path = %path, "skipping entry with invalid name");
        report.skipped.push(path.to_string());
        Ok(false)
    }

    fn read_at(&mut self, path: &str, offset: u64, length: u32) -> Result<Vec<u8>> {
        let length = u64::from(length);
        if offset.checked_add(length).is_none_or(|end| end > self.len) {
            return Err(FormatError::EntryOutOfBounds {
                path: path.to_string(),
                offset,
                length,
                archive_len: self.len,
            });
        }
        self.inner.seek(SeekFrom::Start(offset))?;
        let mut bytes = vec![0u8; length as usize];
        self.inner.read_exact(&mut bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// Index and data blob with one file per listed path, contents = path bytes
    fn archive(paths: &[&str]) -> (Sah, Vec<u8>) {
        let mut sah = Sah::new(0);
        let mut data = Vec::new();
        for path in paths {
            sah.insert(path, data.len() as u64, path.len() as u32).unwrap();
            data.extend_from_slice(path.as_bytes());
        }
        (sah, data)
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("item.sdata"));
        assert!(is_valid_name("Icon 01.dds"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name(".."));
        assert!(!is_valid_name("a?b"));
        assert!(!is_valid_name("tab\there"));
    }

    #[test]
    fn test_read_entry() {
        let (sah, data) = archive(&["a.txt", "dir/b.txt"]);
        let mut reader = SafReader::new(Cursor::new(data)).unwrap();
        assert_eq!(reader.len(), 14);

        let entry = sah.find("dir/b.txt").unwrap();
        assert_eq!(reader.read_entry(entry).unwrap(), b"dir/b.txt");
    }

    #[test]
    fn test_entry_out_of_bounds() {
        let (_, data) = archive(&["a.txt"]);
        let mut reader = SafReader::new(Cursor::new(data)).unwrap();
        let entry = SahEntry {
            path: "ghost.bin".to_string(),
            offset: 3,
            length: 10,
        };
        assert!(matches!(
            reader.read_entry(&entry),
            Err(FormatError::EntryOutOfBounds { archive_len: 5, .. })
        ));
    }

    #[test]
    fn test_extract_all_recreates_tree() {
        let (sah, data) = archive(&["root.txt", "data/item/item.sdata", "data/readme.txt"]);
        let mut reader = SafReader::new(Cursor::new(data)).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let report = reader
            .extract_all(&sah, dir.path(), ExtractOptions::default())
            .unwrap();
        assert_eq!(report.files, 3);
        assert_eq!(report.folders, 2);
        assert!(report.skipped.is_empty());

        let item = fs::read(dir.path().join("data").join("item").join("item.sdata")).unwrap();
        assert_eq!(item, b"data/item/item.sdata");
        assert_eq!(fs::read(dir.path().join("root.txt")).unwrap(), b"root.txt");
    }

    #[test]
    fn test_extract_all_skips_invalid_names() {
        let (sah, data) = archive(&["good.txt", "bad|name.txt"]);
        let dir = tempfile::tempdir().unwrap();

        let mut reader = SafReader::new(Cursor::new(data.clone())).unwrap();
        let report = reader
            .extract_all(&sah, dir.path(), ExtractOptions::default())
            .unwrap();
        assert_eq!(report.files, 1);
        assert_eq!(report.skipped, vec!["bad|name.txt".to_string()]);

        let mut strict = SafReader::new(Cursor::new(data)).unwrap();
        let err = strict
            .extract_all(
                &sah,
                dir.path(),
                ExtractOptions {
                    skip_invalid_names: false,
                },
            )
            .unwrap_err();
        assert!(matches!(err, FormatError::InvalidName(_)));
    }

    #[test]
    fn test_extract_single_file() {
        let (sah, data) = archive(&["world/2.wld"]);
        let mut reader = SafReader::new(Cursor::new(data)).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let written = reader
            .extract_file(sah.find("world/2.wld").unwrap(), dir.path())
            .unwrap();
        assert_eq!(written, dir.path().join("2.wld"));
        assert_eq!(fs::read(written).unwrap(), b"world/2.wld");
    }

    #[test]
    fn test_open_from_disk() {
        let (sah, data) = archive(&["x.bin"]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.saf");
        fs::write(&path, &data).unwrap();

        let mut reader = SafReader::open(&path).unwrap();
        assert_eq!(reader.read_entry(&sah.entries()[0]).unwrap(), b"x.bin");
    }
}
