//! SAH archive index (.sah)
//!
//! The index describes where every file of the companion `.saf` data file
//! lives. Folder nodes nest arbitrarily deep, so the tree is walked here and
//! each node's flat part (name and files) goes through the record codec.
//!
//! # Layout
//! ```text
//! signature     char[3]  "SAH"
//! format        i32
//! file_count    i32      total files in the tree
//! reserved      40 bytes  kept as-is
//! root folder:
//!   name          i32-prefixed Latin-1, NUL-terminated (empty for the root)
//!   file_count    i32
//!   files[]:      name (as above), offset u64, length u32, version i32
//!   folder_count  i32
//!   folders[]     (same layout, recursively)
//! footer        8 bytes   kept as-is
//! ```

use std::sync::OnceLock;

use hashbrown::HashMap;
use relic_codec::{
    CompositeValue, Cursor, FieldSchema, LengthWidth, PrimitiveType, Record, RecordSchema, SchemaCell,
    TextEncoding, TextFormat, Terminator, Version,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::asset::Asset;
use crate::common::RawBytes;
use crate::error::{FormatError, Result};

pub const SAH_SIGNATURE: &str = "SAH";

pub const RESERVED_LEN: usize = 40;
pub const FOOTER_LEN: usize = 8;

/// Deepest folder nesting accepted when reading or writing
pub const MAX_FOLDER_DEPTH: usize = 64;

const NAME_FORMAT: TextFormat = TextFormat::new(TextEncoding::Latin1, Terminator::Included);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SahHeader {
    pub signature: String,
    pub format: i32,
    pub file_count: i32,
    pub reserved: RawBytes<RESERVED_LEN>,
}

impl Default for SahHeader {
    fn default() -> Self {
        Self {
            signature: SAH_SIGNATURE.to_string(),
            format: 0,
            file_count: 0,
            reserved: RawBytes::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SahFolder {
    pub name: String,
    pub files: Vec<SahFile>,
    pub folders: Vec<SahFolder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SahFile {
    pub name: String,
    /// Byte offset in the `.saf` data file
    pub offset: u64,
    pub length: u32,
    pub version: i32,
}

/// A file together with its full path inside the archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SahEntry {
    /// Folder names and file name joined with `/`
    pub path: String,
    pub offset: u64,
    pub length: u32,
}

/// Parsed archive index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sah {
    pub header: SahHeader,
    pub root: SahFolder,
    pub footer: RawBytes<FOOTER_LEN>,

    // Built lazily on first lookup
    #[serde(skip)]
    index: OnceLock<HashMap<String, SahEntry>>,
}

impl PartialEq for Sah {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header && self.root == other.root && self.footer == other.footer
    }
}

impl Sah {
    pub fn new(format: i32) -> Self {
        Self {
            header: SahHeader {
                format,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Add a file at `path`, creating intermediate folders
    pub fn insert(&mut self, path: &str, offset: u64, length: u32) -> Result<()> {
        let mut parts: Vec<&str> = path.split(['/', '\\']).filter(|p| !p.is_empty()).collect();
        let name = parts
            .pop()
            .ok_or_else(|| FormatError::InvalidName(path.to_string()))?;

        let mut folder = &mut self.root;
        for part in parts {
            let index = match folder.folders.iter().position(|f| f.name.eq_ignore_ascii_case(part)) {
                Some(index) => index,
                None => {
                    folder.folders.push(SahFolder {
                        name: part.to_string(),
                        ..Default::default()
                    });
                    folder.folders.len() - 1
                }
            };
            folder = &mut folder.folders[index];
        }

        folder.files.push(SahFile {
            name: name.to_string(),
            offset,
            length,
            version: 0,
        });
        self.header.file_count = self.header.file_count.saturating_add(1);
        self.index = OnceLock::new();
        Ok(())
    }

    pub fn file_count(&self) -> usize {
        self.root.file_count()
    }

    /// Folders below the root
    pub fn folder_count(&self) -> usize {
        self.root.folder_count()
    }

    /// Every file in depth-first order, folder files before subfolders
    pub fn entries(&self) -> Vec<SahEntry> {
        let mut entries = Vec::with_capacity(self.file_count());
        collect_entries(&self.root, "", &mut entries);
        entries
    }

    /// Look up a file by path (case-insensitive, `/` or `\` separators)
    pub fn find(&self, path: &str) -> Option<&SahEntry> {
        let index = self.index.get_or_init(|| {
            self.entries()
                .into_iter()
                .map(|entry| (normalize_path(&entry.path), entry))
                .collect()
        });
        index.get(&normalize_path(path))
    }
}

impl SahFolder {
    pub fn file_count(&self) -> usize {
        self.files.len() + self.folders.iter().map(SahFolder::file_count).sum::<usize>()
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len() + self.folders.iter().map(SahFolder::folder_count).sum::<usize>()
    }
}

/// Lowercase, forward slashes, no leading or trailing separator
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').to_ascii_lowercase()
}

/// Archive path of `name` inside the folder at `parent`
pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

fn collect_entries(folder: &SahFolder, prefix: &str, out: &mut Vec<SahEntry>) {
    for file in &folder.files {
        out.push(SahEntry {
            path: join_path(prefix, &file.name),
            offset: file.offset,
            length: file.length,
        });
    }
    for sub in &folder.folders {
        collect_entries(sub, &join_path(prefix, &sub.name), out);
    }
}

// ============================================================================
// Record schemas
// ============================================================================

impl Record for SahHeader {
    fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
        static SCHEMA: SchemaCell<SahHeader> = SchemaCell::new();
        SCHEMA.get_or_define(|| {
            RecordSchema::define([
                FieldSchema::fixed_string(
                    "signature",
                    3,
                    TextFormat::ascii(),
                    |h: &SahHeader| &h.signature,
                    |h| &mut h.signature,
                ),
                FieldSchema::scalar("format", |h: &SahHeader| &h.format, |h| &mut h.format),
                FieldSchema::scalar("file_count", |h: &SahHeader| &h.file_count, |h| {
                    &mut h.file_count
                }),
                FieldSchema::composite("reserved", |h: &SahHeader| &h.reserved, |h| {
                    &mut h.reserved
                }),
            ])
        })
    }
}

/// Covers a folder's own name and files; subfolders are walked by hand
impl Record for SahFolder {
    fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
        static SCHEMA: SchemaCell<SahFolder> = SchemaCell::new();
        SCHEMA.get_or_define(|| {
            RecordSchema::define([
                FieldSchema::prefixed_string(
                    "name",
                    PrimitiveType::I32,
                    NAME_FORMAT,
                    |f: &SahFolder| &f.name,
                    |f| &mut f.name,
                ),
                FieldSchema::prefixed_list(
                    "files",
                    PrimitiveType::I32,
                    |f: &SahFolder| &f.files,
                    |f| &mut f.files,
                ),
            ])
        })
    }
}

impl Record for SahFile {
    fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
        static SCHEMA: SchemaCell<SahFile> = SchemaCell::new();
        SCHEMA.get_or_define(|| {
            RecordSchema::define([
                FieldSchema::prefixed_string(
                    "name",
                    PrimitiveType::I32,
                    NAME_FORMAT,
                    |f: &SahFile| &f.name,
                    |f| &mut f.name,
                ),
                FieldSchema::scalar("offset", |f: &SahFile| &f.offset, |f| &mut f.offset),
                FieldSchema::scalar("length", |f: &SahFile| &f.length, |f| &mut f.length),
                FieldSchema::scalar("version", |f: &SahFile| &f.version, |f| &mut f.version),
            ])
        })
    }
}

// ============================================================================
// Folder tree
// ============================================================================

fn read_folder(cursor: &mut Cursor<'_>, version: Version, path: &str, depth: usize) -> Result<SahFolder> {
    if depth > MAX_FOLDER_DEPTH {
        return Err(FormatError::FolderTooDeep {
            path: path.into(),
            limit: MAX_FOLDER_DEPTH,
        });
    }

    let mut folder = SahFolder::default();
    relic_codec::decode_into(SahFolder::schema()?, &mut folder, cursor, version)?;

    let count = LengthWidth::I32.read(cursor)?;
    let here = join_path(path, &folder.name);
    debug!(folder = %here, files = folder.files.len(), subfolders = count, "read folder");

    // Each subfolder needs at least its name prefix, file count and folder count
    let mut folders = Vec::with_capacity(count.min(cursor.remaining() / 12));
    for _ in 0..count {
        folders.push(read_folder(cursor, version, &here, depth + 1)?);
    }
    folder.folders = folders;
    Ok(folder)
}

fn write_folder(folder: &SahFolder, out: &mut Vec<u8>, version: Version, path: &str, depth: usize) -> Result<()> {
    if depth > MAX_FOLDER_DEPTH {
        return Err(FormatError::FolderTooDeep {
            path: path.into(),
            limit: MAX_FOLDER_DEPTH,
        });
    }

    relic_codec::encode_into(SahFolder::schema()?, folder, out, version)?;
    LengthWidth::I32.write(folder.folders.len(), out)?;

    let here = join_path(path, &folder.name);
    for sub in &folder.folders {
        write_folder(sub, out, version, &here, depth + 1)?;
    }
    Ok(())
}

impl Asset for Sah {
    const EXTENSION: &'static str = "sah";

    fn from_bytes(bytes: &[u8], version: Version) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let header: SahHeader = relic_codec::decode(&mut cursor, version)?;
        if header.signature != SAH_SIGNATURE {
            return Err(FormatError::BadSignature {
                expected: SAH_SIGNATURE.to_string(),
                found: header.signature,
            });
        }
        let root = read_folder(&mut cursor, version, "", 0)?;
        let footer = RawBytes::decode_self(&mut cursor).map_err(|e| e.in_field("footer"))?;
        let sah = Sah {
            header,
            root,
            footer,
            index: OnceLock::new(),
        };

        let files = sah.file_count();
        if usize::try_from(sah.header.file_count).ok() != Some(files) {
            tracing::warn!(
                header = sah.header.file_count,
                actual = files,
                "file count in header does not match the folder tree"
            );
        }
        debug!(files, folders = sah.folder_count(), trailing = cursor.remaining(), "read archive index");
        Ok(sah)
    }

    fn to_bytes(&self, version: Version) -> Result<Vec<u8>> {
        let mut out = relic_codec::encode(&self.header, version)?;
        write_folder(&self.root, &mut out, version, "", 0)?;
        self.footer.encode_self(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sah() -> Sah {
        let mut sah = Sah::new(1);
        sah.insert("data/item/item.sdata", 0, 120).unwrap();
        sah.insert("data/item/ItemIcon.dds", 120, 64).unwrap();
        sah.insert("world/2.wld", 184, 300).unwrap();
        sah.insert("readme.txt", 484, 10).unwrap();
        sah
    }

    #[test]
    fn test_insert_builds_tree() {
        let sah = sample_sah();
        assert_eq!(sah.file_count(), 4);
        assert_eq!(sah.header.file_count, 4);
        // data, data/item, world
        assert_eq!(sah.folder_count(), 3);
        assert_eq!(sah.root.files[0].name, "readme.txt");
    }

    #[test]
    fn test_sah_round_trip() {
        let sah = sample_sah();
        let bytes = sah.to_bytes(Version::Unknown).unwrap();
        assert_eq!(&bytes[0..3], b"SAH");

        let decoded = Sah::from_bytes(&bytes, Version::Unknown).unwrap();
        assert_eq!(decoded, sah);
        assert_eq!(decoded.to_bytes(Version::Unknown).unwrap(), bytes);
    }

    #[test]
    fn test_reserved_and_footer_survive_round_trip() {
        let mut bytes = Sah::new(1).to_bytes(Version::Unknown).unwrap();
        // Inside the reserved region, then the last footer byte
        bytes[20] = 0x5A;
        let last = bytes.len() - 1;
        bytes[last] = 0x7E;

        let decoded = Sah::from_bytes(&bytes, Version::Unknown).unwrap();
        assert_eq!(decoded.header.reserved.0[20 - 11], 0x5A);
        assert_eq!(decoded.footer.0[FOOTER_LEN - 1], 0x7E);
        assert_eq!(decoded.to_bytes(Version::Unknown).unwrap(), bytes);
    }

    #[test]
    fn test_missing_footer_is_truncated() {
        let bytes = Sah::new(0).to_bytes(Version::Unknown).unwrap();
        let err = Sah::from_bytes(&bytes[..bytes.len() - 1], Version::Unknown).unwrap_err();
        assert!(err.codec().is_some_and(|e| e.is_truncated()));
        assert!(err.to_string().starts_with("field `footer`"));
    }

    #[test]
    fn test_empty_index_layout() {
        let bytes = Sah::new(0).to_bytes(Version::Unknown).unwrap();
        // header 11 + reserved 40 + root (name 4+1, files 4, folders 4) + footer 8
        assert_eq!(bytes.len(), 11 + 40 + 13 + 8);
    }

    #[test]
    fn test_entries_have_full_paths() {
        let paths: Vec<String> = sample_sah().entries().into_iter().map(|e| e.path).collect();
        assert_eq!(
            paths,
            vec![
                "readme.txt",
                "data/item/item.sdata",
                "data/item/ItemIcon.dds",
                "world/2.wld"
            ]
        );
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let sah = sample_sah();
        let entry = sah.find("DATA\\Item\\itemicon.dds").unwrap();
        assert_eq!(entry.offset, 120);
        assert_eq!(entry.length, 64);
        assert!(sah.find("data/item").is_none());
        assert!(sah.find("missing.txt").is_none());
    }

    #[test]
    fn test_insert_invalidates_lookup() {
        let mut sah = sample_sah();
        assert!(sah.find("new.txt").is_none());
        sah.insert("new.txt", 500, 1).unwrap();
        assert!(sah.find("new.txt").is_some());
        assert!(sah.insert("/", 0, 0).is_err());
    }

    #[test]
    fn test_bad_signature() {
        let mut bytes = sample_sah().to_bytes(Version::Unknown).unwrap();
        bytes[0..3].copy_from_slice(b"SAF");
        assert!(matches!(
            Sah::from_bytes(&bytes, Version::Unknown),
            Err(FormatError::BadSignature { .. })
        ));
    }

    #[test]
    fn test_truncated_tree() {
        let bytes = sample_sah().to_bytes(Version::Unknown).unwrap();
        // Drop the footer and the last folder count
        let err = Sah::from_bytes(&bytes[..bytes.len() - 12], Version::Unknown).unwrap_err();
        assert!(err.codec().is_some_and(|e| e.is_truncated()));
    }

    #[test]
    fn test_folder_depth_limit() {
        let mut path = String::new();
        for _ in 0..=MAX_FOLDER_DEPTH {
            path.push_str("d/");
        }
        path.push_str("f.txt");

        let mut sah = Sah::new(0);
        sah.insert(&path, 0, 0).unwrap();
        assert!(matches!(
            sah.to_bytes(Version::Unknown),
            Err(FormatError::FolderTooDeep { .. })
        ));
    }
}
