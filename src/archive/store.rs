//! Archive store module
//!
//! Resolves identifiers to archives under the storage root and
//! rematerializes entry zero into a per-request working directory.

use super::error::ArchiveError;
use super::identifier::Identifier;
use crate::logger;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::result::ZipError;
use zip::ZipArchive;

const WORK_DIR_PREFIX: &str = "relay-";

/// Directory of single-entry archives named `<identifier>.<extension>`
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    root: PathBuf,
    work_dir: PathBuf,
    extension: String,
    max_entry_size: u64,
}

impl ArchiveStore {
    pub fn new(
        root: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
        extension: &str,
        max_entry_size: u64,
    ) -> Self {
        Self {
            root: root.into(),
            work_dir: work_dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
            max_entry_size,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the working directory and purge extraction directories left
    /// behind by a process that died before cleaning up.
    ///
    /// Returns the number of stale entries removed. Must run before the
    /// first request is accepted.
    pub fn prepare(&self) -> io::Result<usize> {
        fs::create_dir_all(&self.work_dir)?;

        let mut removed = 0;
        for entry in fs::read_dir(&self.work_dir)? {
            let entry = entry?;
            if !entry.file_name().to_string_lossy().starts_with(WORK_DIR_PREFIX) {
                continue;
            }

            let result = if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())
            } else {
                fs::remove_file(entry.path())
            };
            match result {
                Ok(()) => removed += 1,
                Err(e) => logger::log_warning(&format!(
                    "Failed to remove stale work entry '{}': {e}",
                    entry.path().display()
                )),
            }
        }

        Ok(removed)
    }

    pub fn archive_path(&self, id: &Identifier) -> PathBuf {
        self.root.join(format!("{id}.{}", self.extension))
    }

    /// Extract entry zero of the archive named by `id`.
    ///
    /// Blocking; call from `spawn_blocking` inside the runtime.
    pub fn extract_first(&self, id: &Identifier) -> Result<ExtractedFile, ArchiveError> {
        let path = self.archive_path(id);

        let file = File::open(&path).map_err(|e| ArchiveError::Open {
            path: path.clone(),
            source: ZipError::Io(e),
        })?;
        let mut archive = ZipArchive::new(file).map_err(|source| ArchiveError::Open {
            path: path.clone(),
            source,
        })?;

        if archive.is_empty() {
            return Err(ArchiveError::Empty(path));
        }

        let mut entry = archive.by_index(0).map_err(ArchiveError::Read)?;
        if entry.is_dir() {
            return Err(ArchiveError::UnsafeEntry(entry.name().to_string()));
        }

        // Only the base name is kept; entries pointing outside the archive are refused
        let file_name = entry
            .enclosed_name()
            .and_then(|p| p.file_name().map(entry_file_name))
            .ok_or_else(|| ArchiveError::UnsafeEntry(entry.name().to_string()))?;

        if entry.size() > self.max_entry_size {
            return Err(ArchiveError::TooLarge {
                name: file_name,
                size: entry.size(),
                limit: self.max_entry_size,
            });
        }

        fs::create_dir_all(&self.work_dir)?;
        ExtractedFile::write(&self.work_dir, file_name, &mut entry, self.max_entry_size)
    }
}

/// Base name of an entry as UTF-8, replacing invalid sequences
fn entry_file_name(name: &OsStr) -> String {
    match name.to_str() {
        Some(name) => name.to_string(),
        None => {
            let lossy = name.to_string_lossy().into_owned();
            logger::log_warning(&format!(
                "Entry name is not valid UTF-8, serving it as '{lossy}'"
            ));
            lossy
        }
    }
}

/// An archive entry written out to its own temporary directory.
///
/// Dropping the value removes the file and the directory, so every exit
/// path of a request cleans up after itself.
#[derive(Debug)]
pub struct ExtractedFile {
    dir: Option<TempDir>,
    path: PathBuf,
    file_name: String,
    size: u64,
}

impl ExtractedFile {
    fn write(
        work_dir: &Path,
        file_name: String,
        reader: &mut impl Read,
        limit: u64,
    ) -> Result<Self, ArchiveError> {
        let dir = tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir_in(work_dir)?;
        let path = dir.path().join(&file_name);

        let mut out = File::create(&path)?;
        // Declared sizes can lie, so the copy itself is bounded as well
        let size = io::copy(&mut reader.take(limit.saturating_add(1)), &mut out)?;
        if size > limit {
            return Err(ArchiveError::TooLarge {
                name: file_name,
                size,
                limit,
            });
        }
        out.sync_all()?;

        Ok(Self {
            dir: Some(dir),
            path,
            file_name,
            size,
        })
    }

    /// Base name of the archive entry
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Read the extracted bytes back
    pub fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }

    /// Remove the file now and report failures instead of swallowing them
    pub fn close(mut self) -> io::Result<()> {
        self.dir.take().map_or(Ok(()), TempDir::close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::identifier::{IdentifierPattern, DEFAULT_IDENTIFIER_PATTERN};
    use crate::archive::testing::{write_archive, write_raw};

    fn id(raw: &str) -> Identifier {
        let pattern = IdentifierPattern::new(DEFAULT_IDENTIFIER_PATTERN).unwrap();
        Identifier::parse(Some(raw), &pattern).unwrap()
    }

    fn store(root: &Path, work: &Path) -> ArchiveStore {
        ArchiveStore::new(root, work, "zip", 1024 * 1024)
    }

    fn work_dir_entries(work: &Path) -> usize {
        fs::read_dir(work).map(Iterator::count).unwrap_or(0)
    }

    #[test]
    fn test_archive_path() {
        let store = ArchiveStore::new("D", "/tmp", ".zip", 1);
        assert_eq!(store.archive_path(&id("abc123")), PathBuf::from("D/abc123.zip"));
    }

    #[test]
    fn test_prepare_purges_stale_work_dirs() {
        let work = tempfile::tempdir().unwrap();
        let stale = work.path().join("relay-stale");
        fs::create_dir(&stale).unwrap();
        fs::write(stale.join("game.mgz"), b"left over").unwrap();
        fs::write(work.path().join("relay-orphan"), b"x").unwrap();
        fs::write(work.path().join("keep.txt"), b"not ours").unwrap();

        let removed = ArchiveStore::new("D", work.path(), "zip", 1).prepare().unwrap();
        assert_eq!(removed, 2);
        assert!(!stale.exists());
        assert!(!work.path().join("relay-orphan").exists());
        assert!(work.path().join("keep.txt").exists());
    }

    #[test]
    fn test_prepare_creates_missing_work_dir() {
        let base = tempfile::tempdir().unwrap();
        let work = base.path().join("nested/work");
        let removed = ArchiveStore::new("D", &work, "zip", 1).prepare().unwrap();
        assert_eq!(removed, 0);
        assert!(work.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_entry_name_is_replaced() {
        use std::os::unix::ffi::OsStrExt;

        let name = OsStr::from_bytes(b"game\xff.mgz");
        assert_eq!(entry_file_name(name), "game\u{fffd}.mgz");
        assert_eq!(entry_file_name(OsStr::new("plain.mgz")), "plain.mgz");
    }

    #[test]
    fn test_extract_first_entry() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        write_archive(root.path(), "abc123", &[("report.txt", b"hello archive")]);

        let extracted = store(root.path(), work.path())
            .extract_first(&id("abc123"))
            .unwrap();
        assert_eq!(extracted.file_name(), "report.txt");
        assert_eq!(extracted.size(), 13);
        assert_eq!(extracted.read().unwrap(), b"hello archive");
        assert!(extracted.path().starts_with(work.path()));

        let path = extracted.path().to_path_buf();
        extracted.close().unwrap();
        assert!(!path.exists());
        assert_eq!(work_dir_entries(work.path()), 0);
    }

    #[test]
    fn test_drop_removes_file() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        write_archive(root.path(), "abc123", &[("a.bin", &[1, 2, 3])]);

        let extracted = store(root.path(), work.path())
            .extract_first(&id("abc123"))
            .unwrap();
        let path = extracted.path().to_path_buf();
        assert!(path.exists());
        drop(extracted);
        assert!(!path.exists());
    }

    #[test]
    fn test_nested_entry_uses_base_name() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        write_archive(root.path(), "nested", &[("replays/game.mgz", b"rec")]);

        let extracted = store(root.path(), work.path())
            .extract_first(&id("nested"))
            .unwrap();
        assert_eq!(extracted.file_name(), "game.mgz");
        assert_eq!(extracted.path().parent(), extracted.dir.as_ref().map(TempDir::path));
    }

    #[test]
    fn test_only_first_entry_is_served() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        write_archive(
            root.path(),
            "multi",
            &[("first.txt", b"one"), ("second.txt", b"two")],
        );

        let extracted = store(root.path(), work.path())
            .extract_first(&id("multi"))
            .unwrap();
        assert_eq!(extracted.file_name(), "first.txt");
        assert_eq!(extracted.read().unwrap(), b"one");
    }

    #[test]
    fn test_missing_archive() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let err = store(root.path(), work.path())
            .extract_first(&id("missing"))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Open { .. }));
    }

    #[test]
    fn test_not_a_zip() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        write_raw(root.path(), "garbage", b"this is not a zip file");
        let err = store(root.path(), work.path())
            .extract_first(&id("garbage"))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Open { .. }));
    }

    #[test]
    fn test_empty_archive() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        write_archive(root.path(), "empty", &[]);
        let err = store(root.path(), work.path())
            .extract_first(&id("empty"))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Empty(_)));
    }

    #[test]
    fn test_directory_entry_is_refused() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        write_archive(root.path(), "dironly", &[("folder/", b"")]);
        let err = store(root.path(), work.path())
            .extract_first(&id("dironly"))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::UnsafeEntry(_)));
        assert_eq!(work_dir_entries(work.path()), 0);
    }

    #[test]
    fn test_traversal_entry_is_refused() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        write_archive(root.path(), "evil", &[("../../escape.txt", b"x")]);
        let err = store(root.path(), work.path())
            .extract_first(&id("evil"))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::UnsafeEntry(_)));
        assert_eq!(work_dir_entries(work.path()), 0);
    }

    #[test]
    fn test_oversized_entry_is_refused_and_cleaned_up() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        write_archive(root.path(), "big", &[("big.bin", &[7u8; 64])]);
        let err = ArchiveStore::new(root.path(), work.path(), "zip", 16)
            .extract_first(&id("big"))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::TooLarge { limit: 16, .. }));
        assert_eq!(work_dir_entries(work.path()), 0);
    }

    #[test]
    fn test_bounded_copy_cleans_up() {
        let work = tempfile::tempdir().unwrap();
        let mut reader: &[u8] = &[0u8; 32];
        let err = ExtractedFile::write(work.path(), "x.bin".to_string(), &mut reader, 8)
            .unwrap_err();
        assert!(matches!(err, ArchiveError::TooLarge { size: 9, .. }));
        assert_eq!(work_dir_entries(work.path()), 0);
    }

    #[test]
    fn test_same_identifier_gets_distinct_paths() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        write_archive(root.path(), "shared", &[("same.txt", b"payload")]);
        let store = store(root.path(), work.path());

        let first = store.extract_first(&id("shared")).unwrap();
        let second = store.extract_first(&id("shared")).unwrap();
        assert_ne!(first.path(), second.path());

        let second_path = second.path().to_path_buf();
        first.close().unwrap();
        assert_eq!(fs::read(&second_path).unwrap(), b"payload");
    }

    #[test]
    fn test_work_dir_is_created() {
        let root = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let nested = work.path().join("a").join("b");
        write_archive(root.path(), "abc", &[("f.txt", b"f")]);

        let extracted = store(root.path(), &nested)
            .extract_first(&id("abc"))
            .unwrap();
        assert!(extracted.path().starts_with(&nested));
    }
}
