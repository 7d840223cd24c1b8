use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::error::{FileError, FileResult};
use super::{PAGE_SIZE, PageId};

/// A database file viewed as a flat array of fixed-size pages.
///
/// Page `n` occupies bytes `[n * PAGE_SIZE, (n + 1) * PAGE_SIZE)`.
#[derive(Debug)]
pub struct DiskFile {
    file: File,
    path: PathBuf,
}

impl DiskFile {
    /// Open a database file for reading and writing, creating it if missing
    pub fn open<P: AsRef<Path>>(path: P) -> FileResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        Ok(Self { file, path })
    }

    /// Path this file was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length of the file in bytes
    pub fn len(&self) -> FileResult<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Check if the file holds no pages
    pub fn is_empty(&self) -> FileResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Get the number of whole pages in the file.
    ///
    /// A length that is not a multiple of the page size means a torn or
    /// foreign file and is rejected.
    pub fn page_count(&self) -> FileResult<usize> {
        let len = self.len()?;
        if len % PAGE_SIZE as u64 != 0 {
            return Err(FileError::CorruptFile { len });
        }
        Ok((len / PAGE_SIZE as u64) as usize)
    }

    /// Read a page from the file
    pub fn read_page(&mut self, page_id: PageId, buffer: &mut [u8]) -> FileResult<()> {
        if buffer.len() != PAGE_SIZE {
            return Err(FileError::InvalidPageSize {
                expected: PAGE_SIZE,
                actual: buffer.len(),
            });
        }

        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        self.file.read_exact(buffer)?;
        Ok(())
    }

    /// Write a page to the file, extending it if necessary
    pub fn write_page(&mut self, page_id: PageId, buffer: &[u8]) -> FileResult<()> {
        if buffer.len() != PAGE_SIZE {
            return Err(FileError::InvalidPageSize {
                expected: PAGE_SIZE,
                actual: buffer.len(),
            });
        }

        self.file.seek(SeekFrom::Start(Self::offset(page_id)))?;
        self.file.write_all(buffer)?;
        Ok(())
    }

    /// Sync the file to disk (flush all OS buffers)
    pub fn sync(&mut self) -> FileResult<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn offset(page_id: PageId) -> u64 {
        u64::from(page_id) * PAGE_SIZE as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_open_creates_file() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("test.db");

        let disk = DiskFile::open(&test_file).unwrap();
        assert!(test_file.exists());
        assert!(disk.is_empty().unwrap());
        assert_eq!(disk.page_count().unwrap(), 0);
        assert_eq!(disk.path(), test_file.as_path());
    }

    #[test]
    fn test_open_does_not_truncate() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("test.db");
        std::fs::write(&test_file, vec![7u8; PAGE_SIZE * 2]).unwrap();

        let disk = DiskFile::open(&test_file).unwrap();
        assert_eq!(disk.page_count().unwrap(), 2);
    }

    #[test]
    fn test_read_write_page() {
        let temp_dir = setup_test_dir();
        let mut disk = DiskFile::open(temp_dir.path().join("test.db")).unwrap();

        let mut write_buffer = vec![0u8; PAGE_SIZE];
        write_buffer[0] = 42;
        write_buffer[100] = 99;
        write_buffer[PAGE_SIZE - 1] = 255;
        disk.write_page(0, &write_buffer).unwrap();

        let mut read_buffer = vec![0u8; PAGE_SIZE];
        disk.read_page(0, &mut read_buffer).unwrap();
        assert_eq!(read_buffer, write_buffer);
    }

    #[test]
    fn test_write_extends_file() {
        let temp_dir = setup_test_dir();
        let mut disk = DiskFile::open(temp_dir.path().join("test.db")).unwrap();

        let buffer = vec![1u8; PAGE_SIZE];
        disk.write_page(0, &buffer).unwrap();
        assert_eq!(disk.page_count().unwrap(), 1);

        disk.write_page(3, &buffer).unwrap();
        assert_eq!(disk.page_count().unwrap(), 4);
        assert_eq!(disk.len().unwrap(), 4 * PAGE_SIZE as u64);
    }

    #[test]
    fn test_corrupt_length() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("test.db");
        std::fs::write(&test_file, vec![0u8; PAGE_SIZE + 17]).unwrap();

        let disk = DiskFile::open(&test_file).unwrap();
        let result = disk.page_count();
        assert!(matches!(
            result,
            Err(FileError::CorruptFile { len }) if len == PAGE_SIZE as u64 + 17
        ));
    }

    #[test]
    fn test_read_past_end_fails() {
        let temp_dir = setup_test_dir();
        let mut disk = DiskFile::open(temp_dir.path().join("test.db")).unwrap();

        let mut buffer = vec![0u8; PAGE_SIZE];
        let result = disk.read_page(5, &mut buffer);
        assert!(matches!(result, Err(FileError::Io(_))));
    }

    #[test]
    fn test_invalid_buffer_size() {
        let temp_dir = setup_test_dir();
        let mut disk = DiskFile::open(temp_dir.path().join("test.db")).unwrap();

        let mut small_buffer = vec![0u8; PAGE_SIZE - 1];
        let result = disk.read_page(0, &mut small_buffer);
        assert!(matches!(result, Err(FileError::InvalidPageSize { .. })));

        let large_buffer = vec![0u8; PAGE_SIZE + 1];
        let result = disk.write_page(0, &large_buffer);
        assert!(matches!(result, Err(FileError::InvalidPageSize { .. })));
    }
}
