use ahash::AHashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use super::disk::DiskFile;
use super::error::{FileError, FileResult};
use super::{PAGE_SIZE, Page, PageId, TABLE_MAX_PAGES};

/// Page cache sitting between the B+ tree and the database file.
///
/// Pages are loaded on first access and stay cached until [`Pager::close`],
/// which writes every cached page back exactly once. Page numbers are handed
/// out by bumping a high-water mark; pages are never freed or reused.
pub struct Pager {
    /// Underlying database file
    disk: DiskFile,
    /// Cached pages keyed by page number
    pages: AHashMap<PageId, Box<Page>>,
    /// Number of pages the database spans, persisted or not
    num_pages: usize,
    /// Number of pages present in the file when it was opened
    file_pages: usize,
}

impl Pager {
    /// Open (or create) the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> FileResult<Self> {
        let disk = DiskFile::open(path)?;
        let file_pages = disk.page_count()?;

        tracing::info!(
            "Opened database file {} ({} pages)",
            disk.path().display(),
            file_pages
        );

        Ok(Self {
            disk,
            pages: AHashMap::new(),
            num_pages: file_pages,
            file_pages,
        })
    }

    /// Total number of pages in the database, including unflushed new pages
    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    /// Get a page, loading it from disk if necessary
    pub fn get_page(&mut self, page_id: PageId) -> FileResult<&Page> {
        let page = self.cached_entry(page_id)?;
        Ok(&**page)
    }

    /// Get a mutable reference to a page, loading it if necessary
    pub fn get_page_mut(&mut self, page_id: PageId) -> FileResult<&mut Page> {
        let page = self.cached_entry(page_id)?;
        Ok(&mut **page)
    }

    /// Page number the next brand-new page should use.
    ///
    /// The page only becomes part of the database once it is fetched.
    pub fn allocate_page_num(&self) -> PageId {
        self.num_pages as PageId
    }

    /// Write a cached page back to its slot in the file
    pub fn flush(&mut self, page_id: PageId) -> FileResult<()> {
        let page = self
            .pages
            .get(&page_id)
            .ok_or(FileError::PageNotCached(page_id))?;

        self.disk.write_page(page_id, page.as_slice())?;
        self.file_pages = self.file_pages.max(page_id as usize + 1);
        Ok(())
    }

    /// Flush all cached pages and sync the file.
    ///
    /// Every page is attempted; the first failure is returned.
    pub fn flush_all(&mut self) -> FileResult<()> {
        let mut page_ids: Vec<PageId> = self.pages.keys().copied().collect();
        page_ids.sort_unstable();

        let mut first_error = None;
        for page_id in page_ids {
            if let Err(err) = self.flush(page_id) {
                tracing::warn!("Failed to flush page {}: {}", page_id, err);
                first_error.get_or_insert(err);
            }
        }

        if let Err(err) = self.disk.sync() {
            first_error.get_or_insert(err);
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Flush every cached page, release the cache and close the file.
    ///
    /// Dropping a `File` reports no error, so the `sync_all` at the end of
    /// [`Pager::flush_all`] is where a failed close surfaces: deferred write
    /// errors come back from it as [`FileError::Io`]. The handle itself is
    /// released when `self` drops at the end of this call.
    pub fn close(mut self) -> FileResult<()> {
        let result = self.flush_all();
        let flushed = self.pages.len();
        self.pages.clear();

        tracing::info!(
            "Closed database file {} ({} pages flushed)",
            self.disk.path().display(),
            flushed
        );
        result
    }

    /// Check if a page is in the cache
    pub fn is_page_cached(&self, page_id: PageId) -> bool {
        self.pages.contains_key(&page_id)
    }

    /// Get the number of pages currently cached
    pub fn cached_page_count(&self) -> usize {
        self.pages.len()
    }

    fn cached_entry(&mut self, page_id: PageId) -> FileResult<&mut Box<Page>> {
        if page_id as usize >= TABLE_MAX_PAGES {
            return Err(FileError::PageOutOfBounds {
                page_id,
                max: TABLE_MAX_PAGES,
            });
        }

        match self.pages.entry(page_id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let mut page = Box::new([0u8; PAGE_SIZE]);

                // Pages past the end of the file start out zeroed
                if (page_id as usize) < self.file_pages {
                    tracing::debug!("Loading page {} from disk", page_id);
                    self.disk.read_page(page_id, page.as_mut_slice())?;
                }

                self.num_pages = self.num_pages.max(page_id as usize + 1);
                Ok(entry.insert(page))
            }
        }
    }
}

impl Drop for Pager {
    fn drop(&mut self) {
        // close() empties the cache, so this only runs for pagers never closed
        if !self.pages.is_empty()
            && let Err(err) = self.flush_all()
        {
            tracing::warn!("Failed to flush pages on drop: {}", err);
        }
    }
}
