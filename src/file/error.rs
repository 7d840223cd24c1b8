use std::io;
use thiserror::Error;

use super::PageId;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Db file is not a whole number of pages. Corrupt file (length {len})")]
    CorruptFile { len: u64 },

    #[error("Tried to fetch page number out of bounds: {page_id} >= {max}")]
    PageOutOfBounds { page_id: PageId, max: usize },

    #[error("Tried to flush null page: page_id={0}")]
    PageNotCached(PageId),

    #[error("Invalid page size: expected {expected}, got {actual}")]
    InvalidPageSize { expected: usize, actual: usize },
}

pub type FileResult<T> = Result<T, FileError>;
