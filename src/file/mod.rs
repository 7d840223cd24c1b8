mod disk;
mod error;
mod pager;

pub use disk::DiskFile;
pub use error::{FileError, FileResult};
pub use pager::Pager;

/// Page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Maximum number of pages a single database file may hold
pub const TABLE_MAX_PAGES: usize = 100;

/// Page number type, stored on disk as a little-endian u32
pub type PageId = u32;

/// In-memory image of one page
pub type Page = [u8; PAGE_SIZE];
