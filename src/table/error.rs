use thiserror::Error;

use crate::btree::BTreeError;
use crate::file::FileError;
use crate::record::RecordError;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("B+ tree error: {0}")]
    BTree(#[from] BTreeError),
}

pub type TableResult<T> = Result<T, TableError>;
