use thiserror::Error;

use crate::file::{FileError, PageId};

use super::BTreeKey;

/// Errors that can occur during B+ tree operations
#[derive(Debug, Error)]
pub enum BTreeError {
    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Duplicate key: {0}")]
    DuplicateKey(BTreeKey),

    #[error("Internal node {0} is full; splitting internal nodes is not supported")]
    InternalNodeFull(PageId),

    #[error("Need {needed} free pages but only {available} remain")]
    PageBudgetExhausted { needed: usize, available: usize },

    #[error("Corrupt node on page {page_id}: {reason}")]
    CorruptNode { page_id: PageId, reason: String },

    #[error("Invalid node type {tag} on page {page_id}")]
    InvalidNodeType { page_id: PageId, tag: u8 },

    #[error("Child index {index} out of range for internal node with {num_keys} keys")]
    ChildIndexOutOfRange { index: usize, num_keys: usize },

    #[error("No cell at cursor position: page_id={page_id}, cell={cell}")]
    NoCellAtCursor { page_id: PageId, cell: usize },

    #[error("Node on page {0} has no keys")]
    EmptyNode(PageId),

    #[error("Invalid value size: expected {expected}, got {actual}")]
    InvalidValueSize { expected: usize, actual: usize },
}

pub type BTreeResult<T> = Result<T, BTreeError>;
