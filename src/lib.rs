pub mod btree;
pub mod file;
pub mod record;
pub mod repl;
pub mod table;

pub use btree::{BTree, BTreeError, BTreeKey, BTreeResult, Cursor, NodeLayout, NodeSummary};
pub use file::{FileError, FileResult, PAGE_SIZE, Pager, TABLE_MAX_PAGES};
pub use record::{ROW_SIZE, RecordError, RecordResult, Row};
pub use table::{Constants, Table, TableError, TableResult};
