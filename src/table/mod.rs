//! The single `users` table: rows keyed by id in a B+ tree over one file

mod error;


pub use error::{TableError, TableResult};

use std::fmt;
use std::path::Path;

use crate::btree::node::{
    COMMON_NODE_HEADER_SIZE, INTERNAL_NODE_CELL_SIZE, INTERNAL_NODE_HEADER_SIZE,
    LEAF_NODE_HEADER_SIZE,
};
use crate::btree::{BTree, Cursor, NodeLayout, NodeSummary};
use crate::file::{PAGE_SIZE, Pager};
use crate::record::{ROW_SIZE, Row};

/// Open handle to a database file
pub struct Table {
    tree: BTree,
}

impl Table {
    /// Open the table stored at `path`, creating the file if it is missing
    pub fn open<P: AsRef<Path>>(path: P) -> TableResult<Self> {
        Self::open_with_layout(path, NodeLayout::new(ROW_SIZE, PAGE_SIZE))
    }

    pub fn open_with_layout<P: AsRef<Path>>(path: P, layout: NodeLayout) -> TableResult<Self> {
        let pager = Pager::open(path)?;
        let tree = BTree::open(pager, layout)?;
        Ok(Self { tree })
    }

    /// Flush every page to disk and release the file
    pub fn close(self) -> TableResult<()> {
        self.tree.close()?;
        Ok(())
    }

    pub fn insert(&mut self, row: &Row) -> TableResult<()> {
        let value = row.serialize()?;
        self.tree.insert(row.id, &value)?;
        tracing::debug!("Inserted row {}", row.id);
        Ok(())
    }

    /// Every row in ascending id order
    pub fn select_all(&mut self) -> TableResult<Vec<Row>> {
        self.rows()?.collect()
    }

    /// Streaming scan over the rows in ascending id order
    pub fn rows(&mut self) -> TableResult<Rows<'_>> {
        let cursor = self.tree.start()?;
        Ok(Rows {
            cursor,
            done: false,
        })
    }

    pub fn tree_summary(&mut self) -> TableResult<NodeSummary> {
        Ok(self.tree.tree_summary()?)
    }

    /// Indented dump of the tree, one node or key per line
    pub fn render_tree(&mut self) -> TableResult<String> {
        Ok(self.tree.render_tree()?)
    }

    pub fn constants(&self) -> Constants {
        Constants::from_layout(self.tree.layout())
    }
}

/// Streaming table scan iterator (yields rows one-by-one).
pub struct Rows<'a> {
    cursor: Cursor<'a>,
    done: bool,
}

impl Rows<'_> {
    fn read_row(&mut self) -> TableResult<Row> {
        let row = Row::deserialize(self.cursor.value()?)?;
        self.cursor.advance()?;
        Ok(row)
    }
}

impl Iterator for Rows<'_> {
    type Item = TableResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor.is_end() {
            return None;
        }

        let row = self.read_row();
        if row.is_err() {
            self.done = true;
        }
        Some(row)
    }
}

/// Sizes of the on-disk structures, as printed by `.constants`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constants {
    pub row_size: usize,
    pub common_node_header_size: usize,
    pub leaf_node_header_size: usize,
    pub leaf_node_cell_size: usize,
    pub leaf_node_space_for_cells: usize,
    pub leaf_node_max_cells: usize,
    pub internal_node_header_size: usize,
    pub internal_node_cell_size: usize,
    pub internal_node_max_cells: usize,
}

impl Constants {
    pub fn from_layout(layout: NodeLayout) -> Self {
        Self {
            row_size: layout.leaf_value_size(),
            common_node_header_size: COMMON_NODE_HEADER_SIZE,
            leaf_node_header_size: LEAF_NODE_HEADER_SIZE,
            leaf_node_cell_size: layout.leaf_cell_size(),
            leaf_node_space_for_cells: layout.leaf_space_for_cells(),
            leaf_node_max_cells: layout.leaf_max_cells(),
            internal_node_header_size: INTERNAL_NODE_HEADER_SIZE,
            internal_node_cell_size: INTERNAL_NODE_CELL_SIZE,
            internal_node_max_cells: layout.internal_max_cells(),
        }
    }

    /// `(name, value)` pairs in display order
    pub fn entries(&self) -> [(&'static str, usize); 9] {
        [
            ("ROW_SIZE", self.row_size),
            ("COMMON_NODE_HEADER_SIZE", self.common_node_header_size),
            ("LEAF_NODE_HEADER_SIZE", self.leaf_node_header_size),
            ("LEAF_NODE_CELL_SIZE", self.leaf_node_cell_size),
            ("LEAF_NODE_SPACE_FOR_CELLS", self.leaf_node_space_for_cells),
            ("LEAF_NODE_MAX_CELLS", self.leaf_node_max_cells),
            ("INTERNAL_NODE_HEADER_SIZE", self.internal_node_header_size),
            ("INTERNAL_NODE_CELL_SIZE", self.internal_node_cell_size),
            ("INTERNAL_NODE_MAX_CELLS", self.internal_node_max_cells),
        ]
    }
}

impl fmt::Display for Constants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.entries() {
            writeln!(f, "{}: {}", name, value)?;
        }
        Ok(())
    }
}
