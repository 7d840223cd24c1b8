use crate::file::PageId;

use super::error::{BTreeError, BTreeResult};
use super::node::LeafNode;
use super::{BTree, BTreeKey};

/// A position in the leaf level of a [`BTree`].
///
/// Cursors hold the tree's only mutable borrow while they live, so the tree
/// cannot change underneath them.
pub struct Cursor<'a> {
    tree: &'a mut BTree,
    page_num: PageId,
    cell_num: usize,
    end_of_table: bool,
    /// Sibling links followed so far, bounded by the file's page count
    hops: usize,
}

impl<'a> Cursor<'a> {
    pub(super) fn new(
        tree: &'a mut BTree,
        page_num: PageId,
        cell_num: usize,
        end_of_table: bool,
    ) -> Self {
        Self {
            tree,
            page_num,
            cell_num,
            end_of_table,
            hops: 0,
        }
    }

    /// Leaf page the cursor points into
    pub fn page_num(&self) -> PageId {
        self.page_num
    }

    /// Cell index within the current leaf
    pub fn cell_num(&self) -> usize {
        self.cell_num
    }

    /// Whether the cursor has moved past the last cell of the last leaf
    pub fn is_end(&self) -> bool {
        self.end_of_table
    }

    /// Key of the cell under the cursor
    pub fn key(&mut self) -> BTreeResult<BTreeKey> {
        let page_id = self.page_num;
        let cell = self.cell_num;
        let leaf = self.tree.leaf_node(page_id)?;
        if self.end_of_table || cell >= leaf.num_cells() {
            return Err(BTreeError::NoCellAtCursor { page_id, cell });
        }
        Ok(leaf.key(cell))
    }

    /// Raw serialized value of the cell under the cursor
    pub fn value(&mut self) -> BTreeResult<&[u8]> {
        let page_id = self.page_num;
        let cell = self.cell_num;
        let end_of_table = self.end_of_table;
        let layout = self.tree.layout;

        let page = self.tree.pager.get_page(page_id)?;
        if end_of_table || cell >= LeafNode::new(&*page, layout).num_cells() {
            return Err(BTreeError::NoCellAtCursor { page_id, cell });
        }
        Ok(&page[layout.leaf_value_range(cell)])
    }

    /// Move to the next cell, following the sibling link at the end of a leaf
    pub fn advance(&mut self) -> BTreeResult<()> {
        let leaf = self.tree.leaf_node(self.page_num)?;
        let num_cells = leaf.num_cells();
        let next_leaf = leaf.next_leaf();

        self.cell_num += 1;
        if self.cell_num >= num_cells {
            if next_leaf == 0 {
                self.end_of_table = true;
            } else {
                self.tree.check_pointer(self.page_num, next_leaf)?;
                self.hops += 1;
                if self.hops >= self.tree.pager.num_pages() {
                    return Err(self.tree.cycle_error(next_leaf));
                }
                self.page_num = next_leaf;
                self.cell_num = 0;
            }
        }
        Ok(())
    }
}
