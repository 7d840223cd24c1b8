//! Paged B+ tree storing fixed-size values under `u32` keys
//!
//! Every node lives in its own page of the [`Pager`]. Leaves hold the
//! `(key, value)` cells in key order and are chained left to right through
//! their next-leaf pointers; internal nodes route lookups by storing, for each
//! child but the last, the largest key reachable through that child.
//!
//! The root always lives on page 0. When the root leaf overflows, its content
//! moves to a fresh page and page 0 is rewritten as an internal node, so the
//! root page number never changes. Internal nodes do not split: an insert
//! that needs room in a full internal node fails with
//! [`BTreeError::InternalNodeFull`] and leaves the tree untouched.

mod cursor;
mod error;
pub mod node;


pub use cursor::Cursor;
pub use error::{BTreeError, BTreeResult};
pub use node::{InternalNode, LeafNode, Node, NodeLayout, NodeType};

use std::fmt;

use crate::file::{Page, PageId, Pager, TABLE_MAX_PAGES};

/// Key type for the B+ tree (the table's primary key)
pub type BTreeKey = u32;

/// Structural snapshot of a subtree, used for `.btree` output and checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSummary {
    Leaf {
        page_id: PageId,
        keys: Vec<BTreeKey>,
    },
    Internal {
        page_id: PageId,
        keys: Vec<BTreeKey>,
        children: Vec<NodeSummary>,
    },
}

impl NodeSummary {
    pub fn page_id(&self) -> PageId {
        match self {
            NodeSummary::Leaf { page_id, .. } | NodeSummary::Internal { page_id, .. } => *page_id,
        }
    }

    pub fn keys(&self) -> &[BTreeKey] {
        match self {
            NodeSummary::Leaf { keys, .. } | NodeSummary::Internal { keys, .. } => keys.as_slice(),
        }
    }

    /// Largest key stored in the subtree
    pub fn max_key(&self) -> Option<BTreeKey> {
        match self {
            NodeSummary::Leaf { keys, .. } => keys.last().copied(),
            NodeSummary::Internal { children, .. } => children.last().and_then(|c| c.max_key()),
        }
    }

    /// Depth of every leaf, left to right (the root is depth 0)
    pub fn leaf_depths(&self) -> Vec<usize> {
        let mut depths = Vec::new();
        self.collect_leaf_depths(0, &mut depths);
        depths
    }

    fn collect_leaf_depths(&self, depth: usize, depths: &mut Vec<usize>) {
        match self {
            NodeSummary::Leaf { .. } => depths.push(depth),
            NodeSummary::Internal { children, .. } => {
                for child in children {
                    child.collect_leaf_depths(depth + 1, depths);
                }
            }
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        let indent = "  ".repeat(level);
        match self {
            NodeSummary::Leaf { keys, .. } => {
                writeln!(f, "{}- leaf (size {})", indent, keys.len())?;
                for key in keys {
                    writeln!(f, "{}  - {}", indent, key)?;
                }
            }
            NodeSummary::Internal { keys, children, .. } => {
                writeln!(f, "{}- internal (size {})", indent, keys.len())?;
                for (child, key) in children.iter().zip(keys) {
                    child.render(f, level + 1)?;
                    writeln!(f, "{}  - key {}", indent, key)?;
                }
                if let Some(right_child) = children.last() {
                    right_child.render(f, level + 1)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for NodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

/// B+ tree over the pages of a single database file
pub struct BTree {
    pager: Pager,
    layout: NodeLayout,
    root_page_num: PageId,
}

impl BTree {
    /// Open the tree stored in `pager`, formatting page 0 as an empty root
    /// leaf if the database is brand new
    pub fn open(mut pager: Pager, layout: NodeLayout) -> BTreeResult<Self> {
        let root_page_num = 0;

        if pager.num_pages() == 0 {
            let page = pager.get_page_mut(root_page_num)?;
            let mut root = LeafNode::initialize(page, layout);
            root.set_root(true);
            tracing::info!("Initialized new database with an empty root leaf");
        } else {
            let page = pager.get_page(root_page_num)?;
            Node::from_page(root_page_num, page, layout)?;
        }

        Ok(Self {
            pager,
            layout,
            root_page_num,
        })
    }

    /// Flush every page and close the underlying file
    pub fn close(self) -> BTreeResult<()> {
        self.pager.close()?;
        Ok(())
    }

    pub fn layout(&self) -> NodeLayout {
        self.layout
    }

    pub fn root_page_num(&self) -> PageId {
        self.root_page_num
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    // ========== Search Operations ==========

    /// Position a cursor at `key`, or where `key` would be inserted
    pub fn find(&mut self, key: BTreeKey) -> BTreeResult<Cursor<'_>> {
        let (page_num, cell_num) = self.find_position(key)?;
        Ok(Cursor::new(self, page_num, cell_num, false))
    }

    /// Position a cursor at the smallest key in the tree
    pub fn start(&mut self) -> BTreeResult<Cursor<'_>> {
        let (page_num, cell_num) = self.find_position(0)?;
        let num_cells = self.leaf_node(page_num)?.num_cells();
        Ok(Cursor::new(self, page_num, cell_num, num_cells == 0))
    }

    /// Walk from the root to the leaf responsible for `key`
    fn find_position(&mut self, key: BTreeKey) -> BTreeResult<(PageId, usize)> {
        let layout = self.layout;
        let mut page_num = self.root_page_num;

        for _ in 0..self.pager.num_pages() {
            let page = self.pager.get_page(page_num)?;
            let child = match Node::from_page(page_num, page, layout)? {
                Node::Leaf(leaf) => return Ok((page_num, leaf.find(key))),
                Node::Internal(node) => node.child(node.find_child_index(key))?,
            };
            self.check_pointer(page_num, child)?;
            page_num = child;
        }
        Err(self.cycle_error(page_num))
    }

    /// Largest key stored under the node on `page_id`
    pub fn node_max_key(&mut self, page_id: PageId) -> BTreeResult<BTreeKey> {
        let layout = self.layout;
        let mut page_num = page_id;

        for _ in 0..self.pager.num_pages() {
            let page = self.pager.get_page(page_num)?;
            let child = match Node::from_page(page_num, page, layout)? {
                Node::Leaf(leaf) => return leaf.max_key().ok_or(BTreeError::EmptyNode(page_num)),
                Node::Internal(node) => node.right_child(),
            };
            self.check_pointer(page_num, child)?;
            page_num = child;
        }
        Err(self.cycle_error(page_num))
    }

    // ========== Insert Operations ==========

    /// Insert `value` under `key`.
    ///
    /// Fails with [`BTreeError::DuplicateKey`] if the key is already present.
    pub fn insert(&mut self, key: BTreeKey, value: &[u8]) -> BTreeResult<()> {
        let layout = self.layout;
        if value.len() != layout.leaf_value_size() {
            return Err(BTreeError::InvalidValueSize {
                expected: layout.leaf_value_size(),
                actual: value.len(),
            });
        }

        let (page_num, cell_num) = self.find_position(key)?;

        let num_cells = {
            let leaf = self.leaf_node(page_num)?;
            let num_cells = leaf.num_cells();
            if cell_num < num_cells && leaf.key(cell_num) == key {
                return Err(BTreeError::DuplicateKey(key));
            }
            num_cells
        };

        if num_cells >= layout.leaf_max_cells() {
            return self.split_and_insert(page_num, cell_num, key, value);
        }

        self.leaf_node_mut(page_num)?.insert_cell(cell_num, key, value);
        Ok(())
    }

    /// Split the full leaf on `old_page` and insert `(key, value)` at
    /// `cell_num` while redistributing its cells
    fn split_and_insert(
        &mut self,
        old_page: PageId,
        cell_num: usize,
        key: BTreeKey,
        value: &[u8],
    ) -> BTreeResult<()> {
        let layout = self.layout;

        let (is_root, parent) = {
            let leaf = self.leaf_node(old_page)?;
            (leaf.is_root(), leaf.parent())
        };
        self.check_pointer(old_page, parent)?;

        // Refuse up front so a failed insert never leaves a half-linked leaf
        if !is_root {
            let parent_node = self.internal_node(parent)?;
            if parent_node.num_keys() >= layout.internal_max_cells() {
                return Err(BTreeError::InternalNodeFull(parent));
            }
        }
        let pages_needed = if is_root { 2 } else { 1 };
        let pages_available = TABLE_MAX_PAGES.saturating_sub(self.pager.num_pages());
        if pages_needed > pages_available {
            return Err(BTreeError::PageBudgetExhausted {
                needed: pages_needed,
                available: pages_available,
            });
        }

        let old_max = self.node_max_key(old_page)?;
        let old_copy: Page = *self.pager.get_page(old_page)?;
        let old_leaf = LeafNode::new(&old_copy, layout);

        let mut new_cell = vec![0u8; layout.leaf_cell_size()];
        new_cell[..node::LEAF_NODE_KEY_SIZE].copy_from_slice(&key.to_le_bytes());
        new_cell[node::LEAF_NODE_KEY_SIZE..].copy_from_slice(value);

        let mut cells: Vec<&[u8]> = (0..old_leaf.num_cells()).map(|i| old_leaf.cell(i)).collect();
        cells.insert(cell_num, new_cell.as_slice());
        let (left_cells, right_cells) = cells.split_at(layout.leaf_left_split_count());

        let new_page = self.pager.allocate_page_num();
        tracing::debug!(
            "Splitting leaf {} into {} ({} cells) and {} ({} cells)",
            old_page,
            old_page,
            left_cells.len(),
            new_page,
            right_cells.len()
        );

        {
            let page = self.pager.get_page_mut(new_page)?;
            let mut right = LeafNode::initialize(page, layout);
            right.set_parent(parent);
            right.set_next_leaf(old_leaf.next_leaf());
            for (i, cell) in right_cells.iter().enumerate() {
                right.write_raw_cell(i, cell);
            }
            right.set_num_cells(right_cells.len());
        }

        {
            let mut left = self.leaf_node_mut(old_page)?;
            for (i, cell) in left_cells.iter().enumerate() {
                left.write_raw_cell(i, cell);
            }
            left.set_num_cells(left_cells.len());
            left.set_next_leaf(new_page);
        }

        if is_root {
            return self.create_new_root(new_page);
        }

        let new_max = self.node_max_key(old_page)?;
        self.update_internal_node_key(parent, old_max, new_max)?;
        self.internal_node_insert(parent, new_page)
    }

    /// Move the root's content to a new left child and turn the root page into
    /// an internal node over that child and `right_child`
    fn create_new_root(&mut self, right_child: PageId) -> BTreeResult<()> {
        let layout = self.layout;
        let root = self.root_page_num;

        let root_copy: Page = *self.pager.get_page(root)?;
        let left_child = self.pager.allocate_page_num();
        {
            let page = self.pager.get_page_mut(left_child)?;
            *page = root_copy;
            node::set_node_root(page, false);
        }

        let left_max = self.node_max_key(left_child)?;
        {
            let page = self.pager.get_page_mut(root)?;
            let mut root_node = InternalNode::initialize(page, layout);
            root_node.set_root(true);
            root_node.insert_cell(0, left_child, left_max);
            root_node.set_right_child(right_child);
        }

        for child in [left_child, right_child] {
            node::set_node_parent(self.pager.get_page_mut(child)?, root);
        }

        tracing::debug!(
            "Created new root on page {} over {} and {}",
            root,
            left_child,
            right_child
        );
        Ok(())
    }

    /// Replace the separator `old_key` in the internal node on `page_id`.
    ///
    /// The right child has no separator, so a key routed there is left alone.
    fn update_internal_node_key(
        &mut self,
        page_id: PageId,
        old_key: BTreeKey,
        new_key: BTreeKey,
    ) -> BTreeResult<()> {
        let mut node = self.internal_node_mut(page_id)?;
        let index = node.find_child_index(old_key);
        if index < node.num_keys() {
            node.set_key(index, new_key);
        }
        Ok(())
    }

    /// Add `child` to the internal node on `parent`
    fn internal_node_insert(&mut self, parent: PageId, child: PageId) -> BTreeResult<()> {
        let layout = self.layout;
        let child_max = self.node_max_key(child)?;

        let (num_keys, index, right_child) = {
            let node = self.internal_node(parent)?;
            (
                node.num_keys(),
                node.find_child_index(child_max),
                node.right_child(),
            )
        };

        if num_keys >= layout.internal_max_cells() {
            return Err(BTreeError::InternalNodeFull(parent));
        }

        let right_max = self.node_max_key(right_child)?;
        let mut node = self.internal_node_mut(parent)?;
        if child_max > right_max {
            // The new child becomes the right child; the old one moves into the cells
            node.write_cell(num_keys, right_child, right_max);
            node.set_num_keys(num_keys + 1);
            node.set_right_child(child);
        } else {
            node.insert_cell(index, child, child_max);
        }
        Ok(())
    }

    // ========== Introspection ==========

    /// Snapshot of the whole tree structure
    pub fn tree_summary(&mut self) -> BTreeResult<NodeSummary> {
        self.summarize(self.root_page_num, 0)
    }

    /// Indented, human-readable dump of the tree
    pub fn render_tree(&mut self) -> BTreeResult<String> {
        Ok(self.tree_summary()?.to_string())
    }

    fn summarize(&mut self, page_id: PageId, depth: usize) -> BTreeResult<NodeSummary> {
        if depth >= self.pager.num_pages() {
            return Err(self.cycle_error(page_id));
        }

        let layout = self.layout;
        let page = self.pager.get_page(page_id)?;
        let (keys, children) = match Node::from_page(page_id, page, layout)? {
            Node::Leaf(leaf) => {
                return Ok(NodeSummary::Leaf {
                    page_id,
                    keys: leaf.keys(),
                });
            }
            Node::Internal(node) => (node.keys(), node.children()?),
        };

        let children = children
            .into_iter()
            .map(|child| {
                self.check_pointer(page_id, child)?;
                self.summarize(child, depth + 1)
            })
            .collect::<BTreeResult<Vec<_>>>()?;

        Ok(NodeSummary::Internal {
            page_id,
            keys,
            children,
        })
    }

    // ========== Node Access ==========

    /// Reject a page pointer read from `from` that leaves the file
    fn check_pointer(&self, from: PageId, target: PageId) -> BTreeResult<()> {
        let num_pages = self.pager.num_pages();
        if target as usize >= num_pages {
            return Err(BTreeError::CorruptNode {
                page_id: from,
                reason: format!(
                    "points to page {} but the file has {} pages",
                    target, num_pages
                ),
            });
        }
        Ok(())
    }

    /// Error for a walk that visited more nodes than the file holds
    fn cycle_error(&self, page_id: PageId) -> BTreeError {
        BTreeError::CorruptNode {
            page_id,
            reason: format!(
                "pointer chain is longer than the {} pages in the file",
                self.pager.num_pages()
            ),
        }
    }

    fn leaf_node(&mut self, page_id: PageId) -> BTreeResult<LeafNode<&Page>> {
        let layout = self.layout;
        match Node::from_page(page_id, self.pager.get_page(page_id)?, layout)? {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(BTreeError::InvalidNodeType {
                page_id,
                tag: NodeType::Internal.tag(),
            }),
        }
    }

    fn leaf_node_mut(&mut self, page_id: PageId) -> BTreeResult<LeafNode<&mut Page>> {
        let layout = self.layout;
        match Node::from_page(page_id, self.pager.get_page_mut(page_id)?, layout)? {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(BTreeError::InvalidNodeType {
                page_id,
                tag: NodeType::Internal.tag(),
            }),
        }
    }

    fn internal_node(&mut self, page_id: PageId) -> BTreeResult<InternalNode<&Page>> {
        let layout = self.layout;
        match Node::from_page(page_id, self.pager.get_page(page_id)?, layout)? {
            Node::Internal(node) => Ok(node),
            Node::Leaf(_) => Err(BTreeError::InvalidNodeType {
                page_id,
                tag: NodeType::Leaf.tag(),
            }),
        }
    }

    fn internal_node_mut(&mut self, page_id: PageId) -> BTreeResult<InternalNode<&mut Page>> {
        let layout = self.layout;
        match Node::from_page(page_id, self.pager.get_page_mut(page_id)?, layout)? {
            Node::Internal(node) => Ok(node),
            Node::Leaf(_) => Err(BTreeError::InvalidNodeType {
                page_id,
                tag: NodeType::Leaf.tag(),
            }),
        }
    }
}
