//! On-page encoding of B+ tree nodes
//!
//! Every node occupies exactly one page. Both node kinds share a common
//! header; all integers are little-endian:
//!
//! | offset | size | leaf              | internal          |
//! |--------|------|-------------------|-------------------|
//! | 0      | 1    | node type (1)     | node type (0)     |
//! | 1      | 1    | is root           | is root           |
//! | 2      | 4    | parent page       | parent page       |
//! | 6      | 4    | number of cells   | number of keys    |
//! | 10     | 4    | next leaf page    | right child page  |
//! | 14     | ...  | `(key, row)` cells | `(child, key)` cells |
//!
//! A next-leaf pointer of 0 means "no sibling"; page 0 is always the root and
//! can never be a right sibling.

use std::ops::Range;

use crate::file::PageId;

use super::BTreeKey;
use super::error::{BTreeError, BTreeResult};

// Common node header layout
pub const NODE_TYPE_SIZE: usize = size_of::<u8>();
pub const NODE_TYPE_OFFSET: usize = 0;
pub const IS_ROOT_SIZE: usize = size_of::<u8>();
pub const IS_ROOT_OFFSET: usize = NODE_TYPE_OFFSET + NODE_TYPE_SIZE;
pub const PARENT_POINTER_SIZE: usize = size_of::<u32>();
pub const PARENT_POINTER_OFFSET: usize = IS_ROOT_OFFSET + IS_ROOT_SIZE;
pub const COMMON_NODE_HEADER_SIZE: usize = NODE_TYPE_SIZE + IS_ROOT_SIZE + PARENT_POINTER_SIZE;

// Leaf node header layout
pub const LEAF_NODE_NUM_CELLS_SIZE: usize = size_of::<u32>();
pub const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const LEAF_NODE_NEXT_LEAF_SIZE: usize = size_of::<u32>();
pub const LEAF_NODE_NEXT_LEAF_OFFSET: usize = LEAF_NODE_NUM_CELLS_OFFSET + LEAF_NODE_NUM_CELLS_SIZE;
pub const LEAF_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + LEAF_NODE_NUM_CELLS_SIZE + LEAF_NODE_NEXT_LEAF_SIZE;
pub const LEAF_NODE_KEY_SIZE: usize = size_of::<BTreeKey>();

// Internal node header layout
pub const INTERNAL_NODE_NUM_KEYS_SIZE: usize = size_of::<u32>();
pub const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const INTERNAL_NODE_RIGHT_CHILD_SIZE: usize = size_of::<u32>();
pub const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize =
    INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE;
pub const INTERNAL_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + INTERNAL_NODE_NUM_KEYS_SIZE + INTERNAL_NODE_RIGHT_CHILD_SIZE;

// Internal node body layout
pub const INTERNAL_NODE_CHILD_SIZE: usize = size_of::<u32>();
pub const INTERNAL_NODE_KEY_SIZE: usize = size_of::<BTreeKey>();
pub const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_CHILD_SIZE + INTERNAL_NODE_KEY_SIZE;

/// Kept small so internal nodes fill up after a handful of leaf splits
pub const DEFAULT_INTERNAL_NODE_MAX_CELLS: usize = 3;

/// Discriminant stored in the first byte of every node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Internal,
    Leaf,
}

impl NodeType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(NodeType::Internal),
            1 => Some(NodeType::Leaf),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            NodeType::Internal => 0,
            NodeType::Leaf => 1,
        }
    }
}

/// Sizes and capacities derived once from the row size and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLayout {
    page_size: usize,
    leaf_value_size: usize,
    leaf_cell_size: usize,
    leaf_space_for_cells: usize,
    leaf_max_cells: usize,
    leaf_right_split_count: usize,
    leaf_left_split_count: usize,
    internal_max_cells: usize,
}

impl NodeLayout {
    /// Compute the layout for leaves holding `value_size`-byte values
    pub fn new(value_size: usize, page_size: usize) -> Self {
        let leaf_cell_size = LEAF_NODE_KEY_SIZE + value_size;
        let leaf_space_for_cells = page_size - LEAF_NODE_HEADER_SIZE;
        let leaf_max_cells = leaf_space_for_cells / leaf_cell_size;
        let leaf_right_split_count = (leaf_max_cells + 1).div_ceil(2);
        let leaf_left_split_count = (leaf_max_cells + 1) - leaf_right_split_count;

        Self {
            page_size,
            leaf_value_size: value_size,
            leaf_cell_size,
            leaf_space_for_cells,
            leaf_max_cells,
            leaf_right_split_count,
            leaf_left_split_count,
            internal_max_cells: DEFAULT_INTERNAL_NODE_MAX_CELLS,
        }
    }

    /// Override the number of keys an internal node may hold.
    ///
    /// The value is clamped to `1..=internal_capacity()`.
    pub fn with_internal_max_cells(mut self, max_cells: usize) -> Self {
        self.internal_max_cells = max_cells.clamp(1, self.internal_capacity());
        self
    }

    /// Number of internal cells that physically fit in a page
    pub fn internal_capacity(&self) -> usize {
        (self.page_size - INTERNAL_NODE_HEADER_SIZE) / INTERNAL_NODE_CELL_SIZE
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn leaf_value_size(&self) -> usize {
        self.leaf_value_size
    }

    pub fn leaf_cell_size(&self) -> usize {
        self.leaf_cell_size
    }

    pub fn leaf_space_for_cells(&self) -> usize {
        self.leaf_space_for_cells
    }

    pub fn leaf_max_cells(&self) -> usize {
        self.leaf_max_cells
    }

    /// Cells that move to the new right leaf on a split
    pub fn leaf_right_split_count(&self) -> usize {
        self.leaf_right_split_count
    }

    /// Cells that stay in the old left leaf on a split
    pub fn leaf_left_split_count(&self) -> usize {
        self.leaf_left_split_count
    }

    pub fn internal_max_cells(&self) -> usize {
        self.internal_max_cells
    }

    fn leaf_cell_offset(&self, cell: usize) -> usize {
        LEAF_NODE_HEADER_SIZE + cell * self.leaf_cell_size
    }

    /// Byte range of the cell at `cell` within a leaf page
    pub fn leaf_cell_range(&self, cell: usize) -> Range<usize> {
        let start = self.leaf_cell_offset(cell);
        start..start + self.leaf_cell_size
    }

    /// Byte range of the value stored in the cell at `cell` within a leaf page
    pub fn leaf_value_range(&self, cell: usize) -> Range<usize> {
        let start = self.leaf_cell_offset(cell) + LEAF_NODE_KEY_SIZE;
        start..start + self.leaf_value_size
    }

    fn internal_cell_offset(&self, cell: usize) -> usize {
        INTERNAL_NODE_HEADER_SIZE + cell * INTERNAL_NODE_CELL_SIZE
    }
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Read the node type tag of a page without interpreting the rest
pub fn node_type(buf: &[u8]) -> Option<NodeType> {
    NodeType::from_tag(buf[NODE_TYPE_OFFSET])
}

fn set_node_type(buf: &mut [u8], node_type: NodeType) {
    buf[NODE_TYPE_OFFSET] = node_type.tag();
}

fn is_root(buf: &[u8]) -> bool {
    buf[IS_ROOT_OFFSET] != 0
}

fn set_root(buf: &mut [u8], is_root: bool) {
    buf[IS_ROOT_OFFSET] = u8::from(is_root);
}

fn parent(buf: &[u8]) -> PageId {
    read_u32(buf, PARENT_POINTER_OFFSET)
}

fn set_parent(buf: &mut [u8], parent: PageId) {
    write_u32(buf, PARENT_POINTER_OFFSET, parent);
}

/// Mark any node as root or non-root without knowing its kind
pub fn set_node_root(buf: &mut [u8], root: bool) {
    set_root(buf, root);
}

/// Set the parent pointer of any node without knowing its kind
pub fn set_node_parent(buf: &mut [u8], parent_page: PageId) {
    set_parent(buf, parent_page);
}

/// Leaf node view over a page buffer
pub struct LeafNode<B> {
    buf: B,
    layout: NodeLayout,
}

impl<B: AsRef<[u8]>> LeafNode<B> {
    /// Wrap a page that is already known to hold a leaf
    pub fn new(buf: B, layout: NodeLayout) -> Self {
        Self { buf, layout }
    }

    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    pub fn is_root(&self) -> bool {
        is_root(self.bytes())
    }

    pub fn parent(&self) -> PageId {
        parent(self.bytes())
    }

    pub fn num_cells(&self) -> usize {
        read_u32(self.bytes(), LEAF_NODE_NUM_CELLS_OFFSET) as usize
    }

    /// Right sibling page, 0 if this is the rightmost leaf
    pub fn next_leaf(&self) -> PageId {
        read_u32(self.bytes(), LEAF_NODE_NEXT_LEAF_OFFSET)
    }

    pub fn key(&self, cell: usize) -> BTreeKey {
        read_u32(self.bytes(), self.layout.leaf_cell_offset(cell))
    }

    pub fn value(&self, cell: usize) -> &[u8] {
        &self.bytes()[self.layout.leaf_value_range(cell)]
    }

    /// Raw bytes of a whole `(key, value)` cell
    pub fn cell(&self, cell: usize) -> &[u8] {
        &self.bytes()[self.layout.leaf_cell_range(cell)]
    }

    pub fn keys(&self) -> Vec<BTreeKey> {
        (0..self.num_cells()).map(|i| self.key(i)).collect()
    }

    pub fn max_key(&self) -> Option<BTreeKey> {
        self.num_cells().checked_sub(1).map(|last| self.key(last))
    }

    /// Index of `key` if present, otherwise the index it should be inserted at
    pub fn find(&self, key: BTreeKey) -> usize {
        let mut min = 0;
        let mut one_past_max = self.num_cells();
        while one_past_max != min {
            let index = min + (one_past_max - min) / 2;
            let key_at_index = self.key(index);
            if key == key_at_index {
                return index;
            }
            if key < key_at_index {
                one_past_max = index;
            } else {
                min = index + 1;
            }
        }
        min
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> LeafNode<B> {
    /// Format a page as an empty, non-root leaf
    pub fn initialize(mut buf: B, layout: NodeLayout) -> Self {
        let bytes = buf.as_mut();
        bytes[..LEAF_NODE_HEADER_SIZE].fill(0);
        set_node_type(bytes, NodeType::Leaf);
        Self { buf, layout }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    pub fn set_root(&mut self, root: bool) {
        set_root(self.bytes_mut(), root);
    }

    pub fn set_parent(&mut self, parent_page: PageId) {
        set_parent(self.bytes_mut(), parent_page);
    }

    pub fn set_num_cells(&mut self, num_cells: usize) {
        write_u32(self.bytes_mut(), LEAF_NODE_NUM_CELLS_OFFSET, num_cells as u32);
    }

    pub fn set_next_leaf(&mut self, next: PageId) {
        write_u32(self.bytes_mut(), LEAF_NODE_NEXT_LEAF_OFFSET, next);
    }

    /// Overwrite the cell at `cell` with raw cell bytes (key followed by value)
    pub fn write_raw_cell(&mut self, cell: usize, raw: &[u8]) {
        let range = self.layout.leaf_cell_range(cell);
        self.bytes_mut()[range].copy_from_slice(raw);
    }

    /// Overwrite the cell at `cell` with `(key, value)`
    pub fn write_cell(&mut self, cell: usize, key: BTreeKey, value: &[u8]) {
        let offset = self.layout.leaf_cell_offset(cell);
        let value_range = self.layout.leaf_value_range(cell);
        let bytes = self.bytes_mut();
        write_u32(bytes, offset, key);
        bytes[value_range].copy_from_slice(value);
    }

    /// Insert `(key, value)` at `cell`, shifting later cells one slot right.
    ///
    /// The caller guarantees the leaf is not full.
    pub fn insert_cell(&mut self, cell: usize, key: BTreeKey, value: &[u8]) {
        let num_cells = self.num_cells();
        if cell < num_cells {
            let start = self.layout.leaf_cell_offset(cell);
            let end = self.layout.leaf_cell_offset(num_cells);
            let cell_size = self.layout.leaf_cell_size;
            self.bytes_mut().copy_within(start..end, start + cell_size);
        }
        self.write_cell(cell, key, value);
        self.set_num_cells(num_cells + 1);
    }
}

/// Internal node view over a page buffer
pub struct InternalNode<B> {
    buf: B,
    layout: NodeLayout,
}

impl<B: AsRef<[u8]>> InternalNode<B> {
    /// Wrap a page that is already known to hold an internal node
    pub fn new(buf: B, layout: NodeLayout) -> Self {
        Self { buf, layout }
    }

    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    pub fn is_root(&self) -> bool {
        is_root(self.bytes())
    }

    pub fn parent(&self) -> PageId {
        parent(self.bytes())
    }

    pub fn num_keys(&self) -> usize {
        read_u32(self.bytes(), INTERNAL_NODE_NUM_KEYS_OFFSET) as usize
    }

    pub fn right_child(&self) -> PageId {
        read_u32(self.bytes(), INTERNAL_NODE_RIGHT_CHILD_OFFSET)
    }

    pub fn key(&self, cell: usize) -> BTreeKey {
        read_u32(
            self.bytes(),
            self.layout.internal_cell_offset(cell) + INTERNAL_NODE_CHILD_SIZE,
        )
    }

    pub fn keys(&self) -> Vec<BTreeKey> {
        (0..self.num_keys()).map(|i| self.key(i)).collect()
    }

    /// Child at `index`; `index == num_keys` is the right child
    pub fn child(&self, index: usize) -> BTreeResult<PageId> {
        let num_keys = self.num_keys();
        match index.cmp(&num_keys) {
            std::cmp::Ordering::Less => {
                Ok(read_u32(self.bytes(), self.layout.internal_cell_offset(index)))
            }
            std::cmp::Ordering::Equal => Ok(self.right_child()),
            std::cmp::Ordering::Greater => {
                Err(BTreeError::ChildIndexOutOfRange { index, num_keys })
            }
        }
    }

    /// All `num_keys + 1` children in key order
    pub fn children(&self) -> BTreeResult<Vec<PageId>> {
        (0..=self.num_keys()).map(|i| self.child(i)).collect()
    }

    /// Index of the child that should contain `key`.
    ///
    /// Returns the first index whose key is `>= key`, or `num_keys` (the right
    /// child) if every key is smaller.
    pub fn find_child_index(&self, key: BTreeKey) -> usize {
        let mut min = 0;
        let mut max = self.num_keys();
        while min != max {
            let index = min + (max - min) / 2;
            if self.key(index) >= key {
                max = index;
            } else {
                min = index + 1;
            }
        }
        min
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> InternalNode<B> {
    /// Format a page as an empty, non-root internal node
    pub fn initialize(mut buf: B, layout: NodeLayout) -> Self {
        let bytes = buf.as_mut();
        bytes[..INTERNAL_NODE_HEADER_SIZE].fill(0);
        set_node_type(bytes, NodeType::Internal);
        Self { buf, layout }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    pub fn set_root(&mut self, root: bool) {
        set_root(self.bytes_mut(), root);
    }

    pub fn set_parent(&mut self, parent_page: PageId) {
        set_parent(self.bytes_mut(), parent_page);
    }

    pub fn set_num_keys(&mut self, num_keys: usize) {
        write_u32(self.bytes_mut(), INTERNAL_NODE_NUM_KEYS_OFFSET, num_keys as u32);
    }

    pub fn set_right_child(&mut self, child: PageId) {
        write_u32(self.bytes_mut(), INTERNAL_NODE_RIGHT_CHILD_OFFSET, child);
    }

    pub fn set_key(&mut self, cell: usize, key: BTreeKey) {
        let offset = self.layout.internal_cell_offset(cell) + INTERNAL_NODE_CHILD_SIZE;
        write_u32(self.bytes_mut(), offset, key);
    }

    /// Overwrite the cell at `cell` with `(child, key)`
    pub fn write_cell(&mut self, cell: usize, child: PageId, key: BTreeKey) {
        let offset = self.layout.internal_cell_offset(cell);
        write_u32(self.bytes_mut(), offset, child);
        self.set_key(cell, key);
    }

    /// Insert `(child, key)` at `cell`, shifting later cells one slot right.
    ///
    /// The caller guarantees the node is below its key capacity.
    pub fn insert_cell(&mut self, cell: usize, child: PageId, key: BTreeKey) {
        let num_keys = self.num_keys();
        if cell < num_keys {
            let start = self.layout.internal_cell_offset(cell);
            let end = self.layout.internal_cell_offset(num_keys);
            self.bytes_mut()
                .copy_within(start..end, start + INTERNAL_NODE_CELL_SIZE);
        }
        self.write_cell(cell, child, key);
        self.set_num_keys(num_keys + 1);
    }
}

/// A page interpreted according to its node type tag
pub enum Node<B> {
    Leaf(LeafNode<B>),
    Internal(InternalNode<B>),
}

impl<B: AsRef<[u8]>> Node<B> {
    /// Build a typed view of `buf`, which was read from page `page_id`.
    ///
    /// The cell count is checked against the layout so that no accessor on
    /// the returned view can index past the page.
    pub fn from_page(page_id: PageId, buf: B, layout: NodeLayout) -> BTreeResult<Self> {
        let tag = buf.as_ref()[NODE_TYPE_OFFSET];
        match NodeType::from_tag(tag) {
            Some(NodeType::Leaf) => {
                let leaf = LeafNode::new(buf, layout);
                if leaf.num_cells() > layout.leaf_max_cells() {
                    return Err(BTreeError::CorruptNode {
                        page_id,
                        reason: format!(
                            "leaf holds {} cells, at most {} fit",
                            leaf.num_cells(),
                            layout.leaf_max_cells()
                        ),
                    });
                }
                Ok(Node::Leaf(leaf))
            }
            Some(NodeType::Internal) => {
                let node = InternalNode::new(buf, layout);
                if node.num_keys() > layout.internal_capacity() {
                    return Err(BTreeError::CorruptNode {
                        page_id,
                        reason: format!(
                            "internal node holds {} keys, at most {} fit",
                            node.num_keys(),
                            layout.internal_capacity()
                        ),
                    });
                }
                Ok(Node::Internal(node))
            }
            None => Err(BTreeError::InvalidNodeType { page_id, tag }),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Leaf(_) => NodeType::Leaf,
            Node::Internal(_) => NodeType::Internal,
        }
    }

    pub fn is_root(&self) -> bool {
        match self {
            Node::Leaf(leaf) => leaf.is_root(),
            Node::Internal(internal) => internal.is_root(),
        }
    }

    pub fn parent(&self) -> PageId {
        match self {
            Node::Leaf(leaf) => leaf.parent(),
            Node::Internal(internal) => internal.parent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::PAGE_SIZE;
    use crate::record::ROW_SIZE;

    fn layout() -> NodeLayout {
        NodeLayout::new(ROW_SIZE, PAGE_SIZE)
    }

    fn value(byte: u8) -> Vec<u8> {
        vec![byte; ROW_SIZE]
    }

    #[test]
    fn test_layout_constants() {
        let layout = layout();

        assert_eq!(COMMON_NODE_HEADER_SIZE, 6);
        assert_eq!(LEAF_NODE_HEADER_SIZE, 14);
        assert_eq!(INTERNAL_NODE_HEADER_SIZE, 14);
        assert_eq!(layout.leaf_cell_size(), 297);
        assert_eq!(layout.leaf_space_for_cells(), 4082);
        assert_eq!(layout.leaf_max_cells(), 13);
        assert_eq!(layout.leaf_right_split_count(), 7);
        assert_eq!(layout.leaf_left_split_count(), 7);
        assert_eq!(layout.internal_max_cells(), 3);
        assert_eq!(layout.internal_capacity(), 510);
    }

    #[test]
    fn test_split_counts_cover_all_cells() {
        for value_size in [1, 10, 100, 293, 1000] {
            let layout = NodeLayout::new(value_size, PAGE_SIZE);
            assert_eq!(
                layout.leaf_left_split_count() + layout.leaf_right_split_count(),
                layout.leaf_max_cells() + 1
            );
            assert!(layout.leaf_right_split_count() >= layout.leaf_left_split_count());
        }
    }

    #[test]
    fn test_internal_max_cells_override() {
        let layout = layout().with_internal_max_cells(100);
        assert_eq!(layout.internal_max_cells(), 100);

        let layout = layout.with_internal_max_cells(0);
        assert_eq!(layout.internal_max_cells(), 1);

        let layout = layout.with_internal_max_cells(usize::MAX);
        assert_eq!(layout.internal_max_cells(), layout.internal_capacity());
    }

    #[test]
    fn test_node_type_tags() {
        assert_eq!(NodeType::from_tag(0), Some(NodeType::Internal));
        assert_eq!(NodeType::from_tag(1), Some(NodeType::Leaf));
        assert_eq!(NodeType::from_tag(2), None);
        assert_eq!(NodeType::Leaf.tag(), 1);
    }

    #[test]
    fn test_leaf_initialize() {
        let mut page = [0xAAu8; PAGE_SIZE];
        let leaf = LeafNode::initialize(&mut page, layout());

        assert_eq!(leaf.num_cells(), 0);
        assert_eq!(leaf.next_leaf(), 0);
        assert!(!leaf.is_root());
        assert_eq!(leaf.max_key(), None);
        assert_eq!(node_type(&page), Some(NodeType::Leaf));
    }

    #[test]
    fn test_leaf_insert_cell_keeps_order() {
        let mut page = [0u8; PAGE_SIZE];
        let mut leaf = LeafNode::initialize(&mut page, layout());

        for (byte, key) in [(1u8, 10u32), (2, 30), (3, 20), (4, 5)] {
            let cell = leaf.find(key);
            leaf.insert_cell(cell, key, &value(byte));
        }

        assert_eq!(leaf.keys(), vec![5, 10, 20, 30]);
        assert_eq!(leaf.value(0), value(4).as_slice());
        assert_eq!(leaf.value(2), value(3).as_slice());
        assert_eq!(leaf.value(3), value(2).as_slice());
        assert_eq!(leaf.max_key(), Some(30));
    }

    #[test]
    fn test_leaf_find() {
        let mut page = [0u8; PAGE_SIZE];
        let mut leaf = LeafNode::initialize(&mut page, layout());
        for (i, key) in [2u32, 4, 6, 8].into_iter().enumerate() {
            leaf.insert_cell(i, key, &value(0));
        }

        assert_eq!(leaf.find(0), 0);
        assert_eq!(leaf.find(2), 0);
        assert_eq!(leaf.find(5), 2);
        assert_eq!(leaf.find(8), 3);
        assert_eq!(leaf.find(9), 4);
    }

    #[test]
    fn test_leaf_header_fields() {
        let mut page = [0u8; PAGE_SIZE];
        let mut leaf = LeafNode::initialize(&mut page, layout());
        leaf.set_root(true);
        leaf.set_parent(7);
        leaf.set_next_leaf(9);

        assert!(leaf.is_root());
        assert_eq!(leaf.parent(), 7);
        assert_eq!(leaf.next_leaf(), 9);
        assert_eq!(&page[PARENT_POINTER_OFFSET..PARENT_POINTER_OFFSET + 4], &7u32.to_le_bytes());
    }

    #[test]
    fn test_internal_children() {
        let mut page = [0u8; PAGE_SIZE];
        let mut node = InternalNode::initialize(&mut page, layout());
        node.insert_cell(0, 1, 10);
        node.insert_cell(1, 2, 20);
        node.set_right_child(3);

        assert_eq!(node.num_keys(), 2);
        assert_eq!(node.keys(), vec![10, 20]);
        assert_eq!(node.children().unwrap(), vec![1, 2, 3]);
        assert_eq!(node.child(2).unwrap(), 3);
        assert!(matches!(
            node.child(3),
            Err(BTreeError::ChildIndexOutOfRange { index: 3, num_keys: 2 })
        ));
    }

    #[test]
    fn test_internal_find_child_index() {
        let mut page = [0u8; PAGE_SIZE];
        let mut node = InternalNode::initialize(&mut page, layout());
        node.insert_cell(0, 1, 3);
        node.insert_cell(1, 2, 7);
        node.insert_cell(2, 4, 12);
        node.set_right_child(5);

        assert_eq!(node.find_child_index(1), 0);
        assert_eq!(node.find_child_index(3), 0);
        assert_eq!(node.find_child_index(5), 1);
        assert_eq!(node.find_child_index(7), 1);
        assert_eq!(node.find_child_index(10), 2);
        assert_eq!(node.find_child_index(15), 3);
    }

    #[test]
    fn test_internal_insert_cell_shifts() {
        let mut page = [0u8; PAGE_SIZE];
        let mut node = InternalNode::initialize(&mut page, layout());
        node.insert_cell(0, 1, 3);
        node.insert_cell(1, 3, 12);
        node.insert_cell(1, 2, 7);

        assert_eq!(node.keys(), vec![3, 7, 12]);
        assert_eq!(node.child(0).unwrap(), 1);
        assert_eq!(node.child(1).unwrap(), 2);
        assert_eq!(node.child(2).unwrap(), 3);
    }

    #[test]
    fn test_node_from_page() {
        let mut page = [0u8; PAGE_SIZE];
        LeafNode::initialize(&mut page, layout());
        let node = Node::from_page(4, &page, layout()).unwrap();
        assert_eq!(node.node_type(), NodeType::Leaf);

        write_u32(&mut page, LEAF_NODE_NUM_CELLS_OFFSET, 14);
        assert!(matches!(
            Node::from_page(4, &page, layout()),
            Err(BTreeError::CorruptNode { page_id: 4, .. })
        ));

        InternalNode::initialize(&mut page, layout());
        write_u32(&mut page, INTERNAL_NODE_NUM_KEYS_OFFSET, 511);
        assert!(matches!(
            Node::from_page(4, &page, layout()),
            Err(BTreeError::CorruptNode { page_id: 4, .. })
        ));

        page[NODE_TYPE_OFFSET] = 9;
        assert!(matches!(
            Node::from_page(4, &page, layout()),
            Err(BTreeError::InvalidNodeType { page_id: 4, tag: 9 })
        ));
    }
}
