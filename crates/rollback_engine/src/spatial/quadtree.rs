//! Quadtree broad phase
//!
//! Rebuilt from scratch every update. Colliders are first inserted into the
//! root, whose bounds grow to cover them; the root is then subdivided
//! wherever a node holds more than `max_colliders_in_node` entries. An entry
//! moves down only if it overlaps exactly one child, so an entry that
//! straddles a split line stays in the parent.
//!
//! Nodes live in a flat pool sized for a complete tree of `max_depth` levels
//! and are handed out by a cursor, so a rebuild never allocates nodes.

use crate::core::config::PhysicsConfig;
use crate::foundation::math::Vec2;
use crate::foundation::memory::{AllocError, Allocator};
use crate::physics::collider::{ColliderHandle, ColliderPair};
use crate::physics::collision::Aabb;

/// Collider stored in a quadtree node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadEntry {
    /// Collider this entry stands for
    pub collider: ColliderHandle,
    /// World-space bounds of the collider
    pub aabb: Aabb,
}

/// Single node of the quadtree
#[derive(Debug, Clone)]
pub struct QuadNode {
    /// World-space bounds of this node
    pub bounds: Aabb,
    /// Entries kept at this level
    pub entries: Vec<QuadEntry>,
    /// Pool indices of the four children, `None` for a leaf
    ///
    /// Child layout:
    /// 0: -X, -Y (bottom-left)
    /// 1: +X, -Y (bottom-right)
    /// 2: -X, +Y (top-left)
    /// 3: +X, +Y (top-right)
    pub children: Option<[usize; 4]>,
    /// Depth in the tree (0 = root)
    pub depth: u32,
}

impl QuadNode {
    fn new(capacity: usize) -> Self {
        Self {
            bounds: Aabb::new(Vec2::zeros(), Vec2::zeros()),
            entries: Vec::with_capacity(capacity),
            children: None,
            depth: 0,
        }
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Quadtree over collider bounding boxes
#[derive(Debug, Clone)]
pub struct QuadTree {
    nodes: Vec<QuadNode>,
    node_cursor: usize,
    possible_pairs: Vec<ColliderPair>,
    max_depth: u32,
    max_colliders_in_node: usize,
    world_extent: f32,
}

impl QuadTree {
    /// Index of the root node in the pool
    pub const ROOT: usize = 0;

    /// Reserve the node pool and the candidate-pair list against `allocator`
    ///
    /// Fails with [`AllocError::OutOfMemory`] when the complete tree does not
    /// fit in the allocator's budget.
    pub fn init(config: &PhysicsConfig, allocator: &mut dyn Allocator) -> Result<Self, AllocError> {
        let node_count = config.quadtree_node_count();
        let entries_per_node = config.max_colliders_in_node + 1;
        let pair_capacity = config.initial_capacity * config.initial_capacity / 2;

        allocator.allocate(node_count, std::mem::size_of::<QuadNode>())?;
        allocator.allocate(node_count * entries_per_node, std::mem::size_of::<QuadEntry>())?;
        allocator.allocate(pair_capacity, std::mem::size_of::<ColliderPair>())?;

        log::debug!(
            "Quadtree pool: {} nodes, depth {}, {} of {} budget bytes used",
            node_count,
            config.max_depth,
            allocator.used(),
            allocator.capacity()
        );

        let mut tree = Self {
            nodes: (0..node_count).map(|_| QuadNode::new(entries_per_node)).collect(),
            node_cursor: 1,
            possible_pairs: Vec::with_capacity(pair_capacity),
            max_depth: config.max_depth,
            max_colliders_in_node: config.max_colliders_in_node,
            world_extent: config.world_extent,
        };
        tree.clear();
        Ok(tree)
    }

    /// Reset every node and the pair list, and set the root bounds to the
    /// inverted sentinel box so the first insertion defines them
    pub fn clear(&mut self) {
        for node in &mut self.nodes[..self.node_cursor] {
            node.entries.clear();
            node.children = None;
        }
        self.node_cursor = 1;
        self.possible_pairs.clear();

        let root = &mut self.nodes[Self::ROOT];
        root.depth = 0;
        root.bounds = Aabb::new(Vec2::new(self.world_extent, self.world_extent), Vec2::zeros());
    }

    /// Add a collider to the root, growing the root bounds to cover it
    pub fn insert_in_root_node(&mut self, collider: ColliderHandle, aabb: Aabb) {
        let root = &mut self.nodes[Self::ROOT];
        root.bounds.min.x = root.bounds.min.x.min(aabb.min.x);
        root.bounds.min.y = root.bounds.min.y.min(aabb.min.y);
        root.bounds.max.x = root.bounds.max.x.max(aabb.max.x);
        root.bounds.max.y = root.bounds.max.y.max(aabb.max.y);
        root.entries.push(QuadEntry { collider, aabb });
    }

    /// Split `node` and its descendants while they exceed the occupancy threshold
    pub fn subdivide_node_recursively(&mut self, node: usize) {
        let depth = self.nodes[node].depth;
        if self.nodes[node].entries.len() <= self.max_colliders_in_node || depth >= self.max_depth {
            return;
        }
        if self.node_cursor + 4 > self.nodes.len() {
            log::warn!("Quadtree node pool exhausted at depth {}", depth);
            return;
        }

        let bounds = self.nodes[node].bounds;
        let first_child = self.node_cursor;
        self.node_cursor += 4;
        let children = [first_child, first_child + 1, first_child + 2, first_child + 3];
        for (quadrant, &child) in children.iter().enumerate() {
            let child_node = &mut self.nodes[child];
            child_node.bounds = bounds.quadrant(quadrant);
            child_node.depth = depth + 1;
            child_node.children = None;
            child_node.entries.clear();
        }
        self.nodes[node].children = Some(children);

        // Compact in place: entries overlapping exactly one child move down
        let mut entries = std::mem::take(&mut self.nodes[node].entries);
        let mut kept = 0;
        for read in 0..entries.len() {
            let entry = entries[read];
            match self.single_overlapping_child(&children, &entry.aabb) {
                Some(child) => self.nodes[child].entries.push(entry),
                None => {
                    entries[kept] = entry;
                    kept += 1;
                }
            }
        }
        entries.truncate(kept);
        self.nodes[node].entries = entries;

        for child in children {
            self.subdivide_node_recursively(child);
        }
    }

    fn single_overlapping_child(&self, children: &[usize; 4], aabb: &Aabb) -> Option<usize> {
        let mut overlapping = children
            .iter()
            .copied()
            .filter(|&child| self.nodes[child].bounds.intersects(aabb));
        match (overlapping.next(), overlapping.next()) {
            (Some(child), None) => Some(child),
            _ => None,
        }
    }

    /// Collect candidate pairs under `node`
    ///
    /// Each entry is paired with the other entries of its own node and with
    /// every entry of every descendant node. Two entries in sibling subtrees
    /// are never paired.
    pub fn find_possible_pairs(&mut self, node: usize) {
        let entries = &self.nodes[node].entries;
        for (i, first) in entries.iter().enumerate() {
            for second in &entries[i + 1..] {
                self.possible_pairs.push(ColliderPair::new(first.collider, second.collider));
            }
        }

        let Some(children) = self.nodes[node].children else {
            return;
        };

        if !self.nodes[node].entries.is_empty() {
            let mut stack: Vec<usize> = children.iter().rev().copied().collect();
            while let Some(descendant) = stack.pop() {
                let descendant_node = &self.nodes[descendant];
                for entry in &self.nodes[node].entries {
                    for other in &descendant_node.entries {
                        self.possible_pairs.push(ColliderPair::new(entry.collider, other.collider));
                    }
                }
                if let Some(grandchildren) = descendant_node.children {
                    stack.extend(grandchildren.iter().rev());
                }
            }
        }

        for child in children {
            self.find_possible_pairs(child);
        }
    }

    /// Run subdivision and pair collection from the root
    pub fn build_pairs(&mut self) -> &[ColliderPair] {
        self.subdivide_node_recursively(Self::ROOT);
        self.find_possible_pairs(Self::ROOT);
        &self.possible_pairs
    }

    /// Candidate pairs found since the last [`clear`](Self::clear)
    pub fn possible_pairs(&self) -> &[ColliderPair] {
        &self.possible_pairs
    }

    /// The root node
    pub fn root(&self) -> &QuadNode {
        &self.nodes[Self::ROOT]
    }

    /// Node at a pool index, if it is in use
    pub fn node(&self, index: usize) -> Option<&QuadNode> {
        self.nodes[..self.node_cursor].get(index)
    }

    /// Nodes handed out since the last clear (the root included)
    pub fn nodes_in_use(&self) -> usize {
        self.node_cursor
    }

    /// Size of the node pool
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }
}
