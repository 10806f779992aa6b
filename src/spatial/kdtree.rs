//! k-d tree over fixed-dimension points
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Each node splits
//! space on axis `depth mod D` (offset by the tree's root axis): every point in
//! the left subtree is strictly less than the node on that axis, every point in
//! the right subtree is greater or equal. Both the one-shot balanced build and
//! single-point insertion preserve that rule.
//!
//! Every node carries a payload `V` (unit by default). Planners use it to keep
//! per-node data such as a parent link without a side table.

use crate::common::{Coordinate, Point};
use std::cmp::Ordering;

/// Handle to a node of a [`KdTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the tree's arena (insertion order)
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
struct KdNode<T, const D: usize, V> {
    point: Point<T, D>,
    value: V,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

/// A k-d tree of `D`-dimensional points with per-node payloads of type `V`
///
/// `D` must be at least 1.
#[derive(Debug, Clone)]
pub struct KdTree<T, const D: usize, V = ()> {
    nodes: Vec<KdNode<T, D, V>>,
    root: Option<NodeId>,
    root_axis: usize,
}

impl<T: Coordinate, const D: usize, V> Default for KdTree<T, D, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Coordinate, const D: usize> KdTree<T, D, ()> {
    /// Build a balanced tree from a batch of points
    pub fn from_points(points: &[Point<T, D>]) -> Self {
        let mut tree = Self::new();
        tree.build(points);
        tree
    }

    /// Replace the tree contents with a balanced tree over `points`
    pub fn build(&mut self, points: &[Point<T, D>]) {
        self.build_with_values(points.iter().map(|&p| (p, ())).collect());
    }
}

impl<T: Coordinate, const D: usize, V> KdTree<T, D, V> {
    /// Create an empty tree splitting on axis 0 at the root
    pub fn new() -> Self {
        Self::with_root_axis(0)
    }

    /// Create an empty tree splitting on `axis mod D` at the root
    ///
    /// The root axis is fixed for the life of the tree; insertion and every
    /// query follow it.
    pub fn with_root_axis(axis: usize) -> Self {
        KdTree {
            nodes: Vec::new(),
            root: None,
            root_axis: axis % D,
        }
    }

    /// Axis the root node splits on
    pub fn root_axis(&self) -> usize {
        self.root_axis
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove every node, keeping the root axis
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Replace the tree contents with a balanced tree over `entries`
    ///
    /// Node ids follow the order of `entries`. Each level is split with a
    /// linear-time median selection, so construction is expected O(n log n).
    pub fn build_with_values(&mut self, entries: Vec<(Point<T, D>, V)>) {
        self.nodes = entries
            .into_iter()
            .map(|(point, value)| KdNode {
                point,
                value,
                left: None,
                right: None,
            })
            .collect();
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        self.root = link_balanced(&mut self.nodes, &mut order, self.root_axis);
    }

    /// Insert a single point below the existing nodes
    ///
    /// Descends by comparing on each level's axis (less goes left, otherwise
    /// right) and links a new leaf at the first empty slot. Equal points are
    /// kept as distinct nodes.
    pub fn insert(&mut self, point: Point<T, D>, value: V) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(KdNode {
            point,
            value,
            left: None,
            right: None,
        });

        let Some(mut current) = self.root else {
            self.root = Some(id);
            return id;
        };
        let mut axis = self.root_axis;
        loop {
            let node = &mut self.nodes[current.0];
            let slot = if point[axis] < node.point[axis] {
                &mut node.left
            } else {
                &mut node.right
            };
            match *slot {
                Some(next) => {
                    current = next;
                    axis = (axis + 1) % D;
                }
                None => {
                    *slot = Some(id);
                    return id;
                }
            }
        }
    }

    /// Point stored at `id`
    ///
    /// `id` must come from this tree.
    pub fn point(&self, id: NodeId) -> &Point<T, D> {
        &self.nodes[id.0].point
    }

    /// Payload stored at `id`
    pub fn value(&self, id: NodeId) -> &V {
        &self.nodes[id.0].value
    }

    /// Mutable payload stored at `id`
    pub fn value_mut(&mut self, id: NodeId) -> &mut V {
        &mut self.nodes[id.0].value
    }

    /// Iterate over all nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Point<T, D>, &V)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i), &node.point, &node.value))
    }

    /// Number of levels on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        fn depth_of<T, const D: usize, V>(nodes: &[KdNode<T, D, V>], id: Option<NodeId>) -> usize {
            match id {
                None => 0,
                Some(id) => {
                    let node = &nodes[id.0];
                    1 + depth_of(nodes, node.left).max(depth_of(nodes, node.right))
                }
            }
        }
        depth_of(&self.nodes, self.root)
    }

    /// Node closest to `query` and its distance, `None` on an empty tree
    ///
    /// When several nodes are equally close, any one of them may be returned.
    pub fn nearest(&self, query: &Point<T, D>) -> Option<(NodeId, f64)> {
        let root = self.root?;
        let mut best = (root, f64::INFINITY);
        self.nearest_recursive(root, query, self.root_axis, &mut best);
        Some(best)
    }

    /// Handle of the node closest to `query`
    pub fn search(&self, query: &Point<T, D>) -> Option<NodeId> {
        self.nearest(query).map(|(id, _)| id)
    }

    /// Copy of the point closest to `query`
    pub fn nearest_point(&self, query: &Point<T, D>) -> Option<Point<T, D>> {
        self.nearest(query).map(|(id, _)| self.nodes[id.0].point)
    }

    /// Handles of every node within `radius` of `query`, in no particular order
    pub fn radius_query_ids(&self, query: &Point<T, D>, radius: f64) -> Vec<NodeId> {
        let mut found = Vec::new();
        if let Some(root) = self.root {
            self.radius_recursive(root, query, radius, self.root_axis, &mut found);
        }
        found
    }

    /// Every point within `radius` of `query`, in no particular order
    pub fn radius_query(&self, query: &Point<T, D>, radius: f64) -> Vec<Point<T, D>> {
        self.radius_query_ids(query, radius)
            .into_iter()
            .map(|id| self.nodes[id.0].point)
            .collect()
    }

    /// Returns true once an exact match has been found.
    fn nearest_recursive(
        &self,
        id: NodeId,
        query: &Point<T, D>,
        axis: usize,
        best: &mut (NodeId, f64),
    ) -> bool {
        let node = &self.nodes[id.0];
        let dist = query.distance_to(&node.point);
        if dist < best.1 {
            *best = (id, dist);
        }
        if dist == 0.0 {
            return true;
        }

        let diff = query[axis].to_f64() - node.point[axis].to_f64();
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        let next_axis = (axis + 1) % D;

        if let Some(near) = near {
            if self.nearest_recursive(near, query, next_axis, best) {
                return true;
            }
        }
        // the far side can only hold something closer if the splitting plane is
        if diff.abs() <= best.1 {
            if let Some(far) = far {
                return self.nearest_recursive(far, query, next_axis, best);
            }
        }
        false
    }

    fn radius_recursive(
        &self,
        id: NodeId,
        query: &Point<T, D>,
        radius: f64,
        axis: usize,
        found: &mut Vec<NodeId>,
    ) {
        let node = &self.nodes[id.0];
        if query.distance_to(&node.point) <= radius {
            found.push(id);
        }

        let diff = query[axis].to_f64() - node.point[axis].to_f64();
        let next_axis = (axis + 1) % D;
        if diff <= radius {
            if let Some(left) = node.left {
                self.radius_recursive(left, query, radius, next_axis, found);
            }
        }
        if -diff <= radius {
            if let Some(right) = node.right {
                self.radius_recursive(right, query, radius, next_axis, found);
            }
        }
    }
}

fn compare_axis<T: Coordinate, const D: usize>(a: &Point<T, D>, b: &Point<T, D>, axis: usize) -> Ordering {
    a[axis].partial_cmp(&b[axis]).unwrap_or(Ordering::Equal)
}

/// Link `order` (indices into `nodes`) into a balanced subtree, returning its root.
fn link_balanced<T: Coordinate, const D: usize, V>(
    nodes: &mut [KdNode<T, D, V>],
    order: &mut [usize],
    axis: usize,
) -> Option<NodeId> {
    if order.is_empty() {
        return None;
    }

    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |&a, &b| compare_axis(&nodes[a].point, &nodes[b].point, axis));

    // Move ties with the median out of the left half so it stays strictly less.
    let pivot = nodes[order[mid]].point[axis];
    let mut split = 0;
    for k in 0..mid {
        if nodes[order[k]].point[axis] < pivot {
            order.swap(k, split);
            split += 1;
        }
    }
    order.swap(split, mid);

    let root = order[split];
    let (left, rest) = order.split_at_mut(split);
    let right = &mut rest[1..];
    let next_axis = (axis + 1) % D;
    let left_root = link_balanced(nodes, left, next_axis);
    let right_root = link_balanced(nodes, right, next_axis);

    nodes[root].left = left_root;
    nodes[root].right = right_root;
    Some(NodeId(root))
}
