//! Reconstruction of the container tree from the flat element list.
//!
//! Nodes live in an arena owned by [`Hierarchy`]; parent links are plain
//! indices, so malformed input can never produce an ownership cycle.

use crate::model::{ConnectionAttributes, Diagram, DiagramElement, ElementId, ShapeAttributes};
use kurbo::{Rect, Vec2};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Index of a node in the hierarchy arena.
pub type NodeIndex = usize;

/// Index of the synthetic diagram root.
pub const ROOT: NodeIndex = 0;

/// A reconciled tree node.
#[derive(Debug, Clone)]
pub struct HierarchyNode<'a> {
    element: Option<&'a DiagramElement>,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
}

impl<'a> HierarchyNode<'a> {
    /// The model element, `None` for the diagram root.
    pub fn element(&self) -> Option<&'a DiagramElement> {
        self.element
    }

    pub fn is_root(&self) -> bool {
        self.element.is_none()
    }

    pub fn is_shape(&self) -> bool {
        self.element.is_some_and(DiagramElement::is_shape)
    }

    pub fn shape(&self) -> Option<&'a ShapeAttributes> {
        self.element.and_then(DiagramElement::as_shape)
    }

    pub fn connection(&self) -> Option<&'a ConnectionAttributes> {
        self.element.and_then(DiagramElement::as_connection)
    }

    pub fn id(&self) -> Option<ElementId> {
        self.element.map(DiagramElement::id)
    }

    /// Parent node index; `None` only for the root.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Child indices in draw order.
    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Pending,
    InProgress,
    Done,
}

/// The rooted element tree for one render pass.
#[derive(Debug, Clone)]
pub struct Hierarchy<'a> {
    nodes: Vec<HierarchyNode<'a>>,
    index: HashMap<ElementId, NodeIndex>,
    include_root: bool,
}

impl<'a> Hierarchy<'a> {
    /// Build the tree for a diagram.
    ///
    /// Elements are nested under their `parent_id` shape; missing, dangling,
    /// non-shape and cyclic parent references attach to the root instead.
    /// Siblings keep their original list order. When `include_root` is set,
    /// [`Hierarchy::walk`] yields the synthetic root first.
    pub fn build(diagram: &'a Diagram, include_root: bool) -> Self {
        let count = diagram.elements.len();
        let mut nodes = Vec::with_capacity(count + 1);
        nodes.push(HierarchyNode {
            element: None,
            parent: None,
            children: Vec::new(),
        });

        let mut index = HashMap::with_capacity(count);
        for (i, element) in diagram.elements.iter().enumerate() {
            let node = i + 1;
            match index.entry(element.id()) {
                // First occurrence keeps the id.
                Entry::Occupied(_) => {
                    log::warn!("Duplicate element id {}; later occurrence is unreferenceable", element.id());
                }
                Entry::Vacant(slot) => {
                    slot.insert(node);
                }
            }
            nodes.push(HierarchyNode {
                element: Some(element),
                parent: None,
                children: Vec::new(),
            });
        }

        // Resolve intended parents.
        let mut parents: Vec<NodeIndex> = vec![ROOT; count + 1];
        for (i, element) in diagram.elements.iter().enumerate() {
            let node = i + 1;
            let Some(parent_id) = element.parent_id() else {
                continue;
            };
            match index.get(&parent_id) {
                Some(&parent) if parent == node => {
                    log::warn!("Element {} references itself as parent; attaching to root", element.id());
                }
                Some(&parent) if nodes[parent].is_shape() => parents[node] = parent,
                Some(_) => {
                    log::warn!("Element {} has non-container parent {}; attaching to root", element.id(), parent_id);
                }
                None => {
                    log::warn!("Element {} has unknown parent {}; attaching to root", element.id(), parent_id);
                }
            }
        }

        break_cycles(&mut parents);

        for node in 1..=count {
            let parent = parents[node];
            nodes[node].parent = Some(parent);
            nodes[parent].children.push(node);
        }

        Self {
            nodes,
            index,
            include_root,
        }
    }

    pub fn root(&self) -> &HierarchyNode<'a> {
        &self.nodes[ROOT]
    }

    /// Get a node by index.
    pub fn node(&self, index: NodeIndex) -> &HierarchyNode<'a> {
        &self.nodes[index]
    }

    /// Look up a node by element id.
    pub fn get(&self, id: ElementId) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }

    /// Number of elements (the root is not counted).
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Depth-first pre-order walk yielding `(node, depth)`.
    ///
    /// Top-level elements have depth 1; the root (depth 0) is only yielded
    /// when the hierarchy was built with `include_root`.
    pub fn walk(&self) -> Vec<(NodeIndex, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeIndex, usize)> = vec![(ROOT, 0)];
        while let Some((node, depth)) = stack.pop() {
            if node != ROOT || self.include_root {
                out.push((node, depth));
            }
            for &child in self.nodes[node].children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }

    /// Ancestors of a node, nearest first, excluding the root.
    pub fn ancestors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let mut current = self.nodes[index].parent;
        std::iter::from_fn(move || {
            let node = current.filter(|&n| n != ROOT)?;
            current = self.nodes[node].parent;
            Some(node)
        })
    }

    /// Nearest containing shape, `None` when the node sits at the root.
    pub fn container_of(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.ancestors(index).next()
    }

    /// Cumulative offset of all ancestor containers (sum of their `x, y`).
    pub fn absolute_offset(&self, index: NodeIndex) -> Vec2 {
        self.ancestors(index)
            .filter_map(|ancestor| self.nodes[ancestor].shape())
            .fold(Vec2::ZERO, |acc, shape| acc + Vec2::new(shape.x, shape.y))
    }

    /// Bounds of a shape node in diagram coordinates.
    pub fn absolute_bounds(&self, index: NodeIndex) -> Option<Rect> {
        let shape = self.nodes[index].shape()?;
        Some(shape.local_bounds() + self.absolute_offset(index))
    }

    /// Connection nodes in document order.
    pub fn connections(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        (1..self.nodes.len()).filter(|&node| self.nodes[node].connection().is_some())
    }
}

/// Detach the closing link of every parent cycle, in O(n).
fn break_cycles(parents: &mut [NodeIndex]) {
    let mut state = vec![Visit::Pending; parents.len()];
    state[ROOT] = Visit::Done;
    let mut path = Vec::new();

    for start in 1..parents.len() {
        if state[start] != Visit::Pending {
            continue;
        }
        let mut node = start;
        loop {
            match state[node] {
                Visit::Done => break,
                Visit::InProgress => {
                    // `node` is on the current path: the last step closed a cycle.
                    if let Some(&tail) = path.last() {
                        log::warn!("Parent cycle detected at node {}; attaching to root", tail);
                        parents[tail] = ROOT;
                    }
                    break;
                }
                Visit::Pending => {
                    state[node] = Visit::InProgress;
                    path.push(node);
                    node = parents[node];
                }
            }
        }
        for visited in path.drain(..) {
            state[visited] = Visit::Done;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConnectionAttributes, ShapeAttributes};
    use kurbo::Rect;

    fn shape(id: ElementId, parent: Option<ElementId>, x: f64, y: f64) -> ShapeAttributes {
        let mut s = ShapeAttributes::new(id, "Rectangle", Rect::new(x, y, x + 20.0, y + 20.0));
        s.parent_id = parent;
        s
    }

    fn ids(h: &Hierarchy, nodes: &[NodeIndex]) -> Vec<ElementId> {
        nodes.iter().filter_map(|&n| h.node(n).id()).collect()
    }

    #[test]
    fn test_nesting_preserves_sibling_order() {
        let diagram = Diagram::new("generic")
            .with(shape(1, None, 0.0, 0.0))
            .with(shape(2, Some(1), 0.0, 0.0))
            .with(shape(3, None, 0.0, 0.0))
            .with(shape(4, Some(1), 0.0, 0.0));
        let h = Hierarchy::build(&diagram, false);

        assert_eq!(ids(&h, h.root().children()), vec![1, 3]);
        let one = h.get(1).unwrap();
        assert_eq!(ids(&h, h.node(one).children()), vec![2, 4]);
    }

    #[test]
    fn test_forward_parent_reference() {
        let diagram = Diagram::new("generic")
            .with(shape(2, Some(1), 0.0, 0.0))
            .with(shape(1, None, 0.0, 0.0));
        let h = Hierarchy::build(&diagram, false);
        let one = h.get(1).unwrap();
        assert_eq!(ids(&h, h.node(one).children()), vec![2]);
        assert_eq!(ids(&h, h.root().children()), vec![1]);
    }

    #[test]
    fn test_dangling_and_self_references_attach_to_root() {
        let diagram = Diagram::new("generic")
            .with(shape(1, Some(99), 0.0, 0.0))
            .with(shape(2, Some(2), 0.0, 0.0));
        let h = Hierarchy::build(&diagram, false);
        assert_eq!(ids(&h, h.root().children()), vec![1, 2]);
    }

    #[test]
    fn test_cycle_is_broken() {
        let diagram = Diagram::new("generic")
            .with(shape(1, Some(3), 0.0, 0.0))
            .with(shape(2, Some(1), 0.0, 0.0))
            .with(shape(3, Some(2), 0.0, 0.0));
        let h = Hierarchy::build(&diagram, false);

        // Walking from 1: 1 -> 3 -> 2 -> 1 closes at 2, which is detached.
        assert_eq!(ids(&h, h.root().children()), vec![2]);
        let walked: Vec<_> = h.walk().into_iter().map(|(n, _)| n).collect();
        assert_eq!(walked.len(), 3);
    }

    #[test]
    fn test_connection_parent_is_not_a_container() {
        let diagram = Diagram::new("generic")
            .with(shape(1, None, 0.0, 0.0))
            .with(ConnectionAttributes::new(2, Some(1), None))
            .with(shape(3, Some(2), 0.0, 0.0));
        let h = Hierarchy::build(&diagram, false);
        assert_eq!(ids(&h, h.root().children()), vec![1, 2, 3]);
        assert!(!h.node(h.get(2).unwrap()).is_shape());
    }

    #[test]
    fn test_every_element_appears_exactly_once() {
        let mut diagram = Diagram::new("generic");
        for id in 1..=20u64 {
            let parent = if id % 3 == 0 { Some((id * 7) % 20 + 1) } else { None };
            diagram.push(shape(id, parent, 0.0, 0.0));
        }
        diagram.push(ConnectionAttributes::new(21, Some(1), Some(2)));
        let h = Hierarchy::build(&diagram, false);

        let total: usize = (0..=h.len()).map(|n| h.node(n).children().len()).sum();
        assert_eq!(total, diagram.elements.len());

        let mut seen: Vec<_> = h.walk().into_iter().filter_map(|(n, _)| h.node(n).id()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), diagram.elements.len());
    }

    #[test]
    fn test_walk_depths_and_include_root() {
        let diagram = Diagram::new("generic")
            .with(shape(1, None, 0.0, 0.0))
            .with(shape(2, Some(1), 0.0, 0.0));
        let h = Hierarchy::build(&diagram, true);
        let walked = h.walk();
        assert_eq!(walked[0], (ROOT, 0));
        assert_eq!(walked[1].1, 1);
        assert_eq!(walked[2].1, 2);

        let h = Hierarchy::build(&diagram, false);
        assert_eq!(h.walk().len(), 2);
    }

    #[test]
    fn test_absolute_offset_two_containers_deep() {
        let diagram = Diagram::new("generic")
            .with(shape(1, None, 10.0, 10.0))
            .with(shape(2, Some(1), 5.0, 5.0))
            .with(shape(3, Some(2), 7.0, 3.0));
        let h = Hierarchy::build(&diagram, false);
        let leaf = h.get(3).unwrap();

        let offset = h.absolute_offset(leaf);
        assert!((offset.x - 15.0).abs() < f64::EPSILON);
        assert!((offset.y - 15.0).abs() < f64::EPSILON);

        let bounds = h.absolute_bounds(leaf).unwrap();
        assert!((bounds.x0 - 22.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 18.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let diagram = Diagram::new("generic")
            .with(shape(1, None, 1.0, 0.0))
            .with(shape(1, None, 2.0, 0.0))
            .with(shape(2, Some(1), 0.0, 0.0));
        let h = Hierarchy::build(&diagram, false);
        assert_eq!(h.get(1), Some(1));
        assert_eq!(h.root().children().len(), 2);
        assert_eq!(h.node(1).children(), &[3]);
    }
}
