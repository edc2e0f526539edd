//! Click-to-selection resolution over a tree of realized cells.

/// Read access to a cell tree, as needed by selection resolution.
pub trait CellTree {
    type Cell: Copy + Eq;

    fn parent(&self, cell: Self::Cell) -> Option<Self::Cell>;

    /// Whether the cell may become the selection.
    fn is_selectable(&self, cell: Self::Cell) -> bool;
}

/// `cell` followed by its ancestors, nearest first.
pub fn ancestors_inclusive<T: CellTree>(tree: &T, cell: T::Cell) -> Vec<T::Cell> {
    let mut chain = vec![cell];
    let mut current = cell;
    while let Some(parent) = tree.parent(current) {
        // Guard against malformed trees.
        if chain.contains(&parent) {
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain
}

/// The nearest selectable cell at or above `cell`.
pub fn nearest_selectable<T: CellTree>(tree: &T, cell: T::Cell) -> Option<T::Cell> {
    ancestors_inclusive(tree, cell)
        .into_iter()
        .find(|&c| tree.is_selectable(c))
}

/// The deepest cell that is `a`, `b` or an ancestor of both.
pub fn nearest_common_ancestor<T: CellTree>(tree: &T, a: T::Cell, b: T::Cell) -> Option<T::Cell> {
    let chain_b = ancestors_inclusive(tree, b);
    ancestors_inclusive(tree, a)
        .into_iter()
        .find(|cell| chain_b.contains(cell))
}

/// Resolve which cell a click on `clicked` selects.
///
/// Without a previous selection the click selects the nearest selectable
/// cell. When extending a selection, the walk stops at the ancestor of
/// `clicked` that is a direct child of the common ancestor with `previous`,
/// so that picking two members of one group selects the members and not an
/// outer container.
pub fn resolve_click<T: CellTree>(tree: &T, clicked: T::Cell, previous: Option<T::Cell>) -> Option<T::Cell> {
    let Some(previous) = previous else {
        return nearest_selectable(tree, clicked);
    };
    let Some(common) = nearest_common_ancestor(tree, clicked, previous) else {
        return nearest_selectable(tree, clicked);
    };
    if common == clicked {
        return nearest_selectable(tree, clicked);
    }

    let chain = ancestors_inclusive(tree, clicked);
    let below_common = chain
        .iter()
        .copied()
        .take_while(|&cell| cell != common)
        .last()
        .unwrap_or(clicked);
    nearest_selectable(tree, below_common)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// parent map plus the set of non-selectable cells.
    struct Tree {
        parents: HashMap<u32, u32>,
        locked: Vec<u32>,
    }

    impl CellTree for Tree {
        type Cell = u32;

        fn parent(&self, cell: u32) -> Option<u32> {
            self.parents.get(&cell).copied()
        }

        fn is_selectable(&self, cell: u32) -> bool {
            cell != 0 && !self.locked.contains(&cell)
        }
    }

    // 0 (root)
    // ├── 1 outer container
    // │   └── 2 group
    // │       ├── 3 member
    // │       │   └── 30 marker (locked)
    // │       └── 4 member
    // └── 5 sibling
    fn tree() -> Tree {
        Tree {
            parents: HashMap::from([(1, 0), (2, 1), (3, 2), (30, 3), (4, 2), (5, 0)]),
            locked: vec![30],
        }
    }

    #[test]
    fn test_walk_up_to_selectable() {
        let tree = tree();
        assert_eq!(nearest_selectable(&tree, 30), Some(3));
        assert_eq!(nearest_selectable(&tree, 4), Some(4));
        assert_eq!(nearest_selectable(&tree, 0), None);
    }

    #[test]
    fn test_common_ancestor() {
        let tree = tree();
        assert_eq!(nearest_common_ancestor(&tree, 30, 4), Some(2));
        assert_eq!(nearest_common_ancestor(&tree, 3, 5), Some(0));
        assert_eq!(nearest_common_ancestor(&tree, 2, 30), Some(2));
    }

    #[test]
    fn test_extend_selection_within_group() {
        let tree = tree();
        // Siblings inside the group stay at member level.
        assert_eq!(resolve_click(&tree, 30, Some(4)), Some(3));
        // A click across top-level branches selects the top-level container.
        assert_eq!(resolve_click(&tree, 30, Some(5)), Some(1));
        assert_eq!(resolve_click(&tree, 4, None), Some(4));
    }

    #[test]
    fn test_cycle_terminates() {
        let tree = Tree {
            parents: HashMap::from([(1, 2), (2, 1)]),
            locked: vec![],
        };
        assert_eq!(ancestors_inclusive(&tree, 1), vec![1, 2]);
    }
}
