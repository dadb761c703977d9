//! In-memory category hierarchy.
//!
//! Categories are loaded flat from the database and indexed here for
//! breadcrumbs, subcategory listings and parent select boxes.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::CategoryId;

/// The fields of a category the tree needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub position: i32,
}

/// One row of [`CategoryTree::flatten`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatCategory<'a> {
    pub node: &'a CategoryNode,
    pub depth: usize,
}

/// Parent/child index over a set of categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: HashMap<CategoryId, CategoryNode>,
    children: HashMap<CategoryId, Vec<CategoryId>>,
    roots: Vec<CategoryId>,
}

impl CategoryTree {
    /// Index `nodes`. Categories whose parent is missing (or themselves)
    /// become roots. Siblings are ordered by position, then name.
    #[must_use]
    pub fn build(nodes: impl IntoIterator<Item = CategoryNode>) -> Self {
        let nodes: HashMap<CategoryId, CategoryNode> =
            nodes.into_iter().map(|n| (n.id, n)).collect();

        let mut children: HashMap<CategoryId, Vec<CategoryId>> = HashMap::new();
        let mut roots = Vec::new();
        for node in nodes.values() {
            match node.parent_id {
                Some(parent) if parent != node.id && nodes.contains_key(&parent) => {
                    children.entry(parent).or_default().push(node.id);
                }
                _ => roots.push(node.id),
            }
        }

        let sort = |ids: &mut Vec<CategoryId>| {
            ids.sort_by_cached_key(|id| {
                nodes
                    .get(id)
                    .map(|n| (n.position, n.name.clone(), n.id))
            });
        };
        sort(&mut roots);
        for ids in children.values_mut() {
            sort(ids);
        }

        Self {
            nodes,
            children,
            roots,
        }
    }

    #[must_use]
    pub fn get(&self, id: CategoryId) -> Option<&CategoryNode> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level categories.
    #[must_use]
    pub fn roots(&self) -> Vec<&CategoryNode> {
        self.roots.iter().filter_map(|id| self.nodes.get(id)).collect()
    }

    /// Direct subcategories of `id`.
    #[must_use]
    pub fn children(&self, id: CategoryId) -> Vec<&CategoryNode> {
        self.children
            .get(&id)
            .map(|ids| ids.iter().filter_map(|c| self.nodes.get(c)).collect())
            .unwrap_or_default()
    }

    /// Breadcrumb from the root down to `id` (inclusive).
    ///
    /// Empty if `id` is unknown. Stops at the first repeated category, so
    /// a corrupted parent cycle cannot loop forever.
    #[must_use]
    pub fn path(&self, id: CategoryId) -> Vec<&CategoryNode> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.nodes.get(&id);
        while let Some(node) = current {
            if !seen.insert(node.id) {
                break;
            }
            path.push(node);
            current = node
                .parent_id
                .filter(|p| *p != node.id)
                .and_then(|p| self.nodes.get(&p));
        }
        path.reverse();
        path
    }

    /// All categories below `id`, depth first, excluding `id` itself.
    #[must_use]
    pub fn descendants(&self, id: CategoryId) -> Vec<CategoryId> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut stack: Vec<CategoryId> = self
            .children
            .get(&id)
            .map(|c| c.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            if let Some(kids) = self.children.get(&next) {
                stack.extend(kids.iter().rev().copied());
            }
        }
        out
    }

    /// Whether `candidate` lies strictly below `ancestor`.
    ///
    /// Used to reject re-parenting a category under its own subtree.
    #[must_use]
    pub fn is_descendant(&self, candidate: CategoryId, ancestor: CategoryId) -> bool {
        candidate != ancestor
            && self
                .path(candidate)
                .iter()
                .any(|node| node.id == ancestor)
    }

    /// Depth-first listing of the whole tree with indentation depth.
    #[must_use]
    pub fn flatten(&self) -> Vec<FlatCategory<'_>> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut seen = HashSet::new();
        let mut stack: Vec<(CategoryId, usize)> =
            self.roots.iter().rev().map(|id| (*id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                out.push(FlatCategory { node, depth });
            }
            if let Some(kids) = self.children.get(&id) {
                stack.extend(kids.iter().rev().map(|k| (*k, depth + 1)));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i32, parent: Option<i32>, name: &str, position: i32) -> CategoryNode {
        CategoryNode {
            id: CategoryId::new(id),
            parent_id: parent.map(CategoryId::new),
            name: name.to_owned(),
            position,
        }
    }

    fn sample() -> CategoryTree {
        CategoryTree::build([
            node(1, None, "Accounts", 1),
            node(2, None, "Billing", 0),
            node(3, Some(1), "Passwords", 0),
            node(4, Some(3), "Two-factor", 0),
            node(5, Some(1), "Deletion", 0),
        ])
    }

    fn ids(nodes: &[&CategoryNode]) -> Vec<i32> {
        nodes.iter().map(|n| n.id.as_i32()).collect()
    }

    #[test]
    fn test_roots_ordered_by_position() {
        assert_eq!(ids(&sample().roots()), vec![2, 1]);
    }

    #[test]
    fn test_children_ordered_by_name_on_equal_position() {
        assert_eq!(ids(&sample().children(CategoryId::new(1))), vec![5, 3]);
        assert!(sample().children(CategoryId::new(2)).is_empty());
    }

    #[test]
    fn test_breadcrumb_path() {
        let tree = sample();
        assert_eq!(ids(&tree.path(CategoryId::new(4))), vec![1, 3, 4]);
        assert!(tree.path(CategoryId::new(99)).is_empty());
    }

    #[test]
    fn test_descendants() {
        let tree = sample();
        let below: Vec<i32> = tree
            .descendants(CategoryId::new(1))
            .iter()
            .map(CategoryId::as_i32)
            .collect();
        assert_eq!(below, vec![5, 3, 4]);
        assert!(tree.is_descendant(CategoryId::new(4), CategoryId::new(1)));
        assert!(!tree.is_descendant(CategoryId::new(1), CategoryId::new(4)));
        assert!(!tree.is_descendant(CategoryId::new(1), CategoryId::new(1)));
    }

    #[test]
    fn test_orphans_become_roots() {
        let tree = CategoryTree::build([node(7, Some(42), "Lost", 0), node(8, Some(8), "Self", 1)]);
        assert_eq!(ids(&tree.roots()), vec![7, 8]);
    }

    #[test]
    fn test_cycle_is_safe() {
        let tree = CategoryTree::build([
            node(1, Some(2), "A", 0),
            node(2, Some(1), "B", 0),
            node(3, None, "C", 0),
        ]);
        // Neither 1 nor 2 is reachable from a root; the path still ends.
        assert_eq!(tree.path(CategoryId::new(1)).len(), 2);
        assert_eq!(tree.descendants(CategoryId::new(1)).len(), 1);
        assert_eq!(tree.flatten().len(), 1);
    }

    #[test]
    fn test_flatten_depths() {
        let tree = sample();
        let flat: Vec<(i32, usize)> = tree
            .flatten()
            .iter()
            .map(|f| (f.node.id.as_i32(), f.depth))
            .collect();
        assert_eq!(flat, vec![(2, 0), (1, 0), (5, 1), (3, 1), (4, 2)]);
    }
}
