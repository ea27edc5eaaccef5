//! Dynamic bounding volume tree.
//!
//! Leaves store "fat" boxes grown by [`FAT_MARGIN`] so small motions do not
//! force a reinsert. New leaves go next to the sibling that minimizes the
//! surface area of the combined box.

use std::collections::BTreeMap;

use super::broad_phase::BroadPhase;
use crate::shapes::Aabb;
use crate::types::BodyHandle;

const FAT_MARGIN: f32 = 0.1;

#[derive(Clone, Debug)]
enum NodeKind {
    Leaf(BodyHandle),
    Branch { left: usize, right: usize },
}

#[derive(Clone, Debug)]
struct Node {
    aabb: Aabb,
    parent: Option<usize>,
    kind: NodeKind,
}

#[derive(Debug, Default)]
pub struct DynamicTree {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: Option<usize>,
    leaves: BTreeMap<BodyHandle, usize>,
}

impl DynamicTree {
    fn allocate(&mut self, node: Node) -> usize {
        if let Some(index) = self.free.pop() {
            self.nodes[index] = node;
            index
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        }
    }

    fn best_sibling(&self, root: usize, aabb: &Aabb) -> usize {
        let mut best = root;
        let mut best_cost = aabb.union(&self.nodes[root].aabb).surface_area();
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            let combined = aabb.union(&node.aabb).surface_area();
            if combined < best_cost {
                best = index;
                best_cost = combined;
            }
            if let NodeKind::Branch { left, right } = node.kind {
                let inherited = combined - node.aabb.surface_area();
                let lower_bound = aabb.surface_area() + inherited;
                if lower_bound < best_cost {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        best
    }

    fn refit(&mut self, mut current: Option<usize>) {
        while let Some(index) = current {
            if let NodeKind::Branch { left, right } = self.nodes[index].kind {
                self.nodes[index].aabb = self.nodes[left].aabb.union(&self.nodes[right].aabb);
            }
            current = self.nodes[index].parent;
        }
    }

    fn insert_leaf(&mut self, handle: BodyHandle, fat: Aabb) {
        let leaf = self.allocate(Node {
            aabb: fat,
            parent: None,
            kind: NodeKind::Leaf(handle),
        });
        self.leaves.insert(handle, leaf);

        let Some(root) = self.root else {
            self.root = Some(leaf);
            return;
        };

        let sibling = self.best_sibling(root, &fat);
        let old_parent = self.nodes[sibling].parent;
        let branch = self.allocate(Node {
            aabb: fat.union(&self.nodes[sibling].aabb),
            parent: old_parent,
            kind: NodeKind::Branch {
                left: sibling,
                right: leaf,
            },
        });
        self.nodes[sibling].parent = Some(branch);
        self.nodes[leaf].parent = Some(branch);

        match old_parent {
            None => self.root = Some(branch),
            Some(parent) => {
                if let NodeKind::Branch { left, right } = &mut self.nodes[parent].kind {
                    if *left == sibling {
                        *left = branch;
                    } else {
                        *right = branch;
                    }
                }
            }
        }
        self.refit(Some(branch));
    }

    fn remove_leaf(&mut self, leaf: usize) {
        let Some(parent) = self.nodes[leaf].parent else {
            self.root = None;
            self.free.push(leaf);
            return;
        };
        let NodeKind::Branch { left, right } = self.nodes[parent].kind else {
            return;
        };
        let sibling = if left == leaf { right } else { left };
        let grandparent = self.nodes[parent].parent;
        self.nodes[sibling].parent = grandparent;
        match grandparent {
            None => self.root = Some(sibling),
            Some(gp) => {
                if let NodeKind::Branch { left, right } = &mut self.nodes[gp].kind {
                    if *left == parent {
                        *left = sibling;
                    } else {
                        *right = sibling;
                    }
                }
                self.refit(Some(gp));
            }
        }
        self.free.push(leaf);
        self.free.push(parent);
    }

    fn query(&self, aabb: &Aabb, mut visit: impl FnMut(BodyHandle)) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = vec![root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.aabb.overlaps(aabb) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf(handle) => visit(handle),
                NodeKind::Branch { left, right } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
    }
}

impl BroadPhase for DynamicTree {
    fn insert(&mut self, handle: BodyHandle, aabb: Aabb) {
        self.remove(handle);
        self.insert_leaf(handle, aabb.expanded(FAT_MARGIN));
    }

    fn remove(&mut self, handle: BodyHandle) {
        if let Some(leaf) = self.leaves.remove(&handle) {
            self.remove_leaf(leaf);
        }
    }

    fn update(&mut self, handle: BodyHandle, aabb: Aabb) {
        match self.leaves.get(&handle) {
            Some(&leaf) if self.nodes[leaf].aabb.contains(&aabb) => {}
            _ => self.insert(handle, aabb),
        }
    }

    fn overlapping_pairs(&self) -> Vec<(BodyHandle, BodyHandle)> {
        let mut pairs = Vec::new();
        for (&handle, &leaf) in &self.leaves {
            self.query(&self.nodes[leaf].aabb, |other| {
                if handle < other {
                    pairs.push((handle, other));
                }
            });
        }
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    fn len(&self) -> usize {
        self.leaves.len()
    }
}
