//! Structure tree traversal.
//!
//! Pre-order walks over the arena, reading-order extraction, and the
//! revisit detection that backs the tree-integrity compliance check.

use crate::structure::types::{NodeChild, NodeId, StructTree};
use std::collections::HashSet;

/// A heading located during traversal, with the data the nesting check needs.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingRef {
    /// The heading node
    pub node: NodeId,
    /// Heading level (1-6)
    pub level: u8,
    /// Page the heading appears on
    pub page: Option<u32>,
    /// Top edge on the page
    pub y: Option<f32>,
    /// Heading text, if recorded
    pub text: Option<String>,
}

/// Pre-order traversal from the tree root.
///
/// Each element is yielded at most once: a child reachable through two
/// parents (or a cycle) is not expanded again. Use [`find_revisited`] to
/// detect that situation.
pub fn preorder(tree: &StructTree) -> Vec<NodeId> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<NodeId> = tree.root_children.iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        order.push(id);
        if let Some(node) = tree.node(id) {
            for child in node.children.iter().rev() {
                if let NodeChild::Element(child_id) = child {
                    stack.push(*child_id);
                }
            }
        }
    }
    order
}

/// Find elements reachable more than once (shared parents or cycles).
///
/// Returns the offending IDs in the order they were re-encountered; empty
/// for a well-formed tree.
pub fn find_revisited(tree: &StructTree) -> Vec<NodeId> {
    let mut visited = HashSet::new();
    let mut revisited = Vec::new();
    let mut reported = HashSet::new();
    let mut stack: Vec<NodeId> = tree.root_children.iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            if reported.insert(id) {
                revisited.push(id);
            }
            continue;
        }
        if let Some(node) = tree.node(id) {
            for child in node.children.iter().rev() {
                if let NodeChild::Element(child_id) = child {
                    stack.push(*child_id);
                }
            }
        }
    }
    revisited
}

/// MCIDs referenced on one page, in reading (pre-order) order.
pub fn mcids_on_page(tree: &StructTree, page: u32) -> Vec<u32> {
    let mut mcids = Vec::new();
    for id in preorder(tree) {
        if let Some(node) = tree.node(id) {
            for (mc_page, mcid) in node.marked_content() {
                if mc_page == page {
                    mcids.push(mcid);
                }
            }
        }
    }
    mcids
}

/// Collect headings in reading order: page first, then vertical position
/// (top of page first; PDF y grows upward). Headings without a recorded
/// position sort after positioned ones on the same page, keeping their
/// pre-order rank among themselves.
pub fn collect_headings(tree: &StructTree) -> Vec<HeadingRef> {
    let mut headings: Vec<HeadingRef> = Vec::new();
    for id in preorder(tree) {
        let Some(node) = tree.node(id) else { continue };
        if let Some(level) = node.tag.heading_level() {
            headings.push(HeadingRef {
                node: id,
                level,
                page: node.page,
                y: node.y,
                text: node.text.clone(),
            });
        }
    }

    headings.sort_by(|a, b| {
        let page_cmp = a.page.unwrap_or(0).cmp(&b.page.unwrap_or(0));
        page_cmp.then_with(|| {
            let ya = a.y.unwrap_or(f32::NEG_INFINITY);
            let yb = b.y.unwrap_or(f32::NEG_INFINITY);
            yb.total_cmp(&ya)
        })
    });
    headings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::builder::{ElementOptions, StructureTreeBuilder};
    use crate::structure::types::{StructNode, StructTag};

    fn simple_tree() -> StructTree {
        let mut builder = StructureTreeBuilder::new();
        builder.create_root().unwrap();
        builder.create_element(
            StructTag::H1,
            0,
            ElementOptions {
                text: Some("Intro".into()),
                y: Some(720.0),
                ..Default::default()
            },
        );
        builder.create_element(StructTag::P, 0, ElementOptions::default());
        builder.create_element(
            StructTag::H2,
            1,
            ElementOptions {
                text: Some("Detail".into()),
                y: Some(700.0),
                ..Default::default()
            },
        );
        builder.finalize();
        let (tree, _) = builder.finish();
        tree
    }

    #[test]
    fn test_preorder_visits_all_once() {
        let tree = simple_tree();
        let order = preorder(&tree);
        assert_eq!(order.len(), 4); // wrapper + 3 elements
        let unique: HashSet<_> = order.iter().collect();
        assert_eq!(unique.len(), order.len());
    }

    #[test]
    fn test_no_revisit_on_builder_tree() {
        let tree = simple_tree();
        assert!(find_revisited(&tree).is_empty());
    }

    #[test]
    fn test_revisit_detected_for_shared_parent() {
        let mut tree = simple_tree();
        // Corrupt the tree: wrapper claims the H2 node a second time
        let wrapper = tree.document_wrapper().unwrap();
        let shared = preorder(&tree)[3];
        tree.node_mut(wrapper)
            .unwrap()
            .children
            .push(NodeChild::Element(shared));
        assert_eq!(find_revisited(&tree), vec![shared]);
    }

    #[test]
    fn test_revisit_detected_for_cycle() {
        let mut tree = simple_tree();
        let wrapper = tree.document_wrapper().unwrap();
        let first = preorder(&tree)[1];
        // Child points back at the wrapper
        tree.node_mut(first)
            .unwrap()
            .children
            .push(NodeChild::Element(wrapper));
        assert_eq!(find_revisited(&tree), vec![wrapper]);
    }

    #[test]
    fn test_mcids_on_page() {
        let tree = simple_tree();
        assert_eq!(mcids_on_page(&tree, 0), vec![0, 1]);
        assert_eq!(mcids_on_page(&tree, 1), vec![0]);
        assert!(mcids_on_page(&tree, 7).is_empty());
    }

    #[test]
    fn test_collect_headings_reading_order() {
        let mut tree = StructTree::new();
        let wrapper = tree.alloc(StructNode::new(StructTag::Document));
        tree.root_children.push(wrapper);

        // Created out of visual order: lower heading first
        let mut low = StructNode::new(StructTag::H2);
        low.page = Some(0);
        low.y = Some(300.0);
        let low_id = tree.alloc(low);

        let mut high = StructNode::new(StructTag::H1);
        high.page = Some(0);
        high.y = Some(700.0);
        let high_id = tree.alloc(high);

        tree.node_mut(wrapper).unwrap().children = vec![
            NodeChild::Element(low_id),
            NodeChild::Element(high_id),
        ];
        tree.node_mut(low_id).unwrap().parent = Some(wrapper);
        tree.node_mut(high_id).unwrap().parent = Some(wrapper);

        let headings = collect_headings(&tree);
        assert_eq!(headings.len(), 2);
        // Top of page sorts first
        assert_eq!(headings[0].node, high_id);
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[1].level, 2);
    }
}
