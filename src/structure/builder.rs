//! Structure tree builder.
//!
//! Materializes a valid tagged tree from classified content blocks and fix
//! records, allocating the marked-content references the linker will later
//! realize inside each page's content stream.
//!
//! PDF Spec: ISO 32000-1:2008, Section 14.7-14.8

use crate::error::{Error, Result};
use crate::structure::types::{NodeChild, NodeId, StructNode, StructTag, StructTree};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A pending MCID assignment for the content-stream linker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McidAssignment {
    /// The allocated marked-content ID
    pub mcid: u32,
    /// Tag to emit in the BDC property list
    pub tag: StructTag,
}

/// Optional fields for [`StructureTreeBuilder::create_element`].
#[derive(Debug, Clone, Default)]
pub struct ElementOptions {
    /// Explicit structural parent (table, list item, ...). Elements without
    /// one are attached to the Document wrapper at `finalize()`.
    pub parent: Option<NodeId>,
    /// Explicit MCID; allocated monotonically when absent
    pub mcid: Option<u32>,
    /// Element text for bookmarking/search
    pub text: Option<String>,
    /// Alternate description
    pub alt: Option<String>,
    /// Element language override
    pub lang: Option<String>,
    /// Top edge on the page, for heading ordering
    pub y: Option<f32>,
}

/// Table payload consumed by [`StructureTreeBuilder::create_table`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    /// Cell text, row-major
    pub rows: Vec<Vec<String>>,
    /// Whether the first row holds column headers
    #[serde(default)]
    pub has_headers: bool,
    /// Table summary (`/Summary`)
    #[serde(default)]
    pub summary: Option<String>,
}

/// List payload consumed by [`StructureTreeBuilder::create_list`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListSpec {
    /// List items in order
    pub items: Vec<ListItemSpec>,
    /// Numbered list (labels become "1.", "2.", ...) instead of bulleted
    #[serde(default)]
    pub ordered: bool,
}

/// One list item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListItemSpec {
    /// Explicit label; derived from `ordered` when absent
    #[serde(default)]
    pub label: Option<String>,
    /// Item body text
    pub text: String,
}

/// Builds a structure tree from classified content.
///
/// MCIDs are allocated per page: each page owns an independent counter and
/// every lookup is keyed by `(page, mcid)`, matching the per-page numbering
/// space marked content actually lives in.
#[derive(Debug, Default)]
pub struct StructureTreeBuilder {
    tree: StructTree,
    wrapper: Option<NodeId>,
    /// Top-level elements awaiting attachment, in creation order
    pending: Vec<NodeId>,
    /// page -> next free MCID
    mcid_counters: BTreeMap<u32, u32>,
    /// page -> ordered assignments for the linker
    assignments: BTreeMap<u32, Vec<McidAssignment>>,
    /// Elements created so far (wrapper excluded)
    created: usize,
}

impl StructureTreeBuilder {
    /// Create a new builder with an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the StructTreeRoot and its single Document wrapper.
    ///
    /// Must be called exactly once per document; a second call is an error
    /// because the one-wrapper invariant is load-bearing for validation.
    pub fn create_root(&mut self) -> Result<NodeId> {
        if self.wrapper.is_some() {
            return Err(Error::StructureTree(
                "structure tree root already exists".to_string(),
            ));
        }
        let wrapper = self.tree.alloc(StructNode::new(StructTag::Document));
        self.tree.root_children.push(wrapper);
        self.wrapper = Some(wrapper);
        Ok(wrapper)
    }

    /// Create a structure element.
    ///
    /// Non-container tags get exactly one marked-content reference child for
    /// `(page, mcid)`; the MCID is allocated monotonically within the page
    /// unless supplied in `opts`. Returns the new node and the MCID it
    /// carries (None for containers).
    ///
    /// Creation never fails on malformed input: missing optional fields are
    /// simply omitted.
    pub fn create_element(
        &mut self,
        tag: StructTag,
        page: u32,
        opts: ElementOptions,
    ) -> (NodeId, Option<u32>) {
        let mut node = StructNode::new(tag);
        node.text = opts.text;
        node.alt = opts.alt;
        node.lang = opts.lang;
        node.page = Some(page);
        node.y = opts.y;

        let mcid = if tag.is_container() {
            None
        } else {
            let mcid = match opts.mcid {
                Some(explicit) => self.claim_mcid(page, explicit),
                None => self.alloc_mcid(page),
            };
            node.children.push(NodeChild::MarkedContent { page, mcid });
            self.assignments
                .entry(page)
                .or_default()
                .push(McidAssignment { mcid, tag });
            log::debug!("allocated mcid {} on page {} for {}", mcid, page, tag);
            Some(mcid)
        };

        let id = self.tree.alloc(node);
        self.created += 1;
        match opts.parent {
            Some(parent) => self.attach(parent, id),
            None => self.pending.push(id),
        }
        (id, mcid)
    }

    /// Build a Table -> TR* -> (TH|TD)* hierarchy.
    ///
    /// Header cells are picked by `header_rows`, a row-index predicate;
    /// when absent, row 0 is headers iff `spec.has_headers`. Cells get one
    /// contiguous MCID each, in row-major order.
    pub fn create_table(
        &mut self,
        page: u32,
        spec: &TableSpec,
        header_rows: Option<&dyn Fn(usize) -> bool>,
    ) -> NodeId {
        let default_rule = |row: usize| row == 0 && spec.has_headers;
        let is_header_row: &dyn Fn(usize) -> bool = match header_rows {
            Some(rule) => rule,
            None => &default_rule,
        };

        let (table, _) = self.create_element(StructTag::Table, page, ElementOptions::default());
        if let Some(node) = self.tree.node_mut(table) {
            node.summary = spec.summary.clone();
        }

        for (row_index, row) in spec.rows.iter().enumerate() {
            let (tr, _) = self.create_element(
                StructTag::TR,
                page,
                ElementOptions {
                    parent: Some(table),
                    ..Default::default()
                },
            );
            let cell_tag = if is_header_row(row_index) {
                StructTag::TH
            } else {
                StructTag::TD
            };
            for cell in row {
                self.create_element(
                    cell_tag,
                    page,
                    ElementOptions {
                        parent: Some(tr),
                        text: Some(cell.clone()),
                        ..Default::default()
                    },
                );
            }
        }
        table
    }

    /// Build an L -> LI* -> (Lbl, LBody) hierarchy.
    ///
    /// Each item gets two contiguous MCIDs, label first, then body.
    pub fn create_list(&mut self, page: u32, spec: &ListSpec) -> NodeId {
        let (list, _) = self.create_element(StructTag::L, page, ElementOptions::default());

        for (index, item) in spec.items.iter().enumerate() {
            let (li, _) = self.create_element(
                StructTag::LI,
                page,
                ElementOptions {
                    parent: Some(list),
                    ..Default::default()
                },
            );
            let label = item.label.clone().unwrap_or_else(|| {
                if spec.ordered {
                    format!("{}.", index + 1)
                } else {
                    "\u{2022}".to_string()
                }
            });
            self.create_element(
                StructTag::Lbl,
                page,
                ElementOptions {
                    parent: Some(li),
                    text: Some(label),
                    ..Default::default()
                },
            );
            self.create_element(
                StructTag::LBody,
                page,
                ElementOptions {
                    parent: Some(li),
                    text: Some(item.text.clone()),
                    ..Default::default()
                },
            );
        }
        list
    }

    /// Change an element's tag after creation, keeping its pending BDC
    /// assignment in sync so the marker written into the content stream
    /// matches the element's `/S` entry.
    pub fn retag(&mut self, id: NodeId, tag: StructTag) {
        let Some(node) = self.tree.node_mut(id) else {
            return;
        };
        node.tag = tag;
        let refs: Vec<(u32, u32)> = node.marked_content().collect();
        for (page, mcid) in refs {
            if let Some(list) = self.assignments.get_mut(&page) {
                for assignment in list.iter_mut() {
                    if assignment.mcid == mcid {
                        assignment.tag = tag;
                    }
                }
            }
        }
    }

    /// Attach every pending top-level element to the Document wrapper, in
    /// creation order (callers ensure creation order equals reading order).
    ///
    /// Returns the total number of elements created by this builder.
    pub fn finalize(&mut self) -> usize {
        if let Some(wrapper) = self.wrapper {
            for id in std::mem::take(&mut self.pending) {
                self.attach(wrapper, id);
            }
        } else if !self.pending.is_empty() {
            log::warn!(
                "finalize() with no structure root; {} elements dropped",
                self.pending.len()
            );
            self.pending.clear();
        }
        self.created
    }

    /// Pending linker assignments for one page, in allocation order.
    pub fn assignments_for(&self, page: u32) -> &[McidAssignment] {
        self.assignments
            .get(&page)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Pages that have pending assignments, ascending.
    pub fn pages_with_assignments(&self) -> Vec<u32> {
        self.assignments.keys().copied().collect()
    }

    /// Number of elements created so far (wrapper excluded).
    pub fn element_count(&self) -> usize {
        self.created
    }

    /// The Document wrapper, once `create_root` has run.
    pub fn wrapper(&self) -> Option<NodeId> {
        self.wrapper
    }

    /// Read-only view of the tree under construction.
    pub fn tree(&self) -> &StructTree {
        &self.tree
    }

    /// Mutable view of the tree under construction, for fix application
    /// (retagging, alt-text) after elements exist.
    pub fn tree_mut(&mut self) -> &mut StructTree {
        &mut self.tree
    }

    /// Consume the builder, yielding the tree and the per-page assignments.
    pub fn finish(self) -> (StructTree, BTreeMap<u32, Vec<McidAssignment>>) {
        (self.tree, self.assignments)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.tree.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.tree.node_mut(parent) {
            node.children.push(NodeChild::Element(child));
        } else {
            log::warn!("attach to unknown parent {}; element {} dropped", parent, child);
        }
    }

    /// Allocate the next MCID on a page.
    fn alloc_mcid(&mut self, page: u32) -> u32 {
        let counter = self.mcid_counters.entry(page).or_insert(0);
        let mcid = *counter;
        *counter += 1;
        mcid
    }

    /// Honor an explicitly supplied MCID, keeping the page counter ahead of
    /// it so later automatic allocations stay unique.
    fn claim_mcid(&mut self, page: u32, mcid: u32) -> u32 {
        let counter = self.mcid_counters.entry(page).or_insert(0);
        if mcid < *counter {
            log::warn!(
                "explicit mcid {} on page {} collides with allocated range; keeping it",
                mcid,
                page
            );
        }
        *counter = (*counter).max(mcid + 1);
        mcid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_root_once() {
        let mut builder = StructureTreeBuilder::new();
        let wrapper = builder.create_root().unwrap();
        assert_eq!(builder.tree().root_children, vec![wrapper]);
        assert!(builder.create_root().is_err());
    }

    #[test]
    fn test_element_gets_one_mcr() {
        let mut builder = StructureTreeBuilder::new();
        builder.create_root().unwrap();
        let (id, mcid) = builder.create_element(StructTag::P, 0, ElementOptions::default());
        assert_eq!(mcid, Some(0));
        let node = builder.tree().node(id).unwrap();
        let refs: Vec<_> = node.marked_content().collect();
        assert_eq!(refs, vec![(0, 0)]);
    }

    #[test]
    fn test_mcid_allocation_is_per_page() {
        let mut builder = StructureTreeBuilder::new();
        builder.create_root().unwrap();
        let (_, a) = builder.create_element(StructTag::P, 0, ElementOptions::default());
        let (_, b) = builder.create_element(StructTag::P, 0, ElementOptions::default());
        let (_, c) = builder.create_element(StructTag::P, 1, ElementOptions::default());
        assert_eq!(a, Some(0));
        assert_eq!(b, Some(1));
        // Page 1 restarts its numbering space
        assert_eq!(c, Some(0));
    }

    #[test]
    fn test_explicit_mcid_advances_counter() {
        let mut builder = StructureTreeBuilder::new();
        builder.create_root().unwrap();
        let (_, a) = builder.create_element(
            StructTag::P,
            0,
            ElementOptions {
                mcid: Some(5),
                ..Default::default()
            },
        );
        let (_, b) = builder.create_element(StructTag::P, 0, ElementOptions::default());
        assert_eq!(a, Some(5));
        assert_eq!(b, Some(6));
    }

    #[test]
    fn test_container_gets_no_mcr() {
        let mut builder = StructureTreeBuilder::new();
        builder.create_root().unwrap();
        let (id, mcid) = builder.create_element(StructTag::Table, 0, ElementOptions::default());
        assert_eq!(mcid, None);
        assert!(builder.tree().node(id).unwrap().children.is_empty());
    }

    #[test]
    fn test_finalize_attaches_in_creation_order() {
        let mut builder = StructureTreeBuilder::new();
        let wrapper = builder.create_root().unwrap();
        let (h, _) = builder.create_element(StructTag::H1, 0, ElementOptions::default());
        let (p1, _) = builder.create_element(StructTag::P, 0, ElementOptions::default());
        let (p2, _) = builder.create_element(StructTag::P, 0, ElementOptions::default());
        let count = builder.finalize();
        assert_eq!(count, 3);

        let children = &builder.tree().node(wrapper).unwrap().children;
        assert_eq!(
            children,
            &vec![
                NodeChild::Element(h),
                NodeChild::Element(p1),
                NodeChild::Element(p2)
            ]
        );
        assert_eq!(builder.tree().node(h).unwrap().parent, Some(wrapper));
    }

    #[test]
    fn test_table_mcids_row_major_contiguous() {
        let mut builder = StructureTreeBuilder::new();
        builder.create_root().unwrap();
        let spec = TableSpec {
            rows: vec![
                vec!["Name".into(), "Qty".into()],
                vec!["Bolts".into(), "40".into()],
            ],
            has_headers: true,
            summary: Some("Inventory".into()),
        };
        let table = builder.create_table(0, &spec, None);

        let assignments = builder.assignments_for(0);
        let mcids: Vec<u32> = assignments.iter().map(|a| a.mcid).collect();
        assert_eq!(mcids, vec![0, 1, 2, 3]);

        let tags: Vec<StructTag> = assignments.iter().map(|a| a.tag).collect();
        assert_eq!(tags, vec![StructTag::TH, StructTag::TH, StructTag::TD, StructTag::TD]);

        let table_node = builder.tree().node(table).unwrap();
        assert_eq!(table_node.summary.as_deref(), Some("Inventory"));
        assert_eq!(table_node.children.len(), 2);
    }

    #[test]
    fn test_table_custom_header_predicate() {
        let mut builder = StructureTreeBuilder::new();
        builder.create_root().unwrap();
        let spec = TableSpec {
            rows: vec![vec!["a".into()], vec!["b".into()]],
            has_headers: false,
            summary: None,
        };
        // Every row a header row
        builder.create_table(0, &spec, Some(&|_| true));
        let tags: Vec<StructTag> = builder.assignments_for(0).iter().map(|a| a.tag).collect();
        assert_eq!(tags, vec![StructTag::TH, StructTag::TH]);
    }

    #[test]
    fn test_list_two_mcids_per_item() {
        let mut builder = StructureTreeBuilder::new();
        builder.create_root().unwrap();
        let spec = ListSpec {
            items: vec![
                ListItemSpec {
                    label: None,
                    text: "First".into(),
                },
                ListItemSpec {
                    label: None,
                    text: "Second".into(),
                },
            ],
            ordered: true,
        };
        let list = builder.create_list(0, &spec);

        let assignments = builder.assignments_for(0);
        let mcids: Vec<u32> = assignments.iter().map(|a| a.mcid).collect();
        assert_eq!(mcids, vec![0, 1, 2, 3]);
        let tags: Vec<StructTag> = assignments.iter().map(|a| a.tag).collect();
        assert_eq!(
            tags,
            vec![StructTag::Lbl, StructTag::LBody, StructTag::Lbl, StructTag::LBody]
        );

        // Ordered labels are derived ordinals
        let list_node = builder.tree().node(list).unwrap();
        let NodeChild::Element(first_li) = list_node.children[0] else {
            panic!("expected element child");
        };
        let li_node = builder.tree().node(first_li).unwrap();
        let NodeChild::Element(lbl) = li_node.children[0] else {
            panic!("expected element child");
        };
        assert_eq!(builder.tree().node(lbl).unwrap().text.as_deref(), Some("1."));
    }

    #[test]
    fn test_retag_updates_pending_assignment() {
        let mut builder = StructureTreeBuilder::new();
        builder.create_root().unwrap();
        let (id, _) = builder.create_element(
            StructTag::P,
            0,
            ElementOptions {
                text: Some("Results".into()),
                ..Default::default()
            },
        );
        builder.retag(id, StructTag::H2);
        assert_eq!(builder.tree().node(id).unwrap().tag, StructTag::H2);
        assert_eq!(builder.assignments_for(0)[0].tag, StructTag::H2);
    }

    #[test]
    fn test_finalize_without_root_drops_pending() {
        let mut builder = StructureTreeBuilder::new();
        builder.create_element(StructTag::P, 0, ElementOptions::default());
        assert_eq!(builder.finalize(), 1);
        assert!(builder.tree().root_children.is_empty());
    }
}
