//! Types for PDF logical structure trees.
//!
//! Structure elements according to ISO 32000-1:2008 Section 14.7.2,
//! held in an arena addressed by stable integer IDs. Parent/children are
//! stored as ID references rather than live pointers, which keeps cycle
//! detection and traversal order-independent and safe.

use std::fmt;

/// Stable identifier of a node inside a [`StructTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Standard structure types used by the remediation engine.
///
/// A subset of the standard structure types from ISO 32000-1:2008
/// Section 14.8.4 — the roles the builder actually produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructTag {
    /// Document wrapper (sole child of the structure tree root)
    Document,
    /// Heading level 1
    H1,
    /// Heading level 2
    H2,
    /// Heading level 3
    H3,
    /// Heading level 4
    H4,
    /// Heading level 5
    H5,
    /// Heading level 6
    H6,
    /// Paragraph
    P,
    /// List
    L,
    /// List item
    LI,
    /// Label (list item marker)
    Lbl,
    /// List body (list item content)
    LBody,
    /// Table
    Table,
    /// Table row
    TR,
    /// Table header cell
    TH,
    /// Table data cell
    TD,
    /// Figure
    Figure,
    /// Span (inline generic)
    Span,
}

impl StructTag {
    /// The `/S` name this tag serializes to.
    pub fn as_name(&self) -> &'static str {
        match self {
            StructTag::Document => "Document",
            StructTag::H1 => "H1",
            StructTag::H2 => "H2",
            StructTag::H3 => "H3",
            StructTag::H4 => "H4",
            StructTag::H5 => "H5",
            StructTag::H6 => "H6",
            StructTag::P => "P",
            StructTag::L => "L",
            StructTag::LI => "LI",
            StructTag::Lbl => "Lbl",
            StructTag::LBody => "LBody",
            StructTag::Table => "Table",
            StructTag::TR => "TR",
            StructTag::TH => "TH",
            StructTag::TD => "TD",
            StructTag::Figure => "Figure",
            StructTag::Span => "Span",
        }
    }

    /// Heading tag for a 1-6 level; out-of-range levels clamp.
    pub fn heading(level: u8) -> Self {
        match level {
            0 | 1 => StructTag::H1,
            2 => StructTag::H2,
            3 => StructTag::H3,
            4 => StructTag::H4,
            5 => StructTag::H5,
            _ => StructTag::H6,
        }
    }

    /// The heading level (1-6), if this is a heading tag.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            StructTag::H1 => Some(1),
            StructTag::H2 => Some(2),
            StructTag::H3 => Some(3),
            StructTag::H4 => Some(4),
            StructTag::H5 => Some(5),
            StructTag::H6 => Some(6),
            _ => None,
        }
    }

    /// Check if this is a heading type.
    pub fn is_heading(&self) -> bool {
        self.heading_level().is_some()
    }

    /// Grouping tags hold other elements, never marked content directly.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            StructTag::Document | StructTag::L | StructTag::LI | StructTag::Table | StructTag::TR
        )
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_name())
    }
}

/// Child of a structure element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeChild {
    /// Another structure element, by arena ID
    Element(NodeId),
    /// Marked-content reference: a leaf linking to drawn content
    MarkedContent {
        /// Owning page index (0-based)
        page: u32,
        /// Marked Content ID within that page's numbering space
        mcid: u32,
    },
}

/// A structure element (StructElem) in the structure tree.
#[derive(Debug, Clone)]
pub struct StructNode {
    /// Structure type
    pub tag: StructTag,
    /// Parent node (None for top-level elements under the tree root)
    pub parent: Option<NodeId>,
    /// Ordered children
    pub children: Vec<NodeChild>,
    /// Element text, used for bookmarking and search (`/T`)
    pub text: Option<String>,
    /// Alternate description (`/Alt`), required for Figure
    pub alt: Option<String>,
    /// Element language override (`/Lang`)
    pub lang: Option<String>,
    /// Table summary (`/Summary`), Table only
    pub summary: Option<String>,
    /// Page the element appears on, if known
    pub page: Option<u32>,
    /// Top edge of the element on its page, used for heading ordering
    pub y: Option<f32>,
}

impl StructNode {
    /// Create a new structure element with the given tag.
    pub fn new(tag: StructTag) -> Self {
        Self {
            tag,
            parent: None,
            children: Vec::new(),
            text: None,
            alt: None,
            lang: None,
            summary: None,
            page: None,
            y: None,
        }
    }

    /// MCIDs carried directly by this node, with their pages.
    pub fn marked_content(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.children.iter().filter_map(|child| match child {
            NodeChild::MarkedContent { page, mcid } => Some((*page, *mcid)),
            NodeChild::Element(_) => None,
        })
    }
}

/// The document-wide structure tree (StructTreeRoot plus its arena).
///
/// `root_children` are the immediate children of the StructTreeRoot;
/// a well-formed tree has exactly one, the Document wrapper.
#[derive(Debug, Clone, Default)]
pub struct StructTree {
    /// Node arena; a `NodeId` indexes into this vector
    pub nodes: Vec<StructNode>,
    /// Immediate children of the structure tree root
    pub root_children: Vec<NodeId>,
}

impl StructTree {
    /// Create an empty structure tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node in the arena and return its ID.
    pub fn alloc(&mut self, node: StructNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Look up a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&StructNode> {
        self.nodes.get(id.0 as usize)
    }

    /// Look up a node mutably by ID.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut StructNode> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// The Document wrapper, when the tree is well-formed.
    pub fn document_wrapper(&self) -> Option<NodeId> {
        match self.root_children.as_slice() {
            [single] if self.node(*single).map(|n| n.tag) == Some(StructTag::Document) => {
                Some(*single)
            },
            _ => None,
        }
    }

    /// Total number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names() {
        assert_eq!(StructTag::Document.as_name(), "Document");
        assert_eq!(StructTag::LBody.as_name(), "LBody");
        assert_eq!(StructTag::H3.as_name(), "H3");
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(StructTag::heading(1), StructTag::H1);
        assert_eq!(StructTag::heading(6), StructTag::H6);
        assert_eq!(StructTag::heading(9), StructTag::H6);
        assert_eq!(StructTag::H4.heading_level(), Some(4));
        assert_eq!(StructTag::P.heading_level(), None);
        assert!(StructTag::H2.is_heading());
        assert!(!StructTag::Figure.is_heading());
    }

    #[test]
    fn test_containers() {
        assert!(StructTag::Table.is_container());
        assert!(StructTag::L.is_container());
        assert!(!StructTag::TD.is_container());
        assert!(!StructTag::P.is_container());
    }

    #[test]
    fn test_arena_alloc_and_lookup() {
        let mut tree = StructTree::new();
        let a = tree.alloc(StructNode::new(StructTag::Document));
        let b = tree.alloc(StructNode::new(StructTag::P));
        assert_eq!(a, NodeId(0));
        assert_eq!(b, NodeId(1));
        assert_eq!(tree.node(b).unwrap().tag, StructTag::P);
        assert!(tree.node(NodeId(99)).is_none());
    }

    #[test]
    fn test_document_wrapper_detection() {
        let mut tree = StructTree::new();
        let doc = tree.alloc(StructNode::new(StructTag::Document));
        tree.root_children.push(doc);
        assert_eq!(tree.document_wrapper(), Some(doc));

        // A second top-level element breaks the wrapper invariant
        let stray = tree.alloc(StructNode::new(StructTag::P));
        tree.root_children.push(stray);
        assert_eq!(tree.document_wrapper(), None);
    }

    #[test]
    fn test_marked_content_iteration() {
        let mut node = StructNode::new(StructTag::P);
        node.children.push(NodeChild::MarkedContent { page: 0, mcid: 3 });
        node.children.push(NodeChild::Element(NodeId(7)));
        let refs: Vec<_> = node.marked_content().collect();
        assert_eq!(refs, vec![(0, 3)]);
    }
}
