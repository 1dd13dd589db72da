//! PDF document writer.
//!
//! Assembles the remediated document into a complete PDF: header, body,
//! cross-reference table, and trailer. The structure tree is materialized
//! as StructTreeRoot / StructElem / MCR dictionaries with the exact keys a
//! compliant consumer expects (`/Type`, `/S`, `/P`, `/K`, `/Alt`, `/T`,
//! `/Lang`, `/Summary`, `/Pg`, `/MCID`), plus the `/ParentTree` number
//! tree mapping each page's MCIDs back to their owning elements.

use crate::decoders::flate_encode;
use crate::document::{Page, PdfDocument};
use crate::error::Result;
use crate::object::{Dictionary, Object, ObjectRef};
use crate::structure::types::{NodeChild, NodeId, StructTree};
use crate::writer::object_serializer::ObjectSerializer;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Configuration for PDF generation.
#[derive(Debug, Clone)]
pub struct PdfWriterConfig {
    /// PDF version in the header
    pub version: String,
    /// Compress content streams with FlateDecode
    pub compress: bool,
    /// Producer string for the Info dictionary
    pub producer: String,
}

impl Default for PdfWriterConfig {
    fn default() -> Self {
        Self {
            version: "1.7".to_string(),
            compress: false,
            producer: format!("accesspdf {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl PdfWriterConfig {
    /// Enable or disable content-stream compression.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// Writes a [`PdfDocument`] as a complete PDF file.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    config: PdfWriterConfig,
}

impl PdfWriter {
    /// Create a writer with the default config.
    pub fn new() -> Self {
        Self {
            config: PdfWriterConfig::default(),
        }
    }

    /// Create a writer with a custom config.
    pub fn with_config(config: PdfWriterConfig) -> Self {
        Self { config }
    }

    /// Render the document to PDF bytes.
    pub fn render(&self, doc: &PdfDocument) -> Result<Vec<u8>> {
        let plan = ObjectPlan::new(doc);
        let serializer = ObjectSerializer::new();

        let mut bodies: BTreeMap<u32, Vec<u8>> = BTreeMap::new();
        bodies.insert(plan.catalog, serializer.serialize_indirect(plan.catalog, 0, &self.catalog_object(doc, &plan)));
        bodies.insert(plan.pages_root, serializer.serialize_indirect(plan.pages_root, 0, &self.pages_root_object(doc, &plan)));

        for (index, page) in doc.pages.iter().enumerate() {
            let page_id = plan.page_ids[index];
            let content_id = plan.content_ids[index];
            bodies.insert(
                page_id,
                serializer.serialize_indirect(page_id, 0, &self.page_object(page, index, &plan)),
            );
            bodies.insert(
                content_id,
                serializer.serialize_indirect(content_id, 0, &self.content_object(page)?),
            );
        }

        bodies.insert(plan.info, serializer.serialize_indirect(plan.info, 0, &self.info_object(doc)));

        if let (Some(metadata_id), Some(xmp)) = (plan.metadata, doc.xmp.as_ref()) {
            let mut dict = Dictionary::new();
            dict.insert("Type".to_string(), Object::name("Metadata"));
            dict.insert("Subtype".to_string(), Object::name("XML"));
            let stream = Object::Stream {
                dict,
                // XMP stays uncompressed so metadata scanners can find it
                data: bytes::Bytes::from(xmp.to_bytes()),
            };
            bodies.insert(metadata_id, serializer.serialize_indirect(metadata_id, 0, &stream));
        }

        if let (Some(root_id), Some(tree)) = (plan.struct_root, doc.struct_tree.as_ref()) {
            bodies.insert(
                root_id,
                serializer.serialize_indirect(root_id, 0, &self.struct_root_object(tree, &plan)),
            );
            for index in 0..tree.nodes.len() {
                let elem_id = plan.elem_id(NodeId(index as u32));
                let elem = self.struct_elem_object(tree, NodeId(index as u32), &plan);
                bodies.insert(elem_id, serializer.serialize_indirect(elem_id, 0, &elem));
            }
        }

        // Assemble: header, bodies in id order, xref, trailer.
        let mut out = Vec::new();
        write!(out, "%PDF-{}\n", self.config.version)?;
        // Binary comment marks the file as containing 8-bit data
        out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let mut offsets: BTreeMap<u32, usize> = BTreeMap::new();
        for (id, body) in &bodies {
            offsets.insert(*id, out.len());
            out.extend_from_slice(body);
        }

        let xref_offset = out.len();
        let size = plan.next_id;
        write!(out, "xref\n0 {}\n", size)?;
        write!(out, "0000000000 65535 f \n")?;
        for id in 1..size {
            match offsets.get(&id) {
                Some(offset) => write!(out, "{:010} 00000 n \n", offset)?,
                None => write!(out, "0000000000 65535 f \n")?,
            }
        }

        // /ID carries two binary strings; the serializer hex-encodes them
        let file_id = uuid::Uuid::new_v4().as_bytes().to_vec();
        write!(out, "trailer\n")?;
        let mut trailer = Dictionary::new();
        trailer.insert("Size".to_string(), Object::Integer(size as i64));
        trailer.insert("Root".to_string(), Object::Reference(ObjectRef::new(plan.catalog, 0)));
        trailer.insert("Info".to_string(), Object::Reference(ObjectRef::new(plan.info, 0)));
        trailer.insert(
            "ID".to_string(),
            Object::Array(vec![
                Object::String(file_id.clone()),
                Object::String(file_id),
            ]),
        );
        out.extend_from_slice(&serializer.serialize(&Object::Dictionary(trailer)));
        write!(out, "\nstartxref\n{}\n%%EOF\n", xref_offset)?;

        Ok(out)
    }

    /// Render and write atomically: temp file in the destination directory,
    /// then rename over the target.
    pub fn write_to_file(&self, doc: &PdfDocument, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.render(doc)?;

        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");
        let temp_path = std::path::PathBuf::from(temp);
        std::fs::write(&temp_path, &bytes)?;
        std::fs::rename(&temp_path, path)?;
        log::debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    fn catalog_object(&self, doc: &PdfDocument, plan: &ObjectPlan) -> Object {
        let mut catalog = doc.catalog.clone();
        catalog.insert("Type".to_string(), Object::name("Catalog"));
        catalog.insert(
            "Pages".to_string(),
            Object::Reference(ObjectRef::new(plan.pages_root, 0)),
        );
        if let Some(metadata_id) = plan.metadata {
            catalog.insert(
                "Metadata".to_string(),
                Object::Reference(ObjectRef::new(metadata_id, 0)),
            );
        }
        if let Some(root_id) = plan.struct_root {
            catalog.insert(
                "StructTreeRoot".to_string(),
                Object::Reference(ObjectRef::new(root_id, 0)),
            );
        }
        Object::Dictionary(catalog)
    }

    fn pages_root_object(&self, doc: &PdfDocument, plan: &ObjectPlan) -> Object {
        Object::dict(vec![
            ("Type", Object::name("Pages")),
            (
                "Kids",
                Object::Array(
                    plan.page_ids
                        .iter()
                        .map(|id| Object::Reference(ObjectRef::new(*id, 0)))
                        .collect(),
                ),
            ),
            ("Count", Object::Integer(doc.pages.len() as i64)),
        ])
    }

    fn page_object(&self, page: &Page, index: usize, plan: &ObjectPlan) -> Object {
        let mut dict = Dictionary::new();
        dict.insert("Type".to_string(), Object::name("Page"));
        dict.insert(
            "Parent".to_string(),
            Object::Reference(ObjectRef::new(plan.pages_root, 0)),
        );
        dict.insert(
            "MediaBox".to_string(),
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page.width as f64),
                Object::Real(page.height as f64),
            ]),
        );
        dict.insert(
            "Contents".to_string(),
            Object::Reference(ObjectRef::new(plan.content_ids[index], 0)),
        );
        dict.insert("Resources".to_string(), Object::Dictionary(Dictionary::new()));
        // StructParents keys this page into the ParentTree number tree
        dict.insert("StructParents".to_string(), Object::Integer(index as i64));
        if !page.annotations.is_empty() {
            dict.insert(
                "Annots".to_string(),
                Object::Array(
                    page.annotations
                        .iter()
                        .map(|a| Object::Dictionary(a.clone()))
                        .collect(),
                ),
            );
        }
        Object::Dictionary(dict)
    }

    fn content_object(&self, page: &Page) -> Result<Object> {
        let mut dict = Dictionary::new();
        let data = if self.config.compress {
            dict.insert("Filter".to_string(), Object::name("FlateDecode"));
            flate_encode(&page.content)?
        } else {
            page.content.clone()
        };
        Ok(Object::Stream {
            dict,
            data: bytes::Bytes::from(data),
        })
    }

    fn info_object(&self, doc: &PdfDocument) -> Object {
        let mut info = doc.info.clone();
        info.insert("Producer".to_string(), Object::string(&self.config.producer));
        info.insert(
            "ModDate".to_string(),
            Object::string(chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string()),
        );
        Object::Dictionary(info)
    }

    fn struct_root_object(&self, tree: &StructTree, plan: &ObjectPlan) -> Object {
        let kids: Vec<Object> = tree
            .root_children
            .iter()
            .map(|id| Object::Reference(ObjectRef::new(plan.elem_id(*id), 0)))
            .collect();

        // ParentTree: page's StructParents key -> array indexed by MCID,
        // each slot holding the owning element.
        let mut by_page: BTreeMap<u32, BTreeMap<u32, u32>> = BTreeMap::new();
        for (index, node) in tree.nodes.iter().enumerate() {
            for (page, mcid) in node.marked_content() {
                by_page
                    .entry(page)
                    .or_default()
                    .insert(mcid, plan.elem_id(NodeId(index as u32)));
            }
        }
        let mut nums = Vec::new();
        for (page, mcids) in &by_page {
            let len = mcids.keys().max().map(|m| m + 1).unwrap_or(0);
            let slots: Vec<Object> = (0..len)
                .map(|mcid| match mcids.get(&mcid) {
                    Some(elem) => Object::Reference(ObjectRef::new(*elem, 0)),
                    None => Object::Null,
                })
                .collect();
            nums.push(Object::Integer(*page as i64));
            nums.push(Object::Array(slots));
        }
        let next_key = by_page.keys().max().map(|p| p + 1).unwrap_or(0);

        Object::dict(vec![
            ("Type", Object::name("StructTreeRoot")),
            ("K", Object::Array(kids)),
            (
                "ParentTree",
                Object::dict(vec![("Nums", Object::Array(nums))]),
            ),
            ("ParentTreeNextKey", Object::Integer(next_key as i64)),
        ])
    }

    fn struct_elem_object(&self, tree: &StructTree, id: NodeId, plan: &ObjectPlan) -> Object {
        let node = &tree.nodes[id.0 as usize];
        let mut dict = Dictionary::new();
        dict.insert("Type".to_string(), Object::name("StructElem"));
        dict.insert("S".to_string(), Object::name(node.tag.as_name()));

        let parent_ref = match node.parent {
            Some(parent) => ObjectRef::new(plan.elem_id(parent), 0),
            // Top-level elements answer to the StructTreeRoot itself
            None => ObjectRef::new(plan.struct_root.unwrap_or(plan.catalog), 0),
        };
        dict.insert("P".to_string(), Object::Reference(parent_ref));

        let kids: Vec<Object> = node
            .children
            .iter()
            .map(|child| match child {
                NodeChild::Element(child_id) => {
                    Object::Reference(ObjectRef::new(plan.elem_id(*child_id), 0))
                },
                NodeChild::MarkedContent { page, mcid } => {
                    let mut mcr = Dictionary::new();
                    mcr.insert("Type".to_string(), Object::name("MCR"));
                    if let Some(page_id) = plan.page_ids.get(*page as usize) {
                        mcr.insert(
                            "Pg".to_string(),
                            Object::Reference(ObjectRef::new(*page_id, 0)),
                        );
                    }
                    mcr.insert("MCID".to_string(), Object::Integer(*mcid as i64));
                    Object::Dictionary(mcr)
                },
            })
            .collect();
        dict.insert("K".to_string(), Object::Array(kids));

        if let Some(page) = node.page {
            if let Some(page_id) = plan.page_ids.get(page as usize) {
                dict.insert("Pg".to_string(), Object::Reference(ObjectRef::new(*page_id, 0)));
            }
        }
        if let Some(ref alt) = node.alt {
            dict.insert("Alt".to_string(), Object::string(alt));
        }
        if let Some(ref text) = node.text {
            dict.insert("T".to_string(), Object::string(text));
        }
        if let Some(ref lang) = node.lang {
            dict.insert("Lang".to_string(), Object::string(lang));
        }
        if let Some(ref summary) = node.summary {
            dict.insert("Summary".to_string(), Object::string(summary));
        }
        Object::Dictionary(dict)
    }
}

/// Object-number layout for one render.
struct ObjectPlan {
    catalog: u32,
    pages_root: u32,
    page_ids: Vec<u32>,
    content_ids: Vec<u32>,
    info: u32,
    metadata: Option<u32>,
    struct_root: Option<u32>,
    first_elem: u32,
    next_id: u32,
}

struct IdCounter(u32);

impl IdCounter {
    fn take(&mut self) -> u32 {
        let id = self.0;
        self.0 += 1;
        id
    }
}

impl ObjectPlan {
    fn new(doc: &PdfDocument) -> Self {
        let mut counter = IdCounter(1);

        let catalog = counter.take();
        let pages_root = counter.take();
        let mut page_ids = Vec::with_capacity(doc.pages.len());
        let mut content_ids = Vec::with_capacity(doc.pages.len());
        for _ in &doc.pages {
            page_ids.push(counter.take());
            content_ids.push(counter.take());
        }
        let info = counter.take();
        let metadata = doc.xmp.as_ref().map(|_| counter.take());
        let (struct_root, first_elem) = match doc.struct_tree.as_ref() {
            Some(tree) => {
                let root = counter.take();
                let first = counter.0;
                counter.0 += tree.nodes.len() as u32;
                (Some(root), first)
            },
            None => (None, counter.0),
        };
        let next = counter.0;

        Self {
            catalog,
            pages_root,
            page_ids,
            content_ids,
            info,
            metadata,
            struct_root,
            first_elem,
            next_id: next,
        }
    }

    fn elem_id(&self, id: NodeId) -> u32 {
        self.first_elem + id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::builder::{ElementOptions, StructureTreeBuilder};
    use crate::structure::types::StructTag;

    fn sample_document() -> PdfDocument {
        let mut builder = StructureTreeBuilder::new();
        builder.create_root().unwrap();
        builder.create_element(
            StructTag::H1,
            0,
            ElementOptions {
                text: Some("Intro".into()),
                ..Default::default()
            },
        );
        builder.finalize();
        let (tree, _) = builder.finish();

        let mut doc = PdfDocument::new();
        doc.pages.push(Page {
            width: 612.0,
            height: 792.0,
            content: b"/H1 <</MCID 0>> BDC\nBT (Intro) Tj ET\nEMC".to_vec(),
            annotations: vec![],
        });
        doc.struct_tree = Some(tree);
        doc.set_title("Sample");
        doc.set_language("en");
        doc.set_marked(true);
        doc
    }

    #[test]
    fn test_render_has_header_xref_trailer() {
        let bytes = PdfWriter::new().render(&sample_document()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.7\n"));
        assert!(text.contains("xref\n"));
        assert!(text.contains("trailer\n"));
        assert!(text.contains("startxref\n"));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn test_render_emits_structure_dictionaries() {
        let bytes = PdfWriter::new().render(&sample_document()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Type /StructTreeRoot"));
        assert!(text.contains("/Type /StructElem"));
        assert!(text.contains("/S /Document"));
        assert!(text.contains("/S /H1"));
        assert!(text.contains("/Type /MCR"));
        assert!(text.contains("/MCID 0"));
        assert!(text.contains("/ParentTree"));
        assert!(text.contains("/StructParents 0"));
    }

    #[test]
    fn test_render_emits_catalog_attributes() {
        let bytes = PdfWriter::new().render(&sample_document()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Lang (en)"));
        assert!(text.contains("/Marked true"));
        assert!(text.contains("/Language (en-US)"));
        assert!(text.contains("/Title (Sample)"));
        assert!(text.contains("dc:title"));
    }

    #[test]
    fn test_compressed_content_stream() {
        let writer = PdfWriter::with_config(PdfWriterConfig::default().with_compress(true));
        let bytes = writer.render(&sample_document()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Filter /FlateDecode"));
        assert!(!text.contains("BT (Intro) Tj ET"));
    }

    #[test]
    fn test_write_to_file_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        PdfWriter::new()
            .write_to_file(&sample_document(), &path)
            .unwrap();
        let written = std::fs::read(&path).unwrap();
        assert!(written.starts_with(b"%PDF-1.7"));
        // No temp file left behind
        assert!(!dir.path().join("out.pdf.tmp").exists());
    }
}
