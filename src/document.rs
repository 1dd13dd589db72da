//! In-memory document model.
//!
//! Owns everything a remediation pass reads and mutates: the catalog
//! dictionary, the Info dictionary, the XMP packet, pages with their raw
//! content-stream bytes and annotations, and the structure tree. One
//! remediation or validation session owns the document exclusively; there
//! is no concurrent mutation.
//!
//! Parsing arbitrary input PDFs is a declared non-goal — documents are
//! constructed from extractor snapshots (or programmatically in tests) and
//! serialized by the writer.

use crate::blocks::DocumentSnapshot;
use crate::metadata::XmpPacket;
use crate::object::{Dictionary, Object};
use crate::structure::types::StructTree;

/// One page of the document.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Raw content-stream bytes (mutated by the linker)
    pub content: Vec<u8>,
    /// Annotation dictionaries on the page
    pub annotations: Vec<Dictionary>,
}

/// A document being remediated or validated.
#[derive(Debug, Clone, Default)]
pub struct PdfDocument {
    /// Document catalog entries (`/Lang`, `/MarkInfo`, `/ViewerPreferences`, ...)
    pub catalog: Dictionary,
    /// Info dictionary entries (`/Title`, `/Author`, ...)
    pub info: Dictionary,
    /// XMP metadata packet
    pub xmp: Option<XmpPacket>,
    /// Pages in document order
    pub pages: Vec<Page>,
    /// The logical structure tree, once built
    pub struct_tree: Option<StructTree>,
}

impl PdfDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from an extractor snapshot.
    ///
    /// Annotations are materialized as dictionaries so validation sees the
    /// same shape the writer will emit.
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Self {
        let mut doc = Self::new();
        for page in &snapshot.pages {
            let annotations = page
                .annotations
                .iter()
                .map(|annot| {
                    let mut dict = Dictionary::new();
                    dict.insert("Type".to_string(), Object::name("Annot"));
                    dict.insert("Subtype".to_string(), Object::name(annot.subtype.clone()));
                    dict.insert(
                        "Rect".to_string(),
                        Object::Array(annot.rect.iter().map(|v| Object::Real(*v as f64)).collect()),
                    );
                    if let Some(ref tooltip) = annot.tooltip {
                        dict.insert("TU".to_string(), Object::string(tooltip));
                    }
                    if let Some(ref title) = annot.title {
                        dict.insert("T".to_string(), Object::string(title));
                    }
                    dict
                })
                .collect();
            doc.pages.push(Page {
                width: page.width,
                height: page.height,
                content: page.content.clone(),
                annotations,
            });
        }
        if let Some(ref title) = snapshot.title {
            doc.set_title(title);
        }
        doc
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page by index.
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Page by index, mutable.
    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    /// Set the document title in both places compliance requires:
    /// the Info dictionary and the XMP packet.
    pub fn set_title(&mut self, title: &str) {
        self.info
            .insert("Title".to_string(), Object::string(title));
        self.xmp
            .get_or_insert_with(XmpPacket::new)
            .title = Some(title.to_string());
    }

    /// Title from the Info dictionary.
    pub fn info_title(&self) -> Option<String> {
        self.info.get("Title").and_then(|obj| obj.as_text())
    }

    /// Title from the XMP packet.
    pub fn xmp_title(&self) -> Option<&str> {
        self.xmp.as_ref().and_then(|x| x.title.as_deref())
    }

    /// Set the primary language: `/Lang` in the catalog, mirrored into
    /// `/ViewerPreferences /Language` as a full locale and into dc:language.
    pub fn set_language(&mut self, lang: &str) {
        self.catalog
            .insert("Lang".to_string(), Object::string(lang));
        let locale = full_locale(lang);
        let prefs = self.viewer_preferences_mut();
        prefs.insert("Language".to_string(), Object::string(&locale));
        self.xmp
            .get_or_insert_with(XmpPacket::new)
            .language = Some(lang.to_string());
    }

    /// The catalog `/Lang` value.
    pub fn language(&self) -> Option<String> {
        self.catalog.get("Lang").and_then(|obj| obj.as_text())
    }

    /// The `/ViewerPreferences /Language` value.
    pub fn viewer_language(&self) -> Option<String> {
        self.catalog
            .get("ViewerPreferences")
            .and_then(|obj| obj.as_dict())
            .and_then(|prefs| prefs.get("Language"))
            .and_then(|obj| obj.as_text())
    }

    /// Set `/MarkInfo /Marked`.
    pub fn set_marked(&mut self, marked: bool) {
        self.catalog.insert(
            "MarkInfo".to_string(),
            Object::dict(vec![("Marked", Object::Boolean(marked))]),
        );
    }

    /// Whether `/MarkInfo /Marked` is true.
    pub fn is_marked(&self) -> bool {
        self.catalog
            .get("MarkInfo")
            .and_then(|obj| obj.as_dict())
            .and_then(|mi| mi.get("Marked"))
            .and_then(|obj| obj.as_bool())
            .unwrap_or(false)
    }

    /// Set `/ViewerPreferences /DisplayDocTitle true` so readers show the
    /// document title instead of the file name.
    pub fn set_display_doc_title(&mut self) {
        let prefs = self.viewer_preferences_mut();
        prefs.insert("DisplayDocTitle".to_string(), Object::Boolean(true));
    }

    fn viewer_preferences_mut(&mut self) -> &mut Dictionary {
        let entry = self
            .catalog
            .entry("ViewerPreferences".to_string())
            .or_insert_with(|| Object::Dictionary(Dictionary::new()));
        match entry {
            Object::Dictionary(dict) => dict,
            other => {
                *other = Object::Dictionary(Dictionary::new());
                match other {
                    Object::Dictionary(dict) => dict,
                    _ => unreachable!(),
                }
            },
        }
    }
}

/// Expand a bare language code into the full locale some readers expect in
/// `/ViewerPreferences /Language`. Codes that already carry a region pass
/// through unchanged.
fn full_locale(lang: &str) -> String {
    if lang.contains('-') {
        return lang.to_string();
    }
    let region = match lang.to_ascii_lowercase().as_str() {
        "en" => "US",
        "ja" => "JP",
        "ko" => "KR",
        "zh" => "CN",
        "sv" => "SE",
        "da" => "DK",
        other => return format!("{}-{}", lang, other.to_ascii_uppercase()),
    };
    format!("{}-{}", lang, region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{AnnotationSnapshot, PageSnapshot};

    #[test]
    fn test_set_title_covers_info_and_xmp() {
        let mut doc = PdfDocument::new();
        doc.set_title("Accessibility Report");
        assert_eq!(doc.info_title().as_deref(), Some("Accessibility Report"));
        assert_eq!(doc.xmp_title(), Some("Accessibility Report"));
    }

    #[test]
    fn test_set_language_mirrors_viewer_prefs() {
        let mut doc = PdfDocument::new();
        doc.set_language("en");
        assert_eq!(doc.language().as_deref(), Some("en"));
        assert_eq!(doc.viewer_language().as_deref(), Some("en-US"));

        doc.set_language("de-AT");
        assert_eq!(doc.viewer_language().as_deref(), Some("de-AT"));
    }

    #[test]
    fn test_full_locale_fallback_duplicates_code() {
        assert_eq!(full_locale("fr"), "fr-FR");
        assert_eq!(full_locale("it"), "it-IT");
        assert_eq!(full_locale("en"), "en-US");
    }

    #[test]
    fn test_mark_info() {
        let mut doc = PdfDocument::new();
        assert!(!doc.is_marked());
        doc.set_marked(true);
        assert!(doc.is_marked());
    }

    #[test]
    fn test_display_doc_title_preserves_language() {
        let mut doc = PdfDocument::new();
        doc.set_language("en");
        doc.set_display_doc_title();
        assert_eq!(doc.viewer_language().as_deref(), Some("en-US"));
        let prefs = doc
            .catalog
            .get("ViewerPreferences")
            .and_then(|o| o.as_dict())
            .unwrap();
        assert_eq!(prefs.get("DisplayDocTitle").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_from_snapshot_materializes_annotations() {
        let snapshot = DocumentSnapshot {
            title: Some("Form".into()),
            language: None,
            pages: vec![PageSnapshot {
                width: 612.0,
                height: 792.0,
                content: b"BT (x) Tj ET".to_vec(),
                blocks: vec![],
                annotations: vec![AnnotationSnapshot {
                    subtype: "Widget".into(),
                    rect: [10.0, 10.0, 110.0, 30.0],
                    tooltip: Some("Your name".into()),
                    title: None,
                }],
            }],
        };
        let doc = PdfDocument::from_snapshot(&snapshot);
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.info_title().as_deref(), Some("Form"));
        let annot = &doc.pages[0].annotations[0];
        assert_eq!(annot.get("Subtype").unwrap().as_name(), Some("Widget"));
        assert_eq!(annot.get("TU").unwrap().as_text().as_deref(), Some("Your name"));
    }
}
