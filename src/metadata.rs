//! XMP metadata for remediated documents.
//!
//! XMP is XML-based metadata carried in the catalog's `/Metadata` stream;
//! full compliance requires the document title in both the Info dictionary
//! and here (dc:title). See ISO 32000-1:2008, Section 14.3.2.
//!
//! Reading uses a quick-xml event loop; writing assembles the packet as a
//! string, which is the simplest faithful way to produce the fixed
//! `<?xpacket?>` envelope.

use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

/// XMP namespace URIs
const NS_X: &str = "adobe:ns:meta/";
const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
const NS_XMP: &str = "http://ns.adobe.com/xap/1.0/";
const NS_XMP_MM: &str = "http://ns.adobe.com/xap/1.0/mm/";

/// The XMP properties this crate reads and writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmpPacket {
    /// Document title (dc:title)
    pub title: Option<String>,
    /// Document language (dc:language)
    pub language: Option<String>,
    /// Creation date, ISO 8601 (xmp:CreateDate)
    pub create_date: Option<String>,
    /// Last modification date, ISO 8601 (xmp:ModifyDate)
    pub modify_date: Option<String>,
    /// Document identity (xmpMM:DocumentID)
    pub document_id: Option<String>,
    /// This instance's identity (xmpMM:InstanceID)
    pub instance_id: Option<String>,
}

impl XmpPacket {
    /// Create a packet with fresh document/instance IDs and a current
    /// modification date.
    pub fn new() -> Self {
        let mut packet = Self::default();
        packet.document_id = Some(format!("uuid:{}", uuid::Uuid::new_v4()));
        packet.instance_id = Some(format!("uuid:{}", uuid::Uuid::new_v4()));
        packet.stamp_modified();
        packet
    }

    /// Set the modification date to now and rotate the instance ID.
    pub fn stamp_modified(&mut self) {
        self.modify_date = Some(
            chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%SZ")
                .to_string(),
        );
        self.instance_id = Some(format!("uuid:{}", uuid::Uuid::new_v4()));
    }

    /// Parse the properties out of an XMP packet.
    ///
    /// Only the elements this crate cares about are read; everything else
    /// is skipped. Returns an error for XML that cannot be walked at all.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_str(std::str::from_utf8(xml)?);
        reader.trim_text(true);

        let mut packet = XmpPacket::default();
        let mut path: Vec<String> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    path.push(local_name(&name));
                },
                Ok(Event::End(_)) => {
                    path.pop();
                },
                Ok(Event::Text(ref t)) => {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::Metadata(format!("bad XMP text: {}", e)))?
                        .trim()
                        .to_string();
                    if text.is_empty() {
                        continue;
                    }
                    match path.last().map(String::as_str) {
                        // dc:title is an rdf:Alt of rdf:li entries, though some
                        // writers inline the text directly
                        Some("li") if path.iter().any(|p| p == "title") => {
                            packet.title.get_or_insert(text);
                        },
                        Some("title") => {
                            packet.title.get_or_insert(text);
                        },
                        Some("language") | Some("li")
                            if path.iter().any(|p| p == "language") =>
                        {
                            packet.language.get_or_insert(text);
                        },
                        Some("CreateDate") => packet.create_date = Some(text),
                        Some("ModifyDate") => packet.modify_date = Some(text),
                        Some("DocumentID") => packet.document_id = Some(text),
                        Some("InstanceID") => packet.instance_id = Some(text),
                        _ => {},
                    }
                },
                Ok(Event::Eof) => break,
                Ok(_) => {},
                Err(e) => return Err(Error::Metadata(format!("XMP parse error: {}", e))),
            }
        }
        Ok(packet)
    }

    /// Serialize as a full `<?xpacket?>` envelope.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<x:xmpmeta xmlns:x="{}">"#, NS_X));
        xml.push('\n');
        xml.push_str(&format!(r#"  <rdf:RDF xmlns:rdf="{}">"#, NS_RDF));
        xml.push('\n');
        xml.push_str(&format!(
            r#"    <rdf:Description rdf:about="" xmlns:dc="{}" xmlns:xmp="{}" xmlns:xmpMM="{}">"#,
            NS_DC, NS_XMP, NS_XMP_MM
        ));
        xml.push('\n');

        if let Some(ref title) = self.title {
            xml.push_str("      <dc:title>\n");
            xml.push_str("        <rdf:Alt>\n");
            xml.push_str(&format!(
                "          <rdf:li xml:lang=\"x-default\">{}</rdf:li>\n",
                escape_xml(title)
            ));
            xml.push_str("        </rdf:Alt>\n");
            xml.push_str("      </dc:title>\n");
        }
        if let Some(ref language) = self.language {
            xml.push_str("      <dc:language>\n");
            xml.push_str("        <rdf:Bag>\n");
            xml.push_str(&format!(
                "          <rdf:li>{}</rdf:li>\n",
                escape_xml(language)
            ));
            xml.push_str("        </rdf:Bag>\n");
            xml.push_str("      </dc:language>\n");
        }
        if let Some(ref date) = self.create_date {
            xml.push_str(&format!(
                "      <xmp:CreateDate>{}</xmp:CreateDate>\n",
                escape_xml(date)
            ));
        }
        if let Some(ref date) = self.modify_date {
            xml.push_str(&format!(
                "      <xmp:ModifyDate>{}</xmp:ModifyDate>\n",
                escape_xml(date)
            ));
        }
        if let Some(ref id) = self.document_id {
            xml.push_str(&format!(
                "      <xmpMM:DocumentID>{}</xmpMM:DocumentID>\n",
                escape_xml(id)
            ));
        }
        if let Some(ref id) = self.instance_id {
            xml.push_str(&format!(
                "      <xmpMM:InstanceID>{}</xmpMM:InstanceID>\n",
                escape_xml(id)
            ));
        }

        xml.push_str("    </rdf:Description>\n");
        xml.push_str("  </rdf:RDF>\n");
        xml.push_str("</x:xmpmeta>\n");
        xml.push_str(r#"<?xpacket end="w"?>"#);
        xml
    }

    /// Serialize as bytes for the `/Metadata` stream.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_xml().into_bytes()
    }
}

/// Strip the namespace prefix from an element name.
fn local_name(name: &str) -> String {
    name.rsplit(':').next().unwrap_or(name).to_string()
}

/// Escape XML text content.
fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_round_trip() {
        let mut packet = XmpPacket::new();
        packet.title = Some("Annual Report & Outlook".to_string());
        packet.language = Some("en".to_string());

        let xml = packet.to_xml();
        assert!(xml.starts_with("<?xpacket begin="));
        assert!(xml.contains("<dc:title>"));
        assert!(xml.contains("Annual Report &amp; Outlook"));

        let parsed = XmpPacket::parse(xml.as_bytes()).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Annual Report & Outlook"));
        assert_eq!(parsed.language.as_deref(), Some("en"));
        assert_eq!(parsed.document_id, packet.document_id);
    }

    #[test]
    fn test_new_packet_has_ids_and_date() {
        let packet = XmpPacket::new();
        assert!(packet.document_id.as_deref().unwrap().starts_with("uuid:"));
        assert!(packet.instance_id.is_some());
        assert!(packet.modify_date.is_some());
    }

    #[test]
    fn test_parse_foreign_packet() {
        let xml = br#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
            <x:xmpmeta xmlns:x="adobe:ns:meta/">
              <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
                <rdf:Description rdf:about=""
                    xmlns:dc="http://purl.org/dc/elements/1.1/"
                    xmlns:pdf="http://ns.adobe.com/pdf/1.3/">
                  <dc:title><rdf:Alt>
                    <rdf:li xml:lang="x-default">Budget 2025</rdf:li>
                  </rdf:Alt></dc:title>
                  <pdf:Producer>SomeTool 9.1</pdf:Producer>
                </rdf:Description>
              </rdf:RDF>
            </x:xmpmeta>
            <?xpacket end="w"?>"#;
        let packet = XmpPacket::parse(xml).unwrap();
        assert_eq!(packet.title.as_deref(), Some("Budget 2025"));
        assert!(packet.language.is_none());
    }

    #[test]
    fn test_empty_packet_serializes_envelope_only() {
        let packet = XmpPacket::default();
        let xml = packet.to_xml();
        assert!(!xml.contains("dc:title"));
        assert!(xml.contains("rdf:Description"));
    }

    #[test]
    fn test_stamp_modified_rotates_instance() {
        let mut packet = XmpPacket::new();
        let first = packet.instance_id.clone();
        packet.stamp_modified();
        assert_ne!(packet.instance_id, first);
    }
}
