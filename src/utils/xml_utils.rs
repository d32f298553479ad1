//! XML utility functions
//!
//! Helpers for inspecting XML metadata packets stored in TIFF tags.

use log::debug;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Returns true if `xml` contains an element whose local name is `element`
///
/// Parsing stops at the first match. Malformed XML is treated as not
/// containing the element.
pub fn contains_element(xml: &[u8], element: &str) -> bool {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == element.as_bytes() {
                    return true;
                }
            },
            Ok(Event::Eof) => return false,
            Ok(_) => {},
            Err(e) => {
                debug!("Stopped scanning XML packet at position {}: {}", reader.buffer_position(), e);
                return false;
            },
        }
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_nested_element() {
        let xmp = br#"<?xml version="1.0"?><Metadata><iScan Magnification="40" ScanRes="0.25"/></Metadata>"#;
        assert!(contains_element(xmp, "iScan"));
    }

    #[test]
    fn test_missing_element() {
        assert!(!contains_element(b"<Metadata><Other/></Metadata>", "iScan"));
    }

    #[test]
    fn test_element_name_in_text_does_not_match() {
        assert!(!contains_element(b"<Metadata>iScan</Metadata>", "iScan"));
    }
}
