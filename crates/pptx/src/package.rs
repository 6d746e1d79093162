//! Access to the parts of a PPTX package (a ZIP archive of XML documents).

use quick_xml::events::Event;
use quick_xml::Reader;
use report_core::{Error, Result};
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

/// Parts every PresentationML package must contain.
const REQUIRED_PARTS: &[&str] = &["[Content_Types].xml", PRESENTATION];

const PRESENTATION: &str = "ppt/presentation.xml";

const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Open an in-memory PPTX and check that it looks like a presentation.
pub(crate) fn open_package(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    let archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::TemplateError(format!("not a valid PPTX archive: {}", e)))?;

    for part in REQUIRED_PARTS {
        if !has_part(&archive, part) {
            return Err(Error::TemplateError(format!(
                "not a valid PPTX archive: missing required part '{}'",
                part
            )));
        }
    }

    Ok(archive)
}

/// Get the slide part names in presentation order.
///
/// Order comes from the `p:sldIdLst` of `ppt/presentation.xml`. Slide
/// relationships it does not list follow, ordered by their file number.
pub(crate) fn slide_parts<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
    if !has_part(archive, PRESENTATION_RELS) {
        // A package without relationships has no reachable slides.
        log::warn!("Template has no {}; no slides to fill", PRESENTATION_RELS);
        return Ok(Vec::new());
    }

    let rels_content = read_part_to_string(archive, PRESENTATION_RELS)?;
    let mut rels = slide_relationships(&rels_content)?;

    let presentation = read_part_to_string(archive, PRESENTATION)?;
    let mut ordered = Vec::with_capacity(rels.len());
    for rid in slide_id_list(&presentation)? {
        if let Some(pos) = rels.iter().position(|rel| rel.id == rid) {
            ordered.push(rels.remove(pos).part);
        } else {
            log::warn!("Slide id {} has no slide relationship", rid);
        }
    }

    if !rels.is_empty() {
        log::debug!("{} slide(s) not listed in sldIdLst", rels.len());
    }

    // Target numbering reflects slide order more reliably than rIds
    rels.sort_by(|a, b| match (a.number, b.number) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.part.cmp(&b.part),
    });
    ordered.extend(rels.into_iter().map(|rel| rel.part));

    Ok(ordered)
}

/// A slide relationship of `ppt/presentation.xml`.
struct SlideRel {
    id: String,
    part: String,
    number: Option<usize>,
}

fn slide_relationships(rels_content: &str) -> Result<Vec<SlideRel>> {
    let mut slides = Vec::new();

    let mut reader = Reader::from_str(rels_content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut id = String::new();

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Type" => rel_type = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                        b"Id" => id = String::from_utf8_lossy(&attr.value).to_string(),
                        _ => {}
                    }
                }

                if rel_type.ends_with("/slide") {
                    let number = extract_slide_number(&target).or_else(|| extract_slide_number(&id));
                    slides.push(SlideRel {
                        id,
                        part: resolve_target(&target),
                        number,
                    });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing {}: {}",
                    PRESENTATION_RELS, e
                )));
            }
            _ => {}
        }
    }

    Ok(slides)
}

/// Relationship ids of `p:sldIdLst/p:sldId`, in document order.
fn slide_id_list(presentation: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut in_list = false;

    let mut reader = Reader::from_str(presentation);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sldIdLst" => {
                in_list = true;
            }
            Ok(Event::End(ref e)) if local_name(e.name().as_ref()) == b"sldIdLst" => {
                in_list = false;
            }
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if in_list && local_name(e.name().as_ref()) == b"sldId" =>
            {
                // The plain `id` is the slide id; the namespaced one is the rId
                let rid = e.attributes().flatten().find(|attr| {
                    let key = attr.key.as_ref();
                    key != b"id" && local_name(key) == b"id"
                });
                if let Some(attr) = rid {
                    ids.push(String::from_utf8_lossy(&attr.value).to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing {}: {}", PRESENTATION, e)));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Whether the archive contains a part with exactly this name.
pub(crate) fn has_part<R: Read + Seek>(archive: &ZipArchive<R>, name: &str) -> bool {
    archive.file_names().any(|n| n == name)
}

/// Read a part from the archive as UTF-8 text.
pub(crate) fn read_part_to_string<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("Part not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Turn a relationship target of `ppt/presentation.xml` into a part name.
fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else {
        format!("ppt/{}", target.trim_start_matches("./"))
    }
}

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};

    fn package(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide10.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/>
  <Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster" Target="notesMasters/notesMaster1.xml"/>
  <Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="/ppt/slides/slide1.xml"/>
</Relationships>"#;

    const PRESENTATION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="258" r:id="rId3"/><p:sldId id="256" r:id="rId5"/></p:sldIdLst></p:presentation>"#;

    #[test]
    fn test_slide_parts_follow_sld_id_lst() {
        let bytes = package(&[
            ("[Content_Types].xml", "<Types/>"),
            ("ppt/presentation.xml", PRESENTATION_XML),
            (PRESENTATION_RELS, RELS),
        ]);
        let mut archive = open_package(&bytes).unwrap();
        assert_eq!(
            slide_parts(&mut archive).unwrap(),
            vec![
                "ppt/slides/slide10.xml",
                "ppt/slides/slide1.xml",
                // Not in sldIdLst, so appended
                "ppt/slides/slide2.xml"
            ]
        );
    }

    #[test]
    fn test_slide_id_list_skips_master_ids() {
        assert_eq!(slide_id_list(PRESENTATION_XML).unwrap(), vec!["rId3", "rId5"]);
    }

    #[test]
    fn test_slide_parts_in_numeric_order_without_sld_id_lst() {
        let bytes = package(&[
            ("[Content_Types].xml", "<Types/>"),
            ("ppt/presentation.xml", "<p:presentation/>"),
            (PRESENTATION_RELS, RELS),
        ]);
        let mut archive = open_package(&bytes).unwrap();
        assert_eq!(
            slide_parts(&mut archive).unwrap(),
            vec![
                "ppt/slides/slide1.xml",
                "ppt/slides/slide2.xml",
                "ppt/slides/slide10.xml"
            ]
        );
    }

    #[test]
    fn test_open_package_rejects_non_zip() {
        let err = open_package(b"definitely not a zip").err().expect("not a zip");
        assert!(matches!(err, Error::TemplateError(_)));
    }

    #[test]
    fn test_open_package_requires_presentation_part() {
        let bytes = package(&[("[Content_Types].xml", "<Types/>")]);
        let err = open_package(&bytes).err().expect("missing part");
        assert!(err.to_string().contains("ppt/presentation.xml"));
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_target("/ppt/slides/slide1.xml"), "ppt/slides/slide1.xml");
    }
}
