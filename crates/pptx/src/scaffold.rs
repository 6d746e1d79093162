//! Builder for small PPTX packages, for tests.
//!
//! The packages carry the parts the binder and reader care about (content
//! types, presentation, relationships, one master and layout, and slides).
//! They are not meant to be opened in PowerPoint.
//!
//! Each slide is a list of paragraphs. A `|` inside a paragraph splits it
//! into separate runs, e.g. `"{{NAME|_EN}}"` yields two runs.

use quick_xml::escape::escape;
use std::io::{Cursor, Write};
use zip::write::{FileOptions, ZipWriter};

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Build a package with one slide per entry of `slides`.
pub fn build_pptx(slides: &[&[&str]]) -> Vec<u8> {
    let xml: Vec<String> = slides.iter().map(|paragraphs| slide_xml(paragraphs)).collect();
    assemble(&xml)
}

/// Build a one-slide package whose slide part is `slide_xml` verbatim.
pub fn build_pptx_with_raw_slide(slide_xml: &str) -> Vec<u8> {
    assemble(&[slide_xml.to_string()])
}

fn assemble(slides: &[String]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();

    let mut put = |name: &str, content: &str| {
        zip.start_file(name, options).expect("start scaffold entry");
        zip.write_all(content.as_bytes()).expect("write scaffold entry");
    };

    put("[Content_Types].xml", &content_types(slides.len()));
    put(
        "_rels/.rels",
        &relationships(&[("rId1", "officeDocument", "ppt/presentation.xml")]),
    );
    put("ppt/presentation.xml", &presentation(slides.len()));

    let mut rels = vec![(
        "rId1".to_string(),
        "slideMaster",
        "slideMasters/slideMaster1.xml".to_string(),
    )];
    for n in 1..=slides.len() {
        rels.push((format!("rId{}", n + 1), "slide", format!("slides/slide{}.xml", n)));
    }
    let rels: Vec<(&str, &str, &str)> = rels
        .iter()
        .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str()))
        .collect();
    put("ppt/_rels/presentation.xml.rels", &relationships(&rels));

    put("ppt/slideMasters/slideMaster1.xml", &master());
    put(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &relationships(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")]),
    );
    put("ppt/slideLayouts/slideLayout1.xml", &layout());
    put(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        &relationships(&[("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")]),
    );

    for (idx, slide) in slides.iter().enumerate() {
        let n = idx + 1;
        put(&format!("ppt/slides/slide{}.xml", n), slide);
        put(
            &format!("ppt/slides/_rels/slide{}.xml.rels", n),
            &relationships(&[("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")]),
        );
    }

    zip.finish().expect("finish scaffold").into_inner()
}

fn content_types(slide_count: usize) -> String {
    let mut overrides = String::from(concat!(
        r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
        r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#,
        r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
    ));
    for n in 1..=slide_count {
        overrides.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
            n
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{}</Types>"#,
        overrides
    )
}

fn relationships(rels: &[(&str, &str, &str)]) -> String {
    let body: String = rels
        .iter()
        .map(|(id, kind, target)| {
            format!(
                r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
                id, REL, kind, target
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        body
    )
}

fn presentation(slide_count: usize) -> String {
    let ids: String = (1..=slide_count)
        .map(|n| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + n, n + 1))
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{ids}</p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
    )
}

fn master() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree></p:cSld><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#
    )
}

fn layout() -> String {
    // Layout text is never filled; it keeps a placeholder to prove that.
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sldLayout>"#,
        text_shape(2, &["{{NAME_EN}}"])
    )
}

fn slide_xml(paragraphs: &[&str]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
        text_shape(2, paragraphs)
    )
}

fn text_shape(id: usize, paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|paragraph| {
            let runs: String = paragraph
                .split('|')
                .map(|run| {
                    format!(
                        r#"<a:r><a:rPr lang="en-US" sz="1800" dirty="0"/><a:t>{}</a:t></a:r>"#,
                        escape(run)
                    )
                })
                .collect();
            format!("<a:p>{}</a:p>", runs)
        })
        .collect();

    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="838200" y="365125"/><a:ext cx="10515600" cy="1325563"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr/><a:lstStyle/>{body}</p:txBody></p:sp>"#
    )
}
