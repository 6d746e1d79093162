//! Reads slide text back out of a PPTX and reports which placeholders a
//! template contains.

use crate::package::{local_name, open_package, read_part_to_string, slide_parts};
use quick_xml::events::Event;
use quick_xml::Reader;
use report_core::{placeholder_keys, Error, ExtractedSlide, Result};
use serde::Serialize;

/// Reader for slide text in a PPTX package.
pub struct SlideReader;

impl SlideReader {
    /// Create a new slide reader.
    pub fn new() -> Self {
        Self
    }

    /// Extract paragraph text from every slide, in presentation order.
    pub fn read(&self, pptx: &[u8]) -> Result<Vec<ExtractedSlide>> {
        Ok(self.read_slides(pptx)?.into_iter().map(|(slide, _)| slide).collect())
    }

    /// Summarize the placeholders a template offers for binding.
    pub fn inspect(&self, pptx: &[u8]) -> Result<TemplateReport> {
        let mut report = TemplateReport::default();

        for (slide, runs) in self.read_slides(pptx)? {
            // Keys fully inside one run can be filled.
            for run in &runs {
                for key in placeholder_keys(run) {
                    if !report.placeholders.contains(&key) {
                        report.placeholders.push(key);
                    }
                }
            }
            // Keys only visible across run boundaries cannot.
            for line in &slide.lines {
                for key in placeholder_keys(line) {
                    let in_single_run = runs.iter().any(|r| r.contains(&format!("{{{{{}}}}}", key)));
                    if !in_single_run && !report.split_placeholders.contains(&key) {
                        report.split_placeholders.push(key);
                    }
                }
            }
            report.slides.push(slide);
        }

        Ok(report)
    }

    fn read_slides(&self, pptx: &[u8]) -> Result<Vec<(ExtractedSlide, Vec<String>)>> {
        let mut archive = open_package(pptx)?;
        let parts = slide_parts(&mut archive)?;

        let mut slides = Vec::with_capacity(parts.len());
        for (idx, part) in parts.iter().enumerate() {
            let content = read_part_to_string(&mut archive, part)?;
            let (lines, runs) = extract_paragraphs(&content)
                .map_err(|e| Error::TemplateError(format!("slide '{}': {}", part, e)))?;

            let mut slide = ExtractedSlide::new(idx + 1, part.as_str());
            for line in lines {
                slide.add_line(line);
            }
            slides.push((slide, runs));
        }

        Ok(slides)
    }
}

impl Default for SlideReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Placeholders found in a template.
#[derive(Debug, Default, Serialize)]
pub struct TemplateReport {
    /// Slides with their paragraph text.
    pub slides: Vec<ExtractedSlide>,

    /// Keys that appear whole inside a single text run, in order of first use.
    pub placeholders: Vec<String>,

    /// Keys whose `{{...}}` spans several runs; these are never filled.
    pub split_placeholders: Vec<String>,
}

/// Collect paragraph text (`a:p`) and the text of each run (`a:r`).
fn extract_paragraphs(xml: &str) -> Result<(Vec<String>, Vec<String>)> {
    let mut reader = Reader::from_str(xml);

    let mut lines = Vec::new();
    let mut runs = Vec::new();

    let mut paragraph: Option<String> = None;
    let mut run: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"p" => paragraph = Some(String::new()),
                b"r" => run = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                // Line breaks inside a paragraph
                if local_name(e.name().as_ref()) == b"br" {
                    if let Some(ref mut p) = paragraph {
                        p.push('\n');
                    }
                }
            }
            Ok(Event::Text(ref e)) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::XmlError(format!("bad text escape: {}", e)))?;
                if let Some(ref mut p) = paragraph {
                    p.push_str(&text);
                }
                if let Some(ref mut r) = run {
                    r.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"p" => {
                    if let Some(p) = paragraph.take() {
                        if !p.trim().is_empty() {
                            lines.push(p);
                        }
                    }
                }
                b"r" => {
                    if let Some(r) = run.take() {
                        runs.push(r);
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "malformed XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok((lines, runs))
}
