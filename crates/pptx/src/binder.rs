//! Template binding: copy a PPTX package, filling placeholders on its slides.

use crate::package::{local_name, open_package, slide_parts};
use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};
use report_core::{Error, PlaceholderMap, Result};
use std::borrow::Cow;
use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// Fills `{{KEY}}` placeholders in the text runs of a PPTX template.
///
/// Replacement happens inside each `a:r/a:t` element, so run formatting is
/// kept. Only slides reachable from the presentation are rewritten; every
/// other part is copied unchanged and entry order is preserved.
#[derive(Debug, Clone, Copy)]
pub struct TemplateBinder;

impl TemplateBinder {
    /// Create a new binder.
    pub fn new() -> Self {
        Self
    }

    /// Produce a filled copy of `template`.
    pub fn bind(&self, template: &[u8], values: &PlaceholderMap) -> Result<Vec<u8>> {
        let mut archive = open_package(template)?;
        let slides: HashSet<String> = slide_parts(&mut archive)?.into_iter().collect();

        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(template.len())));
        let mut replaced = 0usize;

        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", index, e)))?;
            let name = entry.name().to_string();

            // Media is usually stored uncompressed; keep it that way.
            let method = match entry.compression() {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = FileOptions::default()
                .compression_method(method)
                .last_modified_time(entry.last_modified());

            if entry.is_dir() {
                writer
                    .add_directory(name.as_str(), options)
                    .map_err(|e| Error::ZipError(format!("Failed to write '{}': {}", name, e)))?;
                continue;
            }

            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;

            if slides.contains(&name) {
                let (filled, count) = fill_slide(&data, values)
                    .map_err(|e| Error::TemplateError(format!("slide '{}': {}", name, e)))?;
                log::debug!("{}: replaced {} run(s)", name, count);
                replaced += count;
                data = filled;
            }

            writer
                .start_file(name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to write '{}': {}", name, e)))?;
            writer.write_all(&data)?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))?;

        log::debug!(
            "Bound template: {} slide(s), {} run(s) replaced",
            slides.len(),
            replaced
        );

        Ok(cursor.into_inner())
    }
}

impl Default for TemplateBinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrite one slide part, substituting placeholders inside text runs.
///
/// Returns the new XML and the number of runs that changed.
fn fill_slide(xml: &[u8], values: &PlaceholderMap) -> Result<(Vec<u8>, usize)> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 256));

    let mut run_depth = 0usize;
    let mut in_run_text = false;
    let mut replaced = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::XmlError(format!(
                "malformed XML at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        let mut substituted: Option<String> = None;

        match &event {
            Event::Start(e) => match local_name(e.name().as_ref()) {
                b"r" => run_depth += 1,
                b"t" if run_depth > 0 => in_run_text = true,
                _ => {}
            },
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"t" => in_run_text = false,
                _ => {}
            },
            Event::Text(text) if in_run_text => {
                let raw = text
                    .unescape()
                    .map_err(|e| Error::XmlError(format!("bad text escape: {}", e)))?;
                if let Cow::Owned(filled) = values.apply(&raw) {
                    substituted = Some(filled);
                }
            }
            Event::Eof => break,
            _ => {}
        }

        let written = match substituted {
            Some(filled) => {
                replaced += 1;
                writer.write_event(Event::Text(BytesText::new(&filled)))
            }
            None => writer.write_event(event),
        };
        written.map_err(|e| Error::XmlError(format!("failed to write XML: {}", e)))?;
    }

    Ok((writer.into_inner(), replaced))
}
