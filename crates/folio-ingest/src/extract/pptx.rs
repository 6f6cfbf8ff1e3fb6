//! PPTX extraction: one page record per slide.

use std::collections::HashMap;

use roxmltree::{Document, Node};
use tracing::debug;

use super::archive::{self, is, natural_key, Archive};
use super::ExtractError;
use crate::page::PageRecord;

const A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// Slide parts live directly under `ppt/slides/`.
fn is_slide_part(name: &str) -> bool {
    name.strip_prefix("ppt/slides/")
        .map(|rest| rest.starts_with("slide") && rest.ends_with(".xml") && !rest.contains('/'))
        .unwrap_or(false)
}

/// Parts searched by the flat-text fallback.
pub(crate) fn is_text_part(name: &str) -> bool {
    is_slide_part(name)
}

pub(crate) fn extract(bytes: &[u8]) -> Result<Vec<PageRecord>, ExtractError> {
    let mut archive = archive::open(bytes)?;
    let slides = slide_order(&mut archive);
    if slides.is_empty() {
        return Err(ExtractError::MissingPart("ppt/slides".to_string()));
    }

    let mut pages = Vec::new();
    for (index, part) in slides.iter().enumerate() {
        let number = index as u32 + 1;
        match slide_text(&mut archive, part) {
            Ok(text) if !text.is_empty() => pages.push(PageRecord::new(number, text)),
            Ok(_) => debug!("Slide {} has no text", number),
            Err(e) => debug!("Skipping slide {} ({}): {}", number, part, e),
        }
    }
    Ok(pages)
}

/// Slide part names in presentation order.
///
/// Follows `p:sldIdLst` through the presentation relationships; when that
/// chain is unreadable, falls back to the numeric order of the slide parts.
fn slide_order(archive: &mut Archive<'_>) -> Vec<String> {
    match ordered_from_presentation(archive) {
        Some(order) if !order.is_empty() => order,
        _ => {
            let mut names: Vec<String> = archive::part_names(archive)
                .into_iter()
                .filter(|n| is_slide_part(n))
                .collect();
            names.sort_by_key(|n| natural_key(n));
            names
        }
    }
}

fn ordered_from_presentation(archive: &mut Archive<'_>) -> Option<Vec<String>> {
    let rels_xml = archive::try_read_part(archive, PRESENTATION_RELS)?;
    let pres_xml = archive::try_read_part(archive, PRESENTATION_PART)?;
    let rels_doc = Document::parse(&rels_xml).ok()?;
    let pres_doc = Document::parse(&pres_xml).ok()?;

    let targets: HashMap<&str, &str> = rels_doc
        .descendants()
        .filter(|n| is(*n, PKG_RELS, "Relationship"))
        .filter_map(|n| Some((n.attribute("Id")?, n.attribute("Target")?)))
        .collect();

    let order = pres_doc
        .descendants()
        .filter(|n| is(*n, P, "sldId"))
        .filter_map(|n| n.attribute((R, "id")))
        .filter_map(|rid| targets.get(rid))
        .map(|target| resolve_target(target))
        .collect();
    Some(order)
}

/// Relationship targets are relative to `ppt/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target.trim_start_matches("./")),
    }
}

/// Text of every text body on the slide (shapes, placeholders, table
/// cells), one block per body, in document order.
fn slide_text(archive: &mut Archive<'_>, part: &str) -> Result<String, ExtractError> {
    let xml = archive::read_part(archive, part)?;
    let doc = Document::parse(&xml)?;

    let blocks: Vec<String> = doc
        .descendants()
        .filter(|n| is(*n, P, "txBody") || is(*n, A, "txBody"))
        .map(text_body)
        .filter(|t| !t.is_empty())
        .collect();
    Ok(blocks.join("\n"))
}

fn text_body(body: Node<'_, '_>) -> String {
    let paragraphs: Vec<String> = body
        .children()
        .filter(|n| is(*n, A, "p"))
        .map(|p| {
            let mut line = String::new();
            for node in p.descendants() {
                if is(node, A, "t") {
                    line.push_str(node.text().unwrap_or(""));
                } else if is(node, A, "br") {
                    line.push('\n');
                }
            }
            line
        })
        .collect();
    paragraphs.join("\n").trim().to_string()
}
