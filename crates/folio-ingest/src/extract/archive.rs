//! Zip container access and XML helpers shared by the OOXML and ODF extractors.

use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::Node;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use super::ExtractError;
use crate::page::{clean_text, PageRecord};

pub(crate) type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Open a zip container held in memory.
pub(crate) fn open(bytes: &[u8]) -> Result<Archive<'_>, ExtractError> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

/// Read a named part as UTF-8 text.
pub(crate) fn read_part(archive: &mut Archive<'_>, name: &str) -> Result<String, ExtractError> {
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(ZipError::FileNotFound) => return Err(ExtractError::MissingPart(name.to_string())),
        Err(e) => return Err(e.into()),
    };
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Read a named part, treating any failure as absence.
pub(crate) fn try_read_part(archive: &mut Archive<'_>, name: &str) -> Option<String> {
    match read_part(archive, name) {
        Ok(text) => Some(text),
        Err(e) => {
            debug!("Optional part {} unavailable: {}", name, e);
            None
        }
    }
}

/// Names of all file entries in the container.
pub(crate) fn part_names(archive: &Archive<'_>) -> Vec<String> {
    archive.file_names().map(str::to_string).collect()
}

/// Element test by namespace URI and local name.
pub(crate) fn is(node: Node<'_, '_>, namespace: &str, local: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local
        && node.tag_name().namespace() == Some(namespace)
}

// Closing tags that end a paragraph in any of the supported vocabularies.
static PARAGRAPH_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</(?:w:p|a:p|text:p|text:h)>|<(?:w:br|a:br|text:line-break)\b[^>]*/>").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Strip markup from a (possibly malformed) XML part.
fn strip_markup(xml: &str) -> String {
    let with_breaks = PARAGRAPH_END_RE.replace_all(xml, "\n");
    let bare = TAG_RE.replace_all(&with_breaks, "");
    bare.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Last-resort extraction: every text-bearing part of the container, stripped
/// of markup and concatenated in entry order as a single page.
///
/// Works on XML the structured parser rejected; needs a readable container.
pub(crate) fn dump_text(bytes: &[u8], is_text_part: fn(&str) -> bool) -> Option<PageRecord> {
    let mut archive = open(bytes).ok()?;
    let mut names: Vec<String> = part_names(&archive)
        .into_iter()
        .filter(|n| is_text_part(n))
        .collect();
    names.sort_by_key(|n| natural_key(n));

    let mut pieces = Vec::new();
    for name in &names {
        if let Some(xml) = try_read_part(&mut archive, name) {
            let text = clean_text(&strip_markup(&xml));
            if !text.is_empty() {
                pieces.push(text);
            }
        }
    }

    let text = pieces.join("\n\n");
    if text.is_empty() {
        None
    } else {
        Some(PageRecord::new(1, text))
    }
}

/// Sort key that orders `slide2.xml` before `slide10.xml`.
pub(crate) fn natural_key(name: &str) -> (String, u32) {
    let stem = name.trim_end_matches(".xml");
    let digits: String = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let prefix = stem[..stem.len() - digits.len()].to_string();
    (prefix, digits.parse().unwrap_or(0))
}
