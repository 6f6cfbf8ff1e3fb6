//! OpenDocument extraction (ODT, ODP, ODS).
//!
//! The container is inspected rather than trusted by extension:
//! 1. drawing pages present → one record per slide;
//! 2. otherwise tables present → one record per table, cells joined by ` | `;
//! 3. otherwise flowed text, paginated on soft page breaks and on paragraph
//!    styles that force a break before or after.

use std::collections::HashMap;

use roxmltree::{Document, Node};
use tracing::debug;

use super::archive::{self, is};
use super::ExtractError;
use crate::page::{clean_text, PageBuffer, PageRecord};

const OFFICE: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
const TEXT: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";
const DRAW: &str = "urn:oasis:names:tc:opendocument:xmlns:drawing:1.0";
const TABLE: &str = "urn:oasis:names:tc:opendocument:xmlns:table:1.0";
const STYLE: &str = "urn:oasis:names:tc:opendocument:xmlns:style:1.0";
const FO: &str = "urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0";

const CONTENT_PART: &str = "content.xml";
const STYLES_PART: &str = "styles.xml";

/// Parent-style chains deeper than this are treated as cyclic.
const MAX_STYLE_DEPTH: usize = 16;

/// Parts searched by the flat-text fallback.
pub(crate) fn is_text_part(name: &str) -> bool {
    name == CONTENT_PART
}

pub(crate) fn extract(bytes: &[u8]) -> Result<Vec<PageRecord>, ExtractError> {
    let mut archive = archive::open(bytes)?;
    let content = archive::read_part(&mut archive, CONTENT_PART)?;
    let styles_xml = archive::try_read_part(&mut archive, STYLES_PART);

    let doc = Document::parse(&content)?;
    let mut styles = StyleBreaks::default();
    styles.load(&doc);
    if let Some(xml) = styles_xml.as_deref() {
        match Document::parse(xml) {
            Ok(styles_doc) => styles.load(&styles_doc),
            Err(e) => debug!("Ignoring unreadable {}: {}", STYLES_PART, e),
        }
    }

    let body = doc
        .descendants()
        .find(|n| is(*n, OFFICE, "body"))
        .unwrap_or_else(|| doc.root_element());

    let slides: Vec<Node> = body.descendants().filter(|n| is(*n, DRAW, "page")).collect();
    if !slides.is_empty() {
        let pages = slide_pages(&slides);
        if !pages.is_empty() {
            return Ok(pages);
        }
    }

    let tables: Vec<Node> = body.descendants().filter(|n| is(*n, TABLE, "table")).collect();
    if !tables.is_empty() && slides.is_empty() {
        let pages = table_pages(&tables);
        if !pages.is_empty() {
            return Ok(pages);
        }
    }

    Ok(flow_pages(body, &styles))
}

fn slide_pages(slides: &[Node<'_, '_>]) -> Vec<PageRecord> {
    let mut pages = Vec::new();
    for (index, slide) in slides.iter().enumerate() {
        let text = clean_text(&collect_text(*slide));
        if !text.is_empty() {
            pages.push(PageRecord::new(index as u32 + 1, text));
        }
    }
    pages
}

fn table_pages(tables: &[Node<'_, '_>]) -> Vec<PageRecord> {
    let mut pages = Vec::new();
    for (index, table) in tables.iter().enumerate() {
        let rows: Vec<String> = table
            .descendants()
            .filter(|n| is(*n, TABLE, "table-row"))
            .filter(|row| owning_table(*row) == Some(*table))
            .filter_map(|row| {
                let cells: Vec<String> = row
                    .children()
                    .filter(|n| is(*n, TABLE, "table-cell"))
                    .map(|cell| collect_text(cell).trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
                (!cells.is_empty()).then(|| cells.join(" | "))
            })
            .collect();
        if !rows.is_empty() {
            pages.push(PageRecord::new(index as u32 + 1, rows.join("\n")));
        }
    }
    pages
}

/// Nearest enclosing table, so nested tables do not repeat their rows.
fn owning_table<'a, 'input>(row: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    row.ancestors().skip(1).find(|n| is(*n, TABLE, "table"))
}

fn is_paragraph(node: Node<'_, '_>) -> bool {
    is(node, TEXT, "p") || is(node, TEXT, "h")
}

fn flow_pages(body: Node<'_, '_>, styles: &StyleBreaks) -> Vec<PageRecord> {
    let mut buffer = PageBuffer::new();
    let mut pages = Vec::new();
    let mut all_paragraphs = Vec::new();

    for node in body.descendants() {
        let nested = node.ancestors().skip(1).any(is_paragraph);

        if is(node, TEXT, "soft-page-break") && !nested {
            pages.extend(buffer.flush());
            continue;
        }
        if !is_paragraph(node) || nested {
            continue;
        }

        let (break_before, break_after) = node
            .attribute((TEXT, "style-name"))
            .map(|name| styles.resolve(name))
            .unwrap_or((false, false));

        if break_before {
            pages.extend(buffer.flush());
        }

        // A soft break inside the paragraph splits it across pages.
        let mut segments = vec![String::new()];
        walk(node, &mut segments);
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                pages.extend(buffer.flush());
            }
            buffer.push(segment);
        }

        let whole = segments.concat();
        let whole = whole.trim();
        if !whole.is_empty() {
            all_paragraphs.push(whole.to_string());
        }

        if break_after {
            pages.extend(buffer.flush());
        }
    }
    pages.extend(buffer.flush());

    let mut pages: Vec<PageRecord> = pages
        .into_iter()
        .filter_map(|p| {
            let text = clean_text(&p.text);
            (!text.is_empty()).then(|| PageRecord::new(p.page_number, text))
        })
        .collect();

    if pages.is_empty() && !all_paragraphs.is_empty() {
        debug!("No page structure found; collapsing {} paragraphs", all_paragraphs.len());
        pages.push(PageRecord::new(1, all_paragraphs.join("\n\n")));
    }
    pages
}

/// All text under `node`, paragraphs separated by newlines.
fn collect_text(node: Node<'_, '_>) -> String {
    let mut segments = vec![String::new()];
    walk(node, &mut segments);
    segments.concat()
}

/// Append the text under `node` to the last segment. A soft page break
/// starts a new segment.
fn walk(node: Node<'_, '_>, segments: &mut Vec<String>) {
    for child in node.children() {
        if child.is_text() {
            if let Some(last) = segments.last_mut() {
                last.push_str(child.text().unwrap_or(""));
            }
            continue;
        }
        if !child.is_element() {
            continue;
        }
        if child.tag_name().namespace() == Some(TEXT) {
            match child.tag_name().name() {
                "soft-page-break" => {
                    segments.push(String::new());
                    continue;
                }
                "line-break" => {
                    push_str(segments, "\n");
                    continue;
                }
                "tab" => {
                    push_str(segments, "\t");
                    continue;
                }
                "s" => {
                    let count = child
                        .attribute((TEXT, "c"))
                        .and_then(|c| c.parse::<usize>().ok())
                        .unwrap_or(1);
                    push_str(segments, &" ".repeat(count));
                    continue;
                }
                "p" | "h" => {
                    walk(child, segments);
                    push_str(segments, "\n");
                    continue;
                }
                _ => {}
            }
        }
        walk(child, segments);
    }
}

fn push_str(segments: &mut [String], s: &str) {
    if let Some(last) = segments.last_mut() {
        last.push_str(s);
    }
}

/// Break-before / break-after flags of every named paragraph style.
#[derive(Debug, Default)]
struct StyleBreaks {
    styles: HashMap<String, StyleEntry>,
}

#[derive(Debug, Default)]
struct StyleEntry {
    before: Option<bool>,
    after: Option<bool>,
    parent: Option<String>,
}

impl StyleBreaks {
    /// Register every `style:style` of a document. Earlier loads win, so the
    /// automatic styles of `content.xml` shadow common styles.
    fn load(&mut self, doc: &Document<'_>) {
        for style in doc.descendants().filter(|n| is(*n, STYLE, "style")) {
            let Some(name) = style.attribute((STYLE, "name")) else {
                continue;
            };
            let props = style
                .children()
                .find(|n| is(*n, STYLE, "paragraph-properties"));
            let entry = StyleEntry {
                before: props.and_then(|p| p.attribute((FO, "break-before"))).map(is_page_break),
                after: props.and_then(|p| p.attribute((FO, "break-after"))).map(is_page_break),
                parent: style
                    .attribute((STYLE, "parent-style-name"))
                    .map(str::to_string),
            };
            self.styles.entry(name.to_string()).or_insert(entry);
        }
    }

    /// Effective (break_before, break_after), following parent styles until
    /// each property is defined.
    fn resolve(&self, name: &str) -> (bool, bool) {
        let mut before = None;
        let mut after = None;
        let mut current = Some(name);
        let mut depth = 0;

        while let Some(style_name) = current {
            if depth >= MAX_STYLE_DEPTH || (before.is_some() && after.is_some()) {
                break;
            }
            let Some(entry) = self.styles.get(style_name) else {
                break;
            };
            before = before.or(entry.before);
            after = after.or(entry.after);
            current = entry.parent.as_deref();
            depth += 1;
        }

        (before.unwrap_or(false), after.unwrap_or(false))
    }
}

fn is_page_break(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "page" | "always")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    const NS: &str = concat!(
        r#"xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" "#,
        r#"xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" "#,
        r#"xmlns:draw="urn:oasis:names:tc:opendocument:xmlns:drawing:1.0" "#,
        r#"xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" "#,
        r#"xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" "#,
        r#"xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0""#
    );

    fn odf(automatic_styles: &str, body: &str, styles: Option<&str>) -> Vec<u8> {
        let content = format!(
            r#"<office:document-content {NS}><office:automatic-styles>{automatic_styles}</office:automatic-styles><office:body>{body}</office:body></office:document-content>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(CONTENT_PART, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
        if let Some(styles) = styles {
            let xml = format!(
                r#"<office:document-styles {NS}><office:styles>{styles}</office:styles></office:document-styles>"#
            );
            writer.start_file(STYLES_PART, SimpleFileOptions::default()).unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_presentation_slides() {
        let body = concat!(
            "<office:presentation>",
            "<draw:page draw:name=\"one\"><draw:frame><draw:text-box><text:p>Welcome</text:p><text:p>to the   deck</text:p></draw:text-box></draw:frame></draw:page>",
            "<draw:page draw:name=\"two\"><draw:frame/></draw:page>",
            "<draw:page draw:name=\"three\"><draw:frame><draw:text-box><text:p>Goodbye</text:p></draw:text-box></draw:frame></draw:page>",
            "</office:presentation>"
        );
        let pages = extract(&odf("", body, None)).unwrap();
        assert_eq!(
            pages,
            vec![
                PageRecord::new(1, "Welcome\nto the deck"),
                PageRecord::new(3, "Goodbye"),
            ]
        );
    }

    #[test]
    fn test_spreadsheet_tables() {
        let body = concat!(
            "<office:spreadsheet>",
            "<table:table table:name=\"Sheet1\">",
            "<table:table-row><table:table-cell><text:p>Name</text:p></table:table-cell><table:table-cell/><table:table-cell><text:p>Score</text:p></table:table-cell></table:table-row>",
            "<table:table-row><table:table-cell/></table:table-row>",
            "<table:table-row><table:table-cell><text:p>Ada</text:p></table:table-cell><table:table-cell><text:p>42</text:p></table:table-cell></table:table-row>",
            "</table:table>",
            "<table:table table:name=\"Empty\"><table:table-row><table:table-cell/></table:table-row></table:table>",
            "</office:spreadsheet>"
        );
        let pages = extract(&odf("", body, None)).unwrap();
        assert_eq!(pages, vec![PageRecord::new(1, "Name | Score\nAda | 42")]);
    }

    #[test]
    fn test_text_breaks_from_styles_and_soft_breaks() {
        let automatic = concat!(
            "<style:style style:name=\"P1\" style:family=\"paragraph\" style:parent-style-name=\"Chapter\"/>",
            "<style:style style:name=\"P2\" style:family=\"paragraph\"><style:paragraph-properties fo:break-after=\"page\"/></style:style>"
        );
        let common = "<style:style style:name=\"Chapter\" style:family=\"paragraph\"><style:paragraph-properties fo:break-before=\"page\"/></style:style>";
        let body = concat!(
            "<office:text>",
            "<text:h>Intro</text:h>",
            "<text:p>Opening words.</text:p>",
            "<text:p text:style-name=\"P1\">Chapter one.</text:p>",
            "<text:p text:style-name=\"P2\">Closing line of one.</text:p>",
            "<text:p>Chapter two starts<text:soft-page-break/>and spills over.</text:p>",
            "<text:soft-page-break/>",
            "<text:p>Last<text:s text:c=\"3\"/>page.</text:p>",
            "</office:text>"
        );
        let pages = extract(&odf(automatic, body, Some(common))).unwrap();
        assert_eq!(
            pages,
            vec![
                PageRecord::new(1, "Intro\n\nOpening words."),
                PageRecord::new(2, "Chapter one.\n\nClosing line of one."),
                PageRecord::new(3, "Chapter two starts"),
                PageRecord::new(4, "and spills over."),
                PageRecord::new(5, "Last page."),
            ]
        );
    }

    #[test]
    fn test_headings_stay_in_document_order() {
        let body = "<office:text><text:p>Before</text:p><text:h>Heading</text:h><text:p>After</text:p></office:text>";
        let pages = extract(&odf("", body, None)).unwrap();
        assert_eq!(pages, vec![PageRecord::new(1, "Before\n\nHeading\n\nAfter")]);
    }

    #[test]
    fn test_missing_content_is_an_error() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("mimetype", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"application/vnd.oasis.opendocument.text").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert!(matches!(extract(&bytes), Err(ExtractError::MissingPart(_))));
    }

    #[test]
    fn test_style_cycle_terminates() {
        let automatic = concat!(
            "<style:style style:name=\"A\" style:parent-style-name=\"B\"/>",
            "<style:style style:name=\"B\" style:parent-style-name=\"A\"/>"
        );
        let body = "<office:text><text:p text:style-name=\"A\">Loop</text:p></office:text>";
        let pages = extract(&odf(automatic, body, None)).unwrap();
        assert_eq!(pages, vec![PageRecord::new(1, "Loop")]);
    }
}
