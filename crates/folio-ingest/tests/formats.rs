//! Format dispatch and degradation through the public extraction API.

mod common;

use std::io::Cursor;

use common::{docx, pdf, pptx, zip_parts};
use folio_ingest::{extract, extract_bytes, PageRecord};

#[test]
fn test_each_format_through_a_stream() {
    let cases: Vec<(&str, Vec<u8>, usize)> = vec![
        ("a.docx", docx(&[&["One."], &["Two."]]), 2),
        ("b.pptx", pptx(&["S1", "S2", "S3"]), 3),
        ("c.txt", b"just text".to_vec(), 1),
        ("d.pdf", pdf(&["P1", "P2", "P3"]), 3),
    ];
    for (name, bytes, expected) in cases {
        let mut stream = Cursor::new(bytes);
        let pages = extract(&mut stream, name).unwrap();
        assert_eq!(pages.len(), expected, "{}", name);
    }
}

#[test]
fn test_odt_soft_page_breaks() {
    let content = concat!(
        r#"<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" "#,
        r#"xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0">"#,
        r#"<office:body><office:text>"#,
        r#"<text:p>Page one.</text:p><text:soft-page-break/>"#,
        r#"<text:h>Page two heading</text:h><text:p>Page two body.</text:p>"#,
        r#"</office:text></office:body></office:document-content>"#
    );
    let bytes = zip_parts(&[("content.xml", content.to_string())]);
    let pages = extract_bytes(&bytes, "notes.odt");
    assert_eq!(
        pages,
        vec![
            PageRecord::new(1, "Page one."),
            PageRecord::new(2, "Page two heading\n\nPage two body."),
        ]
    );
}

#[test]
fn test_malformed_docx_falls_back_to_flat_text() {
    let broken = "<w:document><w:body><w:p><w:r><w:t>Recovered &amp; kept</w:t></w:r></w:p><w:p>";
    let bytes = zip_parts(&[("word/document.xml", broken.to_string())]);
    let pages = extract_bytes(&bytes, "broken.docx");
    assert_eq!(pages, vec![PageRecord::new(1, "Recovered & kept")]);
}

#[test]
fn test_unknown_extension_is_tried_as_pdf() {
    let bytes = pdf(&["Opening words", "Closing words"]);
    for name in ["mystery.bin", "no_extension"] {
        let pages = extract_bytes(&bytes, name);
        assert_eq!(pages.len(), 2, "{}", name);
        assert_eq!(pages[0].page_number, 1);
        assert!(pages[0].text.contains("Opening words"));
        assert_eq!(pages[1].page_number, 2);
        assert!(pages[1].text.contains("Closing words"));
    }
    assert!(extract_bytes(b"plain words", "mystery.bin").is_empty());
}
