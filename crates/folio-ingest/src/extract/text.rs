//! Plain text: the whole file is page 1.

use crate::page::PageRecord;

pub(crate) fn extract(bytes: &[u8]) -> Vec<PageRecord> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        Vec::new()
    } else {
        vec![PageRecord::new(1, text)]
    }
}
