//! The `Section` entity: one retrievable window of page text.

use serde::{Deserialize, Serialize};

/// A bounded window of page text, the atomic unit the retriever indexes.
///
/// The `id` has the form `doc_id:page_number:chunk_index` and is unique within
/// a job. Both `page_number` and `chunk_index` are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub doc_id: String,
    pub page_number: u32,
    pub chunk_index: u32,
    pub title: String,
    pub text: String,
}

impl Section {
    /// Build a section, deriving its id and display title from the position.
    pub fn new(doc_id: &str, page_number: u32, chunk_index: u32, text: String) -> Self {
        Self {
            id: section_id(doc_id, page_number, chunk_index),
            doc_id: doc_id.to_string(),
            page_number,
            chunk_index,
            title: format!("Page {page_number}, chunk {chunk_index}"),
            text,
        }
    }

    /// Sort key used to check per-document ordering.
    pub fn position(&self) -> (u32, u32) {
        (self.page_number, self.chunk_index)
    }
}

/// Format a section id.
pub fn section_id(doc_id: &str, page_number: u32, chunk_index: u32) -> String {
    format!("{doc_id}:{page_number}:{chunk_index}")
}

/// Split a section id into `(doc_id, page_number, chunk_index)`.
///
/// The doc id may itself contain `:`; only the last two fields are numeric.
pub fn parse_section_id(id: &str) -> Option<(&str, u32, u32)> {
    let mut parts = id.rsplitn(3, ':');
    let chunk_index = parts.next()?.parse().ok()?;
    let page_number = parts.next()?.parse().ok()?;
    let doc_id = parts.next()?;
    if doc_id.is_empty() || page_number == 0 || chunk_index == 0 {
        return None;
    }
    Some((doc_id, page_number, chunk_index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_id_and_title() {
        let section = Section::new("job_report.txt", 4, 2, "body".to_string());
        assert_eq!(section.id, "job_report.txt:4:2");
        assert_eq!(section.title, "Page 4, chunk 2");
        assert_eq!(section.position(), (4, 2));
    }

    #[test]
    fn test_parse_section_id() {
        assert_eq!(
            parse_section_id("abc_notes.txt:12:3"),
            Some(("abc_notes.txt", 12, 3))
        );
        assert_eq!(parse_section_id("a:b:1:2"), Some(("a:b", 1, 2)));
        assert_eq!(parse_section_id("doc:0:1"), None);
        assert_eq!(parse_section_id("doc:1"), None);
        assert_eq!(parse_section_id(":1:1"), None);
        assert_eq!(parse_section_id("doc:x:1"), None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let section = Section::new("d", 1, 1, "text".to_string());
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["docId"], "d");
        assert_eq!(json["pageNumber"], 1);
        assert_eq!(json["chunkIndex"], 1);
    }
}
