//! Mechanical citation formatting

use advisor_core::Citation;

/// Render the numbered source block appended to an answer
///
/// Empty metadata fields are skipped rather than printed blank. Returns an
/// empty string for an empty citation list so nothing is appended.
pub fn format_citation_block(citations: &[Citation]) -> String {
    if citations.is_empty() {
        return String::new();
    }

    let mut block = String::from("Nguồn tham khảo:\n");
    for (idx, citation) in citations.iter().enumerate() {
        block.push_str(&format!("[{}]", idx + 1));

        let fields = [
            ("Tên tài liệu", &citation.title),
            ("Chương", &citation.section),
            ("Trang", &citation.page),
            ("Dạng dữ liệu", &citation.data_type),
            ("Đường dẫn", &citation.link),
        ];
        for (label, value) in fields {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                block.push_str(&format!(" **{}:** {}", label, value));
            }
        }
        block.push('\n');
    }

    block.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::{ChunkMetadata, DocumentChunk};

    fn citation(title: Option<&str>, link: Option<&str>) -> Citation {
        Citation::from_chunk(&DocumentChunk {
            id: "c1".to_string(),
            content: String::new(),
            metadata: ChunkMetadata {
                title: title.map(String::from),
                section: None,
                page: None,
                data_type: None,
                link: link.map(String::from),
            },
        })
    }

    #[test]
    fn test_empty_list_renders_nothing() {
        assert_eq!(format_citation_block(&[]), "");
    }

    #[test]
    fn test_numbered_with_labels() {
        let citations = vec![
            citation(Some("Cẩm nang sau đại học"), Some("https://sdh.uit.edu.vn")),
            citation(Some("Quy chế tuyển sinh"), None),
        ];
        let block = format_citation_block(&citations);

        assert!(block.starts_with("Nguồn tham khảo:"));
        assert!(block.contains("[1] **Tên tài liệu:** Cẩm nang sau đại học"));
        assert!(block.contains("**Đường dẫn:** https://sdh.uit.edu.vn"));
        assert!(block.contains("[2] **Tên tài liệu:** Quy chế tuyển sinh"));
    }

    #[test]
    fn test_empty_fields_skipped() {
        let block = format_citation_block(&[citation(None, Some("https://uit.edu.vn"))]);
        assert!(!block.contains("Tên tài liệu"));
        assert!(!block.contains("Chương"));
        assert!(block.contains("**Đường dẫn:** https://uit.edu.vn"));
    }
}
