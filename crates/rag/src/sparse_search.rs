//! Sparse keyword search using Tantivy (BM25)
//!
//! Vietnamese has no stemmer in Tantivy; the SimpleTokenizer handles the
//! fully-marked Unicode text well enough for keyword recall, which is all
//! the sparse leg needs to contribute to the hybrid merge.

use std::path::Path;

use advisor_core::{ChunkMetadata, DocumentChunk, ScoredChunk};
use parking_lot::RwLock;
use tantivy::{
    collector::TopDocs,
    query::QueryParser,
    schema::{Field, OwnedValue, Schema, TextFieldIndexing, TextOptions, STORED, STRING},
    tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer},
    Index, IndexReader, IndexWriter, TantivyDocument,
};

use crate::retriever::SparseSearch;
use crate::RagError;

/// Sparse search configuration
#[derive(Debug, Clone, Default)]
pub struct SparseConfig {
    /// Index path (in RAM if None)
    pub index_path: Option<String>,
}

/// Tantivy index over the knowledge-base chunks
pub struct SparseIndex {
    index: Index,
    reader: IndexReader,
    writer: RwLock<Option<IndexWriter>>,
    id_field: Field,
    content_field: Field,
    title_field: Field,
    section_field: Field,
    page_field: Field,
    data_type_field: Field,
    link_field: Field,
}

impl SparseIndex {
    pub fn new(config: SparseConfig) -> Result<Self, RagError> {
        let mut schema_builder = Schema::builder();

        let text_options = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer("multilingual")
                    .set_index_option(tantivy::schema::IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();

        let id_field = schema_builder.add_text_field("id", STRING | STORED);
        let content_field = schema_builder.add_text_field("content", text_options.clone());
        let title_field = schema_builder.add_text_field("title", text_options);
        let section_field = schema_builder.add_text_field("section", STRING | STORED);
        let page_field = schema_builder.add_text_field("page", STRING | STORED);
        let data_type_field = schema_builder.add_text_field("data_type", STRING | STORED);
        let link_field = schema_builder.add_text_field("link", STRING | STORED);

        let schema = schema_builder.build();

        let index = if let Some(ref path) = config.index_path {
            let dir = tantivy::directory::MmapDirectory::open(Path::new(path))
                .map_err(|e| RagError::Index(e.to_string()))?;
            Index::open_or_create(dir, schema.clone())
                .map_err(|e| RagError::Index(e.to_string()))?
        } else {
            Index::create_in_ram(schema.clone())
        };

        // SimpleTokenizer handles Unicode (including Vietnamese marks) properly
        let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(100))
            .filter(LowerCaser)
            .build();
        index.tokenizers().register("multilingual", tokenizer);

        let reader = index.reader().map_err(|e| RagError::Index(e.to_string()))?;
        let writer = index
            .writer(50_000_000)
            .map_err(|e| RagError::Index(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            writer: RwLock::new(Some(writer)),
            id_field,
            content_field,
            title_field,
            section_field,
            page_field,
            data_type_field,
            link_field,
        })
    }

    /// Index chunks (used by startup loading, not the request path)
    pub fn index_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), RagError> {
        let mut writer = self.writer.write();
        let writer = writer
            .as_mut()
            .ok_or_else(|| RagError::Index("writer not available".to_string()))?;

        for chunk in chunks {
            let mut doc = TantivyDocument::default();
            doc.add_text(self.id_field, &chunk.id);
            doc.add_text(self.content_field, &chunk.content);

            if let Some(ref title) = chunk.metadata.title {
                doc.add_text(self.title_field, title);
            }
            if let Some(ref section) = chunk.metadata.section {
                doc.add_text(self.section_field, section);
            }
            if let Some(ref page) = chunk.metadata.page {
                doc.add_text(self.page_field, page);
            }
            if let Some(ref data_type) = chunk.metadata.data_type {
                doc.add_text(self.data_type_field, data_type);
            }
            if let Some(ref link) = chunk.metadata.link {
                doc.add_text(self.link_field, link);
            }

            writer
                .add_document(doc)
                .map_err(|e| RagError::Index(e.to_string()))?;
        }

        writer.commit().map_err(|e| RagError::Index(e.to_string()))?;
        self.reader
            .reload()
            .map_err(|e| RagError::Index(e.to_string()))?;

        Ok(())
    }

    pub fn doc_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    fn field_str(&self, doc: &TantivyDocument, field: Field) -> Option<String> {
        doc.get_first(field).and_then(|v| match v {
            OwnedValue::Str(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        })
    }
}

impl SparseSearch for SparseIndex {
    fn sparse_search(&self, text: &str, k: usize) -> Result<Vec<ScoredChunk>, RagError> {
        let searcher = self.reader.searcher();
        let query_parser =
            QueryParser::for_index(&self.index, vec![self.content_field, self.title_field]);

        // parse_query_lenient tolerates user punctuation (question marks,
        // quotes) that the strict parser rejects
        let (query, _errors) = query_parser.parse_query_lenient(text);

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(k))
            .map_err(|e| RagError::Search(e.to_string()))?;

        let mut results = Vec::with_capacity(top_docs.len());

        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .map_err(|e| RagError::Search(e.to_string()))?;

            let id = self.field_str(&doc, self.id_field).unwrap_or_default();
            let content = self.field_str(&doc, self.content_field).unwrap_or_default();

            results.push(ScoredChunk {
                chunk: DocumentChunk {
                    id,
                    content,
                    metadata: ChunkMetadata {
                        title: self.field_str(&doc, self.title_field),
                        section: self.field_str(&doc, self.section_field),
                        page: self.field_str(&doc, self.page_field),
                        data_type: self.field_str(&doc, self.data_type_field),
                        link: self.field_str(&doc, self.link_field),
                    },
                },
                score,
            });
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, content: &str, title: &str) -> DocumentChunk {
        DocumentChunk {
            id: id.to_string(),
            content: content.to_string(),
            metadata: ChunkMetadata {
                title: Some(title.to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_index_and_search() {
        let index = SparseIndex::new(SparseConfig::default()).unwrap();
        index
            .index_chunks(&[
                chunk(
                    "c1",
                    "Học phí chương trình thạc sĩ là 15 triệu đồng mỗi học kỳ",
                    "Cẩm nang sau đại học",
                ),
                chunk(
                    "c2",
                    "Điểm chuẩn ngành Trí tuệ nhân tạo năm 2024 là 28.3",
                    "Điểm chuẩn 2024",
                ),
            ])
            .unwrap();
        assert_eq!(index.doc_count(), 2);

        let results = index.sparse_search("học phí thạc sĩ", 5).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].chunk.id, "c1");
    }

    #[test]
    fn test_punctuation_tolerated() {
        let index = SparseIndex::new(SparseConfig::default()).unwrap();
        index
            .index_chunks(&[chunk("c1", "Học phí thạc sĩ", "Cẩm nang")])
            .unwrap();
        let results = index
            .sparse_search("học phí học thạc sĩ UIT là bao nhiêu?", 5)
            .unwrap();
        assert!(!results.is_empty());
    }

    #[test]
    fn test_metadata_round_trip() {
        let index = SparseIndex::new(SparseConfig::default()).unwrap();
        let mut c = chunk("c1", "Nội dung", "Tài liệu");
        c.metadata.link = Some("https://tuyensinh.uit.edu.vn".to_string());
        c.metadata.page = Some("12".to_string());
        index.index_chunks(&[c]).unwrap();

        let results = index.sparse_search("nội dung", 1).unwrap();
        let meta = &results[0].chunk.metadata;
        assert_eq!(meta.link.as_deref(), Some("https://tuyensinh.uit.edu.vn"));
        assert_eq!(meta.page.as_deref(), Some("12"));
    }
}
