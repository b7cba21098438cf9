pub mod annotator;
pub mod cleaning;
pub mod dictionary;
pub mod discovery;
pub mod lemma;
pub mod output;
pub mod reader;
pub mod similarity;

// Re-export main types for convenient access
pub use annotator::{Annotator, LabeledSpan};
pub use cleaning::{clean_text, normalize_for_matching};
pub use dictionary::{load_dictionary, DictionaryIndex, MatcherConfig};
pub use discovery::{collect_chunks, ChunkRef, DiscoveryConfig, Scope};
pub use output::{record_path, write_record, AnnotationRecord, FileStats, RunStats};
pub use similarity::{Similarity, SimilarityBackend};
