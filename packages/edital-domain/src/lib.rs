pub mod lexicon;
pub mod text;
pub mod time_serde;

mod chunk;

pub use chunk::{
	Chunk, DocumentManifest, DocumentMeta, ProcessingState, SectionType, SourceText, chunk_id_for,
};
