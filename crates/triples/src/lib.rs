//! Triple data model and file I/O for knowledge-graph embeddings.
//!
//! Provides dense entity/relation ids, immutable name indices, known-fact
//! sets, tab-separated triple and embedding files, and the train/val/test
//! split with leakage cleanup.

pub mod embeddings;
pub mod index;
pub mod reader;
pub mod split;
pub mod types;
pub mod writer;

pub use embeddings::NamedVectors;
pub use index::{EntityIndex, GraphIndex, NameIndex, NameIndexBuilder, RelationIndex};
pub use reader::TripleReader;
pub use split::{DataSplit, PreprocessStats};
pub use types::{
    DenseId, EntityId, FactLabel, Field, HeldOut, KnownFactSet, LabeledTriple, NamedTriple,
    RelationId, Triple,
};
pub use writer::TripleWriter;
