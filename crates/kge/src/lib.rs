//! Knowledge-graph embedding harness.
//!
//! Trains translational embeddings (TransE on burn) from positive triples and
//! single-field corruptions, then evaluates them by filtered candidate
//! ranking and per-relation threshold classification. Lower energy means a
//! more plausible triple throughout.

pub mod error;
pub mod evaluation;
pub mod model;
pub mod training;

pub use error::KgeError;
pub use model::{Distance, EmbeddingModel, KgEmbeddings, TransE, TransEConfig};
