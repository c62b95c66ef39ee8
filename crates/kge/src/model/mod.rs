//! Embedding model components: distance functions, host-side embedding
//! tables, Gaussian/seeded initialization, the burn TransE module, and the
//! tensor bridge between them.

pub mod bridge;
pub mod distance;
pub mod embeddings;
pub mod init;
pub mod transe;

pub use distance::Distance;
pub use embeddings::{EmbeddingModel, KgEmbeddings};
pub use transe::{TransE, TransEConfig};
