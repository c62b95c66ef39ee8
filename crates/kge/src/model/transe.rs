use burn::module::Param;
use burn::prelude::*;
use burn::tensor::Distribution as TensorDistribution;

use crate::error::KgeError;
use crate::model::bridge::{table_to_tensor, tensor_to_table, TripleTensors};
use crate::model::distance::Distance;
use crate::model::embeddings::{EmbeddingModel, KgEmbeddings};

/// Configuration for a TransE embedding model.
///
/// ```text
/// subjects, relations, objects: (batch,) ids
///   → E[s] + R[r]  vs  E[o]
///   → Distance::energy_tensor
///   → energy: (batch,)
/// ```
#[derive(Config, Debug)]
pub struct TransEConfig {
    /// Number of rows in the entity table.
    pub num_entities: usize,
    /// Number of rows in the relation table.
    pub num_relations: usize,
    /// Embedding dimension shared by entities and relations.
    #[config(default = 100)]
    pub dim: usize,
}

/// Translational embedding model: a triple is plausible when `E[s] + R[r] ≈ E[o]`.
///
/// Lower energy = more plausible (by convention).
#[derive(Module, Debug)]
pub struct TransE<B: Backend> {
    /// Entity table, shape (num_entities, dim).
    entities: Param<Tensor<B, 2>>,
    /// Relation table, shape (num_relations, dim).
    relations: Param<Tensor<B, 2>>,
}

impl TransEConfig {
    /// Initialize both tables from N(0, 1/sqrt(dim)).
    pub fn init<B: Backend>(&self, device: &B::Device) -> TransE<B> {
        let std_dev = 1.0 / (self.dim as f64).sqrt();
        TransE {
            entities: Param::from_tensor(Tensor::random(
                [self.num_entities, self.dim],
                TensorDistribution::Normal(0.0, std_dev),
                device,
            )),
            relations: Param::from_tensor(Tensor::random(
                [self.num_relations, self.dim],
                TensorDistribution::Normal(0.0, std_dev),
                device,
            )),
        }
    }
}

impl<B: Backend> TransE<B> {
    /// Build a model whose parameters start at the given host-side tables.
    pub fn from_embeddings(embeddings: &KgEmbeddings, device: &B::Device) -> Self {
        let dim = embeddings.dim();
        Self {
            entities: Param::from_tensor(table_to_tensor(embeddings.entity_table(), dim, device)),
            relations: Param::from_tensor(table_to_tensor(embeddings.relation_table(), dim, device)),
        }
    }

    pub fn dim(&self) -> usize {
        self.entities.dims()[1]
    }

    pub fn num_entities(&self) -> usize {
        self.entities.dims()[0]
    }

    pub fn num_relations(&self) -> usize {
        self.relations.dims()[0]
    }

    /// Energy of each triple in the batch.
    ///
    /// Output shape: `(batch,)`
    pub fn forward(&self, batch: TripleTensors<B>, distance: Distance) -> Result<Tensor<B, 1>, KgeError> {
        let entities = self.entities.val();
        let s = entities.clone().select(0, batch.subjects);
        let o = entities.select(0, batch.objects);
        let r = self.relations.val().select(0, batch.relations);
        distance.energy_tensor(s + r, o)
    }

    /// Rescale entity rows whose L2 norm exceeds `max_norm` back onto the ball.
    ///
    /// Parameter ids are preserved so optimizer state stays attached.
    pub fn project_entities(mut self, max_norm: f64) -> Self {
        let id = self.entities.id;
        let table = self.entities.val().detach();
        let norms = table.clone().powf_scalar(2.0).sum_dim(1).sqrt(); // (rows, 1)
        let scale = norms.clamp_min(max_norm).div_scalar(max_norm).recip();
        let projected = table * scale;
        self.entities = Param::initialized(id, projected.require_grad());
        self
    }

    /// Copy the current tables to the host as a [`KgEmbeddings`].
    pub fn snapshot(&self, distance: Distance) -> anyhow::Result<KgEmbeddings> {
        let dim = self.dim();
        let entities = tensor_to_table(self.entities.val())?;
        let relations = tensor_to_table(self.relations.val())?;
        Ok(KgEmbeddings::new(dim, entities, relations, distance)?)
    }
}
