//! The embedding model seen by evaluation: id → vector plus an energy function.

use std::path::Path;

use triples::{DenseId, EntityId, GraphIndex, HeldOut, NameIndexBuilder, NamedVectors, RelationId, Triple};

use crate::error::KgeError;
use crate::model::distance::Distance;

/// Read-only view of trained entity and relation embeddings.
///
/// Implementations must be safe to share across evaluation threads.
pub trait EmbeddingModel: Sync {
    /// Embedding dimension.
    fn dim(&self) -> usize;
    fn num_entities(&self) -> usize;
    fn num_relations(&self) -> usize;
    fn entity(&self, id: EntityId) -> &[f32];
    fn relation(&self, id: RelationId) -> &[f32];

    /// Energy of `triple`. Lower = more plausible.
    fn energy(&self, triple: &Triple) -> f32;

    /// Energy of every entity substituted at the held-out side, indexed by entity id.
    ///
    /// Entry `i` equals `energy` of the triple with entity `i` substituted.
    fn candidate_energies(&self, triple: &Triple, held_out: HeldOut) -> Vec<f32>;
}

/// Dense in-memory embedding tables with a translational energy `d(s + r, o)`.
#[derive(Debug, Clone)]
pub struct KgEmbeddings {
    dim: usize,
    entities: Vec<f32>,
    relations: Vec<f32>,
    distance: Distance,
}

impl KgEmbeddings {
    /// Build from row-major tables of `dim` columns each.
    pub fn new(
        dim: usize,
        entities: Vec<f32>,
        relations: Vec<f32>,
        distance: Distance,
    ) -> Result<Self, KgeError> {
        if dim == 0 {
            return Err(KgeError::InvalidConfig("embedding dimension must be > 0".to_string()));
        }
        for (what, table) in [("entity", &entities), ("relation", &relations)] {
            if table.len() % dim != 0 {
                return Err(KgeError::InvalidConfig(format!(
                    "{what} table length {} is not a multiple of dim {dim}",
                    table.len()
                )));
            }
        }
        Ok(Self { dim, entities, relations, distance })
    }

    /// Load entity and relation embedding files.
    ///
    /// The returned index follows file order, so only names with a vector get
    /// an id. Both files must share one dimension.
    pub fn from_files(
        entity_path: &Path,
        relation_path: &Path,
        distance: Distance,
    ) -> anyhow::Result<(Self, GraphIndex)> {
        let entities = NamedVectors::read(entity_path)?;
        let relations = NamedVectors::read(relation_path)?;
        Ok(Self::from_named(&entities, &relations, distance)?)
    }

    /// Build tables and index from named vectors.
    pub fn from_named(
        entities: &NamedVectors,
        relations: &NamedVectors,
        distance: Distance,
    ) -> Result<(Self, GraphIndex), KgeError> {
        let dim = entities
            .dim()
            .ok_or_else(|| KgeError::InvalidConfig("entity embeddings are empty".to_string()))?;
        if let Some(found) = relations.dim() {
            if found != dim {
                return Err(KgeError::DimensionMismatch { expected: dim, found });
            }
        }

        let mut entity_index = NameIndexBuilder::<EntityId>::new();
        let mut entity_table = Vec::with_capacity(entities.len() * dim);
        for (name, v) in entities.iter() {
            entity_index.intern(name);
            entity_table.extend_from_slice(v);
        }
        let mut relation_index = NameIndexBuilder::<RelationId>::new();
        let mut relation_table = Vec::with_capacity(relations.len() * dim);
        for (name, v) in relations.iter() {
            relation_index.intern(name);
            relation_table.extend_from_slice(v);
        }

        let index = GraphIndex {
            entities: entity_index.build(),
            relations: relation_index.build(),
        };
        Ok((Self::new(dim, entity_table, relation_table, distance)?, index))
    }

    /// Write entity and relation tables as TSV files named by `index`.
    pub fn write_files(
        &self,
        index: &GraphIndex,
        entity_path: &Path,
        relation_path: &Path,
    ) -> anyhow::Result<()> {
        if index.entities.len() != self.num_entities() || index.relations.len() != self.num_relations() {
            anyhow::bail!(
                "index has {} entities / {} relations, tables have {} / {}",
                index.entities.len(),
                index.relations.len(),
                self.num_entities(),
                self.num_relations()
            );
        }
        NamedVectors::write(
            entity_path,
            index.entities.iter().map(|(id, name)| (name, self.entity(id))),
        )?;
        NamedVectors::write(
            relation_path,
            index.relations.iter().map(|(id, name)| (name, self.relation(id))),
        )?;
        Ok(())
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    /// Same tables scored with another distance.
    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    pub fn entity_table(&self) -> &[f32] {
        &self.entities
    }

    pub fn relation_table(&self) -> &[f32] {
        &self.relations
    }
}

impl EmbeddingModel for KgEmbeddings {
    fn dim(&self) -> usize {
        self.dim
    }

    fn num_entities(&self) -> usize {
        self.entities.len() / self.dim
    }

    fn num_relations(&self) -> usize {
        self.relations.len() / self.dim
    }

    fn entity(&self, id: EntityId) -> &[f32] {
        let start = id.index() * self.dim;
        &self.entities[start..start + self.dim]
    }

    fn relation(&self, id: RelationId) -> &[f32] {
        let start = id.index() * self.dim;
        &self.relations[start..start + self.dim]
    }

    fn energy(&self, triple: &Triple) -> f32 {
        self.distance.translated(
            self.entity(triple.subject),
            self.relation(triple.relation),
            self.entity(triple.object),
        )
    }

    /// One pass over the entity table. The fixed side is looked up once.
    fn candidate_energies(&self, triple: &Triple, held_out: HeldOut) -> Vec<f32> {
        let relation = self.relation(triple.relation);
        let candidates = self.entities.chunks_exact(self.dim);
        match held_out {
            HeldOut::Subject => {
                let object = self.entity(triple.object);
                candidates
                    .map(|c| self.distance.translated(c, relation, object))
                    .collect()
            }
            HeldOut::Object => {
                let lhs: Vec<f32> = self
                    .entity(triple.subject)
                    .iter()
                    .zip(relation)
                    .map(|(s, r)| s + r)
                    .collect();
                candidates.map(|c| self.distance.between(&lhs, c)).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn toy() -> KgEmbeddings {
        KgEmbeddings::new(
            2,
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            vec![0.0, 0.0],
            Distance::SqEuclidean,
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_and_energy() {
        let emb = toy();
        assert_eq!(emb.num_entities(), 3);
        assert_eq!(emb.num_relations(), 1);
        assert_eq!(emb.entity(EntityId(2)), &[0.0, 1.0]);
        assert!((emb.energy(&Triple::new(0, 0, 1)) - 1.0).abs() < 1e-6);
        assert!(emb.energy(&Triple::new(1, 0, 1)).abs() < 1e-6);
    }

    #[test]
    fn test_candidate_energies_object_side() {
        let emb = toy();
        let energies = emb.candidate_energies(&Triple::new(0, 0, 1), HeldOut::Object);
        assert_eq!(energies.len(), 3);
        assert!(energies[0].abs() < 1e-6);
        assert!((energies[1] - 1.0).abs() < 1e-6);
        assert!((energies[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_candidate_energies_match_per_triple_energy() {
        let entities: Vec<f32> = (0..15).map(|i| ((i * 7) % 11) as f32 / 5.0 - 1.0).collect();
        let relations = vec![0.5, -0.25, 1.0, -1.0, 0.0, 0.75];
        for distance in [Distance::Euclidean, Distance::SqEuclidean, Distance::Manhattan, Distance::Angular] {
            let emb = KgEmbeddings::new(3, entities.clone(), relations.clone(), distance).unwrap();
            let triple = Triple::new(1, 1, 3);
            for held_out in [HeldOut::Subject, HeldOut::Object] {
                let energies = emb.candidate_energies(&triple, held_out);
                assert_eq!(energies.len(), 5);
                for (i, &e) in energies.iter().enumerate() {
                    let expected = emb.energy(&held_out.substitute(&triple, EntityId::from_index(i)));
                    assert!(
                        (e - expected).abs() < 1e-6,
                        "{distance} {held_out} candidate {i}: {e} vs {expected}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_rejects_ragged_tables() {
        assert!(KgEmbeddings::new(2, vec![0.0; 3], vec![0.0; 2], Distance::Euclidean).is_err());
        assert!(KgEmbeddings::new(0, vec![], vec![], Distance::Euclidean).is_err());
    }

    #[test]
    fn test_named_dimension_mismatch() {
        let mut entities = NamedVectors::default();
        entities.insert("a".to_string(), vec![1.0, 2.0]);
        let mut relations = NamedVectors::default();
        relations.insert("r".to_string(), vec![1.0, 2.0, 3.0]);
        let err = KgEmbeddings::from_named(&entities, &relations, Distance::Euclidean).unwrap_err();
        assert!(matches!(err, KgeError::DimensionMismatch { expected: 2, found: 3 }));
    }

    #[test]
    fn test_files_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let emb = toy();
        let named = vec![
            triples::NamedTriple::new("a", "r", "b"),
            triples::NamedTriple::new("a", "r", "c"),
        ];
        let index = GraphIndex::from_named(&named);
        let ent_path = tmp.path().join("entities.tsv");
        let rel_path = tmp.path().join("relations.tsv");
        emb.write_files(&index, &ent_path, &rel_path).unwrap();

        let (loaded, loaded_index) =
            KgEmbeddings::from_files(&ent_path, &rel_path, Distance::SqEuclidean).unwrap();
        assert_eq!(loaded.entity_table(), emb.entity_table());
        assert_eq!(loaded.relation_table(), emb.relation_table());
        assert_eq!(loaded_index.entities.id("c"), Some(EntityId(2)));
    }
}
