//! Tensor bridge: conversions between host-side tables/triples and burn tensors.

use burn::prelude::*;
use burn::tensor::TensorData;
use triples::Triple;

/// Column tensors of subject, relation and object ids for a batch of triples.
#[derive(Debug, Clone)]
pub struct TripleTensors<B: Backend> {
    pub subjects: Tensor<B, 1, Int>,
    pub relations: Tensor<B, 1, Int>,
    pub objects: Tensor<B, 1, Int>,
}

impl<B: Backend> TripleTensors<B> {
    /// Split `triples` into three id columns of shape `(batch,)`.
    ///
    /// # Panics
    /// Panics if `triples` is empty.
    pub fn from_triples(triples: &[Triple], device: &B::Device) -> Self {
        assert!(!triples.is_empty(), "triple batch must not be empty");
        let n = triples.len();
        let column = |f: fn(&Triple) -> i64| {
            let ids: Vec<i64> = triples.iter().map(f).collect();
            Tensor::<B, 1, Int>::from_data(TensorData::new(ids, [n]), device)
        };
        Self {
            subjects: column(|t| t.subject.0 as i64),
            relations: column(|t| t.relation.0 as i64),
            objects: column(|t| t.object.0 as i64),
        }
    }

    pub fn len(&self) -> usize {
        self.subjects.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Convert a row-major table into a `(rows, dim)` tensor.
///
/// # Panics
/// Panics if `dim` is zero or does not divide the table length.
pub fn table_to_tensor<B: Backend>(table: &[f32], dim: usize, device: &B::Device) -> Tensor<B, 2> {
    assert!(dim > 0, "embedding dimension must be > 0");
    assert_eq!(table.len() % dim, 0, "table length {} not divisible by {dim}", table.len());
    let rows = table.len() / dim;
    Tensor::from_data(TensorData::new(table.to_vec(), [rows, dim]), device)
}

/// Flatten a 2D tensor back into a row-major table.
pub fn tensor_to_table<B: Backend>(tensor: Tensor<B, 2>) -> anyhow::Result<Vec<f32>> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Failed to read tensor data: {e:?}"))
}

/// Extract f64 values from a burn 1D tensor.
pub fn tensor_to_vec<B: Backend>(tensor: Tensor<B, 1>) -> anyhow::Result<Vec<f64>> {
    let data = tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Failed to read tensor data: {e:?}"))?;
    Ok(data.into_iter().map(|v| v as f64).collect())
}

/// Extract a single f64 scalar from a burn 1D tensor.
///
/// # Panics
/// Panics if the tensor does not contain exactly one element.
pub fn tensor_to_f64<B: Backend>(tensor: Tensor<B, 1>) -> f64 {
    let val: f32 = tensor.into_scalar().elem();
    val as f64
}
