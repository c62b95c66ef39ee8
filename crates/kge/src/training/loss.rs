//! Margin ranking loss for translational embedding training.
//!
//! Convention: lower energy = more plausible triple.

use burn::prelude::*;

/// Margin ranking (hinge) loss summed over the batch.
///
/// `sum(max(0, margin + E(pos) - E(neg)))`: zero once every positive is at
/// least `margin` below its paired negative.
///
/// # Arguments
/// - `pos_energy`: shape `(batch,)`, energies of true triples
/// - `neg_energy`: shape `(batch,)`, energies of their corruptions
///
/// # Returns
/// Scalar loss tensor of shape `(1,)`.
pub fn margin_ranking_loss<B: Backend>(
    pos_energy: Tensor<B, 1>,
    neg_energy: Tensor<B, 1>,
    margin: f64,
) -> Tensor<B, 1> {
    (pos_energy - neg_energy).add_scalar(margin).clamp_min(0.0).sum()
}
