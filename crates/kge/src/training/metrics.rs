/// Fraction of `(positive, negative)` pairs whose positive has the lower energy.
///
/// `energies` alternates `[pos, neg, pos, neg, …]`, as produced for
/// training batches and validation pairs. A trailing unpaired value is
/// ignored. Returns 0.0 when there are no pairs.
pub fn pair_ranking_accuracy(energies: &[f64]) -> f64 {
    let pairs = energies.len() / 2;
    if pairs == 0 {
        return 0.0;
    }
    let correct = energies
        .chunks_exact(2)
        .filter(|pair| pair[0] < pair[1])
        .count();
    correct as f64 / pairs as f64
}

/// Per-batch training metrics with health checks.
#[derive(Debug, Clone, Default)]
pub struct TrainingMetrics {
    pub loss: f64,
    /// Fraction of pairs ranked correctly (positive below negative).
    pub pair_accuracy: f64,
    /// Mean negative energy minus mean positive energy.
    pub energy_gap: f64,
    pub pos_energy_mean: f64,
    pub neg_energy_mean: f64,
}

impl TrainingMetrics {
    /// Compute metrics from paired positive/negative energies.
    pub fn compute(pos_energy: &[f64], neg_energy: &[f64], loss: f64) -> Self {
        let mean = |v: &[f64]| if v.is_empty() { 0.0 } else { v.iter().sum::<f64>() / v.len() as f64 };
        let pos_energy_mean = mean(pos_energy);
        let neg_energy_mean = mean(neg_energy);
        let interleaved: Vec<f64> = pos_energy
            .iter()
            .zip(neg_energy)
            .flat_map(|(&p, &n)| [p, n])
            .collect();
        Self {
            loss,
            pair_accuracy: pair_ranking_accuracy(&interleaved),
            energy_gap: neg_energy_mean - pos_energy_mean,
            pos_energy_mean,
            neg_energy_mean,
        }
    }

    /// Warnings for suspicious training states.
    pub fn health_check(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.loss.is_finite() {
            warnings.push(format!("loss is not finite: {}", self.loss));
        }
        if self.pair_accuracy < 0.5 {
            warnings.push(format!(
                "pair accuracy {:.2} is below chance; negatives look more plausible than positives",
                self.pair_accuracy
            ));
        }
        if self.pos_energy_mean.abs() < 1e-6 && self.neg_energy_mean.abs() < 1e-6 {
            warnings.push("energies collapsed to zero".to_string());
        }
        warnings
    }
}
