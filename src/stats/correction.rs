use serde::{Deserialize, Serialize};

/// Multiple-comparison correction applied across a family of p-values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionMethod {
    Bonferroni,
    Holm,
    /// Benjamini–Hochberg false discovery rate
    FdrBh,
}

impl Default for CorrectionMethod {
    fn default() -> Self {
        CorrectionMethod::Holm
    }
}

impl CorrectionMethod {
    /// Adjusted p-values in the input order
    ///
    /// NaN p-values stay NaN and do not count towards the family size.
    pub fn adjust(&self, p_values: &[f64]) -> Vec<f64> {
        let mut adjusted = vec![f64::NAN; p_values.len()];
        let mut order: Vec<usize> = (0..p_values.len())
            .filter(|&i| !p_values[i].is_nan())
            .collect();
        order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));
        let m = order.len() as f64;

        match self {
            CorrectionMethod::Bonferroni => {
                for &i in &order {
                    adjusted[i] = (p_values[i] * m).min(1.0);
                }
            }
            CorrectionMethod::Holm => {
                let mut running_max: f64 = 0.0;
                for (rank, &i) in order.iter().enumerate() {
                    let value = ((m - rank as f64) * p_values[i]).min(1.0);
                    running_max = running_max.max(value);
                    adjusted[i] = running_max;
                }
            }
            CorrectionMethod::FdrBh => {
                let mut running_min: f64 = 1.0;
                for (rank, &i) in order.iter().enumerate().rev() {
                    let value = (p_values[i] * m / (rank + 1) as f64).min(1.0);
                    running_min = running_min.min(value);
                    adjusted[i] = running_min;
                }
            }
        }
        adjusted
    }

    /// Which hypotheses are rejected at `alpha` after adjustment
    pub fn reject(&self, p_values: &[f64], alpha: f64) -> Vec<bool> {
        self.adjust(p_values)
            .into_iter()
            .map(|p| p.is_finite() && p < alpha)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const P: [f64; 4] = [0.01, 0.04, 0.03, 0.20];

    #[test]
    fn test_bonferroni() {
        let adj = CorrectionMethod::Bonferroni.adjust(&P);
        assert_relative_eq!(adj[0], 0.04);
        assert_relative_eq!(adj[1], 0.16);
        assert_eq!(adj[3], 0.8);
    }

    #[test]
    fn test_holm() {
        // sorted: 0.01×4, 0.03×3, 0.04×2, 0.20×1 → 0.04, 0.09, 0.09 (max), 0.20
        let adj = CorrectionMethod::Holm.adjust(&P);
        assert_relative_eq!(adj[0], 0.04, epsilon = 1e-12);
        assert_relative_eq!(adj[2], 0.09, epsilon = 1e-12);
        assert_relative_eq!(adj[1], 0.09, epsilon = 1e-12);
        assert_relative_eq!(adj[3], 0.20, epsilon = 1e-12);
    }

    #[test]
    fn test_fdr_bh() {
        // sorted: 0.01×4/1, 0.03×4/2, 0.04×4/3, 0.20×4/4 → 0.04, 0.053, 0.053, 0.2
        let adj = CorrectionMethod::FdrBh.adjust(&P);
        assert_relative_eq!(adj[0], 0.04, epsilon = 1e-12);
        assert_relative_eq!(adj[2], 0.16 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(adj[1], 0.16 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(adj[3], 0.20, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_passthrough() {
        let adj = CorrectionMethod::Bonferroni.adjust(&[0.01, f64::NAN]);
        assert_relative_eq!(adj[0], 0.01);
        assert!(adj[1].is_nan());
    }

    #[test]
    fn test_reject() {
        let rejected = CorrectionMethod::Holm.reject(&P, 0.05);
        assert_eq!(rejected, vec![true, false, false, false]);
    }
}
