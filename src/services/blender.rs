/// Reference weight of the deterministic score
pub const DEFAULT_FORMULA_WEIGHT: f64 = 0.3;

/// Combines the deterministic and model scores into the final ranking score
///
/// `final = d * w_formula + (e / 100) * w_llm` with `w_llm = 1 - w_formula`.
#[derive(Debug, Clone, Copy)]
pub struct ScoreBlender {
    formula_weight: f64,
}

impl Default for ScoreBlender {
    fn default() -> Self {
        Self::new(DEFAULT_FORMULA_WEIGHT)
    }
}

impl ScoreBlender {
    /// `formula_weight` must lie in [0, 1]; configuration validates this at startup
    pub fn new(formula_weight: f64) -> Self {
        Self { formula_weight }
    }

    pub fn formula_weight(&self) -> f64 {
        self.formula_weight
    }

    pub fn llm_weight(&self) -> f64 {
        1.0 - self.formula_weight
    }

    /// Blends `deterministic` in [0, 1] with `enrichment` in [0, 100]
    pub fn blend(&self, deterministic: f64, enrichment: u8) -> f64 {
        deterministic * self.formula_weight + normalize(enrichment) * self.llm_weight()
    }
}

/// Maps a 0-100 model score onto [0, 1]
pub fn normalize(enrichment: u8) -> f64 {
    f64::from(enrichment) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_bounds() {
        let blender = ScoreBlender::default();
        assert!(blender.blend(0.0, 0).abs() < EPSILON);
        assert!((blender.blend(1.0, 100) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_reference_weights() {
        let blender = ScoreBlender::default();
        let final_score = blender.blend(1.0 / 3.0, 90);
        assert!((final_score - 0.741_111_111).abs() < 1e-6);
    }

    #[test]
    fn test_monotonic_in_each_input() {
        let blender = ScoreBlender::default();

        for e in 0..=100u8 {
            let mut previous = f64::MIN;
            for step in 0..=10 {
                let d = f64::from(step) / 10.0;
                let score = blender.blend(d, e);
                assert!(score >= previous);
                previous = score;
            }
        }

        for step in 0..=10 {
            let d = f64::from(step) / 10.0;
            let mut previous = f64::MIN;
            for e in 0..=100u8 {
                let score = blender.blend(d, e);
                assert!(score >= previous);
                previous = score;
            }
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let blender = ScoreBlender::new(0.45);
        assert!((blender.formula_weight() + blender.llm_weight() - 1.0).abs() < EPSILON);
    }
}
