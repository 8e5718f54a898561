//! Z-score normalization of feature vectors

use serde::{Deserialize, Serialize};

use super::vector::{FeatureVector, FEATURE_DIM};
use crate::{Result, TennisError};

/// Divisor used in place of a zero or non-finite scale
const FALLBACK_SCALE: f32 = 1.0;

/// Per-position mean and scale, computed once from the reference dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub mean: [f32; FEATURE_DIM],
    pub scale: [f32; FEATURE_DIM],
}

impl Default for NormalizationParams {
    fn default() -> Self {
        NormalizationParams {
            mean: [0.0; FEATURE_DIM],
            scale: [1.0; FEATURE_DIM],
        }
    }
}

impl NormalizationParams {
    /// Column means and sample standard deviations (n - 1 denominator)
    ///
    /// A column seen in fewer than two rows gets a scale of 0.0, which
    /// [`Normalizer::new`] treats as degenerate.
    pub fn from_rows(rows: &[[f32; FEATURE_DIM]]) -> Result<Self> {
        if rows.is_empty() {
            return Err(TennisError::Parse(
                "Reference feature dataset is empty".to_string(),
            ));
        }

        let n = rows.len() as f64;
        let mut sum = [0.0f64; FEATURE_DIM];
        for row in rows {
            for (acc, value) in sum.iter_mut().zip(row) {
                *acc += *value as f64;
            }
        }
        let mean64 = sum.map(|s| s / n);

        let mut sq_dev = [0.0f64; FEATURE_DIM];
        for row in rows {
            for j in 0..FEATURE_DIM {
                sq_dev[j] += (row[j] as f64 - mean64[j]).powi(2);
            }
        }
        let scale = if rows.len() < 2 {
            [0.0; FEATURE_DIM]
        } else {
            sq_dev.map(|s| (s / (n - 1.0)).sqrt() as f32)
        };

        Ok(NormalizationParams {
            mean: mean64.map(|m| m as f32),
            scale,
        })
    }

    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            TennisError::Parse(format!("Invalid normalization params {}: {}", path, e))
        })
    }

    pub fn save(&self, path: &str) -> Result<()> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| TennisError::Parse(format!("Failed to serialize params: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Applies `(x - mean) / scale` position by position
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    params: NormalizationParams,
}

impl Normalizer {
    /// Wrap parameters, replacing degenerate scales with 1.0
    pub fn new(mut params: NormalizationParams) -> Self {
        for (idx, scale) in params.scale.iter_mut().enumerate() {
            if *scale == 0.0 || !scale.is_finite() {
                log::warn!(
                    "Feature {} has degenerate scale {}; using {}",
                    idx,
                    scale,
                    FALLBACK_SCALE
                );
                *scale = FALLBACK_SCALE;
            }
        }
        Normalizer { params }
    }

    pub fn params(&self) -> &NormalizationParams {
        &self.params
    }

    pub fn transform(&self, features: &FeatureVector) -> [f32; FEATURE_DIM] {
        self.transform_array(&features.to_array())
    }

    pub fn transform_array(&self, values: &[f32; FEATURE_DIM]) -> [f32; FEATURE_DIM] {
        let mut out = [0.0; FEATURE_DIM];
        for i in 0..FEATURE_DIM {
            out[i] = (values[i] - self.params.mean[i]) / self.params.scale[i];
        }
        out
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new(NormalizationParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(base: f32, surface: usize) -> [f32; FEATURE_DIM] {
        let mut r = [base, base + 100.0, base, base - 50.0, -100.0, 50.0, 0.0, 0.0, 0.0, 0.0];
        r[6 + surface] = 1.0;
        r
    }

    #[test]
    fn test_from_rows_mean_and_sample_std() {
        let rows = vec![row(1400.0, 0), row(1600.0, 1)];
        let params = NormalizationParams::from_rows(&rows).unwrap();

        assert!((params.mean[0] - 1500.0).abs() < 1e-3);
        // sample std of {1400, 1600} = 141.42
        assert!((params.scale[0] - 141.421_36).abs() < 1e-2);
        // constant columns have zero spread
        assert_eq!(params.scale[4], 0.0);
        assert_eq!(params.scale[8], 0.0);
        assert!((params.mean[6] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty_rows_rejected() {
        assert!(matches!(
            NormalizationParams::from_rows(&[]),
            Err(TennisError::Parse(_))
        ));
    }

    #[test]
    fn test_single_row_is_degenerate() {
        let params = NormalizationParams::from_rows(&[row(1500.0, 2)]).unwrap();
        assert!(params.scale.iter().all(|s| *s == 0.0));
        let normalizer = Normalizer::new(params);
        assert!(normalizer.params().scale.iter().all(|s| *s == 1.0));
    }

    #[test]
    fn test_degenerate_scale_replaced() {
        let mut params = NormalizationParams::default();
        params.scale[3] = 0.0;
        params.scale[5] = f32::NAN;
        let normalizer = Normalizer::new(params);
        assert_eq!(normalizer.params().scale[3], 1.0);
        assert_eq!(normalizer.params().scale[5], 1.0);

        let out = normalizer.transform_array(&[2.0; FEATURE_DIM]);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_transform_affine() {
        let params = NormalizationParams {
            mean: [1500.0; FEATURE_DIM],
            scale: [100.0; FEATURE_DIM],
        };
        let normalizer = Normalizer::new(params);
        let features = FeatureVector {
            p1_elo: 1700.0,
            p2_elo: 1400.0,
            ..Default::default()
        };
        let out = normalizer.transform(&features);
        assert!((out[0] - 2.0).abs() < 1e-6);
        assert!((out[1] + 1.0).abs() < 1e-6);
        assert!((out[9] + 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("norm").join("params.json");
        let path = path.to_str().unwrap();

        let params = NormalizationParams::from_rows(&[row(1400.0, 0), row(1700.0, 3)]).unwrap();
        params.save(path).unwrap();
        let loaded = NormalizationParams::load(path).unwrap();
        assert_eq!(loaded, params);
    }
}
