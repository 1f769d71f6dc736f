//! Optional tuning knobs.
//!
//! Every field has a calibrated default, so an empty JSON object is a valid
//! config. Scalar knobs are validated against their allowed ranges rather
//! than clamped — a caller who sends `terrain_ruggedness: 9.0` wants to know,
//! not to silently get 2.0.

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// [0.5, 2.0]. Scales feature frequency, octave counts, and relief.
    pub terrain_ruggedness: f64,
    /// [0.5, 2.0]. Multiplier on elevation-zone relief.
    pub elevation_variance: f64,
    /// [0.5, 2.0]. Inversely scales stream/spring/pool thresholds.
    pub water_abundance: f64,
    /// [0, 2.0]. Scales plant densities.
    pub vegetation_multiplier: f64,
    pub generate_forests: bool,
    pub generate_rivers: bool,
    pub generate_roads: bool,
    pub generate_buildings: bool,
    /// Optional per-terrain probability vector. Must sum to ≈ 1.
    pub terrain_distribution: Option<TerrainDistribution>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            terrain_ruggedness: 1.0,
            elevation_variance: 1.0,
            water_abundance: 1.0,
            vegetation_multiplier: 1.0,
            generate_forests: true,
            generate_rivers: true,
            generate_roads: true,
            generate_buildings: true,
            terrain_distribution: None,
        }
    }
}

/// Relative frequency of the six coarse terrain classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainDistribution {
    pub grassland: f64,
    pub forest: f64,
    pub mountain: f64,
    pub water: f64,
    pub desert: f64,
    pub swamp: f64,
}

impl TerrainDistribution {
    pub fn sum(&self) -> f64 {
        self.grassland + self.forest + self.mountain + self.water + self.desert + self.swamp
    }
}

fn check_range(name: &str, value: f64, lo: f64, hi: f64) -> Result<()> {
    if !value.is_finite() || value < lo || value > hi {
        return Err(GenerationError::validation(format!(
            "{name} must be in [{lo}, {hi}], got {value}"
        )));
    }
    Ok(())
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<()> {
        check_range("terrain_ruggedness", self.terrain_ruggedness, 0.5, 2.0)?;
        check_range("elevation_variance", self.elevation_variance, 0.5, 2.0)?;
        check_range("water_abundance", self.water_abundance, 0.5, 2.0)?;
        check_range("vegetation_multiplier", self.vegetation_multiplier, 0.0, 2.0)?;
        if let Some(dist) = &self.terrain_distribution {
            for (name, v) in [
                ("grassland", dist.grassland),
                ("forest", dist.forest),
                ("mountain", dist.mountain),
                ("water", dist.water),
                ("desert", dist.desert),
                ("swamp", dist.swamp),
            ] {
                check_range(name, v, 0.0, 1.0)?;
            }
            let sum = dist.sum();
            if (sum - 1.0).abs() > 0.05 {
                return Err(GenerationError::validation(format!(
                    "terrain_distribution must sum to ≈ 1.0, got {sum:.3}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GenerationConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_knob_rejected() {
        let mut cfg = GenerationConfig::default();
        cfg.terrain_ruggedness = 2.5;
        assert!(cfg.validate().is_err());

        let mut cfg = GenerationConfig::default();
        cfg.vegetation_multiplier = -0.1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn distribution_sum_enforced() {
        let mut cfg = GenerationConfig::default();
        cfg.terrain_distribution = Some(TerrainDistribution {
            grassland: 0.5,
            forest: 0.5,
            mountain: 0.5,
            water: 0.0,
            desert: 0.0,
            swamp: 0.0,
        });
        assert!(cfg.validate().is_err());

        cfg.terrain_distribution = Some(TerrainDistribution {
            grassland: 0.3,
            forest: 0.3,
            mountain: 0.15,
            water: 0.1,
            desert: 0.1,
            swamp: 0.05,
        });
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let cfg: GenerationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.terrain_ruggedness, 1.0);
        assert!(cfg.generate_roads);
        assert!(cfg.terrain_distribution.is_none());
    }
}
