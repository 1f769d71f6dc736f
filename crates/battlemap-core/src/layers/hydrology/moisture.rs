//! Water depth, pool detection, and the moisture ladder.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::context::{Hydrology, TacticalContext};
use crate::layers::geology::{GeologyLayer, Permeability};
use crate::layers::topography::TopographyLayer;
use crate::rng::{tile_rng, ValueNoise};

const DEPTH_SALT: u32 = 0x31f6_a28d;
const POOL_SALT: u64 = 0xA84B_07E2_6D91_C35F;

/// Base threshold for pool formation before water-abundance scaling.
const POOL_THRESHOLD: f64 = 0.90;
/// Pools form at or below this fraction of the elevation range.
const POOL_ELEVATION_FRACTION: f64 = 0.30;
const POOL_MAX_SLOPE_DEG: f64 = 5.0;

/// Soil/air dampness ladder, driest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Moisture {
    Arid,
    Dry,
    Moderate,
    Moist,
    Wet,
    Saturated,
}

impl Moisture {
    pub fn as_str(self) -> &'static str {
        match self {
            Moisture::Arid => "arid",
            Moisture::Dry => "dry",
            Moisture::Moderate => "moderate",
            Moisture::Moist => "moist",
            Moisture::Wet => "wet",
            Moisture::Saturated => "saturated",
        }
    }

    /// Ordinal position in the ladder, 0 = arid.
    pub fn level(self) -> u8 {
        match self {
            Moisture::Arid => 0,
            Moisture::Dry => 1,
            Moisture::Moderate => 2,
            Moisture::Moist => 3,
            Moisture::Wet => 4,
            Moisture::Saturated => 5,
        }
    }

    fn from_level(level: u8) -> Self {
        match level {
            0 => Moisture::Arid,
            1 => Moisture::Dry,
            2 => Moisture::Moderate,
            3 => Moisture::Moist,
            4 => Moisture::Wet,
            _ => Moisture::Saturated,
        }
    }

    pub fn bump_up(self) -> Self {
        Self::from_level((self.level() + 1).min(5))
    }

    pub fn bump_down(self) -> Self {
        Self::from_level(self.level().saturating_sub(1))
    }
}

/// Stream depth scales with Strahler order and the context's regime;
/// valleys pond half again deeper. Pools form in flat low ground
/// (valley OR bottom 30 % of the elevation range) outside arid regimes.
pub(super) fn compute_water_depth(
    topo: &TopographyLayer,
    ctx: &TacticalContext,
    seed: u32,
    config: &GenerationConfig,
    stream_mask: &[bool],
    orders: &[u8],
) -> (Vec<f64>, Vec<bool>) {
    let w = topo.tiles.width();
    let n = w * topo.tiles.height();
    let depth_noise = ValueNoise::new(seed ^ DEPTH_SALT, 0.3);
    let pool_threshold = POOL_THRESHOLD / config.water_abundance;
    let depth_factor = ctx.hydrology.depth_factor();

    let mut depth = vec![0.0f64; n];
    let mut pools = vec![false; n];

    for i in 0..n {
        let (x, y) = (i % w, i / w);
        let tile = topo.tiles.get(x, y);
        let (fx, fy) = (x as f64, y as f64);

        if stream_mask[i] {
            // Arid channels are dry washes unless two accumulation chains
            // have already converged.
            let perennial = ctx.hydrology != Hydrology::Arid || orders[i] >= 2;
            if perennial {
                let mut d =
                    orders[i] as f64 * 0.5 * depth_factor * (0.8 + 0.4 * depth_noise.at(fx, fy));
                if tile.is_valley {
                    d *= 1.5;
                }
                depth[i] = d;
            }
        }

        // Pool predicate: valley OR low elevation, then flatness and regime.
        let rel01 = (tile.relative_elevation + 1.0) / 2.0;
        let low_ground = tile.is_valley || rel01 <= POOL_ELEVATION_FRACTION;
        if low_ground && tile.slope < POOL_MAX_SLOPE_DEG && ctx.hydrology != Hydrology::Arid {
            let roll = tile_rng(seed, x, y, POOL_SALT).gen::<f64>();
            if roll > pool_threshold {
                depth[i] = depth[i].max(1.0 + roll * 2.0);
                pools[i] = true;
            }
        }
    }
    (depth, pools)
}

/// Moisture: context baseline, raised by surface water and accumulation,
/// then nudged by the bedrock's permeability.
pub(super) fn compute_moisture(
    geology: &GeologyLayer,
    ctx: &TacticalContext,
    accumulation: &[u32],
    water_depth: &[f64],
) -> Vec<Moisture> {
    let w = geology.tiles.width();
    let baseline = match ctx.hydrology {
        Hydrology::Arid => Moisture::Arid,
        Hydrology::Wetland => Moisture::Wet,
        _ => Moisture::Moderate,
    };

    (0..accumulation.len())
        .map(|i| {
            let mut m = if water_depth[i] > 0.0 {
                Moisture::Saturated
            } else if accumulation[i] > 20 {
                baseline.max(Moisture::Wet)
            } else if accumulation[i] > 10 {
                baseline.max(Moisture::Moist)
            } else {
                baseline
            };

            let (x, y) = (i % w, i / w);
            match geology.tiles.get(x, y).permeability {
                Permeability::Impermeable if m < Moisture::Saturated => m = m.bump_up(),
                Permeability::High => m = m.bump_down(),
                _ => {}
            }
            m
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ladder_orders_and_bumps() {
        assert!(Moisture::Arid < Moisture::Saturated);
        assert_eq!(Moisture::Moderate.bump_up(), Moisture::Moist);
        assert_eq!(Moisture::Saturated.bump_up(), Moisture::Saturated);
        assert_eq!(Moisture::Arid.bump_down(), Moisture::Arid);
        assert_eq!(Moisture::Wet.bump_down(), Moisture::Moist);
    }

    #[test]
    fn level_round_trips() {
        for m in [
            Moisture::Arid,
            Moisture::Dry,
            Moisture::Moderate,
            Moisture::Moist,
            Moisture::Wet,
            Moisture::Saturated,
        ] {
            assert_eq!(Moisture::from_level(m.level()), m);
        }
    }
}
