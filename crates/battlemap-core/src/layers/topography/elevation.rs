//! Three-layer elevation model.
//!
//! All noise is sampled in feet so that the spatial scales below mean the
//! same thing on a 10×10 and a 100×100 map. Weights shift with the
//! ruggedness knob: smooth maps are dominated by the macro gradient, rugged
//! maps by the undulation and texture layers.

use crate::config::GenerationConfig;
use crate::grid::Grid;
use crate::layers::geology::GeologyLayer;
use crate::rng::ValueNoise;

use super::TILE_FEET;

const MACRO_SALT: u32 = 0x51b7_a9e3;
const UNDULATION_SALT: u32 = 0xc4d2_06f1;
const TEXTURE_SALT: u32 = 0x38e9_5b27;

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Normalized position of `ruggedness` within its [0.5, 2.0] range.
#[inline]
pub(super) fn ruggedness_t(ruggedness: f64) -> f64 {
    ((ruggedness - 0.5) / 1.5).clamp(0.0, 1.0)
}

pub(super) fn build_elevation_field(
    geology: &GeologyLayer,
    seed: u32,
    config: &GenerationConfig,
    relief: f64,
) -> Grid<f64> {
    let r = config.terrain_ruggedness;
    let t = ruggedness_t(r);

    // Macro gradient: one large smooth trend across the whole map.
    let macro_noise = ValueNoise::new(seed ^ MACRO_SALT, 0.001);
    let macro_weight = lerp(0.7, 0.3, t);

    // Tactical undulations: the hills and hollows that matter at 5 ft/tile.
    let undulation_noise = ValueNoise::new(seed ^ UNDULATION_SALT, 0.015 * (0.7 + 0.6 * r));
    let undulation_octaves = ((1.0 + 1.5 * r).round() as u32).clamp(1, 4);
    let undulation_weight = lerp(0.15, 0.55, t);

    // Geological texture: fine grain whose strength depends on the rock.
    let texture_noise = ValueNoise::new(seed ^ TEXTURE_SALT, 0.02 * (0.5 + 0.75 * r));
    let texture_weight = lerp(0.02, 0.10, t);

    let mut field =
        Grid::from_fn(geology.tiles.width(), geology.tiles.height(), |x, y| {
            let fx = x as f64 * TILE_FEET;
            let fy = y as f64 * TILE_FEET;

            let macro_v = macro_noise.octaves(fx, fy, 2, 0.6);
            let undulation = undulation_noise.octaves(fx, fy, undulation_octaves, 0.5) - 0.5;
            let texture = (texture_noise.at(fx, fy) - 0.5)
                * geology.tiles.get(x, y).formation.texture_intensity()
                * r;

            let e = (macro_v * macro_weight
                + undulation * undulation_weight
                + texture * texture_weight)
                * relief;
            e.max(0.0)
        });

    // The summed noise rarely reaches the full weight budget; stretch the
    // field so the raw maximum lands on the configured relief span.
    let raw_max = field.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if raw_max > 0.0 {
        let scale = relief / raw_max;
        for (x, y) in field.coords() {
            *field.get_mut(x, y) *= scale;
        }
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Biome, Development, ElevationZone, Hydrology, Season, TacticalContext};
    use crate::layers::geology::generate_geology;

    fn geo(seed: u32) -> GeologyLayer {
        let ctx = TacticalContext {
            biome: Biome::Mountain,
            elevation: ElevationZone::Highland,
            hydrology: Hydrology::Stream,
            development: Development::Wilderness,
            season: Season::Summer,
        };
        generate_geology(32, 32, &ctx, seed).unwrap()
    }

    #[test]
    fn field_is_non_negative_and_bounded_by_relief() {
        let g = geo(11);
        let elev = build_elevation_field(&g, 11, &GenerationConfig::default(), 120.0);
        for &e in elev.iter() {
            assert!(e >= 0.0);
            assert!(e <= 120.0 * 1.3, "elevation {e} implausibly high");
        }
    }

    #[test]
    fn rugged_maps_have_more_local_variation() {
        let g = geo(23);
        let mut smooth_cfg = GenerationConfig::default();
        smooth_cfg.terrain_ruggedness = 0.5;
        let mut rough_cfg = GenerationConfig::default();
        rough_cfg.terrain_ruggedness = 2.0;

        let smooth = build_elevation_field(&g, 23, &smooth_cfg, 100.0);
        let rough = build_elevation_field(&g, 23, &rough_cfg, 100.0);

        // Mean absolute east-west difference as a roughness proxy.
        let local_var = |grid: &Grid<f64>| {
            let mut sum = 0.0;
            let mut n = 0usize;
            for (x, y) in grid.coords() {
                if x + 1 < grid.width() {
                    sum += (grid.get(x + 1, y) - grid.get(x, y)).abs();
                    n += 1;
                }
            }
            sum / n as f64
        };
        assert!(
            local_var(&rough) > local_var(&smooth),
            "rough {} ≤ smooth {}",
            local_var(&rough),
            local_var(&smooth)
        );
    }

    #[test]
    fn octave_count_tracks_ruggedness() {
        assert_eq!(((1.0 + 1.5 * 0.5_f64).round() as u32).clamp(1, 4), 2);
        assert_eq!(((1.0 + 1.5 * 2.0_f64).round() as u32).clamp(1, 4), 4);
    }
}
