//! Rock-specific feature relief, applied only on rugged maps.
//!
//! Each formation carves its own signature: carbonate dissolves into pits,
//! granite sheds needles and domes, soft clastic rock gullies into
//! badlands, metamorphic bands saw-tooth across the strike. All offsets
//! scale with `relief / 50` so a gentle lowland map gets gentle features.

use crate::grid::Grid;
use crate::layers::geology::{GeologyLayer, RockFormation};
use crate::rng::ValueNoise;

const PIT_SALT: u32 = 0x7c55_d18a;
const NEEDLE_SALT: u32 = 0xe213_9b46;
const GULLY_SALT: u32 = 0x4af0_62d9;

/// Clastic rock below this erosion resistance develops badlands gullies.
const BADLANDS_RESISTANCE: f64 = 0.5;

pub(super) fn apply_feature_relief(
    elev: &mut Grid<f64>,
    geology: &GeologyLayer,
    seed: u32,
    relief: f64,
) {
    let scale = relief / 50.0;
    let w = elev.width();
    let h = elev.height();

    let min = elev.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = elev.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = (max - min).max(1e-9);

    let pit_noise = ValueNoise::new(seed ^ PIT_SALT, 0.35);
    let needle_noise = ValueNoise::new(seed ^ NEEDLE_SALT, 0.4);
    let gully_noise = ValueNoise::new(seed ^ GULLY_SALT, 0.3);

    // Offsets are computed against a snapshot so application order cannot
    // feed one modifier into another.
    let snapshot = elev.clone();
    let mut offsets = Grid::filled(w, h, 0.0f64);

    for (x, y) in snapshot.coords() {
        let (fx, fy) = (x as f64, y as f64);
        let formation = geology.tiles.get(x, y).formation;
        let rel = (snapshot.get(x, y) - min) / range;

        match formation {
            // Dissolution pits with radial falloff.
            RockFormation::Carbonate => {
                if pit_noise.at(fx, fy) > 0.92 {
                    let radius = 2.5f64;
                    let depth = scale * 4.0;
                    for dy in -2isize..=2 {
                        for dx in -2isize..=2 {
                            let (nx, ny) = (x as isize + dx, y as isize + dy);
                            if !snapshot.in_bounds(nx, ny) {
                                continue;
                            }
                            let dist = ((dx * dx + dy * dy) as f64).sqrt();
                            if dist < radius {
                                *offsets.get_mut(nx as usize, ny as usize) -=
                                    depth * (1.0 - dist / radius);
                            }
                        }
                    }
                }
            }
            // Needles on the heights, domes on the flats.
            RockFormation::Granitic => {
                let n = needle_noise.at(fx, fy);
                if rel > 0.7 && n > 0.90 {
                    *offsets.get_mut(x, y) += scale * 6.0 * (n - 0.90) / 0.10;
                } else if rel < 0.3 && n > 0.85 {
                    let bump = scale * 2.0;
                    for dy in -1isize..=1 {
                        for dx in -1isize..=1 {
                            let (nx, ny) = (x as isize + dx, y as isize + dy);
                            if snapshot.in_bounds(nx, ny) {
                                let dist = ((dx * dx + dy * dy) as f64).sqrt();
                                *offsets.get_mut(nx as usize, ny as usize) +=
                                    bump * (1.0 - dist / 2.0);
                            }
                        }
                    }
                }
            }
            // Badlands gullies in weak sediments: ridged noise cut inward.
            RockFormation::Clastic => {
                if formation.erosion_resistance() < BADLANDS_RESISTANCE {
                    let n = gully_noise.at(fx, fy);
                    let ridged = 1.0 - (2.0 * n - 1.0).abs();
                    if ridged > 0.8 {
                        *offsets.get_mut(x, y) -= scale * 3.0 * (ridged - 0.8) / 0.2;
                    }
                }
            }
            // Alternating resistant/soft bands across the strike.
            RockFormation::Metamorphic => {
                let phase = (x as f64 + y as f64) * 0.5;
                let saw = 2.0 * (phase - (phase + 0.5).floor()).abs();
                *offsets.get_mut(x, y) += (saw - 0.5) * scale * 3.0;
            }
            RockFormation::Volcanic | RockFormation::Evaporite => {}
        }
    }

    for (x, y) in offsets.coords() {
        let e = elev.get_mut(x, y);
        *e = (*e + *offsets.get(x, y)).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Biome, Development, ElevationZone, Hydrology, Season, TacticalContext};
    use crate::layers::geology::generate_geology;

    fn geo_for(biome: Biome, seed: u32) -> (GeologyLayer, TacticalContext) {
        let ctx = TacticalContext {
            biome,
            elevation: ElevationZone::Highland,
            hydrology: Hydrology::Stream,
            development: Development::Wilderness,
            season: Season::Summer,
        };
        (generate_geology(32, 32, &ctx, seed).unwrap(), ctx)
    }

    #[test]
    fn relief_modifies_some_tiles_and_stays_non_negative() {
        let (geo, _) = geo_for(Biome::Mountain, 17);
        let before = Grid::from_fn(32, 32, |x, y| 20.0 + ((x * 5 + y * 3) % 11) as f64);
        let mut after = before.clone();
        apply_feature_relief(&mut after, &geo, 17, 100.0);

        let changed = before
            .coords()
            .filter(|&(x, y)| before.get(x, y) != after.get(x, y))
            .count();
        assert!(changed > 0, "feature relief changed nothing");
        for &e in after.iter() {
            assert!(e >= 0.0);
        }
    }

    #[test]
    fn offsets_scale_with_relief() {
        let (geo, _) = geo_for(Biome::Mountain, 29);
        let base = Grid::from_fn(32, 32, |x, y| 20.0 + ((x + y) % 7) as f64);

        let deviation = |relief: f64| {
            let mut g = base.clone();
            apply_feature_relief(&mut g, &geo, 29, relief);
            base.coords()
                .map(|(x, y)| (g.get(x, y) - base.get(x, y)).abs())
                .sum::<f64>()
        };
        let small = deviation(25.0);
        let large = deviation(200.0);
        assert!(large > small, "large-relief deviation {large} ≤ small {small}");
    }

    #[test]
    fn is_deterministic() {
        let (geo, _) = geo_for(Biome::Mountain, 41);
        let base = Grid::from_fn(32, 32, |x, y| (x + y) as f64);
        let mut a = base.clone();
        let mut b = base.clone();
        apply_feature_relief(&mut a, &geo, 41, 80.0);
        apply_feature_relief(&mut b, &geo, 41, 80.0);
        for (x, y) in base.coords() {
            assert_eq!(a.get(x, y), b.get(x, y));
        }
    }
}
