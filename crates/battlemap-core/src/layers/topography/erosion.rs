//! Differential erosion and variable smoothing.
//!
//! Susceptibility blends rock resistance, local slope, fracturing, context
//! wetness, and the inverse of ruggedness. The same score drives both how
//! much material erosion removes and how many smoothing passes a tile gets,
//! so the two passes agree about which terrain is soft.

use crate::config::GenerationConfig;
use crate::context::TacticalContext;
use crate::grid::Grid;
use crate::layers::geology::GeologyLayer;
use crate::rng::ValueNoise;

const EROSION_SALT: u32 = 0x9fd4_312c;
const WETNESS_SALT: u32 = 0x27b8_e605;

/// Slope in degrees from central differences over 10 ft (tiles are 5 ft,
/// neighbors two tiles apart). Edge samples clamp to the grid.
pub(super) fn local_slope_deg(elev: &Grid<f64>, x: usize, y: usize) -> f64 {
    let w = elev.width();
    let h = elev.height();
    let east = *elev.get((x + 1).min(w - 1), y);
    let west = *elev.get(x.saturating_sub(1), y);
    let south = *elev.get(x, (y + 1).min(h - 1));
    let north = *elev.get(x, y.saturating_sub(1));
    let dx = (east - west) / 10.0;
    let dy = (south - north) / 10.0;
    (dx * dx + dy * dy).sqrt().atan().to_degrees()
}

/// Erosion susceptibility in [0, 1].
pub(super) fn susceptibility(
    elev: &Grid<f64>,
    geology: &GeologyLayer,
    ctx: &TacticalContext,
    config: &GenerationConfig,
    wetness_noise: &ValueNoise,
    x: usize,
    y: usize,
) -> f64 {
    let rock = geology.tiles.get(x, y);
    let slope_factor = (local_slope_deg(elev, x, y) / 45.0).min(1.0);
    let wetness = (ctx.hydrology.baseline_wetness()
        + (wetness_noise.at(x as f64, y as f64) - 0.5) * 0.2)
        .clamp(0.0, 1.0);

    let s = 0.3 * (1.0 - rock.formation.erosion_resistance())
        + 0.2 * slope_factor
        + 0.2 * rock.fracture_intensity
        + 0.15 * (wetness - 0.5)
        + 0.15 * (1.0 - config.terrain_ruggedness);
    s.clamp(0.0, 1.0)
}

pub(super) fn apply_differential_erosion(
    elev: &mut Grid<f64>,
    geology: &GeologyLayer,
    ctx: &TacticalContext,
    seed: u32,
    config: &GenerationConfig,
    relief: f64,
) {
    let erosion_noise = ValueNoise::new(seed ^ EROSION_SALT, 0.18);
    let wetness_noise = ValueNoise::new(seed ^ WETNESS_SALT, 0.05);

    // Susceptibility reads slopes from the pre-erosion surface; amounts are
    // computed for every tile before any is applied.
    let amounts = Grid::from_fn(elev.width(), elev.height(), |x, y| {
        let s = susceptibility(elev, geology, ctx, config, &wetness_noise, x, y);
        let variation = 0.7 + 0.6 * erosion_noise.at(x as f64, y as f64);
        s * variation * relief / 50.0 * 8.0
    });

    for (x, y) in amounts.coords() {
        let e = elev.get_mut(x, y);
        *e = (*e - *amounts.get(x, y)).max(0.0);
    }
}

/// Per-tile smoothing pass counts: `floor(susceptibility × max_passes)`,
/// +1 in valleys (sediment accumulates), −1 on ridges (wind-stripped).
pub(super) fn apply_variable_smoothing(
    elev: &mut Grid<f64>,
    geology: &GeologyLayer,
    ctx: &TacticalContext,
    seed: u32,
    config: &GenerationConfig,
) {
    let max_passes = (6.0 - 3.0 * config.terrain_ruggedness).round().max(0.0) as usize;
    if max_passes == 0 {
        return;
    }

    let wetness_noise = ValueNoise::new(seed ^ WETNESS_SALT, 0.05);
    let w = elev.width();
    let h = elev.height();

    // Provisional ridge/valley calls from the unsmoothed surface.
    let passes = Grid::from_fn(w, h, |x, y| {
        let s = susceptibility(elev, geology, ctx, config, &wetness_noise, x, y);
        let mut n = (s * max_passes as f64).floor() as isize;
        let (lower, higher) = neighborhood_counts(elev, x, y);
        if higher >= 6 {
            n += 1; // valley
        }
        if lower >= 6 {
            n -= 1; // ridge
        }
        n.clamp(0, (max_passes + 1) as isize) as usize
    });

    let total = max_passes + 1;
    for pass in 0..total {
        let snapshot = elev.clone();
        for (x, y) in snapshot.coords() {
            if *passes.get(x, y) <= pass {
                continue;
            }
            // Weighted 5-tap mean, center weight 4; edge tiles renormalize.
            let mut sum = 4.0 * snapshot.get(x, y);
            let mut weight = 4.0;
            for (dx, dy) in crate::grid::NEIGHBORS_4 {
                let (nx, ny) = (x as isize + dx, y as isize + dy);
                if snapshot.in_bounds(nx, ny) {
                    sum += snapshot.get(nx as usize, ny as usize);
                    weight += 1.0;
                }
            }
            *elev.get_mut(x, y) = sum / weight;
        }
    }
}

/// Count strictly lower / strictly higher tiles in the 3×3 neighborhood.
pub(super) fn neighborhood_counts(elev: &Grid<f64>, x: usize, y: usize) -> (usize, usize) {
    let center = *elev.get(x, y);
    let mut lower = 0;
    let mut higher = 0;
    for dy in -1isize..=1 {
        for dx in -1isize..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let (nx, ny) = (x as isize + dx, y as isize + dy);
            if elev.in_bounds(nx, ny) {
                let n = *elev.get(nx as usize, ny as usize);
                if n < center {
                    lower += 1;
                } else if n > center {
                    higher += 1;
                }
            }
        }
    }
    (lower, higher)
}
