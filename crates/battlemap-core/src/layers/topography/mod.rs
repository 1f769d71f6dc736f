//! Topography layer: elevation model → differential erosion → feature
//! relief → variable smoothing → surface classification.
//!
//! Elevation is the sum of three noise layers (macro gradient, tactical
//! undulations, geological texture) whose scales and weights adapt to map
//! size and the terrain-ruggedness knob. Erosion and smoothing then carve
//! the raw sum according to per-tile susceptibility, so soft fractured rock
//! in wet contexts ends up smoother and lower than hard dry rock.

mod elevation;
mod erosion;
mod relief;
mod surface;

use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::context::TacticalContext;
use crate::error::{GenerationError, Result};
use crate::grid::Grid;
use crate::layers::geology::GeologyLayer;

pub use surface::Aspect;

/// Feet per tile edge.
pub const TILE_FEET: f64 = 5.0;

/// Coarse physical scale of the map, by its shorter side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleCategory {
    /// Under 300 ft: a skirmish site.
    Tactical,
    /// Under 1000 ft.
    Operational,
    /// 1000 ft and up.
    Strategic,
}

impl ScaleCategory {
    pub fn from_min_dimension_ft(min_dim_ft: f64) -> Self {
        if min_dim_ft < 300.0 {
            ScaleCategory::Tactical
        } else if min_dim_ft < 1000.0 {
            ScaleCategory::Operational
        } else {
            ScaleCategory::Strategic
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopographyTile {
    /// Feet above the map floor.
    pub elevation: f64,
    /// Degrees, [0, 90].
    pub slope: f64,
    pub aspect: Aspect,
    /// Position within the map's elevation range, [-1, 1].
    pub relative_elevation: f64,
    pub is_ridge: bool,
    pub is_valley: bool,
    pub is_drainage: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopographyLayer {
    pub tiles: Grid<TopographyTile>,
    pub scale: ScaleCategory,
    pub min_elevation: f64,
    pub max_elevation: f64,
    /// Mean slope over all tiles, degrees.
    pub average_slope: f64,
}

pub fn generate_topography(
    geology: &GeologyLayer,
    ctx: &TacticalContext,
    seed: u32,
    config: &GenerationConfig,
) -> Result<TopographyLayer> {
    let width = geology.tiles.width();
    let height = geology.tiles.height();
    if width == 0 || height == 0 {
        return Err(GenerationError::dependency("topography", "geology grid is empty"));
    }

    // ── Scale parameters ─────────────────────────────────────────────────
    let min_dim_ft = (width.min(height) as f64) * TILE_FEET;
    let scale = ScaleCategory::from_min_dimension_ft(min_dim_ft);
    let ruggedness = config.terrain_ruggedness;
    let relief = min_dim_ft
        * 0.4
        * config.elevation_variance
        * ctx.elevation.relief_factor()
        * (0.4 + 0.6 * ruggedness);

    // ── Raw elevation: macro gradient + undulations + texture ────────────
    let mut elev = elevation::build_elevation_field(geology, seed, config, relief);

    // ── Differential erosion ─────────────────────────────────────────────
    erosion::apply_differential_erosion(&mut elev, geology, ctx, seed, config, relief);

    // ── Rock-specific feature relief (rugged maps only) ──────────────────
    if ruggedness >= 1.5 {
        relief::apply_feature_relief(&mut elev, geology, seed, relief);
    }

    // ── Variable smoothing ───────────────────────────────────────────────
    erosion::apply_variable_smoothing(&mut elev, geology, ctx, seed, config);

    // ── Slope, aspect, ridge/valley classification ───────────────────────
    let (tiles, min_elevation, max_elevation, average_slope) = surface::build_tiles(&elev);

    Ok(TopographyLayer { tiles, scale, min_elevation, max_elevation, average_slope })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Biome, Development, ElevationZone, Hydrology, Season};
    use crate::layers::geology::generate_geology;

    fn ctx(zone: ElevationZone) -> TacticalContext {
        TacticalContext {
            biome: Biome::Mountain,
            elevation: zone,
            hydrology: Hydrology::Stream,
            development: Development::Wilderness,
            season: Season::Summer,
        }
    }

    fn build(zone: ElevationZone, seed: u32, ruggedness: f64) -> TopographyLayer {
        let c = ctx(zone);
        let geo = generate_geology(40, 40, &c, seed).unwrap();
        let mut cfg = GenerationConfig::default();
        cfg.terrain_ruggedness = ruggedness;
        generate_topography(&geo, &c, seed, &cfg).unwrap()
    }

    #[test]
    fn generation_is_deterministic() {
        let a = build(ElevationZone::Highland, 31, 1.0);
        let b = build(ElevationZone::Highland, 31, 1.0);
        for (x, y) in a.tiles.coords() {
            assert_eq!(a.tiles.get(x, y).elevation, b.tiles.get(x, y).elevation);
            assert_eq!(a.tiles.get(x, y).slope, b.tiles.get(x, y).slope);
        }
        assert_eq!(a.max_elevation, b.max_elevation);
    }

    #[test]
    fn alpine_relief_exceeds_lowland() {
        let alpine = build(ElevationZone::Alpine, 7, 1.0);
        let lowland = build(ElevationZone::Lowland, 7, 1.0);
        assert!(
            alpine.max_elevation - alpine.min_elevation
                > lowland.max_elevation - lowland.min_elevation,
            "alpine span {} ≤ lowland span {}",
            alpine.max_elevation - alpine.min_elevation,
            lowland.max_elevation - lowland.min_elevation
        );
    }

    #[test]
    fn fields_stay_in_range() {
        let layer = build(ElevationZone::Highland, 99, 2.0);
        for t in layer.tiles.iter() {
            assert!(t.elevation >= 0.0);
            assert!((0.0..=90.0).contains(&t.slope));
            assert!((-1.0..=1.0).contains(&t.relative_elevation));
            assert!(!(t.is_ridge && t.is_valley), "tile is both ridge and valley");
        }
        assert!(layer.min_elevation <= layer.max_elevation);
    }

    #[test]
    fn scale_category_by_min_dimension() {
        assert_eq!(ScaleCategory::from_min_dimension_ft(50.0), ScaleCategory::Tactical);
        assert_eq!(ScaleCategory::from_min_dimension_ft(499.0), ScaleCategory::Operational);
        assert_eq!(ScaleCategory::from_min_dimension_ft(1000.0), ScaleCategory::Strategic);
    }

    #[test]
    fn mountain_highland_is_steep() {
        let layer = build(ElevationZone::Highland, 3, 1.5);
        assert!(layer.max_elevation > 50.0, "max elevation {}", layer.max_elevation);
        assert!(layer.average_slope > 5.0, "average slope {}", layer.average_slope);
    }
}
