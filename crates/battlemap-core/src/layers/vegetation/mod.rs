//! Vegetation layer: zone partition → per-tile plant generation → tile
//! aggregation.
//!
//! Plant generation is tile-local (seeded from master seed, position, and
//! zone id), so with the `threading` feature the per-tile loop runs under
//! rayon and still produces bit-identical output.

mod plants;
mod zones;

use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::context::TacticalContext;
use crate::error::{GenerationError, Result};
use crate::grid::{Grid, NEIGHBORS_4};
use crate::layers::geology::GeologyLayer;
use crate::layers::hydrology::HydrologyLayer;
use crate::layers::topography::TopographyLayer;

pub use plants::{Plant, Stratum};
pub use zones::{Clearing, ForestKind, MeadowKind, VegetationZone, WetlandKind, ZoneKind};

use plants::TileEnv;

/// Canopy coverage above which a tile reads as dense woodland.
const DENSE_CANOPY: f64 = 0.6;
/// Square feet per tile (5 ft × 5 ft).
const TILE_AREA_SQFT: f64 = 25.0;
/// Wetland vegetation over water deeper than this is impassable.
const WETLAND_IMPASSABLE_DEPTH: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VegetationType {
    None,
    ShortGrass,
    TallGrass,
    Shrubs,
    SparseTrees,
    DenseTrees,
    WetlandVegetation,
}

impl VegetationType {
    pub fn as_str(self) -> &'static str {
        match self {
            VegetationType::None => "none",
            VegetationType::ShortGrass => "short_grass",
            VegetationType::TallGrass => "tall_grass",
            VegetationType::Shrubs => "shrubs",
            VegetationType::SparseTrees => "sparse_trees",
            VegetationType::DenseTrees => "dense_trees",
            VegetationType::WetlandVegetation => "wetland_vegetation",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VegetationTile {
    pub vegetation_type: VegetationType,
    /// Tallest plant on the tile, feet.
    pub canopy_height: f64,
    /// Fraction of the tile under tree canopy, [0, 1].
    pub canopy_coverage: f64,
    pub provides_cover: bool,
    pub provides_concealment: bool,
    pub is_passable: bool,
    /// Indices into [`VegetationLayer::plants`].
    pub plants: Vec<u32>,
}

impl Default for VegetationTile {
    fn default() -> Self {
        Self {
            vegetation_type: VegetationType::None,
            canopy_height: 0.0,
            canopy_coverage: 0.0,
            provides_cover: false,
            provides_concealment: false,
            is_passable: true,
            plants: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VegetationLayer {
    pub tiles: Grid<VegetationTile>,
    pub zones: Vec<VegetationZone>,
    /// Zone ids of forest zones.
    pub forest_patches: Vec<u32>,
    pub clearings: Vec<Clearing>,
    /// All plants on the map, owned here and referenced by tile index lists.
    pub plants: Vec<Plant>,
    pub total_tree_count: u32,
    pub average_canopy_coverage: f64,
}

pub fn generate_vegetation(
    hydro: &HydrologyLayer,
    topo: &TopographyLayer,
    geology: &GeologyLayer,
    ctx: &TacticalContext,
    seed: u32,
    config: &GenerationConfig,
) -> Result<VegetationLayer> {
    let width = topo.tiles.width();
    let height = topo.tiles.height();
    if hydro.tiles.width() != width || hydro.tiles.height() != height {
        return Err(GenerationError::dependency(
            "vegetation",
            "hydrology grid does not match topography",
        ));
    }

    // ── Zone partition ───────────────────────────────────────────────────
    let soil_depth = Grid::from_fn(width, height, |x, y| geology.tiles.get(x, y).soil_depth);
    let classes = zones::classify_tiles(hydro, topo, &soil_depth, ctx, seed, config);
    let (zone_list, zone_of) = zones::build_zones(&classes, ctx, seed);
    let (clearings, clearing_mask) = zones::carve_clearings(&zone_list, width, height, seed);

    // ── Per-tile plant generation ────────────────────────────────────────
    // Row-major job list; each job is fully tile-local.
    let jobs: Vec<(usize, usize, u32, ZoneKind, TileEnv)> = zone_of
        .coords()
        .filter_map(|(x, y)| {
            let zone_id = (*zone_of.get(x, y))?;
            let kind = zone_list[zone_id as usize].kind;
            let is_zone_edge = NEIGHBORS_4.iter().any(|&(dx, dy)| {
                let (nx, ny) = (x as isize + dx, y as isize + dy);
                !zone_of.in_bounds(nx, ny)
                    || *zone_of.get(nx as usize, ny as usize) != Some(zone_id)
            });
            let env = TileEnv {
                is_zone_edge,
                slope_deg: topo.tiles.get(x, y).slope,
                moisture: hydro.tiles.get(x, y).moisture,
                is_clearing: clearing_mask[y * width + x],
            };
            Some((x, y, zone_id, kind, env))
        })
        .collect();

    let season = ctx.season;
    let multiplier = config.vegetation_multiplier;
    let run = |&(x, y, zone_id, kind, ref env): &(usize, usize, u32, ZoneKind, TileEnv)| {
        plants::generate_plants_for_tile(kind, seed, x, y, zone_id, env, season, multiplier)
    };

    #[cfg(feature = "threading")]
    let per_tile: Vec<Vec<Plant>> = {
        use rayon::prelude::*;
        jobs.par_iter().map(run).collect()
    };
    #[cfg(not(feature = "threading"))]
    let per_tile: Vec<Vec<Plant>> = jobs.iter().map(run).collect();

    // ── Tile aggregation ─────────────────────────────────────────────────
    let mut all_plants: Vec<Plant> = Vec::new();
    let mut tiles: Grid<VegetationTile> = Grid::filled(width, height, VegetationTile::default());

    let season_canopy = match season {
        crate::context::Season::Autumn => 0.85,
        crate::context::Season::Winter => 0.6,
        _ => 1.0,
    };

    for ((x, y, zone_id, _, _), tile_plants) in jobs.iter().zip(per_tile) {
        let kind = zone_list[*zone_id as usize].kind;
        let water_depth = hydro.tiles.get(*x, *y).water_depth;

        let mut tree_count = 0u32;
        let mut shrub_count = 0u32;
        let mut herb_count = 0u32;
        let mut cover_count = 0u32;
        let mut canopy_area = 0.0f64;
        let mut canopy_height = 0.0f64;
        let mut indices = Vec::with_capacity(tile_plants.len());

        for plant in tile_plants {
            match plant.stratum {
                Stratum::Tree => {
                    tree_count += 1;
                    canopy_area +=
                        std::f64::consts::PI * plant.canopy_radius * plant.canopy_radius;
                }
                Stratum::Shrub => shrub_count += 1,
                Stratum::Herb | Stratum::Aquatic => herb_count += 1,
                Stratum::GroundCover => cover_count += 1,
            }
            canopy_height = canopy_height.max(plant.height);
            indices.push(all_plants.len() as u32);
            all_plants.push(plant);
        }

        let canopy_coverage = (canopy_area / TILE_AREA_SQFT).min(1.0) * season_canopy;

        let vegetation_type = if kind.is_wetland() {
            VegetationType::WetlandVegetation
        } else if tree_count >= 3 || canopy_coverage > DENSE_CANOPY {
            VegetationType::DenseTrees
        } else if tree_count >= 1 {
            VegetationType::SparseTrees
        } else if shrub_count >= 2 {
            VegetationType::Shrubs
        } else if herb_count >= 1 {
            VegetationType::TallGrass
        } else if cover_count >= 1 {
            VegetationType::ShortGrass
        } else {
            VegetationType::None
        };

        let provides_cover =
            vegetation_type == VegetationType::DenseTrees || shrub_count >= 2;
        let provides_concealment = !matches!(
            vegetation_type,
            VegetationType::None | VegetationType::ShortGrass
        );
        let is_passable = !(vegetation_type == VegetationType::DenseTrees
            || (vegetation_type == VegetationType::WetlandVegetation
                && water_depth > WETLAND_IMPASSABLE_DEPTH));

        *tiles.get_mut(*x, *y) = VegetationTile {
            vegetation_type,
            canopy_height,
            canopy_coverage,
            provides_cover,
            provides_concealment,
            is_passable,
            plants: indices,
        };
    }

    // ── Statistics ───────────────────────────────────────────────────────
    let total_tree_count =
        all_plants.iter().filter(|p| p.stratum == Stratum::Tree).count() as u32;
    let average_canopy_coverage =
        tiles.iter().map(|t| t.canopy_coverage).sum::<f64>() / (width * height) as f64;

    let forest_patches =
        zone_list.iter().filter(|z| z.kind.is_forest()).map(|z| z.id).collect();

    Ok(VegetationLayer {
        tiles,
        zones: zone_list,
        forest_patches,
        clearings,
        plants: all_plants,
        total_tree_count,
        average_canopy_coverage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Biome, Development, ElevationZone, Hydrology, Season};
    use crate::layers::geology::generate_geology;
    use crate::layers::hydrology::generate_hydrology;
    use crate::layers::topography::generate_topography;

    fn pipeline(ctx: &TacticalContext, seed: u32, config: &GenerationConfig) -> VegetationLayer {
        let geo = generate_geology(40, 40, ctx, seed).unwrap();
        let topo = generate_topography(&geo, ctx, seed, config).unwrap();
        let hydro = generate_hydrology(&topo, &geo, ctx, seed, config).unwrap();
        generate_vegetation(&hydro, &topo, &geo, ctx, seed, config).unwrap()
    }

    fn forest_ctx() -> TacticalContext {
        TacticalContext {
            biome: Biome::Forest,
            elevation: ElevationZone::Foothills,
            hydrology: Hydrology::Stream,
            development: Development::Wilderness,
            season: Season::Spring,
        }
    }

    #[test]
    fn forest_context_grows_forest_zones_and_trees() {
        let layer = pipeline(&forest_ctx(), 101, &GenerationConfig::default());
        assert!(!layer.forest_patches.is_empty(), "no forest zones in a forest biome");
        assert!(layer.total_tree_count > 0);
    }

    #[test]
    fn zones_are_disjoint() {
        let layer = pipeline(&forest_ctx(), 77, &GenerationConfig::default());
        let mut owner = vec![None::<u32>; 40 * 40];
        for z in &layer.zones {
            for &(x, y) in &z.tiles {
                let slot = &mut owner[y * 40 + x];
                assert!(slot.is_none(), "tile ({x},{y}) in zones {:?} and {}", slot, z.id);
                *slot = Some(z.id);
            }
        }
    }

    #[test]
    fn plant_indices_resolve_to_matching_tiles() {
        let layer = pipeline(&forest_ctx(), 13, &GenerationConfig::default());
        for (x, y) in layer.tiles.coords() {
            for &i in &layer.tiles.get(x, y).plants {
                let p = &layer.plants[i as usize];
                assert_eq!((p.x, p.y), (x, y), "plant {i} referenced by wrong tile");
            }
        }
        assert_eq!(
            layer.tiles.iter().map(|t| t.plants.len()).sum::<usize>(),
            layer.plants.len(),
            "every plant must be referenced exactly once"
        );
    }

    #[test]
    fn desert_is_sparse() {
        let desert = TacticalContext {
            biome: Biome::Desert,
            elevation: ElevationZone::Lowland,
            hydrology: Hydrology::Arid,
            development: Development::Wilderness,
            season: Season::Summer,
        };
        let layer = pipeline(&desert, 55, &GenerationConfig::default());
        assert!(
            layer.average_canopy_coverage < 0.2,
            "desert canopy {}",
            layer.average_canopy_coverage
        );
    }

    #[test]
    fn vegetation_multiplier_scales_counts() {
        let mut sparse_cfg = GenerationConfig::default();
        sparse_cfg.vegetation_multiplier = 0.0;
        let bare = pipeline(&forest_ctx(), 31, &sparse_cfg);
        assert_eq!(bare.plants.len(), 0);
        assert_eq!(bare.total_tree_count, 0);

        let lush = pipeline(&forest_ctx(), 31, &GenerationConfig::default());
        assert!(lush.plants.len() > bare.plants.len());
    }

    #[test]
    fn water_tiles_carry_no_zone() {
        let ctx = TacticalContext {
            biome: Biome::Swamp,
            elevation: ElevationZone::Lowland,
            hydrology: Hydrology::Wetland,
            development: Development::Wilderness,
            season: Season::Summer,
        };
        let cfg = GenerationConfig::default();
        let geo = generate_geology(30, 30, &ctx, 9).unwrap();
        let topo = generate_topography(&geo, &ctx, 9, &cfg).unwrap();
        let hydro = generate_hydrology(&topo, &geo, &ctx, 9, &cfg).unwrap();
        let veg = generate_vegetation(&hydro, &topo, &geo, &ctx, 9, &cfg).unwrap();

        let mut zoned = vec![false; 30 * 30];
        for z in &veg.zones {
            for &(x, y) in &z.tiles {
                zoned[y * 30 + x] = true;
            }
        }
        for (x, y) in hydro.tiles.coords() {
            if hydro.tiles.get(x, y).water_depth > 0.0 {
                assert!(!zoned[y * 30 + x], "water tile ({x},{y}) was zoned");
            }
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let a = pipeline(&forest_ctx(), 88, &GenerationConfig::default());
        let b = pipeline(&forest_ctx(), 88, &GenerationConfig::default());
        assert_eq!(a.plants.len(), b.plants.len());
        assert_eq!(a.total_tree_count, b.total_tree_count);
        assert_eq!(a.average_canopy_coverage, b.average_canopy_coverage);
        for (p, q) in a.plants.iter().zip(&b.plants) {
            assert_eq!(p.species, q.species);
            assert_eq!(p.height, q.height);
        }
    }
}
