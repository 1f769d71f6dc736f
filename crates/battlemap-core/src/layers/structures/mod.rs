//! Structures layer: development-driven building placement, roads, bridges,
//! and enclosure walls.

mod placement;
mod roads;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::context::{Development, TacticalContext};
use crate::error::{GenerationError, Result};
use crate::grid::Grid;
use crate::layers::hydrology::HydrologyLayer;
use crate::layers::topography::TopographyLayer;
use crate::layers::vegetation::VegetationLayer;
use crate::rng::layer_rng;

pub use placement::{Building, BuildingType, StructureCondition};
pub use roads::{BridgeLocation, BridgeOrientation, RoadKind, RoadNetwork, RoadSegment};

use placement::{
    building_budget, building_types_for, footprint_tile_ok, min_building_spacing,
    roll_condition, suitability, SUITABILITY_THRESHOLD,
};

const PLACEMENT_SALT: u64 = 0x4B19_D7A3_F025_6C8E;
const WALL_SALT: u64 = 0xA6E3_0C58_24BF_91D7;

/// Chance an eligible building gets an enclosure wall.
const WALL_CHANCE: f64 = 0.25;

/// What occupies a structure tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Building(BuildingType),
    Road,
    Bridge,
    Wall,
}

impl StructureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StructureKind::Building(bt) => bt.as_str(),
            StructureKind::Road => "road",
            StructureKind::Bridge => "bridge",
            StructureKind::Wall => "wall",
        }
    }
}

/// A free-standing enclosure wall, as a list of wall tiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub points: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureTile {
    pub has_structure: bool,
    pub structure: Option<StructureKind>,
    pub condition: Option<StructureCondition>,
    pub provides_cover: bool,
    pub is_passable: bool,
}

impl Default for StructureTile {
    fn default() -> Self {
        Self {
            has_structure: false,
            structure: None,
            condition: None,
            provides_cover: false,
            is_passable: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuresLayer {
    pub tiles: Grid<StructureTile>,
    pub buildings: Vec<Building>,
    pub roads: RoadNetwork,
    pub bridges: Vec<BridgeLocation>,
    pub walls: Vec<Wall>,
}

pub fn generate_structures(
    veg: &VegetationLayer,
    hydro: &HydrologyLayer,
    topo: &TopographyLayer,
    ctx: &TacticalContext,
    seed: u32,
    config: &GenerationConfig,
) -> Result<StructuresLayer> {
    let width = topo.tiles.width();
    let height = topo.tiles.height();
    if veg.tiles.width() != width || veg.tiles.height() != height {
        return Err(GenerationError::dependency(
            "structures",
            "vegetation grid does not match topography",
        ));
    }

    // ── Building placement ───────────────────────────────────────────────
    let budget = if config.generate_buildings { building_budget(ctx.development) } else { 0 };
    let mut buildings = Vec::new();
    let mut building_mask = vec![false; width * height];

    if budget > 0 {
        let mut rng = layer_rng(seed, PLACEMENT_SALT);
        let target = rng.gen_range((budget / 3).max(1)..=budget);
        let spacing = min_building_spacing(ctx.development);
        let types = building_types_for(ctx.biome, ctx.development);

        // Best sites first; index tiebreak keeps the order total.
        let mut candidates: Vec<(f64, usize)> = (0..width * height)
            .map(|i| (suitability(i % width, i / width, topo, hydro, veg, None), i))
            .collect();
        candidates.sort_unstable_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

        for &(score, idx) in &candidates {
            if buildings.len() >= target || score < SUITABILITY_THRESHOLD {
                break;
            }
            let (ox, oy) = (idx % width, idx / width);
            let building_type = types[rng.gen_range(0..types.len())];
            let (fw, fh) = building_type.footprint();

            if ox + fw > width || oy + fh > height {
                continue;
            }
            let center = (ox + fw / 2, oy + fh / 2);
            let too_close = buildings.iter().any(|b: &Building| {
                let (bx, by) = b.center();
                let dx = bx as f64 - center.0 as f64;
                let dy = by as f64 - center.1 as f64;
                (dx * dx + dy * dy).sqrt() < spacing
            });
            if too_close {
                continue;
            }
            let footprint_ok = (0..fh).all(|dy| {
                (0..fw).all(|dx| {
                    let (x, y) = (ox + dx, oy + dy);
                    !building_mask[y * width + x] && footprint_tile_ok(x, y, topo, hydro, veg)
                })
            });
            if !footprint_ok {
                continue;
            }

            let building = Building {
                id: buildings.len() as u32,
                building_type,
                origin: (ox, oy),
                width: fw,
                height: fh,
                condition: roll_condition(ctx.development, &mut rng),
            };
            for (x, y) in building.tiles() {
                building_mask[y * width + x] = true;
            }
            buildings.push(building);
        }
    }

    // ── Roads and bridges ────────────────────────────────────────────────
    let (road_network, bridges, road_mask) = if config.generate_roads && buildings.len() >= 2 {
        let r = roads::build_roads(&buildings, ctx.development, topo, hydro, veg, &building_mask);
        (r.network, r.bridges, r.road_mask)
    } else {
        (RoadNetwork::default(), Vec::new(), vec![false; width * height])
    };

    // ── Enclosure walls ──────────────────────────────────────────────────
    let walls = build_walls(
        &buildings,
        ctx.development,
        seed,
        topo,
        hydro,
        veg,
        &building_mask,
        &road_mask,
    );

    // ── Tile assembly ────────────────────────────────────────────────────
    let mut tiles: Grid<StructureTile> = Grid::filled(width, height, StructureTile::default());

    for building in &buildings {
        for (x, y) in building.tiles() {
            *tiles.get_mut(x, y) = StructureTile {
                has_structure: true,
                structure: Some(StructureKind::Building(building.building_type)),
                condition: Some(building.condition),
                provides_cover: true,
                is_passable: false,
            };
        }
    }
    for (i, road) in road_mask.iter().enumerate() {
        if *road {
            *tiles.get_mut(i % width, i / width) = StructureTile {
                has_structure: true,
                structure: Some(StructureKind::Road),
                condition: None,
                provides_cover: false,
                is_passable: true,
            };
        }
    }
    for bridge in &bridges {
        let (x, y) = bridge.position;
        *tiles.get_mut(x, y) = StructureTile {
            has_structure: true,
            structure: Some(StructureKind::Bridge),
            condition: None,
            provides_cover: false,
            is_passable: true,
        };
    }
    for wall in &walls {
        for &(x, y) in &wall.points {
            *tiles.get_mut(x, y) = StructureTile {
                has_structure: true,
                structure: Some(StructureKind::Wall),
                condition: None,
                provides_cover: true,
                is_passable: false,
            };
        }
    }

    Ok(StructuresLayer { tiles, buildings, roads: road_network, bridges, walls })
}

/// Ring walls one tile out from a building footprint, where the ground
/// allows. Only settled developments bother with enclosures.
#[allow(clippy::too_many_arguments)]
fn build_walls(
    buildings: &[Building],
    development: Development,
    seed: u32,
    topo: &TopographyLayer,
    hydro: &HydrologyLayer,
    veg: &VegetationLayer,
    building_mask: &[bool],
    road_mask: &[bool],
) -> Vec<Wall> {
    if !matches!(development, Development::Settled | Development::Urban | Development::Ruins) {
        return Vec::new();
    }
    let width = topo.tiles.width();
    let height = topo.tiles.height();
    let mut rng = layer_rng(seed, WALL_SALT);
    let mut walls = Vec::new();
    let mut wall_mask = vec![false; width * height];

    for building in buildings {
        if !rng.gen_bool(WALL_CHANCE) {
            continue;
        }
        let (ox, oy) = building.origin;
        let (x0, y0) = (ox as isize - 1, oy as isize - 1);
        let (x1, y1) = ((ox + building.width) as isize, (oy + building.height) as isize);

        let mut points = Vec::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                let on_ring = x == x0 || x == x1 || y == y0 || y == y1;
                if !on_ring || x < 0 || y < 0 || x >= width as isize || y >= height as isize {
                    continue;
                }
                let (x, y) = (x as usize, y as usize);
                let i = y * width + x;
                if building_mask[i] || road_mask[i] || wall_mask[i] {
                    continue;
                }
                if hydro.tiles.get(x, y).water_depth > 0.0 || !veg.tiles.get(x, y).is_passable {
                    continue;
                }
                points.push((x, y));
            }
        }
        // A couple of orphan posts is not a wall.
        if points.len() >= 6 {
            for &(x, y) in &points {
                wall_mask[y * width + x] = true;
            }
            walls.push(Wall { points });
        }
    }
    walls
}
