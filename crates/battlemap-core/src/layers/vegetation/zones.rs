//! Vegetation zone partition.
//!
//! Every eligible tile gets a zone class from low-frequency noise weighted
//! by biome, moisture, slope, and elevation; contiguous same-class tiles
//! are then flood-filled into zones in row-major discovery order, which
//! fixes zone ids deterministically. Clearings are circular gaps punched
//! into forest zones.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::context::{Biome, ElevationZone, Hydrology, TacticalContext};
use crate::grid::{Grid, NEIGHBORS_4};
use crate::layers::hydrology::{HydrologyLayer, Moisture};
use crate::layers::topography::TopographyLayer;
use crate::rng::{layer_rng, tile_seed, ValueNoise};
use rand::rngs::StdRng;
use rand::SeedableRng;

const ZONE_NOISE_SALT: u32 = 0x64c8_f31b;
const SUBTYPE_SALT: u64 = 0xD5A0_47E2_1B8C_93F6;
const CLEARING_SALT: u64 = 0x2C71_B9D4_E680_5A13;

/// Weight below which a tile stays zoneless.
const ZONE_MIN_WEIGHT: f64 = 0.35;
/// Soil shallower than this is bare rock and carries no zone.
const BARE_SOIL_DEPTH: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForestKind {
    TemperateDeciduous,
    Coniferous,
    Mixed,
    Boreal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeadowKind {
    Wildflower,
    Grassland,
    Alpine,
    Wet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WetlandKind {
    Marsh,
    Swamp,
    Bog,
}

/// A vegetation zone's kind and sub-type, as one tagged value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Forest(ForestKind),
    Meadow(MeadowKind),
    Shrubland,
    Wetland(WetlandKind),
    AlpineMeadow,
    Grassland,
}

impl ZoneKind {
    pub fn is_forest(self) -> bool {
        matches!(self, ZoneKind::Forest(_))
    }

    pub fn is_wetland(self) -> bool {
        matches!(self, ZoneKind::Wetland(_))
    }

    /// Wet meadows and wetlands invert the usual dry-side density penalty.
    pub fn inverts_moisture_bias(self) -> bool {
        matches!(self, ZoneKind::Meadow(MeadowKind::Wet) | ZoneKind::Wetland(_))
    }
}

/// Pre-subtype zone class used during tile selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum ZoneClass {
    Forest,
    Meadow,
    Shrubland,
    Wetland,
    AlpineMeadow,
    Grassland,
}

const ZONE_CLASSES: [ZoneClass; 6] = [
    ZoneClass::Forest,
    ZoneClass::Meadow,
    ZoneClass::Shrubland,
    ZoneClass::Wetland,
    ZoneClass::AlpineMeadow,
    ZoneClass::Grassland,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VegetationZone {
    pub id: u32,
    pub kind: ZoneKind,
    /// Member tiles in row-major order.
    pub tiles: Vec<(usize, usize)>,
}

/// A circular gap inside a forest zone. Tiles under it carry only ground
/// cover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clearing {
    pub center: (usize, usize),
    pub radius: f64,
}

/// Biome weight table for each zone class.
fn biome_weight(class: ZoneClass, biome: Biome) -> f64 {
    match (class, biome) {
        (ZoneClass::Forest, Biome::Forest) => 1.2,
        (ZoneClass::Forest, Biome::Mountain) => 0.7,
        (ZoneClass::Forest, Biome::Swamp) => 0.6,
        (ZoneClass::Forest, Biome::Plains | Biome::Coastal) => 0.5,
        (ZoneClass::Forest, Biome::Desert) => 0.05,
        (ZoneClass::Forest, Biome::Underground) => 0.0,
        (ZoneClass::Meadow, Biome::Plains) => 0.9,
        (ZoneClass::Meadow, Biome::Desert) => 0.2,
        (ZoneClass::Meadow, Biome::Underground) => 0.05,
        (ZoneClass::Meadow, _) => 0.6,
        (ZoneClass::Shrubland, Biome::Desert) => 0.7,
        (ZoneClass::Shrubland, Biome::Underground) => 0.1,
        (ZoneClass::Shrubland, _) => 0.5,
        (ZoneClass::Wetland, Biome::Swamp) => 1.5,
        (ZoneClass::Wetland, Biome::Underground) => 0.2,
        (ZoneClass::Wetland, _) => 0.4,
        (ZoneClass::AlpineMeadow, _) => 1.0,
        (ZoneClass::Grassland, Biome::Plains) => 0.9,
        (ZoneClass::Grassland, Biome::Desert) => 0.3,
        (ZoneClass::Grassland, Biome::Underground) => 0.05,
        (ZoneClass::Grassland, _) => 0.6,
    }
}

struct ClassField {
    noise: [ValueNoise; 6],
}

impl ClassField {
    fn new(seed: u32) -> Self {
        Self {
            noise: std::array::from_fn(|i| {
                ValueNoise::new(seed ^ ZONE_NOISE_SALT ^ (i as u32 * 0x9e37), 0.06)
            }),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn class_weight(
    class: ZoneClass,
    noise: f64,
    ctx: &TacticalContext,
    config: &GenerationConfig,
    moisture: Moisture,
    slope: f64,
    relative_elevation: f64,
) -> f64 {
    let mut w = biome_weight(class, ctx.biome);

    match class {
        ZoneClass::Forest => {
            if !config.generate_forests {
                return 0.0;
            }
            if moisture >= Moisture::Moist {
                w *= 1.2;
            } else if moisture <= Moisture::Dry {
                w *= 0.3;
            }
            if slope > 25.0 {
                w *= 0.5;
            }
            if let Some(d) = &config.terrain_distribution {
                w *= 6.0 * d.forest;
            }
        }
        ZoneClass::Meadow | ZoneClass::Grassland => {
            if moisture <= Moisture::Dry {
                w *= 0.6;
            }
            if class == ZoneClass::Grassland {
                if let Some(d) = &config.terrain_distribution {
                    w *= 6.0 * d.grassland;
                }
            }
        }
        ZoneClass::Shrubland => {
            if slope > 20.0 {
                w *= 1.3;
            }
        }
        ZoneClass::Wetland => {
            let wet_context =
                ctx.biome == Biome::Swamp || ctx.hydrology == Hydrology::Wetland;
            if !wet_context && moisture < Moisture::Wet {
                return 0.0;
            }
            if let Some(d) = &config.terrain_distribution {
                w *= 6.0 * d.swamp;
            }
        }
        ZoneClass::AlpineMeadow => {
            let alpine = ctx.elevation == ElevationZone::Alpine
                || (ctx.elevation == ElevationZone::Highland && relative_elevation > 0.5);
            if !alpine {
                return 0.0;
            }
        }
    }

    w * (0.5 + noise)
}

/// Per-tile zone class, `None` for ineligible or too-sparse tiles.
pub(super) fn classify_tiles(
    hydro: &HydrologyLayer,
    topo: &TopographyLayer,
    soil_depth: &Grid<f64>,
    ctx: &TacticalContext,
    seed: u32,
    config: &GenerationConfig,
) -> Grid<Option<ZoneClass>> {
    let field = ClassField::new(seed);

    Grid::from_fn(topo.tiles.width(), topo.tiles.height(), |x, y| {
        // Water and bare rock carry no vegetation zone.
        if hydro.tiles.get(x, y).water_depth > 0.0 || *soil_depth.get(x, y) < BARE_SOIL_DEPTH {
            return None;
        }
        let t = topo.tiles.get(x, y);
        let moisture = hydro.tiles.get(x, y).moisture;

        let mut best: Option<(f64, ZoneClass)> = None;
        for (i, &class) in ZONE_CLASSES.iter().enumerate() {
            let n = field.noise[i].at(x as f64, y as f64);
            let w = class_weight(class, n, ctx, config, moisture, t.slope, t.relative_elevation);
            if w > ZONE_MIN_WEIGHT && best.map_or(true, |(b, _)| w > b) {
                best = Some((w, class));
            }
        }
        best.map(|(_, c)| c)
    })
}

fn pick_subtype(class: ZoneClass, ctx: &TacticalContext, rng: &mut StdRng) -> ZoneKind {
    match class {
        ZoneClass::Forest => {
            let kinds: &[ForestKind] = match (ctx.biome, ctx.elevation) {
                (Biome::Mountain, _) | (_, ElevationZone::Alpine) => {
                    &[ForestKind::Coniferous, ForestKind::Boreal]
                }
                (Biome::Forest, _) => {
                    &[ForestKind::TemperateDeciduous, ForestKind::Mixed, ForestKind::Coniferous]
                }
                (Biome::Swamp, _) => &[ForestKind::Mixed],
                _ => &[ForestKind::TemperateDeciduous, ForestKind::Mixed],
            };
            ZoneKind::Forest(kinds[rng.gen_range(0..kinds.len())])
        }
        ZoneClass::Meadow => {
            let kinds: &[MeadowKind] = match ctx.elevation {
                ElevationZone::Alpine => &[MeadowKind::Alpine],
                _ if ctx.hydrology == Hydrology::Wetland => &[MeadowKind::Wet],
                _ if ctx.biome == Biome::Desert => &[MeadowKind::Grassland],
                _ => &[MeadowKind::Wildflower, MeadowKind::Grassland],
            };
            ZoneKind::Meadow(kinds[rng.gen_range(0..kinds.len())])
        }
        ZoneClass::Shrubland => ZoneKind::Shrubland,
        ZoneClass::Wetland => {
            let kinds: &[WetlandKind] = match ctx.biome {
                Biome::Swamp => &[WetlandKind::Swamp, WetlandKind::Marsh],
                _ => &[WetlandKind::Marsh, WetlandKind::Bog],
            };
            ZoneKind::Wetland(kinds[rng.gen_range(0..kinds.len())])
        }
        ZoneClass::AlpineMeadow => ZoneKind::AlpineMeadow,
        ZoneClass::Grassland => ZoneKind::Grassland,
    }
}

/// Flood-fill same-class tiles (4-connected) into zones. Discovery order is
/// row-major, so zone ids are stable for a given class field.
pub(super) fn build_zones(
    classes: &Grid<Option<ZoneClass>>,
    ctx: &TacticalContext,
    seed: u32,
) -> (Vec<VegetationZone>, Grid<Option<u32>>) {
    let w = classes.width();
    let h = classes.height();
    let mut zone_of: Grid<Option<u32>> = Grid::filled(w, h, None);
    let mut zones = Vec::new();

    for (sx, sy) in classes.coords() {
        let Some(class) = *classes.get(sx, sy) else { continue };
        if zone_of.get(sx, sy).is_some() {
            continue;
        }

        let id = zones.len() as u32;
        let mut tiles = Vec::new();
        let mut stack = vec![(sx, sy)];
        *zone_of.get_mut(sx, sy) = Some(id);
        while let Some((x, y)) = stack.pop() {
            tiles.push((x, y));
            for (dx, dy) in NEIGHBORS_4 {
                let (nx, ny) = (x as isize + dx, y as isize + dy);
                if !classes.in_bounds(nx, ny) {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                if zone_of.get(nx, ny).is_none() && *classes.get(nx, ny) == Some(class) {
                    *zone_of.get_mut(nx, ny) = Some(id);
                    stack.push((nx, ny));
                }
            }
        }
        tiles.sort_unstable_by_key(|&(x, y)| (y, x));

        let mut rng = StdRng::seed_from_u64(tile_seed(seed, id as usize, 0, SUBTYPE_SALT));
        let kind = pick_subtype(class, ctx, &mut rng);
        zones.push(VegetationZone { id, kind, tiles });
    }

    (zones, zone_of)
}

/// Sample circular clearings inside large forest zones and return them with
/// the per-tile clearing mask.
pub(super) fn carve_clearings(
    zones: &[VegetationZone],
    width: usize,
    height: usize,
    seed: u32,
) -> (Vec<Clearing>, Vec<bool>) {
    let mut rng = layer_rng(seed, CLEARING_SALT);
    let mut clearings = Vec::new();
    let mut mask = vec![false; width * height];

    for zone in zones {
        if !zone.kind.is_forest() || zone.tiles.len() < 20 {
            continue;
        }
        let max_clearings = zone.tiles.len() / 40;
        let count = if max_clearings > 0 { rng.gen_range(0..=max_clearings) } else { 0 };
        for _ in 0..count {
            let center = zone.tiles[rng.gen_range(0..zone.tiles.len())];
            let radius = rng.gen_range(1.5..3.0);
            clearings.push(Clearing { center, radius });

            let r = radius.ceil() as isize;
            for dy in -r..=r {
                for dx in -r..=r {
                    let (nx, ny) = (center.0 as isize + dx, center.1 as isize + dy);
                    if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                        continue;
                    }
                    let dist = ((dx * dx + dy * dy) as f64).sqrt();
                    if dist <= radius {
                        mask[ny as usize * width + nx as usize] = true;
                    }
                }
            }
        }
    }
    (clearings, mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flood_fill_zones_are_disjoint_and_contiguous() {
        let classes = Grid::from_fn(8, 8, |x, _| {
            if x < 4 {
                Some(ZoneClass::Forest)
            } else {
                Some(ZoneClass::Grassland)
            }
        });
        let ctx = TacticalContext::from_seed(1);
        let (zones, zone_of) = build_zones(&classes, &ctx, 1);

        assert_eq!(zones.len(), 2);
        // Disjointness: each tile belongs to exactly one zone.
        let mut seen = vec![0u32; 64];
        for z in &zones {
            for &(x, y) in &z.tiles {
                seen[y * 8 + x] += 1;
                assert_eq!(*zone_of.get(x, y), Some(z.id));
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn zone_ids_follow_row_major_discovery() {
        let classes = Grid::from_fn(6, 2, |x, _| {
            if x < 3 {
                Some(ZoneClass::Meadow)
            } else {
                Some(ZoneClass::Shrubland)
            }
        });
        let ctx = TacticalContext::from_seed(2);
        let (zones, _) = build_zones(&classes, &ctx, 2);
        assert_eq!(zones[0].id, 0);
        assert!(matches!(zones[0].kind, ZoneKind::Meadow(_)));
        assert_eq!(zones[1].id, 1);
        assert_eq!(zones[1].kind, ZoneKind::Shrubland);
    }

    #[test]
    fn clearings_only_in_large_forest_zones() {
        let forest_tiles: Vec<(usize, usize)> =
            (0..10).flat_map(|y| (0..10).map(move |x| (x, y))).collect();
        let zones = vec![
            VegetationZone {
                id: 0,
                kind: ZoneKind::Forest(ForestKind::Mixed),
                tiles: forest_tiles,
            },
            VegetationZone { id: 1, kind: ZoneKind::Grassland, tiles: vec![(0, 11), (1, 11)] },
        ];
        // Whatever the roll, no clearing may land outside zone 0's bounding box.
        for seed in 0..20u32 {
            let (clearings, mask) = carve_clearings(&zones, 12, 12, seed);
            for c in &clearings {
                assert!(c.center.0 < 10 && c.center.1 < 10);
                assert!((1.5..3.0).contains(&c.radius));
            }
            if clearings.is_empty() {
                assert!(mask.iter().all(|&m| !m));
            }
        }
    }

    #[test]
    fn wetland_requires_wet_context_or_moisture() {
        let dry_plains = TacticalContext {
            biome: Biome::Plains,
            elevation: ElevationZone::Lowland,
            hydrology: Hydrology::Seasonal,
            development: crate::context::Development::Wilderness,
            season: crate::context::Season::Summer,
        };
        let w = class_weight(
            ZoneClass::Wetland,
            0.9,
            &dry_plains,
            &GenerationConfig::default(),
            Moisture::Moderate,
            2.0,
            0.0,
        );
        assert_eq!(w, 0.0);
    }

    #[test]
    fn forests_toggle_off() {
        let ctx = TacticalContext {
            biome: Biome::Forest,
            elevation: ElevationZone::Foothills,
            hydrology: Hydrology::Stream,
            development: crate::context::Development::Wilderness,
            season: crate::context::Season::Summer,
        };
        let mut cfg = GenerationConfig::default();
        cfg.generate_forests = false;
        let w = class_weight(ZoneClass::Forest, 0.9, &ctx, &cfg, Moisture::Moist, 2.0, 0.0);
        assert_eq!(w, 0.0);
    }
}
