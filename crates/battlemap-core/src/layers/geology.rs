//! Geology layer: rock formations, weathering, permeability.
//!
//! One or two formations are picked for the whole map from the rock types
//! the biome can supply; low-frequency noise then patches the secondary
//! formation into contiguous pockets. Everything downstream — erosion
//! susceptibility, spring hosting, soil depth — keys off the per-tile
//! formation.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::context::{Biome, ElevationZone, TacticalContext};
use crate::error::{GenerationError, Result};
use crate::grid::{Grid, NEIGHBORS_4};
use crate::rng::{layer_rng, tile_rng, ValueNoise};

const FORMATION_PICK_SALT: u64 = 0x6E0D_2A77_51C3_88B4;
const FORMATION_FIELD_SALT: u64 = 0x1F93_C5E8_0B64_72AD;
const FRACTURE_SALT: u64 = 0xB852_19F0_6D3E_47C1;
const SOIL_SALT: u64 = 0x43A7_E16B_92D8_5F0E;
const WEATHERING_SALT: u64 = 0x8C21_75D9_3EAF_604B;

/// Share of tiles assigned the secondary formation when one exists.
const SECONDARY_SHARE: f64 = 0.30;
/// Chance of the map getting a secondary formation at all.
const SECONDARY_CHANCE: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RockFormation {
    Carbonate,
    Granitic,
    Volcanic,
    Metamorphic,
    Clastic,
    Evaporite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permeability {
    Impermeable,
    Low,
    Medium,
    High,
}

/// Weathering products a formation can shed onto a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainFeature {
    Karst,
    Sinkhole,
    Cave,
    Tor,
    Dome,
    Talus,
    Scree,
    Outcrop,
    Boulders,
    Hoodoo,
    Gully,
    LavaTube,
    Columns,
    SaltPan,
}

impl TerrainFeature {
    /// Features that stand proud of the surface and shed their soil.
    pub fn is_positive_relief(self) -> bool {
        matches!(
            self,
            TerrainFeature::Tor
                | TerrainFeature::Dome
                | TerrainFeature::Outcrop
                | TerrainFeature::Boulders
                | TerrainFeature::Hoodoo
                | TerrainFeature::Columns
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TerrainFeature::Karst => "karst",
            TerrainFeature::Sinkhole => "sinkhole",
            TerrainFeature::Cave => "cave",
            TerrainFeature::Tor => "tor",
            TerrainFeature::Dome => "dome",
            TerrainFeature::Talus => "talus",
            TerrainFeature::Scree => "scree",
            TerrainFeature::Outcrop => "outcrop",
            TerrainFeature::Boulders => "boulders",
            TerrainFeature::Hoodoo => "hoodoo",
            TerrainFeature::Gully => "gully",
            TerrainFeature::LavaTube => "lava_tube",
            TerrainFeature::Columns => "columns",
            TerrainFeature::SaltPan => "salt_pan",
        }
    }
}

impl RockFormation {
    pub fn as_str(self) -> &'static str {
        match self {
            RockFormation::Carbonate => "carbonate",
            RockFormation::Granitic => "granitic",
            RockFormation::Volcanic => "volcanic",
            RockFormation::Metamorphic => "metamorphic",
            RockFormation::Clastic => "clastic",
            RockFormation::Evaporite => "evaporite",
        }
    }

    /// Mechanical hardness in [0, 1]; harder rock fractures more.
    pub fn hardness(self) -> f64 {
        match self {
            RockFormation::Granitic => 0.90,
            RockFormation::Metamorphic => 0.85,
            RockFormation::Volcanic => 0.70,
            RockFormation::Carbonate => 0.60,
            RockFormation::Clastic => 0.40,
            RockFormation::Evaporite => 0.30,
        }
    }

    /// Chemical/mechanical weathering rate in [0, 1]; drives soil depth.
    pub fn weathering_rate(self) -> f64 {
        match self {
            RockFormation::Evaporite => 0.90,
            RockFormation::Carbonate => 0.80,
            RockFormation::Clastic => 0.70,
            RockFormation::Volcanic => 0.50,
            RockFormation::Metamorphic => 0.40,
            RockFormation::Granitic => 0.30,
        }
    }

    /// Resistance to fluvial erosion in [0, 1].
    pub fn erosion_resistance(self) -> f64 {
        match self {
            RockFormation::Granitic => 0.85,
            RockFormation::Metamorphic => 0.80,
            RockFormation::Volcanic => 0.65,
            RockFormation::Carbonate => 0.50,
            RockFormation::Clastic => 0.35,
            RockFormation::Evaporite => 0.20,
        }
    }

    /// Strength of the geological texture this rock imprints on elevation.
    pub fn texture_intensity(self) -> f64 {
        match self {
            RockFormation::Carbonate => 0.8,
            RockFormation::Volcanic => 0.7,
            RockFormation::Granitic => 0.6,
            RockFormation::Metamorphic => 0.5,
            RockFormation::Clastic => 0.3,
            RockFormation::Evaporite => 0.2,
        }
    }

    pub fn permeability(self) -> Permeability {
        match self {
            RockFormation::Carbonate => Permeability::High,
            RockFormation::Evaporite => Permeability::High,
            RockFormation::Clastic => Permeability::Medium,
            RockFormation::Volcanic => Permeability::Medium,
            RockFormation::Granitic => Permeability::Low,
            RockFormation::Metamorphic => Permeability::Impermeable,
        }
    }

    /// Formations whose contact zones can discharge groundwater.
    pub fn can_host_springs(self) -> bool {
        matches!(
            self,
            RockFormation::Carbonate | RockFormation::Volcanic | RockFormation::Clastic
        )
    }

    pub fn weathering_products(self) -> &'static [TerrainFeature] {
        match self {
            RockFormation::Carbonate => {
                &[TerrainFeature::Karst, TerrainFeature::Sinkhole, TerrainFeature::Cave]
            }
            RockFormation::Granitic => {
                &[TerrainFeature::Tor, TerrainFeature::Dome, TerrainFeature::Boulders]
            }
            RockFormation::Volcanic => {
                &[TerrainFeature::LavaTube, TerrainFeature::Columns, TerrainFeature::Scree]
            }
            RockFormation::Metamorphic => {
                &[TerrainFeature::Outcrop, TerrainFeature::Talus, TerrainFeature::Scree]
            }
            RockFormation::Clastic => {
                &[TerrainFeature::Gully, TerrainFeature::Hoodoo, TerrainFeature::Boulders]
            }
            RockFormation::Evaporite => {
                &[TerrainFeature::SaltPan, TerrainFeature::Sinkhole]
            }
        }
    }
}

/// Rock types a context can supply. Mountain biomes and the alpine zone
/// share the orogenic set regardless of biome.
pub fn formations_for(biome: Biome, zone: ElevationZone) -> &'static [RockFormation] {
    if biome == Biome::Mountain || zone == ElevationZone::Alpine {
        return &[
            RockFormation::Carbonate,
            RockFormation::Granitic,
            RockFormation::Volcanic,
            RockFormation::Metamorphic,
        ];
    }
    match biome {
        Biome::Desert => &[RockFormation::Clastic, RockFormation::Evaporite, RockFormation::Volcanic],
        Biome::Swamp => &[RockFormation::Clastic, RockFormation::Carbonate],
        Biome::Forest => &[
            RockFormation::Clastic,
            RockFormation::Granitic,
            RockFormation::Metamorphic,
            RockFormation::Carbonate,
        ],
        Biome::Plains => &[RockFormation::Clastic, RockFormation::Carbonate, RockFormation::Evaporite],
        Biome::Coastal => &[RockFormation::Clastic, RockFormation::Carbonate, RockFormation::Volcanic],
        Biome::Underground => &[
            RockFormation::Carbonate,
            RockFormation::Granitic,
            RockFormation::Metamorphic,
        ],
        Biome::Mountain => unreachable!("handled above"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeologyTile {
    pub formation: RockFormation,
    /// Regolith depth in feet, [0, 10].
    pub soil_depth: f64,
    pub permeability: Permeability,
    pub features: Vec<TerrainFeature>,
    /// [0, 1].
    pub fracture_intensity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeologyLayer {
    pub tiles: Grid<GeologyTile>,
    pub primary_formation: RockFormation,
    pub secondary_formation: Option<RockFormation>,
    /// Tiles whose formation differs from at least one 4-neighbor.
    pub transition_zones: Vec<(usize, usize)>,
}

pub fn generate_geology(
    width: usize,
    height: usize,
    ctx: &TacticalContext,
    seed: u32,
) -> Result<GeologyLayer> {
    // ── Formation selection ──────────────────────────────────────────────
    let candidates = formations_for(ctx.biome, ctx.elevation);
    if candidates.is_empty() {
        return Err(GenerationError::configuration(format!(
            "biome {} supplies no rock types",
            ctx.biome.as_str()
        )));
    }

    let mut rng = layer_rng(seed, FORMATION_PICK_SALT);
    let primary_formation = *candidates
        .choose(&mut rng)
        .ok_or_else(|| GenerationError::configuration("empty formation candidate set"))?;

    let secondary_formation = if candidates.len() > 1 && rng.gen_bool(SECONDARY_CHANCE) {
        let others: Vec<RockFormation> =
            candidates.iter().copied().filter(|&f| f != primary_formation).collect();
        others.choose(&mut rng).copied()
    } else {
        None
    };

    // ── Per-tile fields ──────────────────────────────────────────────────
    let formation_noise = ValueNoise::new(seed ^ FORMATION_FIELD_SALT as u32, 0.07);
    let fracture_noise = ValueNoise::new(seed ^ FRACTURE_SALT as u32, 0.22);
    let soil_noise = ValueNoise::new(seed ^ SOIL_SALT as u32, 0.15);

    let tiles = Grid::from_fn(width, height, |x, y| {
        let (fx, fy) = (x as f64, y as f64);

        let formation = match secondary_formation {
            Some(secondary) if formation_noise.at(fx, fy) < SECONDARY_SHARE => secondary,
            _ => primary_formation,
        };

        let fracture_intensity =
            (fracture_noise.octaves(fx, fy, 2, 0.5) * formation.hardness()).clamp(0.0, 1.0);

        let mut soil_depth = formation.weathering_rate()
            * (1.0 - fracture_intensity)
            * soil_noise.at(fx, fy)
            * 10.0;

        let mut features = Vec::new();
        let mut trng = tile_rng(seed, x, y, WEATHERING_SALT);
        for &product in formation.weathering_products() {
            let chance = formation.weathering_rate() * fracture_intensity;
            if trng.gen::<f64>() < chance {
                features.push(product);
            }
        }
        if features.iter().any(|f| f.is_positive_relief()) {
            soil_depth = soil_depth.min(1.0);
        }

        GeologyTile {
            formation,
            soil_depth: soil_depth.clamp(0.0, 10.0),
            permeability: formation.permeability(),
            features,
            fracture_intensity,
        }
    });

    // ── Transition zones ─────────────────────────────────────────────────
    let mut transition_zones = Vec::new();
    for (x, y) in tiles.coords() {
        let here = tiles.get(x, y).formation;
        let boundary = NEIGHBORS_4.iter().any(|&(dx, dy)| {
            let (nx, ny) = (x as isize + dx, y as isize + dy);
            tiles.in_bounds(nx, ny) && tiles.get(nx as usize, ny as usize).formation != here
        });
        if boundary {
            transition_zones.push((x, y));
        }
    }

    Ok(GeologyLayer { tiles, primary_formation, secondary_formation, transition_zones })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Development, Hydrology, Season};

    fn ctx(biome: Biome, zone: ElevationZone) -> TacticalContext {
        TacticalContext {
            biome,
            elevation: zone,
            hydrology: Hydrology::Stream,
            development: Development::Wilderness,
            season: Season::Summer,
        }
    }

    #[test]
    fn formations_match_biome_tables() {
        let mountain = formations_for(Biome::Mountain, ElevationZone::Lowland);
        assert!(mountain.contains(&RockFormation::Granitic));
        assert!(!mountain.contains(&RockFormation::Evaporite));

        let desert = formations_for(Biome::Desert, ElevationZone::Lowland);
        assert!(desert.contains(&RockFormation::Evaporite));
        assert!(!desert.contains(&RockFormation::Granitic));

        // The alpine zone forces the orogenic set even for non-mountain biomes.
        let alpine_forest = formations_for(Biome::Forest, ElevationZone::Alpine);
        assert!(alpine_forest.contains(&RockFormation::Metamorphic));
        assert!(!alpine_forest.contains(&RockFormation::Clastic));
    }

    #[test]
    fn generation_is_deterministic() {
        let c = ctx(Biome::Forest, ElevationZone::Foothills);
        let a = generate_geology(24, 24, &c, 1234).unwrap();
        let b = generate_geology(24, 24, &c, 1234).unwrap();
        assert_eq!(a.primary_formation, b.primary_formation);
        assert_eq!(a.secondary_formation, b.secondary_formation);
        assert_eq!(a.transition_zones, b.transition_zones);
        for (x, y) in a.tiles.coords() {
            assert_eq!(a.tiles.get(x, y).formation, b.tiles.get(x, y).formation);
            assert_eq!(a.tiles.get(x, y).soil_depth, b.tiles.get(x, y).soil_depth);
        }
    }

    #[test]
    fn primary_formation_dominates() {
        let c = ctx(Biome::Forest, ElevationZone::Foothills);
        // Scan seeds until one yields a secondary formation.
        for seed in 0..200u32 {
            let layer = generate_geology(40, 40, &c, seed).unwrap();
            if layer.secondary_formation.is_some() {
                let primary_count = layer
                    .tiles
                    .iter()
                    .filter(|t| t.formation == layer.primary_formation)
                    .count();
                let share = primary_count as f64 / layer.tiles.len() as f64;
                assert!(share > 0.5, "primary share {share:.2} too low (seed {seed})");
                return;
            }
        }
        panic!("no seed in 0..200 produced a secondary formation");
    }

    #[test]
    fn transition_zones_are_real_boundaries() {
        let c = ctx(Biome::Mountain, ElevationZone::Highland);
        for seed in 0..50u32 {
            let layer = generate_geology(30, 30, &c, seed).unwrap();
            for &(x, y) in &layer.transition_zones {
                let here = layer.tiles.get(x, y).formation;
                let differs = NEIGHBORS_4.iter().any(|&(dx, dy)| {
                    let (nx, ny) = (x as isize + dx, y as isize + dy);
                    layer.tiles.in_bounds(nx, ny)
                        && layer.tiles.get(nx as usize, ny as usize).formation != here
                });
                assert!(differs, "({x},{y}) listed as transition but uniform");
            }
            if layer.secondary_formation.is_some() {
                assert!(!layer.transition_zones.is_empty());
            }
        }
    }

    #[test]
    fn positive_relief_caps_soil() {
        let c = ctx(Biome::Mountain, ElevationZone::Alpine);
        let layer = generate_geology(40, 40, &c, 777).unwrap();
        for t in layer.tiles.iter() {
            assert!((0.0..=10.0).contains(&t.soil_depth));
            if t.features.iter().any(|f| f.is_positive_relief()) {
                assert!(t.soil_depth <= 1.0, "positive relief with soil {}", t.soil_depth);
            }
        }
    }
}
