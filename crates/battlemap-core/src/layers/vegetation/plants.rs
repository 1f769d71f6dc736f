//! Per-tile plant generation.
//!
//! Every tile draws its own RNG from `(master_seed, x, y, zone_id)`, so a
//! tile's plants depend on nothing but those four values — the property
//! that makes the per-tile loop safe to parallelize.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::context::Season;
use crate::layers::hydrology::Moisture;
use crate::rng::tile_seed;

use super::zones::{ForestKind, MeadowKind, WetlandKind, ZoneKind};

const PLANT_SALT: u64 = 0x91E4_C0B3_5D27_8A6F;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stratum {
    Tree,
    Shrub,
    Herb,
    GroundCover,
    Aquatic,
}

/// Species template: size band in feet, lifespan in years.
#[derive(Debug, Clone, Copy)]
pub struct SpeciesSpec {
    pub name: &'static str,
    pub max_age: f64,
    pub min_size: f64,
    pub max_size: f64,
    /// Relative size spread at a given age.
    pub variation: f64,
}

/// One stratum of a zone's planting profile.
#[derive(Debug, Clone, Copy)]
pub struct StratumSpec {
    pub stratum: Stratum,
    /// Expected plants per tile before modifiers.
    pub base_density: f64,
    pub species: &'static [SpeciesSpec],
}

const fn sp(
    name: &'static str,
    max_age: f64,
    min_size: f64,
    max_size: f64,
    variation: f64,
) -> SpeciesSpec {
    SpeciesSpec { name, max_age, min_size, max_size, variation }
}

const DECIDUOUS_TREES: &[SpeciesSpec] = &[
    sp("oak", 300.0, 15.0, 80.0, 0.25),
    sp("maple", 200.0, 12.0, 70.0, 0.25),
    sp("beech", 250.0, 15.0, 75.0, 0.2),
];
const CONIFER_TREES: &[SpeciesSpec] = &[
    sp("pine", 250.0, 20.0, 90.0, 0.2),
    sp("spruce", 300.0, 20.0, 100.0, 0.2),
    sp("fir", 280.0, 20.0, 95.0, 0.2),
];
const BOREAL_TREES: &[SpeciesSpec] = &[
    sp("black_spruce", 200.0, 15.0, 60.0, 0.2),
    sp("larch", 180.0, 15.0, 65.0, 0.2),
];
const MIXED_TREES: &[SpeciesSpec] = &[
    sp("oak", 300.0, 15.0, 80.0, 0.25),
    sp("pine", 250.0, 20.0, 90.0, 0.2),
    sp("birch", 120.0, 10.0, 60.0, 0.3),
];
const SWAMP_TREES: &[SpeciesSpec] = &[
    sp("bald_cypress", 400.0, 20.0, 85.0, 0.25),
    sp("willow", 100.0, 10.0, 50.0, 0.3),
];
const FOREST_SHRUBS: &[SpeciesSpec] = &[
    sp("hazel", 40.0, 3.0, 12.0, 0.3),
    sp("holly", 60.0, 3.0, 15.0, 0.3),
    sp("elderberry", 30.0, 3.0, 10.0, 0.3),
];
const DRY_SHRUBS: &[SpeciesSpec] = &[
    sp("sagebrush", 50.0, 1.5, 6.0, 0.35),
    sp("juniper_scrub", 80.0, 2.0, 8.0, 0.3),
    sp("gorse", 30.0, 1.5, 7.0, 0.3),
];
const HERBS: &[SpeciesSpec] = &[
    sp("fern", 10.0, 1.0, 4.0, 0.4),
    sp("wildflower", 3.0, 0.5, 2.5, 0.4),
    sp("thistle", 4.0, 1.0, 4.0, 0.4),
];
const GRASSES: &[SpeciesSpec] = &[
    sp("meadow_grass", 3.0, 0.5, 3.0, 0.4),
    sp("fescue", 4.0, 0.5, 2.0, 0.4),
    sp("moss", 20.0, 0.1, 0.5, 0.3),
];
const WETLAND_PLANTS: &[SpeciesSpec] = &[
    sp("cattail", 5.0, 3.0, 8.0, 0.3),
    sp("sedge", 6.0, 1.0, 4.0, 0.35),
    sp("reed", 4.0, 4.0, 10.0, 0.3),
];
const AQUATICS: &[SpeciesSpec] = &[
    sp("water_lily", 5.0, 0.3, 1.0, 0.3),
    sp("duckweed", 1.0, 0.1, 0.3, 0.2),
];
const ALPINE_HERBS: &[SpeciesSpec] = &[
    sp("alpine_aster", 5.0, 0.3, 1.5, 0.35),
    sp("cushion_plant", 30.0, 0.1, 0.8, 0.25),
];

impl ZoneKind {
    /// The planting profile this zone lays down, densest stratum first.
    pub fn strata(self) -> &'static [StratumSpec] {
        match self {
            ZoneKind::Forest(ForestKind::TemperateDeciduous) => &[
                StratumSpec { stratum: Stratum::Tree, base_density: 2.5, species: DECIDUOUS_TREES },
                StratumSpec { stratum: Stratum::Shrub, base_density: 1.2, species: FOREST_SHRUBS },
                StratumSpec { stratum: Stratum::Herb, base_density: 2.0, species: HERBS },
                StratumSpec { stratum: Stratum::GroundCover, base_density: 2.5, species: GRASSES },
            ],
            ZoneKind::Forest(ForestKind::Coniferous) => &[
                StratumSpec { stratum: Stratum::Tree, base_density: 2.5, species: CONIFER_TREES },
                StratumSpec { stratum: Stratum::Shrub, base_density: 1.0, species: FOREST_SHRUBS },
                StratumSpec { stratum: Stratum::Herb, base_density: 1.5, species: HERBS },
                StratumSpec { stratum: Stratum::GroundCover, base_density: 2.5, species: GRASSES },
            ],
            ZoneKind::Forest(ForestKind::Mixed) => &[
                StratumSpec { stratum: Stratum::Tree, base_density: 2.5, species: MIXED_TREES },
                StratumSpec { stratum: Stratum::Shrub, base_density: 1.2, species: FOREST_SHRUBS },
                StratumSpec { stratum: Stratum::Herb, base_density: 1.8, species: HERBS },
                StratumSpec { stratum: Stratum::GroundCover, base_density: 2.5, species: GRASSES },
            ],
            ZoneKind::Forest(ForestKind::Boreal) => &[
                StratumSpec { stratum: Stratum::Tree, base_density: 2.0, species: BOREAL_TREES },
                StratumSpec { stratum: Stratum::Shrub, base_density: 0.8, species: FOREST_SHRUBS },
                StratumSpec { stratum: Stratum::GroundCover, base_density: 3.0, species: GRASSES },
            ],
            ZoneKind::Meadow(kind) => match kind {
                MeadowKind::Alpine => &[
                    StratumSpec { stratum: Stratum::Herb, base_density: 2.0, species: ALPINE_HERBS },
                    StratumSpec { stratum: Stratum::GroundCover, base_density: 4.0, species: GRASSES },
                ],
                MeadowKind::Wet => &[
                    StratumSpec { stratum: Stratum::Herb, base_density: 3.0, species: WETLAND_PLANTS },
                    StratumSpec { stratum: Stratum::GroundCover, base_density: 4.0, species: GRASSES },
                ],
                _ => &[
                    StratumSpec { stratum: Stratum::Herb, base_density: 3.0, species: HERBS },
                    StratumSpec { stratum: Stratum::GroundCover, base_density: 5.0, species: GRASSES },
                ],
            },
            ZoneKind::Shrubland => &[
                StratumSpec { stratum: Stratum::Shrub, base_density: 2.5, species: DRY_SHRUBS },
                StratumSpec { stratum: Stratum::Herb, base_density: 1.0, species: HERBS },
                StratumSpec { stratum: Stratum::GroundCover, base_density: 2.0, species: GRASSES },
            ],
            ZoneKind::Wetland(kind) => match kind {
                WetlandKind::Swamp => &[
                    StratumSpec { stratum: Stratum::Tree, base_density: 1.2, species: SWAMP_TREES },
                    StratumSpec { stratum: Stratum::Herb, base_density: 2.5, species: WETLAND_PLANTS },
                    StratumSpec { stratum: Stratum::Aquatic, base_density: 1.5, species: AQUATICS },
                ],
                _ => &[
                    StratumSpec { stratum: Stratum::Herb, base_density: 3.0, species: WETLAND_PLANTS },
                    StratumSpec { stratum: Stratum::GroundCover, base_density: 2.0, species: GRASSES },
                    StratumSpec { stratum: Stratum::Aquatic, base_density: 1.0, species: AQUATICS },
                ],
            },
            ZoneKind::AlpineMeadow => &[
                StratumSpec { stratum: Stratum::Herb, base_density: 1.5, species: ALPINE_HERBS },
                StratumSpec { stratum: Stratum::GroundCover, base_density: 3.5, species: GRASSES },
            ],
            ZoneKind::Grassland => &[
                StratumSpec { stratum: Stratum::Herb, base_density: 1.0, species: HERBS },
                StratumSpec { stratum: Stratum::GroundCover, base_density: 5.0, species: GRASSES },
            ],
        }
    }
}

/// A single generated plant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    pub x: usize,
    pub y: usize,
    pub species: String,
    pub stratum: Stratum,
    /// Years.
    pub age: f64,
    /// Feet.
    pub height: f64,
    /// Feet.
    pub canopy_radius: f64,
    /// [0.6, 1.0].
    pub health: f64,
}

/// Environmental inputs to one tile's plant roll.
#[derive(Debug, Clone, Copy)]
pub(super) struct TileEnv {
    pub is_zone_edge: bool,
    pub slope_deg: f64,
    pub moisture: Moisture,
    pub is_clearing: bool,
}

/// Seasonal density factor per stratum: woody plants persist, the herb
/// layer dies back through autumn and winter.
fn season_density(season: Season, stratum: Stratum) -> f64 {
    match stratum {
        Stratum::Tree | Stratum::Shrub => 1.0,
        _ => match season {
            Season::Spring => 1.2,
            Season::Summer => 1.0,
            Season::Autumn => 0.8,
            Season::Winter => 0.5,
        },
    }
}

fn density_modifier(env: &TileEnv, kind: ZoneKind) -> f64 {
    let mut m = 1.0;
    if env.is_zone_edge {
        m *= 0.6;
    }
    if env.slope_deg > 20.0 {
        m *= 0.7;
    }
    let level = env.moisture.level();
    if kind.inverts_moisture_bias() {
        // Wet-adapted zones thin out when the ground dries.
        if level < 2 {
            m *= 0.4;
        } else if level > 4 {
            m *= 1.3;
        }
    } else {
        if level < 2 {
            m *= 0.5;
        } else if level > 4 {
            m *= 1.2;
        }
    }
    m
}

/// Generate the plants for one tile of a zone.
#[allow(clippy::too_many_arguments)]
pub(super) fn generate_plants_for_tile(
    kind: ZoneKind,
    master_seed: u32,
    x: usize,
    y: usize,
    zone_id: u32,
    env: &TileEnv,
    season: Season,
    vegetation_multiplier: f64,
) -> Vec<Plant> {
    let seed = tile_seed(master_seed, x, y, PLANT_SALT ^ zone_id as u64);
    let mut rng = StdRng::seed_from_u64(seed);
    let modifier = density_modifier(env, kind);

    let mut plants = Vec::new();
    for spec in kind.strata() {
        // Clearings keep only their ground cover.
        if env.is_clearing && spec.stratum != Stratum::GroundCover {
            continue;
        }
        let expected = spec.base_density
            * modifier
            * (0.7 + 0.6 * rng.gen::<f64>())
            * vegetation_multiplier
            * season_density(season, spec.stratum);
        let count = expected.floor() as usize;

        for _ in 0..count {
            let species = &spec.species[rng.gen_range(0..spec.species.len())];
            let age = rng.gen_range(species.max_age * 0.05..species.max_age);
            let maturity = (age / species.max_age).min(1.0);
            let spread = 1.0 - species.variation + 2.0 * species.variation * rng.gen::<f64>();
            let frac = (maturity * spread).clamp(0.0, 1.0);
            let height = species.min_size + frac * (species.max_size - species.min_size);
            let canopy_radius = match spec.stratum {
                Stratum::Tree => height * 0.25,
                Stratum::Shrub => height * 0.5,
                _ => height * 0.3,
            };
            plants.push(Plant {
                x,
                y,
                species: species.name.to_owned(),
                stratum: spec.stratum,
                age,
                height,
                canopy_radius,
                health: rng.gen_range(0.6..1.0),
            });
        }
    }
    plants
}
