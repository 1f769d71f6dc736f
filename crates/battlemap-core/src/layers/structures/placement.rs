//! Building site selection.
//!
//! Each candidate tile gets a suitability score; candidates are taken best
//! first with a minimum-spacing rejection pass, so the result looks like a
//! Poisson-disk scatter biased toward good ground.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::context::{Biome, Development};
use crate::layers::hydrology::HydrologyLayer;
use crate::layers::topography::TopographyLayer;
use crate::layers::vegetation::VegetationLayer;

/// Candidates below this score are never built on.
pub(super) const SUITABILITY_THRESHOLD: f64 = 0.4;
/// Steeper ground than this is penalized.
const STEEP_SLOPE_DEG: f64 = 15.0;
/// Search radius (tiles) for the flat-ground-near-water bonus.
const WATER_PROXIMITY: isize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    House,
    Cottage,
    Hut,
    Barn,
    Shed,
    Tower,
    Watchtower,
    Temple,
    Warehouse,
}

impl BuildingType {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildingType::House => "house",
            BuildingType::Cottage => "cottage",
            BuildingType::Hut => "hut",
            BuildingType::Barn => "barn",
            BuildingType::Shed => "shed",
            BuildingType::Tower => "tower",
            BuildingType::Watchtower => "watchtower",
            BuildingType::Temple => "temple",
            BuildingType::Warehouse => "warehouse",
        }
    }

    /// Footprint in tiles, (width, height).
    pub fn footprint(self) -> (usize, usize) {
        match self {
            BuildingType::Hut | BuildingType::Shed => (1, 1),
            BuildingType::Cottage | BuildingType::Watchtower => (1, 2),
            BuildingType::House | BuildingType::Tower => (2, 2),
            BuildingType::Barn | BuildingType::Warehouse => (2, 3),
            BuildingType::Temple => (3, 3),
        }
    }

    /// Towers and watchtowers grant overwatch; see the features layer.
    pub fn is_tower(self) -> bool {
        matches!(self, BuildingType::Tower | BuildingType::Watchtower)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureCondition {
    Pristine,
    Good,
    Weathered,
    Damaged,
    Ruined,
}

impl StructureCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            StructureCondition::Pristine => "pristine",
            StructureCondition::Good => "good",
            StructureCondition::Weathered => "weathered",
            StructureCondition::Damaged => "damaged",
            StructureCondition::Ruined => "ruined",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: u32,
    pub building_type: BuildingType,
    /// Top-left tile of the footprint.
    pub origin: (usize, usize),
    pub width: usize,
    pub height: usize,
    pub condition: StructureCondition,
}

impl Building {
    pub fn center(&self) -> (usize, usize) {
        (self.origin.0 + self.width / 2, self.origin.1 + self.height / 2)
    }

    pub fn tiles(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (ox, oy) = self.origin;
        (0..self.height).flat_map(move |dy| (0..self.width).map(move |dx| (ox + dx, oy + dy)))
    }
}

/// Maximum buildings attempted per development level.
pub(super) fn building_budget(development: Development) -> usize {
    match development {
        Development::Wilderness => 0,
        Development::Frontier => 1,
        Development::Rural => 2,
        Development::Settled | Development::Ruins => 10,
        Development::Urban => 30,
    }
}

/// Minimum center-to-center spacing between buildings, in tiles.
pub(super) fn min_building_spacing(development: Development) -> f64 {
    match development {
        Development::Urban => 2.0,
        Development::Settled | Development::Ruins => 3.0,
        _ => 5.0,
    }
}

pub(super) fn building_types_for(
    biome: Biome,
    development: Development,
) -> &'static [BuildingType] {
    match development {
        Development::Frontier => &[BuildingType::Hut, BuildingType::Watchtower, BuildingType::Shed],
        Development::Rural => &[BuildingType::Cottage, BuildingType::Barn, BuildingType::Shed],
        Development::Urban => &[
            BuildingType::House,
            BuildingType::Warehouse,
            BuildingType::Temple,
            BuildingType::Tower,
        ],
        _ => match biome {
            Biome::Mountain => {
                &[BuildingType::Watchtower, BuildingType::Cottage, BuildingType::Tower]
            }
            Biome::Swamp => &[BuildingType::Hut, BuildingType::Shed],
            _ => &[
                BuildingType::House,
                BuildingType::Cottage,
                BuildingType::Barn,
                BuildingType::Temple,
            ],
        },
    }
}

/// Condition distribution by development. Ruins always read ruined.
pub(super) fn roll_condition(development: Development, rng: &mut StdRng) -> StructureCondition {
    if development == Development::Ruins {
        return StructureCondition::Ruined;
    }
    let table: &[(StructureCondition, f64)] = match development {
        Development::Urban => &[
            (StructureCondition::Pristine, 0.40),
            (StructureCondition::Good, 0.40),
            (StructureCondition::Weathered, 0.15),
            (StructureCondition::Damaged, 0.05),
        ],
        Development::Settled => &[
            (StructureCondition::Pristine, 0.15),
            (StructureCondition::Good, 0.50),
            (StructureCondition::Weathered, 0.30),
            (StructureCondition::Damaged, 0.05),
        ],
        _ => &[
            (StructureCondition::Good, 0.20),
            (StructureCondition::Weathered, 0.50),
            (StructureCondition::Damaged, 0.30),
        ],
    };
    let mut roll = rng.gen::<f64>();
    for &(condition, p) in table {
        if roll < p {
            return condition;
        }
        roll -= p;
    }
    table[table.len() - 1].0
}

/// Suitability of a single tile as a building site.
pub(super) fn suitability(
    x: usize,
    y: usize,
    topo: &TopographyLayer,
    hydro: &HydrologyLayer,
    veg: &VegetationLayer,
    road_mask: Option<&[bool]>,
) -> f64 {
    let t = topo.tiles.get(x, y);
    let h = hydro.tiles.get(x, y);
    let mut score = 1.0;

    if h.water_depth > 0.0 {
        score -= 1.0;
    }
    if !veg.tiles.get(x, y).is_passable {
        score -= 0.5;
    }
    if t.slope > STEEP_SLOPE_DEG {
        score -= 0.4;
    }

    // Flat ground near (but not on) water is prime real estate.
    if h.water_depth == 0.0 && t.slope < 5.0 {
        let w = hydro.tiles.width() as isize;
        let hh = hydro.tiles.height() as isize;
        let near_water = (-WATER_PROXIMITY..=WATER_PROXIMITY).any(|dy| {
            (-WATER_PROXIMITY..=WATER_PROXIMITY).any(|dx| {
                let (nx, ny) = (x as isize + dx, y as isize + dy);
                nx >= 0
                    && ny >= 0
                    && nx < w
                    && ny < hh
                    && hydro.tiles.get(nx as usize, ny as usize).water_depth > 0.0
            })
        });
        if near_water {
            score += 0.3;
        }
    }

    if let Some(mask) = road_mask {
        let w = hydro.tiles.width() as isize;
        let hh = hydro.tiles.height() as isize;
        let near_road = (-1isize..=1).any(|dy| {
            (-1isize..=1).any(|dx| {
                let (nx, ny) = (x as isize + dx, y as isize + dy);
                nx >= 0
                    && ny >= 0
                    && nx < w
                    && ny < hh
                    && mask[ny as usize * w as usize + nx as usize]
            })
        });
        if near_road {
            score += 0.25;
        }
    }

    score
}

/// Whether a footprint tile can carry a building.
pub(super) fn footprint_tile_ok(
    x: usize,
    y: usize,
    topo: &TopographyLayer,
    hydro: &HydrologyLayer,
    veg: &VegetationLayer,
) -> bool {
    hydro.tiles.get(x, y).water_depth == 0.0
        && veg.tiles.get(x, y).is_passable
        && topo.tiles.get(x, y).slope <= 20.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn budgets_follow_development() {
        assert_eq!(building_budget(Development::Wilderness), 0);
        assert_eq!(building_budget(Development::Frontier), 1);
        assert_eq!(building_budget(Development::Rural), 2);
        assert_eq!(building_budget(Development::Settled), 10);
        assert_eq!(building_budget(Development::Urban), 30);
        assert_eq!(building_budget(Development::Ruins), building_budget(Development::Settled));
    }

    #[test]
    fn ruins_always_ruined() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(
                roll_condition(Development::Ruins, &mut rng),
                StructureCondition::Ruined
            );
        }
    }

    #[test]
    fn urban_skews_pristine() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut pristine_or_good = 0;
        const N: usize = 500;
        for _ in 0..N {
            let c = roll_condition(Development::Urban, &mut rng);
            assert_ne!(c, StructureCondition::Ruined);
            if c <= StructureCondition::Good {
                pristine_or_good += 1;
            }
        }
        assert!(pristine_or_good > N / 2, "only {pristine_or_good}/{N} pristine/good");
    }

    #[test]
    fn building_tiles_cover_footprint() {
        let b = Building {
            id: 0,
            building_type: BuildingType::Barn,
            origin: (3, 4),
            width: 2,
            height: 3,
            condition: StructureCondition::Good,
        };
        let tiles: Vec<_> = b.tiles().collect();
        assert_eq!(tiles.len(), 6);
        assert!(tiles.contains(&(3, 4)));
        assert!(tiles.contains(&(4, 6)));
        assert_eq!(b.center(), (4, 5));
    }

    #[test]
    fn every_development_has_building_types() {
        for dev in Development::ALL {
            if dev == Development::Wilderness {
                continue;
            }
            for biome in Biome::ALL {
                assert!(
                    !building_types_for(biome, dev).is_empty(),
                    "{biome:?}/{dev:?} has no building types"
                );
            }
        }
    }
}
