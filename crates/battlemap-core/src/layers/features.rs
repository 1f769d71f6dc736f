//! Features layer: hazards, resources, landmarks, and tactical features.
//!
//! One row-major walk over the grid. Each tile evaluates the four
//! categories in priority order — landmark > hazard > resource > tactical —
//! and keeps at most one feature. Rolls are tile-seeded, so a tile's
//! feature depends only on the master seed, its position, and the earlier
//! layers.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::context::TacticalContext;
use crate::error::{GenerationError, Result};
use crate::grid::{Grid, NEIGHBORS_4};
use crate::layers::geology::{GeologyLayer, TerrainFeature};
use crate::layers::hydrology::{HydrologyLayer, Moisture};
use crate::layers::structures::{StructureCondition, StructureKind, StructuresLayer};
use crate::layers::topography::TopographyLayer;
use crate::layers::vegetation::{VegetationLayer, VegetationType};
use crate::rng::tile_rng;

const FEATURE_SALT: u64 = 0x0F7C_92A5_D4E8_316B;

/// Chebyshev radius around a ruined building searched for battlefield
/// remains.
const BATTLEFIELD_RADIUS: isize = 3;
/// Fraction of the elevation span that counts as commanding high ground.
const HIGH_GROUND_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    // Hazards
    Quicksand,
    UnstableGround,
    PoisonPlants,
    AnimalDen,
    // Resources
    MedicinalHerbs,
    BerryBushes,
    FreshWater,
    MineralDeposit,
    // Landmarks
    AncientTree,
    StandingStones,
    CaveEntrance,
    BattlefieldRemains,
    // Tactical
    HighGround,
    ChokePoint,
    AmbushSite,
    VantagePoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    Hazard,
    Resource,
    Landmark,
    Tactical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardLevel {
    None,
    Minor,
    Moderate,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Obvious,
    Noticeable,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Avoid,
    Harvest,
    Investigate,
    Passive,
}

impl FeatureType {
    pub fn category(self) -> FeatureCategory {
        use FeatureType::*;
        match self {
            Quicksand | UnstableGround | PoisonPlants | AnimalDen => FeatureCategory::Hazard,
            MedicinalHerbs | BerryBushes | FreshWater | MineralDeposit => {
                FeatureCategory::Resource
            }
            AncientTree | StandingStones | CaveEntrance | BattlefieldRemains => {
                FeatureCategory::Landmark
            }
            HighGround | ChokePoint | AmbushSite | VantagePoint => FeatureCategory::Tactical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureType::Quicksand => "quicksand",
            FeatureType::UnstableGround => "unstable_ground",
            FeatureType::PoisonPlants => "poison_plants",
            FeatureType::AnimalDen => "animal_den",
            FeatureType::MedicinalHerbs => "medicinal_herbs",
            FeatureType::BerryBushes => "berry_bushes",
            FeatureType::FreshWater => "fresh_water",
            FeatureType::MineralDeposit => "mineral_deposit",
            FeatureType::AncientTree => "ancient_tree",
            FeatureType::StandingStones => "standing_stones",
            FeatureType::CaveEntrance => "cave_entrance",
            FeatureType::BattlefieldRemains => "battlefield_remains",
            FeatureType::HighGround => "high_ground",
            FeatureType::ChokePoint => "choke_point",
            FeatureType::AmbushSite => "ambush_site",
            FeatureType::VantagePoint => "vantage_point",
        }
    }

    pub fn hazard_level(self) -> HazardLevel {
        match self {
            FeatureType::Quicksand => HazardLevel::Severe,
            FeatureType::UnstableGround | FeatureType::AnimalDen => HazardLevel::Moderate,
            FeatureType::PoisonPlants => HazardLevel::Minor,
            _ => HazardLevel::None,
        }
    }

    pub fn visibility(self) -> Visibility {
        match self {
            FeatureType::Quicksand | FeatureType::AmbushSite | FeatureType::PoisonPlants => {
                Visibility::Hidden
            }
            FeatureType::AnimalDen
            | FeatureType::MedicinalHerbs
            | FeatureType::BerryBushes
            | FeatureType::MineralDeposit
            | FeatureType::UnstableGround => Visibility::Noticeable,
            _ => Visibility::Obvious,
        }
    }

    pub fn interaction(self) -> InteractionType {
        match self.category() {
            FeatureCategory::Hazard => InteractionType::Avoid,
            FeatureCategory::Resource => InteractionType::Harvest,
            FeatureCategory::Landmark => InteractionType::Investigate,
            FeatureCategory::Tactical => InteractionType::Passive,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FeatureType::Quicksand => "Waterlogged ground that swallows the unwary",
            FeatureType::UnstableGround => "Loose talus ready to slide",
            FeatureType::PoisonPlants => "Toxic undergrowth beneath the canopy",
            FeatureType::AnimalDen => "A den scraped into the rock",
            FeatureType::MedicinalHerbs => "Healing herbs growing in the open",
            FeatureType::BerryBushes => "Bushes heavy with edible berries",
            FeatureType::FreshWater => "Clean water welling from the rock",
            FeatureType::MineralDeposit => "Exposed ore veining through stone",
            FeatureType::AncientTree => "A tree old beyond reckoning",
            FeatureType::StandingStones => "Weathered stones raised by forgotten hands",
            FeatureType::CaveEntrance => "A dark opening into the hillside",
            FeatureType::BattlefieldRemains => "Rusted arms and old bones",
            FeatureType::HighGround => "Commanding elevation over the field",
            FeatureType::ChokePoint => "A narrow pass between obstacles",
            FeatureType::AmbushSite => "Concealment overlooking the road",
            FeatureType::VantagePoint => "A tower view across the map",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTile {
    pub has_feature: bool,
    pub feature: Option<FeatureType>,
    pub hazard_level: HazardLevel,
    /// [0, 1]; 0 for non-resources.
    pub resource_value: f64,
    pub visibility: Option<Visibility>,
    pub interaction: Option<InteractionType>,
    pub description: Option<String>,
}

impl Default for FeatureTile {
    fn default() -> Self {
        Self {
            has_feature: false,
            feature: None,
            hazard_level: HazardLevel::None,
            resource_value: 0.0,
            visibility: None,
            interaction: None,
            description: None,
        }
    }
}

/// A placed feature, for the per-category lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInstance {
    pub x: usize,
    pub y: usize,
    pub feature: FeatureType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesLayer {
    pub tiles: Grid<FeatureTile>,
    pub hazards: Vec<FeatureInstance>,
    pub resources: Vec<FeatureInstance>,
    pub landmarks: Vec<FeatureInstance>,
    pub tactical_features: Vec<FeatureInstance>,
    pub total_feature_count: usize,
}

struct Detector<'a> {
    geology: &'a GeologyLayer,
    topo: &'a TopographyLayer,
    hydro: &'a HydrologyLayer,
    veg: &'a VegetationLayer,
    structures: &'a StructuresLayer,
    clearing_mask: Vec<bool>,
    ruined_mask: Vec<bool>,
    road_mask: Vec<bool>,
    impassable_mask: Vec<bool>,
}

impl Detector<'_> {
    fn width(&self) -> usize {
        self.topo.tiles.width()
    }

    fn landmark(&self, x: usize, y: usize, rng: &mut StdRng) -> Option<FeatureType> {
        let w = self.width();
        if self.veg.tiles.get(x, y).vegetation_type == VegetationType::DenseTrees
            && rng.gen::<f64>() > 0.97
        {
            return Some(FeatureType::AncientTree);
        }
        if self.topo.tiles.get(x, y).is_ridge && rng.gen::<f64>() > 0.96 {
            return Some(FeatureType::StandingStones);
        }
        let geo = self.geology.tiles.get(x, y);
        let has_cave = geo
            .features
            .iter()
            .any(|f| matches!(f, TerrainFeature::Cave | TerrainFeature::LavaTube));
        if has_cave && self.topo.tiles.get(x, y).slope > 20.0 && rng.gen::<f64>() > 0.5 {
            return Some(FeatureType::CaveEntrance);
        }
        let near_ruin = (-BATTLEFIELD_RADIUS..=BATTLEFIELD_RADIUS).any(|dy| {
            (-BATTLEFIELD_RADIUS..=BATTLEFIELD_RADIUS).any(|dx| {
                let (nx, ny) = (x as isize + dx, y as isize + dy);
                nx >= 0
                    && ny >= 0
                    && (nx as usize) < w
                    && (ny as usize) < self.topo.tiles.height()
                    && self.ruined_mask[ny as usize * w + nx as usize]
            })
        });
        if near_ruin && rng.gen::<f64>() > 0.9 {
            return Some(FeatureType::BattlefieldRemains);
        }
        None
    }

    fn hazard(&self, x: usize, y: usize, rng: &mut StdRng) -> Option<FeatureType> {
        let topo = self.topo.tiles.get(x, y);
        let hydro = self.hydro.tiles.get(x, y);
        let geo = self.geology.tiles.get(x, y);

        if hydro.moisture == Moisture::Saturated
            && hydro.water_depth == 0.0
            && topo.slope < 5.0
            && rng.gen::<f64>() > 0.93
        {
            return Some(FeatureType::Quicksand);
        }
        let loose = geo
            .features
            .iter()
            .any(|f| matches!(f, TerrainFeature::Talus | TerrainFeature::Scree));
        if topo.slope > 50.0 && loose && rng.gen::<f64>() > 0.4 {
            return Some(FeatureType::UnstableGround);
        }
        if self.veg.tiles.get(x, y).vegetation_type == VegetationType::DenseTrees
            && rng.gen::<f64>() > 0.95
        {
            return Some(FeatureType::PoisonPlants);
        }
        if geo.features.contains(&TerrainFeature::Cave) && rng.gen::<f64>() > 0.9 {
            return Some(FeatureType::AnimalDen);
        }
        None
    }

    fn resource(&self, x: usize, y: usize, rng: &mut StdRng) -> Option<FeatureType> {
        let w = self.width();
        let h = self.topo.tiles.height();

        if self.hydro.tiles.get(x, y).is_spring {
            return Some(FeatureType::FreshWater);
        }
        if self.clearing_mask[y * w + x] && rng.gen::<f64>() > 0.85 {
            return Some(FeatureType::MedicinalHerbs);
        }
        // Forest edges: lighter growth adjacent to dense woodland.
        let veg_type = self.veg.tiles.get(x, y).vegetation_type;
        let edge_growth = matches!(
            veg_type,
            VegetationType::SparseTrees | VegetationType::Shrubs | VegetationType::TallGrass
        );
        if edge_growth {
            let by_dense = NEIGHBORS_4.iter().any(|&(dx, dy)| {
                let (nx, ny) = (x as isize + dx, y as isize + dy);
                nx >= 0
                    && ny >= 0
                    && (nx as usize) < w
                    && (ny as usize) < h
                    && self.veg.tiles.get(nx as usize, ny as usize).vegetation_type
                        == VegetationType::DenseTrees
            });
            if by_dense && rng.gen::<f64>() > 0.88 {
                return Some(FeatureType::BerryBushes);
            }
        }
        let geo = self.geology.tiles.get(x, y);
        if geo.soil_depth < 0.5 && !geo.features.is_empty() && rng.gen::<f64>() > 0.9 {
            return Some(FeatureType::MineralDeposit);
        }
        None
    }

    fn tactical(&self, x: usize, y: usize, _rng: &mut StdRng) -> Option<FeatureType> {
        let w = self.width();
        let h = self.topo.tiles.height();
        let topo = self.topo.tiles.get(x, y);

        if self.topo.max_elevation > 0.0
            && topo.elevation >= HIGH_GROUND_FRACTION * self.topo.max_elevation
        {
            return Some(FeatureType::HighGround);
        }
        if topo.is_valley {
            let blocked = NEIGHBORS_4
                .iter()
                .filter(|&&(dx, dy)| {
                    let (nx, ny) = (x as isize + dx, y as isize + dy);
                    nx >= 0
                        && ny >= 0
                        && (nx as usize) < w
                        && (ny as usize) < h
                        && self.impassable_mask[ny as usize * w + nx as usize]
                })
                .count();
            if blocked >= 2 {
                return Some(FeatureType::ChokePoint);
            }
        }
        if self.veg.tiles.get(x, y).provides_concealment {
            let by_road = NEIGHBORS_4.iter().any(|&(dx, dy)| {
                let (nx, ny) = (x as isize + dx, y as isize + dy);
                nx >= 0
                    && ny >= 0
                    && (nx as usize) < w
                    && (ny as usize) < h
                    && self.road_mask[ny as usize * w + nx as usize]
            });
            if by_road {
                return Some(FeatureType::AmbushSite);
            }
        }
        if let Some(StructureKind::Building(bt)) = self.structures.tiles.get(x, y).structure {
            if bt.is_tower() {
                return Some(FeatureType::VantagePoint);
            }
        }
        None
    }
}

pub fn generate_features(
    geology: &GeologyLayer,
    topo: &TopographyLayer,
    hydro: &HydrologyLayer,
    veg: &VegetationLayer,
    structures: &StructuresLayer,
    _ctx: &TacticalContext,
    seed: u32,
) -> Result<FeaturesLayer> {
    let width = topo.tiles.width();
    let height = topo.tiles.height();
    for (name, w, h) in [
        ("geology", geology.tiles.width(), geology.tiles.height()),
        ("hydrology", hydro.tiles.width(), hydro.tiles.height()),
        ("vegetation", veg.tiles.width(), veg.tiles.height()),
        ("structures", structures.tiles.width(), structures.tiles.height()),
    ] {
        if w != width || h != height {
            return Err(GenerationError::dependency(
                "features",
                format!("{name} grid {w}×{h} does not match topography {width}×{height}"),
            ));
        }
    }

    // Precomputed masks shared by every tile's detectors.
    let mut clearing_mask = vec![false; width * height];
    for c in &veg.clearings {
        let r = c.radius.ceil() as isize;
        for dy in -r..=r {
            for dx in -r..=r {
                let (nx, ny) = (c.center.0 as isize + dx, c.center.1 as isize + dy);
                if nx >= 0 && ny >= 0 && (nx as usize) < width && (ny as usize) < height {
                    let dist = ((dx * dx + dy * dy) as f64).sqrt();
                    if dist <= c.radius {
                        clearing_mask[ny as usize * width + nx as usize] = true;
                    }
                }
            }
        }
    }

    let mut ruined_mask = vec![false; width * height];
    for b in &structures.buildings {
        if b.condition == StructureCondition::Ruined {
            for (x, y) in b.tiles() {
                ruined_mask[y * width + x] = true;
            }
        }
    }

    let mut road_mask = vec![false; width * height];
    let mut impassable_mask = vec![false; width * height];
    for (x, y) in structures.tiles.coords() {
        let i = y * width + x;
        if matches!(
            structures.tiles.get(x, y).structure,
            Some(StructureKind::Road | StructureKind::Bridge)
        ) {
            road_mask[i] = true;
        }
        impassable_mask[i] = !veg.tiles.get(x, y).is_passable
            || !structures.tiles.get(x, y).is_passable
            || hydro.tiles.get(x, y).water_depth > 1.0;
    }

    let detector = Detector {
        geology,
        topo,
        hydro,
        veg,
        structures,
        clearing_mask,
        ruined_mask,
        road_mask,
        impassable_mask,
    };

    // ── Row-major walk, priority landmark > hazard > resource > tactical ─
    let mut hazards = Vec::new();
    let mut resources = Vec::new();
    let mut landmarks = Vec::new();
    let mut tactical_features = Vec::new();

    let tiles = Grid::from_fn(width, height, |x, y| {
        let mut rng = tile_rng(seed, x, y, FEATURE_SALT);
        let feature = detector
            .landmark(x, y, &mut rng)
            .or_else(|| detector.hazard(x, y, &mut rng))
            .or_else(|| detector.resource(x, y, &mut rng))
            .or_else(|| detector.tactical(x, y, &mut rng));

        let Some(feature) = feature else {
            return FeatureTile::default();
        };

        let instance = FeatureInstance { x, y, feature };
        match feature.category() {
            FeatureCategory::Hazard => hazards.push(instance),
            FeatureCategory::Resource => resources.push(instance),
            FeatureCategory::Landmark => landmarks.push(instance),
            FeatureCategory::Tactical => tactical_features.push(instance),
        }

        let resource_value = if feature.category() == FeatureCategory::Resource {
            0.3 + 0.7 * rng.gen::<f64>()
        } else {
            0.0
        };

        FeatureTile {
            has_feature: true,
            feature: Some(feature),
            hazard_level: feature.hazard_level(),
            resource_value,
            visibility: Some(feature.visibility()),
            interaction: Some(feature.interaction()),
            description: Some(feature.description().to_owned()),
        }
    });

    let total_feature_count =
        hazards.len() + resources.len() + landmarks.len() + tactical_features.len();

    Ok(FeaturesLayer { tiles, hazards, resources, landmarks, tactical_features, total_feature_count })
}
