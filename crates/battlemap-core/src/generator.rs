//! Pipeline orchestrator: runs the six layers in order and assembles the
//! final map.
//!
//! The orchestrator owns every layer output; layers receive read-only
//! borrows of their upstream inputs and nothing is mutated after emission.
//! Either a complete [`GeneratedMap`] comes back or a typed error — no
//! partial progress is observable.

use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::context::TacticalContext;
use crate::error::{GenerationError, Result};
use crate::layers::features::{generate_features, FeaturesLayer};
use crate::layers::geology::{generate_geology, GeologyLayer};
use crate::layers::hydrology::{generate_hydrology, HydrologyLayer};
use crate::layers::structures::{generate_structures, StructuresLayer};
use crate::layers::topography::{generate_topography, TopographyLayer};
use crate::layers::vegetation::{generate_vegetation, VegetationLayer, VegetationType};
use crate::seed::{validate_seed, MapSeed};

pub const MIN_DIMENSION: usize = 10;
pub const MAX_DIMENSION: usize = 100;

fn default_cell_size() -> f64 {
    5.0
}

fn default_name() -> String {
    "Untitled Battlemap".to_owned()
}

/// Caller-facing generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSettings {
    #[serde(default = "default_name")]
    pub name: String,
    pub width: usize,
    pub height: usize,
    /// Feet per tile; informational, carried through to the output.
    #[serde(default = "default_cell_size")]
    pub cell_size: f64,
    pub seed: MapSeed,
    /// Explicit tactical context; derived from the seed when absent.
    #[serde(default)]
    pub context: Option<TacticalContext>,
    #[serde(default)]
    pub config: GenerationConfig,
}

/// All six layer outputs plus the resolved context and seed. The flattened
/// [`GeneratedMap`] is built from this; callers that need layer internals
/// (statistics, zone lists, road networks) use it directly.
#[derive(Debug, Clone)]
pub struct LayerStack {
    pub seed: u32,
    pub context: TacticalContext,
    pub geology: GeologyLayer,
    pub topography: TopographyLayer,
    pub hydrology: HydrologyLayer,
    pub vegetation: VegetationLayer,
    pub structures: StructuresLayer,
    pub features: FeaturesLayer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMetadata {
    pub biome: String,
    pub elevation: String,
    pub hydrology: String,
    pub development: String,
    pub season: String,
}

/// Aggregate statistics lifted off the layer outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapStats {
    pub min_elevation: f64,
    pub max_elevation: f64,
    pub average_slope: f64,
    pub total_water_coverage: f64,
    pub total_tree_count: u32,
    pub average_canopy_coverage: f64,
    pub building_count: usize,
    pub road_length_ft: f64,
    pub total_feature_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapTile {
    pub x: usize,
    pub y: usize,
    pub terrain: String,
    pub elevation: f64,
    pub features: Vec<String>,
}

/// The serialization contract: flattened row-major tiles plus a header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedMap {
    pub id: String,
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub cell_size: f64,
    pub seed: u32,
    pub metadata: MapMetadata,
    pub stats: MapStats,
    pub tiles: Vec<MapTile>,
}

fn validate_settings(settings: &MapSettings) -> Result<()> {
    for (name, v) in [("width", settings.width), ("height", settings.height)] {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&v) {
            return Err(GenerationError::validation(format!(
                "{name} must be in [{MIN_DIMENSION}, {MAX_DIMENSION}], got {v}"
            )));
        }
    }
    settings.config.validate()?;
    let seed_check = validate_seed(&settings.seed);
    if !seed_check.valid {
        return Err(GenerationError::validation(
            seed_check.error.unwrap_or_else(|| "invalid seed".to_owned()),
        ));
    }
    Ok(())
}

/// Run the full pipeline and return every layer output.
pub fn generate_layers(settings: &MapSettings) -> Result<LayerStack> {
    validate_settings(settings)?;

    let seed = settings.seed.normalize();
    let context = match settings.context {
        Some(ctx) => {
            ctx.validate()?;
            ctx
        }
        None => TacticalContext::from_seed(seed),
    };
    let config = &settings.config;
    let (w, h) = (settings.width, settings.height);

    // ── 0. Geology ───────────────────────────────────────────────────────
    let geology = generate_geology(w, h, &context, seed)
        .map_err(|e| GenerationError::in_layer("geology", e))?;

    // ── 1. Topography ────────────────────────────────────────────────────
    let topography = generate_topography(&geology, &context, seed, config)
        .map_err(|e| GenerationError::in_layer("topography", e))?;

    // ── 2. Hydrology ─────────────────────────────────────────────────────
    let hydrology = generate_hydrology(&topography, &geology, &context, seed, config)
        .map_err(|e| GenerationError::in_layer("hydrology", e))?;

    // ── 3. Vegetation ────────────────────────────────────────────────────
    let vegetation =
        generate_vegetation(&hydrology, &topography, &geology, &context, seed, config)
            .map_err(|e| GenerationError::in_layer("vegetation", e))?;

    // ── 4. Structures ────────────────────────────────────────────────────
    let structures =
        generate_structures(&vegetation, &hydrology, &topography, &context, seed, config)
            .map_err(|e| GenerationError::in_layer("structures", e))?;

    // ── 5. Features ──────────────────────────────────────────────────────
    let features = generate_features(
        &geology,
        &topography,
        &hydrology,
        &vegetation,
        &structures,
        &context,
        seed,
    )
    .map_err(|e| GenerationError::in_layer("features", e))?;

    Ok(LayerStack {
        seed,
        context,
        geology,
        topography,
        hydrology,
        vegetation,
        structures,
        features,
    })
}

/// Run the full pipeline and flatten the result into the wire shape.
pub fn generate(settings: &MapSettings) -> Result<GeneratedMap> {
    let stack = generate_layers(settings)?;
    Ok(assemble(settings, &stack))
}

/// Dominant terrain string for one tile, from vegetation, water depth, and
/// rock exposure.
fn terrain_for(stack: &LayerStack, x: usize, y: usize) -> &'static str {
    let water_depth = stack.hydrology.tiles.get(x, y).water_depth;
    if water_depth > 0.0 {
        return "water";
    }
    let veg = stack.vegetation.tiles.get(x, y).vegetation_type;
    if veg == VegetationType::WetlandVegetation {
        return "swamp";
    }
    let geo = stack.geology.tiles.get(x, y);
    let topo = stack.topography.tiles.get(x, y);
    if geo.soil_depth < 0.2 || topo.slope > 35.0 {
        return "mountain";
    }
    if matches!(veg, VegetationType::DenseTrees | VegetationType::SparseTrees) {
        return "forest";
    }
    if stack.context.biome == crate::context::Biome::Desert
        && matches!(veg, VegetationType::None | VegetationType::ShortGrass)
    {
        return "desert";
    }
    "grassland"
}

/// Feature strings for one tile: vegetation type, structure type, gameplay
/// feature, and cover class.
fn tile_features(stack: &LayerStack, x: usize, y: usize) -> Vec<String> {
    let mut out = Vec::new();

    let veg = stack.vegetation.tiles.get(x, y);
    if veg.vegetation_type != VegetationType::None {
        out.push(veg.vegetation_type.as_str().to_owned());
    }

    let structure = stack.structures.tiles.get(x, y);
    if let Some(kind) = structure.structure {
        out.push(kind.as_str().to_owned());
    }

    if let Some(feature) = stack.features.tiles.get(x, y).feature {
        out.push(feature.as_str().to_owned());
    }

    let full_cover =
        structure.provides_cover || veg.vegetation_type == VegetationType::DenseTrees;
    if full_cover {
        out.push("cover_full".to_owned());
    } else if veg.provides_cover {
        out.push("cover_partial".to_owned());
    } else if veg.provides_concealment {
        out.push("concealment".to_owned());
    }

    out
}

fn assemble(settings: &MapSettings, stack: &LayerStack) -> GeneratedMap {
    let (w, h) = (settings.width, settings.height);
    let ctx = &stack.context;

    let mut tiles = Vec::with_capacity(w * h);
    for y in 0..h {
        for x in 0..w {
            tiles.push(MapTile {
                x,
                y,
                terrain: terrain_for(stack, x, y).to_owned(),
                elevation: stack.topography.tiles.get(x, y).elevation,
                features: tile_features(stack, x, y),
            });
        }
    }

    GeneratedMap {
        id: format!("map-{:08x}-{w}x{h}", stack.seed),
        name: settings.name.clone(),
        width: w,
        height: h,
        cell_size: settings.cell_size,
        seed: stack.seed,
        metadata: MapMetadata {
            biome: ctx.biome.as_str().to_owned(),
            elevation: ctx.elevation.as_str().to_owned(),
            hydrology: ctx.hydrology.as_str().to_owned(),
            development: ctx.development.as_str().to_owned(),
            season: ctx.season.as_str().to_owned(),
        },
        stats: MapStats {
            min_elevation: stack.topography.min_elevation,
            max_elevation: stack.topography.max_elevation,
            average_slope: stack.topography.average_slope,
            total_water_coverage: stack.hydrology.total_water_coverage,
            total_tree_count: stack.vegetation.total_tree_count,
            average_canopy_coverage: stack.vegetation.average_canopy_coverage,
            building_count: stack.structures.buildings.len(),
            road_length_ft: stack.structures.roads.total_length,
            total_feature_count: stack.features.total_feature_count,
        },
        tiles,
    }
}
