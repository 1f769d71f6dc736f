//! Hydrology layer: D8 flow routing → accumulation → springs → streams →
//! Strahler ordering → water depth and pools → moisture → segments.
//!
//! Sub-passes run in that order, each reading only the previous pass's
//! output. Stream-segment extraction iterates tiles in row-major order;
//! that ordering is part of the determinism contract.

mod flow;
mod moisture;
mod streams;

use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::context::TacticalContext;
use crate::error::{GenerationError, Result};
use crate::grid::Grid;
use crate::layers::geology::GeologyLayer;
use crate::layers::topography::TopographyLayer;

pub use moisture::Moisture;

/// Sink marker for `flow_direction`.
pub const FLOW_SINK: i8 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrologyTile {
    /// D8 direction code (0=N … 7=NW), or [`FLOW_SINK`].
    pub flow_direction: i8,
    /// Upstream cells draining through this tile, itself included. ≥ 1.
    pub flow_accumulation: u32,
    /// Feet of standing or flowing water.
    pub water_depth: f64,
    pub moisture: Moisture,
    pub is_spring: bool,
    pub is_stream: bool,
    pub is_pool: bool,
    /// Strahler order; 0 for non-stream tiles.
    pub stream_order: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spring {
    pub x: usize,
    pub y: usize,
}

/// A traced run of connected stream tiles, upstream first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSegment {
    pub points: Vec<(usize, usize)>,
    pub order: u8,
    /// Tiles wide: `⌈order / 2⌉`.
    pub width: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrologyLayer {
    pub tiles: Grid<HydrologyTile>,
    pub streams: Vec<StreamSegment>,
    pub springs: Vec<Spring>,
    /// Percentage of tiles with water_depth > 0.
    pub total_water_coverage: f64,
}

pub fn generate_hydrology(
    topo: &TopographyLayer,
    geology: &GeologyLayer,
    ctx: &TacticalContext,
    seed: u32,
    config: &GenerationConfig,
) -> Result<HydrologyLayer> {
    let width = topo.tiles.width();
    let height = topo.tiles.height();
    if geology.tiles.width() != width || geology.tiles.height() != height {
        return Err(GenerationError::dependency(
            "hydrology",
            format!(
                "geology grid {}×{} does not match topography {}×{}",
                geology.tiles.width(),
                geology.tiles.height(),
                width,
                height
            ),
        ));
    }

    // ── Flow routing ─────────────────────────────────────────────────────
    let directions = flow::compute_flow_directions(topo);
    let accumulation = flow::compute_flow_accumulation(topo, &directions);

    // ── Springs ──────────────────────────────────────────────────────────
    let springs = streams::place_springs(topo, geology, ctx, seed, config);

    // ── Streams and Strahler order ───────────────────────────────────────
    let stream_mask = if config.generate_rivers {
        streams::mark_streams(&accumulation, ctx, config)
    } else {
        vec![false; width * height]
    };
    let orders = streams::compute_strahler(&directions, &accumulation, &stream_mask, width, height);

    // ── Water depth, pools, moisture ─────────────────────────────────────
    let (water_depth, pool_mask) =
        moisture::compute_water_depth(topo, ctx, seed, config, &stream_mask, &orders);
    let moisture_levels = moisture::compute_moisture(geology, ctx, &accumulation, &water_depth);

    // ── Stream segments (row-major trace) ────────────────────────────────
    let streams =
        streams::extract_segments(&directions, &stream_mask, &orders, width, height);

    // ── Assemble ─────────────────────────────────────────────────────────
    let spring_mask = {
        let mut m = vec![false; width * height];
        for s in &springs {
            m[s.y * width + s.x] = true;
        }
        m
    };

    let tiles = Grid::from_fn(width, height, |x, y| {
        let i = y * width + x;
        HydrologyTile {
            flow_direction: directions[i],
            flow_accumulation: accumulation[i],
            water_depth: water_depth[i],
            moisture: moisture_levels[i],
            is_spring: spring_mask[i],
            is_stream: stream_mask[i],
            is_pool: pool_mask[i],
            stream_order: orders[i],
        }
    });

    let wet = water_depth.iter().filter(|&&d| d > 0.0).count();
    let total_water_coverage = 100.0 * wet as f64 / (width * height) as f64;

    Ok(HydrologyLayer { tiles, streams, springs, total_water_coverage })
}
