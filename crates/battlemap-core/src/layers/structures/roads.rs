//! Road network: minimum spanning tree over buildings, rasterized with a
//! cost-weighted A*.
//!
//! Movement cost climbs with slope and vegetation, standing water is
//! impassable, and streams can be forded at a steep premium — each ford of
//! a second-order-or-better stream becomes a bridge.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::context::Development;
use crate::grid::{D8_DISTANCE, D8_OFFSETS};
use crate::layers::hydrology::HydrologyLayer;
use crate::layers::topography::{TopographyLayer, TILE_FEET};
use crate::layers::vegetation::{VegetationLayer, VegetationType};

use super::placement::Building;

const SLOPE_COST_PER_DEG: f64 = 0.15;
const DENSE_VEGETATION_COST: f64 = 3.0;
const LIGHT_VEGETATION_COST: f64 = 1.5;
const STREAM_FORD_COST: f64 = 8.0;

/// Stream order at or above which a crossing gets a bridge.
const BRIDGE_MIN_ORDER: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadKind {
    Path,
    Road,
    Street,
}

impl RoadKind {
    pub fn for_development(development: Development) -> Self {
        match development {
            Development::Urban => RoadKind::Street,
            Development::Settled | Development::Ruins => RoadKind::Road,
            _ => RoadKind::Path,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoadKind::Path => "path",
            RoadKind::Road => "road",
            RoadKind::Street => "street",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadSegment {
    pub points: Vec<(usize, usize)>,
    pub kind: RoadKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoadNetwork {
    pub segments: Vec<RoadSegment>,
    /// Feet of roadway across all segments.
    pub total_length: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeOrientation {
    NorthSouth,
    EastWest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeLocation {
    pub position: (usize, usize),
    pub orientation: BridgeOrientation,
    /// Tiles of water spanned.
    pub span: u32,
}

/// Per-tile traversal cost multiplier; `None` = impassable.
fn tile_cost(
    x: usize,
    y: usize,
    topo: &TopographyLayer,
    hydro: &HydrologyLayer,
    veg: &VegetationLayer,
    building_mask: &[bool],
) -> Option<f64> {
    let w = topo.tiles.width();
    if building_mask[y * w + x] {
        return None;
    }
    let h = hydro.tiles.get(x, y);
    let mut cost = 1.0 + topo.tiles.get(x, y).slope * SLOPE_COST_PER_DEG;
    if h.water_depth > 0.0 {
        if h.is_stream {
            cost += STREAM_FORD_COST;
        } else {
            return None; // pools and still water are not forded
        }
    }
    match veg.tiles.get(x, y).vegetation_type {
        VegetationType::DenseTrees => cost += DENSE_VEGETATION_COST,
        VegetationType::Shrubs | VegetationType::WetlandVegetation => {
            cost += LIGHT_VEGETATION_COST
        }
        _ => {}
    }
    Some(cost)
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    f_cost: f64,
    idx: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f_cost == other.f_cost && self.idx == other.idx
    }
}
impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    /// Min-heap on f-cost with index tiebreak, so expansion order (and
    /// therefore path shape) is fully deterministic.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_cost
            .total_cmp(&self.f_cost)
            .then_with(|| other.idx.cmp(&self.idx))
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cost-weighted A* from `start` to `goal` over D8 moves. Endpoints are
/// always enterable (they are building centers).
#[allow(clippy::too_many_arguments)]
fn a_star(
    start: (usize, usize),
    goal: (usize, usize),
    topo: &TopographyLayer,
    hydro: &HydrologyLayer,
    veg: &VegetationLayer,
    building_mask: &[bool],
) -> Option<Vec<(usize, usize)>> {
    let w = topo.tiles.width();
    let h = topo.tiles.height();
    let n = w * h;
    let start_i = start.1 * w + start.0;
    let goal_i = goal.1 * w + goal.0;

    let heuristic = |i: usize| {
        let dx = (i % w) as f64 - goal.0 as f64;
        let dy = (i / w) as f64 - goal.1 as f64;
        (dx * dx + dy * dy).sqrt()
    };

    let mut g_cost = vec![f64::INFINITY; n];
    let mut came_from = vec![usize::MAX; n];
    let mut open = BinaryHeap::new();
    g_cost[start_i] = 0.0;
    open.push(HeapEntry { f_cost: heuristic(start_i), idx: start_i });

    while let Some(HeapEntry { idx, .. }) = open.pop() {
        if idx == goal_i {
            let mut path = vec![(idx % w, idx / w)];
            let mut cur = idx;
            while came_from[cur] != usize::MAX {
                cur = came_from[cur];
                path.push((cur % w, cur / w));
            }
            path.reverse();
            return Some(path);
        }

        let (x, y) = (idx % w, idx / w);
        for (code, (dx, dy)) in D8_OFFSETS.iter().enumerate() {
            let (nx, ny) = (x as isize + dx, y as isize + dy);
            if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                continue;
            }
            let (nx, ny) = (nx as usize, ny as usize);
            let ni = ny * w + nx;

            let cost = if ni == goal_i || ni == start_i {
                Some(1.0)
            } else {
                tile_cost(nx, ny, topo, hydro, veg, building_mask)
            };
            let Some(cost) = cost else { continue };

            let tentative = g_cost[idx] + D8_DISTANCE[code] * cost;
            if tentative < g_cost[ni] {
                g_cost[ni] = tentative;
                came_from[ni] = idx;
                open.push(HeapEntry { f_cost: tentative + heuristic(ni), idx: ni });
            }
        }
    }
    None
}

/// Prim's MST over building centers, by Euclidean distance. Returns edges
/// as (building index, building index).
fn spanning_edges(buildings: &[Building]) -> Vec<(usize, usize)> {
    if buildings.len() < 2 {
        return Vec::new();
    }
    let dist = |a: usize, b: usize| {
        let (ax, ay) = buildings[a].center();
        let (bx, by) = buildings[b].center();
        let dx = ax as f64 - bx as f64;
        let dy = ay as f64 - by as f64;
        (dx * dx + dy * dy).sqrt()
    };

    let n = buildings.len();
    let mut in_tree = vec![false; n];
    let mut edges = Vec::with_capacity(n - 1);
    in_tree[0] = true;

    for _ in 1..n {
        let mut best: Option<(f64, usize, usize)> = None;
        for a in 0..n {
            if !in_tree[a] {
                continue;
            }
            for b in 0..n {
                if in_tree[b] {
                    continue;
                }
                let d = dist(a, b);
                if best.map_or(true, |(bd, _, _)| d < bd) {
                    best = Some((d, a, b));
                }
            }
        }
        if let Some((_, a, b)) = best {
            in_tree[b] = true;
            edges.push((a, b));
        }
    }
    edges
}

pub(super) struct RoadBuildResult {
    pub network: RoadNetwork,
    pub bridges: Vec<BridgeLocation>,
    /// Road tiles, excluding building and bridge tiles.
    pub road_mask: Vec<bool>,
}

/// Build the full road network between the placed buildings.
pub(super) fn build_roads(
    buildings: &[Building],
    development: Development,
    topo: &TopographyLayer,
    hydro: &HydrologyLayer,
    veg: &VegetationLayer,
    building_mask: &[bool],
) -> RoadBuildResult {
    let w = topo.tiles.width();
    let h = topo.tiles.height();
    let kind = RoadKind::for_development(development);

    let mut network = RoadNetwork::default();
    let mut bridges = Vec::new();
    let mut road_mask = vec![false; w * h];
    let mut bridge_mask = vec![false; w * h];

    for (a, b) in spanning_edges(buildings) {
        let Some(path) = a_star(
            buildings[a].center(),
            buildings[b].center(),
            topo,
            hydro,
            veg,
            building_mask,
        ) else {
            continue;
        };

        let mut points = Vec::with_capacity(path.len());
        for (i, &(x, y)) in path.iter().enumerate() {
            let idx = y * w + x;
            if building_mask[idx] {
                continue;
            }
            let tile = hydro.tiles.get(x, y);
            if tile.is_stream && tile.stream_order >= BRIDGE_MIN_ORDER && !bridge_mask[idx] {
                // Crossing direction decides the deck orientation.
                let (px, py) = if i > 0 { path[i - 1] } else { (x, y) };
                let orientation = if (x as isize - px as isize).abs()
                    >= (y as isize - py as isize).abs()
                {
                    BridgeOrientation::EastWest
                } else {
                    BridgeOrientation::NorthSouth
                };
                let span = (tile.stream_order as u32 + 1) / 2;
                bridges.push(BridgeLocation {
                    position: (x, y),
                    orientation,
                    span: span.max(1),
                });
                bridge_mask[idx] = true;
            } else if !road_mask[idx] && !bridge_mask[idx] {
                road_mask[idx] = true;
            }
            points.push((x, y));
        }

        if !points.is_empty() {
            network.total_length += points.len() as f64 * TILE_FEET;
            network.segments.push(RoadSegment { points, kind });
        }
    }

    RoadBuildResult { network, bridges, road_mask }
}
