//! Springs, stream extraction, and Strahler ordering.

use rand::Rng;

use crate::config::GenerationConfig;
use crate::context::TacticalContext;
use crate::grid::D8_OFFSETS;
use crate::layers::geology::GeologyLayer;
use crate::layers::topography::TopographyLayer;
use crate::rng::tile_rng;

use super::{Spring, StreamSegment};

const SPRING_SALT: u64 = 0x5DC1_84B7_F309_2E6A;

/// Base chance threshold for a spring at a capable transition-zone tile.
const SPRING_THRESHOLD: f64 = 0.85;
/// Slope steeper than this adds a discharge bonus.
const SPRING_SLOPE_DEG: f64 = 15.0;
const SPRING_SLOPE_BONUS: f64 = 0.1;

/// Minimum traced length for a stream segment to be emitted.
const MIN_SEGMENT_LEN: usize = 3;

/// Springs rise where groundwater meets a formation contact: every
/// transition-zone tile whose rock can host springs rolls against the
/// (abundance-scaled) threshold. The roll is tile-seeded, so spring sites
/// depend only on the master seed and the tile position.
pub(super) fn place_springs(
    topo: &TopographyLayer,
    geology: &GeologyLayer,
    _ctx: &TacticalContext,
    seed: u32,
    config: &GenerationConfig,
) -> Vec<Spring> {
    let threshold = SPRING_THRESHOLD / config.water_abundance;

    let mut springs = Vec::new();
    for &(x, y) in &geology.transition_zones {
        if !geology.tiles.get(x, y).formation.can_host_springs() {
            continue;
        }
        let mut chance = tile_rng(seed, x, y, SPRING_SALT).gen::<f64>();
        if topo.tiles.get(x, y).slope > SPRING_SLOPE_DEG {
            chance += SPRING_SLOPE_BONUS;
        }
        if chance > threshold {
            springs.push(Spring { x, y });
        }
    }
    springs
}

/// A tile is a stream iff its accumulation clears the context threshold,
/// scaled inversely by water abundance.
pub(super) fn mark_streams(
    accumulation: &[u32],
    ctx: &TacticalContext,
    config: &GenerationConfig,
) -> Vec<bool> {
    let threshold = ctx.hydrology.stream_threshold() / config.water_abundance;
    accumulation.iter().map(|&a| (a as f64) >= threshold).collect()
}

/// Strahler order via one ascending-accumulation pass: sources first, so
/// every tile's tributaries are ordered before the tile itself. Order is
/// the max tributary order, +1 when two or more tributaries share that max.
pub(super) fn compute_strahler(
    directions: &[i8],
    accumulation: &[u32],
    stream_mask: &[bool],
    width: usize,
    height: usize,
) -> Vec<u8> {
    let n = width * height;

    let receiver = |i: usize| -> Option<usize> {
        let dir = directions[i];
        if dir < 0 {
            return None;
        }
        let (dx, dy) = D8_OFFSETS[dir as usize];
        let x = (i % width) as isize + dx;
        let y = (i / width) as isize + dy;
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            return None;
        }
        Some(y as usize * width + x as usize)
    };

    // Count stream donors per stream tile.
    let mut donors = vec![0u8; n];
    for i in 0..n {
        if !stream_mask[i] {
            continue;
        }
        if let Some(j) = receiver(i) {
            if stream_mask[j] {
                donors[j] = donors[j].saturating_add(1);
            }
        }
    }

    let mut sorted: Vec<usize> = (0..n).filter(|&i| stream_mask[i]).collect();
    sorted.sort_unstable_by_key(|&i| (accumulation[i], i));

    let mut orders = vec![0u8; n];
    let mut donor_max = vec![0u8; n];
    let mut donor_max_count = vec![0u8; n];

    for &i in &sorted {
        let order = if donors[i] == 0 {
            1
        } else if donor_max_count[i] >= 2 {
            donor_max[i].saturating_add(1)
        } else {
            donor_max[i].max(1)
        };
        orders[i] = order;

        if let Some(j) = receiver(i) {
            if stream_mask[j] {
                use std::cmp::Ordering;
                match order.cmp(&donor_max[j]) {
                    Ordering::Greater => {
                        donor_max[j] = order;
                        donor_max_count[j] = 1;
                    }
                    Ordering::Equal => {
                        donor_max_count[j] = donor_max_count[j].saturating_add(1);
                    }
                    Ordering::Less => {}
                }
            }
        }
    }
    orders
}

/// Trace stream tiles into polyline segments, upstream point first.
///
/// Tiles are scanned in row-major order and each is claimed by exactly one
/// segment; changing the scan order would silently renumber segments, so it
/// is fixed as part of the output contract.
pub(super) fn extract_segments(
    directions: &[i8],
    stream_mask: &[bool],
    orders: &[u8],
    width: usize,
    height: usize,
) -> Vec<StreamSegment> {
    let n = width * height;
    let mut visited = vec![false; n];
    let mut segments = Vec::new();

    let receiver = |i: usize| -> Option<usize> {
        let dir = directions[i];
        if dir < 0 {
            return None;
        }
        let (dx, dy) = D8_OFFSETS[dir as usize];
        let x = (i % width) as isize + dx;
        let y = (i / width) as isize + dy;
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            return None;
        }
        Some(y as usize * width + x as usize)
    };

    for start in 0..n {
        if !stream_mask[start] || visited[start] {
            continue;
        }
        let mut points = Vec::new();
        let mut order = 0u8;
        let mut cur = start;
        loop {
            visited[cur] = true;
            points.push((cur % width, cur / width));
            order = order.max(orders[cur]);
            match receiver(cur) {
                Some(next) if stream_mask[next] && !visited[next] => cur = next,
                _ => break,
            }
        }
        if points.len() >= MIN_SEGMENT_LEN {
            let width_tiles = (order as u32 + 1) / 2;
            segments.push(StreamSegment { points, order, width: width_tiles.max(1) });
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Strahler-3 confluence tree laid out on a 4×5 grid:
    /// two order-2 branches (each fed by two sources) meet at the outlet.
    #[test]
    fn strahler_explicit_topology() {
        let width = 5usize;
        let height = 4usize;
        let n = width * height;
        let idx = |x: usize, y: usize| y * width + x;

        let mut directions = vec![-1i8; n];
        let mut accumulation = vec![1u32; n];
        let stream = vec![true; n];

        // Sources (0,0)→SE, (1,0)→S meet at (1,1).
        directions[idx(0, 0)] = 3;
        directions[idx(1, 0)] = 4;
        // Sources (3,0)→S, (4,0)→SW meet at (3,1).
        directions[idx(3, 0)] = 4;
        directions[idx(4, 0)] = 5;
        // Branches run to (2,3).
        directions[idx(1, 1)] = 3; // → (2,2)
        directions[idx(3, 1)] = 5; // → (2,2)
        directions[idx(2, 2)] = 4; // → (2,3) outlet

        accumulation[idx(1, 1)] = 3;
        accumulation[idx(3, 1)] = 3;
        accumulation[idx(2, 2)] = 7;
        accumulation[idx(2, 3)] = 8;

        let orders = compute_strahler(&directions, &accumulation, &stream, width, height);
        assert_eq!(orders[idx(0, 0)], 1);
        assert_eq!(orders[idx(1, 1)], 2, "two order-1 tributaries make order 2");
        assert_eq!(orders[idx(3, 1)], 2);
        assert_eq!(orders[idx(2, 2)], 3, "two order-2 tributaries make order 3");
        assert_eq!(orders[idx(2, 3)], 3, "single order-3 tributary keeps order 3");
    }

    #[test]
    fn single_tributary_does_not_promote() {
        let width = 1usize;
        let height = 4usize;
        let directions = vec![4i8, 4, 4, -1];
        let accumulation = vec![1u32, 2, 3, 4];
        let stream = vec![true; 4];
        let orders = compute_strahler(&directions, &accumulation, &stream, width, height);
        assert_eq!(orders, vec![1, 1, 1, 1]);
    }

    #[test]
    fn segments_traced_in_row_major_order() {
        // One straight south-flowing channel in column 2 of a 5×6 grid.
        let width = 5usize;
        let height = 6usize;
        let n = width * height;
        let mut directions = vec![-1i8; n];
        let mut stream = vec![false; n];
        let mut orders = vec![0u8; n];
        for y in 0..height {
            let i = y * width + 2;
            stream[i] = true;
            orders[i] = 1;
            if y + 1 < height {
                directions[i] = 4; // S
            }
        }
        let segments = extract_segments(&directions, &stream, &orders, width, height);
        assert_eq!(segments.len(), 1);
        let seg = &segments[0];
        assert_eq!(seg.points.len(), height);
        assert_eq!(seg.points[0], (2, 0), "trace starts at the first row-major stream tile");
        assert_eq!(seg.points[height - 1], (2, height - 1));
        assert_eq!(seg.order, 1);
        assert_eq!(seg.width, 1);
    }

    #[test]
    fn short_runs_are_dropped() {
        let width = 5usize;
        let height = 5usize;
        let n = width * height;
        let mut directions = vec![-1i8; n];
        let mut stream = vec![false; n];
        let orders = vec![1u8; n];
        // Two isolated stream tiles.
        stream[6] = true;
        directions[6] = 2;
        stream[7] = true;
        let segments = extract_segments(&directions, &stream, &orders, width, height);
        assert!(segments.is_empty(), "2-tile run must not produce a segment");
    }

    #[test]
    fn segment_width_follows_order() {
        assert_eq!((1u32 + 1) / 2, 1);
        assert_eq!((3u32 + 1) / 2, 2);
        assert_eq!((5u32 + 1) / 2, 3);
    }
}
