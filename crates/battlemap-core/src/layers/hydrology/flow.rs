//! D8 flow direction and accumulation.
//!
//! Direction picks the steepest downslope among the eight neighbors
//! (orthogonal distance 1, diagonal √2); ties break on the lowest direction
//! code. Accumulation is a single descending-elevation sweep: every cell
//! contributes exactly once to its receiver, so no drainage path is ever
//! double-counted and the pass terminates on any finite grid.

use crate::grid::{D8_DISTANCE, D8_OFFSETS};
use crate::layers::topography::TopographyLayer;

use super::FLOW_SINK;

pub(super) fn compute_flow_directions(topo: &TopographyLayer) -> Vec<i8> {
    let w = topo.tiles.width();
    let h = topo.tiles.height();
    let mut directions = vec![FLOW_SINK; w * h];

    for (x, y) in topo.tiles.coords() {
        let here = topo.tiles.get(x, y).elevation;
        let mut best: Option<(f64, i8)> = None;

        for (code, (dx, dy)) in D8_OFFSETS.iter().enumerate() {
            let (nx, ny) = (x as isize + dx, y as isize + dy);
            if !topo.tiles.in_bounds(nx, ny) {
                continue;
            }
            let drop =
                (here - topo.tiles.get(nx as usize, ny as usize).elevation) / D8_DISTANCE[code];
            if drop > 0.0 && best.map_or(true, |(b, _)| drop > b) {
                best = Some((drop, code as i8));
            }
        }
        if let Some((_, code)) = best {
            directions[y * w + x] = code;
        }
    }
    directions
}

pub(super) fn compute_flow_accumulation(topo: &TopographyLayer, directions: &[i8]) -> Vec<u32> {
    let w = topo.tiles.width();
    let h = topo.tiles.height();
    let n = w * h;

    // Highest cells first; equal elevations order by index so the sweep
    // order is total. Receivers are strictly lower than donors, so every
    // donor is processed before its receiver.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_unstable_by(|&a, &b| {
        let ea = topo.tiles.as_slice()[a].elevation;
        let eb = topo.tiles.as_slice()[b].elevation;
        eb.total_cmp(&ea).then(a.cmp(&b))
    });

    let mut acc = vec![1u32; n];
    for &i in &order {
        let dir = directions[i];
        if dir < 0 {
            continue;
        }
        let (dx, dy) = D8_OFFSETS[dir as usize];
        let x = (i % w) as isize + dx;
        let y = (i / w) as isize + dy;
        let j = y as usize * w + x as usize;
        acc[j] += acc[i];
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::context::{Biome, Development, ElevationZone, Hydrology, Season, TacticalContext};
    use crate::grid::Grid;
    use crate::layers::geology::generate_geology;
    use crate::layers::topography::generate_topography;

    /// Hand-built topography with the given elevations.
    fn topo_from(elev: Grid<f64>) -> TopographyLayer {
        let ctx = TacticalContext {
            biome: Biome::Plains,
            elevation: ElevationZone::Lowland,
            hydrology: Hydrology::Stream,
            development: Development::Wilderness,
            season: Season::Summer,
        };
        let geo = generate_geology(elev.width(), elev.height(), &ctx, 1).unwrap();
        let mut topo =
            generate_topography(&geo, &ctx, 1, &GenerationConfig::default()).unwrap();
        // Overwrite elevations, keeping the classification fields irrelevant here.
        let w = elev.width();
        let tiles = Grid::from_fn(w, elev.height(), |x, y| {
            let mut t = topo.tiles.get(x, y).clone();
            t.elevation = *elev.get(x, y);
            t
        });
        topo.tiles = tiles;
        topo
    }

    #[test]
    fn ramp_drains_west() {
        // Elevation rises eastward, so everything west of x=0 flows W (code 6).
        let topo = topo_from(Grid::from_fn(12, 12, |x, _| x as f64 * 10.0));
        let dirs = compute_flow_directions(&topo);
        for y in 0..12 {
            for x in 1..12 {
                assert_eq!(dirs[y * 12 + x], 6, "({x},{y}) should flow west");
            }
            assert_eq!(dirs[y * 12], FLOW_SINK, "(0,{y}) should be a sink");
        }
    }

    #[test]
    fn diagonal_distance_weighting() {
        // Orthogonal drop 10, diagonal drop 14: diagonal rate 14/√2 ≈ 9.9 < 10,
        // so the orthogonal neighbor wins.
        let mut elev = Grid::filled(3, 3, 20.0f64);
        *elev.get_mut(1, 1) = 20.0;
        *elev.get_mut(1, 0) = 10.0; // N, drop 10, rate 10
        *elev.get_mut(2, 0) = 6.0; // NE, drop 14, rate ≈ 9.9
        let topo = topo_from(elev);
        let dirs = compute_flow_directions(&topo);
        assert_eq!(dirs[1 * 3 + 1], 0, "orthogonal neighbor should win on rate");
    }

    #[test]
    fn valley_accumulates_to_outlet() {
        // V-valley draining south along the center column.
        let w = 11usize;
        let h = 16usize;
        let center = 5isize;
        let topo = topo_from(Grid::from_fn(w, h, |x, y| {
            let wall = (x as isize - center).unsigned_abs() as f64 * 20.0;
            wall + (h - 1 - y) as f64 * 5.0
        }));
        let dirs = compute_flow_directions(&topo);
        let acc = compute_flow_accumulation(&topo, &dirs);

        // The outlet at the valley mouth drains every cell.
        let outlet = (h - 1) * w + center as usize;
        assert_eq!(acc[outlet] as usize, w * h, "outlet should drain the whole grid");
    }

    #[test]
    fn accumulation_conserves_mass() {
        let ctx = TacticalContext {
            biome: Biome::Mountain,
            elevation: ElevationZone::Highland,
            hydrology: Hydrology::Stream,
            development: Development::Wilderness,
            season: Season::Summer,
        };
        let geo = generate_geology(30, 30, &ctx, 77).unwrap();
        let topo = generate_topography(&geo, &ctx, 77, &GenerationConfig::default()).unwrap();
        let dirs = compute_flow_directions(&topo);
        let acc = compute_flow_accumulation(&topo, &dirs);

        // Sink accumulations sum to the grid size: every cell drains to
        // exactly one sink and is counted exactly once there.
        let sink_sum: u32 = (0..acc.len()).filter(|&i| dirs[i] < 0).map(|i| acc[i]).sum();
        assert_eq!(sink_sum as usize, 30 * 30);
        for &a in &acc {
            assert!(a >= 1);
        }
    }
}
