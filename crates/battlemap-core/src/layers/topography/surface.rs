//! Slope, aspect, and ridge/valley classification of the final surface.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;

use super::erosion::neighborhood_counts;
use super::TopographyTile;

/// Compass octant the surface faces, or flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aspect {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
    Flat,
}

impl Aspect {
    pub fn as_str(self) -> &'static str {
        match self {
            Aspect::N => "N",
            Aspect::Ne => "NE",
            Aspect::E => "E",
            Aspect::Se => "SE",
            Aspect::S => "S",
            Aspect::Sw => "SW",
            Aspect::W => "W",
            Aspect::Nw => "NW",
            Aspect::Flat => "FLAT",
        }
    }
}

/// Octant of `atan2(dy, dx)` with +x east and +y south:
/// 0° = E, 90° = S, 180° = W, 270° = N.
fn aspect_from_gradient(dx: f64, dy: f64) -> Aspect {
    if dx == 0.0 && dy == 0.0 {
        return Aspect::Flat;
    }
    let mut angle = dy.atan2(dx).to_degrees();
    if angle < 0.0 {
        angle += 360.0;
    }
    const SECTORS: [Aspect; 8] = [
        Aspect::E,
        Aspect::Se,
        Aspect::S,
        Aspect::Sw,
        Aspect::W,
        Aspect::Nw,
        Aspect::N,
        Aspect::Ne,
    ];
    let idx = (((angle + 22.5) / 45.0).floor() as usize) % 8;
    SECTORS[idx]
}

/// Classify the final elevation field. Returns the tile grid plus
/// (min elevation, max elevation, average slope).
pub(super) fn build_tiles(elev: &Grid<f64>) -> (Grid<TopographyTile>, f64, f64, f64) {
    let w = elev.width();
    let h = elev.height();

    let min = elev.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = elev.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    let mut slope_sum = 0.0f64;

    let tiles = Grid::from_fn(w, h, |x, y| {
        let east = *elev.get((x + 1).min(w - 1), y);
        let west = *elev.get(x.saturating_sub(1), y);
        let south = *elev.get(x, (y + 1).min(h - 1));
        let north = *elev.get(x, y.saturating_sub(1));

        let dx = (east - west) / 10.0;
        let dy = (south - north) / 10.0;
        let slope = (dx * dx + dy * dy).sqrt().atan().to_degrees();
        slope_sum += slope;

        let relative_elevation = if range > 0.0 {
            (2.0 * (elev.get(x, y) - min) / range - 1.0).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let (lower, higher) = neighborhood_counts(elev, x, y);
        let is_ridge = lower >= 6;
        let is_valley = higher >= 6;
        let is_drainage = is_valley || (slope > 30.0 && relative_elevation < -0.3);

        TopographyTile {
            elevation: *elev.get(x, y),
            slope,
            aspect: aspect_from_gradient(dx, dy),
            relative_elevation,
            is_ridge,
            is_valley,
            is_drainage,
        }
    });

    let average_slope = slope_sum / (w * h) as f64;
    (tiles, min, max, average_slope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_octants() {
        // East-rising ramp faces... gradient points east: dx > 0.
        assert_eq!(aspect_from_gradient(1.0, 0.0), Aspect::E);
        assert_eq!(aspect_from_gradient(1.0, 1.0), Aspect::Se);
        assert_eq!(aspect_from_gradient(0.0, 1.0), Aspect::S);
        assert_eq!(aspect_from_gradient(-1.0, 1.0), Aspect::Sw);
        assert_eq!(aspect_from_gradient(-1.0, 0.0), Aspect::W);
        assert_eq!(aspect_from_gradient(-1.0, -1.0), Aspect::Nw);
        assert_eq!(aspect_from_gradient(0.0, -1.0), Aspect::N);
        assert_eq!(aspect_from_gradient(1.0, -1.0), Aspect::Ne);
        assert_eq!(aspect_from_gradient(0.0, 0.0), Aspect::Flat);
    }

    #[test]
    fn flat_field_classifies_flat() {
        let elev = Grid::filled(12, 12, 5.0f64);
        let (tiles, min, max, avg_slope) = build_tiles(&elev);
        assert_eq!(min, 5.0);
        assert_eq!(max, 5.0);
        assert_eq!(avg_slope, 0.0);
        for t in tiles.iter() {
            assert_eq!(t.aspect, Aspect::Flat);
            assert_eq!(t.slope, 0.0);
            assert_eq!(t.relative_elevation, 0.0);
            assert!(!t.is_ridge && !t.is_valley && !t.is_drainage);
        }
    }

    #[test]
    fn single_peak_is_a_ridge() {
        let mut elev = Grid::filled(9, 9, 0.0f64);
        *elev.get_mut(4, 4) = 50.0;
        let (tiles, _, _, _) = build_tiles(&elev);
        assert!(tiles.get(4, 4).is_ridge);
        assert!(!tiles.get(4, 4).is_valley);
    }

    #[test]
    fn single_pit_is_a_valley_and_drainage() {
        let mut elev = Grid::filled(9, 9, 50.0f64);
        *elev.get_mut(4, 4) = 1.0;
        let (tiles, _, _, _) = build_tiles(&elev);
        assert!(tiles.get(4, 4).is_valley);
        assert!(tiles.get(4, 4).is_drainage);
    }

    #[test]
    fn ramp_slope_matches_gradient() {
        use approx::assert_relative_eq;

        // 3 ft rise per 5 ft tile eastward: dz/dx = 6/10.
        let elev = Grid::from_fn(16, 16, |x, _| x as f64 * 3.0);
        let (tiles, _, _, avg) = build_tiles(&elev);
        let expect = (0.6f64).atan().to_degrees();
        let t = tiles.get(8, 8);
        assert_relative_eq!(t.slope, expect, max_relative = 1e-12);
        assert_eq!(t.aspect, Aspect::E);
        // Edge columns see a halved gradient, so the mean sits just under
        // the interior slope.
        assert!(avg > expect * 0.8 && avg <= expect);
    }
}
