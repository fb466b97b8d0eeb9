//! Rotations around the X axis and the angular layout of revolutions.

use crate::geometry::point::Point;
use serde::{Deserialize, Serialize};

/// Fraction of a full turn swept by a revolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Portion {
    Sixth,
    Fifth,
    Quarter,
    Third,
    Half,
    Whole,
}

impl Portion {
    /// Total swept angle in degrees.
    pub fn angle(self) -> f64 {
        match self {
            Portion::Sixth => 60.0,
            Portion::Fifth => 72.0,
            Portion::Quarter => 90.0,
            Portion::Third => 120.0,
            Portion::Half => 180.0,
            Portion::Whole => 360.0,
        }
    }

    /// Angles (degrees) of the angular copies of the 2-D topology.
    ///
    /// For [`Portion::Whole`] the copies are cyclic: the last sector joins
    /// the last station back to the first one.
    pub fn stations(self) -> &'static [f64] {
        match self {
            Portion::Sixth => &[0.0, 30.0, 60.0],
            Portion::Fifth => &[0.0, 36.0, 72.0],
            Portion::Quarter => &[0.0, 45.0, 90.0],
            Portion::Third => &[0.0, 60.0, 120.0],
            Portion::Half => &[0.0, 45.0, 135.0, 180.0],
            Portion::Whole => &[45.0, 135.0, 225.0, 315.0],
        }
    }

    /// Multiplier of the o-grid segment count for each sector.
    pub fn sector_factors(self) -> &'static [u32] {
        match self {
            Portion::Half => &[1, 2, 1],
            Portion::Whole => &[2, 2, 2, 2],
            _ => &[1, 1],
        }
    }

    /// Number of sectors between stations.
    pub fn nb_sectors(self) -> usize {
        self.sector_factors().len()
    }

    pub fn is_cyclic(self) -> bool {
        self == Portion::Whole
    }

    /// `true` for stations whose o-grid trace vertices are pushed outward.
    pub fn is_scaled_station(self, station: usize) -> bool {
        match self {
            Portion::Half => station == 1 || station == 2,
            Portion::Whole => true,
            _ => station == 1,
        }
    }

    /// Radial scale applied to o-grid trace vertices on scaled stations.
    ///
    /// `ratio_ogrid = 0` keeps them on the trace radius; `1` moves them to the
    /// corner of the square (or pentagon-like cell for the narrow portions).
    pub fn ogrid_scale(self, ratio_ogrid: f64) -> f64 {
        let corner = match self {
            Portion::Fifth | Portion::Sixth => 1.148,
            _ => std::f64::consts::SQRT_2,
        };
        ratio_ogrid * (corner - 1.0) + 1.0
    }
}

/// Rotates `p` by `degrees` around the X axis (right-handed, Y toward Z).
pub fn rotate_x(p: Point, degrees: f64) -> Point {
    let (s, c) = degrees.to_radians().sin_cos();
    Point::new(p.x, p.y * c - p.z * s, p.y * s + p.z * c)
}

/// Scales the distance of `p` to the X axis by `factor`.
pub fn scale_from_axis(p: Point, factor: f64) -> Point {
    Point::new(p.x, p.y * factor, p.z * factor)
}

/// Distance from `p` to the X axis.
pub fn axis_distance(p: Point) -> f64 {
    (p.y * p.y + p.z * p.z).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turn_maps_y_to_z() {
        let p = rotate_x(Point::new(1.0, 2.0, 0.0), 90.0);
        assert!(p.is_near(Point::new(1.0, 0.0, 2.0), 1e-12));
    }

    #[test]
    fn stations_and_factors_agree() {
        for portion in [
            Portion::Sixth,
            Portion::Fifth,
            Portion::Quarter,
            Portion::Third,
            Portion::Half,
            Portion::Whole,
        ] {
            let expected = if portion.is_cyclic() {
                portion.stations().len()
            } else {
                portion.stations().len() - 1
            };
            assert_eq!(portion.nb_sectors(), expected, "{portion:?}");
        }
    }

    #[test]
    fn ogrid_scale_bounds() {
        assert_eq!(Portion::Quarter.ogrid_scale(0.0), 1.0);
        assert!((Portion::Quarter.ogrid_scale(1.0) - std::f64::consts::SQRT_2).abs() < 1e-12);
        assert!((Portion::Sixth.ogrid_scale(1.0) - 1.148).abs() < 1e-12);
    }
}
