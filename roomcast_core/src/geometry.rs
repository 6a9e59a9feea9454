//! Fixed room bounds and the small amount of angle/extent math shared by the
//! validator, the animation scheduler, and the swap manager.
//!
//! Room coordinates put the origin in the south-west floor corner: +X runs
//! across the room's width, +Z along its length, and +Y is up. Furniture is
//! floor-anchored, so poses only carry `(x, z, rotation)`.

use serde::{Deserialize, Serialize};

pub const ROOM_WIDTH: f32 = 5.0;
pub const ROOM_LENGTH: f32 = 8.0;
pub const ROOM_HEIGHT: f32 = 2.7;

/// Interior extents of the room in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomDimensions {
    pub width: f32,
    pub length: f32,
    pub height: f32,
}

impl Default for RoomDimensions {
    fn default() -> Self {
        Self {
            width: ROOM_WIDTH,
            length: ROOM_LENGTH,
            height: ROOM_HEIGHT,
        }
    }
}

impl RoomDimensions {
    /// Clamp a footprint center so the whole footprint stays inside the walls.
    /// A footprint wider than the room pins to the low edge.
    pub fn clamp_center(&self, x: f32, z: f32, width: f32, depth: f32) -> (f32, f32) {
        let half_w = width / 2.0;
        let half_d = depth / 2.0;
        (
            half_w.max(x.min(self.width - half_w)),
            half_d.max(z.min(self.length - half_d)),
        )
    }

    /// Clamp a point to the floor rectangle, ignoring any footprint.
    pub fn clamp_point(&self, x: f32, z: f32) -> (f32, f32) {
        (0.0_f32.max(x.min(self.width)), 0.0_f32.max(z.min(self.length)))
    }

    pub fn contains_footprint(&self, x: f32, z: f32, width: f32, depth: f32) -> bool {
        let half_w = width / 2.0;
        let half_d = depth / 2.0;
        x >= half_w && x <= self.width - half_w && z >= half_d && z <= self.length - half_d
    }

    pub fn fits(&self, width: f32, depth: f32, height: f32) -> bool {
        width <= self.width && depth <= self.length && height <= self.height
    }
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest rotation from `start` to `target`, in `(-180, 180]` degrees.
pub fn shortest_delta_degrees(start: f32, target: f32) -> f32 {
    let delta = (target - start).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-3
    }

    #[test]
    fn clamp_center_respects_half_extents() {
        let room = RoomDimensions::default();
        let (x, z) = room.clamp_center(10.0, -3.0, 2.2, 0.9);
        assert!(approx(x, 3.9), "x = {x}");
        assert!(approx(z, 0.45), "z = {z}");
        assert!(room.contains_footprint(x, z, 2.2, 0.9));
    }

    #[test]
    fn clamp_center_pins_oversized_footprint_without_panicking() {
        let room = RoomDimensions::default();
        let (x, _) = room.clamp_center(2.5, 4.0, 6.0, 1.0);
        assert!(approx(x, 3.0));
    }

    #[test]
    fn clamp_point_uses_bare_floor() {
        let room = RoomDimensions::default();
        assert_eq!(room.clamp_point(-1.0, 9.5), (0.0, 8.0));
        assert_eq!(room.clamp_point(2.0, 3.0), (2.0, 3.0));
    }

    #[test]
    fn normalize_wraps_negative_and_large_angles() {
        assert!(approx(normalize_degrees(-90.0), 270.0));
        assert!(approx(normalize_degrees(725.0), 5.0));
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-1e-9), 0.0);
        for raw in [-1080.5_f32, -45.0, 0.0, 33.3, 359.9, 1234.0] {
            let n = normalize_degrees(raw);
            assert!((0.0..360.0).contains(&n), "{raw} -> {n}");
            for k in [-3_i32, -1, 1, 2] {
                let shifted = normalize_degrees(raw + 360.0 * k as f32);
                assert!(approx(n, shifted) || approx((n - shifted).abs(), 360.0));
            }
        }
    }

    #[test]
    fn shortest_delta_takes_the_short_way_round() {
        assert!(approx(shortest_delta_degrees(350.0, 10.0), 20.0));
        assert!(approx(shortest_delta_degrees(10.0, 350.0), -20.0));
        assert!(approx(shortest_delta_degrees(0.0, 180.0), 180.0));
        assert!(approx(shortest_delta_degrees(90.0, 90.0), 0.0));
    }
}
