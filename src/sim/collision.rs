//! Collision primitives for circles and axis-aligned rectangles
//!
//! Pops are circles; terrain is rectangles. Everything here is pure geometry
//! so the engine and the perception code can share it.

use glam::Vec2;

/// Result of an overlap check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the shapes overlap
    pub hit: bool,
    /// Contact normal pointing from the second shape toward the first
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between two circles
pub fn circle_circle(a_pos: Vec2, a_radius: f32, b_pos: Vec2, b_radius: f32) -> CollisionResult {
    let delta = a_pos - b_pos;
    let dist_sq = delta.length_squared();
    let reach = a_radius + b_radius;

    if dist_sq >= reach * reach {
        return CollisionResult::miss();
    }

    let dist = dist_sq.sqrt();
    // Concentric circles: pick an arbitrary but stable axis
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::X };
    CollisionResult {
        hit: true,
        normal,
        penetration: reach - dist,
    }
}

/// Closest point on an axis-aligned rectangle to `p`
#[inline]
pub fn closest_point_on_rect(p: Vec2, center: Vec2, half_extents: Vec2) -> Vec2 {
    p.clamp(center - half_extents, center + half_extents)
}

/// Check overlap between a circle and an axis-aligned rectangle
///
/// The normal points from the rectangle toward the circle.
pub fn circle_rect(
    circle_pos: Vec2,
    radius: f32,
    rect_center: Vec2,
    half_extents: Vec2,
) -> CollisionResult {
    let closest = closest_point_on_rect(circle_pos, rect_center, half_extents);
    let delta = circle_pos - closest;
    let dist_sq = delta.length_squared();

    if dist_sq > 1e-12 {
        if dist_sq >= radius * radius {
            return CollisionResult::miss();
        }
        let dist = dist_sq.sqrt();
        return CollisionResult {
            hit: true,
            normal: delta / dist,
            penetration: radius - dist,
        };
    }

    // Circle center is inside the rectangle: push out through the nearest face
    let local = circle_pos - rect_center;
    let gap_x = half_extents.x - local.x.abs();
    let gap_y = half_extents.y - local.y.abs();
    let normal = if gap_x < gap_y {
        Vec2::new(local.x.signum(), 0.0)
    } else {
        Vec2::new(0.0, local.y.signum())
    };
    CollisionResult {
        hit: true,
        normal,
        penetration: gap_x.min(gap_y) + radius,
    }
}

/// Remove the velocity component heading into a surface (zero restitution)
#[inline]
pub fn cancel_normal_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    let into = velocity.dot(normal);
    if into < 0.0 {
        velocity - into * normal
    } else {
        velocity
    }
}

/// Segment/circle intersection
///
/// Returns the fraction `t` in [0, 1] along `from → to` of the first
/// contact. A segment starting inside the circle hits at `t = 0`.
pub fn ray_circle(from: Vec2, to: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let d = to - from;
    let f = from - center;
    let c = f.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let a = d.length_squared();
    if a < 1e-12 {
        return None;
    }
    let b = 2.0 * f.dot(d);
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }

    let t = (-b - disc.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Segment/rectangle intersection (slab test)
///
/// Returns the fraction `t` in [0, 1] of the first contact.
pub fn ray_rect(from: Vec2, to: Vec2, center: Vec2, half_extents: Vec2) -> Option<f32> {
    let d = to - from;
    let min = center - half_extents;
    let max = center + half_extents;

    let mut t_enter = 0.0_f32;
    let mut t_exit = 1.0_f32;

    for axis in 0..2 {
        let (o, dir, lo, hi) = (from[axis], d[axis], min[axis], max[axis]);
        if dir.abs() < 1e-9 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir;
        let mut t0 = (lo - o) * inv;
        let mut t1 = (hi - o) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    Some(t_enter)
}

/// Corners of an axis-aligned rectangle
pub fn rect_vertices(center: Vec2, half_extents: Vec2) -> [Vec2; 4] {
    let (hx, hy) = (half_extents.x, half_extents.y);
    [
        center + Vec2::new(-hx, -hy),
        center + Vec2::new(hx, -hy),
        center + Vec2::new(hx, hy),
        center + Vec2::new(-hx, hy),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_circle_overlap() {
        let result = circle_circle(Vec2::new(15.0, 0.0), 10.0, Vec2::ZERO, 10.0);
        assert!(result.hit);
        assert!((result.penetration - 5.0).abs() < 1e-5);
        assert!((result.normal - Vec2::X).length() < 1e-5);

        let result = circle_circle(Vec2::new(25.0, 0.0), 10.0, Vec2::ZERO, 10.0);
        assert!(!result.hit);
    }

    #[test]
    fn test_circle_rect_outside_and_inside() {
        let center = Vec2::ZERO;
        let half = Vec2::new(50.0, 10.0);

        // Touching the top face
        let result = circle_rect(Vec2::new(0.0, 15.0), 8.0, center, half);
        assert!(result.hit);
        assert!((result.normal - Vec2::Y).length() < 1e-5);
        assert!((result.penetration - 3.0).abs() < 1e-5);

        // Clear of the rectangle
        let result = circle_rect(Vec2::new(0.0, 30.0), 8.0, center, half);
        assert!(!result.hit);

        // Center inside, nearer the right face
        let result = circle_rect(Vec2::new(45.0, 0.0), 8.0, center, half);
        assert!(result.hit);
        assert!((result.normal - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn test_cancel_normal_velocity() {
        let v = cancel_normal_velocity(Vec2::new(3.0, -4.0), Vec2::Y);
        assert!((v - Vec2::new(3.0, 0.0)).length() < 1e-5);

        // Moving away is untouched
        let v = cancel_normal_velocity(Vec2::new(3.0, 4.0), Vec2::Y);
        assert!((v - Vec2::new(3.0, 4.0)).length() < 1e-5);
    }

    #[test]
    fn test_ray_circle() {
        let t = ray_circle(Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(50.0, 0.0), 10.0);
        assert!((t.unwrap() - 0.4).abs() < 1e-5);

        let t = ray_circle(Vec2::ZERO, Vec2::new(100.0, 0.0), Vec2::new(50.0, 30.0), 10.0);
        assert!(t.is_none());

        // Segment stops short
        let t = ray_circle(Vec2::ZERO, Vec2::new(30.0, 0.0), Vec2::new(50.0, 0.0), 10.0);
        assert!(t.is_none());
    }

    #[test]
    fn test_ray_rect() {
        let center = Vec2::new(50.0, 0.0);
        let half = Vec2::new(5.0, 40.0);

        let t = ray_rect(Vec2::ZERO, Vec2::new(100.0, 0.0), center, half);
        assert!((t.unwrap() - 0.45).abs() < 1e-5);

        // Passes above the wall
        let t = ray_rect(Vec2::new(0.0, 60.0), Vec2::new(100.0, 60.0), center, half);
        assert!(t.is_none());

        // Vertical segment parallel to the wall, left of it
        let t = ray_rect(Vec2::new(10.0, -100.0), Vec2::new(10.0, 100.0), center, half);
        assert!(t.is_none());
    }
}
