//! Small geometric helpers used by the normal and angle queries.
//!
//! All functions work on `f32` `cgmath` types, the types the mesh stores its
//! coordinates in.

use cgmath::{prelude::*, Point3, Vector3};
use num_traits::Zero;


/// Squared length below which a vector is treated as zero.
const ZERO_LEN_SQ: f32 = 1.0e-35;

/// Returns `v` scaled to unit length, or the zero vector if `v` is (almost)
/// zero.
pub fn normalize_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    let len_sq = v.magnitude2();
    if len_sq > ZERO_LEN_SQ {
        v / len_sq.sqrt()
    } else {
        Vector3::zero()
    }
}

/// Unit normal of the triangle `a`, `b`, `c` (counter-clockwise winding).
pub fn tri_normal(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Vector3<f32> {
    normalize_or_zero((a - b).cross(b - c))
}

/// Unit normal of the quad `a`, `b`, `c`, `d`, computed from its diagonals.
/// Gives a sensible result for non-planar quads as well.
pub fn quad_normal(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>, d: Point3<f32>) -> Vector3<f32> {
    normalize_or_zero((a - c).cross(b - d))
}

/// Non-normalized normal of a polygon via Newell's method. Its length is
/// twice the area of the (planar) polygon.
pub fn poly_normal_unnormalized(points: impl IntoIterator<Item = Point3<f32>>) -> Vector3<f32> {
    let mut points = points.into_iter();
    let first = match points.next() {
        Some(p) => p,
        None => return Vector3::zero(),
    };

    let mut n = Vector3::zero();
    let mut prev = first;
    for cur in points.chain(Some(first)) {
        n.x += (prev.y - cur.y) * (prev.z + cur.z);
        n.y += (prev.z - cur.z) * (prev.x + cur.x);
        n.z += (prev.x - cur.x) * (prev.y + cur.y);
        prev = cur;
    }

    n
}

/// Unit normal of a polygon via Newell's method.
pub fn poly_normal(points: impl IntoIterator<Item = Point3<f32>>) -> Vector3<f32> {
    normalize_or_zero(poly_normal_unnormalized(points))
}

/// Returns `true` if the directions `a` and `b` are (almost) parallel.
///
/// `eps_sq` is compared against the squared sine of the angle, scaled by the
/// squared lengths, so the test is independent of the vector lengths.
pub fn is_colinear(a: Vector3<f32>, b: Vector3<f32>, eps_sq: f32) -> bool {
    let dot = a.dot(b);
    let len_sq = a.magnitude2() * b.magnitude2();
    if len_sq <= ZERO_LEN_SQ {
        return true;
    }

    // `1 - cos²`
    1.0 - (dot * dot) / len_sq < eps_sq
}

/// Angle between two unit vectors. Numerically stable for small and for
/// almost opposite angles.
pub fn angle_normalized(a: Vector3<f32>, b: Vector3<f32>) -> f32 {
    use std::f32::consts::PI;

    if a.dot(b) >= 0.0 {
        2.0 * ((b - a).magnitude() / 2.0).min(1.0).asin()
    } else {
        PI - 2.0 * ((-b - a).magnitude() / 2.0).min(1.0).asin()
    }
}

/// The angle at `b` in the corner `a`, `b`, `c`.
pub fn angle_v3v3v3(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> f32 {
    angle_normalized(normalize_or_zero(a - b), normalize_or_zero(c - b))
}

/// Distance factor to keep a vertex offset along `normal` at unit distance
/// from a face with normal `face_normal` (the "shell thickness" factor).
/// Returns `1.0` if the normals are perpendicular.
pub fn shell_dist(normal: Vector3<f32>, face_normal: Vector3<f32>) -> f32 {
    let dot = normal.dot(face_normal).abs();
    if dot < 1.0e-8 {
        1.0
    } else {
        1.0 / dot
    }
}


#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};
    use super::*;

    fn p(x: f32, y: f32, z: f32) -> Point3<f32> {
        Point3::new(x, y, z)
    }

    #[test]
    fn normals_of_simple_polygons() {
        let z = Vector3::unit_z();
        assert_eq!(tri_normal(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)), z);
        assert_eq!(
            quad_normal(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)),
            z,
        );

        let pentagon = vec![
            p(0.0, 0.0, 0.0),
            p(2.0, 0.0, 0.0),
            p(2.0, 1.0, 0.0),
            p(1.0, 2.0, 0.0),
            p(0.0, 1.0, 0.0),
        ];
        assert_eq!(poly_normal(pentagon.iter().cloned()), z);

        // Twice the area.
        let n = poly_normal_unnormalized(pentagon.iter().cloned());
        assert!((n.z - 6.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_normal_is_zero() {
        let n = tri_normal(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0));
        assert_eq!(n, Vector3::zero());
        assert_eq!(poly_normal(Vec::new()), Vector3::zero());
    }

    #[test]
    fn angles() {
        let x = Vector3::unit_x();
        let y = Vector3::unit_y();
        assert!((angle_normalized(x, y) - FRAC_PI_2).abs() < 1e-5);
        assert!((angle_normalized(x, -x) - PI).abs() < 1e-5);
        assert!(angle_normalized(x, x).abs() < 1e-5);

        let a = angle_v3v3v3(p(1.0, 0.0, 0.0), p(0.0, 0.0, 0.0), p(1.0, 1.0, 0.0));
        assert!((a - PI / 4.0).abs() < 1e-5);
    }

    #[test]
    fn colinear() {
        let x = Vector3::unit_x();
        assert!(is_colinear(x, x * 3.0, 1e-5));
        assert!(is_colinear(x, -x, 1e-5));
        assert!(!is_colinear(x, Vector3::new(1.0, 0.1, 0.0), 1e-5));
    }

    #[test]
    fn shell_factor() {
        let z = Vector3::unit_z();
        assert_eq!(shell_dist(z, z), 1.0);
        assert_eq!(shell_dist(z, Vector3::unit_x()), 1.0);
        let tilted = normalize_or_zero(Vector3::new(1.0, 0.0, 1.0));
        assert!((shell_dist(z, tilted) - 2.0f32.sqrt()).abs() < 1e-5);
    }
}
