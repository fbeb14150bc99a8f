//! Assertion macros and small fixture meshes shared by the unit tests.

use std::{collections::BTreeSet, fmt::Debug};

use cgmath::Point3;

use crate::{
    flags::CreateFlags,
    handle::{FaceHandle, VertHandle},
    mesh::BMesh,
};


macro_rules! assert_eq {
    ($left:expr, $right:expr) => {
        crate::test_utils::assert_eq_fn(&*&$left, &*&$right, file!(), line!(), column!())
    };
    ($left:expr, $right:expr, ) => {
        assert_eq!($left, $right)
    };
    ($left:expr, $right:expr, $( $arg:tt ) + ) => {
        std::assert_eq!($left, $right, $($arg)+)
    };
}

#[inline(never)]
pub(crate) fn assert_eq_fn<T, U>(left: &T, right: &U, file: &str, line: u32, col: u32)
where
    T: Debug + PartialEq<U>,
    U: Debug,
{
    if left != right {
        panic!(
            "assert_eq failed:\n  left: `{:?}`, \n right: `{:?}`\nAt: {}:{}:{}",
            left,
            right,
            file,
            line,
            col,
        )
    }
}

/// Asserts that two iterables contain the same elements, ignoring order and
/// duplicates.
macro_rules! assert_eq_set {
    ($left:expr, $right:expr $(,)?) => {
        crate::test_utils::assert_eq_set_fn($left, $right, stringify!($left), stringify!($right))
    };
}

#[inline(never)]
pub(crate) fn assert_eq_set_fn<T: Ord + Debug>(
    left: impl IntoIterator<Item = T>,
    right: impl IntoIterator<Item = T>,
    left_s: &str,
    right_s: &str,
) {
    let left = left.into_iter().collect::<BTreeSet<_>>();
    let right = right.into_iter().collect::<BTreeSet<_>>();
    if left != right {
        panic!(
            "assert_eq_set failed:\n  left: {:?} ({})\n right: {:?} ({})\n",
            left,
            left_s,
            right,
            right_s,
        );
    }
}

/// Checks if the given code will trigger a panic. If it does, nothing happens
/// (except side effects of the given code). If no panic is caused by the given
/// code, this macro panics with a message.
macro_rules! assert_panic {
    ($($body:tt)*) => {{
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            $($body)*
        }));
        if let Ok(x) = res {
            panic!(
                "expected panic for '{}', but got '{:?}' ",
                stringify!($($body)*),
                x,
            );
        }
    }}
}

/// Runs the full validator on the mesh and panics with the report if it
/// finds anything.
macro_rules! assert_validates {
    ($mesh:expr) => {{
        let report = $mesh.validate();
        if !report.is_ok() {
            panic!("mesh '{}' does not validate: {:#?}", stringify!($mesh), report);
        }
    }};
}

/// Macro version of `cmp_rotated` with nicer error message.
#[allow(unused_macros)]
macro_rules! assert_rotated_eq {
    ($lhs:expr, $rhs:expr) => {{
        let lhs = $lhs;
        let rhs = $rhs;
        if crate::test_utils::cmp_rotated(&lhs, &rhs).is_err() {
            panic!(
                "assert_rotated_eq failed:\n\
                    |  left: {:?} ({})\n\
                    | right: {:?} ({})\n",
                lhs,
                stringify!($lhs),
                rhs,
                stringify!($rhs),
            );
        }
    }};
}

/// Compares `actual` and `expected`. This function checks if both slices are
/// equal when treating them like a "ring": `[a, b, c, d]` and `[b, c, d, a]`
/// are equal.
///
/// If the slices are equal, `Ok(())` is returned. Otherwise, `Err(rotated)` is
/// returned, where `rotated` is `expected` but potentially rotated by some
/// amount.
pub(crate) fn cmp_rotated<T: Debug + PartialEq + Clone>(
    actual: &[T],
    expected: &[T],
) -> Result<(), Vec<T>> {
    let mut rotated = expected.to_vec();

    if actual.len() != expected.len() {
        return Err(rotated);
    }

    if !actual.is_empty() {
        let pos = match actual.iter().position(|e| e == &expected[0]) {
            Some(pos) => pos,
            None => return Err(rotated),
        };

        rotated.rotate_right(pos);
        if actual != &rotated[..] {
            return Err(rotated);
        }
    }

    Ok(())
}


// ===============================================================================================
// ===== Fixtures
// ===============================================================================================

pub(crate) fn vert(mesh: &mut BMesh, x: f32, y: f32, z: f32) -> VertHandle {
    mesh.create_vert(Point3::new(x, y, z), None, CreateFlags::empty()).unwrap()
}

pub(crate) fn face(mesh: &mut BMesh, verts: &[VertHandle]) -> FaceHandle {
    mesh.create_face_verts(verts, None, CreateFlags::empty(), true)
        .unwrap()
        .expect("no face created")
}

/// The unit quad in the xy-plane, counter-clockwise (normal `+z`).
pub(crate) fn quad() -> (BMesh, [VertHandle; 4], FaceHandle) {
    let mut mesh = BMesh::new();
    let vs = [
        vert(&mut mesh, 0.0, 0.0, 0.0),
        vert(&mut mesh, 1.0, 0.0, 0.0),
        vert(&mut mesh, 1.0, 1.0, 0.0),
        vert(&mut mesh, 0.0, 1.0, 0.0),
    ];
    let f = face(&mut mesh, &vs);
    (mesh, vs, f)
}

/// The unit cube with outward facing quads. Vertex `i` is at
/// `(i & 1, (i >> 1) & 1, (i >> 2) & 1)`.
pub(crate) fn cube() -> (BMesh, Vec<VertHandle>, Vec<FaceHandle>) {
    let mut mesh = BMesh::new();
    let vs = (0..8)
        .map(|i| vert(&mut mesh, (i & 1) as f32, ((i >> 1) & 1) as f32, ((i >> 2) & 1) as f32))
        .collect::<Vec<_>>();

    let quads = [
        [0, 2, 3, 1], // -z
        [4, 5, 7, 6], // +z
        [0, 1, 5, 4], // -y
        [2, 6, 7, 3], // +y
        [0, 4, 6, 2], // -x
        [1, 3, 7, 5], // +x
    ];
    let fs = quads.iter()
        .map(|q| face(&mut mesh, &[vs[q[0]], vs[q[1]], vs[q[2]], vs[q[3]]]))
        .collect();

    (mesh, vs, fs)
}

/// `n` triangles around a center vertex at the origin, with rim vertices on
/// the unit circle. If `closed` is `true`, the last triangle connects back
/// to the first rim vertex (a full disk), otherwise the fan has `n + 1` rim
/// vertices and a boundary.
pub(crate) fn fan(n: usize, closed: bool) -> (BMesh, VertHandle, Vec<VertHandle>, Vec<FaceHandle>) {
    use std::f32::consts::PI;

    let mut mesh = BMesh::new();
    let center = vert(&mut mesh, 0.0, 0.0, 0.0);
    let rim_len = if closed { n } else { n + 1 };
    let rim = (0..rim_len)
        .map(|i| {
            let a = 2.0 * PI * i as f32 / (n as f32 + if closed { 0.0 } else { 1.0 });
            vert(&mut mesh, a.cos(), a.sin(), 0.0)
        })
        .collect::<Vec<_>>();

    let fs = (0..n)
        .map(|i| face(&mut mesh, &[center, rim[i], rim[(i + 1) % rim_len]]))
        .collect();

    (mesh, center, rim, fs)
}
