//! Random sequences of create/kill operations must always leave a mesh that
//! passes the validator.

use cgmath::Point3;
use proptest::prelude::*;

use bmesh::{BMesh, CreateFlags, ElemMask};


#[derive(Debug, Clone)]
enum Op {
    AddVert([f32; 3]),
    AddEdge(usize, usize),
    AddFace(Vec<usize>, bool),
    KillVert(usize, bool),
    KillEdge(usize, bool),
    KillFace(usize, bool),
    Reverse(usize),
    Copy(usize),
    Reindex,
}

fn arb_op() -> impl Strategy<Value = Op> {
    let idx = 0..64usize;
    prop_oneof![
        3 => prop::array::uniform3(-10.0..10.0f32).prop_map(Op::AddVert),
        2 => (idx.clone(), idx.clone()).prop_map(|(a, b)| Op::AddEdge(a, b)),
        4 => (prop::collection::vec(idx.clone(), 3..6), any::<bool>())
            .prop_map(|(vs, no_double)| Op::AddFace(vs, no_double)),
        1 => (idx.clone(), any::<bool>()).prop_map(|(i, loose)| Op::KillVert(i, loose)),
        1 => (idx.clone(), any::<bool>()).prop_map(|(i, loose)| Op::KillEdge(i, loose)),
        1 => (idx.clone(), any::<bool>()).prop_map(|(i, loose)| Op::KillFace(i, loose)),
        1 => idx.clone().prop_map(Op::Reverse),
        1 => idx.clone().prop_map(Op::Copy),
        1 => Just(Op::Reindex),
    ]
}

/// Picks the `i`-th (modulo length) element of `items`.
fn pick<T: Copy>(items: &[T], i: usize) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[i % items.len()])
    }
}

fn apply(mesh: &mut BMesh, op: &Op) {
    let verts = mesh.verts().collect::<Vec<_>>();
    let edges = mesh.edges().collect::<Vec<_>>();
    let faces = mesh.faces().collect::<Vec<_>>();

    // Errors (degenerate edges, duplicate face vertices) are expected for
    // some random inputs; they must leave the mesh untouched.
    match *op {
        Op::AddVert([x, y, z]) => {
            mesh.create_vert(Point3::new(x, y, z), None, CreateFlags::empty()).unwrap();
        }
        Op::AddEdge(a, b) => {
            if let (Some(a), Some(b)) = (pick(&verts, a), pick(&verts, b)) {
                let _ = mesh.create_edge(a, b, None, CreateFlags::NO_DOUBLE);
            }
        }
        Op::AddFace(ref ids, no_double) => {
            let vs = ids.iter().filter_map(|&i| pick(&verts, i)).collect::<Vec<_>>();
            let flags = if no_double { CreateFlags::NO_DOUBLE } else { CreateFlags::empty() };
            let before = mesh.num_faces();
            if mesh.create_face_verts(&vs, None, flags, true).is_err() {
                assert_eq!(mesh.num_faces(), before);
            }
        }
        Op::KillVert(i, loose) => {
            if let Some(v) = pick(&verts, i) {
                if loose {
                    mesh.kill_vert_loose(v).unwrap();
                } else {
                    mesh.kill_vert(v).unwrap();
                }
                assert!(!mesh.contains(v));
            }
        }
        Op::KillEdge(i, loose) => {
            if let Some(e) = pick(&edges, i) {
                if loose {
                    mesh.kill_edge_loose(e).unwrap();
                } else {
                    mesh.kill_edge(e).unwrap();
                }
                assert!(!mesh.contains(e));
            }
        }
        Op::KillFace(i, loose) => {
            if let Some(f) = pick(&faces, i) {
                if loose {
                    mesh.kill_face_loose(f).unwrap();
                } else {
                    mesh.kill_face(f).unwrap();
                }
                assert!(!mesh.contains(f));
            }
        }
        Op::Reverse(i) => {
            if let Some(f) = pick(&faces, i) {
                mesh.face_reverse(f).unwrap();
            }
        }
        Op::Copy(i) => {
            if let Some(f) = pick(&faces, i) {
                let copy = mesh.copy_face(f).unwrap();
                assert_eq!(mesh[copy].len(), mesh[f].len());
            }
        }
        Op::Reindex => {
            mesh.ensure_indices(ElemMask::ALL);
            mesh.ensure_tables(ElemMask::ALL);
        }
    }
}

fn counts_match_iteration(mesh: &BMesh) -> bool {
    let loops = mesh.faces().map(|f| mesh.loops_of_face(f).count()).sum::<usize>();
    mesh.verts().count() == mesh.num_verts() as usize
        && mesh.edges().count() == mesh.num_edges() as usize
        && mesh.faces().count() == mesh.num_faces() as usize
        && loops == mesh.num_loops() as usize
}


proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn random_edits_keep_mesh_valid(ops in prop::collection::vec(arb_op(), 1..80)) {
        let mut mesh = BMesh::new();
        for op in &ops {
            apply(&mut mesh, op);

            let report = mesh.validate();
            prop_assert!(report.is_ok(), "after {:?}: {:#?}", op, report);
            prop_assert!(counts_match_iteration(&mesh));
        }
    }

    #[test]
    fn disk_and_radial_counts_agree(ops in prop::collection::vec(arb_op(), 1..60)) {
        let mut mesh = BMesh::new();
        for op in &ops {
            apply(&mut mesh, op);
        }

        for v in mesh.verts() {
            let corners = mesh.edges_of_vert(v)
                .flat_map(|e| mesh.loops_of_edge(e))
                .filter(|&l| mesh[l].v() == v)
                .count();
            prop_assert_eq!(corners, mesh.vert_face_count(v));
            prop_assert_eq!(mesh.loops_of_vert(v).count(), corners);
        }
        for e in mesh.edges() {
            prop_assert_eq!(mesh.faces_of_edge(e).count(), mesh.edge_face_count(e));
            for l in mesh.loops_of_edge(e) {
                prop_assert_eq!(mesh[l].e(), e);
            }
        }
    }
}

// With the `paranoid` feature every operation validates the elements it
// touched and panics on the first broken one, so applying the edits is the
// whole test.
#[cfg(feature = "paranoid")]
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn paranoid_checks_pass_on_random_edits(ops in prop::collection::vec(arb_op(), 1..120)) {
        let mut mesh = BMesh::new();
        for op in &ops {
            apply(&mut mesh, op);
        }
        prop_assert!(mesh.validate().is_ok());
    }
}
