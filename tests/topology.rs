//! End-to-end scenarios using only the public API.

use cgmath::{prelude::*, Point3, Vector3};

use bmesh::{
    BMesh, CreateFlags, ElemMask, Error, FaceHandle, IterKind, VertHandle,
};


fn vert(mesh: &mut BMesh, x: f32, y: f32, z: f32) -> VertHandle {
    mesh.create_vert(Point3::new(x, y, z), None, CreateFlags::empty()).unwrap()
}

fn unit_quad() -> (BMesh, [VertHandle; 4], FaceHandle) {
    let mut mesh = BMesh::new();
    let vs = [
        vert(&mut mesh, 0.0, 0.0, 0.0),
        vert(&mut mesh, 1.0, 0.0, 0.0),
        vert(&mut mesh, 1.0, 1.0, 0.0),
        vert(&mut mesh, 0.0, 1.0, 0.0),
    ];
    let f = mesh.create_face_verts(&vs, None, CreateFlags::empty(), true).unwrap().unwrap();
    (mesh, vs, f)
}

/// A 2x2 grid of quads (9 vertices).
fn grid() -> (BMesh, Vec<VertHandle>, Vec<FaceHandle>) {
    let mut mesh = BMesh::new();
    let vs = (0..9)
        .map(|i| vert(&mut mesh, (i % 3) as f32, (i / 3) as f32, 0.0))
        .collect::<Vec<_>>();
    let fs = [(0, 1, 4, 3), (1, 2, 5, 4), (3, 4, 7, 6), (4, 5, 8, 7)]
        .iter()
        .map(|&(a, b, c, d)| {
            mesh.create_face_verts(&[vs[a], vs[b], vs[c], vs[d]], None, CreateFlags::empty(), true)
                .unwrap()
                .unwrap()
        })
        .collect();
    (mesh, vs, fs)
}


#[test]
fn unit_quad_counts_and_normal() {
    let (mut mesh, vs, f) = unit_quad();

    assert_eq!(mesh.num_verts(), 4);
    assert_eq!(mesh.num_edges(), 4);
    assert_eq!(mesh.num_faces(), 1);
    assert_eq!(mesh.num_loops(), 4);
    assert_eq!(mesh[f].len(), 4);
    assert!(mesh.validate().is_ok());

    let n = mesh.face_calc_normal(f);
    assert!((n - Vector3::unit_z()).magnitude() < 1.0e-6);

    mesh.face_reverse(f).unwrap();
    let n = mesh.face_calc_normal(f);
    assert!((n + Vector3::unit_z()).magnitude() < 1.0e-6);
    assert_eq!(mesh.face_exists(&vs), Some(f));
    assert!(mesh.validate().is_ok());
}

#[test]
fn shared_edge_has_radial_cycle_of_two() {
    let (mesh, vs, fs) = grid();
    assert_eq!(mesh.num_edges(), 12);
    assert_eq!(mesh.num_loops(), 16);

    let shared = mesh.edge_exists(vs[1], vs[4]).unwrap();
    let faces = mesh.faces_of_edge(shared).collect::<Vec<_>>();
    assert_eq!(faces.len(), 2);
    assert!(faces.contains(&fs[0]) && faces.contains(&fs[1]));

    assert_eq!(mesh.vert_edge_count(vs[4]), 4);
    assert_eq!(mesh.vert_face_count(vs[4]), 4);
    assert!(mesh.vert_is_manifold(vs[4]));
    assert!(!mesh.vert_is_boundary(vs[4]));
    assert!(mesh.vert_is_boundary(vs[1]));
    assert!(mesh.validate().is_ok());
}

#[test]
fn killing_a_vertex_cascades() {
    let (mut mesh, vs, _) = grid();
    mesh.kill_vert(vs[4]).unwrap();

    assert_eq!(mesh.num_verts(), 8);
    assert_eq!(mesh.num_edges(), 8);
    assert_eq!(mesh.num_faces(), 0);
    assert_eq!(mesh.num_loops(), 0);
    assert!(!mesh.contains(vs[4]));
    assert_eq!(mesh.kill_vert(vs[4]), Err(Error::StaleHandle(vs[4].into())));

    for &v in vs.iter().filter(|&&v| v != vs[4]) {
        assert!(mesh.edges_of_vert(v).all(|e| mesh.edge_is_wire(e)));
    }
    assert!(mesh.validate().is_ok());
}

#[test]
fn killing_a_face_keeps_its_boundary() {
    let (mut mesh, vs, fs) = grid();
    mesh.kill_face(fs[0]).unwrap();

    assert_eq!(mesh.num_faces(), 3);
    assert_eq!(mesh.num_edges(), 12);
    assert_eq!(mesh.num_loops(), 12);
    let e = mesh.edge_exists(vs[0], vs[1]).unwrap();
    assert!(mesh.edge_is_wire(e));
    let e = mesh.edge_exists(vs[1], vs[4]).unwrap();
    assert!(mesh.edge_is_boundary(e));
    assert!(mesh.validate().is_ok());

    mesh.kill_face_loose(fs[3]).unwrap();
    assert_eq!(mesh.num_faces(), 2);
    assert_eq!(mesh.edge_exists(vs[5], vs[8]), None);
    assert!(!mesh.contains(vs[8]));
    assert!(mesh.validate().is_ok());
}

#[test]
fn no_double_returns_existing_elements() {
    let (mut mesh, vs, f) = unit_quad();

    let e = mesh.edge_exists(vs[0], vs[1]).unwrap();
    let again = mesh.create_edge(vs[1], vs[0], None, CreateFlags::NO_DOUBLE).unwrap();
    assert_eq!(again, e);
    assert_eq!(mesh.num_edges(), 4);

    let rotated = [vs[2], vs[3], vs[0], vs[1]];
    let again = mesh.create_face_verts(&rotated, None, CreateFlags::NO_DOUBLE, true).unwrap();
    assert_eq!(again, Some(f));
    assert_eq!(mesh.num_faces(), 1);

    let reversed = [vs[3], vs[2], vs[1], vs[0]];
    let again = mesh.create_face_verts(&reversed, None, CreateFlags::NO_DOUBLE, true).unwrap();
    assert_eq!(again, Some(f));
    assert!(mesh.validate().is_ok());
}

#[test]
fn face_exists_is_independent_of_rotation_and_winding() {
    let mut mesh = BMesh::new();
    let a = vert(&mut mesh, 0.0, 0.0, 0.0);
    let b = vert(&mut mesh, 1.0, 0.0, 0.0);
    let c = vert(&mut mesh, 0.0, 1.0, 0.0);
    let f = mesh.create_face_verts(&[a, b, c], None, CreateFlags::empty(), true).unwrap().unwrap();

    for order in &[[a, b, c], [b, c, a], [c, a, b], [a, c, b], [c, b, a], [b, a, c]] {
        assert_eq!(mesh.face_exists(order), Some(f));
    }
}

#[test]
fn dirty_bits_follow_mutations() {
    let (mut mesh, vs, _) = grid();
    assert!(mesh.index_dirty().contains(ElemMask::ALL));

    mesh.ensure_indices(ElemMask::ALL);
    mesh.ensure_tables(ElemMask::ALL);
    assert!(mesh.index_dirty().is_empty());
    assert!(mesh.table_dirty().is_empty());
    for (i, v) in mesh.verts().enumerate() {
        assert_eq!(mesh.elem_index(v), Some(i as _));
        assert_eq!(mesh.vert_at_index(i as _), Some(v));
    }
    assert!(mesh.validate().is_ok());

    vert(&mut mesh, 5.0, 5.0, 5.0);
    assert!(mesh.index_dirty().contains(ElemMask::VERT));
    assert!(mesh.table_dirty().contains(ElemMask::VERT));
    assert!(!mesh.index_dirty().intersects(ElemMask::FACE));

    mesh.kill_edge(mesh.edge_exists(vs[0], vs[1]).unwrap()).unwrap();
    assert!(mesh.index_dirty().contains(ElemMask::EDGE | ElemMask::LOOP | ElemMask::FACE));
    assert!(mesh.validate().is_ok());
}

#[test]
fn generic_iteration_matches_shortcuts() {
    let (mesh, vs, fs) = grid();
    let center = vs[4];

    let generic = mesh.iter(IterKind::EdgesOfVert, Some(center.into()))
        .unwrap()
        .map(|h| h.edge().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(generic, mesh.edges_of_vert(center).collect::<Vec<_>>());

    let count = mesh.iter_elem_count(IterKind::FacesOfVert, Some(center.into())).unwrap();
    assert_eq!(count, 4);

    assert!(mesh.iter(IterKind::VertsOfFace, Some(center.into())).is_err());
    let corners = mesh.iter_as_vec(IterKind::VertsOfFace, Some(fs[3].into())).unwrap();
    assert_eq!(corners.len(), 4);
}

#[test]
fn normals_update() {
    let (mut mesh, vs, fs) = grid();
    mesh.normals_update();

    for &f in &fs {
        assert!((mesh[f].no - Vector3::unit_z()).magnitude() < 1.0e-6);
    }
    for &v in &vs {
        assert!((mesh[v].no - Vector3::unit_z()).magnitude() < 1.0e-5);
    }

    let e = mesh.edge_exists(vs[1], vs[4]).unwrap();
    assert!(mesh.edge_calc_face_angle(e).abs() < 1.0e-5);
}
