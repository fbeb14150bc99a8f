use crate::{
    error::Error,
    flags::CreateFlags,
    handle::{EdgeHandle, ElemHandle, VertHandle},
    mesh::BMesh,
    test_utils::{cube, face, fan, quad, vert},
};
use super::*;


#[test]
fn kinds_are_consistent() {
    for &kind in &IterKind::ALL {
        match kind.anchor_kind() {
            None => assert!(format!("{:?}", kind).ends_with("OfMesh")),
            Some(k) => assert!(format!("{:?}", kind).ends_with(&format!("Of{:?}", k))),
        }
    }
}

#[test]
fn wrong_anchor() {
    let (mesh, vs, f) = quad();

    let res = BMIter::new(&mesh, IterKind::EdgesOfVert, Some(f.into()));
    assert_eq!(res.map(|_| ()), Err(Error::WrongAnchor {
        kind: IterKind::EdgesOfVert,
        anchor: Some(f.into()),
    }));

    let res = BMIter::new(&mesh, IterKind::VertsOfMesh, Some(vs[0].into()));
    assert!(res.is_err());
    let res = BMIter::new(&mesh, IterKind::LoopsOfFace, None);
    assert!(res.is_err());

    // Typed iterator with the wrong item type.
    let res = TypedIter::<EdgeHandle>::new(&mesh, IterKind::VertsOfFace, Some(f.into()));
    assert!(res.is_err());
}

#[test]
fn stale_anchor() {
    let (mut mesh, vs, f) = quad();
    mesh.kill_face(f).unwrap();
    let res = mesh.iter(IterKind::LoopsOfFace, Some(f.into()));
    assert_eq!(res.map(|_| ()), Err(Error::StaleHandle(f.into())));

    assert_eq!(mesh.faces_of_vert(vs[0]).count(), 0);
    let v = vs[1];
    mesh.kill_vert(v).unwrap();
    assert_panic!(mesh.edges_of_vert(v).count());
}

#[test]
fn of_mesh_in_pool_order() {
    let (mut mesh, vs, fs) = cube();
    assert_eq!(mesh.verts().collect::<Vec<_>>(), vs);
    assert_eq!(mesh.faces().collect::<Vec<_>>(), fs);
    assert_eq!(mesh.edges().count(), 12);

    mesh.kill_vert(vs[2]).unwrap();
    let expected = vs.iter().cloned().filter(|&v| v != vs[2]).collect::<Vec<_>>();
    assert_eq!(mesh.verts().collect::<Vec<_>>(), expected);
    assert_eq!(mesh.edges().count(), 9);
    assert_eq!(mesh.faces().count(), 3);
}

#[test]
fn elems_of_vert() {
    let (mesh, vs, fs) = cube();

    // Corner 0 is used by the -z, -y and -x quads.
    assert_eq_set!(mesh.faces_of_vert(vs[0]), vec![fs[0], fs[2], fs[4]]);
    assert_eq!(mesh.edges_of_vert(vs[0]).count(), 3);
    for e in mesh.edges_of_vert(vs[0]) {
        assert!(mesh[e].has_vert(vs[0]));
    }

    let loops = mesh.loops_of_vert(vs[0]).collect::<Vec<_>>();
    assert_eq!(loops.len(), 3);
    for &l in &loops {
        assert_eq!(mesh[l].v(), vs[0]);
    }
    assert_eq_set!(loops.iter().map(|&l| mesh[l].f()), vec![fs[0], fs[2], fs[4]]);
}

#[test]
fn elems_of_isolated_vert() {
    let mut mesh = BMesh::new();
    let v = vert(&mut mesh, 0.0, 0.0, 0.0);
    assert_eq!(mesh.edges_of_vert(v).count(), 0);
    assert_eq!(mesh.faces_of_vert(v).count(), 0);
    assert_eq!(mesh.loops_of_vert(v).count(), 0);

    // Wire edges only.
    let w = vert(&mut mesh, 1.0, 0.0, 0.0);
    mesh.create_edge(v, w, None, CreateFlags::empty()).unwrap();
    assert_eq!(mesh.edges_of_vert(v).count(), 1);
    assert_eq!(mesh.faces_of_vert(v).count(), 0);
}

#[test]
fn faces_of_vert_with_wire_and_boundary() {
    let (mut mesh, center, rim, fs) = fan(4, false);
    let extra = vert(&mut mesh, 0.0, 0.0, 1.0);
    mesh.create_edge(center, extra, None, CreateFlags::empty()).unwrap();

    assert_eq!(mesh.edges_of_vert(center).count(), 6);
    assert_eq_set!(mesh.faces_of_vert(center), fs.iter().cloned());
    assert_eq!(mesh.faces_of_vert(center).count(), 4);
    assert_eq_set!(mesh.faces_of_vert(rim[0]), vec![fs[0]]);
    assert_eq_set!(mesh.faces_of_vert(rim[2]), vec![fs[1], fs[2]]);
}

#[test]
fn elems_of_edge() {
    let (mesh, vs, fs) = cube();
    let e = mesh.edge_exists(vs[0], vs[1]).unwrap();

    assert_eq_set!(mesh.verts_of_edge(e), vec![vs[0], vs[1]]);
    assert_eq_set!(mesh.faces_of_edge(e), vec![fs[0], fs[2]]);
    let loops = mesh.loops_of_edge(e).collect::<Vec<_>>();
    assert_eq!(loops.len(), 2);
    for &l in &loops {
        assert_eq!(mesh[l].e(), e);
    }

    let mut mesh = BMesh::new();
    let a = vert(&mut mesh, 0.0, 0.0, 0.0);
    let b = vert(&mut mesh, 1.0, 0.0, 0.0);
    let wire = mesh.create_edge(a, b, None, CreateFlags::empty()).unwrap();
    assert_eq!(mesh.faces_of_edge(wire).count(), 0);
    assert_eq!(mesh.loops_of_edge(wire).count(), 0);
}

#[test]
fn elems_of_face() {
    let (mesh, vs, f) = quad();
    assert_eq!(mesh.verts_of_face(f).collect::<Vec<_>>(), vs.to_vec());

    let edges = mesh.edges_of_face(f).collect::<Vec<_>>();
    let expected = (0..4)
        .map(|i| mesh.edge_exists(vs[i], vs[(i + 1) % 4]).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(edges, expected);

    let loops = mesh.loops_of_face(f).collect::<Vec<_>>();
    assert_eq!(loops[0], mesh[f].l_first());
    for i in 0..4 {
        assert_eq!(mesh[loops[i]].next(), loops[(i + 1) % 4]);
    }
}

#[test]
fn loops_of_loop() {
    let (mesh, _, fs) = cube();
    let l = mesh[fs[0]].l_first();
    let others = mesh.loops_of_loop(l).collect::<Vec<_>>();
    assert_eq!(others.len(), 1);
    assert_ne!(others[0], l);
    assert_eq!(mesh[others[0]].e(), mesh[l].e());

    let (mesh, _, f) = quad();
    assert_eq!(mesh.loops_of_loop(mesh[f].l_first()).count(), 0);

    // Three faces on one edge.
    let mut mesh = BMesh::new();
    let a = vert(&mut mesh, 0.0, 0.0, 0.0);
    let b = vert(&mut mesh, 1.0, 0.0, 0.0);
    let tips = [
        vert(&mut mesh, 0.0, 1.0, 0.0),
        vert(&mut mesh, 0.0, -1.0, 0.0),
        vert(&mut mesh, 0.0, 0.0, 1.0),
    ];
    let fs = tips.iter().map(|&t| face(&mut mesh, &[a, b, t])).collect::<Vec<_>>();
    let e = mesh.edge_exists(a, b).unwrap();
    let l = mesh.face_edge_share_loop(fs[1], e).unwrap();
    let others = mesh.loops_of_loop(l).map(|o| mesh[o].f()).collect::<Vec<_>>();
    assert_eq_set!(others, vec![fs[0], fs[2]]);
}

#[test]
fn untyped_iteration() {
    let (mesh, vs, f) = quad();
    let it = mesh.iter(IterKind::VertsOfFace, Some(f.into())).unwrap();
    assert_eq!(it.kind(), IterKind::VertsOfFace);
    let items = it.collect::<Vec<_>>();
    assert_eq!(items, vs.iter().map(|&v| ElemHandle::from(v)).collect::<Vec<_>>());

    let typed = TypedIter::<VertHandle>::new(&mesh, IterKind::VertsOfFace, Some(f.into())).unwrap();
    assert_eq!(typed.collect::<Vec<_>>(), vs.to_vec());
}

#[test]
fn iterator_is_exhausted_for_good() {
    let (mesh, _, f) = quad();
    let mut it = mesh.loops_of_face(f);
    assert_eq!(it.by_ref().count(), 4);
    assert_eq!(it.next(), None);
    assert_eq!(it.next(), None);
}

#[test]
fn elem_counts() {
    let (mesh, vs, fs) = cube();
    let cases: Vec<(IterKind, Option<ElemHandle>)> = vec![
        (IterKind::VertsOfMesh, None),
        (IterKind::EdgesOfMesh, None),
        (IterKind::FacesOfMesh, None),
        (IterKind::EdgesOfVert, Some(vs[5].into())),
        (IterKind::FacesOfVert, Some(vs[5].into())),
        (IterKind::LoopsOfVert, Some(vs[5].into())),
        (IterKind::VertsOfEdge, Some(mesh.edge_exists(vs[0], vs[4]).unwrap().into())),
        (IterKind::FacesOfEdge, Some(mesh.edge_exists(vs[0], vs[4]).unwrap().into())),
        (IterKind::LoopsOfEdge, Some(mesh.edge_exists(vs[0], vs[4]).unwrap().into())),
        (IterKind::VertsOfFace, Some(fs[3].into())),
        (IterKind::EdgesOfFace, Some(fs[3].into())),
        (IterKind::LoopsOfFace, Some(fs[3].into())),
        (IterKind::LoopsOfLoop, Some(mesh[fs[3]].l_first().into())),
    ];

    for (kind, anchor) in cases {
        let walked = mesh.iter(kind, anchor).unwrap().count();
        assert_eq!(mesh.iter_elem_count(kind, anchor).unwrap(), walked, "{:?}", kind);
        assert_eq!(mesh.iter_as_vec(kind, anchor).unwrap().len(), walked, "{:?}", kind);
    }
}

#[test]
fn as_slice_truncates() {
    let (mesh, vs, _) = cube();
    let mut buf = [ElemHandle::from(vs[0]); 3];
    let written = mesh.iter_as_slice(IterKind::VertsOfMesh, None, &mut buf).unwrap();
    assert_eq!(written, 3);
    assert_eq!(buf, [ElemHandle::from(vs[0]), vs[1].into(), vs[2].into()]);

    let mut buf = [ElemHandle::from(vs[0]); 10];
    let e = mesh.edge_exists(vs[1], vs[3]).unwrap();
    let written = mesh.iter_as_slice(IterKind::VertsOfEdge, Some(e.into()), &mut buf).unwrap();
    assert_eq!(written, 2);
}

#[test]
fn bitmap_from_filter() {
    let (mesh, _, _) = cube();
    let mut bitmap = Vec::new();
    let hits = mesh.iter_bitmap_from_filter(IterKind::VertsOfMesh, None, &mut bitmap, |m, h| {
        let v = h.vert().unwrap();
        m[v].co.z > 0.5
    }).unwrap();

    assert_eq!(hits, 4);
    assert_eq!(bitmap, vec![false, false, false, false, true, true, true, true]);
}
