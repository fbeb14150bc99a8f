//! Benchmarks for cycle walks, searches and index bookkeeping on a quad grid.

use cgmath::Point3;
use criterion::{
    criterion_group, criterion_main, black_box, Criterion,
};

use bmesh::{BMesh, CreateFlags, ElemMask, VertHandle};


/// Quad grid with `n * n` faces.
fn grid(n: usize) -> (BMesh, Vec<VertHandle>) {
    let mut mesh = BMesh::new();
    let verts = (0..(n + 1) * (n + 1))
        .map(|i| {
            let co = Point3::new((i % (n + 1)) as f32, (i / (n + 1)) as f32, 0.0);
            mesh.create_vert(co, None, CreateFlags::empty()).unwrap()
        })
        .collect::<Vec<_>>();

    for y in 0..n {
        for x in 0..n {
            let i = y * (n + 1) + x;
            let quad = [verts[i], verts[i + 1], verts[i + n + 2], verts[i + n + 1]];
            mesh.create_face_verts(&quad, None, CreateFlags::empty(), true).unwrap();
        }
    }

    (mesh, verts)
}


// ===============================================================================================
// ===== Benchmarks
// ===============================================================================================

fn create_grid(c: &mut Criterion) {
    c.bench_function("create_grid_64", |b| {
        b.iter(|| black_box(grid(64)))
    });
}

/// Count the adjacent faces per vertex
fn count_adjacent_faces(c: &mut Criterion) {
    c.bench_function(
        "count_adjacent_faces",
        |b| {
            let (mesh, _) = grid(128);

            b.iter(|| {
                let mesh = black_box(&mesh);

                for v in mesh.verts() {
                    black_box(mesh.faces_of_vert(v).count());
                }
            })
        },
    );
}

fn edge_and_face_exists(c: &mut Criterion) {
    let n = 128;
    let (mesh, verts) = grid(n);

    c.bench_function("edge_exists", |b| {
        b.iter(|| {
            for i in 0..verts.len() - 1 {
                black_box(mesh.edge_exists(verts[i], verts[i + 1]));
            }
        })
    });

    c.bench_function("face_exists", |b| {
        b.iter(|| {
            for i in 0..n {
                let quad = [verts[i + n + 2], verts[i + n + 1], verts[i], verts[i + 1]];
                black_box(mesh.face_exists(&quad));
            }
        })
    });
}

fn ensure_indices_and_tables(c: &mut Criterion) {
    let (mesh, _) = grid(128);

    c.bench_function("ensure_indices", |b| {
        b.iter(|| {
            let mut mesh = mesh.clone();
            mesh.mark_dirty(ElemMask::ALL);
            mesh.ensure_indices(ElemMask::ALL);
            black_box(mesh)
        })
    });

    c.bench_function("ensure_tables", |b| {
        b.iter(|| {
            let mut mesh = mesh.clone();
            mesh.mark_dirty(ElemMask::ALL);
            mesh.ensure_tables(ElemMask::ALL);
            black_box(mesh)
        })
    });
}

fn validate(c: &mut Criterion) {
    let (mesh, _) = grid(64);
    c.bench_function("validate_64", |b| {
        b.iter(|| black_box(mesh.validate()))
    });
}


criterion_group!(benches,
    create_grid,
    count_adjacent_faces,
    edge_and_face_exists,
    ensure_indices_and_tables,
    validate,
);
criterion_main!(benches);
