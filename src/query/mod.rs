//! Read-only topology predicates, searches and geometric queries.
//!
//! None of these functions change the mesh. All of them take handles that
//! have to refer to live elements; like indexing the mesh, they panic on
//! stale handles. Use `BMesh::check` first if a handle might be stale.
//!
//! Topological queries run in O(local degree): they only walk the disk,
//! radial and loop cycles around their arguments.

use boolinator::Boolinator;
use cgmath::{prelude::*, Point3, Vector3};
use num_traits::Zero;
use smallvec::SmallVec;

use crate::{
    handle::{EdgeHandle, FaceHandle, LoopHandle, VertHandle},
    math,
    mesh::BMesh,
    set::ElemSet,
};



/// Default angle returned by `edge_calc_face_angle[_signed]` for edges that
/// do not have exactly two faces: 90 degrees.
pub const FACE_ANGLE_FALLBACK: f32 = std::f32::consts::FRAC_PI_2;

/// Squared-sine threshold below which the two edges at a corner count as
/// colinear in `loop_calc_face_normal_safe`.
const LOOP_COLINEAR_EPS_SQ: f32 = 1.0e-5;


// ===============================================================================================
// ===== Searches
// ===============================================================================================

impl BMesh {
    /// Returns the edge between `a` and `b`, if there is one.
    ///
    /// Walks the disk cycles of both vertices in lockstep, so the cost is
    /// bounded by the smaller of the two vertex degrees.
    pub fn edge_exists(&self, a: VertHandle, b: VertHandle) -> Option<EdgeHandle> {
        if a == b {
            return None;
        }

        let (first_a, first_b) = match (self[a].e(), self[b].e()) {
            (Some(ea), Some(eb)) => (ea, eb),
            _ => return None,
        };

        let mut ea = first_a;
        let mut eb = first_b;
        loop {
            if self[ea].has_vert(b) {
                return Some(ea);
            }
            if self[eb].has_vert(a) {
                return Some(eb);
            }

            ea = self.disk_next(ea, a);
            eb = self.disk_next(eb, b);
            if ea == first_a || eb == first_b {
                return None;
            }
        }
    }

    /// Returns a face whose boundary visits exactly `verts`, in this order or
    /// in reverse order, starting at any corner.
    ///
    /// This does not allocate: it walks the faces around `verts[0]` and
    /// compares each candidate of the right length in both directions.
    pub fn face_exists(&self, verts: &[VertHandle]) -> Option<FaceHandle> {
        let first = *verts.first()?;
        let len = verts.len();

        for e in self.edges_of_vert(first) {
            for l in self.loops_of_edge(e) {
                let lp = &self[l];
                if lp.v != first || self[lp.f].len as usize != len {
                    continue;
                }

                let matches = |step: fn(&BMesh, LoopHandle) -> LoopHandle| {
                    let mut cur = l;
                    verts[1..].iter().all(|&v| {
                        cur = step(self, cur);
                        self[cur].v == v
                    })
                };
                if matches(|m, l| m[l].next) || matches(|m, l| m[l].prev) {
                    return Some(lp.f);
                }
            }
        }

        None
    }
}


// ===============================================================================================
// ===== Membership
// ===============================================================================================

impl BMesh {
    pub fn vert_in_edge(&self, e: EdgeHandle, v: VertHandle) -> bool {
        self[e].has_vert(v)
    }

    /// The endpoint of `e` that is not `v`, or `None` if `v` is not an
    /// endpoint of `e`.
    pub fn edge_other_vert(&self, e: EdgeHandle, v: VertHandle) -> Option<VertHandle> {
        self[e].other_vert(v)
    }

    /// Returns `true` if `v` is a corner of `f`.
    pub fn vert_in_face(&self, v: VertHandle, f: FaceHandle) -> bool {
        self.loops_of_face(f).any(|l| self[l].v == v)
    }

    /// Returns `true` if `e` is on the boundary of `f`.
    pub fn edge_in_face(&self, e: EdgeHandle, f: FaceHandle) -> bool {
        self.face_edge_share_loop(f, e).is_some()
    }

    /// The loop of `f` that uses `e`, if any.
    pub fn face_edge_share_loop(&self, f: FaceHandle, e: EdgeHandle) -> Option<LoopHandle> {
        self.loops_of_edge(e).find(|&l| self[l].f == f)
    }

    /// Returns `true` if there is a face using both `e1` and `e2`.
    pub fn edge_share_face(&self, e1: EdgeHandle, e2: EdgeHandle) -> bool {
        self.faces_of_edge(e1).any(|f| self.edge_in_face(e2, f))
    }

    /// Returns `true` if there is a face with corners at both `a` and `b`.
    pub fn verts_share_face(&self, a: VertHandle, b: VertHandle) -> bool {
        self.faces_of_vert(a).any(|f| self.vert_in_face(b, f))
    }

    /// Returns `true` if `f1` and `f2` have an edge in common.
    pub fn face_share_edge_check(&self, f1: FaceHandle, f2: FaceHandle) -> bool {
        self.loops_of_face(f1).any(|l| self.loops_of_loop(l).any(|other| self[other].f == f2))
    }
}


// ===============================================================================================
// ===== Counts and classification
// ===============================================================================================

impl BMesh {
    /// Number of edges at `v`.
    pub fn vert_edge_count(&self, v: VertHandle) -> usize {
        self.disk_count(v)
    }

    /// Number of face corners at `v`. A face that visits `v` twice is counted
    /// twice.
    pub fn vert_face_count(&self, v: VertHandle) -> usize {
        self.disk_facevert_count(v)
    }

    /// Number of faces using `e`.
    pub fn edge_face_count(&self, e: EdgeHandle) -> usize {
        self.radial_length(self[e].l())
    }

    /// Returns `true` if `v` has edges, but none of them has a face.
    /// Isolated vertices are not wire vertices.
    pub fn vert_is_wire(&self, v: VertHandle) -> bool {
        self[v].e().is_some() && self.edges_of_vert(v).all(|e| self.edge_is_wire(e))
    }

    /// Returns `true` if `e` has no faces.
    pub fn edge_is_wire(&self, e: EdgeHandle) -> bool {
        self[e].l().is_none()
    }

    /// Returns `true` if one of the edges at `v` is a boundary edge.
    pub fn vert_is_boundary(&self, v: VertHandle) -> bool {
        self.edges_of_vert(v).any(|e| self.edge_is_boundary(e))
    }

    /// Returns `true` if `e` has exactly one face.
    pub fn edge_is_boundary(&self, e: EdgeHandle) -> bool {
        match self[e].l() {
            Some(l) => self[l].radial_next == l,
            None => false,
        }
    }

    /// Returns `true` if `e` has exactly two faces.
    pub fn edge_is_manifold(&self, e: EdgeHandle) -> bool {
        match self[e].l() {
            Some(l) => {
                let rn = self[l].radial_next;
                rn != l && self[rn].radial_next == l
            }
            None => false,
        }
    }

    /// Returns `true` if the neighborhood of `v` is a disk or a half-disk.
    ///
    /// That is the case if `v` has no wire edges, no edge with more than two
    /// faces, and all its faces form a single fan. The fan is walked with
    /// `vert_step_fan_loop`, which stops at the first edge that is not
    /// manifold. Isolated vertices are not manifold.
    pub fn vert_is_manifold(&self, v: VertHandle) -> bool {
        let e_first = match self[v].e() {
            Some(e) => e,
            None => return false,
        };
        let mut start = match self[e_first].l() {
            Some(l) => (e_first, l),
            None => return false,
        };

        let mut loop_num = 0;
        let mut boundary_num = 0;
        for e in self.edges_of_vert(v) {
            let l = match self[e].l() {
                Some(l) => l,
                None => return false,
            };
            let rn = self[l].radial_next;
            if self[rn].radial_next != l {
                return false;
            }

            if self[l].v == v {
                loop_num += 1;
            }
            if rn == l {
                boundary_num += 1;
                if boundary_num == 3 {
                    return false;
                }

                // A fan with a boundary has to be walked from its end.
                start = (e, l);
            } else if self[rn].v == v {
                loop_num += 1;
            }
        }

        let (mut e_step, l) = start;
        let l_start = if self[l].v == v { l } else { self[l].next };

        let mut region = 0;
        let mut cur = l_start;
        loop {
            region += 1;
            if region > loop_num {
                return false;
            }
            match self.vert_step_fan_loop(cur, &mut e_step) {
                Some(next) if next != l_start => cur = next,
                _ => break,
            }
        }

        region == loop_num
    }

    /// Steps from corner `l` to the adjacent corner of the fan around
    /// `l.v`, across the edge of `l` that is not `*e_step`. `*e_step` has to
    /// be one of the two edges of `l` at `l.v` and is updated to the edge
    /// that was crossed.
    ///
    /// Returns `None` if the edge to cross is not manifold (the fan ends
    /// there) or if `*e_step` is not an edge of `l` at `l.v`.
    pub fn vert_step_fan_loop(&self, l: LoopHandle, e_step: &mut EdgeHandle) -> Option<LoopHandle> {
        let lp = &self[l];
        let prev_e = self[lp.prev].e;
        let e_next = if lp.e == *e_step {
            prev_e
        } else if prev_e == *e_step {
            lp.e
        } else {
            return None;
        };

        if !self.edge_is_manifold(e_next) {
            return None;
        }

        *e_step = e_next;
        self.edge_other_loop(e_next, l)
    }

    /// The corner at `l.v` on the other side of `e`, which has to be one of
    /// the two edges of `l` at `l.v`.
    ///
    /// Returns `None` if `e` has no other face, or if the other face uses `e`
    /// without a corner at `l.v` (which only happens on broken meshes).
    pub fn edge_other_loop(&self, e: EdgeHandle, l: LoopHandle) -> Option<LoopHandle> {
        let lp = &self[l];
        let on_edge = if lp.e == e { l } else { lp.prev };
        let other = self[on_edge].radial_next;
        if other == on_edge {
            return None;
        }

        let other_next = self[other].next;
        (self[other].v == lp.v)
            .as_some(other)
            .or_else(|| (self[other_next].v == lp.v).as_some(other_next))
    }
}


// ===============================================================================================
// ===== Loop regions
// ===============================================================================================

/// Visited sets for `BMesh::loop_region_loops_count_at_most`. Owned by the
/// caller so that it can be reused across many queries. The sets are empty
/// again after every query.
#[derive(Debug, Clone, Default)]
pub struct RegionScratch {
    edges: ElemSet<EdgeHandle>,
    loops: ElemSet<LoopHandle>,
}

impl RegionScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates sets that are large enough for all elements of `mesh`.
    pub fn for_mesh(mesh: &BMesh) -> Self {
        Self {
            edges: ElemSet::with_bound(mesh.edges.slot_bound()),
            loops: ElemSet::with_bound(mesh.loops.slot_bound()),
        }
    }
}

impl BMesh {
    /// Number of corners at `l.v` that can be reached from `l` by stepping
    /// across edges at `l.v`. See `loop_region_loops_count_at_most`.
    pub fn loop_region_loops_count(&self, l: LoopHandle) -> usize {
        let mut scratch = RegionScratch::new();
        self.loop_region_loops_count_at_most(l, &mut scratch).0
    }

    /// Returns the number of corners at `v = l.v` in the region of `l`
    /// together with the total number of corners at `v`, which the first
    /// value is at most.
    ///
    /// The region is found by a flood fill starting at the edge of `l`: each
    /// visited edge at `v` marks the corners at `v` of all its faces and
    /// continues with the other edge at `v` of each such corner. The fill
    /// crosses edges with any number of faces; only vertices whose faces are
    /// connected through `v` alone (like the tip of a bow tie) split into
    /// several regions.
    ///
    /// The marks are stored in `scratch`, which must be empty and is empty
    /// again when this returns: a second pass around `v` removes every mark
    /// and counts the corners.
    pub fn loop_region_loops_count_at_most(
        &self,
        l: LoopHandle,
        scratch: &mut RegionScratch,
    ) -> (usize, usize) {
        debug_assert!(scratch.edges.is_empty() && scratch.loops.is_empty());
        let v = self[l].v;

        let mut count = 0;
        let mut stack: SmallVec<[EdgeHandle; 16]> = SmallVec::new();
        stack.push(self[l].e);
        while let Some(e) = stack.pop() {
            if !scratch.edges.insert(e) {
                continue;
            }

            for r in self.loops_of_edge(e) {
                let rp = &self[r];
                let (corner, e_other) = if rp.v == v {
                    (r, self[rp.prev].e)
                } else if self[rp.next].v == v {
                    (rp.next, self[rp.next].e)
                } else {
                    continue;
                };

                if scratch.loops.insert(corner) {
                    count += 1;
                }
                if !scratch.edges.contains(e_other) {
                    stack.push(e_other);
                }
            }
        }

        // Every marked edge is at `v`, so one walk around `v` clears all.
        let mut total = 0;
        for e in self.edges_of_vert(v) {
            scratch.edges.remove(e);
            for r in self.loops_of_edge(e) {
                if self[r].v == v {
                    scratch.loops.remove(r);
                    total += 1;
                }
            }
        }
        debug_assert!(scratch.edges.is_empty() && scratch.loops.is_empty());

        (count, total)
    }

    /// Returns `true` if all corners at `v` form a single region (see
    /// `loop_region_loops_count_at_most`). Unlike `vert_is_manifold`, this
    /// accepts edges with any number of faces. Vertices without faces count
    /// as one region.
    pub fn vert_is_manifold_region(&self, v: VertHandle) -> bool {
        self.vert_is_manifold_region_with_scratch(v, &mut RegionScratch::new())
    }

    /// `vert_is_manifold_region` with caller-owned visited sets. Pass the
    /// same `scratch` when checking many vertices.
    pub fn vert_is_manifold_region_with_scratch(
        &self,
        v: VertHandle,
        scratch: &mut RegionScratch,
    ) -> bool {
        match self.vert_find_first_loop(v) {
            Some(l) => {
                let (count, total) = self.loop_region_loops_count_at_most(l, scratch);
                count == total
            }
            None => true,
        }
    }

    /// The first corner at `v` found by walking the disk cycle of `v`.
    pub fn vert_find_first_loop(&self, v: VertHandle) -> Option<LoopHandle> {
        let e = self[v].e()?;
        self.disk_faceloop_find_first(e, v)
    }
}


// ===============================================================================================
// ===== Geometry
// ===============================================================================================

impl BMesh {
    fn co(&self, v: VertHandle) -> Point3<f32> {
        self[v].co
    }

    /// Positions of the corners of `f`, in boundary order.
    fn face_positions(&self, f: FaceHandle) -> impl Iterator<Item = Point3<f32>> + '_ {
        self.loops_of_face(f).map(move |l| self.co(self[l].v))
    }

    /// Computes the unit normal of `f` from its vertex positions. Triangles
    /// and quads use a cross product, larger faces Newell's method. A
    /// degenerate face gets the zero vector.
    pub fn face_calc_normal(&self, f: FaceHandle) -> Vector3<f32> {
        let l0 = self[f].l_first;
        let l1 = self[l0].next;
        let l2 = self[l1].next;
        let l3 = self[l2].next;
        let co = |l: LoopHandle| self.co(self[l].v);

        match self[f].len {
            3 => math::tri_normal(co(l0), co(l1), co(l2)),
            4 => math::quad_normal(co(l0), co(l1), co(l2), co(l3)),
            _ => math::poly_normal(self.face_positions(f)),
        }
    }

    /// Area of `f`. Exact for planar faces.
    pub fn face_calc_area(&self, f: FaceHandle) -> f32 {
        math::poly_normal_unnormalized(self.face_positions(f)).magnitude() / 2.0
    }

    /// The average of the corner positions of `f`.
    pub fn face_calc_center_mean(&self, f: FaceHandle) -> Point3<f32> {
        let sum = self.face_positions(f).fold(Vector3::zero(), |acc, p| acc + p.to_vec());
        Point3::from_vec(sum / self[f].len as f32)
    }

    pub fn edge_calc_length(&self, e: EdgeHandle) -> f32 {
        let [a, b] = self[e].verts();
        self.co(a).distance(self.co(b))
    }

    /// The normal of the corner `l`: the normalized cross product of its two
    /// edges. If that is zero, the face normal (computed from the positions)
    /// is returned instead.
    pub fn loop_calc_face_normal(&self, l: LoopHandle) -> Vector3<f32> {
        let lp = &self[l];
        let co = self.co(lp.v);
        let to_next = self.co(self[lp.next].v) - co;
        let to_prev = self.co(self[lp.prev].v) - co;

        let n = math::normalize_or_zero(to_next.cross(to_prev));
        if n.is_zero() {
            self.face_calc_normal(lp.f)
        } else {
            n
        }
    }

    /// Like `loop_calc_face_normal`, but falls back to the face normal as
    /// soon as the corner is almost straight, not only when it is exactly
    /// degenerate.
    pub fn loop_calc_face_normal_safe(&self, l: LoopHandle) -> Vector3<f32> {
        let lp = &self[l];
        let co = self.co(lp.v);
        let to_next = self.co(self[lp.next].v) - co;
        let to_prev = self.co(self[lp.prev].v) - co;

        if math::is_colinear(to_next, to_prev, LOOP_COLINEAR_EPS_SQ) {
            self.face_calc_normal(lp.f)
        } else {
            math::normalize_or_zero(to_next.cross(to_prev))
        }
    }

    /// The interior angle of the face of `l` at its corner.
    pub fn loop_calc_face_angle(&self, l: LoopHandle) -> f32 {
        let lp = &self[l];
        math::angle_v3v3v3(self.co(self[lp.prev].v), self.co(lp.v), self.co(self[lp.next].v))
    }

    /// The angle between the cached normals of the two faces of `e`. Edges
    /// with a face count other than two get `FACE_ANGLE_FALLBACK`.
    pub fn edge_calc_face_angle(&self, e: EdgeHandle) -> f32 {
        match self.manifold_faces(e) {
            Some((f1, f2)) => math::angle_normalized(self[f1].no, self[f2].no),
            None => FACE_ANGLE_FALLBACK,
        }
    }

    /// Like `edge_calc_face_angle`, but negative if the edge is concave.
    pub fn edge_calc_face_angle_signed(&self, e: EdgeHandle) -> f32 {
        match self.manifold_faces(e) {
            Some((f1, f2)) => {
                let angle = math::angle_normalized(self[f1].no, self[f2].no);
                if self.edge_is_convex(e) { angle } else { -angle }
            }
            None => FACE_ANGLE_FALLBACK,
        }
    }

    /// Returns `true` unless the two faces of `e` fold towards their normals.
    /// Uses the cached face normals; edges without exactly two faces and
    /// flat edges are convex.
    pub fn edge_is_convex(&self, e: EdgeHandle) -> bool {
        let l1 = match self[e].l() {
            Some(l) if self.edge_is_manifold(e) => l,
            _ => return true,
        };
        let l2 = self[l1].radial_next;
        let n1 = self[self[l1].f].no;
        let n2 = self[self[l2].f].no;
        if n1 == n2 {
            return true;
        }

        let dir = self.co(self[self[l1].next].v) - self.co(self[l1].v);
        dir.dot(n1.cross(n2)) > 0.0
    }

    fn manifold_faces(&self, e: EdgeHandle) -> Option<(FaceHandle, FaceHandle)> {
        let l = self[e].l()?;
        self.edge_is_manifold(e).as_some_from(|| (self[l].f, self[self[l].radial_next].f))
    }

    /// The factor by which `v` has to be moved along its (cached) normal to
    /// offset its faces by one unit, averaged over the faces weighted by
    /// their corner angle at `v`. Returns `1.0` if `v` has no faces.
    pub fn vert_calc_shell_factor(&self, v: VertHandle) -> f32 {
        let no = self[v].no;
        let mut accum_shell = 0.0;
        let mut accum_angle = 0.0;
        for l in self.loops_of_vert(v) {
            let angle = self.loop_calc_face_angle(l);
            accum_shell += math::shell_dist(no, self[self[l].f].no) * angle;
            accum_angle += angle;
        }

        if accum_angle != 0.0 {
            accum_shell / accum_angle
        } else {
            1.0
        }
    }

    /// The normal of `v`: the average of the cached normals of its faces,
    /// weighted by the corner angle at `v`. Vertices without faces (or with
    /// a zero sum) get their normalized position instead.
    pub fn vert_calc_normal(&self, v: VertHandle) -> Vector3<f32> {
        let sum = self.loops_of_vert(v).fold(Vector3::zero(), |acc, l| {
            acc + self[self[l].f].no * self.loop_calc_face_angle(l)
        });

        let n = math::normalize_or_zero(sum);
        if n.is_zero() {
            math::normalize_or_zero(self.co(v).to_vec())
        } else {
            n
        }
    }
}
