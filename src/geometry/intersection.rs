//! Exact intersection area of two simple polygons.
//!
//! By Green's theorem the area of a region is `½ ∮ (x dy − y dx)` along its
//! counter-clockwise boundary. The boundary of `A ∩ B` consists of the parts of
//! `∂A` lying inside `B` and the parts of `∂B` lying inside `A`, so the area is
//! obtained by splitting every edge at its crossings with the other polygon and
//! integrating the sub-segments whose midpoints fall inside. The polygons do
//! not need to be convex, only simple, which holds for star-convex polygons
//! with positive distances.
//!
//! Edges shared by both boundaries (identical or collinear overlapping edges)
//! are counted once: a shared piece is taken from `∂A` when both polygons
//! traverse it in the same direction and dropped otherwise.
//!
//! Cost is `O(n_a · n_b)` per pair.
use super::polygon::StarPolygon;
use nalgebra::Point2;

type P = [f64; 2];

const PARAM_EPS: f64 = 1e-12;

#[inline]
fn sub(a: P, b: P) -> P {
    [a[0] - b[0], a[1] - b[1]]
}

#[inline]
fn dot(a: P, b: P) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}

#[inline]
fn cross(a: P, b: P) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

#[inline]
fn lerp(origin: P, dir: P, t: f64) -> P {
    [origin[0] + t * dir[0], origin[1] + t * dir[1]]
}

enum Location {
    Inside,
    Outside,
    /// On an edge of the polygon whose direction is given.
    Boundary(P),
}

fn to_ccw(points: &[Point2<f32>]) -> Vec<P> {
    let mut pts: Vec<P> = points.iter().map(|p| [p.x as f64, p.y as f64]).collect();
    let mut twice_area = 0.0;
    for i in 0..pts.len() {
        twice_area += cross(pts[i], pts[(i + 1) % pts.len()]);
    }
    if twice_area < 0.0 {
        pts.reverse();
    }
    pts
}

fn distance_to_segment(p: P, a: P, b: P) -> f64 {
    let ab = sub(b, a);
    let len2 = dot(ab, ab);
    let t = if len2 > 0.0 {
        (dot(sub(p, a), ab) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let d = sub(p, lerp(a, ab, t));
    dot(d, d).sqrt()
}

fn locate(p: P, poly: &[P], eps: f64) -> Location {
    let n = poly.len();
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        if distance_to_segment(p, a, b) <= eps {
            return Location::Boundary(sub(b, a));
        }
    }
    // even-odd crossing test, half-open in the first coordinate
    let mut inside = false;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        if (a[0] > p[0]) != (b[0] > p[0]) {
            let y = a[1] + (p[0] - a[0]) * (b[1] - a[1]) / (b[0] - a[0]);
            if p[1] < y {
                inside = !inside;
            }
        }
    }
    if inside {
        Location::Inside
    } else {
        Location::Outside
    }
}

/// Pushes the parameters `t ∈ [0, 1]` along `s0 + t·d` where it meets `q0 → q1`.
fn push_crossings(s0: P, d: P, q0: P, q1: P, eps: f64, ts: &mut Vec<f64>) {
    let e = sub(q1, q0);
    let w = sub(q0, s0);
    let denom = cross(d, e);
    let len_d = dot(d, d).sqrt();
    let len_e = dot(e, e).sqrt();
    if denom.abs() > PARAM_EPS * len_d * len_e {
        let t = cross(w, e) / denom;
        let u = cross(w, d) / denom;
        let tol = 1e-9;
        if (-tol..=1.0 + tol).contains(&t) && (-tol..=1.0 + tol).contains(&u) {
            ts.push(t.clamp(0.0, 1.0));
        }
    } else if cross(w, d).abs() <= eps * len_d {
        // collinear: split at the other edge's endpoints
        let len2 = len_d * len_d;
        for q in [q0, q1] {
            let t = dot(sub(q, s0), d) / len2;
            if t > 0.0 && t < 1.0 {
                ts.push(t);
            }
        }
    }
}

/// `½ ∮ (x dy − y dx)` over the parts of `∂p` inside `q`.
fn boundary_integral(p: &[P], q: &[P], keep_shared: bool, eps: f64) -> f64 {
    let n = p.len();
    let mut acc = 0.0;
    let mut ts = Vec::with_capacity(8);
    for i in 0..n {
        let s0 = p[i];
        let d = sub(p[(i + 1) % n], s0);
        if dot(d, d) <= eps * eps {
            continue;
        }
        ts.clear();
        ts.push(0.0);
        ts.push(1.0);
        for j in 0..q.len() {
            push_crossings(s0, d, q[j], q[(j + 1) % q.len()], eps, &mut ts);
        }
        ts.sort_by(|a, b| a.total_cmp(b));
        ts.dedup_by(|a, b| (*a - *b).abs() <= PARAM_EPS);

        for pair in ts.windows(2) {
            let (t0, t1) = (pair[0], pair[1]);
            let mid = lerp(s0, d, 0.5 * (t0 + t1));
            let counted = match locate(mid, q, eps) {
                Location::Inside => true,
                Location::Outside => false,
                Location::Boundary(edge) => keep_shared && dot(edge, d) > 0.0,
            };
            if counted {
                acc += 0.5 * cross(lerp(s0, d, t0), lerp(s0, d, t1));
            }
        }
    }
    acc
}

/// Area of `a ∩ b` for two simple polygons given by their vertices.
pub fn intersection_area(a: &[Point2<f32>], b: &[Point2<f32>]) -> f64 {
    if a.len() < 3 || b.len() < 3 {
        return 0.0;
    }
    let a = to_ccw(a);
    let b = to_ccw(b);
    let magnitude = a
        .iter()
        .chain(b.iter())
        .map(|p| p[0].abs().max(p[1].abs()))
        .fold(1.0f64, f64::max);
    let eps = 1e-9 * magnitude;
    let area = boundary_integral(&a, &b, true, eps) + boundary_integral(&b, &a, false, eps);
    area.max(0.0)
}

/// Intersection area divided by the area of the smaller polygon.
///
/// A polygon fully inside another yields 1.0 regardless of the size of the
/// enclosing polygon. Degenerate (zero-area) polygons never overlap.
pub fn overlap_ratio(a: &StarPolygon, b: &StarPolygon) -> f32 {
    overlap_with_areas(a, a.area(), b, b.area())
}

/// Same as [`overlap_ratio`] with precomputed areas.
pub(crate) fn overlap_with_areas(a: &StarPolygon, area_a: f64, b: &StarPolygon, area_b: f64) -> f32 {
    let smaller = area_a.min(area_b);
    if smaller <= 0.0 {
        return 0.0;
    }
    let inter = intersection_area(&a.vertices, &b.vertices);
    (inter / smaller).min(1.0) as f32
}
