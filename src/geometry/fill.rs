//! Polygon scan-fill used by the label rasterizer.
//!
//! Pixel `(r, c)` is represented by its center at integer coordinates. A pixel
//! belongs to a polygon when its center lies in the closed polygon: inside by
//! the even-odd rule, or within [`EDGE_EPS`] of an edge or vertex. Boundary
//! pixels are therefore filled on every side, so symmetric polygons give
//! symmetric pixel sets.

/// Distance (in pixels) within which a center counts as lying on an edge.
pub const EDGE_EPS: f64 = 1e-4;

/// Returns the interior pixels of a polygon clipped to a raster of `shape`.
pub trait PolygonFill {
    /// `rows`/`cols` hold vertex coordinates; `shape` is `(height, width)`.
    fn fill(&self, rows: &[f32], cols: &[f32], shape: (usize, usize)) -> Vec<(usize, usize)>;
}

/// Boundary-inclusive scanline fill over pixel centers.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScanlineFill;

fn distance_to_segment(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let ap = [p[0] - a[0], p[1] - a[1]];
    let len2 = ab[0] * ab[0] + ab[1] * ab[1];
    let t = if len2 > 0.0 {
        ((ap[0] * ab[0] + ap[1] * ab[1]) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let d = [ap[0] - t * ab[0], ap[1] - t * ab[1]];
    (d[0] * d[0] + d[1] * d[1]).sqrt()
}

fn contains_closed(p: [f64; 2], poly: &[[f64; 2]]) -> bool {
    let n = poly.len();
    let mut inside = false;
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        if distance_to_segment(p, a, b) <= EDGE_EPS {
            return true;
        }
        if (a[0] > p[0]) != (b[0] > p[0]) {
            let x = a[1] + (p[0] - a[0]) * (b[1] - a[1]) / (b[0] - a[0]);
            if p[1] < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Column extent `[lo, hi]` of the polygon boundary on the line `row = y`.
fn row_extent(y: f64, poly: &[[f64; 2]]) -> Option<(f64, f64)> {
    let n = poly.len();
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for i in 0..n {
        let [r0, c0] = poly[i];
        let [r1, c1] = poly[(i + 1) % n];
        if y < r0.min(r1) - EDGE_EPS || y > r0.max(r1) + EDGE_EPS {
            continue;
        }
        let dr = r1 - r0;
        let xs = if dr.abs() <= EDGE_EPS {
            [c0, c1]
        } else {
            let t = ((y - r0) / dr).clamp(0.0, 1.0);
            let x = c0 + t * (c1 - c0);
            [x, x]
        };
        for x in xs {
            lo = lo.min(x);
            hi = hi.max(x);
        }
    }
    (lo <= hi).then_some((lo, hi))
}

impl PolygonFill for ScanlineFill {
    fn fill(&self, rows: &[f32], cols: &[f32], shape: (usize, usize)) -> Vec<(usize, usize)> {
        let (height, width) = shape;
        let n = rows.len().min(cols.len());
        if n < 3 || height == 0 || width == 0 {
            return Vec::new();
        }
        let poly: Vec<[f64; 2]> = rows[..n]
            .iter()
            .zip(&cols[..n])
            .map(|(&r, &c)| [r as f64, c as f64])
            .collect();
        if poly.iter().any(|p| !(p[0].is_finite() && p[1].is_finite())) {
            return Vec::new();
        }
        let min_r = poly.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
        let max_r = poly.iter().map(|p| p[0]).fold(f64::NEG_INFINITY, f64::max);
        let r_start = (min_r - EDGE_EPS).ceil().max(0.0);
        let r_end = (max_r + EDGE_EPS).floor().min(height as f64 - 1.0);
        if r_end < r_start {
            return Vec::new();
        }

        let mut pixels = Vec::new();
        for r in r_start as usize..=r_end as usize {
            let y = r as f64;
            let Some((lo, hi)) = row_extent(y, &poly) else {
                continue;
            };
            let c_start = (lo - EDGE_EPS).ceil().max(0.0);
            let c_end = (hi + EDGE_EPS).floor().min(width as f64 - 1.0);
            if c_end < c_start {
                continue;
            }
            // a star-convex row section may consist of several spans
            for c in c_start as usize..=c_end as usize {
                if contains_closed([y, c as f64], &poly) {
                    pixels.push((r, c));
                }
            }
        }
        pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_axis_aligned_square() {
        let rows = [1.0, 4.0, 4.0, 1.0];
        let cols = [1.0, 1.0, 4.0, 4.0];
        let px = ScanlineFill.fill(&rows, &cols, (10, 10));
        // boundary included on all four sides
        assert_eq!(px.len(), 16);
        assert!(px.contains(&(1, 1)));
        assert!(px.contains(&(4, 1)));
        assert!(px.contains(&(1, 4)));
        assert!(px.contains(&(4, 4)));
        assert!(!px.contains(&(5, 4)));
        assert!(!px.contains(&(0, 1)));
    }

    #[test]
    fn clips_to_raster() {
        let rows = [-5.0, 5.0, 5.0, -5.0];
        let cols = [-5.0, -5.0, 5.0, 5.0];
        let px = ScanlineFill.fill(&rows, &cols, (3, 2));
        assert_eq!(px.len(), 6);
        assert!(px.iter().all(|&(r, c)| r < 3 && c < 2));
    }

    #[test]
    fn diamond_fills_closed_l1_ball() {
        let rows = [10.0, 15.0, 10.0, 5.0];
        let cols = [15.0, 10.0, 5.0, 10.0];
        let px = ScanlineFill.fill(&rows, &cols, (21, 21));
        for vertex in [(5, 10), (15, 10), (10, 5), (10, 15)] {
            assert!(px.contains(&vertex), "vertex {vertex:?} missing");
        }
        let expected: Vec<(usize, usize)> = (0..21usize)
            .flat_map(|r| (0..21usize).map(move |c| (r, c)))
            .filter(|&(r, c)| (r as i64 - 10).abs() + (c as i64 - 10).abs() <= 5)
            .collect();
        assert_eq!(expected.len(), 61);
        let mut got = px.clone();
        got.sort_unstable();
        assert_eq!(got, expected);
    }

    #[test]
    fn nearly_on_edge_centers_are_included() {
        // vertices carry float noise from trigonometry
        let rows = [10.0, 15.000001, 10.0, 4.999999];
        let cols = [14.999999, 10.0, 5.000001, 10.0];
        let px = ScanlineFill.fill(&rows, &cols, (21, 21));
        assert_eq!(px.len(), 61);
        assert!(px.contains(&(12, 13)));
        assert!(px.contains(&(8, 7)));
    }

    #[test]
    fn concave_rows_split_into_spans() {
        // arrow-head with a notch on the right side at row 2
        let rows = [0.0, 0.0, 2.0, 4.0, 4.0];
        let cols = [0.0, 4.0, 1.0, 4.0, 0.0];
        let px = ScanlineFill.fill(&rows, &cols, (5, 5));
        assert!(px.contains(&(2, 1)));
        assert!(!px.contains(&(2, 2)));
        assert!(px.contains(&(0, 4)) && px.contains(&(4, 4)));
        assert!(!px.contains(&(1, 3)));
    }

    #[test]
    fn degenerate_input_is_empty() {
        assert!(ScanlineFill.fill(&[0.0, 1.0], &[0.0, 1.0], (4, 4)).is_empty());
        assert!(ScanlineFill.fill(&[1.0, 2.0, 3.0], &[1.0, 2.0, 1.0], (0, 4)).is_empty());
    }
}
