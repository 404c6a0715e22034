//! Static 2-D k-d tree over candidate centers.
//!
//! Built once per NMS call with median splits; answers fixed-radius queries so
//! that each accepted polygon only meets candidates whose centers are close
//! enough for the polygons to intersect.

#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    points: Vec<[f32; 2]>,
}

#[derive(Debug, Clone)]
struct KdNode {
    /// Index into the points array
    point_idx: usize,
    left: Option<usize>,
    right: Option<usize>,
    /// Split axis (0 = row, 1 = col)
    axis: usize,
}

impl KdTree {
    /// Builds a tree over `points`; `None` when there are no points.
    pub fn build(points: &[[f32; 2]]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());
        Self::build_recursive(points, &mut indices, 0, &mut nodes);
        Some(Self {
            nodes,
            points: points.to_vec(),
        })
    }

    fn build_recursive(
        points: &[[f32; 2]],
        indices: &mut [usize],
        depth: usize,
        nodes: &mut Vec<KdNode>,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }
        let axis = depth % 2;
        indices.sort_by(|&a, &b| points[a][axis].total_cmp(&points[b][axis]));

        let median = indices.len() / 2;
        let node_idx = nodes.len();
        nodes.push(KdNode {
            point_idx: indices[median],
            left: None,
            right: None,
            axis,
        });

        let (left_indices, right_part) = indices.split_at_mut(median);
        let right_indices = &mut right_part[1..];
        let left = Self::build_recursive(points, left_indices, depth + 1, nodes);
        let right = Self::build_recursive(points, right_indices, depth + 1, nodes);
        nodes[node_idx].left = left;
        nodes[node_idx].right = right;
        Some(node_idx)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Indices of all points within `radius` (inclusive) of `query`, unordered.
    pub fn within_radius(&self, query: [f32; 2], radius: f32) -> Vec<usize> {
        let mut out = Vec::new();
        if !self.nodes.is_empty() && radius >= 0.0 {
            self.within_radius_recursive(0, query, radius, radius * radius, &mut out);
        }
        out
    }

    fn within_radius_recursive(
        &self,
        node_idx: usize,
        query: [f32; 2],
        radius: f32,
        radius_sq: f32,
        out: &mut Vec<usize>,
    ) {
        let node = &self.nodes[node_idx];
        let p = self.points[node.point_idx];
        let dr = query[0] - p[0];
        let dc = query[1] - p[1];
        if dr * dr + dc * dc <= radius_sq {
            out.push(node.point_idx);
        }

        let diff = query[node.axis] - p[node.axis];
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(near) = near {
            self.within_radius_recursive(near, query, radius, radius_sq, out);
        }
        if diff.abs() <= radius {
            if let Some(far) = far {
                self.within_radius_recursive(far, query, radius, radius_sq, out);
            }
        }
    }
}
